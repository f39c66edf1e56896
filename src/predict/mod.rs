pub mod artifacts;
pub mod pipeline;
