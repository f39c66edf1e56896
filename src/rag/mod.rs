pub mod chunker;
pub mod index;
