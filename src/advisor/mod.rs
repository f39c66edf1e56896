pub mod chat;
pub mod recommendation;
