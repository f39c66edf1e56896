pub mod chat;
pub mod health;
pub mod predict;
pub mod recommendation;
pub mod scrape;
