pub mod gemini;
pub mod provider;

#[cfg(test)]
pub mod testing;
