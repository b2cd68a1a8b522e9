//! This is the library of the CIFlow tagging bot.
pub mod ciflow;
pub mod config;
pub mod github;
pub mod utils;

#[cfg(test)]
mod tests;
