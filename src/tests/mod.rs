pub mod utils;
pub mod webhook;

pub use utils::io;
