pub mod config;
pub mod error;
pub mod types;

pub use config::HeronConfig;
pub use error::{HeronError, Result};
