pub mod cli;
pub mod error;
pub mod models;
pub mod server;
pub mod services;

pub use cli::{Cli, Commands};
pub use error::AppError;
pub use models::{Answer, Config, OutputFormat};
