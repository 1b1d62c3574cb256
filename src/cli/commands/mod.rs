mod ask;
mod config;
mod ingest;
mod serve;
mod status;

pub use ask::AskArgs;
pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use serve::ServeArgs;

pub use ask::{build_pipeline, handle_ask, is_exit_command};
pub use config::handle_config;
pub use ingest::handle_ingest;
pub use serve::handle_serve;
pub use status::handle_status;
