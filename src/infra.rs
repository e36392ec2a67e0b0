pub mod compose_cli;
pub mod compose_file;
pub mod config;
pub mod docker_adapter;
pub mod interpret;
pub mod stats;

pub use compose_cli::{ComposeCli, ComposeTool, Deadline, ToolOutcome};
pub use compose_file::DeclarationError;
pub use config::AppConfig;
pub use docker_adapter::DockerAdapter;
