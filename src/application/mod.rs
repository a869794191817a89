// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - This layer sits ABOVE services
// - It provides the boundary between the CLI and the services
// - It translates arguments into requests and reports into output and exit codes

pub mod cli;
pub mod commands;
pub mod error_handling;
pub mod report_writer;
pub mod state;

pub use cli::Cli;
pub use commands::dispatch;
pub use error_handling::{exit_status_for, ErrorResponse, ExitStatus};
pub use report_writer::{default_report_path, write_report};
pub use state::AppState;
