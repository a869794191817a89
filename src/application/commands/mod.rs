// src/application/commands/mod.rs
//
// CLI Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between the CLI and Services
// - Commands parse arguments into requests and print results
// - Commands map outcomes to an exit status
// - Commands NEVER contain business logic

pub mod enrichment_commands;
pub mod seed_commands;
pub mod status_commands;

pub use enrichment_commands::*;
pub use seed_commands::*;
pub use status_commands::*;

use crate::application::cli::Command;
use crate::application::error_handling::ExitStatus;
use crate::application::state::AppState;
use crate::error::AppResult;

/// Route a parsed command to its handler
pub async fn dispatch(state: &AppState, command: Command) -> AppResult<ExitStatus> {
    match command {
        Command::Run(args) => run_videos(state, args).await,
        Command::Channels(args) => run_channels(state, args).await,
        Command::Status(args) => show_status(state, args),
        Command::Seed(args) => seed_catalog(state, args).await,
    }
}
