//! CLI plumbing: the command tree, its assembly and the invocation layer

pub mod commands;
pub mod error;
pub mod handlers;
pub mod node;
pub mod output;
pub mod setup;

pub use commands::{build_root_command, LeafFactories};
pub use error::{format_error, get_exit_code};
pub use handlers::run_cli;
pub use node::{CommandNode, Invocation};
pub use output::Output;
