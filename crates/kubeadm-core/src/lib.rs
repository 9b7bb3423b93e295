//! # kubeadm core
//!
//! Clap-free building blocks for the `kubeadm` command tree.
//!
//! ## Laws (Compiler Enforced)
//!
//! - No `unwrap()` - returns `Result` instead
//! - No `expect()` - returns `Result` instead
//! - No `panic!()` - returns `Result` instead
//! - No `unsafe` - safe Rust only
//!
//! ## Error Handling
//!
//! All fallible operations return `Result<T, Error>`. Group-node dispatch
//! failures are a dedicated [`DispatchError`] so the invocation layer can
//! tell them apart from leaf failures.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod dispatch;
mod error;
pub mod flags;
pub mod token;

pub use dispatch::{require_subcommand, DispatchError};
pub use error::{Error, Result};
