//! kubeadm - bootstrap a secure Kubernetes cluster
//!
//! The binary builds the command tree once from [`cli::LeafFactories`] and
//! resolves the process arguments against it. Group nodes never succeed on
//! their own; see [`kubeadm_core::dispatch`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod cli;
pub mod commands;
