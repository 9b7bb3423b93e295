//! Root command tree assembly
//!
//! The tree is built from an explicit [`LeafFactories`] value. There is no
//! global registry: the same factories always give the same tree shape.

use kubeadm_core::{config::Settings, flags::word_sep_normalize};

use super::{node::CommandNode, output::Output};
use crate::commands::{completion, config, init, join, phases, reset, token, version};

const ROOT_ABOUT: &str = "kubeadm: easily bootstrap a secure Kubernetes cluster";

const ROOT_LONG_ABOUT: &str = "\
kubeadm: easily bootstrap a secure Kubernetes cluster.

    ┌──────────────────────────────────────────────────────────┐
    │ KUBEADM IS BETA, DO NOT USE IT FOR PRODUCTION CLUSTERS!  │
    │                                                          │
    │ But, please try it out! Give us feedback at:             │
    │ https://github.com/kubernetes/kubeadm/issues             │
    └──────────────────────────────────────────────────────────┘

Example usage:

    Create a two-machine cluster with one master (which controls the cluster),
    and one node (where your workloads, like Pods and ReplicaSets run).

    ┌──────────────────────────────────────────────────────────┐
    │ On the first machine                                     │
    ├──────────────────────────────────────────────────────────┤
    │ master# kubeadm init                                     │
    └──────────────────────────────────────────────────────────┘

    ┌──────────────────────────────────────────────────────────┐
    │ On the second machine                                    │
    ├──────────────────────────────────────────────────────────┤
    │ node# kubeadm join --token=<token> <ip-of-master>:<port> │
    └──────────────────────────────────────────────────────────┘

    You can then repeat the second step on as many other machines as you like.";

const ALPHA_ABOUT: &str = "Experimental sub-commands not yet fully functional.";

/// Builds one command node from the output stream.
pub type LeafFactory = Box<dyn Fn(&Output) -> CommandNode>;

/// Builds one command node from the output and error streams.
pub type StreamsFactory = Box<dyn Fn(&Output, &Output) -> CommandNode>;

/// Factories for every top-level command plus the experimental phases.
pub struct LeafFactories {
    pub completion: LeafFactory,
    pub config: LeafFactory,
    pub init: LeafFactory,
    pub join: LeafFactory,
    pub reset: LeafFactory,
    pub token: StreamsFactory,
    pub version: LeafFactory,
    pub phase: LeafFactory,
}

impl LeafFactories {
    /// The factories shipped with kubeadm, with `settings` as flag defaults.
    pub fn standard(settings: &Settings) -> Self {
        let config_settings = settings.clone();
        let init_settings = settings.clone();
        let reset_settings = settings.clone();
        let token_settings = settings.clone();
        let phase_settings = settings.clone();
        Self {
            completion: Box::new(completion::new_cmd_completion),
            config: Box::new(move |out| config::new_cmd_config(out, &config_settings)),
            init: Box::new(move |out| init::new_cmd_init(out, &init_settings)),
            join: Box::new(join::new_cmd_join),
            reset: Box::new(move |out| reset::new_cmd_reset(out, &reset_settings)),
            token: Box::new(move |out, err| token::new_cmd_token(out, err, &token_settings)),
            version: Box::new(version::new_cmd_version),
            phase: Box::new(move |out| phases::new_cmd_phase(out, &phase_settings)),
        }
    }
}

/// Assemble the `kubeadm` root.
///
/// Leaf factories run once each in declaration order, then the `alpha`
/// group is filled from the phase factory.
pub fn build_root_command(factories: &LeafFactories, out: &Output, err: &Output) -> CommandNode {
    let root = CommandNode::group("kubeadm", ROOT_ABOUT)
        .long_about(ROOT_LONG_ABOUT)
        .flag_normalizer(word_sep_normalize)
        .subcommand((factories.completion)(out))
        .subcommand((factories.config)(out))
        .subcommand((factories.init)(out))
        .subcommand((factories.join)(out))
        .subcommand((factories.reset)(out))
        .subcommand((factories.token)(out, err))
        .subcommand((factories.version)(out));

    let alpha = CommandNode::group("alpha", ALPHA_ABOUT).subcommand((factories.phase)(out));
    let root = root.subcommand(alpha);

    debug_assert_eq!(root.check_invariants(), Ok(()));
    root
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use std::sync::{Arc, Mutex};

    use kubeadm_core::DispatchError;

    use super::*;
    use crate::cli::handlers::run_cli;

    const ROOT_CHILDREN: [&str; 8] = [
        "completion",
        "config",
        "init",
        "join",
        "reset",
        "token",
        "version",
        "alpha",
    ];

    type Calls = Arc<Mutex<Vec<String>>>;

    fn recording_leaf(name: &'static str, calls: &Calls) -> LeafFactory {
        let calls = Arc::clone(calls);
        Box::new(move |_| {
            let calls = Arc::clone(&calls);
            CommandNode::leaf(name, "stub", move |_| {
                calls.lock().unwrap().push(name.to_string());
                Ok(())
            })
        })
    }

    fn stub_factories(calls: &Calls) -> LeafFactories {
        let token_calls = Arc::clone(calls);
        LeafFactories {
            completion: recording_leaf("completion", calls),
            config: recording_leaf("config", calls),
            init: recording_leaf("init", calls),
            join: recording_leaf("join", calls),
            reset: recording_leaf("reset", calls),
            token: Box::new(move |_, _| {
                let calls = Arc::clone(&token_calls);
                CommandNode::leaf("token", "stub", move |_| {
                    calls.lock().unwrap().push("token".to_string());
                    Ok(())
                })
            }),
            version: recording_leaf("version", calls),
            phase: recording_leaf("phase", calls),
        }
    }

    fn stub_tree(calls: &Calls) -> CommandNode {
        let (out, _) = Output::capture();
        let (err, _) = Output::capture();
        build_root_command(&stub_factories(calls), &out, &err)
    }

    fn dispatch_error(tree: &CommandNode, args: &[&str]) -> DispatchError {
        run_cli(tree, args.iter().copied())
            .unwrap_err()
            .downcast::<DispatchError>()
            .expect("expected a dispatch error")
    }

    fn child_names(node: &CommandNode) -> Vec<&str> {
        node.get_children().iter().map(CommandNode::get_name).collect()
    }

    #[test]
    fn test_root_children_in_declaration_order() {
        let tree = stub_tree(&Calls::default());
        assert_eq!(tree.get_name(), "kubeadm");
        assert_eq!(child_names(&tree), ROOT_CHILDREN);
    }

    #[test]
    fn test_groups_require_subcommands() {
        let tree = stub_tree(&Calls::default());
        assert!(tree.requires_subcommand());
        let alpha = tree.find_child("alpha").unwrap();
        assert!(alpha.requires_subcommand());
        assert_eq!(alpha.get_about(), ALPHA_ABOUT);
        assert_eq!(child_names(alpha), ["phase"]);
    }

    #[test]
    fn test_root_help_text() {
        let tree = stub_tree(&Calls::default());
        assert_eq!(tree.get_about(), ROOT_ABOUT);
        assert!(tree
            .get_long_about()
            .unwrap()
            .contains("node# kubeadm join --token=<token> <ip-of-master>:<port>"));
        assert!(tree.get_normalizer().is_some());
    }

    #[test]
    fn test_every_group_fails_without_residual() {
        let tree = stub_tree(&Calls::default());
        assert_eq!(
            dispatch_error(&tree, &["kubeadm"]).to_string(),
            r#"missing subcommand; "kubeadm" is not meant to be run on its own"#
        );
        assert_eq!(
            dispatch_error(&tree, &["kubeadm", "alpha"]),
            DispatchError::MissingSubcommand {
                name: "alpha".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_children_are_invalid() {
        let tree = stub_tree(&Calls::default());
        assert_eq!(
            dispatch_error(&tree, &["kubeadm", "bogus"]).to_string(),
            r#"invalid subcommand: "bogus""#
        );
        assert_eq!(
            dispatch_error(&tree, &["kubeadm", "alpha", "frobnicate"]),
            DispatchError::InvalidSubcommand {
                attempted: "frobnicate".to_string()
            }
        );
    }

    #[test]
    fn test_leaf_resolution_bypasses_dispatcher() {
        let calls = Calls::default();
        let tree = stub_tree(&calls);
        run_cli(&tree, ["kubeadm", "init"]).unwrap();
        run_cli(&tree, ["kubeadm", "alpha", "phase"]).unwrap();
        run_cli(&tree, ["kubeadm", "token"]).unwrap();
        assert_eq!(*calls.lock().unwrap(), ["init", "phase", "token"]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let calls = Calls::default();
        let factories = stub_factories(&calls);
        let (out, _) = Output::capture();
        let (err, _) = Output::capture();
        let first = build_root_command(&factories, &out, &err);
        let second = build_root_command(&factories, &out, &err);
        assert_eq!(first.shape(), second.shape());
        assert!(!std::ptr::eq(&first, &second));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_factories_invoked_once_in_order() {
        let order: Calls = Calls::default();
        let record = |name: &'static str| -> LeafFactory {
            let order = Arc::clone(&order);
            Box::new(move |_| {
                order.lock().unwrap().push(name.to_string());
                CommandNode::leaf(name, "stub", |_| Ok(()))
            })
        };
        let token_order = Arc::clone(&order);
        let factories = LeafFactories {
            completion: record("completion"),
            config: record("config"),
            init: record("init"),
            join: record("join"),
            reset: record("reset"),
            token: Box::new(move |_, _| {
                token_order.lock().unwrap().push("token".to_string());
                CommandNode::leaf("token", "stub", |_| Ok(()))
            }),
            version: record("version"),
            phase: record("phase"),
        };
        let (out, _) = Output::capture();
        build_root_command(&factories, &out, &out);
        assert_eq!(
            *order.lock().unwrap(),
            ["completion", "config", "init", "join", "reset", "token", "version", "phase"]
        );
    }

    #[test]
    fn test_standard_tree_is_well_formed() {
        let (out, _) = Output::capture();
        let (err, _) = Output::capture();
        let tree = build_root_command(&LeafFactories::standard(&Settings::default()), &out, &err);
        assert_eq!(tree.check_invariants(), Ok(()));
        assert_eq!(child_names(&tree), ROOT_CHILDREN);
        tree.to_command().debug_assert();
    }

    #[test]
    fn test_standard_tree_nested_groups() {
        let (out, _) = Output::capture();
        let tree = build_root_command(&LeafFactories::standard(&Settings::default()), &out, &out);
        let phase = tree
            .find_child("alpha")
            .and_then(|alpha| alpha.find_child("phase"))
            .unwrap();
        assert!(phase.requires_subcommand());
        assert!(tree.find_child("token").unwrap().requires_subcommand());
        assert!(tree.find_child("config").unwrap().requires_subcommand());
        assert!(!tree.find_child("init").unwrap().requires_subcommand());

        assert_eq!(
            dispatch_error(&tree, &["kubeadm", "alpha", "phase"]),
            DispatchError::MissingSubcommand {
                name: "phase".to_string()
            }
        );
        assert_eq!(
            dispatch_error(&tree, &["kubeadm", "token", "rotate"]),
            DispatchError::InvalidSubcommand {
                attempted: "rotate".to_string()
            }
        );
        assert_eq!(
            dispatch_error(&tree, &["kubeadm", "config", "upload"]),
            DispatchError::MissingSubcommand {
                name: "upload".to_string()
            }
        );
    }
}
