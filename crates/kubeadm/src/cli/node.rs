//! Command tree nodes
//!
//! A [`CommandNode`] is either a leaf carrying an action or a group that
//! only holds children. Groups are rendered to clap with external
//! subcommands allowed, so an unknown child name reaches the group's
//! dispatcher instead of clap's usage fallback, and the dispatcher always
//! fails.

use std::{collections::HashSet, fmt};

use anyhow::Result;
use clap::{value_parser, Arg, ArgMatches, Command};
use kubeadm_core::{dispatch::require_subcommand, flags::NormalizationRule, DispatchError};
use thiserror::Error;

/// What a leaf sees when it is the resolution target.
pub struct Invocation<'a> {
    pub matches: &'a ArgMatches,
    pub root: &'a CommandNode,
}

pub type Action = Box<dyn Fn(&Invocation<'_>) -> Result<()> + Send + Sync>;

type GroupAction = Box<dyn Fn(&[String]) -> std::result::Result<(), DispatchError> + Send + Sync>;

enum Behavior {
    Leaf(Action),
    Group(GroupAction),
}

pub struct CommandNode {
    name: String,
    about: String,
    long_about: Option<String>,
    args: Vec<Arg>,
    children: Vec<CommandNode>,
    behavior: Behavior,
    normalizer: Option<NormalizationRule>,
}

/// Structural defects that must never ship in a built tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeDefect {
    #[error("{parent:?} registers the child {name:?} more than once")]
    DuplicateChild { parent: String, name: String },

    #[error("group {name:?} has no children")]
    EmptyGroup { name: String },
}

/// Name, group flag and children of a node; identity-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeShape {
    pub name: String,
    pub requires_subcommand: bool,
    pub children: Vec<NodeShape>,
}

impl CommandNode {
    pub fn leaf<F>(name: impl Into<String>, about: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            about: about.into(),
            long_about: None,
            args: Vec::new(),
            children: Vec::new(),
            behavior: Behavior::Leaf(Box::new(action)),
            normalizer: None,
        }
    }

    pub fn group(name: impl Into<String>, about: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            behavior: Behavior::Group(Box::new(require_subcommand(name.clone()))),
            name,
            about: about.into(),
            long_about: None,
            args: Vec::new(),
            children: Vec::new(),
            normalizer: None,
        }
    }

    pub fn long_about(mut self, text: impl Into<String>) -> Self {
        self.long_about = Some(text.into());
        self
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = Arg>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn subcommand(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    pub fn flag_normalizer(mut self, rule: NormalizationRule) -> Self {
        self.normalizer = Some(rule);
        self
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_about(&self) -> &str {
        &self.about
    }

    pub fn get_long_about(&self) -> Option<&str> {
        self.long_about.as_deref()
    }

    pub fn get_children(&self) -> &[Self] {
        &self.children
    }

    pub fn get_normalizer(&self) -> Option<NormalizationRule> {
        self.normalizer
    }

    pub fn requires_subcommand(&self) -> bool {
        matches!(self.behavior, Behavior::Group(_))
    }

    pub fn find_child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn shape(&self) -> NodeShape {
        NodeShape {
            name: self.name.clone(),
            requires_subcommand: self.requires_subcommand(),
            children: self.children.iter().map(Self::shape).collect(),
        }
    }

    /// Check sibling-name uniqueness and non-empty groups for the whole tree.
    pub fn check_invariants(&self) -> std::result::Result<(), TreeDefect> {
        if self.requires_subcommand() && self.children.is_empty() {
            return Err(TreeDefect::EmptyGroup {
                name: self.name.clone(),
            });
        }
        let mut seen = HashSet::new();
        for child in &self.children {
            if !seen.insert(child.name.as_str()) {
                return Err(TreeDefect::DuplicateChild {
                    parent: self.name.clone(),
                    name: child.name.clone(),
                });
            }
        }
        self.children.iter().try_for_each(Self::check_invariants)
    }

    /// Render the tree as a clap command for parsing, help and completion.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(self.name.clone())
            .about(self.about.clone())
            .args_override_self(true)
            .args(self.args.iter().cloned());
        if let Some(long_about) = &self.long_about {
            cmd = cmd.long_about(long_about.clone());
        }
        if self.requires_subcommand() {
            cmd = cmd
                .allow_external_subcommands(true)
                .external_subcommand_value_parser(value_parser!(String));
        }
        self.children
            .iter()
            .fold(cmd, |cmd, child| cmd.subcommand(child.to_command()))
    }

    /// Run the node resolved from `matches`, treating `self` as the root.
    pub fn run(&self, matches: &ArgMatches) -> Result<()> {
        self.dispatch(self, matches)
    }

    fn dispatch(&self, root: &Self, matches: &ArgMatches) -> Result<()> {
        match &self.behavior {
            Behavior::Leaf(action) => {
                tracing::debug!(command = %self.name, "running command");
                action(&Invocation { matches, root })
            }
            Behavior::Group(fallback) => {
                let residual: Vec<String> = match matches.subcommand() {
                    Some((name, sub)) => {
                        if let Some(child) = self.find_child(name) {
                            return child.dispatch(root, sub);
                        }
                        std::iter::once(name.to_string())
                            .chain(sub.get_many::<String>("").into_iter().flatten().cloned())
                            .collect()
                    }
                    None => Vec::new(),
                };
                tracing::debug!(group = %self.name, ?residual, "resolution stopped at group");
                fallback(&residual).map_err(anyhow::Error::from)
            }
        }
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("requires_subcommand", &self.requires_subcommand())
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
