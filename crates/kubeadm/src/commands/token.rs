//! `kubeadm token`
//!
//! Bootstrap token management. Tokens printed for machines go to the
//! output stream; warnings and plans go to the error stream so
//! `$(kubeadm token create)` captures just the token.

use std::{io::Write, path::PathBuf};

use anyhow::Result;
use clap::{parser::ValueSource, Arg, ArgMatches};
use kubeadm_core::{
    config::{parse_duration, Settings, DEFAULT_TOKEN_TTL},
    token::{parse_token_id, BootstrapToken},
    Error,
};

use super::kubeconfig_arg;
use crate::cli::{CommandNode, Output};

const TOKEN_ABOUT: &str = "Manage bootstrap tokens.";

const TOKEN_LONG_ABOUT: &str = "\
This command manages bootstrap tokens. It is optional and needed only for advanced use cases.

In short, bootstrap tokens are used for establishing bidirectional trust between a client and a server.
A bootstrap token can be used when a client (for example a node that is about to join the cluster) needs
to trust the server it is talking to. Then a bootstrap token with the \"signing\" usage can be used.
bootstrap tokens can also function as a way to allow short-lived authentication to the API Server
(the token serves as a way for the API Server to trust the client), for example for doing the TLS Bootstrap.

What is a bootstrap token more exactly?
 - It is a Secret in the kube-system namespace of type \"bootstrap.kubernetes.io/token\".
 - A bootstrap token must be of the form \"[a-z0-9]{6}.[a-z0-9]{16}\". The former part is the public token ID,
   while the latter is the Token Secret and it must be kept private at all circumstances!
 - The name of the Secret must be named \"bootstrap-token-(token-id)\".";

const DEFAULT_TTL_WARNING: &str = "[kubeadm] WARNING: starting in 1.8, tokens expire after 24 hours by default (if you require a non-expiring token use --ttl 0)";

const VALID_USAGES: [&str; 2] = ["signing", "authentication"];
const DEFAULT_GROUP: &str = "system:bootstrappers:kubeadm:default-node-token";
const GROUP_PREFIX: &str = "system:bootstrappers:";

pub fn new_cmd_token(out: &Output, err: &Output, settings: &Settings) -> CommandNode {
    CommandNode::group("token", TOKEN_ABOUT)
        .long_about(TOKEN_LONG_ABOUT)
        .arg(kubeconfig_arg(settings))
        .subcommand(new_cmd_token_create(out, err))
        .subcommand(new_cmd_token_delete(out))
        .subcommand(new_cmd_token_generate(out))
        .subcommand(new_cmd_token_list(out, err))
}

fn new_cmd_token_create(out: &Output, err: &Output) -> CommandNode {
    let out = out.clone();
    let err = err.clone();
    CommandNode::leaf(
        "create",
        "Create bootstrap tokens on the server.",
        move |inv| run_token_create(inv.matches, &mut out.clone(), &mut err.clone()),
    )
    .long_about(
        "This command will create a bootstrap token for you.\n\
         You can specify the usages for this token, the \"time to live\" and an optional human friendly description.\n\n\
         The [token] is the actual token to write.\n\
         This should be a securely generated random token of the form \"[a-z0-9]{6}.[a-z0-9]{16}\".\n\
         If no [token] is given, kubeadm will generate a random token instead.",
    )
    .arg(Arg::new("token").value_name("TOKEN"))
    .arg(
        Arg::new("ttl")
            .long("ttl")
            .value_name("DURATION")
            .default_value(DEFAULT_TOKEN_TTL)
            .help("The duration before the token is automatically deleted (e.g. 1s, 2m, 3h). '0' means 'never expires'."),
    )
    .arg(
        Arg::new("usages")
            .long("usages")
            .value_name("USAGES")
            .value_delimiter(',')
            .default_value("signing,authentication")
            .help("Describes the ways in which this token can be used. Valid options: [signing,authentication]."),
    )
    .arg(
        Arg::new("groups")
            .long("groups")
            .value_name("GROUPS")
            .value_delimiter(',')
            .default_value(DEFAULT_GROUP)
            .help("Extra groups that this token will authenticate as when used for authentication. Must match \"\\Asystem:bootstrappers:[a-z0-9:-]{0,255}[a-z0-9]\\z\""),
    )
    .arg(
        Arg::new("description")
            .long("description")
            .value_name("TEXT")
            .help("A human friendly description of how this token is used."),
    )
}

fn new_cmd_token_delete(out: &Output) -> CommandNode {
    let out = out.clone();
    CommandNode::leaf(
        "delete",
        "Delete bootstrap tokens on the server.",
        move |inv| run_token_delete(inv.matches, &mut out.clone()),
    )
    .arg(
        Arg::new("token-value")
            .value_name("TOKEN-VALUE")
            .required(true)
            .help("A token id or a full token"),
    )
}

fn new_cmd_token_generate(out: &Output) -> CommandNode {
    let out = out.clone();
    CommandNode::leaf(
        "generate",
        "Generate and print a bootstrap token, but do not create it on the server.",
        move |_| run_token_generate(&mut out.clone()),
    )
    .long_about(
        "This command will print out a randomly-generated bootstrap token that can be used with\n\
         the \"init\" and \"join\" commands.\n\n\
         You don't have to use this command in order to generate a token. You can do so\n\
         yourself as long as it is in the format \"[a-z0-9]{6}.[a-z0-9]{16}\".",
    )
}

fn new_cmd_token_list(out: &Output, err: &Output) -> CommandNode {
    let out = out.clone();
    let err = err.clone();
    CommandNode::leaf(
        "list",
        "List bootstrap tokens on the server.",
        move |inv| run_token_list(inv.matches, &mut out.clone(), &mut err.clone()),
    )
}

fn kubeconfig(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("kubeconfig")
        .cloned()
        .unwrap_or_default()
}

fn validate_usages(usages: &[String]) -> kubeadm_core::Result<()> {
    usages.iter().try_for_each(|usage| {
        if VALID_USAGES.contains(&usage.as_str()) {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "invalid bootstrap token usage {usage:?}, valid usages are {VALID_USAGES:?}"
            )))
        }
    })
}

fn validate_groups(groups: &[String]) -> kubeadm_core::Result<()> {
    groups.iter().try_for_each(|group| {
        let valid = group.strip_prefix(GROUP_PREFIX).is_some_and(|rest| {
            !rest.is_empty()
                && !rest.ends_with([':', '-'])
                && rest
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ':' || c == '-')
        });
        if valid {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "group {group:?} must match {GROUP_PREFIX}[a-z0-9:-]{{0,255}}[a-z0-9]"
            )))
        }
    })
}

/// # Errors
///
/// Returns error for a malformed token, TTL, usage or group.
pub fn run_token_create(
    matches: &ArgMatches,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<()> {
    let token = match matches.get_one::<String>("token") {
        Some(value) => value.parse::<BootstrapToken>()?,
        None => BootstrapToken::generate(),
    };
    let ttl = matches
        .get_one::<String>("ttl")
        .map_or(DEFAULT_TOKEN_TTL, String::as_str);
    parse_duration(ttl)?;

    let usages: Vec<String> = matches
        .get_many::<String>("usages")
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    validate_usages(&usages)?;
    let groups: Vec<String> = matches
        .get_many::<String>("groups")
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    validate_groups(&groups)?;

    let description = matches.get_one::<String>("description");
    tracing::debug!(token_id = token.id(), ttl, ?usages, ?groups, ?description, "creating token");

    if matches.value_source("ttl") != Some(ValueSource::CommandLine) {
        writeln!(err, "{DEFAULT_TTL_WARNING}")?;
    }
    writeln!(
        err,
        "[token] Would create Secret \"bootstrap-token-{}\" in namespace kube-system (ttl {ttl}, usages [{}], groups [{}]) using {}",
        token.id(),
        usages.join(","),
        groups.join(","),
        kubeconfig(matches).display()
    )?;
    writeln!(out, "{token}")?;
    Ok(())
}

/// # Errors
///
/// Returns error if the value is neither a token id nor a full token.
pub fn run_token_delete(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let value = matches
        .get_one::<String>("token-value")
        .ok_or_else(|| Error::validation("a token id or token is required"))?;
    let id = parse_token_id(value)?;
    writeln!(
        out,
        "[token] Would delete bootstrap token {id:?} using {}",
        kubeconfig(matches).display()
    )?;
    Ok(())
}

/// # Errors
///
/// Returns error if the stream cannot be written.
pub fn run_token_generate(out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", BootstrapToken::generate())?;
    Ok(())
}

/// # Errors
///
/// Returns error if a stream cannot be written.
pub fn run_token_list(
    matches: &ArgMatches,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<()> {
    writeln!(
        err,
        "[token] Would list bootstrap token Secrets in namespace kube-system using {}",
        kubeconfig(matches).display()
    )?;
    writeln!(out, "TOKEN\tTTL\tEXPIRES\tUSAGES\tDESCRIPTION\tEXTRA GROUPS")?;
    Ok(())
}
