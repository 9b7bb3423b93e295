//! Flag-name normalization
//!
//! Older kubeadm releases spelled some flags with underscores or in mixed
//! case. The normalization rule maps those spellings onto the current
//! dash-separated form so they keep resolving to the same option. Legacy
//! spellings are never rejected, only warned about.

use std::{borrow::Cow, ffi::OsString};

/// Pure mapping from a raw long-flag name to its canonical name.
pub type NormalizationRule = fn(&str) -> Cow<'_, str>;

/// Replace word separators with `-`.
///
/// `_` becomes `-`, and a lower-to-upper camel boundary becomes `-` followed
/// by the lowercase letter. Already canonical names are borrowed unchanged.
pub fn word_sep_normalize(name: &str) -> Cow<'_, str> {
    if !name.chars().any(|c| c == '_' || c.is_ascii_uppercase()) {
        return Cow::Borrowed(name);
    }

    let mut normalized = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c == '_' {
            normalized.push('-');
        } else if c.is_ascii_uppercase() {
            if prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                normalized.push('-');
            }
            normalized.push(c.to_ascii_lowercase());
        } else {
            normalized.push(c);
        }
        prev = Some(c);
    }
    Cow::Owned(normalized)
}

/// Apply `rule` to one argument token.
///
/// Only long flags (`--name` or `--name=value`) are touched; the value part
/// after `=` is preserved verbatim.
pub fn normalize_token(token: &str, rule: NormalizationRule) -> Cow<'_, str> {
    let Some(body) = token.strip_prefix("--") else {
        return Cow::Borrowed(token);
    };
    if body.is_empty() {
        return Cow::Borrowed(token);
    }

    let (name, value) = match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    };

    match rule(name) {
        Cow::Borrowed(_) => Cow::Borrowed(token),
        Cow::Owned(canonical) => {
            tracing::warn!(
                "--{name} is DEPRECATED and will be removed in a future version. Use --{canonical} instead."
            );
            Cow::Owned(value.map_or_else(
                || format!("--{canonical}"),
                |value| format!("--{canonical}={value}"),
            ))
        }
    }
}

/// Normalize a full argument vector (binary name first).
///
/// Tokens after a bare `--` and tokens that are not valid UTF-8 pass
/// through untouched.
pub fn normalize_args<I, T>(args: I, rule: NormalizationRule) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut terminated = false;
    args.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(idx, arg)| {
            if idx == 0 || terminated {
                return arg;
            }
            match arg.to_str() {
                Some("--") => {
                    terminated = true;
                    arg
                }
                Some(token) => match normalize_token(token, rule) {
                    Cow::Borrowed(_) => arg,
                    Cow::Owned(normalized) => OsString::from(normalized),
                },
                None => arg,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_underscores_become_dashes() {
        assert_eq!(
            word_sep_normalize("skip_preflight_checks"),
            "skip-preflight-checks"
        );
    }

    #[test]
    fn test_camel_case_becomes_kebab() {
        assert_eq!(
            word_sep_normalize("apiserverAdvertiseAddress"),
            "apiserver-advertise-address"
        );
        assert_eq!(word_sep_normalize("certDir"), "cert-dir");
    }

    #[test]
    fn test_canonical_name_is_borrowed() {
        assert!(matches!(
            word_sep_normalize("pod-network-cidr"),
            Cow::Borrowed("pod-network-cidr")
        ));
    }

    #[test]
    fn test_token_value_is_preserved() {
        assert_eq!(
            normalize_token("--pod_network_cidr=10.244.0.0/16", word_sep_normalize),
            "--pod-network-cidr=10.244.0.0/16"
        );
        assert_eq!(
            normalize_token("--token=Ab_Cd", word_sep_normalize),
            "--token=Ab_Cd"
        );
    }

    #[test]
    fn test_short_flags_and_values_untouched() {
        assert_eq!(normalize_token("-o", word_sep_normalize), "-o");
        assert_eq!(normalize_token("My_Node", word_sep_normalize), "My_Node");
        assert_eq!(normalize_token("--", word_sep_normalize), "--");
    }

    #[test]
    fn test_normalize_args_skips_binary_and_terminator() {
        let args = normalize_args(
            ["kube_adm", "init", "--cert_dir", "/pki", "--", "--node_name"],
            word_sep_normalize,
        );
        assert_eq!(
            args,
            vec!["kube_adm", "init", "--cert-dir", "/pki", "--", "--node_name"]
        );
    }

    proptest! {
        #[test]
        fn prop_normalization_is_idempotent(name in "[a-zA-Z0-9_-]{0,24}") {
            let once = word_sep_normalize(&name).into_owned();
            let twice = word_sep_normalize(&once).into_owned();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_normalized_names_are_canonical(name in "[a-zA-Z0-9_-]{0,24}") {
            let normalized = word_sep_normalize(&name);
            prop_assert!(!normalized.contains('_'));
            prop_assert!(!normalized.chars().any(|c| c.is_ascii_uppercase()));
        }

        #[test]
        fn prop_non_flag_tokens_pass_through(token in "[^-][a-zA-Z0-9_=.-]{0,16}") {
            prop_assert_eq!(normalize_token(&token, word_sep_normalize), token.as_str());
        }
    }
}
