//! Bootstrap tokens
//!
//! A bootstrap token has the form `<id>.<secret>` where the id is six and
//! the secret sixteen characters drawn from `[a-z0-9]`.

use std::{fmt, str::FromStr, sync::OnceLock};

use rand::Rng;
use regex::Regex;

use crate::{Error, Result};

const TOKEN_ID_LEN: usize = 6;
const TOKEN_SECRET_LEN: usize = 16;
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn token_regex() -> Option<&'static Regex> {
    static TOKEN_RE: OnceLock<Option<Regex>> = OnceLock::new();
    TOKEN_RE
        .get_or_init(|| Regex::new(r"^([a-z0-9]{6})\.([a-z0-9]{16})$").ok())
        .as_ref()
}

fn token_id_regex() -> Option<&'static Regex> {
    static TOKEN_ID_RE: OnceLock<Option<Regex>> = OnceLock::new();
    TOKEN_ID_RE
        .get_or_init(|| Regex::new(r"^[a-z0-9]{6}$").ok())
        .as_ref()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapToken {
    id: String,
    secret: String,
}

impl BootstrapToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut draw = |len: usize| -> String {
            (0..len)
                .map(|_| char::from(TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())]))
                .collect()
        };
        let id = draw(TOKEN_ID_LEN);
        let secret = draw(TOKEN_SECRET_LEN);
        Self { id, secret }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for BootstrapToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id, self.secret)
    }
}

impl FromStr for BootstrapToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let re = token_regex().ok_or_else(|| Error::invalid_token(s, "token pattern unavailable"))?;
        let caps = re.captures(s).ok_or_else(|| {
            Error::invalid_token(
                s,
                format!(
                    "expected the form [a-z0-9]{{{TOKEN_ID_LEN}}}.[a-z0-9]{{{TOKEN_SECRET_LEN}}}"
                ),
            )
        })?;
        Ok(Self {
            id: caps[1].to_string(),
            secret: caps[2].to_string(),
        })
    }
}

/// Extract the token id from either a bare id or a full token.
pub fn parse_token_id(value: &str) -> Result<String> {
    let is_id = token_id_regex().is_some_and(|re| re.is_match(value));
    if is_id {
        return Ok(value.to_string());
    }
    value
        .parse::<BootstrapToken>()
        .map(|token| token.id)
        .map_err(|_| {
            Error::invalid_token(
                value,
                format!("expected a token id [a-z0-9]{{{TOKEN_ID_LEN}}} or a full token"),
            )
        })
}
