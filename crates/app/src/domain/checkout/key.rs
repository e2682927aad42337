//! Checkout keys

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_KEY_LEN: usize = 64;

/// Identifies one customer's checkout across page loads and redirects.
///
/// Keys are chosen by the client, so they are restricted to characters that are safe to use as
/// a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckoutKey(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("checkout key must be 1-64 letters, digits, '-' or '_'")]
pub struct InvalidCheckoutKey;

impl CheckoutKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CheckoutKey {
    type Err = InvalidCheckoutKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s.len() <= MAX_KEY_LEN
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidCheckoutKey)
        }
    }
}

impl TryFrom<String> for CheckoutKey {
    type Error = InvalidCheckoutKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CheckoutKey> for String {
    fn from(value: CheckoutKey) -> Self {
        value.0
    }
}

impl Display for CheckoutKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
