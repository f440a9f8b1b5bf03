//! Browser origin allow-list.
//!
//! Decides whether a cross-origin caller may submit messages and what the
//! `Access-Control-Allow-Origin` header should say when it can.

use std::collections::BTreeSet;

use crate::error::{RelayError, Result};

/// Which browser origins may submit messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Every origin is accepted and answered with a wildcard.
    #[default]
    Any,
    /// Only the listed origins are accepted.
    AllowList(BTreeSet<String>),
}

/// Origin permitted by an [`OriginPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigin {
    /// Any origin, answered with `*`.
    Any,
    /// A specific origin, echoed back verbatim.
    Exact(String),
}

impl AllowedOrigin {
    /// Value for the `Access-Control-Allow-Origin` header.
    pub fn header_value(&self) -> &str {
        match self {
            Self::Any => "*",
            Self::Exact(origin) => origin,
        }
    }
}

impl OriginPolicy {
    /// Builds a policy from configured origins.
    ///
    /// Entries are trimmed, lowercased and stripped of a trailing `/`. An
    /// empty list, or a list containing `*`, accepts every origin.
    pub fn from_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed = BTreeSet::new();

        for origin in origins {
            let normalized = normalize(origin.as_ref());
            if normalized == "*" {
                return Self::Any;
            }
            if !normalized.is_empty() {
                allowed.insert(normalized);
            }
        }

        if allowed.is_empty() {
            Self::Any
        } else {
            Self::AllowList(allowed)
        }
    }

    /// Returns whether only listed origins are accepted.
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::AllowList(_))
    }

    /// Checks the origin a request declared.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::ForbiddenOrigin` when the policy is restricted
    /// and the origin is missing or not listed.
    pub fn check(&self, origin: Option<&str>) -> Result<AllowedOrigin> {
        match self {
            Self::Any => Ok(AllowedOrigin::Any),
            Self::AllowList(allowed) => match origin {
                Some(value) if allowed.contains(&normalize(value)) => {
                    Ok(AllowedOrigin::Exact(value.to_string()))
                },
                _ => Err(RelayError::forbidden_origin(origin)),
            },
        }
    }
}

fn normalize(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}
