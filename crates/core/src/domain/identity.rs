use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static PLATFORM_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^U[a-zA-Z0-9]{32,}$").expect("platform id pattern is valid"));

/// Stable per-user key assigned by the messaging platform.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `candidate` has the shape of a platform user id (`U` followed by 32+ alphanumerics).
    pub fn looks_like_platform_id(candidate: &str) -> bool {
        PLATFORM_ID_RE.is_match(candidate)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
