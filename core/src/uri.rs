//! Symbolic addresses.
//!
//! A [`Uri`] identifies a class, instance, or class member by path alone:
//! two URIs name the same entity exactly when their text is equal. No
//! pointer identity is involved anywhere in resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an empty or malformed URI string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid URI: {0:?}")]
pub struct ParseUriError(pub String);

/// A purely textual symbolic address: an optional `host://` prefix followed
/// by a `/`-separated path, or a `$name` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(String);

impl Uri {
    /// Creates a URI from the given path, normalizing a missing leading
    /// slash. Paths beginning with `$` or containing a scheme are kept
    /// verbatim.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        if path.starts_with('/') || path.starts_with('$') || path.contains("://") {
            Self(path)
        } else {
            Self(format!("/{path}"))
        }
    }

    /// Returns a new URI with `segment` appended to the path.
    #[must_use]
    pub fn append(&self, segment: &str) -> Self {
        if segment.is_empty() {
            return self.clone();
        }
        let segment = segment.trim_start_matches('/');
        if self.0.ends_with('/') {
            Self(format!("{}{segment}", self.0))
        } else {
            Self(format!("{}/{segment}", self.0))
        }
    }

    /// Returns the host portion, if this URI carries one.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        let end = self.0.find("://")?;
        let rest = &self.0[end + 3..];
        match rest.find('/') {
            Some(slash) => Some(&rest[..slash]),
            None => Some(rest),
        }
    }

    /// Returns the path portion, with any host prefix stripped.
    #[must_use]
    pub fn path(&self) -> &str {
        match self.0.find("://") {
            Some(end) => {
                let rest = &self.0[end + 3..];
                match rest.find('/') {
                    Some(slash) => &rest[slash..],
                    None => "/",
                }
            }
            None => &self.0,
        }
    }

    /// Returns the full textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this URI is a `$name` reference rather than an
    /// absolute address.
    #[must_use]
    pub fn is_id(&self) -> bool {
        self.0.starts_with('$')
    }

    /// Returns true if the path portion starts with the given prefix.
    #[must_use]
    pub fn path_starts_with(&self, prefix: &str) -> bool {
        self.path().starts_with(prefix)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Uri {
    type Err = ParseUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseUriError(s.to_owned()));
        }
        Ok(Self::new(s))
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_missing_leading_slash() {
        assert_eq!(Uri::new("state/scalar").as_str(), "/state/scalar");
        assert_eq!(Uri::new("/state/scalar").as_str(), "/state/scalar");
    }

    #[test]
    fn keeps_id_refs_verbatim() {
        let uri = Uri::new("$self");
        assert!(uri.is_id());
        assert_eq!(uri.as_str(), "$self");
    }

    #[test]
    fn append_handles_slashes() {
        let base = Uri::new("/state/collection");
        assert_eq!(base.append("btree").as_str(), "/state/collection/btree");
        assert_eq!(base.append("/btree").as_str(), "/state/collection/btree");
        assert_eq!(base.append("").as_str(), "/state/collection");
    }

    #[test]
    fn host_and_path_split() {
        let uri = Uri::new("http://demo.example:8702/app/table");
        assert_eq!(uri.host(), Some("demo.example:8702"));
        assert_eq!(uri.path(), "/app/table");

        let local = Uri::new("/app/table");
        assert_eq!(local.host(), None);
        assert_eq!(local.path(), "/app/table");
    }

    #[test]
    fn textual_equality_is_identity() {
        assert_eq!(Uri::new("/class/a"), Uri::new("class/a"));
        assert_ne!(Uri::new("/class/a"), Uri::new("/class/b"));
    }

    #[test]
    fn empty_string_does_not_parse() {
        assert!("".parse::<Uri>().is_err());
        assert!("/state".parse::<Uri>().is_ok());
    }
}
