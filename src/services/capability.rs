//! # Capability tokens.
//!
//! A [`Capability`] names a resource or precondition a service provides or
//! needs ("net", "db", "queue"...). The runtime never interprets the token; it
//! only compares and hashes it.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Opaque, cheaply clonable capability identifier.
///
/// # Example
/// ```
/// use bootvisor::Capability;
///
/// let net = Capability::new("net");
/// assert_eq!(net, Capability::from("net"));
/// assert_eq!(net.to_string(), "net");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capability(Arc<str>);

impl Capability {
    /// Creates a capability from any string-like token.
    pub fn new(token: impl AsRef<str>) -> Self {
        Self(Arc::from(token.as_ref()))
    }

    /// Returns the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Capability {
    fn from(token: &str) -> Self {
        Self(Arc::from(token))
    }
}

impl From<String> for Capability {
    fn from(token: String) -> Self {
        Self(Arc::from(token))
    }
}

impl From<&Capability> for Capability {
    fn from(cap: &Capability) -> Self {
        cap.clone()
    }
}

impl Borrow<str> for Capability {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn set_lookup_by_str() {
        let set: HashSet<Capability> = ["net", "db"].into_iter().map(Capability::from).collect();
        assert!(set.contains("net"));
        assert!(!set.contains("queue"));
    }

    #[test]
    fn debug_is_quoted_token() {
        assert_eq!(format!("{:?}", Capability::from("db")), "\"db\"");
    }
}
