use std::fmt;

use serde::{Deserialize, Serialize};

/// A named partition of the preference store.
///
/// `Default` is the standard store that is active before any namespace has
/// been selected. An empty name is treated the same as no name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Namespace {
    #[default]
    Default,
    Named(String),
}

impl Namespace {
    pub fn named(name: impl Into<String>) -> Self {
        Self::from(Some(name.into()))
    }

    /// Maps `None` and `Some("")` to [`Namespace::Default`].
    pub fn from_option(name: Option<&str>) -> Self {
        match name {
            None | Some("") => Self::Default,
            Some(name) => Self::Named(name.to_owned()),
        }
    }

    /// Returns the namespace name, or `None` for the default namespace.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Named(name) => Some(name),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl From<Option<String>> for Namespace {
    fn from(name: Option<String>) -> Self {
        match name {
            Some(name) if !name.is_empty() => Self::Named(name),
            _ => Self::Default,
        }
    }
}

impl From<Namespace> for Option<String> {
    fn from(ns: Namespace) -> Self {
        match ns {
            Namespace::Default => None,
            Namespace::Named(name) => Some(name),
        }
    }
}

impl From<&str> for Namespace {
    fn from(name: &str) -> Self {
        Self::from_option(Some(name))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("(default)"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_missing_names_map_to_default() {
        assert_eq!(Namespace::from_option(None), Namespace::Default);
        assert_eq!(Namespace::from_option(Some("")), Namespace::Default);
        assert_eq!(Namespace::named(""), Namespace::Default);
        assert_eq!(Namespace::from(""), Namespace::Default);
    }

    #[test]
    fn named_namespace_keeps_its_name() {
        let ns = Namespace::from("user_123");
        assert_eq!(ns.name(), Some("user_123"));
        assert!(!ns.is_default());
        assert_eq!(ns.to_string(), "user_123");
        assert_eq!(Namespace::Default.to_string(), "(default)");
    }

    #[test]
    fn serde_uses_optional_string() {
        let json = serde_json::to_string(&Namespace::named("group.shared")).unwrap();
        assert_eq!(json, "\"group.shared\"");
        let ns: Namespace = serde_json::from_str("null").unwrap();
        assert_eq!(ns, Namespace::Default);
        let ns: Namespace = serde_json::from_str("\"\"").unwrap();
        assert_eq!(ns, Namespace::Default);
    }
}
