//! Key-indexed combiners: `join`, `merge`, `zip` and `intersect_key`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use lazypipe_core::Error;

pub(crate) mod intersect;
pub(crate) mod keyed;
pub(crate) mod merge;
pub(crate) mod zip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl FromStr for JoinType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INNER" => Ok(JoinType::Inner),
            "LEFT" => Ok(JoinType::Left),
            "RIGHT" => Ok(JoinType::Right),
            "FULL" => Ok(JoinType::Full),
            _ => Err(Error::InvalidArgument(format!("Invalid join type '{}'", s))),
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Full => "FULL",
        })
    }
}

/// What a secondary pipeline's keys are matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOn {
    /// Secondary keys match the value of this primary property.
    Property(String),
    /// Secondary keys match primary keys directly.
    Key,
}

impl From<&str> for JoinOn {
    fn from(property: &str) -> Self {
        JoinOn::Property(property.to_string())
    }
}

impl From<String> for JoinOn {
    fn from(property: String) -> Self {
        JoinOn::Property(property)
    }
}

/// Two-source join on an explicit field pair.
///
/// `left_field` / `right_field` default to the entry key; `into` defaults to
/// the secondary pipeline's label. The join kind defaults to `Left`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSpec {
    pub into: Option<String>,
    pub left_field: Option<String>,
    pub right_field: Option<String>,
    pub kind: JoinType,
}

impl Default for MergeSpec {
    fn default() -> Self {
        Self {
            into: None,
            left_field: None,
            right_field: None,
            kind: JoinType::Left,
        }
    }
}

impl MergeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where matched secondary values are written in the primary record.
    pub fn into_path(mut self, path: impl Into<String>) -> Self {
        self.into = Some(path.into());
        self
    }

    pub fn on(mut self, left_field: impl Into<String>, right_field: impl Into<String>) -> Self {
        self.left_field = Some(left_field.into());
        self.right_field = Some(right_field.into());
        self
    }

    pub fn left_field(mut self, field: impl Into<String>) -> Self {
        self.left_field = Some(field.into());
        self
    }

    pub fn right_field(mut self, field: impl Into<String>) -> Self {
        self.right_field = Some(field.into());
        self
    }

    pub fn kind(mut self, kind: JoinType) -> Self {
        self.kind = kind;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_type_parsing() {
        assert_eq!("inner".parse::<JoinType>().unwrap(), JoinType::Inner);
        assert_eq!(" Left ".parse::<JoinType>().unwrap(), JoinType::Left);
        assert_eq!(JoinType::Full.to_string(), "FULL");
        match "OUTER".parse::<JoinType>() {
            Err(Error::InvalidArgument(msg)) => assert!(msg.contains("Invalid join type")),
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn merge_spec_defaults_to_left() {
        let spec = MergeSpec::new().into_path("city").on("city_id", "id");
        assert_eq!(spec.kind, JoinType::Left);
        assert_eq!(spec.into.as_deref(), Some("city"));
        assert_eq!(spec.right_field.as_deref(), Some("id"));
    }

    #[test]
    fn join_type_serde() {
        let t: JoinType = serde_json::from_str("\"RIGHT\"").unwrap();
        assert_eq!(t, JoinType::Right);
    }
}
