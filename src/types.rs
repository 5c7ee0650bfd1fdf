//! Wire and value types shared between the session, the capability
//! interface and the bridge commands.

use crate::errors::ControlError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three value shapes a configuration node can take, derived from the
/// node's native type tag.
///
/// `IntegerLike` covers boolean toggles and date/time fields; everything
/// that is not a range or an integer is treated as a string, optionally
/// with an enumerated choice list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigKind {
    Float,
    IntegerLike,
    StringChoice,
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigKind::Float => "a float",
            ConfigKind::IntegerLike => "an integer",
            ConfigKind::StringChoice => "a string",
        };
        write!(f, "{}", name)
    }
}

/// One configuration item as reported to the caller.
///
/// `value` is always populated on success (an empty string is a legitimate
/// value for unset text fields); `choices` is empty rather than absent when
/// the node has no enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub value: String,
    pub choices: Vec<String>,
    pub read_only: bool,
}

/// A single in-memory preview capture. The caller owns the buffer; the
/// session keeps no reference to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewFrame {
    pub size: usize,
    pub data: Vec<u8>,
}

impl PreviewFrame {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            size: data.len(),
            data,
        }
    }
}

/// The native representation of a configuration value, chosen by kind.
///
/// Shared by the read and write paths so the kind dispatch lives in exactly
/// one place.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Float(f32),
    Integer(i32),
    Text(String),
}

impl NativeValue {
    /// Convert an incoming wire string into the native representation for
    /// the given kind. A parse failure is a caller-input error and never a
    /// device fault.
    pub fn parse(name: &str, kind: ConfigKind, raw: &str) -> Result<Self, ControlError> {
        match kind {
            ConfigKind::Float => raw
                .trim()
                .parse::<f32>()
                .map(NativeValue::Float)
                .map_err(|_| ControlError::bad_value(name, kind, raw)),
            ConfigKind::IntegerLike => raw
                .trim()
                .parse::<i32>()
                .map(NativeValue::Integer)
                .map_err(|_| ControlError::bad_value(name, kind, raw)),
            ConfigKind::StringChoice => Ok(NativeValue::Text(raw.to_string())),
        }
    }

    /// Canonical wire rendering of the value.
    pub fn render(&self) -> String {
        match self {
            NativeValue::Float(v) => v.to_string(),
            NativeValue::Integer(v) => v.to_string(),
            NativeValue::Text(v) => v.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dispatches_on_kind() {
        assert_eq!(
            NativeValue::parse("shutterspeed", ConfigKind::Float, "0.005").unwrap(),
            NativeValue::Float(0.005)
        );
        assert_eq!(
            NativeValue::parse("iso", ConfigKind::IntegerLike, "800").unwrap(),
            NativeValue::Integer(800)
        );
        assert_eq!(
            NativeValue::parse("whitebalance", ConfigKind::StringChoice, "Auto").unwrap(),
            NativeValue::Text("Auto".to_string())
        );
    }

    #[test]
    fn parse_failure_names_the_expected_kind() {
        let err = NativeValue::parse("iso", ConfigKind::IntegerLike, "fast").unwrap_err();
        assert!(err.to_string().contains("an integer"));
        assert!(!err.invalidates_session());
    }

    #[test]
    fn render_round_trips_integers() {
        let value = NativeValue::parse("iso", ConfigKind::IntegerLike, "400").unwrap();
        assert_eq!(value.render(), "400");
    }

    #[test]
    fn strings_pass_through_untrimmed() {
        let value = NativeValue::parse("artist", ConfigKind::StringChoice, "  A. Adams ").unwrap();
        assert_eq!(value.render(), "  A. Adams ");
    }

    #[test]
    fn config_item_serializes_with_snake_case_fields() {
        let item = ConfigItem {
            value: "400".to_string(),
            choices: vec![],
            read_only: false,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"read_only\":false"));
        assert!(json.contains("\"choices\":[]"));
    }
}
