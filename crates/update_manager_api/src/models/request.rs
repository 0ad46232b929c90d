//! HTTP request type definitions
//!
//! Query strings and JSON bodies accepted by the API, with conversions to
//! the core's option and input types.

use std::fmt;

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize,
};
use update_manager_core::{inputs::SerialNumbers, ListOptions};

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

/// Query parameters of `GET /archives/list`.
///
/// Every parameter is optional. Flags accept `true`/`false`, `1`/`0`,
/// `yes`/`no` and `on`/`off`.
///
/// # Example
///
/// ```text
/// /archives/list?filter_ext=update&recursive=false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListArchiveQuery {
    /// Include size, timestamps and filename metadata
    #[serde(deserialize_with = "deserialize_flag")]
    pub include_details: bool,

    /// Only list files with this extension
    pub filter_ext: Option<String>,

    /// Descend into subdirectories
    #[serde(deserialize_with = "deserialize_flag")]
    pub recursive: bool,

    /// Omit directory entries
    #[serde(deserialize_with = "deserialize_flag")]
    pub flat_structure: bool,
}

impl Default for ListArchiveQuery {
    fn default() -> Self {
        Self {
            include_details: true,
            filter_ext: None,
            recursive: true,
            flat_structure: true,
        }
    }
}

impl From<ListArchiveQuery> for ListOptions {
    fn from(query: ListArchiveQuery) -> Self {
        ListOptions {
            include_details: query.include_details,
            filter_ext: query
                .filter_ext
                .map(|ext| ext.trim().to_string())
                .filter(|ext| !ext.is_empty()),
            recursive: query.recursive,
            flat_structure: query.flat_structure,
        }
    }
}

/// Body of `POST /inputs/serial-numbers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerialNumbersRequest {
    pub serial1: String,
    pub serial2: String,
}

impl From<SerialNumbersRequest> for SerialNumbers {
    fn from(request: SerialNumbersRequest) -> Self {
        SerialNumbers {
            serial1: request.serial1,
            serial2: request.serial2,
        }
    }
}

/// Accept a boolean either natively (JSON) or as a query string token.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean flag")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
            parse_flag(value)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
