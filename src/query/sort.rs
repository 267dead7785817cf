//! Sort keys (`sort=price,-ratingsAverage`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix that flips a sort key or projection field
pub const NEGATION_MARKER: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Ordered list of sort keys; earlier keys take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Parse a comma-separated key list, `-` marking descending keys
    pub fn parse(value: &str) -> Self {
        let keys = value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| match part.strip_prefix(NEGATION_MARKER) {
                Some("") => None,
                Some(field) => Some(SortKey::descending(field)),
                None => Some(SortKey::ascending(part)),
            })
            .collect();

        Self { keys }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl From<Vec<SortKey>> for SortSpec {
    fn from(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }
}

impl From<String> for SortSpec {
    fn from(value: String) -> Self {
        SortSpec::parse(&value)
    }
}

impl From<SortSpec> for String {
    fn from(spec: SortSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .keys
            .iter()
            .map(|key| match key.direction {
                SortDirection::Ascending => key.field.clone(),
                SortDirection::Descending => format!("{}{}", NEGATION_MARKER, key.field),
            })
            .collect();
        write!(f, "{}", rendered.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_directions() {
        let spec = SortSpec::parse("price,-ratingsAverage");

        assert_eq!(
            spec.keys(),
            &[
                SortKey::ascending("price"),
                SortKey::descending("ratingsAverage"),
            ]
        );
    }

    #[test]
    fn test_parse_skips_blank_parts() {
        let spec = SortSpec::parse(" price , ,-, -duration ");

        assert_eq!(
            spec.keys(),
            &[SortKey::ascending("price"), SortKey::descending("duration")]
        );
    }

    #[test]
    fn test_display_round_trips_text() {
        assert_eq!(SortSpec::parse("-createdAt,name").to_string(), "-createdAt,name");
    }

    #[test]
    fn test_serde_as_string() {
        let spec: SortSpec = serde_json::from_str("\"-price\"").unwrap();
        assert_eq!(spec.keys(), &[SortKey::descending("price")]);
        assert_eq!(serde_json::to_string(&spec).unwrap(), "\"-price\"");
    }
}
