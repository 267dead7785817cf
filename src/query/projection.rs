//! Field projections (`fields=name,price` or `fields=-__v`).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::sort::NEGATION_MARKER;

/// Identity field; it may be dropped from an inclusion projection
pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionField {
    pub field: String,
    pub include: bool,
}

/// Projection as written by the caller. Inclusion and exclusion entries
/// may be mixed here; [`Projection::mode`] decides whether they can be
/// applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Projection {
    fields: Vec<ProjectionField>,
}

/// How a valid projection shapes a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionMode<'a> {
    /// Keep only the listed fields, plus `id` unless it was excluded
    Include { fields: Vec<&'a str>, with_id: bool },

    /// Drop the listed fields
    Exclude(Vec<&'a str>),
}

/// Inclusion and exclusion requested for different fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedProjection {
    pub included: String,
    pub excluded: String,
}

impl fmt::Display for MixedProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot include '{}' and exclude '{}' in the same projection",
            self.included, self.excluded
        )
    }
}

impl Projection {
    /// Parse a comma-separated field list, `-` marking exclusions
    pub fn parse(value: &str) -> Self {
        let fields = value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| match part.strip_prefix(NEGATION_MARKER) {
                Some("") => None,
                Some(field) => Some(ProjectionField {
                    field: field.to_string(),
                    include: false,
                }),
                None => Some(ProjectionField {
                    field: part.to_string(),
                    include: true,
                }),
            })
            .collect();

        Self { fields }
    }

    /// Projection that drops the given fields
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|field| ProjectionField {
                    field: field.into(),
                    include: false,
                })
                .collect(),
        }
    }

    pub fn fields(&self) -> &[ProjectionField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolve the projection, rejecting mixed inclusion and exclusion
    pub fn mode(&self) -> Result<ProjectionMode<'_>, MixedProjection> {
        let included: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.include)
            .map(|f| f.field.as_str())
            .collect();
        let excluded: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| !f.include)
            .map(|f| f.field.as_str())
            .collect();

        if included.is_empty() {
            return Ok(ProjectionMode::Exclude(excluded));
        }

        if let Some(conflict) = excluded.iter().find(|field| **field != ID_FIELD) {
            return Err(MixedProjection {
                included: included[0].to_string(),
                excluded: conflict.to_string(),
            });
        }

        Ok(ProjectionMode::Include {
            fields: included,
            with_id: excluded.is_empty(),
        })
    }
}

impl From<String> for Projection {
    fn from(value: String) -> Self {
        Projection::parse(&value)
    }
}

impl From<Projection> for String {
    fn from(projection: Projection) -> Self {
        projection.to_string()
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .fields
            .iter()
            .map(|entry| {
                if entry.include {
                    entry.field.clone()
                } else {
                    format!("{}{}", NEGATION_MARKER, entry.field)
                }
            })
            .collect();
        write!(f, "{}", rendered.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusion() {
        let projection = Projection::parse("name,duration,price");

        assert_eq!(
            projection.mode().unwrap(),
            ProjectionMode::Include {
                fields: vec!["name", "duration", "price"],
                with_id: true,
            }
        );
    }

    #[test]
    fn test_exclusion() {
        let projection = Projection::parse("-__v,-createdAt");

        assert_eq!(
            projection.mode().unwrap(),
            ProjectionMode::Exclude(vec!["__v", "createdAt"])
        );
    }

    #[test]
    fn test_inclusion_may_drop_id() {
        let projection = Projection::parse("name,-id");

        assert_eq!(
            projection.mode().unwrap(),
            ProjectionMode::Include {
                fields: vec!["name"],
                with_id: false,
            }
        );
    }

    #[test]
    fn test_mixed_rejected() {
        let projection = Projection::parse("name,-price");
        let err = projection.mode().unwrap_err();

        assert_eq!(err.included, "name");
        assert_eq!(err.excluded, "price");
        assert!(err.to_string().contains("cannot include"));
    }

    #[test]
    fn test_exclude_builder() {
        let projection = Projection::exclude(["__v"]);
        assert_eq!(projection.to_string(), "-__v");
    }
}
