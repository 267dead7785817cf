//! # Tour
//!
//! Tours are listed publicly, except those flagged `secretTour`, which no
//! query ever returns. Guides are user ids and are expanded on every read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};

use super::{timestamp, Model, Relation, ValidationErrors};
use crate::query::DocumentQuery;

const NAME_MIN: usize = 10;
const NAME_MAX: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

/// GeoJSON point with optional place details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default = "default_point_type")]
    pub kind: String,

    #[serde(default)]
    pub coordinates: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

fn default_point_type() -> String {
    "Point".to_string()
}

fn default_ratings_average() -> f64 {
    4.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    pub duration: f64,

    pub max_group_size: u32,

    pub difficulty: Difficulty,

    #[serde(default = "default_ratings_average")]
    pub ratings_average: f64,

    #[serde(default)]
    pub ratings_quantity: u32,

    pub price: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<f64>,

    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub image_cover: String,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default = "Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,

    #[serde(default)]
    pub secret_tour: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<GeoPoint>,

    #[serde(default)]
    pub locations: Vec<GeoPoint>,

    #[serde(default)]
    pub guides: Vec<String>,
}

/// Duration in weeks of a tour lasting `days`
pub fn duration_weeks(days: f64) -> f64 {
    days / 7.0
}

impl Model for Tour {
    const COLLECTION: &'static str = "tours";
    const HIDDEN_FIELDS: &'static [&'static str] = &["createdAt"];
    const UNIQUE_FIELDS: &'static [&'static str] = &["name"];

    fn validate(&self) -> Result<(), ValidationErrors> {
        let name_len = self.name.chars().count();
        let mut errors = ValidationErrors::new();

        errors
            .check(!self.name.is_empty(), "name", "A tour must have a name")
            .check(
                name_len <= NAME_MAX,
                "name",
                format!("Max length of tour name is {} chars", NAME_MAX),
            )
            .check(
                name_len >= NAME_MIN,
                "name",
                format!("Min length of tour name is {} chars", NAME_MIN),
            )
            .check(self.duration > 0.0, "duration", "A tour must have a duration")
            .check(self.max_group_size > 0, "maxGroupSize", "A tour must have a group size")
            .check(
                (1.0..=5.0).contains(&self.ratings_average),
                "ratingsAverage",
                "Rating must be between 1.0 and 5.0",
            )
            .check(!self.summary.is_empty(), "summary", "A tour must have a description")
            .check(!self.image_cover.is_empty(), "imageCover", "A tour must have a cover image");

        if let Some(discount) = self.price_discount {
            errors.check(
                discount < self.price,
                "priceDiscount",
                format!("Discount price ({}) should be less than actual value", discount),
            );
        }

        errors.into_result()
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.summary = self.summary.trim().to_string();
        if let Some(description) = self.description.as_mut() {
            *description = description.trim().to_string();
        }
        self.ratings_average = (self.ratings_average * 10.0).round() / 10.0;
    }

    fn before_insert(&mut self) {
        self.slug = Some(slugify(&self.name));
    }

    fn scope_query(query: DocumentQuery) -> DocumentQuery {
        query
            .where_field("secretTour", json!({ "$ne": true }))
            .populate("guides")
    }

    fn relations() -> Vec<Relation> {
        vec![
            Relation::reference("guides", "users", "-__v"),
            Relation::virtual_list("reviews", "reviews", "tour", "-__v"),
        ]
    }

    fn computed_fields(document: &Map<String, Value>) -> Map<String, Value> {
        let mut fields = Map::new();
        let weeks = document
            .get("duration")
            .and_then(Value::as_f64)
            .map(duration_weeks)
            .and_then(Number::from_f64);
        if let Some(weeks) = weeks {
            fields.insert("durationWeeks".to_string(), Value::Number(weeks));
        }
        fields
    }
}

/// Lower-case, dash-separated form of a name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
