//! Reviews belong to a tour and are written by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Model, Relation, ValidationErrors};
use crate::query::DocumentQuery;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub review: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(default = "Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// Id of the reviewed tour
    pub tour: String,

    /// Id of the author
    pub user: String,
}

impl Model for Review {
    const COLLECTION: &'static str = "reviews";
    const PARENT_FIELD: Option<&'static str> = Some("tour");

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors
            .check(!self.review.trim().is_empty(), "review", "Review can not be empty")
            .check(!self.tour.is_empty(), "tour", "Review must belong to a tour")
            .check(!self.user.is_empty(), "user", "Review must belong to a user");

        if let Some(rating) = self.rating {
            errors.check(
                (1.0..=5.0).contains(&rating),
                "rating",
                "Rating must be between 1 and 5",
            );
        }

        errors.into_result()
    }

    fn normalize(&mut self) {
        self.review = self.review.trim().to_string();
    }

    fn scope_query(query: DocumentQuery) -> DocumentQuery {
        query.populate("user")
    }

    fn relations() -> Vec<Relation> {
        vec![
            Relation::reference("user", "users", "name,photo"),
            Relation::reference("tour", "tours", "name"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_review() {
        let review: Review = serde_json::from_value(json!({
            "review": "Amazing tour!",
            "rating": 5,
            "tour": "t1",
            "user": "u1"
        }))
        .unwrap();

        assert!(review.validate().is_ok());
    }

    #[test]
    fn test_rating_out_of_range() {
        let review: Review = serde_json::from_value(json!({
            "review": "Too good",
            "rating": 6,
            "tour": "t1",
            "user": "u1"
        }))
        .unwrap();

        let errors = review.validate().unwrap_err();
        assert_eq!(errors.errors()[0].field, "rating");
    }

    #[test]
    fn test_blank_review_rejected() {
        let review: Review = serde_json::from_value(json!({
            "review": "   ",
            "tour": "t1",
            "user": "u1"
        }))
        .unwrap();

        assert!(review.validate().is_err());
    }

    #[test]
    fn test_parent_field() {
        assert_eq!(Review::PARENT_FIELD, Some("tour"));
    }
}
