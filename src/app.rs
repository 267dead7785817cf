//! # Application State
//!
//! One in-memory database with a record handler per collection. The HTTP
//! server and the CLI both work against an [`App`].

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::collection::{CollectionResult, MemoryCollection, MemoryDatabase};
use crate::handler::{AppResult, RecordHandler};
use crate::models::{Review, Tour, User};
use crate::observability::ObservationScope;
use crate::query::QueryDefaults;

pub type TourHandler = RecordHandler<MemoryCollection<Tour>>;
pub type ReviewHandler = RecordHandler<MemoryCollection<Review>>;
pub type UserHandler = RecordHandler<MemoryCollection<User>>;

/// Relations expanded when a single tour is read
pub const TOUR_DETAIL_POPULATE: [&str; 2] = ["guides", "reviews"];

#[derive(Clone)]
pub struct App {
    pub db: MemoryDatabase,
    pub tours: Arc<TourHandler>,
    pub reviews: Arc<ReviewHandler>,
    pub users: Arc<UserHandler>,
}

impl App {
    pub fn new(defaults: QueryDefaults) -> CollectionResult<Self> {
        let db = MemoryDatabase::new();
        let defaults = Arc::new(defaults);

        let users = RecordHandler::new(db.collection::<User>()?, defaults.clone());
        let tours = RecordHandler::new(db.collection::<Tour>()?, defaults.clone())
            .with_populate(TOUR_DETAIL_POPULATE);
        let reviews = RecordHandler::new(db.collection::<Review>()?, defaults);

        Ok(Self {
            db,
            tours: Arc::new(tours),
            reviews: Arc::new(reviews),
            users: Arc::new(users),
        })
    }

    /// Insert seed documents. Users go first so tours and reviews can
    /// reference them by id.
    pub async fn seed(&self, data: SeedData) -> AppResult<SeedSummary> {
        let scope = ObservationScope::new("SEED");
        match self.seed_all(data).await {
            Ok(summary) => {
                let users = summary.users.to_string();
                let tours = summary.tours.to_string();
                let reviews = summary.reviews.to_string();
                scope.complete_with_fields(&[
                    ("users", users.as_str()),
                    ("tours", tours.as_str()),
                    ("reviews", reviews.as_str()),
                ]);
                Ok(summary)
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    async fn seed_all(&self, data: SeedData) -> AppResult<SeedSummary> {
        let mut summary = SeedSummary::default();

        for user in data.users {
            self.users.create_one(user).await?;
            summary.users += 1;
        }
        for tour in data.tours {
            self.tours.create_one(tour).await?;
            summary.tours += 1;
        }
        for review in data.reviews {
            self.reviews.create_one(review).await?;
            summary.reviews += 1;
        }

        Ok(summary)
    }
}

/// Documents loaded at startup, each list in insertion order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<Value>,

    #[serde(default)]
    pub tours: Vec<Value>,

    #[serde(default)]
    pub reviews: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub tours: usize,
    pub reviews: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::handler::AppError;
    use serde_json::json;

    fn seed() -> SeedData {
        serde_json::from_value(json!({
            "users": [
                { "id": "u1", "name": "Lisa Brown", "email": "lisa@example.io", "role": "guide" }
            ],
            "tours": [{
                "id": "t1",
                "name": "The Forest Hiker",
                "duration": 5,
                "maxGroupSize": 25,
                "difficulty": "easy",
                "price": 397,
                "summary": "Breathtaking hike through the Canadian Banff National Park",
                "imageCover": "tour-1-cover.jpg",
                "guides": ["u1"]
            }],
            "reviews": [
                { "review": "Unforgettable", "rating": 5, "tour": "t1", "user": "u1" }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_seed_and_read_detail() {
        let app = App::new(QueryDefaults::default()).unwrap();
        let summary = app.seed(seed()).await.unwrap();
        assert_eq!(summary, SeedSummary { users: 1, tours: 1, reviews: 1 });

        let reply = app.tours.get_one("t1").await.unwrap();
        let tour = reply.data().unwrap();
        assert_eq!(tour.get("guides").unwrap()[0]["name"], "Lisa Brown");
        assert_eq!(tour.get("reviews").unwrap()[0]["review"], "Unforgettable");
    }

    #[tokio::test]
    async fn test_seed_stops_on_invalid_document() {
        let app = App::new(QueryDefaults::default()).unwrap();
        let mut data = seed();
        data.users.push(json!({ "name": "Twin", "email": "lisa@example.io" }));

        let err = app.seed(data).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey { .. }));
        assert!(app.tours.collection().is_empty().unwrap());
        assert!(app.tours.collection().find_by_id("t1", &[]).await.unwrap().is_none());
    }
}
