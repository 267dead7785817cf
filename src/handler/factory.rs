//! # Record Handler
//!
//! The five generic record operations, written once and instantiated per
//! collection. A handler knows nothing about its document type beyond
//! what [`Model`] exposes.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::errors::{AppError, AppResult};
use super::response::Reply;
use crate::collection::{Collection, Record};
use crate::models::Model;
use crate::observability::{Logger, ObservationScope};
use crate::query::{DocumentQuery, FilterDocument, QueryDefaults, QueryFeatures, QuerySpec};

/// Inputs of a list request
#[derive(Debug, Clone, Default)]
pub struct ListContext {
    pub spec: QuerySpec,

    /// Parent document id when listing under a parent route
    pub parent_id: Option<String>,
}

impl ListContext {
    pub fn new(spec: QuerySpec) -> Self {
        Self {
            spec,
            parent_id: None,
        }
    }

    pub fn nested(spec: QuerySpec, parent_id: impl Into<String>) -> Self {
        Self {
            spec,
            parent_id: Some(parent_id.into()),
        }
    }
}

/// Generic CRUD handler over one collection
pub struct RecordHandler<C: Collection> {
    collection: Arc<C>,
    defaults: Arc<QueryDefaults>,
    populate: Vec<String>,
}

impl<C: Collection> Clone for RecordHandler<C> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            defaults: self.defaults.clone(),
            populate: self.populate.clone(),
        }
    }
}

impl<C: Collection> RecordHandler<C> {
    pub fn new(collection: C, defaults: Arc<QueryDefaults>) -> Self {
        Self {
            collection: Arc::new(collection),
            defaults,
            populate: Vec::new(),
        }
    }

    /// Relations expanded by `get_one`
    pub fn with_populate<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.populate = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    fn collection_name(&self) -> &'static str {
        <C::Model as Model>::COLLECTION
    }

    pub async fn create_one(&self, payload: Value) -> AppResult<Reply<Record>> {
        let payload = into_object(payload)?;
        let record = self.collection.insert(payload).await?;

        Logger::info(
            "RECORD_CREATED",
            &[
                ("collection", self.collection_name()),
                ("id", record.id().unwrap_or_default()),
            ],
        );
        Ok(Reply::created(record))
    }

    /// Create under a parent, filling the parent reference when the
    /// payload leaves it out
    pub async fn create_nested(&self, parent_id: &str, payload: Value) -> AppResult<Reply<Record>> {
        let mut payload = into_object(payload)?;

        if let Some(field) = <C::Model as Model>::PARENT_FIELD {
            payload
                .entry(field)
                .or_insert_with(|| Value::String(parent_id.to_string()));
        }

        self.create_one(Value::Object(payload)).await
    }

    pub async fn get_one(&self, id: &str) -> AppResult<Reply<Record>> {
        self.collection
            .find_by_id(id, &self.populate)
            .await?
            .map(Reply::ok)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Translate a list request into the query `get_all` executes
    pub fn build_query(&self, ctx: &ListContext) -> DocumentQuery {
        let base = self.collection.find(FilterDocument::new());
        let query = QueryFeatures::new(base, &ctx.spec, &self.defaults)
            .apply_all()
            .into_query();

        // Parent constraint goes last so it overrides any explicit filter
        match (ctx.parent_id.as_deref(), <C::Model as Model>::PARENT_FIELD) {
            (Some(parent_id), Some(field)) => query.where_field(field, Value::String(parent_id.to_string())),
            _ => query,
        }
    }

    pub async fn get_all(&self, ctx: &ListContext) -> AppResult<Reply<Vec<Record>>> {
        let query = self.build_query(ctx);
        let scope = ObservationScope::with_fields("QUERY", &[("collection", self.collection_name())]);

        match self.collection.exec(query).await {
            Ok(records) => {
                let results = records.len();
                let count = results.to_string();
                scope.complete_with_fields(&[("results", count.as_str())]);
                Ok(Reply::list(records, results))
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn update_one(&self, id: &str, patch: Value) -> AppResult<Reply<Record>> {
        let patch = into_object(patch)?;
        let record = self
            .collection
            .update_by_id(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        Logger::info(
            "RECORD_UPDATED",
            &[("collection", self.collection_name()), ("id", id)],
        );
        Ok(Reply::ok(record))
    }

    pub async fn delete_one(&self, id: &str) -> AppResult<Reply<Record>> {
        self.collection
            .delete_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        Logger::info(
            "RECORD_DELETED",
            &[("collection", self.collection_name()), ("id", id)],
        );
        Ok(Reply::no_content())
    }
}

fn into_object(payload: Value) -> AppResult<Map<String, Value>> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(AppError::InvalidBody(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{MemoryCollection, MemoryDatabase};
    use crate::models::{Review, Tour, User};
    use axum::http::StatusCode;
    use serde_json::json;

    struct Fixture {
        tours: RecordHandler<MemoryCollection<Tour>>,
        reviews: RecordHandler<MemoryCollection<Review>>,
        users: RecordHandler<MemoryCollection<User>>,
    }

    fn fixture() -> Fixture {
        let db = MemoryDatabase::new();
        let defaults = Arc::new(QueryDefaults::default());

        Fixture {
            tours: RecordHandler::new(db.collection::<Tour>().unwrap(), defaults.clone())
                .with_populate(["reviews"]),
            reviews: RecordHandler::new(db.collection::<Review>().unwrap(), defaults.clone()),
            users: RecordHandler::new(db.collection::<User>().unwrap(), defaults),
        }
    }

    fn tour(name: &str, difficulty: &str, price: u32, created_at: &str) -> Value {
        json!({
            "name": name,
            "duration": 5,
            "maxGroupSize": 10,
            "difficulty": difficulty,
            "price": price,
            "summary": "A tour worth taking",
            "imageCover": "cover.jpg",
            "createdAt": created_at
        })
    }

    async fn seed_tours(handler: &RecordHandler<MemoryCollection<Tour>>) -> Vec<String> {
        let mut ids = Vec::new();
        for (i, (name, difficulty, price)) in [
            ("The Forest Hiker", "easy", 397),
            ("The Sea Explorer", "medium", 497),
            ("The Park Camper", "easy", 1497),
            ("The Sports Lover", "difficult", 2997),
            ("The City Wanderer", "easy", 1197),
        ]
        .into_iter()
        .enumerate()
        {
            let created_at = format!("2026-01-0{}T00:00:00.000Z", i + 1);
            let reply = handler
                .create_one(tour(name, difficulty, price, &created_at))
                .await
                .unwrap();
            ids.push(reply.data().unwrap().id().unwrap().to_string());
        }
        ids
    }

    fn names(reply: &Reply<Vec<Record>>) -> Vec<&str> {
        reply
            .data()
            .unwrap()
            .iter()
            .map(|r| r.get("name").and_then(Value::as_str).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_create_needs_no_query_keys() {
        let f = fixture();
        let reply = f
            .tours
            .create_one(tour("The Forest Hiker", "easy", 397, "2026-01-01T00:00:00.000Z"))
            .await
            .unwrap();

        assert_eq!(reply.status_code, StatusCode::CREATED);
        assert_eq!(reply.data().unwrap().get("slug"), Some(&json!("the-forest-hiker")));
    }

    #[tokio::test]
    async fn test_create_rejects_non_object() {
        let f = fixture();
        let err = f.tours.create_one(json!([1, 2, 3])).await.unwrap_err();
        assert_eq!(err, AppError::InvalidBody("expected a JSON object, got an array".to_string()));
    }

    #[tokio::test]
    async fn test_create_validation_propagates() {
        let f = fixture();
        let err = f
            .users
            .create_one(json!({ "name": "Nobody", "email": "not-an-email" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_get_all_easy_tours_by_price() {
        let f = fixture();
        seed_tours(&f.tours).await;

        let spec = QuerySpec::new()
            .with("difficulty", "easy")
            .with("sort", "-price")
            .with("limit", "2")
            .with("page", "1");
        let reply = f.tours.get_all(&ListContext::new(spec)).await.unwrap();

        assert_eq!(reply.envelope.results, Some(2));
        assert_eq!(names(&reply), vec!["The Park Camper", "The City Wanderer"]);
    }

    #[tokio::test]
    async fn test_get_all_defaults_to_newest_first() {
        let f = fixture();
        seed_tours(&f.tours).await;

        let reply = f.tours.get_all(&ListContext::default()).await.unwrap();

        assert_eq!(reply.envelope.results, Some(5));
        assert_eq!(names(&reply)[0], "The City Wanderer");
        assert!(reply.data().unwrap()[0].get("__v").is_none());
    }

    #[tokio::test]
    async fn test_get_all_operator_filter() {
        let f = fixture();
        seed_tours(&f.tours).await;

        let spec = QuerySpec::from_pairs([("price[gte]", "1000"), ("sort", "price")]);
        let reply = f.tours.get_all(&ListContext::new(spec)).await.unwrap();

        assert_eq!(names(&reply), vec!["The City Wanderer", "The Park Camper", "The Sports Lover"]);
    }

    #[tokio::test]
    async fn test_get_all_second_page() {
        let f = fixture();
        seed_tours(&f.tours).await;

        let spec = QuerySpec::new().with("sort", "price").with("limit", "2").with("page", "2");
        let reply = f.tours.get_all(&ListContext::new(spec)).await.unwrap();

        assert_eq!(names(&reply), vec!["The City Wanderer", "The Park Camper"]);
    }

    #[tokio::test]
    async fn test_get_all_mixed_projection_fails() {
        let f = fixture();
        seed_tours(&f.tours).await;

        let spec = QuerySpec::new().with("fields", "name,-price");
        let err = f.tours.get_all(&ListContext::new(spec)).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedQuery(_)));
    }

    #[tokio::test]
    async fn test_nested_parent_wins_over_explicit_filter() {
        let f = fixture();
        let ids = seed_tours(&f.tours).await;
        let user = f
            .users
            .create_one(json!({ "name": "Lourdes Browning", "email": "loulou@example.io" }))
            .await
            .unwrap();
        let user_id = user.data().unwrap().id().unwrap().to_string();

        for (tour_id, text) in [(&ids[0], "Great hike"), (&ids[1], "Wet but fun"), (&ids[0], "Again!")] {
            f.reviews
                .create_nested(tour_id, json!({ "review": text, "rating": 5, "user": user_id }))
                .await
                .unwrap();
        }

        let spec = QuerySpec::new().with("tour", ids[1].as_str());
        let ctx = ListContext::nested(spec, ids[0].clone());

        let query = f.reviews.build_query(&ctx);
        assert_eq!(query.filter_document()["tour"], json!(ids[0]));

        let reply = f.reviews.get_all(&ctx).await.unwrap();
        assert_eq!(reply.envelope.results, Some(2));
        for record in reply.data().unwrap() {
            assert_eq!(record.get("tour"), Some(&json!(ids[0])));
            assert_eq!(record.get("user.name"), Some(&json!("Lourdes Browning")));
        }
    }

    #[tokio::test]
    async fn test_create_nested_keeps_explicit_parent() {
        let f = fixture();
        let reply = f
            .reviews
            .create_nested("t1", json!({ "review": "Nice", "tour": "t2", "user": "u1" }))
            .await
            .unwrap();
        assert_eq!(reply.data().unwrap().get("tour"), Some(&json!("t2")));
    }

    #[tokio::test]
    async fn test_get_one_populates_reviews() {
        let f = fixture();
        let ids = seed_tours(&f.tours).await;
        f.reviews
            .create_nested(&ids[2], json!({ "review": "Cozy", "user": "u1" }))
            .await
            .unwrap();

        let reply = f.tours.get_one(&ids[2]).await.unwrap();
        let reviews = reply.data().unwrap().get("reviews").unwrap().as_array().unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0]["review"], "Cozy");
    }

    #[tokio::test]
    async fn test_get_one_missing() {
        let f = fixture();
        let err = f.tours.get_one("missing").await.unwrap_err();
        assert_eq!(err, AppError::NotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn test_update_revalidates() {
        let f = fixture();
        let ids = seed_tours(&f.tours).await;

        let reply = f.tours.update_one(&ids[0], json!({ "price": 420 })).await.unwrap();
        assert_eq!(reply.data().unwrap().get("price"), Some(&json!(420.0)));

        let err = f
            .tours
            .update_one(&ids[0], json!({ "ratingsAverage": 7 }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(_)));

        let err = f.tours.update_one("missing", json!({ "price": 1 })).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duration_weeks_on_reads() {
        let f = fixture();
        let mut payload = tour("The Snow Adventurer", "difficult", 997, "2026-02-01T00:00:00.000Z");
        payload["duration"] = json!(14);
        let created = f.tours.create_one(payload).await.unwrap();
        let id = created.data().unwrap().id().unwrap().to_string();
        assert_eq!(created.data().unwrap().get("durationWeeks"), Some(&json!(2.0)));

        let reply = f.tours.get_one(&id).await.unwrap();
        assert_eq!(reply.data().unwrap().get("durationWeeks"), Some(&json!(2.0)));

        let spec = QuerySpec::new().with("fields", "name");
        let listed = f.tours.get_all(&ListContext::new(spec)).await.unwrap();
        assert!(listed.data().unwrap()[0].get("durationWeeks").is_none());
    }

    #[tokio::test]
    async fn test_update_returns_populated_guides() {
        let f = fixture();
        let ids = seed_tours(&f.tours).await;
        let guide = f
            .users
            .create_one(json!({ "name": "Miyah Myles", "email": "miyah@example.io", "role": "guide" }))
            .await
            .unwrap();
        let guide_id = guide.data().unwrap().id().unwrap().to_string();

        let reply = f
            .tours
            .update_one(&ids[1], json!({ "guides": [guide_id] }))
            .await
            .unwrap();

        let guides = reply.data().unwrap().get("guides").unwrap().as_array().unwrap();
        assert_eq!(guides[0]["name"], "Miyah Myles");
        assert_eq!(reply.data().unwrap().get("durationWeeks"), Some(&json!(5.0 / 7.0)));
    }

    #[tokio::test]
    async fn test_delete() {
        let f = fixture();
        let ids = seed_tours(&f.tours).await;

        let reply = f.tours.delete_one(&ids[0]).await.unwrap();
        assert_eq!(reply.status_code, StatusCode::NO_CONTENT);
        assert!(reply.envelope.data.is_none());

        let err = f.tours.delete_one(&ids[0]).await.unwrap_err();
        assert_eq!(err, AppError::NotFound(ids[0].clone()));
    }
}
