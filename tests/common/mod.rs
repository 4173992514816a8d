#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use bookshelf_api::app::{app, AppState};
use bookshelf_api::auth::JwtKeys;
use bookshelf_api::config::AppConfig;
use bookshelf_api::database::memory::sample_books;
use bookshelf_api::database::models::Book;
use bookshelf_api::database::MemoryRatingStore;
use bookshelf_api::ratings::{Aggregate, Histogram, StarRating};

/// Book seeded with nine ratings: one 3, three 4s and five 5s (average 4.0)
pub const SCENARIO_BOOK: i32 = 10;

pub fn star(n: i64) -> StarRating {
    StarRating::new(n).expect("star rating in range")
}

pub fn scenario_aggregate() -> Aggregate {
    Aggregate {
        count: 9,
        average: 4.0,
        histogram: Histogram::new([0, 0, 1, 3, 5]),
    }
}

/// In-memory store holding the sample catalog plus the scenario book and its rating rows
pub fn seeded_store() -> MemoryRatingStore {
    let store = MemoryRatingStore::with_books(sample_books());
    store.insert_book(
        Book::new(SCENARIO_BOOK, 9780316769488, "J.D. Salinger", 1951, "The Catcher in the Rye")
            .with_aggregate(scenario_aggregate()),
    );

    let stars = [3, 4, 4, 4, 5, 5, 5, 5, 5];
    for (offset, value) in stars.into_iter().enumerate() {
        store.seed_rating(900 + offset as i32, SCENARIO_BOOK, star(value));
    }
    store
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState<MemoryRatingStore>,
    keys: JwtKeys,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::development();
        let state = AppState::new(
            seeded_store(),
            JwtKeys::from_config(&config.security).expect("development secret"),
        );
        let keys = JwtKeys::from_config(&config.security).expect("development secret");
        let router = app(state.clone(), &config);

        Self { router, state, keys }
    }

    pub fn store(&self) -> &MemoryRatingStore {
        self.state.ratings.store()
    }

    pub fn token_for(&self, account_id: i32) -> String {
        self.keys
            .issue(account_id, &format!("reader{account_id}"), 1)
            .expect("token generation")
    }

    /// Send a request through the router; `token` adds a bearer header
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("router call failed")?;

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };
        Ok((status, json))
    }

    pub async fn as_user(
        &self,
        account_id: i32,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let token = self.token_for(account_id);
        self.request(method, uri, Some(&token), body).await
    }
}
