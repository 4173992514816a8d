mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use bookshelf_api::auth::{Claims, JwtKeys};
use bookshelf_api::database::memory::FailPoint;

use common::TestApp;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn health_reports_unreachable_store() -> Result<()> {
    let app = TestApp::new();
    app.store().fail_next(FailPoint::HealthCheck);

    let (status, body) = app.request(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(body["message"], "database unavailable");
    Ok(())
}

#[tokio::test]
async fn root_is_public() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Bookshelf API");
    Ok(())
}

#[tokio::test]
async fn missing_token_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/c/book/1", None, None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Auth token is not supplied");
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app
        .request(Method::POST, "/c/book/1/rating", Some("not-a-jwt"), Some(serde_json::json!({ "rating": 4 })))
        .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Auth token is not valid");
    assert!(app.store().ratings_for_book(1).is_empty());
    Ok(())
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let foreign = JwtKeys::new("some-other-secret", 1)?.issue(7, "mallory", 1)?;

    let (status, _) = app.request(Method::GET, "/c/book/1/rating", Some(&foreign), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let keys = JwtKeys::from_config(&bookshelf_api::config::AppConfig::development().security)?;

    let mut claims = Claims::new(7, "late", 1, 1);
    claims.iat -= 7200;
    claims.exp -= 7200;
    let expired = keys.generate(&claims)?;

    let (status, _) = app.request(Method::GET, "/c/book/1", Some(&expired), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn valid_token_reaches_handler() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.as_user(7, Method::GET, "/c/book/1", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isbn13"], "9780439023480");
    Ok(())
}
