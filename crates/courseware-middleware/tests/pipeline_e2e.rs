//! End-to-end pipeline integration tests.
//!
//! These tests run all five stages together, in production order:
//!
//! 1. Request ID
//! 2. Telemetry
//! 3. Error handler
//! 4. Authentication
//! 5. Validation

use bytes::Bytes;
use courseware_auth::{Authenticator, BasicCredentials, HashParams, IdentityResolver, SecretHasher};
use courseware_core::{CoursewareError, NewUser, User, UserId};
use courseware_middleware::{
    context::MiddlewareContext,
    pipeline::{Pipeline, Stage},
    stages::{
        AuthenticationMiddleware, ErrorHandlerMiddleware, RequestIdMiddleware, Rule, RuleSet,
        TelemetryMiddleware, UnhandledError, ValidationMiddleware, REQUEST_ID_HEADER,
    },
    BoxFuture, Request, Response, ResponseExt,
};
use courseware_store::{InMemoryStore, StoreError, StoreFuture, UserStore};
use http::{header::AUTHORIZATION, HeaderValue, Request as HttpRequest, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::Value;
use std::sync::Arc;

const CALLER_HEADER: &str = "x-test-caller";

/// A user store whose backend is always down.
struct UnavailableStore;

impl UserStore for UnavailableStore {
    fn find_by_email<'a>(&'a self, _email: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async { Err(StoreError::Unavailable("database offline".into())) })
    }

    fn find_by_id(&self, _id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async { Err(StoreError::Unavailable("database offline".into())) })
    }

    fn insert_user(&self, _user: NewUser) -> StoreFuture<'_, User> {
        Box::pin(async { Err(StoreError::Unavailable("database offline".into())) })
    }
}

fn hasher() -> SecretHasher {
    SecretHasher::new(HashParams::minimal()).unwrap()
}

async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_user(NewUser {
            first_name: "Joe".to_string(),
            last_name: "Smith".to_string(),
            email_address: "joe@smith.com".to_string(),
            password_hash: hasher().hash_blocking("joepassword").unwrap(),
        })
        .await
        .unwrap();
    store
}

fn build_pipeline(users: Arc<dyn UserStore>) -> Pipeline {
    let authentication =
        AuthenticationMiddleware::new(Authenticator::new(IdentityResolver::new(users), hasher()))
            .protect("createCourse")
            .protect("getUser");
    let validation = ValidationMiddleware::new().rules(
        "createCourse",
        RuleSet::new()
            .rule(Rule::present("title"))
            .rule(Rule::present("description")),
    );

    Pipeline::builder()
        .stage(RequestIdMiddleware::new())
        .stage(TelemetryMiddleware::new("e2e-test-service"))
        .stage(ErrorHandlerMiddleware::new(true))
        .stage(authentication)
        .stage(validation)
        .build()
}

fn make_request(method: &str, path: &str, auth: Option<(&str, &str)>, body: &str) -> Request {
    let mut builder = HttpRequest::builder().method(method).uri(path);
    if let Some((name, secret)) = auth {
        let credentials = BasicCredentials {
            name: name.to_string(),
            secret: secret.to_string(),
        };
        builder = builder.header(AUTHORIZATION, credentials.to_header_value());
    }
    builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
}

fn context(operation: &str) -> MiddlewareContext {
    let mut ctx = MiddlewareContext::new();
    ctx.set_operation_id(operation);
    ctx
}

/// Handler that answers `status` and echoes the caller it saw.
fn echo_caller(
    status: StatusCode,
) -> impl FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static {
    move |ctx, _req| {
        let caller = ctx.identity().log_id();
        Box::pin(async move {
            let mut response = Response::empty(status);
            if let Ok(value) = HeaderValue::from_str(&caller) {
                response.headers_mut().insert(CALLER_HEADER, value);
            }
            response
        })
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_stage_order() {
    let pipeline = build_pipeline(seeded_store().await);
    let expected: Vec<&str> = Stage::all().iter().map(|stage| stage.name()).collect();
    assert_eq!(pipeline.stage_names(), expected);
    assert_eq!(pipeline.stage_count(), 5);
}

#[tokio::test]
async fn test_public_operation_runs_anonymously() {
    let pipeline = build_pipeline(seeded_store().await);
    let response = pipeline
        .process(
            context("listCourses"),
            make_request("GET", "/courses", None, ""),
            echo_caller(StatusCode::OK),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CALLER_HEADER).unwrap(), "anonymous");
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_authenticated_request_reaches_handler_with_identity() {
    let pipeline = build_pipeline(seeded_store().await);
    let response = pipeline
        .process(
            context("getUser"),
            make_request("GET", "/users", Some(("joe@smith.com", "joepassword")), ""),
            echo_caller(StatusCode::OK),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CALLER_HEADER).unwrap(), "user:1");
}

#[tokio::test]
async fn test_missing_credentials_are_denied_with_request_id() {
    let pipeline = build_pipeline(seeded_store().await);
    let response = pipeline
        .process(
            context("getUser"),
            make_request("GET", "/users", None, ""),
            echo_caller(StatusCode::OK),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    assert!(response.headers().get(CALLER_HEADER).is_none());
    assert_eq!(body_json(response).await["message"], "Access Denied");
}

#[tokio::test]
async fn test_wrong_secret_never_attaches_identity() {
    let pipeline = build_pipeline(seeded_store().await);
    let response = pipeline
        .process(
            context("getUser"),
            make_request("GET", "/users", Some(("joe@smith.com", "nope")), ""),
            echo_caller(StatusCode::OK),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(CALLER_HEADER).is_none());
}

#[tokio::test]
async fn test_authentication_runs_before_validation() {
    let pipeline = build_pipeline(seeded_store().await);
    let response = pipeline
        .process(
            context("createCourse"),
            make_request("POST", "/courses", None, "{}"),
            echo_caller(StatusCode::CREATED),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validation_collects_all_errors() {
    let pipeline = build_pipeline(seeded_store().await);
    let response = pipeline
        .process(
            context("createCourse"),
            make_request("POST", "/courses", Some(("joe@smith.com", "joepassword")), "{}"),
            echo_caller(StatusCode::CREATED),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["errors"],
        serde_json::json!([
            "Please provide a value for \"title\"",
            "Please provide a value for \"description\""
        ])
    );
}

#[tokio::test]
async fn test_valid_create_passes_every_stage() {
    let pipeline = build_pipeline(seeded_store().await);
    let response = pipeline
        .process(
            context("createCourse"),
            make_request(
                "POST",
                "/courses",
                Some(("joe@smith.com", "joepassword")),
                r#"{"title":"Learn How to Program","description":"In this course..."}"#,
            ),
            echo_caller(StatusCode::CREATED),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get(CALLER_HEADER).unwrap(), "user:1");
}

#[tokio::test]
async fn test_handler_error_is_rendered_by_error_handler() {
    let pipeline = build_pipeline(seeded_store().await);
    let response = pipeline
        .process(
            context("listCourses"),
            make_request("GET", "/courses", None, ""),
            |_ctx, _req| {
                Box::pin(async {
                    UnhandledError::into_response(CoursewareError::internal_with_source(
                        "Failed to list courses",
                        std::io::Error::other("socket closed"),
                    ))
                })
            },
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let body = body_json(response).await;
    assert_eq!(body["message"], "Failed to list courses");
    assert_eq!(body["error"], serde_json::json!({}));
}

#[tokio::test]
async fn test_store_outage_during_authentication_is_internal() {
    let pipeline = build_pipeline(Arc::new(UnavailableStore));
    let response = pipeline
        .process(
            context("getUser"),
            make_request("GET", "/users", Some(("joe@smith.com", "joepassword")), ""),
            echo_caller(StatusCode::OK),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body.get("message").is_some());
    assert!(!body.to_string().contains("database offline"));
}
