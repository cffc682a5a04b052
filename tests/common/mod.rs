//! Fixtures shared by the integration suites.
//!
//! Every test builds its own store, so nothing leaks between tests and
//! teardown is simply dropping it.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use kcsynth_service::{
    app::{self, AppState},
    config::Config,
    models::{
        generation::GenerationTask,
        transaction::TransactionType,
        user::{Balance, CreateUserRequest, UserProfile},
    },
    services::{exchange_service, user_service},
    store::{Store, memory::MemoryStore},
    worker::queue,
};

pub const TEST_PASSWORD: &str = "testpassword123";
pub const TEST_RATE: f64 = 1.2;
/// Lowest bcrypt cost, keeps password hashing fast in debug builds.
pub const TEST_HASH_COST: u32 = 4;

/// Fresh isolated store with the exchange rate initialized.
pub async fn db_session() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    exchange_service::init_exchange_rate(store.as_ref(), TEST_RATE)
        .await
        .expect("exchange rate");
    store
}

/// Registration data with a unique email.
pub fn test_user_data() -> CreateUserRequest {
    CreateUserRequest {
        email: format!("test_{}@example.com", &Uuid::new_v4().simple().to_string()[..8]),
        password: TEST_PASSWORD.to_string(),
    }
}

pub async fn test_user(store: &dyn Store) -> UserProfile {
    user_service::create_user(store, test_user_data(), TEST_HASH_COST)
        .await
        .expect("user creation")
}

/// A user whose balance row is known to exist.
pub async fn test_user_with_balance(store: &dyn Store) -> (UserProfile, Balance) {
    let user = test_user(store).await;
    let balance = store
        .find_balance(user.id)
        .await
        .expect("balance lookup")
        .expect("new users get a balance");
    (user, balance)
}

#[derive(Debug, Clone)]
pub struct TransactionData {
    pub user_id: Uuid,
    pub amount: f64,
    pub transaction_type: TransactionType,
}

pub fn sample_transaction_data(user_id: Uuid) -> TransactionData {
    TransactionData {
        user_id,
        amount: 100.0,
        transaction_type: TransactionType::Credit,
    }
}

/// Router over a fresh store, plus the receiving end of the worker queue so
/// tests can observe published tasks.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub tasks: mpsc::Receiver<GenerationTask>,
}

pub async fn test_app() -> TestApp {
    let store = db_session().await;
    let (publisher, tasks) = queue::channel(16);
    let config = Config {
        bcrypt_cost: TEST_HASH_COST,
        ..Config::default()
    };
    let state = AppState::new(store.clone(), Arc::new(publisher), config);

    TestApp {
        router: app::router(state),
        store,
        tasks,
    }
}

/// Send one request and decode the JSON body (`Value::Null` when empty or not JSON).
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request("GET", uri, token, Body::empty())
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut req = request("POST", uri, token, Body::from(body.to_string()));
    req.headers_mut()
        .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
    req
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body).expect("request")
}

pub async fn register(router: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        router,
        post_json(
            "/register",
            None,
            serde_json::json!({ "email": email, "password": password }),
        ),
    )
    .await
}

pub async fn login(router: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    let form = format!("username={email}&password={password}");
    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .expect("request");
    send(router, req).await
}

/// Register a fresh user and return `(email, token)`.
pub async fn signed_in_user(router: &Router) -> (String, String) {
    let data = test_user_data();
    let (status, _) = register(router, &data.email, &data.password).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = login(router, &data.email, &data.password).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().expect("token").to_string();
    (data.email, token)
}
