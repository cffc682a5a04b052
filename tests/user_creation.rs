mod common;

use common::*;
use kcsynth_service::{
    error::AppError,
    models::user::CreateUserRequest,
    services::{auth_service, user_service},
    store::Store,
};

#[tokio::test]
async fn create_user_success() {
    let store = db_session().await;
    let data = test_user_data();

    let created = user_service::create_user(store.as_ref(), data.clone(), TEST_HASH_COST)
        .await
        .unwrap();
    assert_eq!(created.email, data.email);

    let stored = store.find_user(created.id).await.unwrap().unwrap();
    assert_eq!(stored.email, data.email);
    assert_ne!(stored.password_hash, data.password);
    assert!(auth_service::verify_password(&data.password, &stored.password_hash));
}

#[tokio::test]
async fn create_user_duplicate_email() {
    let store = db_session().await;
    let existing = test_user(store.as_ref()).await;

    let result = user_service::create_user(
        store.as_ref(),
        CreateUserRequest {
            email: existing.email.clone(),
            password: "anotherpassword123".to_string(),
        },
        TEST_HASH_COST,
    )
    .await;

    assert!(matches!(result, Err(AppError::EmailTaken)));
    assert_eq!(store.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_user_invalid_email() {
    let store = db_session().await;

    for email in ["", "invalid-email", "@example.com", "user@"] {
        let result = user_service::create_user(
            store.as_ref(),
            CreateUserRequest {
                email: email.to_string(),
                password: TEST_PASSWORD.to_string(),
            },
            TEST_HASH_COST,
        )
        .await;
        assert!(
            matches!(result, Err(AppError::InvalidRequest(_))),
            "{email:?} should be rejected"
        );
    }

    assert!(store.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_user_short_password() {
    let store = db_session().await;
    let result = user_service::create_user(
        store.as_ref(),
        CreateUserRequest {
            email: test_user_data().email,
            password: "123".to_string(),
        },
        TEST_HASH_COST,
    )
    .await;

    assert!(matches!(result, Err(AppError::InvalidRequest(_))));
}

#[tokio::test]
async fn create_user_stores_bcrypt_hash() {
    let store = db_session().await;
    let user = test_user(store.as_ref()).await;

    let stored = store.find_user(user.id).await.unwrap().unwrap();
    assert!(stored.password_hash.starts_with("$2b$04$"));
    assert!(auth_service::verify_password(TEST_PASSWORD, &stored.password_hash));
    assert!(!auth_service::verify_password("wrongpassword", &stored.password_hash));
}

#[tokio::test]
async fn delete_user_removes_owned_rows() {
    let store = db_session().await;
    let user = test_user(store.as_ref()).await;

    user_service::delete_user(store.as_ref(), user.id).await.unwrap();

    assert!(store.find_user(user.id).await.unwrap().is_none());
    assert!(store.find_balance(user.id).await.unwrap().is_none());
    assert!(store.list_transactions(user.id).await.unwrap().is_empty());
    assert!(matches!(
        user_service::delete_user(store.as_ref(), user.id).await,
        Err(AppError::UserNotFound)
    ));
}
