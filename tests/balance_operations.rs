mod common;

use common::*;
use kcsynth_service::{
    models::transaction::{Status, TransactionType},
    services::user_service,
    store::Store,
};

#[tokio::test]
async fn initial_balance_creation() {
    let store = db_session().await;
    let (user, balance) = test_user_with_balance(store.as_ref()).await;

    assert_eq!(balance.amount, 100.0);
    assert_eq!(balance.user_id, user.id);
}

#[tokio::test]
async fn initial_transaction_creation() {
    let store = db_session().await;
    let (user, _) = test_user_with_balance(store.as_ref()).await;

    let transactions = store.list_transactions(user.id).await.unwrap();
    assert_eq!(transactions.len(), 1);

    let opening = &transactions[0];
    assert_eq!(opening.user_id, user.id);
    assert_eq!(opening.amount, 100.0);
    assert_eq!(opening.transaction_type, TransactionType::Credit);
    assert_eq!(opening.transaction_status, Status::Done);
}

#[tokio::test]
async fn balance_user_relationship() {
    let store = db_session().await;
    let (user, balance) = test_user_with_balance(store.as_ref()).await;

    let profile = user_service::get_profile(store.as_ref(), user.id).await.unwrap();
    let profile_balance = profile.balance.expect("profile carries the balance");
    assert_eq!(profile_balance.amount, balance.amount);
    assert_eq!(profile_balance.id, balance.id);

    let owner = store.find_user(balance.user_id).await.unwrap().unwrap();
    assert_eq!(owner.email, user.email);
}

#[tokio::test]
async fn balance_consistency() {
    let store = db_session().await;
    let (user, _) = test_user_with_balance(store.as_ref()).await;

    let first = store.find_balance(user.id).await.unwrap().unwrap();
    let second = store.find_balance(user.id).await.unwrap().unwrap();

    assert_eq!(first.amount, second.amount);
    assert_eq!(first.id, second.id);
}
