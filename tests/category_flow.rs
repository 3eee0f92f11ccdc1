mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use household_tasks::{
    db::dao::{CategoryDao, CategoryScope, DaoBase},
    error::AppError,
};

use common::{app_state, create_category, create_household, register, send};

#[tokio::test]
async fn household_names_are_unique_within_the_household() {
    let state = app_state().await;
    let (token, _) = register(&state, "ada@example.com").await;
    let household_id = create_household(&state, &token, "Flat 3").await;
    let other_household = create_household(&state, &token, "Cabin").await;
    create_category(&state, &token, "Kitchen", Some(&household_id)).await;

    let (status, body) = send(
        &state,
        "POST",
        "/api/v1/categories",
        Some(&token),
        Some(json!({ "name": "Kitchen", "household_id": household_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "duplicate accepted: {body}");

    // Same name elsewhere is fine.
    create_category(&state, &token, "Kitchen", Some(&other_household)).await;
    create_category(&state, &token, "Kitchen", None).await;
}

#[tokio::test]
async fn renaming_onto_a_taken_name_is_a_conflict() {
    let state = app_state().await;
    let (token, _) = register(&state, "ada@example.com").await;
    create_category(&state, &token, "Garden", None).await;
    let shed = create_category(&state, &token, "Shed", None).await;

    let (status, _) = send(
        &state,
        "PATCH",
        &format!("/api/v1/categories/{shed}"),
        Some(&token),
        Some(json!({ "name": "Garden" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn the_database_rejects_duplicates_the_service_never_saw() {
    let state = app_state().await;
    let (token, _) = register(&state, "ada@example.com").await;
    let household_id: Uuid = create_household(&state, &token, "Flat 3")
        .await
        .parse()
        .unwrap();
    let dao = CategoryDao::new(&state.db);

    for scope in [CategoryScope::Unscoped, CategoryScope::Household(household_id)] {
        dao.create_category("Pantry", None, None, scope)
            .await
            .expect("first insert succeeds");
        let err = dao
            .create_category("Pantry", None, None, scope)
            .await
            .expect_err("second insert must hit the unique index");
        assert!(
            matches!(AppError::from(err), AppError::Conflict(_)),
            "scope {scope:?} allowed a duplicate"
        );
    }
}
