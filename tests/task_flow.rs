mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Value, json};

use household_tasks::{config::TasksConfig, state::AppState};

use common::{
    app_state, app_state_with, create_category, create_household, create_task, register, send,
};

async fn subtask(
    state: &Arc<AppState>,
    token: &str,
    category_id: &str,
    title: &str,
    parent: Option<&str>,
) -> String {
    let task = create_task(
        state,
        token,
        json!({
            "title": title,
            "due_date": "2026-04-01T09:00:00Z",
            "category_id": category_id,
            "parent_task_id": parent
        }),
    )
    .await;
    task["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn personal_task_lifecycle_is_recorded() {
    let state = app_state().await;
    let (token, user_id) = register(&state, "ada@example.com").await;
    let category_id = create_category(&state, &token, "Kitchen", None).await;

    let task = create_task(
        &state,
        &token,
        json!({
            "title": "  Descale kettle ",
            "due_date": "2026-03-02T09:00:00Z",
            "category_id": category_id,
            "priority": "high"
        }),
    )
    .await;
    assert_eq!(task["title"], "Descale kettle");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["user_id"], user_id.as_str());
    let task_id = task["id"].as_str().unwrap();

    let complete_uri = format!("/api/v1/tasks/{task_id}/complete");
    let (status, body) = send(
        &state,
        "POST",
        &complete_uri,
        Some(&token),
        Some(json!({ "actual_minutes": 15, "notes": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "complete failed: {body}");
    assert_eq!(body["data"]["task"]["is_completed"], true);
    assert_eq!(body["data"]["task"]["actual_minutes"], 15);
    assert!(body["data"]["successor"].is_null());

    let (status, _) = send(&state, "POST", &complete_uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let reopen_uri = format!("/api/v1/tasks/{task_id}/reopen");
    let (status, body) = send(&state, "POST", &reopen_uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_completed"], false);
    assert!(body["data"]["completed_at"].is_null());

    let (status, _) = send(&state, "POST", &reopen_uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let history_uri = format!("/api/v1/tasks/{task_id}/history");
    let (status, history) = send(&state, "GET", &history_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = history["data"]["data"].as_array().unwrap();
    let actions: Vec<&str> = entries
        .iter()
        .map(|entry| entry["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["reopened", "completed", "created"]);
    assert_eq!(entries[1]["notes"], "done");
    assert_eq!(entries[1]["completed_by"], user_id.as_str());
}

#[tokio::test]
async fn other_users_cannot_see_personal_tasks() {
    let state = app_state().await;
    let (owner, _) = register(&state, "ada@example.com").await;
    let (stranger, _) = register(&state, "bob@example.com").await;
    let category_id = create_category(&state, &owner, "Garden", None).await;
    let task = create_task(
        &state,
        &owner,
        json!({
            "title": "Mow lawn",
            "due_date": "2026-03-02T09:00:00Z",
            "category_id": category_id
        }),
    )
    .await;

    let uri = format!("/api/v1/tasks/{}", task["id"].as_str().unwrap());
    let (status, body) = send(&state, "GET", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");

    let (status, list) = send(&state, "GET", "/api/v1/tasks", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"]["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn subtasks_are_listed_and_deleted_with_their_parent() {
    let state = app_state().await;
    let (token, _) = register(&state, "ada@example.com").await;
    let category_id = create_category(&state, &token, "Cleaning", None).await;
    let parent = create_task(
        &state,
        &token,
        json!({
            "title": "Spring clean",
            "due_date": "2026-04-01T09:00:00Z",
            "category_id": category_id
        }),
    )
    .await;
    let parent_id = parent["id"].as_str().unwrap();
    create_task(
        &state,
        &token,
        json!({
            "title": "Windows",
            "due_date": "2026-04-01T10:00:00Z",
            "category_id": category_id,
            "parent_task_id": parent_id
        }),
    )
    .await;

    let uri = format!("/api/v1/tasks/{parent_id}");
    let (status, detail) = send(&state, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["data"]["title"], "Spring clean");
    assert_eq!(detail["data"]["subtasks"][0]["title"], "Windows");
    assert!(detail["data"]["recurrence"].is_null());

    let (status, top_level) = send(
        &state,
        "GET",
        "/api/v1/tasks?top_level_only=true",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(top_level["data"]["data"].as_array().unwrap().len(), 1);

    let (status, deleted) = send(&state, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["data"]["removed"], 2);

    let (_, list) = send(&state, "GET", "/api/v1/tasks", Some(&token), None).await;
    assert_eq!(list["data"]["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn a_task_cannot_become_its_own_parent() {
    let state = app_state().await;
    let (token, _) = register(&state, "ada@example.com").await;
    let category_id = create_category(&state, &token, "Cleaning", None).await;
    let task = create_task(
        &state,
        &token,
        json!({
            "title": "Dust",
            "due_date": "2026-04-01T09:00:00Z",
            "category_id": category_id
        }),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();

    let uri = format!("/api/v1/tasks/{task_id}");
    let (status, _) = send(
        &state,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({ "parent_task_id": task_id })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn household_tasks_need_member_assignees() {
    let state = app_state().await;
    let (owner, owner_id) = register(&state, "ada@example.com").await;
    let (_, stranger_id) = register(&state, "bob@example.com").await;
    let household_id = create_household(&state, &owner, "Flat 3").await;
    let category_id = create_category(&state, &owner, "Bins", Some(&household_id)).await;

    let (status, _) = send(
        &state,
        "POST",
        "/api/v1/tasks",
        Some(&owner),
        Some(json!({
            "title": "Take out bins",
            "due_date": "2026-03-03T19:00:00Z",
            "category_id": category_id,
            "household_id": household_id,
            "assigned_to_id": stranger_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let task = create_task(
        &state,
        &owner,
        json!({
            "title": "Take out bins",
            "due_date": "2026-03-03T19:00:00Z",
            "category_id": category_id,
            "household_id": household_id,
            "assigned_to_id": owner_id
        }),
    )
    .await;
    assert_eq!(task["household_id"], household_id.as_str());

    let uri = format!("/api/v1/tasks?household_id={household_id}");
    let (status, list) = send(&state, "GET", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"]["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn categories_in_use_cannot_be_deleted() {
    let state = app_state().await;
    let (token, _) = register(&state, "ada@example.com").await;
    let category_id = create_category(&state, &token, "Laundry", None).await;
    create_task(
        &state,
        &token,
        json!({
            "title": "Wash towels",
            "due_date": "2026-03-02T09:00:00Z",
            "category_id": category_id
        }),
    )
    .await;

    let uri = format!("/api/v1/categories/{category_id}");
    let (status, body) = send(&state, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Category is used by 1 task(s)");

    let (status, _) = send(
        &state,
        "POST",
        "/api/v1/categories",
        Some(&token),
        Some(json!({ "name": "Laundry" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn reparenting_onto_a_descendant_is_rejected() {
    let state = app_state().await;
    let (token, _) = register(&state, "ada@example.com").await;
    let category_id = create_category(&state, &token, "Garden", None).await;
    let a = subtask(&state, &token, &category_id, "Plan beds", None).await;
    let b = subtask(&state, &token, &category_id, "Buy seeds", Some(&a)).await;
    let c = subtask(&state, &token, &category_id, "Compare prices", Some(&b)).await;

    let (status, body) = send(
        &state,
        "PATCH",
        &format!("/api/v1/tasks/{a}"),
        Some(&token),
        Some(json!({ "parent_task_id": c })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Moving the task there would create a cycle");

    let (_, detail) = send(&state, "GET", &format!("/api/v1/tasks/{a}"), Some(&token), None).await;
    assert_eq!(detail["data"]["parent_task_id"], Value::Null);
}

#[tokio::test]
async fn moving_a_subtree_counts_its_own_height() {
    let state = app_state_with(TasksConfig {
        max_tree_depth: 2,
        ..TasksConfig::default()
    })
    .await;
    let (token, _) = register(&state, "ada@example.com").await;
    let category_id = create_category(&state, &token, "Attic", None).await;
    let a1 = subtask(&state, &token, &category_id, "Clear attic", None).await;
    let a2 = subtask(&state, &token, &category_id, "Sort boxes", Some(&a1)).await;
    let b1 = subtask(&state, &token, &category_id, "Donate clothes", None).await;
    let b2 = subtask(&state, &token, &category_id, "Book pickup", Some(&b1)).await;

    // b2 would land three levels below a1.
    let b1_uri = format!("/api/v1/tasks/{b1}");
    let (status, body) = send(
        &state,
        "PATCH",
        &b1_uri,
        Some(&token),
        Some(json!({ "parent_task_id": a2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Subtasks may nest at most 2 levels deep");

    let (status, moved) = send(
        &state,
        "PATCH",
        &b1_uri,
        Some(&token),
        Some(json!({ "parent_task_id": a1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "move failed: {moved}");
    assert_eq!(moved["data"]["parent_task_id"], a1.as_str());

    let (status, _) = send(
        &state,
        "POST",
        "/api/v1/tasks",
        Some(&token),
        Some(json!({
            "title": "Confirm pickup",
            "due_date": "2026-04-01T09:00:00Z",
            "category_id": category_id,
            "parent_task_id": b2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fetched_tasks_match_what_was_created() {
    let state = app_state().await;
    let (token, user_id) = register(&state, "ada@example.com").await;
    let household_id = create_household(&state, &token, "Flat 3").await;
    let category_id = create_category(&state, &token, "Bathroom", Some(&household_id)).await;
    let created = create_task(
        &state,
        &token,
        json!({
            "title": "Scrub tiles",
            "description": "Use the soft brush",
            "due_date": "2026-05-04T16:30:00Z",
            "estimated_minutes": 40,
            "priority": "low",
            "category_id": category_id,
            "household_id": household_id,
            "assigned_to_id": user_id
        }),
    )
    .await;
    let task_id = created["id"].as_str().unwrap();

    let (status, fetched) = send(
        &state,
        "GET",
        &format!("/api/v1/tasks/{task_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fetched = &fetched["data"];
    for field in [
        "id",
        "title",
        "description",
        "is_completed",
        "completed_at",
        "due_date",
        "estimated_minutes",
        "actual_minutes",
        "priority",
        "user_id",
        "category_id",
        "household_id",
        "assigned_to_id",
        "parent_task_id",
    ] {
        assert_eq!(fetched[field], created[field], "field {field} changed");
    }
    assert_eq!(fetched["estimated_minutes"], 40);
    assert_eq!(fetched["household_id"], household_id.as_str());

    let (status, household) = send(
        &state,
        "GET",
        &format!("/api/v1/households/{household_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(household["data"]["id"], household_id.as_str());
    assert_eq!(household["data"]["name"], "Flat 3");
    assert_eq!(household["data"]["description"], Value::Null);
}
