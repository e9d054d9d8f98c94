/// End-to-end tests for projects, tasks, comments, and cross-tenant
/// isolation.
///
/// Requires `DATABASE_URL` pointing at a migrated test database.

mod common;

use axum::http::StatusCode;
use common::{unique_org_name, TestContext};
use serde_json::json;
use taskdeck_shared::models::{
    organization::Organization,
    user::{OrgRole, User},
};
use uuid::Uuid;

/// Creates an organization with an admin, returning (org, admin, admin token)
async fn org_with_admin(ctx: &TestContext) -> (Organization, User, String) {
    let org = Organization::create(&ctx.db, &unique_org_name("pt-test"))
        .await
        .unwrap();
    let admin = ctx.create_member(org.id, OrgRole::Admin).await.unwrap();
    let token = ctx.access_token(&admin);

    (org, admin, token)
}

/// Creates a project through the API, returning its ID
async fn create_project(ctx: &TestContext, token: &str, name: &str) -> Uuid {
    let (status, body) = ctx
        .request(
            "POST",
            "/v1/projects",
            Some(token),
            Some(json!({ "name": name })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    body["id"].as_str().unwrap().parse().unwrap()
}

/// Creates a task through the API, returning its ID
async fn create_task(ctx: &TestContext, token: &str, project_id: Uuid, title: &str) -> Uuid {
    let (status, body) = ctx
        .request(
            "POST",
            "/v1/tasks",
            Some(token),
            Some(json!({ "project_id": project_id, "title": title })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "TODO");

    body["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_project_creation_defaults_manager_to_creator() {
    let ctx = TestContext::new().await.unwrap();
    let (_, admin, token) = org_with_admin(&ctx).await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/projects",
            Some(&token),
            Some(json!({ "name": "Rollout" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["manager_id"], admin.id.to_string());
    assert_eq!(body["status"], "ACTIVE");
}

#[tokio::test]
async fn test_member_cannot_create_project() {
    let ctx = TestContext::new().await.unwrap();
    let (org, _, _) = org_with_admin(&ctx).await;
    let member = ctx.create_member(org.id, OrgRole::Member).await.unwrap();
    let token = ctx.access_token(&member);

    let (status, _) = ctx
        .request(
            "POST",
            "/v1/projects",
            Some(&token),
            Some(json!({ "name": "Nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Listing stays open to every member
    let (status, _) = ctx.request("GET", "/v1/projects", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_project_create_rejects_foreign_manager() {
    let ctx = TestContext::new().await.unwrap();
    let (_, _, token) = org_with_admin(&ctx).await;
    let (other_org, _, _) = org_with_admin(&ctx).await;
    let outsider = ctx
        .create_member(other_org.id, OrgRole::Member)
        .await
        .unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/projects",
            Some(&token),
            Some(json!({ "name": "Bad manager", "manager_id": outsider.id })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Manager not found");
}

#[tokio::test]
async fn test_project_detail_reports_progress() {
    let ctx = TestContext::new().await.unwrap();
    let (_, _, token) = org_with_admin(&ctx).await;
    let project_id = create_project(&ctx, &token, "Progress").await;

    // No tasks yet
    let (status, body) = ctx
        .request("GET", &format!("/v1/projects/{project_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"], 0);

    let done = create_task(&ctx, &token, project_id, "Done task").await;
    create_task(&ctx, &token, project_id, "Open task").await;

    let (status, _) = ctx
        .request(
            "PATCH",
            &format!("/v1/tasks/{done}"),
            Some(&token),
            Some(json!({ "status": "DONE" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx
        .request("GET", &format!("/v1/projects/{project_id}"), Some(&token), None)
        .await;
    assert_eq!(body["progress"], 50);
}

#[tokio::test]
async fn test_project_update_is_manager_or_admin_only() {
    let ctx = TestContext::new().await.unwrap();
    let (org, _, admin_token) = org_with_admin(&ctx).await;
    let manager = ctx.create_member(org.id, OrgRole::Manager).await.unwrap();
    let other_manager = ctx.create_member(org.id, OrgRole::Manager).await.unwrap();

    let manager_token = ctx.access_token(&manager);
    let project_id = create_project(&ctx, &manager_token, "Owned").await;

    // A manager who does not own the project is rejected
    let other_token = ctx.access_token(&other_manager);
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/v1/projects/{project_id}"),
            Some(&other_token),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Only the project manager or an admin can modify this project"
    );

    // The owning manager and an admin both succeed
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/v1/projects/{project_id}"),
            Some(&manager_token),
            Some(json!({ "status": "COMPLETED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/v1/projects/{project_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_task_assignment_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let (org, _, token) = org_with_admin(&ctx).await;
    let assignee = ctx.create_member(org.id, OrgRole::Member).await.unwrap();
    let project_id = create_project(&ctx, &token, "Assignments").await;

    let task_id = create_task(&ctx, &token, project_id, "Assign me").await;

    // Assign
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/v1/tasks/{task_id}"),
            Some(&token),
            Some(json!({ "assignee_id": assignee.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignee_id"], assignee.id.to_string());

    // An update that omits assignee_id leaves the assignment alone
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/v1/tasks/{task_id}"),
            Some(&token),
            Some(json!({ "status": "IN_PROGRESS" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROGRESS");
    assert_eq!(body["assignee_id"], assignee.id.to_string());

    // Explicit null clears it
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/v1/tasks/{task_id}"),
            Some(&token),
            Some(json!({ "assignee_id": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["assignee_id"].is_null());
}

#[tokio::test]
async fn test_task_create_rejects_foreign_assignee() {
    let ctx = TestContext::new().await.unwrap();
    let (_, _, token) = org_with_admin(&ctx).await;
    let (other_org, _, _) = org_with_admin(&ctx).await;
    let outsider = ctx
        .create_member(other_org.id, OrgRole::Member)
        .await
        .unwrap();
    let project_id = create_project(&ctx, &token, "Foreign assignee").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/tasks",
            Some(&token),
            Some(json!({
                "project_id": project_id,
                "title": "Bad assignee",
                "assignee_id": outsider.id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Assignee not found");
}

#[tokio::test]
async fn test_task_list_filters_by_project() {
    let ctx = TestContext::new().await.unwrap();
    let (_, _, token) = org_with_admin(&ctx).await;
    let project_a = create_project(&ctx, &token, "Filter A").await;
    let project_b = create_project(&ctx, &token, "Filter B").await;

    create_task(&ctx, &token, project_a, "A1").await;
    create_task(&ctx, &token, project_a, "A2").await;
    create_task(&ctx, &token, project_b, "B1").await;

    let (status, body) = ctx
        .request(
            "GET",
            &format!("/v1/tasks?project_id={project_a}"),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = ctx.request("GET", "/v1/tasks", Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_task_deletion_is_admin_only() {
    let ctx = TestContext::new().await.unwrap();
    let (org, _, admin_token) = org_with_admin(&ctx).await;
    let manager = ctx.create_member(org.id, OrgRole::Manager).await.unwrap();
    let manager_token = ctx.access_token(&manager);

    let project_id = create_project(&ctx, &admin_token, "Deletions").await;
    let task_id = create_task(&ctx, &admin_token, project_id, "Doomed").await;

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/v1/tasks/{task_id}"),
            Some(&manager_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/v1/tasks/{task_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Soft-deleted tasks vanish from reads
    let (status, _) = ctx
        .request("GET", &format!("/v1/tasks/{task_id}"), Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_lifecycle_and_author_guard() {
    let ctx = TestContext::new().await.unwrap();
    let (org, _, admin_token) = org_with_admin(&ctx).await;
    let author = ctx.create_member(org.id, OrgRole::Member).await.unwrap();
    let bystander = ctx.create_member(org.id, OrgRole::Member).await.unwrap();

    let project_id = create_project(&ctx, &admin_token, "Comments").await;
    let task_id = create_task(&ctx, &admin_token, project_id, "Discussed").await;

    let author_token = ctx.access_token(&author);
    let (status, body) = ctx
        .request(
            "POST",
            "/v1/comments",
            Some(&author_token),
            Some(json!({ "task_id": task_id, "content": "First!" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let comment_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .request(
            "GET",
            &format!("/v1/tasks/{task_id}/comments"),
            Some(&author_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Another member cannot delete someone else's comment
    let bystander_token = ctx.access_token(&bystander);
    let (status, body) = ctx
        .request(
            "DELETE",
            &format!("/v1/comments/{comment_id}"),
            Some(&bystander_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Only the comment author or an admin can delete this comment"
    );

    // The author can
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/v1/comments/{comment_id}"),
            Some(&author_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cross_tenant_ids_are_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let (_, _, token_a) = org_with_admin(&ctx).await;
    let (_, _, token_b) = org_with_admin(&ctx).await;

    let project_id = create_project(&ctx, &token_a, "Tenant A project").await;
    let task_id = create_task(&ctx, &token_a, project_id, "Tenant A task").await;

    // Another tenant sees 404, never 403, for both reads and writes
    let (status, _) = ctx
        .request("GET", &format!("/v1/projects/{project_id}"), Some(&token_b), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(
            "PATCH",
            &format!("/v1/tasks/{task_id}"),
            Some(&token_b),
            Some(json!({ "title": "Stolen" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(
            "POST",
            "/v1/tasks",
            Some(&token_b),
            Some(json!({ "project_id": project_id, "title": "Smuggled" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request("DELETE", &format!("/v1/tasks/{task_id}"), Some(&token_b), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_orgless_user_cannot_touch_tenant_resources() {
    let ctx = TestContext::new().await.unwrap();
    let orgless = ctx.create_user("unused-hash").await.unwrap();
    let token = ctx.access_token(&orgless);

    let (status, body) = ctx.request("GET", "/v1/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not a member of any organization");
}
