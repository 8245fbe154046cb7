use common::UserRole;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn admin_creates_a_staff_account_that_can_log_in() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "email": "Reporter@PZ-News.com",
                "password": "reporter-pass-1",
                "fullName": "Иван Петров",
            }),
            &admin,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["email"], "reporter@pz-news.com");
    assert_eq!(res.body["role"], "author");
    assert_eq!(res.body["isActive"], true);

    app.login("reporter@pz-news.com", "reporter-pass-1").await;
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_user_with_role("author@pz-news.com", UserRole::Author)
        .await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "email": "author@pz-news.com",
                "password": "another-pass-1",
                "fullName": "Друг автор",
            }),
            &admin,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "CONFLICT");
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({"email": "a@pz-news.com", "password": "short", "fullName": "Автор"}),
            &admin,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn non_admins_cannot_manage_users() {
    let app = TestApp::spawn().await;
    let (author_id, _) = app
        .create_user_with_role("author@pz-news.com", UserRole::Author)
        .await;
    let (_, editor) = app
        .create_user_with_role("editor@pz-news.com", UserRole::Editor)
        .await;

    let res = app.get_with_token(routes::USERS, &editor).await;
    assert_eq!(res.status, 403);

    let res = app
        .patch_with_token(&routes::user(&author_id), &json!({"role": "admin"}), &editor)
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn admin_changes_role_and_lists_accounts() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let (author_id, _) = app
        .create_user_with_role("author@pz-news.com", UserRole::Author)
        .await;

    let res = app
        .patch_with_token(&routes::user(&author_id), &json!({"role": "editor"}), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["role"], "editor");

    let res = app.get_with_token(routes::USERS, &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);
    let users = res.body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password").is_none()));
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .patch_with_token(
            &routes::user("0190b5d4-0000-7000-8000-000000000000"),
            &json!({"fullName": "Никой"}),
            &admin,
        )
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}
