use common::UserRole;
use serde_json::{Value, json};

use crate::common::{FilePart, TestApp, routes};

async fn upload(app: &TestApp, token: &str, name: &str) -> Value {
    let res = app
        .upload_with_token(FilePart::png(name, 64, 48), &[], token)
        .await;
    assert_eq!(res.status, 200, "upload failed: {}", res.text);
    res.body["media"].clone()
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

mod library {
    use super::*;

    #[tokio::test]
    async fn stats_sum_stored_sizes_per_uploader() {
        let app = TestApp::spawn().await;
        let (admin_id, admin) = app
            .create_user_with_role("admin@pz-news.com", UserRole::Admin)
            .await;
        let (_, author) = app
            .create_user_with_role("author@pz-news.com", UserRole::Author)
            .await;
        let first = upload(&app, &admin, "a.png").await;
        let second = upload(&app, &admin, "b.png").await;
        upload(&app, &author, "c.png").await;

        let res = app.get_with_token(routes::MEDIA_STATS, &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["totalFiles"], 3);

        let res = app
            .get_with_token(&format!("{}?uploadedBy={admin_id}", routes::MEDIA_STATS), &admin)
            .await;
        let expected = first["fileSize"].as_i64().unwrap() + second["fileSize"].as_i64().unwrap();
        assert_eq!(res.body["totalFiles"], 2);
        assert_eq!(res.body["totalSize"], expected);
        assert!(res.body["totalSizeMb"].is_number());
    }

    #[tokio::test]
    async fn list_is_paged_and_searchable() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        upload(&app, &admin, "stadium.png").await;
        upload(&app, &admin, "theatre.png").await;
        upload(&app, &admin, "river.png").await;

        let res = app
            .get_with_token(&format!("{}?limit=2", routes::MEDIA), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["count"], 3);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["hasMore"], true);

        let res = app
            .get_with_token(&format!("{}?search=THEATRE", routes::MEDIA), &admin)
            .await;
        assert_eq!(res.body["count"], 1);
        assert_eq!(res.body["data"][0]["originalName"], "theatre.png");
    }

    #[tokio::test]
    async fn library_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::MEDIA).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod edit {
    use super::*;

    #[tokio::test]
    async fn uploader_can_set_and_clear_alt_text() {
        let app = TestApp::spawn().await;
        let (_, author) = app
            .create_user_with_role("author@pz-news.com", UserRole::Author)
            .await;
        let id = id_of(&upload(&app, &author, "a.png").await);

        let res = app
            .patch_with_token(
                &routes::media(&id),
                &json!({"altText": "Площадът", "caption": "Вечер"}),
                &author,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["altText"], "Площадът");

        let res = app
            .patch_with_token(&routes::media(&id), &json!({"altText": null}), &author)
            .await;
        assert!(res.body["altText"].is_null());
        assert_eq!(res.body["caption"], "Вечер");
    }

    #[tokio::test]
    async fn editor_cannot_edit_someone_elses_media() {
        let app = TestApp::spawn().await;
        let (_, author) = app
            .create_user_with_role("author@pz-news.com", UserRole::Author)
            .await;
        let (_, editor) = app
            .create_user_with_role("editor@pz-news.com", UserRole::Editor)
            .await;
        let id = id_of(&upload(&app, &author, "a.png").await);

        let res = app
            .patch_with_token(&routes::media(&id), &json!({"altText": "x"}), &editor)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn removes_row_and_stored_object() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let media = upload(&app, &admin, "a.png").await;
        let key = media["storageKey"].as_str().unwrap();
        assert!(app.is_stored(key));

        let res = app.delete_with_token(&routes::media(&id_of(&media)), &admin).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["storageCleanup"], "done");
        assert!(!app.is_stored(key));
        let res = app.get_with_token(&routes::media(&id_of(&media)), &admin).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn featured_image_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let media = upload(&app, &admin, "a.png").await;
        let category = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;
        app.create_article(
            &admin,
            json!({
                "title": "Мач в Пазарджик",
                "content": crate::common::article_content("Мач"),
                "categoryId": category["id"],
                "featuredImageId": media["id"],
            }),
        )
        .await;

        let res = app.delete_with_token(&routes::media(&id_of(&media)), &admin).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
        assert!(app.is_stored(media["storageKey"].as_str().unwrap()));
    }

    #[tokio::test]
    async fn storage_failure_leaves_cleanup_pending() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let media = upload(&app, &admin, "a.png").await;
        let path = app.stored_path(media["storageKey"].as_str().unwrap());

        // A directory in place of the object makes removal fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let res = app.delete_with_token(&routes::media(&id_of(&media)), &admin).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["storageCleanup"], "pending");
        let res = app.get_with_token(&routes::media(&id_of(&media)), &admin).await;
        assert_eq!(res.status, 404);
    }
}
