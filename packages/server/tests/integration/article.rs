use common::UserRole;
use serde_json::{Value, json};

use crate::common::{TestApp, article_content, routes};

async fn sport(app: &TestApp, admin: &str) -> String {
    app.create_category(admin, json!({"nameBg": "Спорт", "nameEn": "Sport"}))
        .await["id"]
        .as_str()
        .unwrap()
        .to_string()
}

fn draft(title: &str, category_id: &str) -> Value {
    json!({
        "title": title,
        "content": article_content(title),
        "categoryId": category_id,
    })
}

mod create {
    use super::*;

    #[tokio::test]
    async fn draft_gets_a_transliterated_slug_and_no_publish_date() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let (author_id, author) = app
            .create_user_with_role("author@pz-news.com", UserRole::Author)
            .await;

        let res = app
            .post_with_token(routes::ARTICLES, &draft("Мач в Пазарджик", &category_id), &author)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "mach-v-pazardzhik");
        assert_eq!(res.body["status"], "draft");
        assert!(res.body["publishedAt"].is_null());
        assert_eq!(res.body["viewCount"], 0);
        assert_eq!(res.body["authorId"], author_id.as_str());
        assert_eq!(res.body["category"]["slug"], "sport");
        assert_eq!(res.body["category"]["nameBg"], "Спорт");
    }

    #[tokio::test]
    async fn tags_are_created_and_attached() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;

        let mut body = draft("Мач в Пазарджик", &category_id);
        body["tags"] = json!(["Пазарджик", "Футбол", "Пазарджик"]);
        let created = app.create_article(&admin, body).await;

        let slugs: Vec<&str> = created["tags"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs.len(), 2, "duplicate tag names collapse: {slugs:?}");
        assert!(slugs.contains(&"pazardzhik"));
        assert!(slugs.contains(&"futbol"));
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        app.create_article(&admin, draft("Мач в Пазарджик", &category_id))
            .await;

        let res = app
            .post_with_token(routes::ARTICLES, &draft("Мач в Пазарджик", &category_id), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
        let list = app.get_with_token(routes::ARTICLES, &admin).await;
        assert_eq!(list.body["count"], 1);
    }

    #[tokio::test]
    async fn invalid_fields_are_all_reported() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::ARTICLES,
                &json!({"title": "abc", "content": "short", "status": "live"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = res.body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        for field in ["title", "content", "categoryId", "status"] {
            assert!(fields.contains(&field), "missing {field} in {fields:?}");
        }
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::ARTICLES,
                &draft("Мач в Пазарджик", "0190b5d4-0000-7000-8000-000000000000"),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_create() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::ARTICLES, &draft("Мач в Пазарджик", "x"))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn publishing_stamps_published_at_once() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let id = app
            .create_article(&admin, draft("Мач в Пазарджик", &category_id))
            .await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let published = app
            .post_with_token(&routes::article_action(&id, "publish"), &json!({}), &admin)
            .await;
        assert_eq!(published.status, 200, "{}", published.text);
        assert_eq!(published.body["status"], "published");
        let first_stamp = published.body["publishedAt"].clone();
        assert!(first_stamp.is_string());

        let unpublished = app
            .post_with_token(&routes::article_action(&id, "unpublish"), &json!({}), &admin)
            .await;
        assert_eq!(unpublished.body["status"], "draft");

        let republished = app
            .post_with_token(&routes::article_action(&id, "publish"), &json!({}), &admin)
            .await;
        assert_eq!(republished.body["publishedAt"], first_stamp);
    }

    #[tokio::test]
    async fn slug_follows_the_title_only_until_first_publication() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let id = app
            .create_article(&admin, draft("Мач в Пазарджик", &category_id))
            .await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let renamed = app
            .patch_with_token(&routes::article(&id), &json!({"title": "Победа в Пазарджик"}), &admin)
            .await;
        assert_eq!(renamed.status, 200, "{}", renamed.text);
        assert_eq!(renamed.body["slug"], "pobeda-v-pazardzhik");

        app.post_with_token(&routes::article_action(&id, "publish"), &json!({}), &admin)
            .await;
        let renamed = app
            .patch_with_token(&routes::article(&id), &json!({"title": "Загуба в Пазарджик"}), &admin)
            .await;
        assert_eq!(renamed.body["title"], "Загуба в Пазарджик");
        assert_eq!(renamed.body["slug"], "pobeda-v-pazardzhik");
    }

    #[tokio::test]
    async fn archiving_hides_the_article_from_readers() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let created = app
            .publish_article(&admin, &category_id, "Мач в Пазарджик")
            .await;
        let id = created["id"].as_str().unwrap();

        let archived = app
            .post_with_token(&routes::article_action(id, "archive"), &json!({}), &admin)
            .await;
        assert_eq!(archived.body["status"], "archived");

        let res = app.get_without_token(&routes::article(id)).await;
        assert_eq!(res.status, 404);
        let res = app.get_with_token(&routes::article(id), &admin).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn null_clears_an_optional_field() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let mut body = draft("Мач в Пазарджик", &category_id);
        body["subtitle"] = json!("Домакините победиха");
        let id = app.create_article(&admin, body).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let res = app
            .patch_with_token(&routes::article(&id), &json!({"subtitle": null}), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["subtitle"].is_null());
        assert_eq!(res.body["title"], "Мач в Пазарджик");
    }
}

mod permissions {
    use super::*;

    #[tokio::test]
    async fn author_cannot_touch_someone_elses_article() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let (_, author) = app
            .create_user_with_role("author@pz-news.com", UserRole::Author)
            .await;
        let id = app
            .create_article(&admin, draft("Мач в Пазарджик", &category_id))
            .await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let res = app
            .patch_with_token(&routes::article(&id), &json!({"isFeatured": true}), &author)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app.delete_with_token(&routes::article(&id), &author).await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn author_can_delete_their_own_article() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let (_, author) = app
            .create_user_with_role("author@pz-news.com", UserRole::Author)
            .await;
        let id = app
            .create_article(&author, draft("Мач в Пазарджик", &category_id))
            .await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let res = app.delete_with_token(&routes::article(&id), &author).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);

        let res = app.get_with_token(&routes::article(&id), &author).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn editor_can_edit_any_article() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let (_, editor) = app
            .create_user_with_role("editor@pz-news.com", UserRole::Editor)
            .await;
        let id = app
            .create_article(&admin, draft("Мач в Пазарджик", &category_id))
            .await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let res = app
            .patch_with_token(&routes::article(&id), &json!({"isBreaking": true}), &editor)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["isBreaking"], true);
    }
}

mod reading {
    use super::*;

    #[tokio::test]
    async fn anonymous_list_only_shows_published_articles() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        app.create_article(&admin, draft("Чернова за мача", &category_id))
            .await;
        app.publish_article(&admin, &category_id, "Мач в Пазарджик")
            .await;

        let res = app
            .get_without_token(&format!("{}?status=draft", routes::ARTICLES))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["count"], 1);
        assert_eq!(res.body["data"][0]["status"], "published");

        let res = app.get_with_token(routes::ARTICLES, &admin).await;
        assert_eq!(res.body["count"], 2);
        assert_eq!(res.body["hasMore"], false);
    }

    #[tokio::test]
    async fn search_matches_title_case_insensitively() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        app.publish_article(&admin, &category_id, "Мач в Пазарджик")
            .await;
        app.publish_article(&admin, &category_id, "Концерт на площада")
            .await;

        let res = app
            .get_with_token(&format!("{}?search=МАЧ&limit=1", routes::ARTICLES), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["count"], 1);
        assert_eq!(res.body["data"][0]["title"], "Мач в Пазарджик");
    }

    #[tokio::test]
    async fn reading_by_slug_counts_views() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let created = app
            .publish_article(&admin, &category_id, "Мач в Пазарджик")
            .await;
        let id = created["id"].as_str().unwrap();

        for _ in 0..3 {
            let res = app
                .get_without_token(&routes::article_by_slug("mach-v-pazardzhik"))
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        // Increments run in the background.
        let mut views = 0;
        for _ in 0..50 {
            let res = app.get_with_token(&routes::article(id), &admin).await;
            views = res.body["viewCount"].as_i64().unwrap();
            if views == 3 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        assert_eq!(views, 3);
    }

    #[tokio::test]
    async fn article_page_lists_newest_related_articles_from_its_category() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let culture = app.create_category(&admin, json!({"nameBg": "Култура"})).await;
        let culture_id = culture["id"].as_str().unwrap();

        let mut slugs = Vec::new();
        for title in ["Първи мач", "Втори мач", "Трети мач", "Четвърти мач", "Пети мач"] {
            let created = app.publish_article(&admin, &category_id, title).await;
            slugs.push(created["slug"].as_str().unwrap().to_string());
        }
        app.publish_article(&admin, culture_id, "Нова изложба").await;
        app.create_article(&admin, draft("Чернова за мача", &category_id))
            .await;

        let res = app.get_without_token(&routes::article_by_slug(&slugs[2])).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let related: Vec<&str> = res.body["relatedArticles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["title"].as_str().unwrap())
            .collect();
        assert_eq!(related, ["Пети мач", "Четвърти мач", "Втори мач"]);

        let by_id = app
            .get_with_token(&routes::article(res.body["id"].as_str().unwrap()), &admin)
            .await;
        assert!(by_id.body.get("relatedArticles").is_none());
    }

    #[tokio::test]
    async fn related_articles_follow_new_publications() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        let first = app.publish_article(&admin, &category_id, "Първи мач").await;
        let slug = first["slug"].as_str().unwrap().to_string();

        let res = app.get_without_token(&routes::article_by_slug(&slug)).await;
        assert_eq!(res.body["relatedArticles"], json!([]));

        app.publish_article(&admin, &category_id, "Втори мач").await;

        let res = app.get_without_token(&routes::article_by_slug(&slug)).await;
        assert_eq!(res.body["relatedArticles"][0]["title"], "Втори мач");
    }

    #[tokio::test]
    async fn draft_is_not_reachable_by_slug() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let category_id = sport(&app, &admin).await;
        app.create_article(&admin, draft("Мач в Пазарджик", &category_id))
            .await;

        let res = app
            .get_without_token(&routes::article_by_slug("mach-v-pazardzhik"))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
