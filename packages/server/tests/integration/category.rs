use common::UserRole;
use serde_json::json;

use crate::common::{TestApp, routes};

fn id_of(body: &serde_json::Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

mod writes {
    use super::*;

    #[tokio::test]
    async fn slug_is_derived_from_the_bulgarian_name() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(routes::CATEGORIES, &json!({"nameBg": "Спорт"}), &admin)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "sport");
        assert_eq!(res.body["isActive"], true);
        assert!(res.body["parentId"].is_null());
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_category(&admin, json!({"nameBg": "Спорт"})).await;

        let res = app
            .post_with_token(routes::CATEGORIES, &json!({"nameBg": "Спорт"}), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn only_admins_manage_categories() {
        let app = TestApp::spawn().await;
        let (_, editor) = app
            .create_user_with_role("editor@pz-news.com", UserRole::Editor)
            .await;

        let res = app
            .post_with_token(routes::CATEGORIES, &json!({"nameBg": "Спорт"}), &editor)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn name_shorter_than_two_characters_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(routes::CATEGORIES, &json!({"nameBg": "С"}), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod nesting {
    use super::*;

    #[tokio::test]
    async fn subcategory_of_a_top_level_category_is_allowed() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let parent = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;

        let child = app
            .create_category(&admin, json!({"nameBg": "Футбол", "parentId": id_of(&parent)}))
            .await;
        assert_eq!(child["parentId"], parent["id"]);

        let res = app.get_without_token(&routes::category_by_slug("sport")).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["category"]["slug"], "sport");
        assert_eq!(res.body["subcategories"][0]["slug"], "futbol");
    }

    #[tokio::test]
    async fn categories_nest_only_one_level_deep() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let parent = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;
        let child = app
            .create_category(&admin, json!({"nameBg": "Футбол", "parentId": id_of(&parent)}))
            .await;

        let res = app
            .post_with_token(
                routes::CATEGORIES,
                &json!({"nameBg": "Аматьори", "parentId": id_of(&child)}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn category_with_children_cannot_become_a_child() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let sport = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;
        app.create_category(&admin, json!({"nameBg": "Футбол", "parentId": id_of(&sport)}))
            .await;
        let news = app.create_category(&admin, json!({"nameBg": "Новини"})).await;

        let res = app
            .patch_with_token(
                &routes::category(&id_of(&sport)),
                &json!({"parentId": id_of(&news)}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn category_cannot_be_its_own_parent() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let sport = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;
        let id = id_of(&sport);

        let res = app
            .patch_with_token(&routes::category(&id), &json!({"parentId": id}), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn category_with_articles_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let sport = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;
        app.publish_article(&admin, &id_of(&sport), "Мач в Пазарджик")
            .await;

        let res = app
            .delete_with_token(&routes::category(&id_of(&sport)), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn category_with_subcategories_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let sport = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;
        app.create_category(&admin, json!({"nameBg": "Футбол", "parentId": id_of(&sport)}))
            .await;

        let res = app
            .delete_with_token(&routes::category(&id_of(&sport)), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn unused_category_is_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let sport = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;

        let res = app
            .delete_with_token(&routes::category(&id_of(&sport)), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_without_token(&routes::category(&id_of(&sport))).await;
        assert_eq!(res.status, 404);
    }
}

mod ordering {
    use super::*;

    fn slugs(body: &serde_json::Value) -> Vec<String> {
        body["categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["slug"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn reorder_sets_display_order_and_refreshes_the_list() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let news = app.create_category(&admin, json!({"nameBg": "Новини"})).await;
        let sport = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;
        let culture = app.create_category(&admin, json!({"nameBg": "Култура"})).await;

        // Prime the cached list before reordering.
        app.get_without_token(routes::CATEGORIES).await;

        let res = app
            .put_with_token(
                routes::CATEGORIES_REORDER,
                &json!({"categoryIds": [id_of(&sport), id_of(&culture), id_of(&news)]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_without_token(routes::CATEGORIES).await;
        assert_eq!(slugs(&res.body), ["sport", "kultura", "novini"]);
    }

    #[tokio::test]
    async fn reorder_with_an_unknown_id_changes_nothing() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let sport = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;

        let res = app
            .put_with_token(
                routes::CATEGORIES_REORDER,
                &json!({"categoryIds": [id_of(&sport), "0190b5d4-0000-7000-8000-000000000000"]}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn reorder_with_a_repeated_id_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let sport = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;
        let news = app.create_category(&admin, json!({"nameBg": "Новини"})).await;

        let res = app
            .put_with_token(
                routes::CATEGORIES_REORDER,
                &json!({"categoryIds": [id_of(&news), id_of(&sport), id_of(&news)]}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn toggled_off_category_leaves_the_public_list() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let sport = app.create_category(&admin, json!({"nameBg": "Спорт"})).await;
        app.create_category(&admin, json!({"nameBg": "Новини"})).await;
        app.get_without_token(routes::CATEGORIES).await;

        let res = app
            .post_with_token(&routes::category_toggle(&id_of(&sport)), &json!({}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["isActive"], false);

        let res = app.get_without_token(routes::CATEGORIES).await;
        assert_eq!(slugs(&res.body), ["novini"]);

        let res = app
            .get_with_token(&format!("{}?includeInactive=true", routes::CATEGORIES), &admin)
            .await;
        assert_eq!(slugs(&res.body).len(), 2);

        let res = app.get_without_token(&routes::category_by_slug("sport")).await;
        assert_eq!(res.status, 404);
    }
}
