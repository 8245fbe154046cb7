use common::UserRole;
use server::config::{CacheConfig, UploadConfig};

use crate::common::{FilePart, TestApp, routes};

mod single {
    use super::*;

    #[tokio::test]
    async fn large_png_is_resized_and_stored_as_webp() {
        let app = TestApp::spawn().await;
        let (author_id, token) = app
            .create_user_with_role("author@pz-news.com", UserRole::Author)
            .await;

        let res = app
            .upload_with_token(
                FilePart::png("stadium.png", 3000, 1500),
                &[("altText", "Стадионът"), ("caption", "Снимка: PZ News")],
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);
        let media = &res.body["media"];
        assert_eq!(media["mimeType"], "image/webp");
        assert_eq!(media["width"], 2000);
        assert_eq!(media["height"], 1000);
        assert_eq!(media["originalName"], "stadium.png");
        assert_eq!(media["altText"], "Стадионът");
        assert_eq!(media["caption"], "Снимка: PZ News");
        assert_eq!(media["uploadedBy"], author_id.as_str());
        assert_eq!(res.body["url"], media["url"]);

        let key = media["storageKey"].as_str().unwrap();
        assert!(key.starts_with("uploads/") && key.ends_with(".webp"), "{key}");
        assert_eq!(
            media["url"].as_str().unwrap(),
            format!("http://media.test/{key}")
        );

        let stored = std::fs::read(app.stored_path(key)).unwrap();
        assert_eq!(&stored[..4], b"RIFF");
        assert_eq!(&stored[8..12], b"WEBP");
        assert_eq!(media["fileSize"], stored.len() as u64);
    }

    #[tokio::test]
    async fn small_image_keeps_its_dimensions() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .upload_with_token(FilePart::png("logo.png", 320, 200), &[], &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["media"]["width"], 320);
        assert_eq!(res.body["media"]["height"], 200);
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected_before_storage() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .upload_with_token(
                FilePart::raw("animation.gif", b"GIF89a".to_vec(), "image/gif"),
                &[],
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_FILE_TYPE");
        assert!(!app.stored_path("uploads").exists());
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let upload = UploadConfig {
            max_file_size: 64 * 1024,
            ..UploadConfig::default()
        };
        let app = TestApp::spawn_with(CacheConfig::default(), upload).await;
        let admin = app.admin_token().await;

        let res = app
            .upload_with_token(
                FilePart::raw("huge.png", vec![0u8; 100 * 1024], "image/png"),
                &[],
                &admin,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "FILE_TOO_LARGE");
    }

    #[tokio::test]
    async fn unreadable_image_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .upload_with_token(
                FilePart::raw("broken.png", b"definitely not a png".to_vec(), "image/png"),
                &[],
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_file_field_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let form = reqwest::multipart::Form::new().text("altText", "Без файл");
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::UPLOAD))
            .header("Authorization", format!("Bearer {admin}"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn forged_token_cannot_upload() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_with_token(FilePart::png("a.png", 10, 10), &[], "forged.token.value")
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod batch {
    use super::*;

    #[tokio::test]
    async fn failures_are_reported_per_file() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .upload_batch_with_token(
                vec![
                    FilePart::png("one.png", 40, 30),
                    FilePart::raw("notes.txt", b"hello".to_vec(), "text/plain"),
                    FilePart::png("two.png", 30, 40),
                ],
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["uploaded"], 2);
        assert_eq!(res.body["total"], 3);
        assert_eq!(res.body["media"].as_array().unwrap().len(), 2);
        let errors = res.body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["file"], "notes.txt");
        assert_eq!(errors[0]["code"], "INVALID_FILE_TYPE");

        let stats = app.get_with_token(routes::MEDIA_STATS, &admin).await;
        assert_eq!(stats.body["totalFiles"], 2);
    }

    #[tokio::test]
    async fn clean_batch_reports_success_without_errors() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .upload_batch_with_token(
                vec![FilePart::png("one.png", 40, 30), FilePart::png("two.png", 30, 40)],
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["uploaded"], 2);
        assert!(res.body.get("errors").is_none_or(|e| e.is_null()));
    }

    #[tokio::test]
    async fn too_many_files_are_refused_as_a_whole() {
        let upload = UploadConfig {
            max_batch_files: 2,
            ..UploadConfig::default()
        };
        let app = TestApp::spawn_with(CacheConfig::default(), upload).await;
        let admin = app.admin_token().await;

        let res = app
            .upload_batch_with_token(
                (0..3)
                    .map(|i| FilePart::png(&format!("{i}.png"), 10, 10))
                    .collect(),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let stats = app.get_with_token(routes::MEDIA_STATS, &admin).await;
        assert_eq!(stats.body["totalFiles"], 0);
    }
}
