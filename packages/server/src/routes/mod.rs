use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{article, auth, category, feed, media, tag, upload, user};
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/articles", article_routes())
        .nest("/categories", category_routes())
        .nest("/feed", feed_routes())
        .nest("/tags", tag_routes())
        .nest("/upload", upload_routes(config))
        .nest("/media", media_routes())
        .nest("/users", user_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::login))
        .routes(routes!(auth::me))
}

fn article_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(article::list_articles, article::create_article))
        .routes(routes!(
            article::get_article,
            article::update_article,
            article::delete_article
        ))
        .routes(routes!(article::publish_article))
        .routes(routes!(article::unpublish_article))
        .routes(routes!(article::archive_article))
        .routes(routes!(article::get_article_by_slug))
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(category::list_categories, category::create_category))
        .routes(routes!(category::reorder_categories))
        .routes(routes!(
            category::get_category,
            category::update_category,
            category::delete_category
        ))
        .routes(routes!(category::toggle_category))
        .routes(routes!(category::get_category_by_slug))
        .routes(routes!(category::list_category_articles))
}

fn feed_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(feed::latest))
        .routes(routes!(feed::featured))
        .routes(routes!(feed::breaking))
        .routes(routes!(feed::trending))
}

fn tag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(tag::list_tag_articles))
}

fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(upload::upload_image, upload::upload_images))
        .layer(upload::upload_body_limit(&config.upload))
}

fn media_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(media::list_media))
        .routes(routes!(media::media_stats))
        .routes(routes!(media::get_media, media::update_media, media::delete_media))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::list_users, user::create_user))
        .routes(routes!(user::update_user))
}
