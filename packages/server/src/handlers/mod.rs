pub mod article;
pub mod auth;
pub mod category;
pub mod feed;
pub mod media;
pub mod sitemap;
pub mod tag;
pub mod upload;
pub mod user;
