pub mod article;
pub mod article_tag;
pub mod category;
pub mod media;
pub mod tag;
pub mod user;
