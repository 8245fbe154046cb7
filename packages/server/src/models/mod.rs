pub mod article;
pub mod auth;
pub mod category;
pub mod media;
pub mod shared;
pub mod user;
