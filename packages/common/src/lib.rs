pub mod article_status;
pub mod config;
pub mod slug;
pub mod storage;
pub mod user_role;

pub use article_status::ArticleStatus;
pub use user_role::UserRole;
