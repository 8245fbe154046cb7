//! Persistence services. Handlers stay thin: they extract, call one service
//! function and wrap the result.

pub mod article;
pub mod category;
pub mod media;
pub mod policy;
pub mod tag;
pub mod user;

use common::storage::ObjectStore;
use sea_orm::DatabaseConnection;

use crate::cache::CacheService;
use crate::config::AppConfig;
use crate::extractors::memo::RequestMemo;
use crate::state::AppState;

/// Collaborators a service call works with, borrowed for one request.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub db: &'a DatabaseConnection,
    pub cache: &'a CacheService,
    pub store: &'a dyn ObjectStore,
    pub config: &'a AppConfig,
    pub memo: &'a RequestMemo,
}

impl<'a> Services<'a> {
    pub fn new(state: &'a AppState, memo: &'a RequestMemo) -> Self {
        Self {
            db: &state.db,
            cache: &state.cache,
            store: state.store.as_ref(),
            config: &state.config,
            memo,
        }
    }
}
