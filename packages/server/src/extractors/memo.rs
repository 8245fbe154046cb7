use std::any::Any;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio::sync::OnceCell;

use crate::error::AppError;

type Slot = Arc<OnceCell<Arc<dyn Any + Send + Sync>>>;

/// Read memoization scoped to a single request.
///
/// Every extraction within one request yields a handle to the same table, so
/// identical keyed reads share one store round-trip even when they overlap.
/// Nothing outlives the request.
#[derive(Clone, Default)]
pub struct RequestMemo {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl RequestMemo {
    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Return the memoized value for `key`, running `load` only on the first call.
    ///
    /// Failures are not memoized; a later call retries.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, load: F) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let slot = self.slot(key);
        let value = slot
            .get_or_try_init(|| async {
                let loaded = load().await?;
                Ok::<_, AppError>(Arc::new(loaded) as Arc<dyn Any + Send + Sync>)
            })
            .await?;

        (**value)
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("memo key '{key}' reused with another type")))
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| slots.values().filter(|s| s.initialized()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> FromRequestParts<S> for RequestMemo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(existing) = parts.extensions.get::<RequestMemo>() {
            return Ok(existing.clone());
        }
        let memo = RequestMemo::default();
        parts.extensions.insert(memo.clone());
        Ok(memo)
    }
}
