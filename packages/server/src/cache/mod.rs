//! Shared read cache with per-query lifetimes and tag-based invalidation.
//!
//! Writers never touch entries directly; they name the tags their change
//! affects and every entry carrying any of those tags is dropped.

pub mod queries;

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::error::AppError;

/// Invalidation labels.
pub mod tags {
    use uuid::Uuid;

    pub const ARTICLES: &str = "articles";
    pub const LATEST_ARTICLES: &str = "latest-articles";
    pub const FEATURED_ARTICLES: &str = "featured-articles";
    pub const BREAKING_NEWS: &str = "breaking-news";
    pub const TRENDING_ARTICLES: &str = "trending-articles";
    pub const CATEGORIES: &str = "categories";
    pub const TAGS: &str = "tags";
    /// Carried by every entry that embeds image metadata.
    pub const MEDIA: &str = "media";

    pub fn category(id: Uuid) -> String {
        format!("category-{id}")
    }

    pub fn article(slug: &str) -> String {
        format!("article-{slug}")
    }
}

/// Named read queries served through the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedQuery {
    Latest { limit: u64 },
    Featured { limit: u64 },
    Breaking { limit: u64 },
    Trending { limit: u64 },
    CategoryArticles { category_id: Uuid, limit: u64, offset: u64 },
    CategoryArticleCount { category_id: Uuid },
    TagArticles { tag_slug: String, limit: u64 },
    ActiveCategories,
    ArticleDetail { slug: String },
    RelatedArticles { category_id: Uuid, exclude: Uuid, limit: u64 },
}

impl CachedQuery {
    pub fn key(&self) -> String {
        match self {
            Self::Latest { limit } => format!("latest:{limit}"),
            Self::Featured { limit } => format!("featured:{limit}"),
            Self::Breaking { limit } => format!("breaking:{limit}"),
            Self::Trending { limit } => format!("trending:{limit}"),
            Self::CategoryArticles {
                category_id,
                limit,
                offset,
            } => format!("category-articles:{category_id}:{limit}:{offset}"),
            Self::CategoryArticleCount { category_id } => {
                format!("category-count:{category_id}")
            }
            Self::TagArticles { tag_slug, limit } => format!("tag-articles:{tag_slug}:{limit}"),
            Self::ActiveCategories => "categories:active".to_string(),
            Self::ArticleDetail { slug } => format!("article:{slug}"),
            Self::RelatedArticles {
                category_id,
                exclude,
                limit,
            } => format!("related:{category_id}:{exclude}:{limit}"),
        }
    }

    /// Invalidation tags. Anything that embeds article cards also carries
    /// `categories` and `media`, since cards show category and image fields.
    pub fn tags(&self) -> Vec<String> {
        let fixed: &[&str] = match self {
            Self::Latest { .. } => &[tags::LATEST_ARTICLES, tags::ARTICLES],
            Self::Featured { .. } => &[tags::FEATURED_ARTICLES, tags::ARTICLES],
            Self::Breaking { .. } => &[tags::BREAKING_NEWS, tags::ARTICLES],
            Self::Trending { .. } => &[tags::TRENDING_ARTICLES, tags::ARTICLES],
            Self::CategoryArticles { .. } | Self::RelatedArticles { .. } => {
                &[tags::ARTICLES, tags::CATEGORIES]
            }
            Self::CategoryArticleCount { .. } => &[tags::ARTICLES, tags::CATEGORIES],
            Self::TagArticles { .. } => &[tags::ARTICLES, tags::TAGS],
            Self::ActiveCategories => &[tags::CATEGORIES],
            Self::ArticleDetail { .. } => &[],
        };
        let mut out: Vec<String> = fixed.iter().map(|t| t.to_string()).collect();
        if self.embeds_cards() {
            for extra in [tags::CATEGORIES, tags::MEDIA] {
                if !fixed.contains(&extra) {
                    out.push(extra.to_string());
                }
            }
        }
        match self {
            Self::CategoryArticles { category_id, .. }
            | Self::CategoryArticleCount { category_id }
            | Self::RelatedArticles { category_id, .. } => out.push(tags::category(*category_id)),
            Self::ArticleDetail { slug } => out.push(tags::article(slug)),
            _ => {}
        }
        out
    }

    fn embeds_cards(&self) -> bool {
        !matches!(self, Self::CategoryArticleCount { .. } | Self::ActiveCategories)
    }

    pub fn ttl(&self, config: &CacheConfig) -> Duration {
        let secs = match self {
            Self::Latest { .. } => config.latest_ttl_secs,
            Self::Featured { .. } => config.featured_ttl_secs,
            Self::Breaking { .. } => config.breaking_ttl_secs,
            Self::Trending { .. } => config.trending_ttl_secs,
            Self::CategoryArticles { .. } => config.category_articles_ttl_secs,
            Self::CategoryArticleCount { .. } => config.category_count_ttl_secs,
            Self::TagArticles { .. } => config.tag_articles_ttl_secs,
            Self::ActiveCategories => config.categories_ttl_secs,
            Self::ArticleDetail { .. } => config.article_detail_ttl_secs,
            Self::RelatedArticles { .. } => config.related_articles_ttl_secs,
        };
        Duration::from_secs(secs)
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
    tags: Vec<String>,
}

/// Process-wide cache shared through `AppState`.
pub struct CacheService {
    entries: DashMap<String, Entry>,
    config: CacheConfig,
}

impl CacheService {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Fresh value for `key`, if any. Expired entries are dropped on the way.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = Instant::now();
        let hit = {
            let entry = self.entries.get(key)?;
            if entry.expires_at > now {
                Some(entry.value.clone())
            } else {
                None
            }
        };
        match hit {
            Some(value) => value.downcast_ref::<T>().cloned(),
            None => {
                self.entries.remove_if(key, |_, e| e.expires_at <= now);
                None
            }
        }
    }

    /// Remember `value`. At the entry bound, expired entries are purged first;
    /// if the map is still full the value is not cached.
    pub fn set<T>(&self, key: impl Into<String>, value: T, ttl: Duration, tags: Vec<String>)
    where
        T: Send + Sync + 'static,
    {
        let key = key.into();
        if self.entries.len() >= self.config.max_entries && !self.entries.contains_key(&key) {
            self.purge_expired();
            if self.entries.len() >= self.config.max_entries {
                tracing::debug!(key = %key, "cache full, value not cached");
                return;
            }
        }
        self.entries.insert(
            key,
            Entry {
                value: Arc::new(value),
                expires_at: Instant::now() + ttl,
                tags,
            },
        );
    }

    /// Drop every entry carrying any of `tags`. Returns how many were dropped.
    pub fn invalidate<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            !entry
                .tags
                .iter()
                .any(|t| tags.iter().any(|wanted| wanted.as_ref() == t))
        });
        let dropped = before.saturating_sub(self.entries.len());
        tracing::debug!(
            tags = ?tags.iter().map(AsRef::as_ref).collect::<Vec<_>>(),
            dropped,
            "cache invalidated"
        );
        dropped
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Purge expired entries every `sweep_interval_secs` for as long as the
    /// cache is alive.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let cache = Arc::downgrade(self);
        let period = Duration::from_secs(self.config.sweep_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else { break };
                let purged = cache.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = cache.len(), "expired cache entries purged");
                }
            }
        });
    }

    /// Serve `query` from cache, or run `load` and remember its result.
    pub async fn get_or_load<T, F, Fut>(&self, query: &CachedQuery, load: F) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if !self.config.enabled {
            return load().await;
        }

        let key = query.key();
        if let Some(hit) = self.get::<T>(&key) {
            return Ok(hit);
        }

        let value = load().await?;
        self.set(key, value.clone(), query.ttl(&self.config), query.tags());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
