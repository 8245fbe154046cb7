use std::collections::HashMap;
use std::fmt::Write as _;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use common::ArticleStatus;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{article, category};
use crate::error::AppError;
use crate::state::AppState;

/// One `<url>` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub change_frequency: &'static str,
    pub priority: f32,
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn render(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        let _ = write!(xml, "  <url>\n    <loc>{}</loc>\n", xml_escape(&entry.loc));
        if let Some(ts) = entry.last_modified {
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", ts.to_rfc3339());
        }
        let _ = write!(
            xml,
            "    <changefreq>{}</changefreq>\n    <priority>{:.1}</priority>\n  </url>\n",
            entry.change_frequency, entry.priority
        );
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Home and static pages, then active categories at `/<slug>`, then published
/// articles at `/<category>/<slug>`.
pub fn entries(
    base_url: &str,
    categories: &[category::Model],
    articles: &[article::Model],
) -> Vec<SitemapEntry> {
    let base = base_url.trim_end_matches('/');
    let mut out = vec![SitemapEntry {
        loc: base.to_string(),
        last_modified: None,
        change_frequency: "hourly",
        priority: 1.0,
    }];
    for page in ["about", "contact"] {
        out.push(SitemapEntry {
            loc: format!("{base}/{page}"),
            last_modified: None,
            change_frequency: "monthly",
            priority: 0.5,
        });
    }

    let slugs: HashMap<_, _> = categories.iter().map(|c| (c.id, c.slug.as_str())).collect();
    out.extend(categories.iter().map(|c| SitemapEntry {
        loc: format!("{base}/{}", c.slug),
        last_modified: Some(c.updated_at),
        change_frequency: "daily",
        priority: 0.8,
    }));
    // Articles under an inactive category have no reachable page.
    out.extend(articles.iter().filter_map(|a| {
        let category = a.category_id.and_then(|id| slugs.get(&id))?;
        Some(SitemapEntry {
            loc: format!("{base}/{category}/{}", a.slug),
            last_modified: Some(a.updated_at),
            change_frequency: "weekly",
            priority: 0.7,
        })
    }));
    out
}

#[utoipa::path(
    get,
    path = "/sitemap.xml",
    tag = "Site",
    operation_id = "sitemap",
    summary = "XML sitemap of the public site",
    responses((status = 200, description = "Sitemap", content_type = "application/xml", body = String)),
)]
#[instrument(skip(state))]
pub async fn sitemap_xml(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = category::Entity::find()
        .filter(category::Column::IsActive.eq(true))
        .order_by_asc(category::Column::DisplayOrder)
        .all(&state.db)
        .await?;
    let articles = article::Entity::find()
        .filter(article::Column::Status.eq(ArticleStatus::Published))
        .order_by_desc(article::Column::UpdatedAt)
        .all(&state.db)
        .await?;

    let xml = render(&entries(&state.config.site.base_url, &categories, &articles));
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}
