use chrono::Utc;
use common::slug::slugify;
use common::{ArticleStatus, UserRole};
use rand::distr::{Alphanumeric, SampleString};
use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::entity::{article, category, user};
use crate::error::AppError;
use crate::models::user::NewUser;
use crate::services::{tag, user as users};

pub const DEMO_EMAIL: &str = "demo@pz-news.com";
const DEMO_CATEGORY_SLUG: &str = "obshtestvo";
const DEMO_TITLE: &str = "Пазарджик – Сърцето на Тракийската долина";
const DEMO_TAGS: &[&str] = &["Пазарджик", "Тракийска долина", "История"];

const DEMO_CONTENT: &str = r#"<h2>История на града</h2>
<p>Пазарджик е основан през 1485 година. Градът бързо се превръща във важен търговски център благодарение на своето местоположение на пътя между Европа и Изтока.</p>
<h2>Културно наследство</h2>
<p>Музейният комплекс "Станислав Доспевски" предлага богата колекция от произведения на изкуството, а Етнографският музей пази традициите и бита на региона.</p>
<h2>Модерно развитие</h2>
<p>Тракийската долина предлага отлични условия за земеделие, а градът се развива като център на хранително-вкусовата промишленост.</p>"#;

async fn create_index(db: &DatabaseConnection, name: &str, stmt: &mut IndexCreateStatement) {
    let sql = stmt.if_not_exists().name(name).to_string(PostgresQueryBuilder);
    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {name} exists"),
        Err(e) => tracing::warn!("Failed to create index {name}: {e}"),
    }
}

/// Create the lookup indexes schema sync does not derive from the entities.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Public feeds: published articles newest first.
    create_index(
        db,
        "idx_articles_status_published",
        Index::create()
            .table(article::Entity)
            .col(article::Column::Status)
            .col(article::Column::PublishedAt),
    )
    .await;
    create_index(
        db,
        "idx_articles_category",
        Index::create()
            .table(article::Entity)
            .col(article::Column::CategoryId),
    )
    .await;
    create_index(
        db,
        "idx_articles_featured_image",
        Index::create()
            .table(article::Entity)
            .col(article::Column::FeaturedImageId),
    )
    .await;
    create_index(
        db,
        "idx_categories_parent",
        Index::create()
            .table(category::Entity)
            .col(category::Column::ParentId),
    )
    .await;
    Ok(())
}

/// Create the configured bootstrap admin if no account uses its email yet.
pub async fn ensure_admin(db: &DatabaseConnection, auth: &AuthConfig) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&auth.bootstrap_admin_email, &auth.bootstrap_admin_password)
    else {
        return Ok(());
    };
    let email = email.trim().to_lowercase();
    if users::find_by_email(db, &email).await?.is_some() {
        return Ok(());
    }
    let admin = users::insert(
        db,
        NewUser {
            email,
            password: password.clone(),
            full_name: "Administrator".into(),
            role: UserRole::Admin,
            avatar_url: None,
        },
    )
    .await?;
    info!(user_id = %admin.id, email = %admin.email, "Bootstrap admin created");
    Ok(())
}

/// What `seed_demo` created or found.
#[derive(Debug)]
pub struct SeedSummary {
    pub author: user::Model,
    pub category: category::Model,
    pub article: Option<article::Model>,
    /// Password of a newly created demo author; `None` when it already existed.
    pub generated_password: Option<String>,
}

async fn demo_author(db: &DatabaseConnection) -> Result<(user::Model, Option<String>), AppError> {
    if let Some(existing) = users::find_by_email(db, DEMO_EMAIL).await? {
        info!("Demo user already exists");
        return Ok((existing, None));
    }
    let password = Alphanumeric.sample_string(&mut rand::rng(), 16);
    let author = users::insert(
        db,
        NewUser {
            email: DEMO_EMAIL.into(),
            password: password.clone(),
            full_name: "Demo Author".into(),
            role: UserRole::Author,
            avatar_url: None,
        },
    )
    .await?;
    info!(user_id = %author.id, "Demo user created");
    Ok((author, Some(password)))
}

/// First active top-level category, or a new "Общество" section.
async fn demo_category(db: &DatabaseConnection) -> Result<category::Model, AppError> {
    let existing = category::Entity::find()
        .filter(category::Column::IsActive.eq(true))
        .filter(category::Column::ParentId.is_null())
        .order_by_asc(category::Column::DisplayOrder)
        .one(db)
        .await?;
    if let Some(found) = existing {
        info!(slug = %found.slug, "Using existing category");
        return Ok(found);
    }
    let now = Utc::now();
    let created = category::ActiveModel {
        id: Set(Uuid::now_v7()),
        slug: Set(DEMO_CATEGORY_SLUG.into()),
        name_bg: Set("Общество".into()),
        name_en: Set(Some("Society".into())),
        description: Set(None),
        parent_id: Set(None),
        display_order: Set(0),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(slug = %created.slug, "Demo category created");
    Ok(created)
}

/// Insert a demo author, category, published article and tags. Rows that
/// already exist are reused, so running twice adds nothing.
pub async fn seed_demo(db: &DatabaseConnection) -> Result<SeedSummary, AppError> {
    let (author, generated_password) = demo_author(db).await?;
    let category = demo_category(db).await?;

    let slug = slugify(DEMO_TITLE);
    let existing = article::Entity::find()
        .filter(article::Column::Slug.eq(&slug))
        .one(db)
        .await?;
    if existing.is_some() {
        info!(slug = %slug, "Demo article already exists");
        return Ok(SeedSummary {
            author,
            category,
            article: None,
            generated_password,
        });
    }

    let now = Utc::now();
    let txn = db.begin().await?;
    let created = article::ActiveModel {
        id: Set(Uuid::now_v7()),
        slug: Set(slug),
        title: Set(DEMO_TITLE.into()),
        subtitle: Set(Some(
            "История, култура и модерно развитие в един от най-живописните градове на България".into(),
        )),
        excerpt: Set(Some(
            "Пазарджик е град с богата история, разположен в сърцето на Тракийската долина.".into(),
        )),
        content: Set(DEMO_CONTENT.into()),
        status: Set(ArticleStatus::Published),
        is_featured: Set(true),
        is_breaking: Set(false),
        view_count: Set(0),
        published_at: Set(Some(now)),
        category_id: Set(Some(category.id)),
        author_id: Set(Some(author.id)),
        featured_image_id: Set(None),
        meta_title: Set(Some("Пазарджик – История, култура и развитие | PZ News".into())),
        meta_description: Set(Some(
            "Разгледайте историята и съвременното развитие на Пазарджик.".into(),
        )),
        meta_keywords: Set(Some(serde_json::json!([
            "Пазарджик",
            "Тракийска долина",
            "история",
            "култура",
            "туризъм",
            "България"
        ]))),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let names: Vec<String> = DEMO_TAGS.iter().map(ToString::to_string).collect();
    let tags = tag::upsert_tags(&txn, &names).await?;
    tag::set_article_tags(&txn, created.id, &tags).await?;
    txn.commit().await?;

    info!(article_id = %created.id, slug = %created.slug, tags = tags.len(), "Demo article created");
    Ok(SeedSummary {
        author,
        category,
        article: Some(created),
        generated_password,
    })
}
