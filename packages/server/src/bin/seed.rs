use anyhow::Context;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::database::init_db;
use server::seed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    seed::ensure_indexes(&db).await?;

    let summary = seed::seed_demo(&db)
        .await
        .map_err(|e| anyhow::anyhow!("Seeding failed: {e:?}"))?;

    println!("Seeding completed");
    println!("  User:     {}", summary.author.email);
    if let Some(password) = &summary.generated_password {
        println!("  Password: {password}");
    }
    println!("  Category: {} ({})", summary.category.name_bg, summary.category.slug);
    match &summary.article {
        Some(article) => println!("  Article:  {} ({})", article.title, article.slug),
        None => println!("  Article:  already present"),
    }
    Ok(())
}
