use dotenvy::dotenv;
use glob::glob;
use std::fs;
use tokio_postgres::NoTls;

use pronet_api::database::INITIAL_SCHEMA;

const EMBEDDED_VERSION: &str = "V1__initial_schema.sql";

/// Migration files in apply order, as (version, sql)
fn discover_migrations(pattern: &str) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    let mut files: Vec<std::path::PathBuf> = glob(pattern)?.filter_map(Result::ok).collect();

    // Flyway-style names sort into apply order
    files.sort();

    let mut migrations = Vec::with_capacity(files.len());
    for path in files {
        let version = path
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| format!("Invalid migration file name: {}", path.display()))?;
        migrations.push((version, fs::read_to_string(&path)?));
    }
    Ok(migrations)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL must be set in environment")?;

    let (mut client, connection) = tokio_postgres::connect(&database_url, NoTls).await?;

    // Spawn the connection handling task
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("connection error: {}", e);
        }
    });

    client.batch_execute("
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version VARCHAR(100) PRIMARY KEY,
            installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
    ").await?;

    let mut migrations = discover_migrations("migrations/V*.sql")?;
    if migrations.is_empty() {
        log::warn!("No migration files found in migrations/, using the embedded schema");
        migrations.push((EMBEDDED_VERSION.to_string(), INITIAL_SCHEMA.to_string()));
    }

    let mut applied = 0;
    for (version, sql) in migrations {
        let row = client
            .query_opt("SELECT version FROM schema_migrations WHERE version = $1", &[&version])
            .await?;

        if row.is_some() {
            log::info!("Skipping already-applied migration: {}", version);
            continue;
        }

        log::info!("Applying migration: {}", version);

        let txn = client.transaction().await?;
        txn.batch_execute(&sql).await?;
        txn.execute("INSERT INTO schema_migrations (version) VALUES ($1)", &[&version]).await?;
        txn.commit().await?;

        applied += 1;
    }

    log::info!("Migrations complete ({} applied)", applied);
    Ok(())
}
