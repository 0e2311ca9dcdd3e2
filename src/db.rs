use sqlx::{postgres::PgPoolOptions, PgPool};

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        ensure_schema(&pool).await?;

        Ok(Self { pool })
    }
}

/// Creates the three tables the service owns when they do not exist yet.
/// Idempotent, runs on every boot.
async fn ensure_schema(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clients_config (
            id_slug TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            client_type TEXT,
            webhook_url TEXT NOT NULL,
            investment DOUBLE PRECISION NOT NULL DEFAULT 0,
            investment_updated_at DATE,
            sales_goal DOUBLE PRECISION NOT NULL DEFAULT 0,
            logo_url TEXT,
            theme_primary TEXT NOT NULL DEFAULT '#7551FF',
            theme_secondary TEXT NOT NULL DEFAULT '#01F1E3',
            username TEXT,
            password TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_profiles (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_digest TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'partner',
            is_active BOOLEAN NOT NULL DEFAULT TRUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_client_access (
            user_id UUID NOT NULL REFERENCES user_profiles(id) ON DELETE CASCADE,
            client_slug TEXT NOT NULL REFERENCES clients_config(id_slug) ON DELETE CASCADE,
            PRIMARY KEY (user_id, client_slug)
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database schema verified");
    Ok(())
}
