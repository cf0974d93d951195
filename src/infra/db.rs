use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

pub type Db = sqlx::PgPool;

pub async fn connect() -> anyhow::Result<Db> {
    let url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL missing; point it at the Postgres instance")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .with_context(|| "failed to connect to database; check DATABASE_URL")?;
    Ok(pool)
}

/// Creates the schema if absent. Explicit and idempotent; called once from
/// `main`, never as an import side effect.
pub async fn init_schema(db: &Db) -> anyhow::Result<()> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_admin BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
        "CREATE TABLE IF NOT EXISTS projects (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            color TEXT NOT NULL DEFAULT '#2563EB',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            created_by UUID REFERENCES users(id) ON DELETE SET NULL
        )",
        "CREATE TABLE IF NOT EXISTS time_entries (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            hours DOUBLE PRECISION NOT NULL CHECK (hours > 0),
            year INTEGER NOT NULL,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            notes TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
        "CREATE TABLE IF NOT EXISTS refresh_tokens (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            token_hash TEXT NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            expires_at TIMESTAMPTZ NOT NULL,
            revoked_at TIMESTAMPTZ,
            rotated_from UUID
        )",
        "CREATE INDEX IF NOT EXISTS idx_time_entries_user ON time_entries (user_id)",
        "CREATE INDEX IF NOT EXISTS idx_time_entries_period ON time_entries (year, month)",
    ];

    for stmt in statements {
        sqlx::query(stmt)
            .execute(db)
            .await
            .with_context(|| "failed to initialize schema")?;
    }
    Ok(())
}
