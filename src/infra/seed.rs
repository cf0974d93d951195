//! Default users and projects for a fresh install.

use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use crate::infra::db::Db;
use crate::security::password;

/// Seeds the store with the default accounts and projects.
///
/// Explicit and idempotent: runs only when the user table is empty, so a
/// redeploy over an existing database is a no-op. Invoked once from `main`
/// after the schema exists.
pub async fn seed_defaults(db: &Db) -> anyhow::Result<()> {
    let count: i64 = sqlx::query("SELECT count(*) AS n FROM users")
        .fetch_one(db)
        .await?
        .get("n");
    if count > 0 {
        return Ok(());
    }

    let admin_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, is_admin) VALUES ($1, $2, $3, true)",
    )
    .bind(admin_id)
    .bind("fgillet")
    .bind(password::hash_password("fgillet")?)
    .execute(db)
    .await?;

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, is_admin) VALUES ($1, $2, $3, false)",
    )
    .bind(user_id)
    .bind("htepa")
    .bind(password::hash_password("htepa")?)
    .execute(db)
    .await?;

    let projects = [
        (
            "Développement Site Web",
            "Développement frontend et backend du site web de l'entreprise",
        ),
        (
            "Application Mobile",
            "Développement de l'application mobile iOS et Android",
        ),
    ];
    for (name, description) in projects {
        sqlx::query(
            "INSERT INTO projects (id, name, description, created_by) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(admin_id)
        .execute(db)
        .await?;
    }

    info!("seeded default users and projects");
    Ok(())
}
