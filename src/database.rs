use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres};

use crate::{config::AdminSeed, utils::hash_password};

pub type Database = Pool<Postgres>;

pub async fn create_database_pool(database_url: &str, max_connections: u32) -> Result<Database, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await?;

    log::info!("Connected to database successfully");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations applied");
    Ok(())
}

/// Creates the configured admin account unless the email is already taken.
pub async fn ensure_admin(db: &Database, seed: &AdminSeed, bcrypt_cost: u32) -> Result<(), Box<dyn std::error::Error>> {
    let password_hash = hash_password(&seed.password, bcrypt_cost)?;

    let created = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, role)
        VALUES ($1, $2, 'Platform', 'Admin', 'admin')
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(seed.email.to_lowercase())
    .bind(password_hash)
    .execute(db)
    .await?
    .rows_affected();

    if created > 0 {
        log::info!("Created admin account {}", seed.email);
    }
    Ok(())
}
