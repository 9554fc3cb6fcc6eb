//! Common test utilities

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

/// Connect to the test database named by `DATABASE_URL` and make sure the
/// schema exists. Returns `None` (so the caller can skip) when the
/// variable is unset.
///
/// Tests share one database and run concurrently, so there is no global
/// truncation here; every test works with its own external ids and purges
/// them via [`purge`].
pub async fn try_setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set; skipping database test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    // Serialize schema application across concurrently starting tests.
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    sqlx::query("SELECT pg_advisory_lock(715001)")
        .execute(&mut *conn)
        .await
        .expect("Failed to take schema lock");
    conn.execute(include_str!("../../migrations/001_init.sql"))
        .await
        .expect("Failed to apply schema");
    sqlx::query("SELECT pg_advisory_unlock(715001)")
        .execute(&mut *conn)
        .await
        .expect("Failed to release schema lock");

    Some(pool)
}

/// Delete the rows a test created. Edges disappear with their endpoints
/// through ON DELETE CASCADE.
pub async fn purge(pool: &PgPool, user_ids: &[&str], community_ids: &[&str]) {
    let user_ids: Vec<String> = user_ids.iter().map(|id| id.to_string()).collect();
    let community_ids: Vec<String> = community_ids.iter().map(|id| id.to_string()).collect();

    sqlx::query("DELETE FROM users WHERE external_id = ANY($1)")
        .bind(&user_ids)
        .execute(pool)
        .await
        .expect("Failed to purge users");
    sqlx::query("DELETE FROM communities WHERE external_id = ANY($1)")
        .bind(&community_ids)
        .execute(pool)
        .await
        .expect("Failed to purge communities");
}
