//! Unit of work
//!
//! Wraps a single Postgres transaction around a caller-supplied closure:
//! commit when the closure succeeds, roll back when it fails. Nesting is
//! not supported; the closure must issue every statement through the
//! handle it is given.

use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};

use super::StoreError;

/// Run `work` inside one transaction.
///
/// The closure's future may borrow only the transaction handle it is
/// given; any other state it needs must be moved in as owned values.
/// A begin failure surfaces before any work runs. When `work` returns an
/// error the transaction is rolled back and that original error is
/// returned; a rollback failure is logged, never returned in its place.
/// A commit failure is the only way a successful `work` can still fail.
pub async fn run_in_transaction<T, F>(pool: &PgPool, work: F) -> Result<T, StoreError>
where
    T: Send,
    F: for<'t> FnOnce(
            &'t mut Transaction<'static, Postgres>,
        ) -> BoxFuture<'t, Result<T, StoreError>>
        + Send,
{
    let mut tx = pool.begin().await?;

    match work(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}
