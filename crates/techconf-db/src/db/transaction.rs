//! Database transaction utilities
//!
//! The read-count-update sequence of one invocation runs inside a single
//! transaction so a failure part-way leaves the notification row untouched.

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use techconf_core::AppError;

/// A database transaction wrapper with explicit commit/rollback
///
/// # Example
///
/// ```ignore
/// use techconf_db::TransactionGuard;
///
/// async fn example(pool: &sqlx::PgPool) -> Result<(), techconf_core::AppError> {
///     let mut tx = TransactionGuard::begin(pool).await?;
///     sqlx::query("UPDATE ...").execute(tx.connection()?).await?;
///     tx.commit().await?;
///     Ok(())
/// }
/// ```
pub struct TransactionGuard {
    transaction: Option<Transaction<'static, Postgres>>,
}

impl TransactionGuard {
    /// Begin a new database transaction
    pub async fn begin(pool: &PgPool) -> Result<Self, AppError> {
        let transaction = pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin database transaction");
            AppError::from(e)
        })?;

        Ok(Self {
            transaction: Some(transaction),
        })
    }

    /// Connection to run statements on, while the transaction is open.
    pub fn connection(&mut self) -> Result<&mut PgConnection, AppError> {
        match self.transaction.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(AppError::Internal(
                "Transaction was already committed or rolled back".to_string(),
            )),
        }
    }

    /// Commit the transaction
    ///
    /// After calling this, the transaction is consumed and cannot be used further.
    pub async fn commit(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.commit().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to commit database transaction");
                AppError::from(e)
            })?;
        }
        Ok(())
    }

    /// Rollback the transaction
    ///
    /// After calling this, the transaction is consumed and cannot be used further.
    pub async fn rollback(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.rollback().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to rollback database transaction");
                AppError::from(e)
            })?;
        }
        Ok(())
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        // sqlx queues a ROLLBACK when an open transaction is dropped
        if self.transaction.is_some() {
            tracing::warn!(
                "Transaction was dropped without explicit commit or rollback - rolling back"
            );
        }
    }
}
