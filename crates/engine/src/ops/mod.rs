use sea_orm::{DatabaseConnection, DbErr};

use crate::{EngineError, ResultEngine};

mod earmarks;
mod invoices;
mod links;
mod reports;

pub use invoices::InvoiceUpdate;
pub use reports::{BankAccountGroup, DueDateGroup, FullReport};

/// Attempts per ledger mutation before a transient store conflict is
/// surfaced to the caller.
const TX_RETRY_LIMIT: u32 = 3;

/// Returns `true` for store errors worth retrying (lock contention,
/// serialization failures). Business-rule errors never match.
fn is_transient_conflict(err: &DbErr) -> bool {
    let message = err.to_string().to_lowercase();
    message.contains("database is locked")
        || message.contains("busy")
        || message.contains("serialization")
        || message.contains("deadlock")
}

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error. Transient store conflicts are retried transparently up to
/// [`TX_RETRY_LIMIT`] times; any other error aborts on the first attempt.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let mut attempt = 0u32;
        loop {
            let $tx = $self.database.begin().await?;
            let result = $body;
            match result {
                Ok(value) => match $tx.commit().await {
                    Ok(()) => break Ok(value),
                    Err(err)
                        if $crate::ops::is_transient_conflict(&err)
                            && attempt < $crate::ops::TX_RETRY_LIMIT =>
                    {
                        attempt += 1;
                        tracing::debug!(attempt, error = %err, "retrying conflicted commit");
                    }
                    Err(err) => break Err($crate::EngineError::from(err)),
                },
                Err($crate::EngineError::Database(err))
                    if $crate::ops::is_transient_conflict(&err)
                        && attempt < $crate::ops::TX_RETRY_LIMIT =>
                {
                    attempt += 1;
                    tracing::debug!(attempt, error = %err, "retrying conflicted transaction");
                    let _ = $tx.rollback().await;
                }
                Err(err) => {
                    let _ = $tx.rollback().await;
                    break Err(err);
                }
            }
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{Database, TransactionTrait};

    use super::*;

    fn conflict(message: &str) -> DbErr {
        DbErr::Custom(message.to_string())
    }

    #[test]
    fn classifier_accepts_transient_conflicts() {
        assert!(is_transient_conflict(&conflict("database is locked")));
        assert!(is_transient_conflict(&conflict("database table is locked")));
        assert!(is_transient_conflict(&conflict("SQLITE_BUSY")));
        assert!(is_transient_conflict(&conflict("serialization failure")));
        assert!(is_transient_conflict(&conflict("deadlock detected")));
    }

    #[test]
    fn classifier_rejects_terminal_errors() {
        assert!(!is_transient_conflict(&conflict(
            "UNIQUE constraint failed: earmarks.id"
        )));
        assert!(!is_transient_conflict(&conflict("no such table: invoices")));
        assert!(!is_transient_conflict(&DbErr::RecordNotFound(
            "earmark".to_string()
        )));
    }

    async fn engine() -> Engine {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Engine::builder().database(db).build().await.unwrap()
    }

    #[tokio::test]
    async fn transient_conflicts_are_retried_up_to_the_limit() -> Result<(), EngineError> {
        let engine = engine().await;
        let mut attempts = 0u32;

        let result: Result<(), EngineError> = with_tx!(engine, |db_tx| {
            let _ = &db_tx;
            attempts += 1;
            Err::<(), EngineError>(EngineError::Database(conflict("database is locked")))
        });

        assert!(matches!(result, Err(EngineError::Database(_))));
        assert_eq!(attempts, TX_RETRY_LIMIT + 1);
        Ok(())
    }

    #[tokio::test]
    async fn business_errors_are_never_retried() -> Result<(), EngineError> {
        let engine = engine().await;
        let mut attempts = 0u32;

        let result: Result<(), EngineError> = with_tx!(engine, |db_tx| {
            let _ = &db_tx;
            attempts += 1;
            Err::<(), EngineError>(EngineError::InsufficientBalance("spent".to_string()))
        });

        assert!(matches!(result, Err(EngineError::InsufficientBalance(_))));
        assert_eq!(attempts, 1);
        Ok(())
    }
}
