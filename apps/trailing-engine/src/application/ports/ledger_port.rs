//! Ledger Port (Driven Port)
//!
//! Unit-of-work boundary of the host ledger. Every engine operation runs
//! between `begin` and `commit`; any failure rolls back all collaborator
//! effects made since `begin`.

/// Ledger error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// `begin` called inside an open unit of work.
    #[error("unit of work already open")]
    AlreadyOpen,

    /// `commit` or `rollback` without `begin`.
    #[error("no open unit of work")]
    NotOpen,

    /// Host ledger failure.
    #[error("ledger unavailable: {message}")]
    Unavailable {
        /// Detail from the host.
        message: String,
    },
}

/// Port for the host ledger's transaction boundary.
#[cfg_attr(test, mockall::automock)]
pub trait LedgerPort: Send + Sync {
    /// Open a unit of work.
    ///
    /// # Errors
    ///
    /// A unit of work is already open or the host failed.
    fn begin(&self) -> Result<(), LedgerError>;

    /// Make every effect since `begin` permanent.
    ///
    /// # Errors
    ///
    /// No unit of work open or the host failed.
    fn commit(&self) -> Result<(), LedgerError>;

    /// Discard every effect since `begin`.
    ///
    /// # Errors
    ///
    /// No unit of work open or the host failed.
    fn rollback(&self) -> Result<(), LedgerError>;
}

/// Ledger for hosts that already run each call atomically.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLedger;

impl LedgerPort for NoOpLedger {
    fn begin(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    fn commit(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    fn rollback(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}
