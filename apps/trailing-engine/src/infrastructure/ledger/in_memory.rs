//! Journaled in-memory host ledger.
//!
//! Holds the state behind [`InMemoryMarket`] and [`InMemoryYieldVenue`] and
//! snapshots it on `begin`, so `rollback` undoes every market and venue effect
//! of the aborted unit of work.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::application::ports::{LedgerError, LedgerPort};
use crate::domain::shared::{AccountId, AssetId, MarketId};
use crate::infrastructure::market::{InMemoryMarket, MarketState};
use crate::infrastructure::venue::InMemoryYieldVenue;

/// Balance row key: `(asset, account)`.
pub type BalanceKey = (AssetId, AccountId);

/// Everything the simulated host tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostState {
    /// Markets by id.
    pub markets: HashMap<MarketId, MarketState>,
    /// Amounts supplied to the venue, per beneficiary.
    pub supplied: HashMap<BalanceKey, u128>,
    /// Amounts the venue delivered, per recipient.
    pub delivered: HashMap<BalanceKey, u128>,
}

/// State shared between the ledger and its adapters.
#[derive(Debug, Clone, Default)]
pub struct SharedHostState(Arc<RwLock<HostState>>);

impl SharedHostState {
    /// Read access; a poisoned lock still yields the last written state.
    pub fn read(&self) -> RwLockReadGuard<'_, HostState> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access; a poisoned lock still yields the last written state.
    pub fn write(&self) -> RwLockWriteGuard<'_, HostState> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory [`LedgerPort`] with snapshot journaling.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: SharedHostState,
    journal: RwLock<Option<HostState>>,
    fail_commits: AtomicBool,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Market adapter backed by this ledger.
    #[must_use]
    pub fn market(&self) -> InMemoryMarket {
        InMemoryMarket::new(self.state.clone())
    }

    /// Yield venue adapter backed by this ledger, operated by `operator`.
    #[must_use]
    pub fn yield_venue(&self, operator: AccountId) -> InMemoryYieldVenue {
        InMemoryYieldVenue::new(self.state.clone(), operator)
    }

    /// Copy of the current host state.
    #[must_use]
    pub fn snapshot(&self) -> HostState {
        self.state.read().clone()
    }

    /// Whether a unit of work is open.
    #[must_use]
    pub fn in_unit_of_work(&self) -> bool {
        self.journal_read().is_some()
    }

    /// Make every subsequent `commit` fail until reset.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    fn journal_read(&self) -> RwLockReadGuard<'_, Option<HostState>> {
        self.journal.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn journal_write(&self) -> RwLockWriteGuard<'_, Option<HostState>> {
        self.journal.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerPort for InMemoryLedger {
    fn begin(&self) -> Result<(), LedgerError> {
        let mut journal = self.journal_write();
        if journal.is_some() {
            return Err(LedgerError::AlreadyOpen);
        }
        *journal = Some(self.state.read().clone());
        Ok(())
    }

    fn commit(&self) -> Result<(), LedgerError> {
        let mut journal = self.journal_write();
        if journal.is_none() {
            return Err(LedgerError::NotOpen);
        }
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable {
                message: "commit rejected by host".to_string(),
            });
        }
        *journal = None;
        Ok(())
    }

    fn rollback(&self) -> Result<(), LedgerError> {
        let snapshot = self.journal_write().take().ok_or(LedgerError::NotOpen)?;
        *self.state.write() = snapshot;
        Ok(())
    }
}
