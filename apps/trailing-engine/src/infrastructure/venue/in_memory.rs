//! In-memory yield venue.
//!
//! Supplies credit the beneficiary's position; withdrawals debit the
//! operator's position and deliver the amount plus a configurable yield to the
//! recipient. Yield is minted on withdrawal rather than accrued over time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::application::ports::{VenueError, YieldVenuePort};
use crate::domain::shared::{AccountId, ArithmeticError, AssetId, math};
use crate::infrastructure::ledger::SharedHostState;

const BPS_DENOMINATOR: u128 = 10_000;

/// In-memory [`YieldVenuePort`] over the shared host state.
#[derive(Debug)]
pub struct InMemoryYieldVenue {
    state: SharedHostState,
    operator: AccountId,
    yield_bps: RwLock<HashMap<AssetId, u32>>,
    fail_supplies: AtomicBool,
    fail_withdrawals: AtomicBool,
}

impl InMemoryYieldVenue {
    pub(crate) fn new(state: SharedHostState, operator: AccountId) -> Self {
        Self {
            state,
            operator,
            yield_bps: RwLock::new(HashMap::new()),
            fail_supplies: AtomicBool::new(false),
            fail_withdrawals: AtomicBool::new(false),
        }
    }

    /// Account whose position withdrawals debit.
    #[must_use]
    pub const fn operator(&self) -> &AccountId {
        &self.operator
    }

    /// Yield paid on top of every withdrawal of `asset`, in basis points.
    pub fn set_yield_bps(&self, asset: AssetId, bps: u32) {
        self.yield_bps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(asset, bps);
    }

    /// Amount of `asset` supplied on behalf of `account`.
    #[must_use]
    pub fn supplied_balance(&self, asset: &AssetId, account: &AccountId) -> u128 {
        self.state
            .read()
            .supplied
            .get(&(asset.clone(), account.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Amount of `asset` delivered to `account`.
    #[must_use]
    pub fn delivered_balance(&self, asset: &AssetId, account: &AccountId) -> u128 {
        self.state
            .read()
            .delivered
            .get(&(asset.clone(), account.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Make every subsequent supply fail until reset.
    pub fn fail_supplies(&self, fail: bool) {
        self.fail_supplies.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent withdrawal fail until reset.
    pub fn fail_withdrawals(&self, fail: bool) {
        self.fail_withdrawals.store(fail, Ordering::SeqCst);
    }

    fn accrued(&self, asset: &AssetId, amount: u128) -> Result<u128, VenueError> {
        let bps = self
            .yield_bps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(asset)
            .copied()
            .unwrap_or_default();
        math::mul_div_floor(amount, u128::from(bps), BPS_DENOMINATOR).map_err(overflow)
    }
}

fn overflow(err: ArithmeticError) -> VenueError {
    VenueError::Unavailable {
        message: format!("venue arithmetic: {err}"),
    }
}

impl YieldVenuePort for InMemoryYieldVenue {
    fn supply(
        &self,
        asset: &AssetId,
        amount: u128,
        beneficiary: &AccountId,
    ) -> Result<(), VenueError> {
        if self.fail_supplies.load(Ordering::SeqCst) {
            return Err(VenueError::Unavailable {
                message: "supplies paused".to_string(),
            });
        }
        let mut host = self.state.write();
        let row = host
            .supplied
            .entry((asset.clone(), beneficiary.clone()))
            .or_default();
        *row = math::add(*row, amount).map_err(overflow)?;
        Ok(())
    }

    fn withdraw(
        &self,
        asset: &AssetId,
        amount: u128,
        recipient: &AccountId,
    ) -> Result<u128, VenueError> {
        if self.fail_withdrawals.load(Ordering::SeqCst) {
            return Err(VenueError::Unavailable {
                message: "withdrawals paused".to_string(),
            });
        }
        let delivered = math::add(amount, self.accrued(asset, amount)?).map_err(overflow)?;

        let mut host = self.state.write();
        let source = (asset.clone(), self.operator.clone());
        let available = host.supplied.get(&source).copied().unwrap_or_default();
        if amount > available {
            return Err(VenueError::InsufficientBalance {
                asset: asset.clone(),
                requested: amount,
                available,
            });
        }
        host.supplied.insert(source, available - amount);

        let row = host
            .delivered
            .entry((asset.clone(), recipient.clone()))
            .or_default();
        *row = math::add(*row, delivered).map_err(overflow)?;
        Ok(delivered)
    }
}
