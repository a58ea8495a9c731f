//! Engine service: one task owns the engine and applies commands in arrival
//! order, which is the global serialization order for concurrent callers.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::application::dto::{
    DepositReceipt, DepositRequest, ExecutionReceipt, PriceUpdate, PriceUpdateReport,
    WithdrawRequest, WithdrawalReceipt,
};
use crate::application::ports::{EventPublisherPort, LedgerPort, MarketPort, YieldVenuePort};
use crate::application::use_cases::TrailingStopEngine;
use crate::domain::shared::{AccountId, MarketId};
use crate::domain::trailing_stop::{Direction, PoolKey, Position, Tier, TrailingPool};
use crate::error::EngineError;

type Reply<T> = oneshot::Sender<T>;

/// Commands accepted by the engine task.
///
/// Not `Clone`: every variant carries its reply channel.
#[derive(Debug)]
pub enum EngineCommand {
    /// Deposit principal.
    Deposit {
        /// Deposit parameters.
        request: DepositRequest,
        /// Reply channel.
        reply: Reply<Result<DepositReceipt, EngineError>>,
    },
    /// Burn shares.
    Withdraw {
        /// Withdrawal parameters.
        request: WithdrawRequest,
        /// Reply channel.
        reply: Reply<Result<WithdrawalReceipt, EngineError>>,
    },
    /// Execute qualifying pools of one tier, or of every tier when `tier` is `None`.
    TryExecute {
        /// Market.
        market: MarketId,
        /// Tier, or all tiers.
        tier: Option<Tier>,
        /// Reply channel.
        reply: Reply<Result<Vec<ExecutionReceipt>, EngineError>>,
    },
    /// Apply a tick move.
    PriceChanged {
        /// The move.
        update: PriceUpdate,
        /// Reply channel.
        reply: Reply<PriceUpdateReport>,
    },
    /// Read one pool.
    PoolState {
        /// Pool.
        key: PoolKey,
        /// Reply channel.
        reply: Reply<Option<TrailingPool>>,
    },
    /// Read one share row.
    ShareBalance {
        /// Holder.
        owner: AccountId,
        /// Pool.
        pool: PoolKey,
        /// Reply channel.
        reply: Reply<u128>,
    },
    /// Read a series epoch.
    CurrentEpoch {
        /// Market.
        market: MarketId,
        /// Tier.
        tier: Tier,
        /// Direction.
        direction: Direction,
        /// Reply channel.
        reply: Reply<u64>,
    },
    /// Read every holding of an account.
    Positions {
        /// Holder.
        owner: AccountId,
        /// Reply channel.
        reply: Reply<Vec<Position>>,
    },
    /// Read the open pools of a market.
    OpenPools {
        /// Market.
        market: MarketId,
        /// Reply channel.
        reply: Reply<Vec<(PoolKey, TrailingPool)>>,
    },
    /// Stop the task after the commands already queued.
    Shutdown,
}

/// Spawns the engine task.
pub struct EngineService;

impl EngineService {
    /// Move `engine` onto a new task with a command queue of `capacity`.
    ///
    /// The join handle yields the engine back once the task stops, either on
    /// [`EngineHandle::shutdown`] or when every handle is dropped.
    pub fn spawn<M, V, L, P>(
        engine: TrailingStopEngine<M, V, L, P>,
        capacity: usize,
    ) -> (EngineHandle, JoinHandle<TrailingStopEngine<M, V, L, P>>)
    where
        M: MarketPort + 'static,
        V: YieldVenuePort + 'static,
        L: LedgerPort + 'static,
        P: EventPublisherPort + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(run(engine, rx));
        (EngineHandle { tx }, task)
    }
}

async fn run<M, V, L, P>(
    mut engine: TrailingStopEngine<M, V, L, P>,
    mut rx: mpsc::Receiver<EngineCommand>,
) -> TrailingStopEngine<M, V, L, P>
where
    M: MarketPort,
    V: YieldVenuePort,
    L: LedgerPort,
    P: EventPublisherPort,
{
    tracing::info!("engine service started");
    while let Some(command) = rx.recv().await {
        if !apply(&mut engine, command) {
            break;
        }
    }
    tracing::info!("engine service stopped");
    engine
}

/// Apply one command; `false` stops the loop. Dropped reply receivers are ignored.
fn apply<M, V, L, P>(engine: &mut TrailingStopEngine<M, V, L, P>, command: EngineCommand) -> bool
where
    M: MarketPort,
    V: YieldVenuePort,
    L: LedgerPort,
    P: EventPublisherPort,
{
    match command {
        EngineCommand::Deposit { request, reply } => {
            let _ = reply.send(engine.deposit(request));
        }
        EngineCommand::Withdraw { request, reply } => {
            let _ = reply.send(engine.withdraw(request));
        }
        EngineCommand::TryExecute {
            market,
            tier,
            reply,
        } => {
            let result = match tier {
                Some(tier) => engine.try_execute(&market, tier),
                None => engine.try_execute_market(&market),
            };
            let _ = reply.send(result);
        }
        EngineCommand::PriceChanged { update, reply } => {
            let _ = reply.send(engine.on_price_changed(
                &update.market,
                update.previous_tick,
                update.new_tick,
            ));
        }
        EngineCommand::PoolState { key, reply } => {
            let _ = reply.send(engine.pool_state(&key).cloned());
        }
        EngineCommand::ShareBalance { owner, pool, reply } => {
            let _ = reply.send(engine.share_balance(&owner, &pool));
        }
        EngineCommand::CurrentEpoch {
            market,
            tier,
            direction,
            reply,
        } => {
            let _ = reply.send(engine.current_epoch(&market, tier, direction));
        }
        EngineCommand::Positions { owner, reply } => {
            let _ = reply.send(engine.positions_of(&owner));
        }
        EngineCommand::OpenPools { market, reply } => {
            let _ = reply.send(engine.open_pools(&market));
        }
        EngineCommand::Shutdown => return false,
    }
    true
}

/// Cloneable async front door to the engine task.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> EngineCommand,
    ) -> Result<T, EngineError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| service_stopped())?;
        response.await.map_err(|_| service_stopped())
    }

    /// See [`TrailingStopEngine::deposit`].
    ///
    /// # Errors
    ///
    /// Engine error, or `INTERNAL_ERROR` if the service stopped.
    pub async fn deposit(&self, request: DepositRequest) -> Result<DepositReceipt, EngineError> {
        self.request(|reply| EngineCommand::Deposit { request, reply })
            .await?
    }

    /// See [`TrailingStopEngine::withdraw`].
    ///
    /// # Errors
    ///
    /// Engine error, or `INTERNAL_ERROR` if the service stopped.
    pub async fn withdraw(
        &self,
        request: WithdrawRequest,
    ) -> Result<WithdrawalReceipt, EngineError> {
        self.request(|reply| EngineCommand::Withdraw { request, reply })
            .await?
    }

    /// See [`TrailingStopEngine::try_execute`].
    ///
    /// # Errors
    ///
    /// Engine error, or `INTERNAL_ERROR` if the service stopped.
    pub async fn try_execute(
        &self,
        market: MarketId,
        tier: Tier,
    ) -> Result<Vec<ExecutionReceipt>, EngineError> {
        self.request(|reply| EngineCommand::TryExecute {
            market,
            tier: Some(tier),
            reply,
        })
        .await?
    }

    /// See [`TrailingStopEngine::try_execute_market`].
    ///
    /// # Errors
    ///
    /// Engine error, or `INTERNAL_ERROR` if the service stopped.
    pub async fn try_execute_market(
        &self,
        market: MarketId,
    ) -> Result<Vec<ExecutionReceipt>, EngineError> {
        self.request(|reply| EngineCommand::TryExecute {
            market,
            tier: None,
            reply,
        })
        .await?
    }

    /// See [`TrailingStopEngine::on_price_changed`].
    ///
    /// # Errors
    ///
    /// `INTERNAL_ERROR` if the service stopped.
    pub async fn price_changed(&self, update: PriceUpdate) -> Result<PriceUpdateReport, EngineError> {
        self.request(|reply| EngineCommand::PriceChanged { update, reply })
            .await
    }

    /// See [`TrailingStopEngine::pool_state`].
    ///
    /// # Errors
    ///
    /// `INTERNAL_ERROR` if the service stopped.
    pub async fn pool_state(&self, key: PoolKey) -> Result<Option<TrailingPool>, EngineError> {
        self.request(|reply| EngineCommand::PoolState { key, reply })
            .await
    }

    /// See [`TrailingStopEngine::share_balance`].
    ///
    /// # Errors
    ///
    /// `INTERNAL_ERROR` if the service stopped.
    pub async fn share_balance(&self, owner: AccountId, pool: PoolKey) -> Result<u128, EngineError> {
        self.request(|reply| EngineCommand::ShareBalance { owner, pool, reply })
            .await
    }

    /// See [`TrailingStopEngine::current_epoch`].
    ///
    /// # Errors
    ///
    /// `INTERNAL_ERROR` if the service stopped.
    pub async fn current_epoch(
        &self,
        market: MarketId,
        tier: Tier,
        direction: Direction,
    ) -> Result<u64, EngineError> {
        self.request(|reply| EngineCommand::CurrentEpoch {
            market,
            tier,
            direction,
            reply,
        })
        .await
    }

    /// See [`TrailingStopEngine::positions_of`].
    ///
    /// # Errors
    ///
    /// `INTERNAL_ERROR` if the service stopped.
    pub async fn positions_of(&self, owner: AccountId) -> Result<Vec<Position>, EngineError> {
        self.request(|reply| EngineCommand::Positions { owner, reply })
            .await
    }

    /// See [`TrailingStopEngine::open_pools`].
    ///
    /// # Errors
    ///
    /// `INTERNAL_ERROR` if the service stopped.
    pub async fn open_pools(
        &self,
        market: MarketId,
    ) -> Result<Vec<(PoolKey, TrailingPool)>, EngineError> {
        self.request(|reply| EngineCommand::OpenPools { market, reply })
            .await
    }

    /// Ask the task to stop after the commands already queued.
    ///
    /// # Errors
    ///
    /// `INTERNAL_ERROR` if the service already stopped.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.tx
            .send(EngineCommand::Shutdown)
            .await
            .map_err(|_| service_stopped())
    }
}

fn service_stopped() -> EngineError {
    EngineError::internal("engine service is not running")
}
