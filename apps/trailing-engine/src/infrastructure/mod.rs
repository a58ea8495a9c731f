//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer, plus the async
//! runtime that owns the engine.
//!
//! - **Driven adapters (outbound)**
//!   - `ledger/`: journaled in-memory host ledger (`LedgerPort`)
//!   - `market/`: in-memory market over the host ledger (`MarketPort`)
//!   - `venue/`: in-memory yield venue over the host ledger (`YieldVenuePort`)
//!   - `events/`: recording and tracing event publishers
//!
//! - **Driver adapters (inbound)**
//!   - `service/`: tokio task owning the engine, fed over a command channel
//!   - `simulation/`: config-driven wiring and scenario replay for the binary

pub mod events;
pub mod ledger;
pub mod market;
pub mod service;
pub mod simulation;
pub mod venue;
