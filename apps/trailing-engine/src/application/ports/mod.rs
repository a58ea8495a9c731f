//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driver Ports** (Primary/Inbound): How the world uses our application
//! - **Driven Ports** (Secondary/Outbound): How our application uses external systems
//!
//! All driven ports are synchronous. An engine operation runs to completion
//! inside one unit of work and never suspends halfway.

mod event_publisher_port;
mod ledger_port;
mod market_port;
mod yield_venue_port;

pub use event_publisher_port::{EventPublishError, EventPublisherPort, NoOpEventPublisher};
pub use ledger_port::{LedgerError, LedgerPort, NoOpLedger};
pub use market_port::{ANY_SLIPPAGE_BPS, MarketError, MarketPort, SwapRequest};
pub use yield_venue_port::{VenueError, YieldVenuePort};

#[cfg(test)]
pub use event_publisher_port::MockEventPublisherPort;
#[cfg(test)]
pub use ledger_port::MockLedgerPort;
#[cfg(test)]
pub use market_port::MockMarketPort;
#[cfg(test)]
pub use yield_venue_port::MockYieldVenuePort;
