//! # Merit-Chain Node Runtime
//!
//! Wires the subsystems into a running network participant.
//!
//! ## Concurrency model
//!
//! Each node is logically single-threaded cooperative: the phase ticker,
//! the periodic broadcast/sweep tasks, and inbound relay traffic all feed
//! one mpsc channel, and the event loop runs each event to completion
//! before taking the next. The in-memory node state (pools, caches, head)
//! therefore needs no locking. Network sends are the only suspension
//! points.
//!
//! ## Modular Structure
//!
//! - `config` - node configuration with environment overrides
//! - `identity` - self-signed participant identity
//! - `ports` - relay transport and review producer boundaries
//! - `adapters` - in-memory store, loopback relay, channel review producer
//! - `events` - the typed event enum feeding the loop
//! - `tasks` - cancellable repeating broadcast tasks
//! - `runtime` - the event loop wiring both node roles

pub mod adapters;
pub mod config;
pub mod events;
pub mod identity;
pub mod ports;
pub mod runtime;
pub mod tasks;

pub use config::NodeConfig;
pub use events::{NodeEvent, ReviewOutcome};
pub use ports::{RelayTransport, ReviewProducer};
pub use runtime::NodeRuntime;
