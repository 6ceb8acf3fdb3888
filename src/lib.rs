// margin-core: smart margin account engine.
// batch-first architecture: every mutation flows through the command
// dispatcher, which is atomic and non-reentrant. all computation is
// deterministic; external collaborators sit behind ports.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Address, MarketId, OrderId, Price, Quote, Bps
//   2.x  commands.rs: the command tagged union and authorization classes
//   3.x  auth.rs: owner/delegate gate, per-kind capability checks
//   4.x  ledger.rs: free vs committed margin accounting
//   5.x  oracle.rs: primary feed + venue fallback price resolution
//   6.x  fees.rs: order-flow fee computation and draw planning
//   7.x  config.rs: shared configuration store, presets
//   8.x  engine/: MarginAccount: dispatch, handlers, lock, atomicity
//   9.x  conditional.rs: conditional order records and trigger rules
//   10.x events.rs: relayed event payloads for off-process monitoring
//   11.x venue.rs / keeper.rs / registry.rs / exchange.rs: collaborator
//        ports with in-crate sim/mock implementations

// core account modules
pub mod auth;
pub mod commands;
pub mod conditional;
pub mod engine;
pub mod events;
pub mod fees;
pub mod ledger;
pub mod oracle;
pub mod types;

// integration modules
pub mod config;
pub mod exchange;
pub mod keeper;
pub mod registry;
pub mod venue;

// re exports for convenience
pub use auth::*;
pub use commands::*;
pub use conditional::*;
pub use engine::*;
pub use events::*;
pub use fees::*;
pub use ledger::*;
pub use oracle::*;
pub use types::*;

pub use config::{ConfigError, SystemConfig};
pub use exchange::{CollateralExchange, ExchangeError, MockExchange};
pub use keeper::{KeeperError, KeeperGateway, MockKeeper, TaskId};
pub use registry::{AccountRegistry, InMemoryRegistry};
pub use venue::{DelayedOrder, PerpsVenue, SimVenue, VenueError, VenuePosition};
