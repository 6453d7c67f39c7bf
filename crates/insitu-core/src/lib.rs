//! In Situ Core -- the production simulation engine for an idle factory game.
//!
//! A fixed set of resources is produced and consumed by machines running
//! recipes. This crate owns the data model (catalog, ledger, machines), the
//! per-tick resource transfer algorithm, the build affordability checks and
//! the display formatter. Presentation and input handling live outside.
//!
//! # Tick Pipeline
//!
//! Each call to [`session::Session::tick`] with a positive elapsed time:
//!
//! 1. **Process** -- every active machine with a recipe computes a craft
//!    ratio against the current stock and applies scaled input/output deltas.
//! 2. **Events** -- production, consumption and stall transitions are
//!    emitted to the [`event::EventBus`] and delivered to listeners.
//! 3. **Bookkeeping** -- tick counter, simulated time and state hash update.
//!
//! # Proportional Throttling
//!
//! A machine short on inputs does not stall outright. Its craft ratio is the
//! fraction of the required input its scarcest resource can cover, and both
//! consumption and output are scaled by that ratio:
//!
//! ```rust,ignore
//! // smelter needs 10 ore/s, only 5 ore in stock, 1 s tick
//! let report = session.tick(1.0);
//! assert_eq!(report.runs[0].ratio, 0.5);
//! ```
//!
//! # Key Types
//!
//! - [`catalog::Catalog`] -- Immutable tables of resources, machine types,
//!   recipes and harvest actions (frozen at startup).
//! - [`ledger::Ledger`] -- Non-negative stock of every resource.
//! - [`machine::Machine`] -- A built machine with its active flag and recipe.
//! - [`production`] -- Craft ratio and the per-tick production pass.
//! - [`builder`] -- Affordability check and atomic cost deduction.
//! - [`format`] -- Human-scaled display strings (`1.23 kg`).
//! - [`session::Session`] -- The world object the UI drives.
//! - [`scheduler::TickScheduler`] -- Background fixed-rate tick worker.

pub mod builder;
pub mod catalog;
pub mod event;
pub mod format;
pub mod id;
pub mod ledger;
pub mod machine;
pub mod production;
pub mod scheduler;
pub mod session;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// Player-facing game title.
pub const GAME_TITLE: &str = "In Situ";
