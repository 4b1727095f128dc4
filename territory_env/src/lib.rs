//! Territory Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the territory
//! engine to run in both **Production** (tokio) and **Simulation**
//! (virtual clock) environments.
//!
//! # Core Concept: The Reactor Pattern
//!
//! The engine is a pull-driven sampler over a push-driven location feed.
//! Both inputs are intercepted here:
//! - Time (`now()`, `sleep()`) drives the fixed-cadence tick
//! - Location (`next_fix()`) delivers fixes at irregular intervals
//!
//! # Example
//!
//! ```ignore
//! use territory_env::{TrackingContext, LocationSource};
//!
//! async fn session_loop<Ctx: TrackingContext, Loc: LocationSource>(
//!     ctx: &Ctx,
//!     source: &Loc,
//! ) {
//!     loop {
//!         tokio::select! {
//!             Ok(fix) = source.next_fix() => store_latest(fix),
//!             _ = ctx.sleep(Duration::from_secs(2)) => tick(),
//!         }
//!     }
//! }
//! ```

mod context;
mod location;
mod types;
mod error;
mod tokio_impl;

pub use context::TrackingContext;
pub use location::LocationSource;
pub use types::{RawFix, SessionId};
pub use error::EnvError;
pub use tokio_impl::{location_channel, ChannelLocationSource, FixSender, TokioContext};
