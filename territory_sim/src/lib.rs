//! Territory Deterministic Simulation Harness
//!
//! Runs the territory engine against scripted walks so that every claim,
//! rejection and abort can be reproduced from a single 64-bit seed.
//!
//! # Core Principle
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: a virtual clock that only moves on tick sleeps
//! - **Location**: fixes generated up front from a ground-truth route
//! - **Randomness**: GPS noise drawn from seed-derived ChaCha8 streams
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                         │
//! │                                                             │
//! │  ┌──────────┐  fixes   ┌──────────────────┐                 │
//! │  │  Walker  │─────────►│ SimLocationSource│                 │
//! │  │ (truth + │          └────────┬─────────┘                 │
//! │  │  noise)  │                   │ due fixes                 │
//! │  └──────────┘                   ▼                           │
//! │  ┌──────────┐  tick    ┌──────────────────┐                 │
//! │  │SimContext│─────────►│ TerritoryEngine  │──► SimExport    │
//! │  └──────────┘          └──────────────────┘                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use territory_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::SquareWalk);
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod exporter;
mod location;
mod runner;
mod walker;
pub mod scenarios;

pub use context::SimContext;
pub use error::{Result, SimError};
pub use exporter::{SimExport, SimFrame};
pub use location::{Feed, SimLocationSource};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner, SIM_ORIGIN};
pub use walker::{Leg, Route, TruthSample, Walker};
