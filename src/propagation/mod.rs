//! Orbital propagation
//!
//! Mean-element sets are turned into TEME position/velocity with SGP4 via
//! satkit. Propagation is pure CPU work; failures carry the SGP4 status code
//! and the identity of the element set that produced them.
//!
//! # Example
//!
//! ```ignore
//! use spacedb_tracker::propagation::*;
//!
//! let state = propagate(&elements, chrono::Utc::now())?;
//! println!("{} km", state.position.norm());
//! ```

mod propagator;

pub use propagator::*;
