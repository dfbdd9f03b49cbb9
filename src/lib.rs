//! SpaceDB tracker
//!
//! Pulls orbital element sets from a public catalog, propagates each one with
//! SGP4 and appends both the elements and the resulting state vectors to a
//! SQLite time series. Re-running an ingestion never duplicates a row. Stored
//! records are served back through a small paged HTTP API.

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod ingest;
pub mod propagation;
pub mod storage;
