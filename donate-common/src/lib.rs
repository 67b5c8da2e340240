//! # Donate Common Library
//!
//! Shared code for the donation platform services including:
//! - Database models and schema bootstrap
//! - Proof upload event type
//! - Configuration file loading
//! - Content hashing and geofence geometry
//! - SSE stream helpers

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod geo;
pub mod hashing;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use events::ProofUploadEvent;
pub use geo::{ExecutionWindow, GeoPoint, Geofence};
