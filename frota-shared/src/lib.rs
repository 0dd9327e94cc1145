//! # Frota Shared Library
//!
//! Domain types and flows of the Frota fleet back-office, used by the API
//! server.
//!
//! ## Module Organization
//!
//! - `store`: table store contract, REST and in-memory backends
//! - `tenant`: company scoping of queries and writes
//! - `models`: table models and their operations
//! - `validation`: document, plate and postal code format checks
//! - `address`: address chain resolver and owner-address attachment
//! - `postal`: postal code (CEP) lookup client and form autofill
//! - `saga`: compensating multi-step writes
//! - `storage`: object storage for uploaded documents
//! - `services`: registration, form, listing and upload flows

pub mod address;
pub mod models;
pub mod postal;
pub mod saga;
pub mod services;
pub mod storage;
pub mod store;
pub mod tenant;
pub mod validation;

/// Current version of the Frota shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
