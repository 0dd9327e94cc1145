//! # Frota API Server Library
//!
//! HTTP back-office for the Frota fleet registry: drivers, aggregate
//! drivers, clients, vehicles, documents, odometer readings and checklists,
//! all scoped to the company named by `X-Company-Id`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Tenant resolution
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
