//! Attesta Server - certificate issuance, integrity, and verification API
//!
//! This crate provides the REST API for Attesta's credential engine: approved
//! institutions issue immutable certificate records with content fingerprints
//! and rendered PDF artifacts, and anonymous third parties verify records by
//! identifier with every query audited.

pub mod blob;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use config::AppConfig;
pub use engine::Engine;
pub use error::AppError;
pub use routes::create_router;
