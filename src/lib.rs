//! Client Identity Resolution API Library
//!
//! Resolves one client identity (Cedula or RNC) against the legal-entity
//! registry, the master registry and the civil registry, and reconciles
//! their responses into one canonical record.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `integrations`: External registry integrations.
//! - `classifier`: Routing class selection.
//! - `config`: Configuration management.
//! - `engine`: Per-request orchestration state machine.
//! - `errors`: Error handling types.
//! - `gateway_client`: Registry gateway abstraction and HTTP implementation.
//! - `handlers`: HTTP request handlers.
//! - `models`: Request, routing and canonical output models.
//! - `normalizer`: Source-to-canonical mapping tables.
//! - `orchestrator`: Request lifecycle.
//! - `registry_models`: Registry wire formats.
//! - `validation`: Inbound request validation.

pub mod api;
pub mod core;
pub mod integrations;

pub mod classifier;
pub mod config;
pub mod engine;
pub mod errors;
pub mod gateway_client;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod registry_models;
pub mod validation;
