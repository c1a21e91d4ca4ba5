//! Telco Churn Predictor Library
//!
//! This library provides the core functionality for the churn prediction
//! service: the customer form model, feature derivation, the model scorer
//! and the HTTP handlers that tie them together.
//!
//! # Modules
//!
//! - `api`: Routes, middleware and the OpenAPI document.
//! - `core`: Core business logic.
//! - `integrations`: The pre-trained model and its artifact.
//! - `obs`: Observability and logging.
//! - `artifact`: Model artifact reading and checksum validation.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `features`: Feature derivation.
//! - `handlers`: HTTP request handlers.
//! - `models`: Form, feature record and prediction types.
//! - `prediction`: Derive-then-score workflow.
//! - `scorer`: Scorer trait and the logistic regression pipeline.
//! - `ui`: Server-rendered form and result view.

pub mod api;
pub mod core;
pub mod integrations;
pub mod obs;

pub mod artifact;
pub mod config;
pub mod errors;
pub mod features;
pub mod handlers;
pub mod models;
pub mod prediction;
pub mod scorer;
pub mod ui;
