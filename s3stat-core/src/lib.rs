#![doc = "s3stat-core: log ingestion pipeline for s3stat."]

//! This crate holds everything between "a bucket, a prefix and a date" and
//! "a parsed goaccess report handed to a handler": selecting log objects,
//! fetching and gunzipping them, concatenating them into one temporary log,
//! writing the goaccess profile, running goaccess and dispatching its output.
//!
//! No cloud SDK is linked here: the object store and the analyzer are
//! collaborators behind the traits in [`contract`], so the CLI crate wires in
//! the AWS client and tests wire in `mockall` mocks.
//!
//! # Navigation
//! - Entrypoint: [`pipeline::run`]
//! - Collaborators: [`contract::ObjectStore`], [`contract::Analyzer`], [`dispatch::ResultHandler`]

pub mod analyze;
pub mod concat;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod profile;
pub mod select;

pub use error::PipelineError;
