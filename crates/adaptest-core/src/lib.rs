//! adaptest-core — Adaptive test engine, question bank model, and generation pipeline.
//!
//! This crate defines the question bank data model, the bank validator, the
//! adaptive selection and scoring engine, and the pipeline that turns a
//! document into a validated question bank via an LLM provider.

pub mod bank;
pub mod document;
pub mod engine;
pub mod error;
pub mod generation;
pub mod model;
pub mod report;
pub mod traits;
