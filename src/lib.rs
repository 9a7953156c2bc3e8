//! Core library for the cloudability-export command line application.
//!
//! The library exposes high-level orchestration helpers that power the
//! command-line interface as well as the test suites. The modules are
//! structured to keep responsibilities narrow and composable: IO adapters
//! live under [`cloudability::export::io`], the tabular data representation
//! inside [`cloudability::export::model`], the view configuration in
//! [`cloudability::export::registry`], the per-view normalization and
//! per-provider aggregation in [`cloudability::export::normalize`] and
//! [`cloudability::export::aggregate`], and the export orchestration under
//! [`cloudability::export::run`].

pub mod cloudability;

pub use cloudability::export::{
    ReportError, Result, aggregate, error, io, model, normalize, registry, run,
};
