//! spark-audit: Security analysis of Spark/Livy session logs
//!
//! This crate turns the raw log streams of notebook execution sessions
//! (livy session log, driver stdout, driver stderr) into a security report
//! that separates trusted infrastructure traffic from genuinely external
//! network activity, flags package-installation commands, and detects
//! logging-configuration tampering.
//!
//! # Analysis Model
//!
//! Log content is untrusted, noisy free text. The parser maps every line to
//! exactly one tagged [`parser::LogEvent`] variant, with `Unrecognized`
//! absorbing anything it cannot interpret; malformed input is the expected
//! common case, never an error. The only fatal condition is an unusable
//! trust catalog, which aborts the run before any session is processed.
//!
//! # Architecture
//!
//! - **Catalog**: Immutable trusted-domain patterns (exact + `*.` wildcard)
//! - **Parser**: Line-oriented event extraction from each log stream
//! - **Classify**: Pure trusted/external decision per connection reference
//! - **Aggregate**: Per-session merge of the three streams with dedup
//! - **Report**: Deterministic summary + per-session detail
//! - **Pipeline**: Bounded worker pool fanning sessions out in parallel

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod bundle;
pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod parser;
pub mod pipeline;
pub mod report;
