//! `scqc` is a command line tool for collecting the quality control metrics
//! scattered across a single-cell alignment pipeline's output into one table
//! per library. This package is composed of both a library crate, as well as
//! a binary crate.
//!
//! The upstream pipeline runs several third party tools per sample and drops
//! their text reports into a fixed directory layout. The library side of this
//! crate parses each report format into typed metrics, assembles per-category
//! tables, and joins them on the sample identifier; the binary side wraps
//! that in the `extract` and `merge` subcommands.
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]

pub mod errors;
pub mod extract;
pub mod merge;
pub mod metrics;
pub mod table;
pub mod utils;
