//! Utilities related to the file formats produced by upstream tools.

pub mod picard;
