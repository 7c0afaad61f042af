//! moviematch - HTTP API over a CSV-backed movie catalog
//!
//! The catalog file is the single source of truth. Every read reloads it and
//! every write is validated before the file is touched.

pub mod catalog;
pub mod cli;
pub mod http_server;
pub mod observability;
