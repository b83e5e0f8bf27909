//! Boardrefs board coordination library.
//!
//! Exposes the grid model, the rules engine adapter, the controller
//! registry and command façade, the text protocol, and the terminal view
//! for use by integration tests and the binary entry point.

pub mod board;
pub mod config;
pub mod protocol;
pub mod refs;
pub mod rules;
pub mod session;
pub mod store;
pub mod view;
