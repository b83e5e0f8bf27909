//! Board reference coordination.
//!
//! Ties the rules engine, the board-state store, and the per-cell visual
//! controllers together behind `BoardRefs`.

pub mod controller;
pub mod facade;
pub mod registry;

pub use controller::{HighlightController, HighlightStyle, PieceController, Relocation};
pub use facade::BoardRefs;
pub use registry::ControllerRegistry;
