//! pyxpic library crate.
//!
//! Turns captured photos into glyph grids, allocates collision-free record
//! identifiers and persists the grids in a shared collection.

pub mod allocator;
pub mod ascii;
pub mod camera;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod sink;
pub mod store;
pub mod writer;

pub use error::{Error, Result};
