//! WristLink host library.
//!
//! Drives the canvas application of a wrist-worn display over a
//! single-transaction link: windows and text layers are created, updated and
//! pushed through a transaction-correlated RPC layer, and every intent that
//! meets a busy link or an unallocated resource is parked and resumed later.

#![deny(unused_must_use)]

extern crate alloc;

pub mod adapters;
pub mod app;
pub mod canvas;
pub mod config;
pub mod error;
pub mod rpc;

pub use error::{Error, Result};
