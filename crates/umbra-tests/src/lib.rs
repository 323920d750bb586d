//! # umbra-tests
//!
//! Integration tests for the Umbra networking stack.
//!
//! This crate covers:
//! - Address classification across the supported families
//! - Proxied and direct dialing over real sockets

pub mod harness;

#[cfg(test)]
mod addr_tests;


pub use harness::*;
