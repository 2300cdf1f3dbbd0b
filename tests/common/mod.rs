//! Shared helpers for integration tests: raw frame I/O and an in-process
//! stub RCON server.
//!
//! Each test binary links its own copy, so not every helper is used by
//! every binary.
#![allow(dead_code)]

pub mod frames;
pub mod stub_server;
