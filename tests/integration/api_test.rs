//! HTTP integration tests for the Snipr API
//!
//! Every test drives the composed router with `oneshot` requests over mock
//! vendor adapters.

#![allow(dead_code)]

mod common;
mod platform;
mod snipes;
mod support;
