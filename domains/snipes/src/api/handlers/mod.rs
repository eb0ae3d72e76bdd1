//! HTTP handlers for the Snipes domain

pub mod analyze;
