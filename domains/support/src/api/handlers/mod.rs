//! HTTP handlers for the Support domain

pub mod chat;
