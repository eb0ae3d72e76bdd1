//! Domain types for the Support domain

pub mod entities;
pub mod prompt;
pub mod reply;
