//! Domain logic for the Snipes domain

pub mod analyzer;
pub mod entities;
pub mod extraction;
pub mod fact_check;
