#![warn(clippy::unwrap_used)]

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod registry;
pub mod report;
pub mod stats;
pub mod update;
