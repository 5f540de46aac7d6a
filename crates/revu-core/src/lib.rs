//! Core revu library (config, logging, review client).

pub mod config;
pub mod logging;
pub mod review;
