//! Core domain types and logic.

pub mod candle;
pub mod price_window;
pub mod indicator;
pub mod scanner;
pub mod outcome;
pub mod stats;
pub mod runner;
pub mod config_validation;
pub mod error;
