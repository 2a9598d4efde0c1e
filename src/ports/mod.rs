//! Port traits for the external collaborators of the backtest engine.

pub mod config_port;
pub mod data_port;
pub mod report_port;
pub mod signal_port;
