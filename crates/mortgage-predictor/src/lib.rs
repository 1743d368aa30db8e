//! Loan-attribute validation and two-headed delinquency/prepayment prediction.

pub mod config;
pub mod error;
pub mod prediction;
pub mod telemetry;
