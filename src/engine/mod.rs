//! Periodic evaluation: alert thresholds, the moving-average strategy, the
//! shared trade executor and the scheduler that drives them.

pub mod alerts;
pub mod executor;
pub mod indicators;
pub mod retry;
pub mod scheduler;
pub mod strategy;
