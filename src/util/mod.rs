//! Utility modules

pub mod ids;
pub mod rate_limit;
pub mod time;
