//! Historical price analytics: moving average, RSI, MACD, descriptive
//! statistics and fluctuation alerts over a daily price series.

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod fluctuation;
pub mod indicator;
pub mod model;
pub mod notifier;
pub mod provider;
pub mod statistics;
