//! tankwatch-core - Core library for tankwatch
//!
//! Provides models, level analytics, the history store boundary and the
//! bulk aggregator for tank and generator monitoring.

pub mod aggregator;
pub mod analytics;
pub mod config;
pub mod error;
pub mod event;
pub mod models;
pub mod store;

pub use aggregator::{BulkAggregator, BulkAnalytics, LOAD_FAILED};
pub use config::AnalyticsConfig;
pub use error::CoreError;
pub use event::{DataEvent, EventBus};
pub use store::{
    Clock, FixedClock, HistoryStore, InMemoryHistoryStore, MAX_WINDOW_HOURS, StoreHealth, SystemClock,
};
