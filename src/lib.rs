//! Rolls per-interval system metrics snapshots up into bounded
//! reporting-period aggregates.
//!
//! [`aggregator::MessageAggregator`] is the synchronous engine; the
//! [`agent`], [`source`] and [`sink`] modules run it as a service.

pub mod agent;
pub mod aggregator;
pub mod config;
pub mod export;
pub mod schema;
pub mod sink;
pub mod source;
