//! Merge rules, one [`Aggregate`](super::Aggregate) impl per record type.
//!
//! Field kinds:
//! - counters and gauges fold into their `aggr_` slot;
//! - scores fold the same way but drop the invalid-score sentinel;
//! - identifiers, names and flags take the latest set value;
//! - role masks are OR-ed;
//! - singleton sub-records merge recursively;
//! - repeated sub-records merge by primary key.

mod container;
mod counters;
mod metrics;
mod network;
mod orchestrator;
mod process;
mod protocols;
