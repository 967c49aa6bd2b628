//! The brute-force engine: batch partitioning, workers, and the controller.
//!
//! Flow: the controller checks the precomputed table, then for each length
//! partitions `[0, k^length)` into contiguous batches, streams them to a
//! fixed pool of worker threads, and picks the lowest-ordinal match once
//! every dispatched batch of that length is accounted for.

mod batch;
mod controller;
mod worker;

pub use batch::{batch_count, partition, DEFAULT_BATCH_SIZE};
pub use controller::{
    search, FoundMatch, MatchOrigin, SearchConfig, SearchOutcome, SearchReport, Searcher,
};
pub use worker::{Evaluate, Hit, UidEvaluator};
