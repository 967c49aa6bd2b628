//! unbind: recover bind phrases from their 6-byte binding UIDs.
//!
//! At build time a human-readable bind phrase is wrapped in a fixed compile
//! flag, MD5-hashed, and truncated to 6 bytes; only that UID survives. This
//! crate reverses the scheme: exact lookup against a precomputed
//! UID → phrase table first, then a parallel exhaustive sweep over every
//! printable-ASCII string of length 1..=6 when the table misses.
//!
//! - `digest`: the wrapping template and UID derivation
//! - `index`: the precomputed table (build, load, save, lookup)
//! - `keyspace`: ordinal ↔ candidate-string bijection
//! - `search`: batching, the worker pool, and the search controller
//! - `cli`: argument parsing and console formatting for the binary

pub mod cli;
pub mod digest;
pub mod error;
pub mod index;
pub mod keyspace;
pub mod search;

pub use digest::{phrase_uid, Uid};
pub use error::{Result, SearchError};
pub use index::PhraseIndex;
pub use keyspace::Alphabet;
pub use search::{search, SearchConfig, SearchOutcome, Searcher};
