use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid UID: {0}")]
    MalformedUid(String),

    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),

    #[error("keyspace too large: {alphabet_size}^{length} does not fit in u64")]
    KeyspaceOverflow { alphabet_size: usize, length: usize },

    #[error("worker fault at length {length}, ordinals {start}..{end}: {reason}")]
    WorkerFault {
        length: usize,
        start: u64,
        end: u64,
        reason: String,
    },

    #[error("search interrupted")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, SearchError>;
