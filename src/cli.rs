//! Command-line arguments and console formatting helpers.

use clap::Parser;

/// Recover bind phrases from 6-byte binding UIDs.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Precomputed UID table
    #[arg(long = "table", value_name = "PATH", default_value = "uid_table.txt")]
    pub table: String,

    /// Wordlist used when rebuilding the table
    #[arg(long = "wordlist", value_name = "PATH", default_value = "bindphrases.txt")]
    pub wordlist: String,

    /// Number of worker threads (default: auto-detect)
    #[arg(short = 't', long = "threads", value_name = "N", default_value_t = 0)]
    pub threads: usize,

    /// Candidates per dispatched batch
    #[arg(long = "batch-size", value_name = "N", default_value_t = 500_000)]
    pub batch_size: u64,

    /// Longest phrase length to brute force
    #[arg(long = "max-len", value_name = "N", default_value_t = 6)]
    pub max_len: usize,

    /// Run one search for this UID (e.g. "9,143,107,205,70,33") and exit
    #[arg(long = "uid", value_name = "UID")]
    pub uid: Option<String>,
}

/// Format number with thousands separator
pub fn format_num(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub fn format_speed(s: f64) -> String {
    if s < 1_000.0 {
        format!("{:.0}/s", s)
    } else if s < 1_000_000.0 {
        format!("{:.1}K/s", s / 1_000.0)
    } else {
        format!("{:.2}M/s", s / 1_000_000.0)
    }
}

pub fn format_time(s: f64) -> String {
    if s < 60.0 {
        format!("{:.1}s", s)
    } else if s < 3600.0 {
        format!("{:.0}m{:.0}s", s / 60.0, s % 60.0)
    } else {
        format!("{:.0}h{:.0}m", s / 3600.0, (s % 3600.0) / 60.0)
    }
}
