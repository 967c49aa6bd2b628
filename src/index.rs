//! Precomputed UID → phrase table.
//!
//! Built once from a wordlist, or loaded from its persisted line format, and
//! immutable afterwards. A lookup is a single hash-map probe, so the search
//! controller always consults the table before spawning any worker.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use fxhash::FxHashMap;
use rayon::prelude::*;

use crate::digest::{phrase_uid, Uid};
use crate::error::Result;

pub struct PhraseIndex {
    entries: FxHashMap<Uid, String>,
}

impl PhraseIndex {
    pub fn empty() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Build from a wordlist, one phrase per line, blank lines ignored.
    ///
    /// Digests are computed in parallel; inserts then happen sequentially in
    /// file order, so when two phrases collide on a UID the later one wins.
    pub fn from_wordlist<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let phrases: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let digested: Vec<(Uid, &str)> = phrases
            .par_iter()
            .map(|&phrase| (phrase_uid(phrase), phrase))
            .collect();

        let mut entries = FxHashMap::default();
        entries.reserve(digested.len());
        for (uid, phrase) in digested {
            entries.insert(uid, phrase.to_string());
        }

        Ok(Self { entries })
    }

    /// Load the persisted table (`<phrase>:<b0>,...,<b5>` per line).
    ///
    /// A malformed line is skipped and counted, not fatal. A missing file
    /// yields an empty index so the caller degrades to brute force alone;
    /// any other IO failure is an error.
    pub fn from_table<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                eprintln!(
                    "[!] Table '{}' not found, relying on brute force only",
                    path.display()
                );
                return Ok(Self::empty());
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = FxHashMap::default();
        let mut skipped = 0usize;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_record(line) {
                Some((uid, phrase)) => {
                    entries.insert(uid, phrase);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            eprintln!("[!] Skipped {} malformed table lines", skipped);
        }

        Ok(Self { entries })
    }

    /// Write every entry as `<phrase>:<b0>,...,<b5>`, one per line, in
    /// phrase order so repeated runs produce identical files.
    pub fn save_table<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut rows: Vec<(&String, &Uid)> =
            self.entries.iter().map(|(uid, phrase)| (phrase, uid)).collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));

        for (phrase, uid) in rows {
            writeln!(writer, "{}:{}", phrase, uid)?;
        }

        writer.flush()?;
        Ok(())
    }

    #[inline]
    pub fn lookup(&self, uid: &Uid) -> Option<&str> {
        self.entries.get(uid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split on the rightmost `:` so the phrase itself may contain colons; the
/// UID half never does.
fn parse_record(line: &str) -> Option<(Uid, String)> {
    let (phrase, uid_part) = line.rsplit_once(':')?;
    let uid = Uid::parse(uid_part).ok()?;
    Some((uid, phrase.trim().to_string()))
}
