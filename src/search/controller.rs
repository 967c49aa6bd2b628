//! Search orchestration: table check first, then per-length parallel sweeps.
//!
//! Batches of one length run concurrently, so a match can surface from any
//! batch at any time. The controller therefore accounts for every dispatched
//! batch before judging a length and then keeps the lowest-ordinal hit, so
//! the reported phrase is always the lexicographically-first preimage of
//! that length, independent of scheduling. Lengths are swept in order and
//! nothing past the first matching length is ever started.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError};
use indicatif::{ProgressBar, ProgressStyle};

use crate::digest::Uid;
use crate::error::{Result, SearchError};
use crate::index::PhraseIndex;
use crate::keyspace::Alphabet;
use crate::search::batch::{partition, DEFAULT_BATCH_SIZE};
use crate::search::worker::{Evaluate, Hit, UidEvaluator};

/// Knobs for a brute-force sweep.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub alphabet: Alphabet,
    /// Longest candidate length to try.
    pub max_len: usize,
    /// Candidates per dispatched batch.
    pub batch_size: u64,
    /// Worker threads (0 = one per available core).
    pub threads: usize,
    /// Draw a per-length progress bar.
    pub progress: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::printable_ascii(),
            max_len: 6,
            batch_size: DEFAULT_BATCH_SIZE,
            threads: 0,
            progress: false,
        }
    }
}

/// Where a recovered phrase came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOrigin {
    Index,
    BruteForce { length: usize, ordinal: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundMatch {
    pub phrase: String,
    pub origin: MatchOrigin,
}

/// Exhaustion is a successful outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(FoundMatch),
    NotFound,
}

/// Final report of one search invocation.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub candidates_checked: u64,
    pub elapsed_secs: f64,
}

impl SearchReport {
    pub fn rate(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.candidates_checked as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }
}

enum BatchOutcome {
    Hit(Hit),
    Clear,
    Skipped,
    Fault(String),
}

pub struct Searcher<E: Evaluate = UidEvaluator> {
    config: SearchConfig,
    evaluator: E,
    stop: Arc<AtomicBool>,
}

impl Searcher<UidEvaluator> {
    pub fn new(config: SearchConfig) -> Self {
        let evaluator = UidEvaluator::new(config.alphabet.clone());
        Self {
            config,
            evaluator,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<E: Evaluate> Searcher<E> {
    /// Swap in a different batch evaluator (tests inject faults this way).
    pub fn with_evaluator(config: SearchConfig, evaluator: E) -> Self {
        Self {
            config,
            evaluator,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an externally owned stop flag (Ctrl-C handler).
    pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Cooperative stop flag; setting it ends the search with `Interrupted`.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Recover the phrase behind `target`: table lookup first, exhaustive
    /// sweep over lengths `1..=max_len` after.
    pub fn run(&self, target: Uid, index: &PhraseIndex) -> Result<SearchReport> {
        let start = Instant::now();

        if let Some(phrase) = index.lookup(&target) {
            return Ok(SearchReport {
                outcome: SearchOutcome::Found(FoundMatch {
                    phrase: phrase.to_string(),
                    origin: MatchOrigin::Index,
                }),
                candidates_checked: 0,
                elapsed_secs: start.elapsed().as_secs_f64(),
            });
        }

        let mut checked_total = 0u64;
        for length in 1..=self.config.max_len {
            if self.stop.load(Ordering::SeqCst) {
                return Err(SearchError::Interrupted);
            }

            let (hit, checked) = self.sweep_length(length, &target)?;
            checked_total += checked;

            if let Some(hit) = hit {
                return Ok(SearchReport {
                    outcome: SearchOutcome::Found(FoundMatch {
                        phrase: hit.phrase,
                        origin: MatchOrigin::BruteForce {
                            length,
                            ordinal: hit.ordinal,
                        },
                    }),
                    candidates_checked: checked_total,
                    elapsed_secs: start.elapsed().as_secs_f64(),
                });
            }
        }

        Ok(SearchReport {
            outcome: SearchOutcome::NotFound,
            candidates_checked: checked_total,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Sweep every candidate of one length. Returns the lowest-ordinal hit
    /// and the number of candidates actually digested.
    fn sweep_length(&self, length: usize, target: &Uid) -> Result<(Option<Hit>, u64)> {
        let total = self.config.alphabet.span(length)?;
        let batch_size = self.config.batch_size.max(1);
        let workers = resolve_threads(self.config.threads);

        let pb = if self.config.progress {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) length {msg}",
                    )
                    .unwrap()
                    .progress_chars("#>-"),
            );
            pb.set_message(length.to_string());
            pb
        } else {
            ProgressBar::hidden()
        };

        let stop = self.stop.as_ref();
        let fatal = AtomicBool::new(false);
        // lowest hit ordinal seen so far; lets whole batches above it be skipped
        let best = AtomicU64::new(u64::MAX);
        let sent = AtomicU64::new(0);
        let feeder_done = AtomicBool::new(false);

        let (batch_tx, batch_rx) = bounded::<Range<u64>>(workers * 2);
        let (report_tx, report_rx) = bounded::<(Range<u64>, BatchOutcome)>(workers * 4);

        let mut best_hit: Option<Hit> = None;
        let mut fault: Option<(u64, u64, String)> = None;
        let mut checked = 0u64;

        thread::scope(|scope| {
            // feeder: streams batches in ascending ordinal order
            {
                let batch_tx = batch_tx;
                let fatal = &fatal;
                let best = &best;
                let sent = &sent;
                let feeder_done = &feeder_done;
                scope.spawn(move || {
                    for range in partition(total, batch_size) {
                        if stop.load(Ordering::SeqCst) || fatal.load(Ordering::SeqCst) {
                            break;
                        }
                        // ranges ascend, so nothing past a known hit can beat it
                        if best.load(Ordering::SeqCst) <= range.start {
                            break;
                        }
                        if batch_tx.send(range).is_err() {
                            break;
                        }
                        sent.fetch_add(1, Ordering::SeqCst);
                    }
                    feeder_done.store(true, Ordering::SeqCst);
                });
            }

            for _ in 0..workers {
                let batch_rx = batch_rx.clone();
                let report_tx = report_tx.clone();
                let fatal = &fatal;
                let best = &best;
                let evaluator = &self.evaluator;
                scope.spawn(move || {
                    while let Ok(range) = batch_rx.recv() {
                        let outcome = if stop.load(Ordering::SeqCst)
                            || fatal.load(Ordering::SeqCst)
                            || best.load(Ordering::SeqCst) <= range.start
                        {
                            BatchOutcome::Skipped
                        } else {
                            match evaluate_with_retry(evaluator, length, range.clone(), target)
                            {
                                Ok(Some(hit)) => {
                                    best.fetch_min(hit.ordinal, Ordering::SeqCst);
                                    BatchOutcome::Hit(hit)
                                }
                                Ok(None) => BatchOutcome::Clear,
                                Err(reason) => {
                                    fatal.store(true, Ordering::SeqCst);
                                    BatchOutcome::Fault(reason)
                                }
                            }
                        };
                        if report_tx.send((range, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(report_tx);
            drop(batch_rx);

            // account for every batch the feeder dispatched before judging
            // the length; this is what makes match selection deterministic
            let mut received = 0u64;
            loop {
                match report_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok((range, outcome)) => {
                        received += 1;
                        let span = range.end - range.start;
                        match outcome {
                            BatchOutcome::Hit(hit) => {
                                checked += hit.ordinal - range.start + 1;
                                if best_hit
                                    .as_ref()
                                    .map_or(true, |b| hit.ordinal < b.ordinal)
                                {
                                    best_hit = Some(hit);
                                }
                            }
                            BatchOutcome::Clear => checked += span,
                            BatchOutcome::Skipped => {}
                            BatchOutcome::Fault(reason) => {
                                fault.get_or_insert((range.start, range.end, reason));
                            }
                        }
                        pb.inc(span);
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
                if feeder_done.load(Ordering::SeqCst)
                    && received == sent.load(Ordering::SeqCst)
                {
                    break;
                }
            }
        });

        pb.finish_and_clear();

        if let Some((start, end, reason)) = fault {
            return Err(SearchError::WorkerFault {
                length,
                start,
                end,
                reason,
            });
        }
        if stop.load(Ordering::SeqCst) {
            return Err(SearchError::Interrupted);
        }

        Ok((best_hit, checked))
    }
}

/// Run one search with a fresh default-evaluator searcher.
pub fn search(target: Uid, index: &PhraseIndex, config: &SearchConfig) -> Result<SearchReport> {
    Searcher::new(config.clone()).run(target, index)
}

fn resolve_threads(threads: usize) -> usize {
    if threads == 0 {
        thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
    } else {
        threads
    }
}

/// A faulted range is retried once; the second failure aborts the search.
fn evaluate_with_retry<E: Evaluate>(
    evaluator: &E,
    length: usize,
    range: Range<u64>,
    target: &Uid,
) -> std::result::Result<Option<Hit>, String> {
    match evaluator.evaluate(length, range.clone(), target) {
        Ok(found) => Ok(found),
        Err(first) => {
            eprintln!(
                "[!] Worker fault on ordinals {}..{}: {}, retrying",
                range.start, range.end, first
            );
            evaluator.evaluate(length, range, target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::phrase_uid;
    use rand::Rng;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted evaluator: planted hits, random per-batch delays, and
    /// injectable faults, so scheduling and failure paths are exercised
    /// without hashing anything.
    struct ScriptedEvaluator {
        hits: Vec<(usize, u64)>,
        max_delay_ms: u64,
        fail_range_start: Option<u64>,
        failures_per_range: u32,
        fail_counts: Mutex<HashMap<(usize, u64), u32>>,
    }

    impl ScriptedEvaluator {
        fn new(hits: Vec<(usize, u64)>) -> Self {
            Self {
                hits,
                max_delay_ms: 0,
                fail_range_start: None,
                failures_per_range: 0,
                fail_counts: Mutex::new(HashMap::new()),
            }
        }

        fn with_delays(mut self, max_delay_ms: u64) -> Self {
            self.max_delay_ms = max_delay_ms;
            self
        }

        fn failing(mut self, range_start: u64, times: u32) -> Self {
            self.fail_range_start = Some(range_start);
            self.failures_per_range = times;
            self
        }
    }

    impl Evaluate for ScriptedEvaluator {
        fn evaluate(
            &self,
            length: usize,
            range: std::ops::Range<u64>,
            _target: &Uid,
        ) -> std::result::Result<Option<Hit>, String> {
            if self.max_delay_ms > 0 {
                let ms = rand::thread_rng().gen_range(0..=self.max_delay_ms);
                std::thread::sleep(Duration::from_millis(ms));
            }

            if self.fail_range_start == Some(range.start) {
                let mut counts = self.fail_counts.lock().unwrap();
                let n = counts.entry((length, range.start)).or_insert(0);
                if *n < self.failures_per_range {
                    *n += 1;
                    return Err("injected fault".to_string());
                }
            }

            Ok(self
                .hits
                .iter()
                .filter(|(l, o)| *l == length && range.contains(o))
                .map(|&(_, o)| o)
                .min()
                .map(|ordinal| Hit {
                    ordinal,
                    phrase: format!("hit{}", ordinal),
                }))
        }
    }

    fn digits_config() -> SearchConfig {
        SearchConfig {
            alphabet: Alphabet::new("0123456789").unwrap(),
            max_len: 3,
            batch_size: 7,
            threads: 4,
            progress: false,
        }
    }

    fn any_uid() -> Uid {
        Uid::from_bytes([1, 2, 3, 4, 5, 6])
    }

    #[test]
    fn lowest_ordinal_wins_under_randomized_scheduling() {
        // three same-length preimages; whichever batch finishes first, the
        // reported match must always be ordinal 13
        for _ in 0..6 {
            let evaluator =
                ScriptedEvaluator::new(vec![(3, 912), (3, 455), (3, 13)]).with_delays(4);
            let searcher = Searcher::with_evaluator(digits_config(), evaluator);
            let report = searcher.run(any_uid(), &PhraseIndex::empty()).unwrap();

            match report.outcome {
                SearchOutcome::Found(m) => {
                    assert_eq!(m.phrase, "hit13");
                    assert_eq!(
                        m.origin,
                        MatchOrigin::BruteForce {
                            length: 3,
                            ordinal: 13
                        }
                    );
                }
                other => panic!("expected a match, got {:?}", other),
            }
        }
    }

    #[test]
    fn shorter_length_wins_over_lower_ordinal() {
        let evaluator = ScriptedEvaluator::new(vec![(2, 90), (3, 1)]);
        let searcher = Searcher::with_evaluator(digits_config(), evaluator);
        let report = searcher.run(any_uid(), &PhraseIndex::empty()).unwrap();

        match report.outcome {
            SearchOutcome::Found(m) => {
                assert_eq!(
                    m.origin,
                    MatchOrigin::BruteForce {
                        length: 2,
                        ordinal: 90
                    }
                );
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn exhaustion_reports_not_found_with_full_coverage() {
        let evaluator = ScriptedEvaluator::new(vec![]);
        let searcher = Searcher::with_evaluator(digits_config(), evaluator);
        let report = searcher.run(any_uid(), &PhraseIndex::empty()).unwrap();

        assert_eq!(report.outcome, SearchOutcome::NotFound);
        // every candidate of lengths 1..=3 over ten digits was digested
        assert_eq!(report.candidates_checked, 10 + 100 + 1000);
    }

    #[test]
    fn single_fault_is_retried_and_recovered() {
        let evaluator = ScriptedEvaluator::new(vec![]).failing(70, 1);
        let searcher = Searcher::with_evaluator(digits_config(), evaluator);
        let report = searcher.run(any_uid(), &PhraseIndex::empty()).unwrap();

        assert_eq!(report.outcome, SearchOutcome::NotFound);
        assert_eq!(report.candidates_checked, 10 + 100 + 1000);
    }

    #[test]
    fn repeated_fault_aborts_instead_of_reporting_not_found() {
        let evaluator = ScriptedEvaluator::new(vec![]).failing(70, u32::MAX);
        let searcher = Searcher::with_evaluator(digits_config(), evaluator);
        let err = searcher.run(any_uid(), &PhraseIndex::empty()).unwrap_err();

        match err {
            SearchError::WorkerFault { start, .. } => assert_eq!(start, 70),
            other => panic!("expected WorkerFault, got {:?}", other),
        }
    }

    #[test]
    fn index_hit_returns_before_any_sweep() {
        let path = std::env::temp_dir()
            .join(format!("unbind_{}_ctl_words.txt", std::process::id()));
        std::fs::write(&path, "abc\n").unwrap();
        let index = PhraseIndex::from_wordlist(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // an evaluator that always faults: if any worker ran, run() would err
        let evaluator = ScriptedEvaluator::new(vec![]).failing(0, u32::MAX);
        let searcher = Searcher::with_evaluator(digits_config(), evaluator);
        let report = searcher.run(phrase_uid("abc"), &index).unwrap();

        match report.outcome {
            SearchOutcome::Found(m) => {
                assert_eq!(m.phrase, "abc");
                assert_eq!(m.origin, MatchOrigin::Index);
            }
            other => panic!("expected an index hit, got {:?}", other),
        }
        assert_eq!(report.candidates_checked, 0);
    }

    #[test]
    fn stop_flag_interrupts() {
        let evaluator = ScriptedEvaluator::new(vec![]);
        let searcher = Searcher::with_evaluator(digits_config(), evaluator);
        searcher.stop_flag().store(true, Ordering::SeqCst);

        let err = searcher.run(any_uid(), &PhraseIndex::empty()).unwrap_err();
        assert!(matches!(err, SearchError::Interrupted));
    }
}
