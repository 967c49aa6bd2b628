//! Batch evaluation: the compute seam of the search.
//!
//! The controller never hashes anything itself; it hands ordinal ranges to
//! an [`Evaluate`] implementation. Tests substitute their own implementation
//! to exercise scheduling and fault handling without burning CPU on MD5.

use std::ops::Range;

use crate::digest::{uid_of_wrapped, Uid, WRAP_PREFIX, WRAP_SUFFIX};
use crate::keyspace::Alphabet;

/// A candidate whose wrapped digest matched the target UID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub ordinal: u64,
    pub phrase: String,
}

/// Evaluates one batch of ordinals against a target UID.
///
/// Implementations must scan in ascending ordinal order and return the first
/// hit inside their range; the controller's lowest-ordinal selection depends
/// on it. No shared mutable state: an evaluation is a pure function of its
/// arguments.
pub trait Evaluate: Send + Sync {
    fn evaluate(
        &self,
        length: usize,
        range: Range<u64>,
        target: &Uid,
    ) -> Result<Option<Hit>, String>;
}

/// MD5 evaluator over the wrapped-phrase template.
pub struct UidEvaluator {
    alphabet: Alphabet,
}

impl UidEvaluator {
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet }
    }
}

impl Evaluate for UidEvaluator {
    fn evaluate(
        &self,
        length: usize,
        range: Range<u64>,
        target: &Uid,
    ) -> Result<Option<Hit>, String> {
        let k = self.alphabet.len();

        // digit values of the current candidate, leftmost most significant
        let mut digits = vec![0usize; length];
        let mut rem = range.start;
        for slot in (0..length).rev() {
            digits[slot] = (rem % k as u64) as usize;
            rem /= k as u64;
        }

        // one reusable wrapped buffer; only the phrase bytes change per step
        let phrase_at = WRAP_PREFIX.len();
        let mut wrapped = Vec::with_capacity(phrase_at + length + WRAP_SUFFIX.len());
        wrapped.extend_from_slice(WRAP_PREFIX.as_bytes());
        for &digit in &digits {
            wrapped.push(self.alphabet.byte(digit));
        }
        wrapped.extend_from_slice(WRAP_SUFFIX.as_bytes());

        for ordinal in range {
            if uid_of_wrapped(&wrapped) == *target {
                let phrase =
                    String::from_utf8_lossy(&wrapped[phrase_at..phrase_at + length])
                        .into_owned();
                return Ok(Some(Hit { ordinal, phrase }));
            }

            // odometer step: rightmost digit first, carrying leftwards
            for slot in (0..length).rev() {
                digits[slot] += 1;
                if digits[slot] < k {
                    wrapped[phrase_at + slot] = self.alphabet.byte(digits[slot]);
                    break;
                }
                digits[slot] = 0;
                wrapped[phrase_at + slot] = self.alphabet.byte(0);
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::phrase_uid;

    #[test]
    fn finds_hit_at_its_ordinal() {
        let alphabet = Alphabet::new("ab").unwrap();
        let evaluator = UidEvaluator::new(alphabet.clone());
        let target = phrase_uid("ba");

        // length 2, ordinal order: aa(0) ab(1) ba(2) bb(3)
        let hit = evaluator.evaluate(2, 0..4, &target).unwrap().unwrap();
        assert_eq!(hit.ordinal, 2);
        assert_eq!(hit.phrase, "ba");
        assert_eq!(alphabet.decode(hit.ordinal, 2), hit.phrase);
    }

    #[test]
    fn respects_its_range() {
        let alphabet = Alphabet::new("ab").unwrap();
        let evaluator = UidEvaluator::new(alphabet);
        let target = phrase_uid("ba");

        // "ba" is ordinal 2; a range past it sees nothing
        assert_eq!(evaluator.evaluate(2, 3..4, &target).unwrap(), None);
        // and a range starting mid-space still decodes its start correctly
        let hit = evaluator.evaluate(2, 2..4, &target).unwrap().unwrap();
        assert_eq!(hit.ordinal, 2);
    }

    #[test]
    fn worker_digest_agrees_with_phrase_digest() {
        // the same candidate must produce the same UID through the worker's
        // incremental buffer as through the one-shot phrase path
        let alphabet = Alphabet::printable_ascii();
        let evaluator = UidEvaluator::new(alphabet.clone());

        for ordinal in [0u64, 93, 94, 8_835, 12_345] {
            let phrase = alphabet.decode(ordinal, 3);
            let target = phrase_uid(&phrase);
            let hit = evaluator
                .evaluate(3, ordinal..ordinal + 1, &target)
                .unwrap()
                .unwrap();
            assert_eq!(hit.ordinal, ordinal);
            assert_eq!(hit.phrase, phrase);
        }
    }

    #[test]
    fn clean_range_reports_none() {
        let alphabet = Alphabet::new("ab").unwrap();
        let evaluator = UidEvaluator::new(alphabet);
        let target = Uid::from_bytes([0, 0, 0, 0, 0, 0]);
        assert_eq!(evaluator.evaluate(3, 0..8, &target).unwrap(), None);
    }
}
