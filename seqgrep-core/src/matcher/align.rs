//! Local alignment matching
//!
//! Smith-Waterman over a linear gap model: the full `(m+1) x (n+1)` score
//! and traceback matrices are filled, the maximum cell tracked, and the
//! optimal local alignment recovered by walking back to the zero cell. A
//! buffer matches when the optimal score, as a percentage of the best
//! possible score for the query (`2 * query length`), reaches the
//! acceptance threshold. This is the most expensive family and is meant for
//! queries the exact and edit-tolerant matchers cannot express, such as
//! matches interrupted by long gaps.

use super::{validate_threshold, Hit, MatchError, MatchResult, Matcher};
use crate::encoding::iupac_mask;

const MATCH_SCORE: i32 = 2;
const MISMATCH_SCORE: i32 = -1;
const GAP_SCORE: i32 = -1;

/// Cap on the DP allocation for one call. A buffer that would push the
/// matrix past this fails the call with `ResourceLimit` and leaves the
/// instance reusable.
pub const MAX_DP_CELLS: usize = 64_000_000;

const DIR_NONE: u8 = 0;
const DIR_DIAG: u8 = 1;
const DIR_UP: u8 = 2;
const DIR_LEFT: u8 = 3;

/// Smith-Waterman local alignment matcher
#[derive(Debug)]
pub struct AlignmentMatcher {
    query: Vec<u8>,
    min_score_pct: u8,
    /// DP scratch, reused across calls.
    scores: Vec<i32>,
    dirs: Vec<u8>,
}

impl AlignmentMatcher {
    pub fn new(query: &str, min_score_pct: u8) -> MatchResult<Self> {
        if query.is_empty() {
            return Err(MatchError::InvalidQuery(
                "alignment query must not be empty".to_string(),
            ));
        }
        if let Some(bad) = query.bytes().find(|&b| iupac_mask(b).is_none()) {
            return Err(MatchError::InvalidQuery(format!(
                "'{}' is not a nucleotide code",
                bad as char
            )));
        }
        validate_threshold(min_score_pct)?;

        Ok(Self {
            query: query.as_bytes().to_vec(),
            min_score_pct,
            scores: Vec::new(),
            dirs: Vec::new(),
        })
    }

    /// Fill the DP matrices and return the maximum cell `(score, i, j)`,
    /// preferring the leftmost buffer end on score ties.
    fn fill(&mut self, bases: &[u8]) -> (i32, usize, usize) {
        let m = self.query.len();
        let n = bases.len();
        let width = n + 1;

        self.scores.clear();
        self.scores.resize((m + 1) * width, 0);
        self.dirs.clear();
        self.dirs.resize((m + 1) * width, DIR_NONE);

        let mut best = (0i32, 0usize, 0usize);
        for i in 1..=m {
            let qb = self.query[i - 1];
            let row = i * width;
            let prev_row = row - width;
            for j in 1..=n {
                let diag = self.scores[prev_row + j - 1]
                    + if qb == bases[j - 1] {
                        MATCH_SCORE
                    } else {
                        MISMATCH_SCORE
                    };
                let up = self.scores[prev_row + j] + GAP_SCORE;
                let left = self.scores[row + j - 1] + GAP_SCORE;

                let mut score = 0;
                let mut dir = DIR_NONE;
                if diag > score {
                    score = diag;
                    dir = DIR_DIAG;
                }
                if up > score {
                    score = up;
                    dir = DIR_UP;
                }
                if left > score {
                    score = left;
                    dir = DIR_LEFT;
                }

                self.scores[row + j] = score;
                self.dirs[row + j] = dir;

                let (best_score, _, best_j) = best;
                if score > best_score || (score == best_score && score > 0 && j < best_j) {
                    best = (score, i, j);
                }
            }
        }
        best
    }

    /// Walk the traceback from the maximum cell to the alignment start,
    /// returning the buffer span.
    fn traceback(&self, end_i: usize, end_j: usize, n: usize) -> (usize, usize) {
        let width = n + 1;
        let mut i = end_i;
        let mut j = end_j;
        loop {
            match self.dirs[i * width + j] {
                DIR_DIAG => {
                    i -= 1;
                    j -= 1;
                }
                DIR_UP => i -= 1,
                DIR_LEFT => j -= 1,
                _ => break,
            }
        }
        (j, end_j)
    }
}

impl Matcher for AlignmentMatcher {
    fn first_match(&mut self, bases: &[u8]) -> MatchResult<Option<Hit>> {
        let m = self.query.len();
        let cells = (m + 1) * (bases.len() + 1);
        if cells > MAX_DP_CELLS {
            return Err(MatchError::ResourceLimit(format!(
                "alignment matrix of {} cells exceeds the cap of {}; \
                 use an exact or edit-tolerant matcher for buffers this long",
                cells, MAX_DP_CELLS
            )));
        }

        let (best_score, end_i, end_j) = self.fill(bases);
        let max_score = 2 * m as i32;
        let score_pct = (best_score * 100 / max_score) as u8;
        if score_pct < self.min_score_pct {
            return Ok(None);
        }

        let (start, end) = self.traceback(end_i, end_j, bases.len());
        Ok(Some(Hit::new(start, end, score_pct)))
    }

    fn name(&self) -> &'static str {
        "smith-waterman"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbatim_match_at_full_threshold() {
        let mut matcher = AlignmentMatcher::new("ACGTACGT", 100).unwrap();
        let hit = matcher.first_match(b"TTACGTACGTTT").unwrap().unwrap();
        assert_eq!((hit.start, hit.end, hit.score), (2, 10, 100));
    }

    #[test]
    fn test_gapped_match_spec_scenario() {
        // The query occurs split around a 4-base gap: 16 match points minus
        // 4 gap penalties scores 12 of 16, i.e. 75%.
        let mut matcher = AlignmentMatcher::new("ACGTACGT", 50).unwrap();
        let hit = matcher.first_match(b"TTTTACGTGGGGACGTTTTT").unwrap().unwrap();
        assert_eq!((hit.start, hit.end), (4, 16));
        assert_eq!(hit.score, 75);
        assert!(hit.score >= 50);
    }

    #[test]
    fn test_mismatch_tolerated_below_threshold() {
        let mut matcher = AlignmentMatcher::new("ACGTACGT", 60).unwrap();
        // One substitution: 7 matches - 1 mismatch = 13 of 16 -> 81%.
        let hit = matcher.first_match(b"GGACGTTCGTGG").unwrap().unwrap();
        assert_eq!(hit.score, 81);

        let mut strict = AlignmentMatcher::new("ACGTACGT", 100).unwrap();
        assert!(strict.first_match(b"GGACGTTCGTGG").unwrap().is_none());
    }

    #[test]
    fn test_no_similarity() {
        let mut matcher = AlignmentMatcher::new("AAAA", 50).unwrap();
        assert!(matcher.first_match(b"CCCCCCCC").unwrap().is_none());
    }

    #[test]
    fn test_empty_buffer() {
        let mut matcher = AlignmentMatcher::new("ACGT", 50).unwrap();
        assert!(matcher.first_match(b"").unwrap().is_none());
    }

    #[test]
    fn test_leftmost_occurrence_wins() {
        let mut matcher = AlignmentMatcher::new("ACGT", 100).unwrap();
        let hit = matcher.first_match(b"ACGTTTACGT").unwrap().unwrap();
        assert_eq!((hit.start, hit.end), (0, 4));
    }

    #[test]
    fn test_construction_validation() {
        assert!(matches!(
            AlignmentMatcher::new("", 50).unwrap_err(),
            MatchError::InvalidQuery(_)
        ));
        assert!(matches!(
            AlignmentMatcher::new("ACXGT", 50).unwrap_err(),
            MatchError::InvalidQuery(_)
        ));
        assert!(matches!(
            AlignmentMatcher::new("ACGT", 101).unwrap_err(),
            MatchError::InvalidParams(_)
        ));
        // Ambiguity codes are legal query bases (matched literally).
        assert!(AlignmentMatcher::new("ACGTN", 50).is_ok());
    }

    #[test]
    fn test_resource_limit_leaves_instance_usable() {
        let mut matcher = AlignmentMatcher::new(&"ACGT".repeat(16), 90).unwrap();
        let huge = vec![b'T'; MAX_DP_CELLS / 64];
        let err = matcher.first_match(&huge).unwrap_err();
        assert!(matches!(err, MatchError::ResourceLimit(_)));

        // The failed call must not poison the instance.
        let mut ok_buffer = b"TT".to_vec();
        ok_buffer.extend_from_slice("ACGT".repeat(16).as_bytes());
        let hit = matcher.first_match(&ok_buffer).unwrap().unwrap();
        assert_eq!((hit.start, hit.end, hit.score), (2, 66, 100));
    }
}
