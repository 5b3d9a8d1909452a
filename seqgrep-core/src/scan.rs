//! Parallel batch scanning
//!
//! Matcher instances own mutable scratch and cannot be shared, so a
//! multi-threaded scan builds one instance per worker through the factory.
//! This module wraps that deployment shape: a rayon pool walks a batch of
//! buffers in chunks, each chunk served by its own freshly compiled matcher.

use rayon::prelude::*;

use crate::matcher::{MatchResult, MatcherFactory, MatcherParams};
use crate::types::Hit;

/// Scan a batch of buffers, returning each buffer's first match (or None)
/// in input order.
///
/// The query is compiled once up front to surface configuration errors
/// before any work is scheduled, then once more per worker chunk. Per-call
/// errors (for example an alignment buffer over the resource cap) abort the
/// whole batch.
pub fn scan_buffers(params: &MatcherParams, buffers: &[&[u8]]) -> MatchResult<Vec<Option<Hit>>> {
    // Fail fast on bad configuration; the per-chunk compiles below cannot
    // fail once this one has succeeded.
    MatcherFactory::create(params)?;

    if buffers.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = buffers.len().div_ceil(rayon::current_num_threads().max(1));
    log::debug!(
        "scanning {} buffers in chunks of {}",
        buffers.len(),
        chunk_size
    );

    let chunks: Vec<Vec<Option<Hit>>> = buffers
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut matcher = MatcherFactory::create(params)?;
            chunk
                .iter()
                .map(|bases| matcher.first_match(bases))
                .collect::<MatchResult<Vec<_>>>()
        })
        .collect::<MatchResult<Vec<_>>>()?;

    Ok(chunks.into_iter().flatten().collect())
}

/// Count the buffers in a batch that contain a match, using the cheaper
/// positionless operation (so boolean-mode expression matchers work too).
pub fn count_matches(params: &MatcherParams, buffers: &[&[u8]]) -> MatchResult<usize> {
    MatcherFactory::create(params)?;

    if buffers.is_empty() {
        return Ok(0);
    }

    let chunk_size = buffers.len().div_ceil(rayon::current_num_threads().max(1));
    buffers
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut matcher = MatcherFactory::create(params)?;
            let mut found = 0;
            for bases in chunk {
                if matcher.has_match(bases)? {
                    found += 1;
                }
            }
            Ok(found)
        })
        .try_reduce(|| 0, |a, b| Ok(a + b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::exact::ExactAlgorithm;

    #[test]
    fn test_scan_preserves_input_order() {
        let params = MatcherParams::exact("ACGT", ExactAlgorithm::BoyerMoore);
        let buffers: Vec<Vec<u8>> = (0..100)
            .map(|i| {
                if i % 3 == 0 {
                    format!("TT{}ACGTTT", "G".repeat(i % 7)).into_bytes()
                } else {
                    b"TTTTTTTT".to_vec()
                }
            })
            .collect();
        let refs: Vec<&[u8]> = buffers.iter().map(|b| b.as_slice()).collect();

        let hits = scan_buffers(&params, &refs).unwrap();
        assert_eq!(hits.len(), 100);
        for (i, hit) in hits.iter().enumerate() {
            if i % 3 == 0 {
                let hit = hit.expect("expected a match");
                assert_eq!(hit.start, 2 + i % 7);
            } else {
                assert!(hit.is_none());
            }
        }
    }

    #[test]
    fn test_count_matches_boolean_expression() {
        // Boolean-mode expression matchers cannot report positions, but the
        // counting path never asks for them.
        let params = MatcherParams::expression("ACGT || GGGG", false);
        let buffers: [&[u8]; 4] = [b"TTACGTTT", b"TTTTTTTT", b"AAGGGGAA", b"CCCCCCCC"];
        assert_eq!(count_matches(&params, &buffers).unwrap(), 2);
    }

    #[test]
    fn test_configuration_error_surfaces_before_scanning() {
        let params = MatcherParams::exact("", ExactAlgorithm::Naive);
        let buffers: [&[u8]; 1] = [b"ACGT"];
        assert!(scan_buffers(&params, &buffers).is_err());
        assert!(count_matches(&params, &buffers).is_err());
    }

    #[test]
    fn test_empty_batch() {
        let params = MatcherParams::exact("ACGT", ExactAlgorithm::Naive);
        assert!(scan_buffers(&params, &[]).unwrap().is_empty());
        assert_eq!(count_matches(&params, &[]).unwrap(), 0);
    }
}
