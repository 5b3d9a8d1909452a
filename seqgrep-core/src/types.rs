use serde::{Deserialize, Serialize};

/// A single reported match inside a scanned buffer.
///
/// Offsets are half-open base coordinates into the buffer that was passed to
/// the match call: `0 <= start <= end <= buffer.len()`. For matchers that
/// score candidates (approximate, alignment), `score` is the integer
/// percentage that admitted the match; exact and expression matches report
/// 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub start: usize,
    pub end: usize,
    pub score: u8,
}

impl Hit {
    pub fn new(start: usize, end: usize, score: u8) -> Self {
        Self { start, end, score }
    }

    /// Length of the matched window in bases.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The matched window as a range usable for slicing the buffer.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_accessors() {
        let hit = Hit::new(2, 6, 75);
        assert_eq!(hit.len(), 4);
        assert!(!hit.is_empty());
        assert_eq!(hit.range(), 2..6);
        assert_eq!(&b"TTACCTTT"[hit.range()], b"ACCT");
    }

    #[test]
    fn test_empty_hit() {
        let hit = Hit::new(0, 0, 100);
        assert_eq!(hit.len(), 0);
        assert!(hit.is_empty());
    }
}
