//! Exact literal matching
//!
//! Three interchangeable strategies over one definition of "pattern occurs
//! literally in buffer": a naive scan, Boyer-Moore with bad-character and
//! good-suffix shifts, and an Aho-Corasick automaton. All report the same
//! leftmost occurrence; they differ only in scan cost.

use std::collections::{HashMap, VecDeque};

use super::{Hit, MatchError, MatchResult, Matcher};

/// Strategy selection for exact matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactAlgorithm {
    /// Byte-by-byte comparison at every offset. Baseline and reference.
    Naive,
    /// Skip-table scan, sub-linear on average.
    BoyerMoore,
    /// Automaton scan, linear regardless of pattern count.
    AhoCorasick,
}

/// Exact literal matcher
///
/// The pattern is matched byte-exact and case-sensitive as given; there is
/// no implicit reverse-complement search.
pub struct ExactMatcher {
    pattern: Vec<u8>,
    engine: Engine,
}

enum Engine {
    Naive,
    BoyerMoore {
        bad_char: Box<[usize; 256]>,
        good_suffix: Vec<usize>,
    },
    AhoCorasick(Automaton),
}

impl ExactMatcher {
    pub fn new(query: &str, algorithm: ExactAlgorithm) -> MatchResult<Self> {
        if query.is_empty() {
            return Err(MatchError::InvalidQuery(
                "exact pattern must not be empty".to_string(),
            ));
        }
        let pattern = query.as_bytes().to_vec();

        let engine = match algorithm {
            ExactAlgorithm::Naive => Engine::Naive,
            ExactAlgorithm::BoyerMoore => Engine::BoyerMoore {
                bad_char: build_bad_char(&pattern),
                good_suffix: build_good_suffix(&pattern),
            },
            ExactAlgorithm::AhoCorasick => Engine::AhoCorasick(Automaton::build(&[&pattern])),
        };

        Ok(Self { pattern, engine })
    }

    fn find(&self, bases: &[u8]) -> Option<usize> {
        if self.pattern.len() > bases.len() {
            return None;
        }
        match &self.engine {
            Engine::Naive => find_naive(&self.pattern, bases),
            Engine::BoyerMoore {
                bad_char,
                good_suffix,
            } => find_boyer_moore(&self.pattern, bases, bad_char, good_suffix),
            Engine::AhoCorasick(automaton) => automaton.find(bases),
        }
    }
}

impl Matcher for ExactMatcher {
    fn first_match(&mut self, bases: &[u8]) -> MatchResult<Option<Hit>> {
        Ok(self
            .find(bases)
            .map(|start| Hit::new(start, start + self.pattern.len(), 100)))
    }

    fn name(&self) -> &'static str {
        match self.engine {
            Engine::Naive => "exact-naive",
            Engine::BoyerMoore { .. } => "exact-boyer-moore",
            Engine::AhoCorasick(_) => "exact-aho-corasick",
        }
    }
}

/// Naive scan with a first-byte skip: memchr locates candidate offsets, the
/// window compare does the rest.
fn find_naive(pattern: &[u8], bases: &[u8]) -> Option<usize> {
    let m = pattern.len();
    let last_start = bases.len() - m;
    let mut offset = 0;
    while offset <= last_start {
        let idx = memchr::memchr(pattern[0], &bases[offset..=last_start])?;
        let start = offset + idx;
        if &bases[start..start + m] == pattern {
            return Some(start);
        }
        offset = start + 1;
    }
    None
}

/// Bad-character table: shift distance indexed by the mismatching buffer
/// byte.
fn build_bad_char(pattern: &[u8]) -> Box<[usize; 256]> {
    let m = pattern.len();
    let mut table = Box::new([m; 256]);
    for (i, &b) in pattern[..m - 1].iter().enumerate() {
        table[b as usize] = m - 1 - i;
    }
    table
}

/// Lengths of pattern suffixes ending at each position.
fn suffix_lengths(pattern: &[u8]) -> Vec<usize> {
    let m = pattern.len();
    let mut suff = vec![0usize; m];
    suff[m - 1] = m;

    let mut g = m as isize - 1;
    let mut f = m as isize - 1;
    for i in (0..m.saturating_sub(1)).rev() {
        let ii = i as isize;
        if ii > g && suff[(ii + m as isize - 1 - f) as usize] < (ii - g) as usize {
            suff[i] = suff[(ii + m as isize - 1 - f) as usize];
        } else {
            if ii < g {
                g = ii;
            }
            f = ii;
            while g >= 0 && pattern[g as usize] == pattern[(g + m as isize - 1 - f) as usize] {
                g -= 1;
            }
            suff[i] = (f - g) as usize;
        }
    }
    suff
}

/// Good-suffix table: shift distance indexed by the mismatch position in the
/// pattern.
fn build_good_suffix(pattern: &[u8]) -> Vec<usize> {
    let m = pattern.len();
    let suff = suffix_lengths(pattern);
    let mut table = vec![m; m];

    let mut j = 0;
    for i in (0..m).rev() {
        if suff[i] == i + 1 {
            while j < m - 1 - i {
                if table[j] == m {
                    table[j] = m - 1 - i;
                }
                j += 1;
            }
        }
    }
    for i in 0..m.saturating_sub(1) {
        table[m - 1 - suff[i]] = m - 1 - i;
    }
    table
}

fn find_boyer_moore(
    pattern: &[u8],
    bases: &[u8],
    bad_char: &[usize; 256],
    good_suffix: &[usize],
) -> Option<usize> {
    let m = pattern.len();
    let n = bases.len();

    let mut j = 0;
    while j <= n - m {
        let mut i = m as isize - 1;
        while i >= 0 && pattern[i as usize] == bases[j + i as usize] {
            i -= 1;
        }
        if i < 0 {
            return Some(j);
        }
        let i = i as usize;
        let bc_shift = (bad_char[bases[j + i] as usize] + i + 1).saturating_sub(m);
        j += good_suffix[i].max(bc_shift).max(1);
    }
    None
}

/// Aho-Corasick automaton over a set of literal patterns.
///
/// The builder accepts several patterns compiled together; the matcher
/// family only ever hands it one, but the automaton does not care.
struct Automaton {
    nodes: Vec<AcNode>,
}

struct AcNode {
    children: HashMap<u8, u32>,
    fail: u32,
    match_len: Option<usize>,
}

impl AcNode {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            fail: 0,
            match_len: None,
        }
    }
}

impl Automaton {
    fn build(patterns: &[&[u8]]) -> Self {
        let mut nodes = vec![AcNode::new()];

        // Trie construction
        for pattern in patterns {
            let mut state = 0usize;
            for &b in *pattern {
                state = match nodes[state].children.get(&b) {
                    Some(&next) => next as usize,
                    None => {
                        let next = nodes.len() as u32;
                        nodes.push(AcNode::new());
                        nodes[state].children.insert(b, next);
                        next as usize
                    }
                };
            }
            nodes[state].match_len = Some(pattern.len());
        }

        // Failure links, breadth-first
        let mut queue: VecDeque<u32> = nodes[0].children.values().copied().collect();
        while let Some(u) = queue.pop_front() {
            let children: Vec<(u8, u32)> = nodes[u as usize]
                .children
                .iter()
                .map(|(&b, &v)| (b, v))
                .collect();
            for (b, v) in children {
                let mut f = nodes[u as usize].fail;
                let fail = loop {
                    if let Some(&next) = nodes[f as usize].children.get(&b) {
                        break next;
                    }
                    if f == 0 {
                        break 0;
                    }
                    f = nodes[f as usize].fail;
                };
                nodes[v as usize].fail = fail;
                if nodes[v as usize].match_len.is_none() {
                    nodes[v as usize].match_len = nodes[fail as usize].match_len;
                }
                queue.push_back(v);
            }
        }

        Self { nodes }
    }

    /// Leftmost match start, or None. With a single compiled pattern the
    /// first reported end is also the leftmost start.
    fn find(&self, bases: &[u8]) -> Option<usize> {
        let mut state = 0u32;
        for (i, &b) in bases.iter().enumerate() {
            loop {
                if let Some(&next) = self.nodes[state as usize].children.get(&b) {
                    state = next;
                    break;
                }
                if state == 0 {
                    break;
                }
                state = self.nodes[state as usize].fail;
            }
            if let Some(len) = self.nodes[state as usize].match_len {
                return Some(i + 1 - len);
            }
        }
        None
    }
}
