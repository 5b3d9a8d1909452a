//! Edit-tolerant matching
//!
//! A match is a buffer window whose edit distance to the pattern keeps the
//! identity score `100 * (m - edits) / m` at or above the acceptance
//! threshold. Four strategies share one definition of the result: the
//! minimum-edit window, ties broken by leftmost end, with the window start
//! recovered by a common reverse scan. They differ only in how fast they
//! find the end position:
//!
//! - `Dp`: Sellers column dynamic programming, O(n*m), always applicable.
//! - `WuManber`: bit-parallel shift-AND with one state word per edit.
//! - `Myers`: single-word bit-vector scan, bounded edit budget.
//! - `MyersUnlimited`: blocked bit-vector scan, no pattern or budget limit.

use super::{validate_threshold, Hit, MatchError, MatchResult, Matcher};

/// Largest edit budget the bounded Myers scanner accepts. Thresholds that
/// imply more edits must use `MyersUnlimited` and are rejected at
/// construction.
pub const MYERS_EDIT_LIMIT: usize = 15;

/// Word size cap for the single-word bit-parallel strategies.
const WORD_BITS: usize = 64;

/// Strategy selection for approximate matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproxAlgorithm {
    /// Column DP, the always-correct reference.
    Dp,
    /// Bit-parallel scan with `k + 1` state words.
    WuManber,
    /// Single-word Myers bit-vector, edit budget capped at
    /// [`MYERS_EDIT_LIMIT`].
    Myers,
    /// Blocked Myers bit-vector, any pattern length and budget.
    MyersUnlimited,
}

/// Edit-tolerant matcher with an acceptance threshold
#[derive(Debug)]
pub struct ApproxMatcher {
    pattern: Vec<u8>,
    min_score_pct: u8,
    /// Edit budget implied by the threshold: `m * (100 - pct) / 100`.
    max_edits: usize,
    engine: ApproxEngine,
}

#[derive(Debug)]
enum ApproxEngine {
    Dp {
        col: Vec<usize>,
    },
    WuManber {
        masks: Box<[u64; 256]>,
        regs: Vec<u64>,
    },
    Myers {
        peq: Box<[u64; 256]>,
    },
    MyersUnlimited {
        peq: Vec<Box<[u64; 256]>>,
        pv: Vec<u64>,
        mv: Vec<u64>,
    },
}

impl ApproxMatcher {
    pub fn new(query: &str, algorithm: ApproxAlgorithm, min_score_pct: u8) -> MatchResult<Self> {
        if query.is_empty() {
            return Err(MatchError::InvalidQuery(
                "approximate pattern must not be empty".to_string(),
            ));
        }
        validate_threshold(min_score_pct)?;

        let pattern = query.as_bytes().to_vec();
        let m = pattern.len();
        let max_edits = m * (100 - min_score_pct as usize) / 100;

        let engine = match algorithm {
            ApproxAlgorithm::Dp => ApproxEngine::Dp {
                col: Vec::with_capacity(m + 1),
            },
            ApproxAlgorithm::WuManber => {
                if m > WORD_BITS {
                    return Err(MatchError::InvalidParams(format!(
                        "Wu-Manber is limited to patterns of {} bases, got {}",
                        WORD_BITS, m
                    )));
                }
                ApproxEngine::WuManber {
                    masks: build_match_masks(&pattern),
                    regs: vec![0; max_edits + 1],
                }
            }
            ApproxAlgorithm::Myers => {
                if m > WORD_BITS {
                    return Err(MatchError::InvalidParams(format!(
                        "bounded Myers is limited to patterns of {} bases, got {}",
                        WORD_BITS, m
                    )));
                }
                if max_edits > MYERS_EDIT_LIMIT {
                    return Err(MatchError::InvalidParams(format!(
                        "threshold {}% implies an edit budget of {} for a {}-base pattern, \
                         above the bounded Myers limit of {}; raise the threshold or select \
                         MyersUnlimited",
                        min_score_pct, max_edits, m, MYERS_EDIT_LIMIT
                    )));
                }
                ApproxEngine::Myers {
                    peq: build_match_masks(&pattern),
                }
            }
            ApproxAlgorithm::MyersUnlimited => {
                let blocks = m.div_ceil(WORD_BITS);
                let mut peq = Vec::with_capacity(blocks);
                for b in 0..blocks {
                    let chunk = &pattern[b * WORD_BITS..m.min((b + 1) * WORD_BITS)];
                    peq.push(build_match_masks(chunk));
                }
                ApproxEngine::MyersUnlimited {
                    peq,
                    pv: vec![0; blocks],
                    mv: vec![0; blocks],
                }
            }
        };

        Ok(Self {
            pattern,
            min_score_pct,
            max_edits,
            engine,
        })
    }

    /// The end (exclusive) of the minimum-edit window and its edit count,
    /// or None when no window stays within the budget.
    fn best_end(&mut self, bases: &[u8]) -> Option<(usize, usize)> {
        let m = self.pattern.len();
        let k = self.max_edits;

        // The empty window at offset 0 costs m edits (delete the pattern);
        // it is the starting candidate every strategy refines.
        let seed = if m <= k { Some((m, 0)) } else { None };

        let best = match &mut self.engine {
            ApproxEngine::Dp { col } => scan_dp(&self.pattern, bases, k, col),
            ApproxEngine::WuManber { masks, regs } => scan_wu_manber(m, masks, regs, bases, k),
            ApproxEngine::Myers { peq } => scan_myers(m, peq, bases, k),
            ApproxEngine::MyersUnlimited { peq, pv, mv } => {
                scan_myers_blocked(m, peq, pv, mv, bases, k)
            }
        };

        match (seed, best) {
            (Some(seed), Some(found)) => Some(if found.0 < seed.0 { found } else { seed }),
            (seed, found) => found.or(seed),
        }
    }
}

impl Matcher for ApproxMatcher {
    fn first_match(&mut self, bases: &[u8]) -> MatchResult<Option<Hit>> {
        let m = self.pattern.len();
        let (edits, end) = match self.best_end(bases) {
            Some(best) => best,
            None => return Ok(None),
        };
        let start = locate_start(&self.pattern, bases, end, edits);
        let score = ((m - edits) * 100 / m) as u8;
        Ok(Some(Hit::new(start, end, score)))
    }

    fn name(&self) -> &'static str {
        match self.engine {
            ApproxEngine::Dp { .. } => "approx-dp",
            ApproxEngine::WuManber { .. } => "approx-wu-manber",
            ApproxEngine::Myers { .. } => "approx-myers",
            ApproxEngine::MyersUnlimited { .. } => "approx-myers-unlimited",
        }
    }
}

/// Bit mask per byte value: bit `i` set iff `pattern[i] == byte`.
fn build_match_masks(pattern: &[u8]) -> Box<[u64; 256]> {
    let mut masks = Box::new([0u64; 256]);
    for (i, &b) in pattern.iter().enumerate() {
        masks[b as usize] |= 1 << i;
    }
    masks
}

/// Sellers semi-global DP: the first column is free, `col[m]` after
/// consuming `j` bases is the minimum edit distance of any window ending at
/// `j`. Returns the minimum-edit end within budget, leftmost on ties.
fn scan_dp(
    pattern: &[u8],
    bases: &[u8],
    max_edits: usize,
    col: &mut Vec<usize>,
) -> Option<(usize, usize)> {
    let m = pattern.len();
    col.clear();
    col.extend(0..=m);

    let mut best: Option<(usize, usize)> = None;
    for (j, &c) in bases.iter().enumerate() {
        let mut prev_diag = col[0];
        for i in 1..=m {
            let up = col[i - 1];
            let cost = if pattern[i - 1] == c { 0 } else { 1 };
            let value = (col[i] + 1).min(up + 1).min(prev_diag + cost);
            prev_diag = col[i];
            col[i] = value;
        }
        let edits = col[m];
        if edits <= max_edits && best.map_or(true, |(e, _)| edits < e) {
            best = Some((edits, j + 1));
            if edits == 0 {
                break;
            }
        }
    }
    best
}

/// Wu-Manber shift-AND with one register per allowed edit count. Register
/// `d` tracks pattern prefixes matching with at most `d` edits; the minimal
/// `d` whose top bit fires equals the DP edit count for that end.
fn scan_wu_manber(
    m: usize,
    masks: &[u64; 256],
    regs: &mut [u64],
    bases: &[u8],
    max_edits: usize,
) -> Option<(usize, usize)> {
    let k = max_edits.min(regs.len().saturating_sub(1));
    let match_bit = 1u64 << (m - 1);

    for (d, reg) in regs.iter_mut().enumerate() {
        *reg = (1u64 << d.min(63)) - 1;
    }

    let mut best: Option<(usize, usize)> = None;
    for (j, &c) in bases.iter().enumerate() {
        let mask = masks[c as usize];
        let mut prev_old = regs[0];
        regs[0] = ((regs[0] << 1) | 1) & mask;
        for d in 1..=k {
            let old = regs[d];
            regs[d] = ((regs[d] << 1) & mask)
                | prev_old
                | ((prev_old | regs[d - 1]) << 1)
                | 1;
            prev_old = old;
        }

        if let Some(edits) = (0..=k).find(|&d| regs[d] & match_bit != 0) {
            if best.map_or(true, |(e, _)| edits < e) {
                best = Some((edits, j + 1));
                if edits == 0 {
                    break;
                }
            }
        }
    }
    best
}

/// Single-word Myers bit-vector scan. `score` tracks the edit distance of
/// the best window ending at the current base.
fn scan_myers(m: usize, peq: &[u64; 256], bases: &[u8], max_edits: usize) -> Option<(usize, usize)> {
    let high_bit = 1u64 << (m - 1);
    let mut pv = !0u64;
    let mut mv = 0u64;
    let mut score = m;

    let mut best: Option<(usize, usize)> = None;
    for (j, &c) in bases.iter().enumerate() {
        let eq = peq[c as usize];
        let xv = eq | mv;
        let xh = (((eq & pv).wrapping_add(pv)) ^ pv) | eq;
        let mut ph = mv | !(xh | pv);
        let mut mh = pv & xh;

        if ph & high_bit != 0 {
            score += 1;
        } else if mh & high_bit != 0 {
            score -= 1;
        }

        ph <<= 1;
        mh <<= 1;
        pv = mh | !(xv | ph);
        mv = ph & xv;

        if score <= max_edits && best.map_or(true, |(e, _)| score < e) {
            best = Some((score, j + 1));
            if score == 0 {
                break;
            }
        }
    }
    best
}

/// One column step of a 64-row Myers block. `hin` is the horizontal delta
/// entering the block (-1, 0, or +1); the returned delta leaves through the
/// block's last row.
fn advance_block(pv: &mut u64, mv: &mut u64, mut eq: u64, hin: i32) -> i32 {
    let xv = eq | *mv;
    if hin < 0 {
        eq |= 1;
    }
    let xh = (((eq & *pv).wrapping_add(*pv)) ^ *pv) | eq;
    let mut ph = *mv | !(xh | *pv);
    let mut mh = *pv & xh;

    let mut hout = 0;
    if ph & (1 << 63) != 0 {
        hout = 1;
    } else if mh & (1 << 63) != 0 {
        hout = -1;
    }

    ph <<= 1;
    mh <<= 1;
    if hin < 0 {
        mh |= 1;
    } else if hin > 0 {
        ph |= 1;
    }
    *pv = mh | !(xv | ph);
    *mv = ph & xv;
    hout
}

/// Blocked Myers scan for patterns beyond one word (and for unbounded edit
/// budgets). All blocks advance every column; the score is read off the
/// pattern's final row.
fn scan_myers_blocked(
    m: usize,
    peq: &[Box<[u64; 256]>],
    pv: &mut [u64],
    mv: &mut [u64],
    bases: &[u8],
    max_edits: usize,
) -> Option<(usize, usize)> {
    let blocks = peq.len();
    let last_row_bit = 1u64 << ((m - 1) % WORD_BITS);

    pv.fill(!0u64);
    mv.fill(0u64);
    let mut score = m;

    let mut best: Option<(usize, usize)> = None;
    for (j, &c) in bases.iter().enumerate() {
        let mut hin = 0;
        for b in 0..blocks {
            let eq = peq[b][c as usize];
            if b + 1 == blocks {
                // Final block: the score moves with the pattern's last row,
                // not the block's last bit.
                let mut eq = eq;
                let xv = eq | mv[b];
                if hin < 0 {
                    eq |= 1;
                }
                let xh = (((eq & pv[b]).wrapping_add(pv[b])) ^ pv[b]) | eq;
                let mut ph = mv[b] | !(xh | pv[b]);
                let mut mh = pv[b] & xh;

                if ph & last_row_bit != 0 {
                    score += 1;
                } else if mh & last_row_bit != 0 {
                    score -= 1;
                }

                ph <<= 1;
                mh <<= 1;
                if hin < 0 {
                    mh |= 1;
                } else if hin > 0 {
                    ph |= 1;
                }
                pv[b] = mh | !(xv | ph);
                mv[b] = ph & xv;
            } else {
                hin = advance_block(&mut pv[b], &mut mv[b], eq, hin);
            }
        }

        if score <= max_edits && best.map_or(true, |(e, _)| score < e) {
            best = Some((score, j + 1));
            if score == 0 {
                break;
            }
        }
    }
    best
}

/// Recover the start of the window ending at `end` with the known edit
/// count: reverse DP over the trailing bases, taking the tightest window
/// that reproduces the count. Shared by every strategy so that reported
/// positions are identical across them.
fn locate_start(pattern: &[u8], bases: &[u8], end: usize, edits: usize) -> usize {
    let m = pattern.len();
    if edits >= m {
        return end;
    }
    let window = end.min(m + edits);
    let tail = &bases[end - window..end];

    let mut col: Vec<usize> = (0..=m).collect();
    for (j, &c) in tail.iter().rev().enumerate() {
        let mut prev_diag = col[0];
        col[0] = j + 1;
        for i in 1..=m {
            let rev_p = pattern[m - i];
            let cost = if rev_p == c { 0 } else { 1 };
            let value = (col[i] + 1).min(col[i - 1] + 1).min(prev_diag + cost);
            prev_diag = col[i];
            col[i] = value;
        }
        if col[m] == edits {
            return end - (j + 1);
        }
    }
    end
}
