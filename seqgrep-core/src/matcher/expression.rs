//! Boolean nucleotide-expression matching
//!
//! Queries are boolean expressions over nucleotide sub-patterns:
//!
//! - literal runs over the IUPAC alphabet (`ACGTU` plus the ambiguity codes
//!   `MRWSYKVHDBN`) and `.` for "any base";
//! - `!` negation, `&&` conjunction, `||` disjunction, parentheses;
//!   `&&` binds tighter than `||`; whitespace is ignored.
//!
//! Before evaluation the buffer is packed to the 2-bit encoding
//! ([`crate::encoding::PackedSeq`]); a literal matches at a position when
//! every query mask intersects the buffer's base mask there. Ambiguity codes
//! in the buffer match any compatible query base (an `N` in the data is
//! compatible with everything); bytes outside the IUPAC alphabet match
//! nothing. The packing pass is the performance-critical step; evaluation
//! itself runs over packed codes.
//!
//! Position tracking is decided at construction. In boolean mode only
//! existence queries are supported and the positional operation fails; this
//! is an intentional restriction, not an omission. In positional mode the
//! expression must be negation-free (a "does not contain" query has no
//! meaningful span).

use crate::encoding::{iupac_mask, mask_for_code, PackedSeq, MASK_ANY};

use super::{Hit, MatchError, MatchResult, Matcher};

/// Boolean-expression matcher over the packed 2-bit buffer encoding
#[derive(Debug)]
pub struct ExpressionMatcher {
    expr: Expr,
    positional: bool,
    blob: bool,
    /// Packed-buffer staging area, retained across calls so blob scans over
    /// many records reuse one allocation.
    staging: PackedSeq,
}

#[derive(Debug)]
enum Expr {
    Literal(Literal),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug)]
struct Literal {
    /// One 4-bit base mask per query position.
    masks: Vec<u8>,
}

impl ExpressionMatcher {
    pub fn new(query: &str, positional: bool, blob: bool) -> MatchResult<Self> {
        let expr = Parser::new(query)
            .parse()
            .map_err(MatchError::InvalidQuery)?;
        if positional && contains_not(&expr) {
            return Err(MatchError::InvalidParams(
                "negated expressions report existence only; construct with positional = false"
                    .to_string(),
            ));
        }
        Ok(Self {
            expr,
            positional,
            blob,
            staging: PackedSeq::new(),
        })
    }
}

impl Matcher for ExpressionMatcher {
    fn first_match(&mut self, bases: &[u8]) -> MatchResult<Option<Hit>> {
        if !self.positional {
            return Err(MatchError::PositionsUnavailable(
                "expression matcher constructed with positional = false; use has_match"
                    .to_string(),
            ));
        }
        self.staging.repack(bases);
        Ok(eval_span(&self.expr, &self.staging).map(|(start, end)| Hit::new(start, end, 100)))
    }

    fn has_match(&mut self, bases: &[u8]) -> MatchResult<bool> {
        self.staging.repack(bases);
        Ok(eval_bool(&self.expr, &self.staging))
    }

    fn name(&self) -> &'static str {
        if self.blob {
            "expression-blob"
        } else {
            "expression"
        }
    }
}

fn contains_not(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(_) => false,
        Expr::Not(_) => true,
        Expr::And(a, b) | Expr::Or(a, b) => contains_not(a) || contains_not(b),
    }
}

fn eval_bool(expr: &Expr, packed: &PackedSeq) -> bool {
    match expr {
        Expr::Literal(lit) => find_literal(lit, packed).is_some(),
        Expr::Not(inner) => !eval_bool(inner, packed),
        Expr::And(a, b) => eval_bool(a, packed) && eval_bool(b, packed),
        Expr::Or(a, b) => eval_bool(a, packed) || eval_bool(b, packed),
    }
}

/// First satisfying span, on a negation-free expression. `&&` reports the
/// union span of its two sub-matches; `||` the leftmost-starting (then
/// shortest) satisfied side.
fn eval_span(expr: &Expr, packed: &PackedSeq) -> Option<(usize, usize)> {
    match expr {
        Expr::Literal(lit) => {
            find_literal(lit, packed).map(|start| (start, start + lit.masks.len()))
        }
        Expr::Not(_) => None,
        Expr::And(a, b) => {
            let (sa, ea) = eval_span(a, packed)?;
            let (sb, eb) = eval_span(b, packed)?;
            Some((sa.min(sb), ea.max(eb)))
        }
        Expr::Or(a, b) => match (eval_span(a, packed), eval_span(b, packed)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        },
    }
}

/// Leftmost occurrence of a literal over the packed buffer.
fn find_literal(lit: &Literal, packed: &PackedSeq) -> Option<usize> {
    let m = lit.masks.len();
    let n = packed.len();
    if m > n {
        return None;
    }
    let exceptions = packed.has_exceptions();
    'outer: for start in 0..=(n - m) {
        for (j, &qmask) in lit.masks.iter().enumerate() {
            let bmask = if exceptions {
                packed.mask_at(start + j)
            } else {
                mask_for_code(packed.code_at(start + j))
            };
            if qmask & bmask == 0 {
                continue 'outer;
            }
        }
        return Some(start);
    }
    None
}

/// Recursive-descent parser for the expression grammar:
///
/// ```text
/// expr    := term ( "||" term )*
/// term    := factor ( "&&" factor )*
/// factor  := "!" factor | "(" expr ")" | literal
/// literal := ( IUPAC-code | "." )+
/// ```
struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(query: &'a str) -> Self {
        Self {
            bytes: query.as_bytes(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Expr, String> {
        let expr = self.parse_or()?;
        self.skip_whitespace();
        if self.pos != self.bytes.len() {
            return Err(format!(
                "unexpected '{}' at offset {}",
                self.bytes[self.pos] as char, self.pos
            ));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_and()?;
        while self.eat_operator(b"||") {
            let rhs = self.parse_and()?;
            expr = Expr::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_factor()?;
        while self.eat_operator(b"&&") {
            let rhs = self.parse_factor()?;
            expr = Expr::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr, String> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'!') => {
                self.pos += 1;
                Ok(Expr::Not(Box::new(self.parse_factor()?)))
            }
            Some(b'(') => {
                self.pos += 1;
                let expr = self.parse_or()?;
                self.skip_whitespace();
                if self.peek() != Some(b')') {
                    return Err(format!("unbalanced parenthesis at offset {}", self.pos));
                }
                self.pos += 1;
                Ok(expr)
            }
            _ => self.parse_literal(),
        }
    }

    fn parse_literal(&mut self) -> Result<Expr, String> {
        let mut masks = Vec::new();
        while let Some(b) = self.peek() {
            let mask = if b == b'.' {
                MASK_ANY
            } else {
                match iupac_mask(b) {
                    Some(mask) => mask,
                    None => break,
                }
            };
            masks.push(mask);
            self.pos += 1;
        }
        if masks.is_empty() {
            match self.peek() {
                Some(b) => Err(format!(
                    "expected a nucleotide code at offset {}, found '{}'",
                    self.pos, b as char
                )),
                None => Err("expression ends where a sub-pattern was expected".to_string()),
            }
        } else {
            Ok(Expr::Literal(Literal { masks }))
        }
    }

    fn eat_operator(&mut self, op: &[u8]) -> bool {
        self.skip_whitespace();
        if self.bytes[self.pos..].starts_with(op) {
            self.pos += op.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_positional_scenario() {
        let mut matcher = ExpressionMatcher::new("A.G", true, false).unwrap();
        let hit = matcher.first_match(b"TTAGGTT").unwrap().unwrap();
        assert_eq!((hit.start, hit.end), (2, 5));
        assert_eq!(hit.score, 100);
    }

    #[test]
    fn test_boolean_mode_rejects_positional_call() {
        let mut matcher = ExpressionMatcher::new("A.G", false, false).unwrap();
        assert!(!matcher.has_match(b"").unwrap());
        let err = matcher.first_match(b"TTAGGTT").unwrap_err();
        assert!(matches!(err, MatchError::PositionsUnavailable(_)));
        // The failed call leaves the instance usable.
        assert!(matcher.has_match(b"TTAGGTT").unwrap());
    }

    #[test]
    fn test_conjunction() {
        let mut matcher = ExpressionMatcher::new("AAC && GGT", true, false).unwrap();
        let hit = matcher.first_match(b"TTAACTTGGTT").unwrap().unwrap();
        // Union span of the two sub-matches.
        assert_eq!((hit.start, hit.end), (2, 10));
        assert!(matcher.first_match(b"TTAACTTT").unwrap().is_none());
    }

    #[test]
    fn test_disjunction_picks_leftmost() {
        let mut matcher = ExpressionMatcher::new("GGT || AAC", true, false).unwrap();
        let hit = matcher.first_match(b"TTAACTTGGTT").unwrap().unwrap();
        assert_eq!((hit.start, hit.end), (2, 5));
    }

    #[test]
    fn test_precedence_and_parentheses() {
        // && binds tighter: AA || (CC && TTTT), so CC alone must not
        // satisfy the right arm.
        let mut matcher = ExpressionMatcher::new("AA || CC && TTTT", false, false).unwrap();
        assert!(!matcher.has_match(b"GGCCGG").unwrap());
        assert!(matcher.has_match(b"GGCCGGTTTT").unwrap());
        assert!(matcher.has_match(b"GGAAGG").unwrap());

        let mut grouped = ExpressionMatcher::new("(AA || CC) && TTTT", false, false).unwrap();
        assert!(!grouped.has_match(b"GGCCGG").unwrap());
        assert!(grouped.has_match(b"CCTTTT").unwrap());
    }

    #[test]
    fn test_negation_boolean_only() {
        let mut matcher = ExpressionMatcher::new("!ACGT", false, false).unwrap();
        assert!(matcher.has_match(b"TTTTTT").unwrap());
        assert!(matcher.has_match(b"").unwrap());
        assert!(!matcher.has_match(b"TTACGTTT").unwrap());

        let err = ExpressionMatcher::new("!ACGT", true, false).unwrap_err();
        assert!(matches!(err, MatchError::InvalidParams(_)));
    }

    #[test]
    fn test_ambiguity_codes_in_query() {
        // R = A or G, Y = C or T.
        let mut matcher = ExpressionMatcher::new("ARY", true, false).unwrap();
        assert_eq!(
            matcher.first_match(b"TTAGC").unwrap().map(|h| h.start),
            Some(2)
        );
        assert_eq!(
            matcher.first_match(b"TTAAT").unwrap().map(|h| h.start),
            Some(2)
        );
        assert!(matcher.first_match(b"TTACC").unwrap().is_none()); // C is not R
    }

    #[test]
    fn test_ambiguity_codes_in_buffer() {
        let mut matcher = ExpressionMatcher::new("ACG", true, false).unwrap();
        // N in the data is compatible with any query base.
        assert!(matcher.has_match(b"TTANG").unwrap());
        // A non-IUPAC byte matches nothing, even against N in the query.
        let mut any = ExpressionMatcher::new("ANG", true, false).unwrap();
        assert!(!any.has_match(b"TTA%G").unwrap());
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "  ", "(ACGT", "ACGT)", "AC && ", "&& AC", "AXZT", "A..G("] {
            let err = ExpressionMatcher::new(bad, false, false).unwrap_err();
            assert!(matches!(err, MatchError::InvalidQuery(_)), "{:?}", bad);
        }
    }

    #[test]
    fn test_blob_mode_reports_blob_offsets() {
        // Two 8-base records packed into one blob; the hit lands in the
        // second record and is reported in blob coordinates.
        let blob = b"TTTTTTTTGGACGTGG";
        let mut matcher = ExpressionMatcher::new("ACGT", true, true).unwrap();
        let hit = matcher.first_match(blob).unwrap().unwrap();
        assert_eq!((hit.start, hit.end), (10, 14));
        assert_eq!(matcher.name(), "expression-blob");
    }

    #[test]
    fn test_staging_reused_across_calls() {
        let mut matcher = ExpressionMatcher::new("ACGT", false, true).unwrap();
        assert!(matcher.has_match(b"GGGGACGTGGGG").unwrap());
        assert!(!matcher.has_match(b"GG").unwrap());
        assert!(matcher.has_match(b"ACGT").unwrap());
    }
}
