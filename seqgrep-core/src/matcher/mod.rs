//! Matching engines for nucleotide buffer scans
//!
//! This module provides the common contract for the four matcher families
//! (exact, approximate, expression, alignment), the construction parameters
//! that select a family and strategy, and the factory that builds one
//! independent matcher instance per caller.

pub use crate::types::Hit;

pub mod align;
pub mod approx;
pub mod exact;
pub mod expression;


/// Construction parameters for a matcher.
///
/// The query is bound at construction and immutable for the life of the
/// instance; the algorithm selection is fixed at construction as well.
#[derive(Debug, Clone)]
pub struct MatcherParams {
    /// Query: a literal pattern, or a boolean expression for the
    /// expression family.
    pub query: String,
    /// Family and strategy selection.
    pub algorithm: AlgorithmParams,
}

impl MatcherParams {
    /// Literal search with the given exact-matching strategy.
    pub fn exact(query: &str, algorithm: exact::ExactAlgorithm) -> Self {
        Self {
            query: query.to_string(),
            algorithm: AlgorithmParams::Exact { algorithm },
        }
    }

    /// Edit-tolerant search accepting windows scoring at least
    /// `min_score_pct` percent identity.
    pub fn approximate(query: &str, algorithm: approx::ApproxAlgorithm, min_score_pct: u8) -> Self {
        Self {
            query: query.to_string(),
            algorithm: AlgorithmParams::Approximate {
                algorithm,
                min_score_pct,
            },
        }
    }

    /// Boolean nucleotide-expression search.
    pub fn expression(query: &str, positional: bool) -> Self {
        Self {
            query: query.to_string(),
            algorithm: AlgorithmParams::Expression {
                positional,
                blob: false,
            },
        }
    }

    /// Local-alignment search accepting alignments scoring at least
    /// `min_score_pct` percent of the optimal score for the query.
    pub fn alignment(query: &str, min_score_pct: u8) -> Self {
        Self {
            query: query.to_string(),
            algorithm: AlgorithmParams::Alignment { min_score_pct },
        }
    }
}

/// Family- and strategy-specific parameters.
#[derive(Debug, Clone)]
pub enum AlgorithmParams {
    /// Literal string search.
    Exact { algorithm: exact::ExactAlgorithm },
    /// Edit-tolerant search with an acceptance threshold.
    Approximate {
        algorithm: approx::ApproxAlgorithm,
        /// Minimum identity percentage (0-100) for a window to count.
        min_score_pct: u8,
    },
    /// Boolean expression over nucleotide sub-patterns, evaluated over the
    /// packed 2-bit encoding.
    Expression {
        /// Track and report match positions. When false, only existence
        /// queries are supported.
        positional: bool,
        /// Treat each buffer as a concatenation of records; offsets are
        /// reported relative to the whole blob.
        blob: bool,
    },
    /// Smith-Waterman local alignment with an acceptance threshold.
    Alignment {
        /// Minimum percentage (0-100) of the query's optimal score.
        min_score_pct: u8,
    },
}

/// Result type for matcher operations
pub type MatchResult<T> = Result<T, MatchError>;

/// Errors raised by matcher construction and match calls
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The query fails alphabet or syntax validation for its family.
    /// Raised at construction.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Threshold out of range, or an algorithm/threshold combination the
    /// selected strategy cannot honor. Raised at construction.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Positional matching requested from a matcher constructed without
    /// position tracking. Raised per call; the instance stays usable.
    #[error("positional matching not available: {0}")]
    PositionsUnavailable(String),

    /// The call would exceed the strategy's scratch allocation limits.
    /// Aborts only this call; the instance stays usable.
    #[error("scan exceeds resource limits: {0}")]
    ResourceLimit(String),
}

/// Common contract for all matcher families.
///
/// A matcher owns mutable scan state (automaton cursors, DP scratch rows,
/// the packed-buffer staging area), so match calls take `&mut self` and an
/// instance must never be shared between threads. Instances are `Send`:
/// build one per worker with [`MatcherFactory::create`] and move it into the
/// worker. Buffers are borrowed for the duration of one call only.
pub trait Matcher: Send {
    /// Find the first match and its half-open `[start, end)` base range.
    ///
    /// "First" is strategy-defined: leftmost start for exact matching,
    /// leftmost end of the best-scoring window for the scored families.
    fn first_match(&mut self, bases: &[u8]) -> MatchResult<Option<Hit>>;

    /// Report whether any match exists, without position tracking.
    ///
    /// Default goes through [`Matcher::first_match`] and discards the
    /// position; strategies with a cheaper positionless path override this.
    fn has_match(&mut self, bases: &[u8]) -> MatchResult<bool> {
        Ok(self.first_match(bases)?.is_some())
    }

    /// Get the name/identifier of this matching strategy
    fn name(&self) -> &'static str;
}

/// Factory for creating matcher instances.
///
/// Each call compiles the query from scratch and returns an independent
/// instance. Because instances carry mutable scan state, the expected
/// deployment is one `create` call per worker thread, never a shared
/// instance.
pub struct MatcherFactory;

impl MatcherFactory {
    /// Create a matcher instance based on parameters.
    ///
    /// All configuration validation happens here: invalid query alphabet,
    /// thresholds outside 0-100, and algorithm/threshold pairings the
    /// strategy cannot honor are rejected before an instance exists.
    pub fn create(params: &MatcherParams) -> MatchResult<Box<dyn Matcher>> {
        let matcher: Box<dyn Matcher> = match &params.algorithm {
            AlgorithmParams::Exact { algorithm } => {
                Box::new(exact::ExactMatcher::new(&params.query, *algorithm)?)
            }
            AlgorithmParams::Approximate {
                algorithm,
                min_score_pct,
            } => Box::new(approx::ApproxMatcher::new(
                &params.query,
                *algorithm,
                *min_score_pct,
            )?),
            AlgorithmParams::Expression { positional, blob } => Box::new(
                expression::ExpressionMatcher::new(&params.query, *positional, *blob)?,
            ),
            AlgorithmParams::Alignment { min_score_pct } => Box::new(
                align::AlignmentMatcher::new(&params.query, *min_score_pct)?,
            ),
        };
        log::debug!("compiled {} matcher for {:?}", matcher.name(), params.query);
        Ok(matcher)
    }

    /// List all available matching strategies
    pub fn available_algorithms() -> Vec<&'static str> {
        vec![
            "exact-naive",
            "exact-boyer-moore",
            "exact-aho-corasick",
            "approx-dp",
            "approx-wu-manber",
            "approx-myers",
            "approx-myers-unlimited",
            "expression",
            "smith-waterman",
        ]
    }
}

/// Validate an acceptance threshold percentage. Shared by the scored
/// families.
pub(crate) fn validate_threshold(min_score_pct: u8) -> MatchResult<()> {
    if min_score_pct > 100 {
        return Err(MatchError::InvalidParams(format!(
            "minimum score percentage must be 0-100, got {}",
            min_score_pct
        )));
    }
    Ok(())
}
