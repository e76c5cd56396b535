//! Query surface and search options.
//!
//! A [`Query`] is what the text parser produces and the matcher
//! pipeline consumes: the original string plus one of four query
//! methods. [`SearchOptions`] is the configuration record the engine
//! and every matcher read; depth options are clamped at construction.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ActivePatternKind, LowType};

/// How a single name segment of a `ByName` query is matched.
#[derive(Debug, Clone)]
pub enum NameMatchMethod {
    /// Exact comparison (case policy applied at match time).
    StringCompare(String),
    /// Glob pattern compiled to an anchored regex.
    Regex(Regex),
    /// Matches any segment.
    Any,
}

/// One expected segment of a `ByName` query, innermost first.
#[derive(Debug, Clone)]
pub struct ByNameItem {
    /// The segment text as written, for display and re-parsing.
    pub expected: String,
    /// Expected generic parameter names at this segment; empty means
    /// "no expectation".
    pub generic_parameters: Vec<String>,
    pub match_method: NameMatchMethod,
}

/// The signature half of a name or signature query.
#[derive(Debug, Clone)]
pub enum SignaturePart {
    /// `_`: no signature expectation.
    Wildcard,
    Signature(LowType),
}

/// The shape half of an active-pattern query.
#[derive(Debug, Clone)]
pub enum ActivePatternSignature {
    /// `... -> a -> b`: any leading parameters, then the given
    /// argument and result.
    AnyParameter(LowType, LowType),
    /// A fully spelled arrow.
    Specified(LowType),
}

#[derive(Debug, Clone)]
pub struct ActivePatternQuery {
    pub kind: ActivePatternKind,
    pub signature: ActivePatternSignature,
}

#[derive(Debug, Clone)]
pub struct ComputationExpressionQuery {
    /// Requested syntactic forms; empty means "any non-empty builder".
    pub syntaxes: Vec<String>,
    pub low_type: LowType,
}

#[derive(Debug, Clone)]
pub enum QueryMethod {
    ByName(Vec<ByNameItem>, SignaturePart),
    BySignature(SignaturePart),
    ByActivePattern(ActivePatternQuery),
    ByComputationExpression(ComputationExpressionQuery),
}

/// A parsed query: the original text plus the abstract method.
#[derive(Debug, Clone)]
pub struct Query {
    pub original_string: String,
    pub method: QueryMethod,
}

/// Two-state switch used by most options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionStatus {
    Enabled,
    Disabled,
}

impl OptionStatus {
    pub fn is_enabled(self) -> bool {
        matches!(self, OptionStatus::Enabled)
    }
}

impl From<bool> for OptionStatus {
    fn from(value: bool) -> Self {
        if value {
            OptionStatus::Enabled
        } else {
            OptionStatus::Disabled
        }
    }
}

/// Which dialect's initialization strategy drives the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Primary,
    Secondary,
}

/// The configuration record for one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Allow a trailing query wildcard to absorb the rest of an arrow.
    pub greedy_matching: OptionStatus,
    /// Add distance when an identity only matches via compiled names.
    pub respect_name_difference: OptionStatus,
    /// Allow curried/tupled reshaping and abbreviation transparency.
    pub ignore_parameter_style: OptionStatus,
    /// Case-insensitive identity comparison.
    pub ignore_case: OptionStatus,
    /// Budget of adjacent swaps tried on the query side.
    pub swap_order_depth: u16,
    /// Budget of trailing optional parameters dropped from a target.
    pub complement_depth: u16,
    /// Fan the catalog scan out over worker threads.
    pub parallel: OptionStatus,
    pub mode: Mode,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            greedy_matching: OptionStatus::Disabled,
            respect_name_difference: OptionStatus::Enabled,
            ignore_parameter_style: OptionStatus::Enabled,
            ignore_case: OptionStatus::Disabled,
            swap_order_depth: 2,
            complement_depth: 2,
            parallel: OptionStatus::Disabled,
            mode: Mode::Primary,
        }
    }
}

impl SearchOptions {
    /// Clamp a possibly out-of-range depth into the supported range.
    /// Negative values become 0 rather than an error.
    pub fn clamp_depth(value: i64) -> u16 {
        value.clamp(0, i64::from(u16::MAX)) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_documented_defaults() {
        let options = SearchOptions::default();
        assert_eq!(options.greedy_matching, OptionStatus::Disabled);
        assert_eq!(options.respect_name_difference, OptionStatus::Enabled);
        assert_eq!(options.ignore_parameter_style, OptionStatus::Enabled);
        assert_eq!(options.ignore_case, OptionStatus::Disabled);
        assert_eq!(options.swap_order_depth, 2);
        assert_eq!(options.complement_depth, 2);
        assert_eq!(options.parallel, OptionStatus::Disabled);
        assert_eq!(options.mode, Mode::Primary);
    }

    #[test]
    fn depths_clamp_instead_of_failing() {
        assert_eq!(SearchOptions::clamp_depth(-3), 0);
        assert_eq!(SearchOptions::clamp_depth(0), 0);
        assert_eq!(SearchOptions::clamp_depth(7), 7);
        assert_eq!(SearchOptions::clamp_depth(1 << 40), u16::MAX);
    }
}
