//! Equation store and per-match context.
//!
//! A match attempt accumulates equalities and inequalities between
//! `LowType`s plus a distance score. The store keeps unordered pairs:
//! orientation is normalized by an importance order (concrete types
//! before variables before wildcards, `Ord` as tiebreak) so `(a, b)`
//! and `(b, a)` hash identically.

use indexmap::{IndexMap, IndexSet};

use crate::models::{LowType, SearchOptions, TypeVariable, VariableSource};

/// The outcome of one matching step: an updated context, or nothing.
/// There is no partial result; steps compose by threading the context
/// and short-circuiting on `Failure`.
#[derive(Debug, Clone)]
#[must_use]
pub enum MatchingResult {
    Matched(Context),
    Failure,
}

impl MatchingResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchingResult::Matched(_))
    }

    pub fn and_then(self, f: impl FnOnce(Context) -> MatchingResult) -> MatchingResult {
        match self {
            MatchingResult::Matched(ctx) => f(ctx),
            MatchingResult::Failure => MatchingResult::Failure,
        }
    }

    pub fn into_context(self) -> Option<Context> {
        match self {
            MatchingResult::Matched(ctx) => Some(ctx),
            MatchingResult::Failure => None,
        }
    }

    pub fn from_option(ctx: Option<Context>) -> MatchingResult {
        match ctx {
            Some(ctx) => MatchingResult::Matched(ctx),
            None => MatchingResult::Failure,
        }
    }
}

type Pair = (LowType, LowType);

/// Rank used when orienting a pair: concrete types first, then
/// variables, then wildcards.
fn importance(t: &LowType) -> u8 {
    match t {
        LowType::Variable(..) => 1,
        LowType::Wildcard(_) => 2,
        _ => 0,
    }
}

fn normalize(a: LowType, b: LowType) -> Pair {
    let ka = (importance(&a), a);
    let kb = (importance(&b), b);
    if ka <= kb {
        (ka.1, kb.1)
    } else {
        (kb.1, ka.1)
    }
}

/// Accumulated equalities and inequalities of one match attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Equations {
    equalities: IndexSet<Pair>,
    inequalities: IndexSet<Pair>,
}

impl Equations {
    pub fn new() -> Self {
        Equations::default()
    }

    pub fn equalities(&self) -> impl Iterator<Item = &Pair> {
        self.equalities.iter()
    }

    pub fn inequalities(&self) -> impl Iterator<Item = &Pair> {
        self.inequalities.iter()
    }

    /// Every recorded equality one of whose sides is `value`.
    pub fn find_equalities(&self, value: &LowType) -> Vec<&Pair> {
        self.equalities
            .iter()
            .filter(|(a, b)| a == value || b == value)
            .collect()
    }

    /// The equivalence class of `value` under the recorded
    /// equalities, including `value` itself.
    pub fn equivalence_class(&self, value: &LowType) -> IndexSet<LowType> {
        let mut class: IndexSet<LowType> = IndexSet::new();
        class.insert(value.clone());
        loop {
            let before = class.len();
            for (a, b) in &self.equalities {
                if class.contains(a) {
                    class.insert(b.clone());
                }
                if class.contains(b) {
                    class.insert(a.clone());
                }
            }
            if class.len() == before {
                break;
            }
        }
        class
    }

    fn connected(&self, a: &LowType, b: &LowType) -> bool {
        a == b || self.equivalence_class(a).contains(b)
    }

    /// Assert `a = b`. Self-equalities are dropped; a pair already
    /// connected is a no-op. Returns `None` when the merged class
    /// would bridge a recorded inequality.
    pub fn try_add_equality(&self, a: &LowType, b: &LowType) -> Option<Equations> {
        if a == b {
            return Some(self.clone());
        }
        let pair = normalize(a.clone(), b.clone());
        if self.equalities.contains(&pair) {
            return Some(self.clone());
        }

        let mut next = self.clone();
        next.equalities.insert(pair);

        // Only the class containing a and b changed; an inequality is
        // contradicted exactly when both of its sides now live there.
        let merged = next.equivalence_class(a);
        for (x, y) in &next.inequalities {
            if merged.contains(x) && merged.contains(y) {
                return None;
            }
        }
        Some(next)
    }

    /// Assert `a != b`. Returns `None` when the pair is already equal
    /// under the store.
    pub fn try_add_inequality(&self, a: &LowType, b: &LowType) -> Option<Equations> {
        if self.connected(a, b) {
            return None;
        }
        let mut next = self.clone();
        next.inequalities.insert(normalize(a.clone(), b.clone()));
        Some(next)
    }
}

/// Per-item accumulator threaded through every matcher: distance,
/// equations, the variable substitutions recorded so far, deferred
/// subtype residuals, and the options of the running search.
#[derive(Debug, Clone)]
pub struct Context {
    pub distance: u32,
    pub equations: Equations,
    pub substitutions: IndexMap<(VariableSource, TypeVariable), LowType>,
    pub subtype_residuals: IndexMap<TypeVariable, Vec<LowType>>,
    pub options: SearchOptions,
}

impl Context {
    pub fn new(options: SearchOptions) -> Self {
        Context::with_equations(options, Equations::new())
    }

    pub fn with_equations(options: SearchOptions, equations: Equations) -> Self {
        Context {
            distance: 0,
            equations,
            substitutions: IndexMap::new(),
            subtype_residuals: IndexMap::new(),
            options,
        }
    }

    /// A copy of this context with `amount` added to the distance.
    pub fn add_distance(&self, amount: u32) -> Context {
        let mut next = self.clone();
        next.distance += amount;
        next
    }

    /// Record `a = b`, also noting a substitution when one side is a
    /// variable and the other a concrete type.
    pub fn try_add_equality(&self, a: &LowType, b: &LowType) -> Option<Context> {
        let equations = self.equations.try_add_equality(a, b)?;
        let mut next = self.clone();
        next.equations = equations;
        match (a, b) {
            (LowType::Variable(source, var), other) if importance(other) == 0 => {
                next.substitutions
                    .insert((*source, var.clone()), other.clone());
            }
            (other, LowType::Variable(source, var)) if importance(other) == 0 => {
                next.substitutions
                    .insert((*source, var.clone()), other.clone());
            }
            _ => {}
        }
        Some(next)
    }

    /// Defer a subtype obligation on an unbound variable.
    pub fn add_subtype_residual(&self, variable: &TypeVariable, base: &LowType) -> Context {
        let mut next = self.clone();
        next.subtype_residuals
            .entry(variable.clone())
            .or_default()
            .push(base.clone());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VariableSource::{Query, Target};

    fn var(name: &str) -> LowType {
        LowType::variable(Query, name)
    }

    fn target_var(name: &str) -> LowType {
        LowType::variable(Target, name)
    }

    #[test]
    fn pairs_hash_identically_in_both_orientations() {
        let eqs = Equations::new()
            .try_add_equality(&var("a"), &LowType::ident("int"))
            .expect("first insert");
        let again = eqs
            .try_add_equality(&LowType::ident("int"), &var("a"))
            .expect("reversed insert is a no-op");
        assert_eq!(eqs, again);
        assert_eq!(again.equalities().count(), 1);
    }

    #[test]
    fn normalization_prefers_concrete_types_over_variables() {
        let eqs = Equations::new()
            .try_add_equality(&var("a"), &LowType::ident("int"))
            .expect("insert");
        let (first, _) = eqs.equalities().next().expect("one pair");
        assert_eq!(first, &LowType::ident("int"));
    }

    #[test]
    fn self_equalities_are_dropped() {
        let eqs = Equations::new()
            .try_add_equality(&var("a"), &var("a"))
            .expect("self equality is fine");
        assert_eq!(eqs.equalities().count(), 0);
    }

    #[test]
    fn find_equalities_matches_either_side() {
        let eqs = Equations::new()
            .try_add_equality(&var("a"), &LowType::ident("int"))
            .and_then(|e| e.try_add_equality(&var("b"), &var("a")))
            .expect("inserts");
        assert_eq!(eqs.find_equalities(&var("a")).len(), 2);
        assert_eq!(eqs.find_equalities(&var("b")).len(), 1);
        assert!(eqs.find_equalities(&var("c")).is_empty());
    }

    #[test]
    fn equality_bridging_an_inequality_is_rejected() {
        let eqs = Equations::new()
            .try_add_inequality(&var("a"), &var("b"))
            .expect("inequality");
        assert!(eqs.try_add_equality(&var("a"), &var("b")).is_none());
    }

    #[test]
    fn transitive_contradiction_is_detected() {
        // a != b, a = t, then b = t would merge a and b.
        let eqs = Equations::new()
            .try_add_inequality(&var("a"), &var("b"))
            .and_then(|e| e.try_add_equality(&var("a"), &target_var("t")))
            .expect("setup");
        assert!(eqs.try_add_equality(&var("b"), &target_var("t")).is_none());
    }

    #[test]
    fn inequality_over_an_existing_equality_is_rejected() {
        let eqs = Equations::new()
            .try_add_equality(&var("a"), &LowType::ident("int"))
            .expect("equality");
        assert!(eqs
            .try_add_inequality(&var("a"), &LowType::ident("int"))
            .is_none());
        assert!(eqs
            .try_add_inequality(&var("a"), &LowType::ident("string"))
            .is_some());
    }

    #[test]
    fn context_records_substitutions_for_concrete_bindings() {
        let ctx = Context::new(SearchOptions::default());
        let bound = ctx
            .try_add_equality(&var("a"), &LowType::ident("int"))
            .expect("binding");
        let key = (Query, TypeVariable::new("a"));
        assert_eq!(bound.substitutions.get(&key), Some(&LowType::ident("int")));

        // Variable-to-variable equalities stay out of the map.
        let related = bound
            .try_add_equality(&var("b"), &target_var("t"))
            .expect("relating");
        assert!(!related
            .substitutions
            .contains_key(&(Query, TypeVariable::new("b"))));
    }

    #[test]
    fn add_distance_is_monotone() {
        let ctx = Context::new(SearchOptions::default());
        assert_eq!(ctx.distance, 0);
        assert_eq!(ctx.add_distance(2).add_distance(1).distance, 3);
    }
}
