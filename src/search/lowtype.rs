//! The low-type matcher: a unification engine over the type language.
//!
//! `test` is commutative in intent; the pair is normalized by the
//! dispatch itself. The query side is passed on the left, which only
//! matters for the budgeted relaxations (adjacent swaps permute the
//! query side, greedy wildcards absorb on the query side).

use indexmap::IndexSet;
use tracing::trace;

use crate::models::{FullIdentity, Identity, LowType, NamePart, PartialIdentity, SearchOptions};

use super::equations::{Context, MatchingResult};

/// The unification engine, configured once per search.
#[derive(Debug, Clone)]
pub struct LowTypeMatcher {
    options: SearchOptions,
}

impl LowTypeMatcher {
    pub fn new(options: SearchOptions) -> Self {
        LowTypeMatcher { options }
    }

    /// Test whether `left` (query side) and `right` (target side)
    /// unify under the accumulated context.
    pub fn test(&self, left: &LowType, right: &LowType, ctx: &Context) -> MatchingResult {
        trace!(?left, ?right, "lowtype dispatch");
        match (left, right) {
            (LowType::Identity(a), LowType::Identity(b)) => self.test_identity(a, b, ctx),
            (LowType::Wildcard(None), _) | (_, LowType::Wildcard(None)) => {
                MatchingResult::Matched(ctx.clone())
            }
            (w @ LowType::Wildcard(Some(_)), other)
            | (other, w @ LowType::Wildcard(Some(_))) => self.bind(w, other, ctx),
            (v @ LowType::Variable(..), other) | (other, v @ LowType::Variable(..)) => {
                self.bind(v, other, ctx)
            }
            (LowType::Choice(alternatives), other) | (other, LowType::Choice(alternatives)) => {
                self.test_choice(alternatives, other, ctx)
            }
            (LowType::TypeAbbreviation { .. }, _) | (_, LowType::TypeAbbreviation { .. }) => {
                self.test_abbreviation(left, right, ctx)
            }
            (LowType::Arrow(a), LowType::Arrow(b)) => self.test_arrow(a, b, ctx),
            (LowType::Delegate(..), _) | (_, LowType::Delegate(..)) => {
                self.test_delegate(left, right, ctx)
            }
            (
                LowType::Tuple {
                    elements: a,
                    is_struct: sa,
                },
                LowType::Tuple {
                    elements: b,
                    is_struct: sb,
                },
            ) => self.test_tuple(a, *sa, b, *sb, ctx),
            (LowType::Generic(c1, args1), LowType::Generic(c2, args2)) => {
                self.test_generic(c1, args1, c2, args2, ctx)
            }
            (LowType::Generic(ctor, args), LowType::Identity(id))
            | (LowType::Identity(id), LowType::Generic(ctor, args)) => {
                self.test_partial_generic(ctor, args, id, ctx)
            }
            _ => MatchingResult::Failure,
        }
    }

    /// Top-level entry for signature comparisons. On top of `test`,
    /// this applies trailing-optional complementation: up to
    /// `ComplementDepth` trailing parameters may be dropped from the
    /// target arrow, each for +1 distance, provided they are optional
    /// (`optional_tail` is the number of trailing optional parameters
    /// the extraction observed).
    pub fn test_signature(
        &self,
        query: &LowType,
        target: &LowType,
        optional_tail: usize,
        ctx: &Context,
    ) -> MatchingResult {
        if let MatchingResult::Matched(c) = self.test(query, target, ctx) {
            return MatchingResult::Matched(c);
        }

        let budget = (self.options.complement_depth as usize).min(optional_tail);
        let LowType::Arrow(t) = target else {
            return MatchingResult::Failure;
        };
        for dropped in 1..=budget.min(t.len() - 1) {
            let kept = t.len() - 1 - dropped;
            let mut elements: Vec<LowType> = t[..kept].to_vec();
            elements.push(t[t.len() - 1].clone());
            let complemented = if elements.len() == 1 {
                elements.pop().expect("return type")
            } else {
                LowType::Arrow(elements)
            };
            if let MatchingResult::Matched(c) = self.test(query, &complemented, ctx) {
                return MatchingResult::Matched(c.add_distance(dropped as u32));
            }
        }
        MatchingResult::Failure
    }

    /// Bind a variable or tagged wildcard to `other`.
    ///
    /// Every concrete type already in the binder's equivalence class
    /// must remain consistent with `other`; self-equalities are
    /// dropped inside the store.
    fn bind(&self, binder: &LowType, other: &LowType, ctx: &Context) -> MatchingResult {
        if binder == other {
            return MatchingResult::Matched(ctx.clone());
        }
        let mut current = ctx.clone();
        let class = ctx.equations.equivalence_class(binder);
        for member in class.iter().filter(|m| {
            !matches!(m, LowType::Variable(..) | LowType::Wildcard(_))
        }) {
            match self.test(other, member, &current) {
                MatchingResult::Matched(c) => current = c,
                MatchingResult::Failure => return MatchingResult::Failure,
            }
        }
        MatchingResult::from_option(current.try_add_equality(binder, other))
    }

    fn test_choice(
        &self,
        alternatives: &[LowType],
        other: &LowType,
        ctx: &Context,
    ) -> MatchingResult {
        let mut best: Option<Context> = None;
        for alternative in alternatives {
            if let MatchingResult::Matched(c) = self.test(alternative, other, ctx) {
                let better = match &best {
                    None => true,
                    Some(b) => c.distance < b.distance,
                };
                if better {
                    best = Some(c);
                }
            }
        }
        MatchingResult::from_option(best)
    }

    fn test_abbreviation(
        &self,
        left: &LowType,
        right: &LowType,
        ctx: &Context,
    ) -> MatchingResult {
        let transparent = self.options.ignore_parameter_style.is_enabled();
        match (left, right) {
            (
                LowType::TypeAbbreviation {
                    abbreviation: a1,
                    original: o1,
                },
                LowType::TypeAbbreviation {
                    abbreviation: a2,
                    original: o2,
                },
            ) => {
                if !transparent {
                    return self.test(a1, a2, ctx);
                }
                // Symmetric unwraps are free; one-sided unwraps cost 1.
                let candidates: [(&LowType, &LowType, u32); 4] = [
                    (a1.as_ref(), a2.as_ref(), 0),
                    (o1.as_ref(), o2.as_ref(), 0),
                    (a1.as_ref(), o2.as_ref(), 1),
                    (o1.as_ref(), a2.as_ref(), 1),
                ];
                for (x, y, cost) in candidates {
                    if let MatchingResult::Matched(c) = self.test(x, y, ctx) {
                        return MatchingResult::Matched(c.add_distance(cost));
                    }
                }
                MatchingResult::Failure
            }
            (
                LowType::TypeAbbreviation {
                    abbreviation,
                    original,
                },
                other,
            )
            | (
                other,
                LowType::TypeAbbreviation {
                    abbreviation,
                    original,
                },
            ) => {
                if !transparent {
                    return MatchingResult::Failure;
                }
                for unwrapped in [abbreviation.as_ref(), original.as_ref()] {
                    if let MatchingResult::Matched(c) = self.test(unwrapped, other, ctx) {
                        return MatchingResult::Matched(c.add_distance(1));
                    }
                }
                MatchingResult::Failure
            }
            _ => unreachable!("dispatched on an abbreviation pair"),
        }
    }

    fn test_arrow(&self, a: &[LowType], b: &[LowType], ctx: &Context) -> MatchingResult {
        if a.len() == b.len() {
            if let MatchingResult::Matched(c) = self.zip_test(a, b, ctx) {
                return MatchingResult::Matched(c);
            }
            // Adjacent swaps permute the query-side parameter prefix;
            // the return position never moves.
            return self.test_permuted(a, b, ctx, true);
        }

        if self.options.greedy_matching.is_enabled() && a.len() < b.len() {
            if let MatchingResult::Matched(c) = self.test_absorbing_tail(a, b, ctx) {
                return MatchingResult::Matched(c);
            }
        }

        if self.options.ignore_parameter_style.is_enabled() {
            return self.try_uncurry(a, b, ctx);
        }
        MatchingResult::Failure
    }

    /// A trailing query wildcard absorbs the remaining target arrow.
    fn test_absorbing_tail(&self, a: &[LowType], b: &[LowType], ctx: &Context) -> MatchingResult {
        let Some(wildcard @ LowType::Wildcard(tag)) = a.last() else {
            return MatchingResult::Failure;
        };
        let head = &a[..a.len() - 1];
        match self.zip_test(head, &b[..head.len()], ctx) {
            MatchingResult::Matched(c) => {
                let rest = LowType::Arrow(b[head.len()..].to_vec());
                if tag.is_some() {
                    self.bind(wildcard, &rest, &c)
                } else {
                    MatchingResult::Matched(c)
                }
            }
            MatchingResult::Failure => MatchingResult::Failure,
        }
    }

    /// A two-element arrow whose single argument is a tuple matches
    /// the curried form obtained by splitting that tuple.
    fn try_uncurry(&self, a: &[LowType], b: &[LowType], ctx: &Context) -> MatchingResult {
        for (tupled, curried) in [(a, b), (b, a)] {
            if tupled.len() != 2 {
                continue;
            }
            if let LowType::Tuple { elements, .. } = &tupled[0] {
                if elements.len() + 1 == curried.len() {
                    let mut split: Vec<LowType> = elements.clone();
                    split.push(tupled[1].clone());
                    if let MatchingResult::Matched(c) = self.zip_test(&split, curried, ctx) {
                        return MatchingResult::Matched(c.add_distance(1));
                    }
                }
            }
        }
        MatchingResult::Failure
    }

    fn test_tuple(
        &self,
        a: &[LowType],
        a_struct: bool,
        b: &[LowType],
        b_struct: bool,
        ctx: &Context,
    ) -> MatchingResult {
        if a_struct != b_struct || a.len() != b.len() {
            return MatchingResult::Failure;
        }
        if let MatchingResult::Matched(c) = self.zip_test(a, b, ctx) {
            return MatchingResult::Matched(c);
        }
        self.test_permuted(a, b, ctx, false)
    }

    fn test_generic(
        &self,
        c1: &LowType,
        args1: &[LowType],
        c2: &LowType,
        args2: &[LowType],
        ctx: &Context,
    ) -> MatchingResult {
        if args1.len() != args2.len() {
            return MatchingResult::Failure;
        }
        self.test(c1, c2, ctx).and_then(|c| self.zip_test(args1, args2, &c))
    }

    /// `Generic(ctor, args)` matches a bare identity of the same
    /// arity: the missing arguments are fresh, unconstrained
    /// variables, so only the constructors are compared.
    fn test_partial_generic(
        &self,
        ctor: &LowType,
        args: &[LowType],
        id: &Identity,
        ctx: &Context,
    ) -> MatchingResult {
        if id.generic_parameter_count() != args.len() {
            return MatchingResult::Failure;
        }
        self.test(ctor, &LowType::Identity(Box::new(id.clone())), ctx)
    }

    fn test_delegate(&self, left: &LowType, right: &LowType, ctx: &Context) -> MatchingResult {
        match (left, right) {
            (LowType::Delegate(d1, s1), LowType::Delegate(d2, s2)) => self
                .test(d1, d2, ctx)
                .and_then(|c| self.zip_test(s1, s2, &c)),
            (LowType::Arrow(query), LowType::Delegate(_, signature)) => {
                self.test_arrow(query, signature, ctx)
            }
            (LowType::Delegate(_, signature), LowType::Arrow(target)) => {
                self.test_arrow(signature, target, ctx)
            }
            (LowType::Delegate(wrapper, _), other) | (other, LowType::Delegate(wrapper, _)) => {
                self.test(wrapper, other, ctx)
            }
            _ => unreachable!("dispatched on a delegate pair"),
        }
    }

    fn zip_test(&self, a: &[LowType], b: &[LowType], ctx: &Context) -> MatchingResult {
        debug_assert_eq!(a.len(), b.len());
        let mut current = ctx.clone();
        for (x, y) in a.iter().zip(b) {
            match self.test(x, y, &current) {
                MatchingResult::Matched(c) => current = c,
                MatchingResult::Failure => return MatchingResult::Failure,
            }
        }
        MatchingResult::Matched(current)
    }

    /// Breadth-first search over adjacent-swap permutations of the
    /// query side, bounded by `SwapOrderDepth`. The first permutation
    /// that unifies wins and costs its swap count.
    fn test_permuted(
        &self,
        a: &[LowType],
        b: &[LowType],
        ctx: &Context,
        keep_last: bool,
    ) -> MatchingResult {
        let depth = self.options.swap_order_depth as usize;
        let movable = if keep_last { a.len() - 1 } else { a.len() };
        if depth == 0 || movable < 2 {
            return MatchingResult::Failure;
        }

        let identity: Vec<usize> = (0..movable).collect();
        let mut visited: IndexSet<Vec<usize>> = IndexSet::new();
        visited.insert(identity.clone());
        let mut frontier = vec![identity];

        for level in 1..=depth {
            let mut next_frontier = Vec::new();
            for perm in &frontier {
                for i in 0..movable - 1 {
                    let mut candidate = perm.clone();
                    candidate.swap(i, i + 1);
                    if !visited.insert(candidate.clone()) {
                        continue;
                    }
                    let mut permuted: Vec<LowType> =
                        candidate.iter().map(|&idx| a[idx].clone()).collect();
                    if keep_last {
                        permuted.push(a[a.len() - 1].clone());
                    }
                    if let MatchingResult::Matched(c) = self.zip_test(&permuted, b, ctx) {
                        return MatchingResult::Matched(c.add_distance(level as u32));
                    }
                    next_frontier.push(candidate);
                }
            }
            frontier = next_frontier;
        }
        MatchingResult::Failure
    }

    fn test_identity(&self, a: &Identity, b: &Identity, ctx: &Context) -> MatchingResult {
        let penalty = match (a, b) {
            (Identity::Full(x), Identity::Full(y)) => self.full_against_full(x, y),
            (Identity::Full(f), Identity::Partial(p))
            | (Identity::Partial(p), Identity::Full(f)) => self.partial_against_full(p, f),
            (Identity::Partial(p), Identity::Partial(q)) => self.partial_against_partial(p, q),
        };
        match penalty {
            Some(distance) => MatchingResult::Matched(ctx.add_distance(distance)),
            None => MatchingResult::Failure,
        }
    }

    fn full_against_full(&self, a: &FullIdentity, b: &FullIdentity) -> Option<u32> {
        if a.generic_parameter_count != b.generic_parameter_count
            || a.name.len() != b.name.len()
        {
            return None;
        }
        let mut penalty = 0;
        for (x, y) in a.name.iter().zip(&b.name) {
            if x.generic_parameters.len() != y.generic_parameters.len() {
                return None;
            }
            penalty += self.name_part_penalty(&x.part, &y.part)?;
        }
        Some(penalty)
    }

    /// A partial identity matches when its segments equal the
    /// innermost portion of the full name. A segment declaring zero
    /// generic parameters is exempt from the per-segment count check,
    /// and a partial arity of zero is exempt from the overall one.
    fn partial_against_full(&self, p: &PartialIdentity, f: &FullIdentity) -> Option<u32> {
        if p.generic_parameter_count > 0
            && p.generic_parameter_count != f.generic_parameter_count
        {
            return None;
        }
        if p.name.len() > f.name.len() {
            return None;
        }
        let mut penalty = 0;
        for (x, y) in p.name.iter().zip(&f.name) {
            if !x.generic_parameters.is_empty()
                && x.generic_parameters.len() != y.generic_parameters.len()
            {
                return None;
            }
            penalty += self.name_part_penalty(&x.part, &y.part)?;
        }
        Some(penalty)
    }

    fn partial_against_partial(&self, p: &PartialIdentity, q: &PartialIdentity) -> Option<u32> {
        if p.generic_parameter_count > 0
            && q.generic_parameter_count > 0
            && p.generic_parameter_count != q.generic_parameter_count
        {
            return None;
        }
        let mut penalty = 0;
        for (x, y) in p.name.iter().zip(&q.name) {
            if !x.generic_parameters.is_empty()
                && !y.generic_parameters.is_empty()
                && x.generic_parameters.len() != y.generic_parameters.len()
            {
                return None;
            }
            penalty += self.name_part_penalty(&x.part, &y.part)?;
        }
        Some(penalty)
    }

    /// Compare two name parts. Displayed forms matching is free;
    /// matching only through a compiled form costs 1 when
    /// `RespectNameDifference` is enabled.
    fn name_part_penalty(&self, a: &NamePart, b: &NamePart) -> Option<u32> {
        let eq = |x: &str, y: &str| {
            if self.options.ignore_case.is_enabled() {
                x.eq_ignore_ascii_case(y)
            } else {
                x == y
            }
        };
        if eq(a.display(), b.display()) {
            return Some(0);
        }
        let penalty = u32::from(self.options.respect_name_difference.is_enabled());
        if let (Some(ca), Some(cb)) = (a.compiled(), b.compiled()) {
            if eq(ca, cb) {
                return Some(penalty);
            }
        }
        if let Some(ca) = a.compiled() {
            if eq(ca, b.display()) {
                return Some(penalty);
            }
        }
        if let Some(cb) = b.compiled() {
            if eq(a.display(), cb) {
                return Some(penalty);
            }
        }
        None
    }
}
