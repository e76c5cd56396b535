//! The constraint solver: the final matcher pipeline stage.
//!
//! After the structural rules succeed, every constraint attached to
//! the matched API must be satisfiable against the variable bindings
//! the context accumulated. Resolution leans on the precomputed
//! constraint-status flags of the catalog's type definitions;
//! `Dependence` statuses recurse into the bound type arguments with a
//! visited set, so resolution always terminates.

use indexmap::IndexSet;

use crate::models::{
    Api, ApiDictionary, Constraint, ConstraintStatus, DisplayName, FullTypeDefinition, Identity,
    LowType, Query, SearchError, TypeConstraint, TypeDefinitionKind, TypeVariable, VariableSource,
};

use super::equations::{Context, MatchingResult};
use super::lowtype::LowTypeMatcher;
use super::matchers::ApiMatcher;

pub struct ConstraintSolver<'a> {
    dictionaries: &'a [ApiDictionary],
}

/// View a type as an identity application: a bare identity has no
/// arguments, a generic application over an identity has its own.
fn identity_and_args(low_type: &LowType) -> Option<(&Identity, &[LowType])> {
    const NO_ARGS: &[LowType] = &[];
    match low_type {
        LowType::Identity(id) => Some((id.as_ref(), NO_ARGS)),
        LowType::Generic(ctor, args) => match ctor.as_ref() {
            LowType::Identity(id) => Some((id.as_ref(), args.as_slice())),
            _ => None,
        },
        _ => None,
    }
}

/// Which status flag of a definition answers a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StatusFlag {
    SupportNull,
    ReferenceType,
    ValueType,
    DefaultConstructor,
    Equality,
    Comparison,
}

impl<'a> ConstraintSolver<'a> {
    pub fn new(dictionaries: &'a [ApiDictionary]) -> Self {
        ConstraintSolver { dictionaries }
    }

    fn find_definition(&self, name: &DisplayName, arity: usize) -> Option<&FullTypeDefinition> {
        self.dictionaries
            .iter()
            .find_map(|dict| dict.find_type_definition(name, arity))
    }

    /// The concrete type a target variable is bound to, if any.
    fn resolve_binding(&self, variable: &TypeVariable, ctx: &Context) -> Option<LowType> {
        let key = (VariableSource::Target, variable.clone());
        if let Some(bound) = ctx.substitutions.get(&key) {
            return Some(bound.clone());
        }
        let as_low_type = LowType::Variable(VariableSource::Target, variable.clone());
        ctx.equations
            .equivalence_class(&as_low_type)
            .into_iter()
            .find(|member| !matches!(member, LowType::Variable(..) | LowType::Wildcard(_)))
    }

    fn solve(
        &self,
        constraint: &TypeConstraint,
        lowtype: &LowTypeMatcher,
        ctx: &Context,
    ) -> MatchingResult {
        let mut current = ctx.clone();
        for variable in &constraint.variables {
            let bound = self.resolve_binding(variable, &current);
            match self.check(&constraint.constraint, variable, bound.as_ref(), lowtype, &current)
            {
                MatchingResult::Matched(next) => current = next,
                MatchingResult::Failure => return MatchingResult::Failure,
            }
        }
        MatchingResult::Matched(current)
    }

    fn check(
        &self,
        constraint: &Constraint,
        variable: &TypeVariable,
        bound: Option<&LowType>,
        lowtype: &LowTypeMatcher,
        ctx: &Context,
    ) -> MatchingResult {
        match constraint {
            Constraint::Subtype(base) => match bound {
                Some(concrete) => {
                    if self.is_subtype(concrete, base, lowtype, ctx) {
                        MatchingResult::Matched(ctx.clone())
                    } else {
                        MatchingResult::Failure
                    }
                }
                // An unbound variable cannot be refuted; keep the
                // obligation around as a residual.
                None => MatchingResult::Matched(ctx.add_subtype_residual(variable, base)),
            },
            Constraint::Nullable => self.check_status(bound, StatusFlag::SupportNull, ctx),
            Constraint::ReferenceType => self.check_status(bound, StatusFlag::ReferenceType, ctx),
            Constraint::ValueType | Constraint::Unmanaged => {
                self.check_status(bound, StatusFlag::ValueType, ctx)
            }
            Constraint::DefaultConstructor => {
                self.check_status(bound, StatusFlag::DefaultConstructor, ctx)
            }
            Constraint::Equality => self.check_status(bound, StatusFlag::Equality, ctx),
            Constraint::Comparison => self.check_status(bound, StatusFlag::Comparison, ctx),
            Constraint::Enumeration => match bound.and_then(|t| self.definition_of(t)) {
                Some(def) if def.kind != TypeDefinitionKind::Enumeration => {
                    MatchingResult::Failure
                }
                _ => MatchingResult::Matched(ctx.clone()),
            },
            Constraint::Delegate => match bound {
                Some(LowType::Delegate(..)) | None => MatchingResult::Matched(ctx.clone()),
                Some(other) => {
                    if self.definition_of(other).is_some() {
                        MatchingResult::Failure
                    } else {
                        MatchingResult::Matched(ctx.clone())
                    }
                }
            },
            Constraint::HasMember { modifier, member } => {
                let Some(def) = bound.and_then(|t| self.definition_of(t)) else {
                    return MatchingResult::Matched(ctx.clone());
                };
                let candidates: Vec<&crate::models::Member> = match modifier {
                    crate::models::MemberModifier::Instance => def
                        .instance_members
                        .iter()
                        .chain(&def.implicit_instance_members)
                        .collect(),
                    crate::models::MemberModifier::Static => def
                        .static_members
                        .iter()
                        .chain(&def.implicit_static_members)
                        .collect(),
                };
                let found = candidates.iter().any(|candidate| {
                    candidate.name == member.name
                        && candidate.parameters.len() == member.parameters.len()
                });
                if found {
                    MatchingResult::Matched(ctx.clone())
                } else {
                    MatchingResult::Failure
                }
            }
        }
    }

    fn check_status(
        &self,
        bound: Option<&LowType>,
        flag: StatusFlag,
        ctx: &Context,
    ) -> MatchingResult {
        match bound {
            None => MatchingResult::Matched(ctx.clone()),
            Some(concrete) => {
                let mut visited = IndexSet::new();
                if self.eval_status(concrete, flag, &mut visited) {
                    MatchingResult::Matched(ctx.clone())
                } else {
                    MatchingResult::Failure
                }
            }
        }
    }

    /// Evaluate a status flag for a concrete type. Unknown types and
    /// cycles resolve to satisfied: only a definite `NotSatisfy` can
    /// refute a match.
    fn eval_status(&self, low_type: &LowType, flag: StatusFlag, visited: &mut IndexSet<LowType>) -> bool {
        if !visited.insert(low_type.clone()) {
            return true;
        }
        if let LowType::TypeAbbreviation { original, .. } = low_type {
            return self.eval_status(original, flag, visited);
        }
        // Tuples get element-wise equality/comparison; other flags
        // hold for them structurally.
        if let LowType::Tuple { elements, .. } = low_type {
            return match flag {
                StatusFlag::Equality | StatusFlag::Comparison => elements
                    .iter()
                    .all(|element| self.eval_status(element, flag, visited)),
                _ => true,
            };
        }
        let Some((identity, args)) = identity_and_args(low_type) else {
            return true;
        };
        let Some(def) = self.find_definition(identity.name(), identity.generic_parameter_count())
        else {
            return true;
        };
        let status = match flag {
            StatusFlag::SupportNull => &def.support_null,
            StatusFlag::ReferenceType => &def.reference_type,
            StatusFlag::ValueType => &def.value_type,
            StatusFlag::DefaultConstructor => &def.default_constructor,
            StatusFlag::Equality => &def.equality,
            StatusFlag::Comparison => &def.comparison,
        };
        match status {
            ConstraintStatus::Satisfy => true,
            ConstraintStatus::NotSatisfy => false,
            ConstraintStatus::Dependence(variables) => variables.iter().all(|variable| {
                let position = def
                    .generic_parameters
                    .iter()
                    .position(|candidate| candidate == variable);
                match position.and_then(|index| args.get(index)) {
                    Some(argument) => self.eval_status(argument, flag, visited),
                    None => true,
                }
            }),
        }
    }

    fn definition_of(&self, low_type: &LowType) -> Option<&FullTypeDefinition> {
        match low_type {
            LowType::TypeAbbreviation { original, .. } => self.definition_of(original),
            LowType::Identity(id) => {
                self.find_definition(id.name(), id.generic_parameter_count())
            }
            LowType::Generic(ctor, _) => self.definition_of(ctor),
            _ => None,
        }
    }

    /// Whether `low_type` is `base` or reaches it through the
    /// instantiated interface set or base-type chain.
    fn is_subtype(
        &self,
        low_type: &LowType,
        base: &LowType,
        lowtype: &LowTypeMatcher,
        ctx: &Context,
    ) -> bool {
        if lowtype.test(base, low_type, ctx).is_matched() {
            return true;
        }
        if let LowType::TypeAbbreviation { original, .. } = low_type {
            return self.is_subtype(original, base, lowtype, ctx);
        }
        let Some((identity, args)) = identity_and_args(low_type) else {
            return false;
        };
        let Some(def) = self.find_definition(identity.name(), identity.generic_parameter_count())
        else {
            return false;
        };
        let instantiation: Vec<(TypeVariable, LowType)> = def
            .generic_parameters
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        for interface in &def.all_interfaces {
            let instantiated = interface.substitute(&instantiation);
            if lowtype.test(base, &instantiated, ctx).is_matched() {
                return true;
            }
        }
        if let Some(base_type) = &def.base_type {
            let instantiated = base_type.substitute(&instantiation);
            return self.is_subtype(&instantiated, base, lowtype, ctx);
        }
        false
    }
}

impl ApiMatcher for ConstraintSolver<'_> {
    fn name(&self) -> &'static str {
        "constraint"
    }

    fn test(
        &self,
        lowtype: &LowTypeMatcher,
        _query: &Query,
        api: &Api,
        ctx: &Context,
    ) -> Result<MatchingResult, SearchError> {
        let mut current = ctx.clone();
        for constraint in &api.type_constraints {
            match self.solve(constraint, lowtype, &current) {
                MatchingResult::Matched(next) => current = next,
                MatchingResult::Failure => return Ok(MatchingResult::Failure),
            }
        }
        Ok(MatchingResult::Matched(current))
    }
}
