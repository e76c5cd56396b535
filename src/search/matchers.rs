//! Per-aspect API matchers and their composition.
//!
//! An API matcher is a small capability: a name plus a `test`
//! operation. A search assembles an ordered pipeline of them (name,
//! signature, active-pattern, dialect filter, constraint solver) and
//! an API is a hit only when every stage succeeds, threading the
//! context through each step.

use tracing::trace;

use crate::models::{
    ActivePatternSignature, Api, ApiSignature, FunctionSignature, LowType, Member, MemberModifier,
    NameMatchMethod, Parameter, Query, QueryMethod, SearchError, SignaturePart,
};

use super::equations::{Context, MatchingResult};
use super::lowtype::LowTypeMatcher;

/// A pluggable per-aspect test.
///
/// Contract errors (a loading name reaching the matcher) are fatal
/// and surface as `Err`; ordinary mismatches are `Ok(Failure)`.
pub trait ApiMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn test(
        &self,
        lowtype: &LowTypeMatcher,
        query: &Query,
        api: &Api,
        ctx: &Context,
    ) -> Result<MatchingResult, SearchError>;
}

/// An ordered sequence of matchers; the composite succeeds iff every
/// stage succeeds.
pub struct MatcherPipeline<'a> {
    matchers: Vec<Box<dyn ApiMatcher + 'a>>,
}

impl<'a> MatcherPipeline<'a> {
    pub fn new(matchers: Vec<Box<dyn ApiMatcher + 'a>>) -> Self {
        MatcherPipeline { matchers }
    }

    /// The ordered stage names, for diagnostics.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    pub fn test(
        &self,
        lowtype: &LowTypeMatcher,
        query: &Query,
        api: &Api,
        initial: &Context,
    ) -> Result<MatchingResult, SearchError> {
        let mut ctx = initial.clone();
        for matcher in &self.matchers {
            match matcher.test(lowtype, query, api, &ctx)? {
                MatchingResult::Matched(next) => {
                    trace!(matcher = matcher.name(), "stage matched");
                    ctx = next;
                }
                MatchingResult::Failure => return Ok(MatchingResult::Failure),
            }
        }
        Ok(MatchingResult::Matched(ctx))
    }
}

/// The signature a `SignatureMatcher` compares against: the extracted
/// low type plus how many trailing parameters of the outermost arrow
/// are optional (the complementation budget's upper bound).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTarget {
    pub low_type: LowType,
    pub optional_tail: usize,
}

impl SignatureTarget {
    fn plain(low_type: LowType) -> Self {
        SignatureTarget {
            low_type,
            optional_tail: 0,
        }
    }
}

fn group_type(group: &[Parameter]) -> LowType {
    if group.len() == 1 {
        group[0].low_type.clone()
    } else {
        LowType::Tuple {
            elements: group.iter().map(|p| p.low_type.clone()).collect(),
            is_struct: false,
        }
    }
}

fn trailing_optional_groups(groups: &[Vec<Parameter>]) -> usize {
    groups
        .iter()
        .rev()
        .take_while(|g| g.len() == 1 && g[0].is_optional)
        .count()
}

/// The arrow of a module-level function.
pub fn function_arrow(function: &FunctionSignature) -> SignatureTarget {
    let mut elements: Vec<LowType> = function.parameters.iter().map(|g| group_type(g)).collect();
    elements.push(function.return_parameter.low_type.clone());
    let optional_tail = trailing_optional_groups(&function.parameters);
    if elements.len() == 1 {
        SignatureTarget::plain(elements.pop().expect("return type"))
    } else {
        SignatureTarget {
            low_type: LowType::Arrow(elements),
            optional_tail,
        }
    }
}

fn member_arrow(member: &Member, prefix: Option<&LowType>) -> SignatureTarget {
    let mut elements: Vec<LowType> = Vec::new();
    if let Some(t) = prefix {
        elements.push(t.clone());
    }
    elements.extend(member.parameters.iter().map(|g| group_type(g)));
    elements.push(member.return_parameter.low_type.clone());
    let optional_tail = trailing_optional_groups(&member.parameters);
    if elements.len() == 1 {
        SignatureTarget::plain(elements.pop().expect("return type"))
    } else {
        SignatureTarget {
            low_type: LowType::Arrow(elements),
            optional_tail,
        }
    }
}

/// Extract the low type an API is compared through, when the API
/// participates in signature matching at all.
pub fn signature_target(signature: &ApiSignature) -> Option<SignatureTarget> {
    match signature {
        ApiSignature::ModuleValue(t) => Some(SignatureTarget::plain(t.clone())),
        ApiSignature::ModuleFunction(f) | ApiSignature::ActivePattern { function: f, .. } => {
            Some(function_arrow(f))
        }
        ApiSignature::InstanceMember {
            declaring_type,
            member,
        } => Some(member_arrow(member, Some(declaring_type))),
        ApiSignature::StaticMember { member, .. }
        | ApiSignature::Constructor { member, .. }
        | ApiSignature::ExtensionMember(member) => Some(member_arrow(member, None)),
        ApiSignature::TypeExtension(extension) => {
            let prefix = match extension.member_modifier {
                MemberModifier::Instance => Some(&extension.existing_type),
                MemberModifier::Static => None,
            };
            Some(member_arrow(&extension.member, prefix))
        }
        ApiSignature::UnionCase(case) => {
            if case.fields.is_empty() {
                Some(SignatureTarget::plain(case.declaring_type.clone()))
            } else {
                let mut elements: Vec<LowType> =
                    case.fields.iter().map(|f| f.low_type.clone()).collect();
                elements.push(case.declaring_type.clone());
                Some(SignatureTarget::plain(LowType::Arrow(elements)))
            }
        }
        ApiSignature::ModuleDefinition(_)
        | ApiSignature::FullTypeDefinition(_)
        | ApiSignature::TypeAbbreviation(_)
        | ApiSignature::ComputationExpressionBuilder(_) => None,
    }
}

/// Matches the expected name segments against the innermost portion
/// of the API's display name.
pub struct NameMatcher;

impl ApiMatcher for NameMatcher {
    fn name(&self) -> &'static str {
        "name"
    }

    fn test(
        &self,
        _lowtype: &LowTypeMatcher,
        query: &Query,
        api: &Api,
        ctx: &Context,
    ) -> Result<MatchingResult, SearchError> {
        let QueryMethod::ByName(items, _) = &query.method else {
            return Ok(MatchingResult::Matched(ctx.clone()));
        };
        let name = api.name.display_name()?;
        if items.len() > name.len() {
            return Ok(MatchingResult::Failure);
        }
        let ignore_case = ctx.options.ignore_case.is_enabled();
        for (item, name_item) in items.iter().zip(name.iter()) {
            let display = name_item.part.display();
            let matched = match &item.match_method {
                NameMatchMethod::StringCompare(expected) => {
                    if ignore_case {
                        expected.eq_ignore_ascii_case(display)
                    } else {
                        expected == display
                    }
                }
                NameMatchMethod::Regex(regex) => regex.is_match(display),
                NameMatchMethod::Any => true,
            };
            if !matched {
                return Ok(MatchingResult::Failure);
            }
            if !item.generic_parameters.is_empty()
                && item.generic_parameters.len() != name_item.generic_parameters.len()
            {
                return Ok(MatchingResult::Failure);
            }
        }
        Ok(MatchingResult::Matched(ctx.clone()))
    }
}

/// Compares the query signature against the API's extracted low type.
pub struct SignatureMatcher;

impl ApiMatcher for SignatureMatcher {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn test(
        &self,
        lowtype: &LowTypeMatcher,
        query: &Query,
        api: &Api,
        ctx: &Context,
    ) -> Result<MatchingResult, SearchError> {
        let part = match &query.method {
            QueryMethod::ByName(_, part) | QueryMethod::BySignature(part) => part,
            _ => return Ok(MatchingResult::Matched(ctx.clone())),
        };
        let query_type = match part {
            SignaturePart::Wildcard => return Ok(MatchingResult::Matched(ctx.clone())),
            SignaturePart::Signature(t) => t,
        };
        let Some(target) = signature_target(&api.signature) else {
            return Ok(MatchingResult::Failure);
        };
        Ok(lowtype.test_signature(query_type, &target.low_type, target.optional_tail, ctx))
    }
}

/// Matches active-pattern APIs against an active-pattern query.
pub struct ActivePatternMatcher;

impl ApiMatcher for ActivePatternMatcher {
    fn name(&self) -> &'static str {
        "active-pattern"
    }

    fn test(
        &self,
        lowtype: &LowTypeMatcher,
        query: &Query,
        api: &Api,
        ctx: &Context,
    ) -> Result<MatchingResult, SearchError> {
        let QueryMethod::ByActivePattern(ap_query) = &query.method else {
            return Ok(MatchingResult::Matched(ctx.clone()));
        };
        let ApiSignature::ActivePattern { kind, function } = &api.signature else {
            return Ok(MatchingResult::Failure);
        };
        if *kind != ap_query.kind {
            return Ok(MatchingResult::Failure);
        }
        let target = function_arrow(function);
        let result = match &ap_query.signature {
            ActivePatternSignature::Specified(t) => lowtype.test(t, &target.low_type, ctx),
            ActivePatternSignature::AnyParameter(input, output) => {
                let LowType::Arrow(elements) = &target.low_type else {
                    return Ok(MatchingResult::Failure);
                };
                let argument = &elements[elements.len() - 2];
                let result_type = &elements[elements.len() - 1];
                lowtype
                    .test(input, argument, ctx)
                    .and_then(|c| lowtype.test(output, result_type, &c))
            }
        };
        Ok(result)
    }
}

/// Rejects API shapes the secondary dialect has no surface for.
pub struct DialectFilter;

impl ApiMatcher for DialectFilter {
    fn name(&self) -> &'static str {
        "dialect-filter"
    }

    fn test(
        &self,
        _lowtype: &LowTypeMatcher,
        _query: &Query,
        api: &Api,
        ctx: &Context,
    ) -> Result<MatchingResult, SearchError> {
        match api.signature {
            ApiSignature::ActivePattern { .. }
            | ApiSignature::ComputationExpressionBuilder(_) => Ok(MatchingResult::Failure),
            _ => Ok(MatchingResult::Matched(ctx.clone())),
        }
    }
}
