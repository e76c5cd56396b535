//! Per-mode initialization strategies.
//!
//! A strategy knows how to parse query text, rewrite the parsed query
//! against the loaded dictionaries, seed the initial context, and
//! assemble the matcher pipeline for the query at hand. The primary
//! strategy keeps the dialect's curried surface as written; the
//! secondary strategy first normalizes the query into the catalog's
//! shape (built-in aliases, positional argument blocks, the function
//! constructor) and filters out API shapes its dialect cannot name.

use regex::Regex;

use crate::models::{
    ActivePatternSignature, ApiDictionary, Identity, LowType, Mode, NameMatchMethod, OptionStatus,
    PartialIdentity, Query, QueryMethod, SearchError, SearchOptions, SignaturePart,
    VariableSource,
};

use super::constraints::ConstraintSolver;
use super::equations::{Context, Equations};
use super::lowtype::LowTypeMatcher;
use super::matchers::{
    ActivePatternMatcher, ApiMatcher, DialectFilter, MatcherPipeline, NameMatcher,
    SignatureMatcher,
};
use super::query::parse_query;

/// Per-mode assembly of the search machinery.
pub trait InitializationStrategy: Send + Sync {
    fn matchers<'a>(
        &self,
        query: &Query,
        options: &SearchOptions,
        dictionaries: &'a [ApiDictionary],
    ) -> (LowTypeMatcher, MatcherPipeline<'a>);

    fn parse_query(&self, text: &str) -> Result<Query, SearchError>;

    fn initialize_query(
        &self,
        query: Query,
        dictionaries: &[ApiDictionary],
        options: &SearchOptions,
    ) -> Query;

    fn initial_context(
        &self,
        query: &Query,
        dictionaries: &[ApiDictionary],
        options: &SearchOptions,
    ) -> Context;
}

pub struct PrimaryStrategy;
pub struct SecondaryStrategy;

pub fn strategy_for(mode: Mode) -> &'static dyn InitializationStrategy {
    match mode {
        Mode::Primary => &PrimaryStrategy,
        Mode::Secondary => &SecondaryStrategy,
    }
}

/// Built-in aliases of the secondary dialect, mapped to the canonical
/// identities the catalog uses.
const SECONDARY_ALIASES: &[(&str, &str)] = &[
    ("int", "Int32"),
    ("long", "Int64"),
    ("short", "Int16"),
    ("byte", "Byte"),
    ("bool", "Boolean"),
    ("string", "String"),
    ("char", "Char"),
    ("float", "Double"),
    ("double", "Double"),
    ("single", "Single"),
    ("obj", "Object"),
    ("object", "Object"),
    ("unit", "Unit"),
];

/// The name of the built-in function constructor the secondary
/// dialect writes instead of arrows.
const FUNCTION_CONSTRUCTOR: &str = "Fun";

impl InitializationStrategy for PrimaryStrategy {
    fn matchers<'a>(
        &self,
        query: &Query,
        options: &SearchOptions,
        dictionaries: &'a [ApiDictionary],
    ) -> (LowTypeMatcher, MatcherPipeline<'a>) {
        (
            LowTypeMatcher::new(options.clone()),
            MatcherPipeline::new(base_matchers(query, dictionaries)),
        )
    }

    fn parse_query(&self, text: &str) -> Result<Query, SearchError> {
        parse_query(text)
    }

    fn initialize_query(
        &self,
        query: Query,
        dictionaries: &[ApiDictionary],
        options: &SearchOptions,
    ) -> Query {
        initialize(query, dictionaries, options, false)
    }

    fn initial_context(
        &self,
        query: &Query,
        _dictionaries: &[ApiDictionary],
        options: &SearchOptions,
    ) -> Context {
        seeded_context(query, options)
    }
}

impl InitializationStrategy for SecondaryStrategy {
    fn matchers<'a>(
        &self,
        query: &Query,
        options: &SearchOptions,
        dictionaries: &'a [ApiDictionary],
    ) -> (LowTypeMatcher, MatcherPipeline<'a>) {
        let mut matchers: Vec<Box<dyn ApiMatcher + 'a>> = vec![Box::new(DialectFilter)];
        matchers.extend(base_matchers(query, dictionaries));
        (
            LowTypeMatcher::new(options.clone()),
            MatcherPipeline::new(matchers),
        )
    }

    fn parse_query(&self, text: &str) -> Result<Query, SearchError> {
        parse_query(text)
    }

    fn initialize_query(
        &self,
        query: Query,
        dictionaries: &[ApiDictionary],
        options: &SearchOptions,
    ) -> Query {
        initialize(query, dictionaries, options, true)
    }

    fn initial_context(
        &self,
        query: &Query,
        _dictionaries: &[ApiDictionary],
        options: &SearchOptions,
    ) -> Context {
        seeded_context(query, options)
    }
}

fn base_matchers<'a>(
    query: &Query,
    dictionaries: &'a [ApiDictionary],
) -> Vec<Box<dyn ApiMatcher + 'a>> {
    let mut matchers: Vec<Box<dyn ApiMatcher + 'a>> = Vec::new();
    match &query.method {
        QueryMethod::ByName(..) => {
            matchers.push(Box::new(NameMatcher));
            matchers.push(Box::new(SignatureMatcher));
        }
        QueryMethod::BySignature(_) => matchers.push(Box::new(SignatureMatcher)),
        QueryMethod::ByActivePattern(_) => matchers.push(Box::new(ActivePatternMatcher)),
        // The computation-expression driver runs its own two-phase
        // search; no pipeline is assembled for it.
        QueryMethod::ByComputationExpression(_) => {}
    }
    matchers.push(Box::new(ConstraintSolver::new(dictionaries)));
    matchers
}

fn initialize(
    query: Query,
    dictionaries: &[ApiDictionary],
    options: &SearchOptions,
    secondary: bool,
) -> Query {
    let method = map_query_types(query.method, &|root| {
        let root = if secondary {
            split_argument_block(rewrite_secondary(root))
        } else {
            root
        };
        bind_identities(root, dictionaries)
    });
    let method = recompile_name_patterns(method, options);
    Query {
        original_string: query.original_string,
        method,
    }
}

/// Apply `f` to every root low type the query carries.
fn map_query_types(method: QueryMethod, f: &impl Fn(LowType) -> LowType) -> QueryMethod {
    let map_part = |part: SignaturePart| match part {
        SignaturePart::Wildcard => SignaturePart::Wildcard,
        SignaturePart::Signature(t) => SignaturePart::Signature(f(t)),
    };
    match method {
        QueryMethod::ByName(items, part) => QueryMethod::ByName(items, map_part(part)),
        QueryMethod::BySignature(part) => QueryMethod::BySignature(map_part(part)),
        QueryMethod::ByActivePattern(mut ap) => {
            ap.signature = match ap.signature {
                ActivePatternSignature::Specified(t) => ActivePatternSignature::Specified(f(t)),
                ActivePatternSignature::AnyParameter(a, b) => {
                    ActivePatternSignature::AnyParameter(f(a), f(b))
                }
            };
            QueryMethod::ByActivePattern(ap)
        }
        QueryMethod::ByComputationExpression(mut ce) => {
            ce.low_type = f(ce.low_type);
            QueryMethod::ByComputationExpression(ce)
        }
    }
}

/// Bind bare query identifiers to known full identities where a
/// loaded type definition answers for them. Abbreviation
/// transparency is never fabricated here: it travels only inside the
/// `TypeAbbreviation` nodes the catalog itself carries, so a query
/// written with an alias stays distinct from the resolved type.
fn bind_identities(low_type: LowType, dictionaries: &[ApiDictionary]) -> LowType {
    let recurse = |t: LowType| bind_identities(t, dictionaries);
    match low_type {
        LowType::Identity(id) => {
            if let Identity::Partial(p) = id.as_ref() {
                if let Some(known) = find_definition_identity(dictionaries, p) {
                    return LowType::Identity(Box::new(known));
                }
            }
            LowType::Identity(id)
        }
        LowType::Generic(ctor, args) => LowType::Generic(
            Box::new(bind_identities(*ctor, dictionaries)),
            args.into_iter().map(recurse).collect(),
        ),
        LowType::Arrow(elements) => {
            LowType::Arrow(elements.into_iter().map(recurse).collect())
        }
        LowType::Tuple { elements, is_struct } => LowType::Tuple {
            elements: elements.into_iter().map(recurse).collect(),
            is_struct,
        },
        LowType::Delegate(delegate_type, signature) => LowType::Delegate(
            Box::new(bind_identities(*delegate_type, dictionaries)),
            signature.into_iter().map(recurse).collect(),
        ),
        LowType::Choice(alternatives) => {
            LowType::Choice(alternatives.into_iter().map(recurse).collect())
        }
        other @ (LowType::Wildcard(_)
        | LowType::Variable(..)
        | LowType::TypeAbbreviation { .. }) => other,
    }
}

fn find_definition_identity(
    dictionaries: &[ApiDictionary],
    partial: &PartialIdentity,
) -> Option<Identity> {
    dictionaries
        .iter()
        .find_map(|dict| {
            dict.find_type_definition(&partial.name, partial.generic_parameter_count)
        })
        .map(|definition| definition.identity())
}

/// Secondary-dialect rewriting: built-in aliases become canonical
/// identities and the function constructor becomes an arrow.
fn rewrite_secondary(low_type: LowType) -> LowType {
    let recurse = |t: LowType| rewrite_secondary(t);
    match low_type {
        LowType::Identity(id) => {
            if let Identity::Partial(p) = id.as_ref() {
                if p.name.len() == 1 && p.generic_parameter_count == 0 {
                    let written = p.name[0].part.display();
                    if let Some((_, canonical)) = SECONDARY_ALIASES
                        .iter()
                        .find(|(alias, _)| *alias == written)
                    {
                        return LowType::ident(canonical);
                    }
                }
            }
            LowType::Identity(id)
        }
        LowType::Generic(ctor, args) => {
            let args: Vec<LowType> = args.into_iter().map(recurse).collect();
            let is_function_ctor = matches!(
                ctor.as_ref(),
                LowType::Identity(id)
                    if matches!(id.as_ref(), Identity::Partial(p)
                        if p.name.len() == 1 && p.name[0].part.display() == FUNCTION_CONSTRUCTOR)
            );
            if is_function_ctor && args.len() >= 2 {
                return LowType::Arrow(args);
            }
            LowType::Generic(Box::new(rewrite_secondary(*ctor)), args)
        }
        LowType::Arrow(elements) => {
            LowType::Arrow(elements.into_iter().map(recurse).collect())
        }
        LowType::Tuple { elements, is_struct } => LowType::Tuple {
            elements: elements.into_iter().map(recurse).collect(),
            is_struct,
        },
        LowType::Delegate(delegate_type, signature) => LowType::Delegate(
            Box::new(rewrite_secondary(*delegate_type)),
            signature.into_iter().map(recurse).collect(),
        ),
        LowType::Choice(alternatives) => {
            LowType::Choice(alternatives.into_iter().map(recurse).collect())
        }
        other @ (LowType::Wildcard(_)
        | LowType::Variable(..)
        | LowType::TypeAbbreviation { .. }) => other,
    }
}

/// `(a, b) -> c` queries in the secondary dialect denote positional
/// parameters, not a tuple: split the single leading argument block.
fn split_argument_block(low_type: LowType) -> LowType {
    match low_type {
        LowType::Arrow(elements) if elements.len() == 2 => {
            let mut iter = elements.into_iter();
            let head = iter.next().expect("argument block");
            let ret = iter.next().expect("return type");
            match head {
                LowType::Tuple {
                    elements,
                    is_struct: false,
                } => {
                    let mut split = elements;
                    split.push(ret);
                    LowType::Arrow(split)
                }
                other => LowType::Arrow(vec![other, ret]),
            }
        }
        other => other,
    }
}

/// Recompile name-pattern regexes case-insensitively when the case
/// policy asks for it.
fn recompile_name_patterns(method: QueryMethod, options: &SearchOptions) -> QueryMethod {
    if options.ignore_case != OptionStatus::Enabled {
        return method;
    }
    match method {
        QueryMethod::ByName(mut items, part) => {
            for item in &mut items {
                if let NameMatchMethod::Regex(regex) = &item.match_method {
                    if let Ok(insensitive) = Regex::new(&format!("(?i){}", regex.as_str())) {
                        item.match_method = NameMatchMethod::Regex(insensitive);
                    }
                }
            }
            QueryMethod::ByName(items, part)
        }
        other => other,
    }
}

/// Seed the initial context: distance 0 and pairwise inequalities
/// between distinct query variables and between distinct tagged
/// wildcards, so neither family collapses into a single binding.
fn seeded_context(query: &Query, options: &SearchOptions) -> Context {
    let mut variables: Vec<LowType> = Vec::new();
    let mut holes: Vec<LowType> = Vec::new();
    for root in query_roots(&query.method) {
        collect_binders(root, &mut variables, &mut holes);
    }

    let mut equations = Equations::new();
    for family in [&variables, &holes] {
        for (index, left) in family.iter().enumerate() {
            for right in &family[index + 1..] {
                if let Some(next) = equations.try_add_inequality(left, right) {
                    equations = next;
                }
            }
        }
    }
    Context::with_equations(options.clone(), equations)
}

fn query_roots(method: &QueryMethod) -> Vec<&LowType> {
    match method {
        QueryMethod::ByName(_, SignaturePart::Signature(t))
        | QueryMethod::BySignature(SignaturePart::Signature(t)) => vec![t],
        QueryMethod::ByName(_, SignaturePart::Wildcard)
        | QueryMethod::BySignature(SignaturePart::Wildcard) => Vec::new(),
        QueryMethod::ByActivePattern(ap) => match &ap.signature {
            ActivePatternSignature::Specified(t) => vec![t],
            ActivePatternSignature::AnyParameter(a, b) => vec![a, b],
        },
        QueryMethod::ByComputationExpression(ce) => vec![&ce.low_type],
    }
}

fn collect_binders(low_type: &LowType, variables: &mut Vec<LowType>, holes: &mut Vec<LowType>) {
    match low_type {
        LowType::Variable(VariableSource::Query, _) => {
            if !variables.contains(low_type) {
                variables.push(low_type.clone());
            }
        }
        LowType::Variable(VariableSource::Target, _) => {}
        LowType::Wildcard(Some(_)) => {
            if !holes.contains(low_type) {
                holes.push(low_type.clone());
            }
        }
        LowType::Wildcard(None) | LowType::Identity(_) => {}
        LowType::Arrow(elements) | LowType::Choice(elements) => {
            for element in elements {
                collect_binders(element, variables, holes);
            }
        }
        LowType::Tuple { elements, .. } => {
            for element in elements {
                collect_binders(element, variables, holes);
            }
        }
        LowType::Generic(ctor, args) => {
            collect_binders(ctor, variables, holes);
            for arg in args {
                collect_binders(arg, variables, holes);
            }
        }
        LowType::TypeAbbreviation {
            abbreviation,
            original,
        } => {
            collect_binders(abbreviation, variables, holes);
            collect_binders(original, variables, holes);
        }
        LowType::Delegate(delegate_type, signature) => {
            collect_binders(delegate_type, variables, holes);
            for element in signature {
                collect_binders(element, variables, holes);
            }
        }
    }
}
