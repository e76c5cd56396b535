//! Computation-expression builder search.
//!
//! A builder query runs a specialized two-phase scan instead of the
//! standard pipeline. Phase one finds every builder whose expression
//! types unify with the queried type and whose syntax set covers the
//! requested syntaxes. Phase two forms a choice over the matched
//! builders' expression types and finds the APIs whose extracted
//! target unifies with any of them. The output is the builders
//! (distance 0) followed by the applicable APIs.

use tracing::debug;

use crate::models::{Api, ApiDictionary, ApiSignature, ComputationExpressionQuery, LowType};

use super::engine::SearchResultItem;
use super::equations::{Context, MatchingResult};
use super::lowtype::LowTypeMatcher;

pub fn search_builders<'a>(
    dictionaries: &'a [ApiDictionary],
    query: &ComputationExpressionQuery,
    lowtype: &LowTypeMatcher,
    initial: &Context,
) -> Vec<SearchResultItem<'a>> {
    let mut results: Vec<SearchResultItem<'a>> = Vec::new();
    let mut expression_types: Vec<LowType> = Vec::new();

    for dictionary in dictionaries {
        for api in &dictionary.apis {
            let ApiSignature::ComputationExpressionBuilder(builder) = &api.signature else {
                continue;
            };
            if !syntaxes_covered(&query.syntaxes, &builder.syntaxes) {
                continue;
            }
            let type_matches = builder
                .computation_expression_types
                .iter()
                .any(|t| lowtype.test(&query.low_type, t, initial).is_matched());
            if !type_matches {
                continue;
            }
            results.push(SearchResultItem {
                api,
                assembly_name: &dictionary.assembly_name,
                distance: 0,
            });
            for expression_type in &builder.computation_expression_types {
                if !expression_types.contains(expression_type) {
                    expression_types.push(expression_type.clone());
                }
            }
        }
    }
    debug!(builders = results.len(), "builder discovery done");
    if expression_types.is_empty() {
        return results;
    }

    let choice = LowType::Choice(expression_types);
    for dictionary in dictionaries {
        for api in &dictionary.apis {
            let Some(target) = applicable_target(api) else {
                continue;
            };
            if let MatchingResult::Matched(ctx) = lowtype.test(&choice, target, initial) {
                results.push(SearchResultItem {
                    api,
                    assembly_name: &dictionary.assembly_name,
                    distance: ctx.distance,
                });
            }
        }
    }
    results
}

/// A query with no syntaxes accepts any builder that implements at
/// least one form; otherwise the builder must cover every requested
/// form.
fn syntaxes_covered(requested: &[String], provided: &[String]) -> bool {
    if requested.is_empty() {
        !provided.is_empty()
    } else {
        requested.iter().all(|syntax| provided.contains(syntax))
    }
}

/// The type an API is tested through in phase two.
fn applicable_target(api: &Api) -> Option<&LowType> {
    match &api.signature {
        ApiSignature::ModuleValue(t) => match t {
            // A value of an abbreviated function type applies through
            // the arrow's result.
            LowType::TypeAbbreviation { original, .. } => match original.as_ref() {
                LowType::Arrow(elements) => elements.last(),
                _ => Some(t),
            },
            _ => Some(t),
        },
        ApiSignature::ModuleFunction(function) => {
            let last_group = function.parameters.last()?;
            Some(&last_group.first()?.low_type)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ApiName, ComputationExpressionBuilder, FunctionSignature, NameItem, Parameter,
        SearchOptions, TypeVariable, VariableSource,
    };

    fn async_of(source: VariableSource, var: &str) -> LowType {
        LowType::generic(
            LowType::ident_of(&["async"], 1),
            vec![LowType::Variable(source, TypeVariable::new(var))],
        )
    }

    fn fixture() -> ApiDictionary {
        let builder = Api {
            name: ApiName::Display(vec![NameItem::symbol("async")]),
            signature: ApiSignature::ComputationExpressionBuilder(ComputationExpressionBuilder {
                builder_type: LowType::ident("AsyncBuilder"),
                computation_expression_types: vec![async_of(VariableSource::Target, "a")],
                syntaxes: vec!["for".to_string(), "let!".to_string(), "return".to_string()],
            }),
            type_constraints: Vec::new(),
            document: None,
        };
        let run = Api {
            name: ApiName::Display(vec![NameItem::symbol("Run"), NameItem::symbol("Async")]),
            signature: ApiSignature::ModuleFunction(FunctionSignature {
                parameters: vec![vec![Parameter::of(async_of(VariableSource::Target, "a"))]],
                return_parameter: Parameter::of(LowType::ident("unit")),
            }),
            type_constraints: Vec::new(),
            document: None,
        };
        let unrelated = Api {
            name: ApiName::Display(vec![NameItem::symbol("length"), NameItem::symbol("List")]),
            signature: ApiSignature::ModuleFunction(FunctionSignature {
                parameters: vec![vec![Parameter::of(LowType::ident("int"))]],
                return_parameter: Parameter::of(LowType::ident("int")),
            }),
            type_constraints: Vec::new(),
            document: None,
        };
        ApiDictionary {
            assembly_name: "core".to_string(),
            apis: vec![builder, run, unrelated],
            type_definitions: Vec::new(),
            type_abbreviations: Vec::new(),
        }
    }

    fn run_query(syntaxes: Vec<&str>) -> Vec<String> {
        let dictionaries = [fixture()];
        let options = SearchOptions::default();
        let query = ComputationExpressionQuery {
            syntaxes: syntaxes.into_iter().map(|s| s.to_string()).collect(),
            low_type: async_of(VariableSource::Query, "a"),
        };
        let lowtype = LowTypeMatcher::new(options.clone());
        let results = search_builders(
            &dictionaries,
            &query,
            &lowtype,
            &Context::new(options),
        );
        results
            .iter()
            .map(|item| {
                let name = item.api.name.display_name().expect("display name");
                crate::models::display_name_string(name)
            })
            .collect()
    }

    #[test]
    fn finds_the_builder_and_its_applicable_apis() {
        let names = run_query(vec!["let!", "return"]);
        assert_eq!(names, vec!["async", "Async.Run"]);
    }

    #[test]
    fn empty_syntax_set_accepts_any_nonempty_builder() {
        let names = run_query(Vec::new());
        assert_eq!(names, vec!["async", "Async.Run"]);
    }

    #[test]
    fn unsupported_syntax_rejects_the_builder_and_its_apis() {
        let names = run_query(vec!["yield!"]);
        assert!(names.is_empty());
    }
}
