//! Core search entry point.
//!
//! The driver parses and initializes the query through the mode's
//! strategy, assembles the matcher pipeline, and streams every
//! (dictionary, api) pair through it. Serial scans preserve
//! dictionary order then catalog order; under `Parallel: Enabled` the
//! scan fans out with rayon and callers wanting a stable order must
//! sort the results.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::models::{
    Api, ApiDictionary, Query, QueryMethod, SearchError, SearchOptions,
};

use super::compexpr;
use super::equations::{Context, MatchingResult};
use super::lowtype::LowTypeMatcher;
use super::matchers::MatcherPipeline;
use super::strategy::strategy_for;

/// One hit: the API aliased into its owning dictionary, plus the
/// accumulated distance.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SearchResultItem<'a> {
    pub api: &'a Api,
    pub assembly_name: &'a str,
    pub distance: u32,
}

/// Run a search over the given dictionaries.
pub fn search<'a>(
    dictionaries: &'a [ApiDictionary],
    options: &SearchOptions,
    query_text: &str,
) -> Result<Vec<SearchResultItem<'a>>, SearchError> {
    let strategy = strategy_for(options.mode);
    let query = strategy.parse_query(query_text)?;
    let query = strategy.initialize_query(query, dictionaries, options);
    let initial = strategy.initial_context(&query, dictionaries, options);
    debug!(query = %query.original_string, mode = ?options.mode, "search start");

    if let QueryMethod::ByComputationExpression(ce) = &query.method {
        let lowtype = LowTypeMatcher::new(options.clone());
        let results = compexpr::search_builders(dictionaries, ce, &lowtype, &initial);
        debug!(results = results.len(), "computation-expression search done");
        return Ok(results);
    }

    let (lowtype, pipeline) = strategy.matchers(&query, options, dictionaries);
    let results = if options.parallel.is_enabled() {
        parallel_scan(dictionaries, &lowtype, &pipeline, &query, &initial)?
    } else {
        serial_scan(dictionaries, &lowtype, &pipeline, &query, &initial)?
    };
    debug!(results = results.len(), "search done");
    Ok(results)
}

fn test_one<'a>(
    dictionary: &'a ApiDictionary,
    api: &'a Api,
    lowtype: &LowTypeMatcher,
    pipeline: &MatcherPipeline<'_>,
    query: &Query,
    initial: &Context,
) -> Result<Option<SearchResultItem<'a>>, SearchError> {
    match pipeline.test(lowtype, query, api, initial)? {
        MatchingResult::Matched(ctx) => Ok(Some(SearchResultItem {
            api,
            assembly_name: &dictionary.assembly_name,
            distance: ctx.distance,
        })),
        MatchingResult::Failure => Ok(None),
    }
}

fn serial_scan<'a>(
    dictionaries: &'a [ApiDictionary],
    lowtype: &LowTypeMatcher,
    pipeline: &MatcherPipeline<'_>,
    query: &Query,
    initial: &Context,
) -> Result<Vec<SearchResultItem<'a>>, SearchError> {
    let mut results = Vec::new();
    for dictionary in dictionaries {
        for api in &dictionary.apis {
            if let Some(item) = test_one(dictionary, api, lowtype, pipeline, query, initial)? {
                results.push(item);
            }
        }
    }
    Ok(results)
}

fn parallel_scan<'a>(
    dictionaries: &'a [ApiDictionary],
    lowtype: &LowTypeMatcher,
    pipeline: &MatcherPipeline<'_>,
    query: &Query,
    initial: &Context,
) -> Result<Vec<SearchResultItem<'a>>, SearchError> {
    let pairs: Vec<(&ApiDictionary, &Api)> = dictionaries
        .iter()
        .flat_map(|dictionary| dictionary.apis.iter().map(move |api| (dictionary, api)))
        .collect();
    let tested: Result<Vec<Option<SearchResultItem<'a>>>, SearchError> = pairs
        .par_iter()
        .map(|&(dictionary, api)| test_one(dictionary, api, lowtype, pipeline, query, initial))
        .collect();
    Ok(tested?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ApiName, ApiSignature, FunctionSignature, LowType, NameItem, OptionStatus, Parameter,
        VariableSource,
    };

    fn module_function(
        segments: &[&str],
        parameters: Vec<Parameter>,
        return_type: LowType,
    ) -> Api {
        Api {
            name: ApiName::Display(segments.iter().map(|s| NameItem::symbol(*s)).collect()),
            signature: ApiSignature::ModuleFunction(FunctionSignature {
                parameters: parameters.into_iter().map(|p| vec![p]).collect(),
                return_parameter: Parameter::of(return_type),
            }),
            type_constraints: Vec::new(),
            document: None,
        }
    }

    fn fixture() -> Vec<ApiDictionary> {
        let tvar = |name: &str| LowType::variable(VariableSource::Target, name);
        let list_of = |t: LowType| LowType::generic(LowType::ident_of(&["list"], 1), vec![t]);
        vec![ApiDictionary {
            assembly_name: "core".to_string(),
            apis: vec![
                module_function(
                    &["length", "List"],
                    vec![Parameter::of(list_of(tvar("a")))],
                    LowType::ident("int"),
                ),
                module_function(
                    &["id", "Operators"],
                    vec![Parameter::of(tvar("a"))],
                    tvar("a"),
                ),
                module_function(
                    &["max", "Operators"],
                    vec![Parameter::of(tvar("a")), Parameter::of(tvar("a"))],
                    tvar("a"),
                ),
            ],
            type_definitions: Vec::new(),
            type_abbreviations: Vec::new(),
        }]
    }

    fn names(results: &[SearchResultItem<'_>]) -> Vec<String> {
        results
            .iter()
            .map(|item| {
                crate::models::display_name_string(
                    item.api.name.display_name().expect("display name"),
                )
            })
            .collect()
    }

    #[test]
    fn signature_search_finds_the_matching_api_with_distance_zero() {
        let dictionaries = fixture();
        let results = search(&dictionaries, &SearchOptions::default(), "'a list -> int")
            .expect("search");
        assert_eq!(names(&results), vec!["List.length"]);
        assert_eq!(results[0].distance, 0);
        assert_eq!(results[0].assembly_name, "core");
    }

    #[test]
    fn concrete_query_generalizes_over_target_variables() {
        let dictionaries = fixture();
        let results =
            search(&dictionaries, &SearchOptions::default(), "int -> int").expect("search");
        assert_eq!(names(&results), vec!["Operators.id"]);
    }

    #[test]
    fn name_query_narrows_by_segments() {
        let dictionaries = fixture();
        let results = search(&dictionaries, &SearchOptions::default(), "Operators.id : _")
            .expect("search");
        assert_eq!(names(&results), vec!["Operators.id"]);
    }

    #[test]
    fn parallel_scan_finds_the_same_results() {
        let dictionaries = fixture();
        let serial = search(&dictionaries, &SearchOptions::default(), "'a -> 'a -> 'a")
            .expect("serial");

        let mut options = SearchOptions::default();
        options.parallel = OptionStatus::Enabled;
        let parallel = search(&dictionaries, &options, "'a -> 'a -> 'a").expect("parallel");

        assert_eq!(names(&serial), names(&parallel));
        assert_eq!(names(&serial), vec!["Operators.max"]);
    }

    #[test]
    fn loading_names_abort_name_searches() {
        let mut dictionaries = fixture();
        dictionaries[0].apis[0].name = ApiName::Loading {
            raw: "List.length".to_string(),
        };
        let err = search(&dictionaries, &SearchOptions::default(), "length : _")
            .expect_err("contract violation");
        assert!(matches!(err, SearchError::UnresolvedName { .. }));
    }

    #[test]
    fn parse_errors_surface_to_the_caller() {
        let dictionaries = fixture();
        let err = search(&dictionaries, &SearchOptions::default(), "int -> -")
            .expect_err("parse error");
        assert!(matches!(err, SearchError::ParseError { .. }));
    }
}
