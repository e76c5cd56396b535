//! End-to-end engine scenarios over literal catalogs, plus the
//! cross-cutting properties the matcher guarantees (budget
//! monotonicity, case-policy supersets, parallel equivalence,
//! reflexivity, constraint soundness).

use siggrep::models::{
    Accessibility, Api, ApiDictionary, ApiName, ApiSignature, ComputationExpressionBuilder,
    Constraint, ConstraintStatus, FullTypeDefinition, FunctionSignature, LowType, NameItem,
    OptionStatus, Parameter, Query, QueryMethod, SearchOptions, SignaturePart,
    TypeAbbreviationDefinition, TypeConstraint, TypeDefinitionKind, TypeVariable, VariableSource,
};
use siggrep::search::matchers::signature_target;
use siggrep::search::strategy::strategy_for;
use siggrep::search::{self, SearchResultItem};

fn tvar(name: &str) -> LowType {
    LowType::variable(VariableSource::Target, name)
}

fn generic(name: &str, args: Vec<LowType>) -> LowType {
    let arity = args.len();
    LowType::generic(LowType::ident_of(&[name], arity), args)
}

fn api_name(segments: &[&str]) -> ApiName {
    ApiName::Display(segments.iter().map(|s| NameItem::symbol(*s)).collect())
}

fn module_function(segments: &[&str], groups: Vec<Vec<Parameter>>, ret: LowType) -> Api {
    Api {
        name: api_name(segments),
        signature: ApiSignature::ModuleFunction(FunctionSignature {
            parameters: groups,
            return_parameter: Parameter::of(ret),
        }),
        type_constraints: Vec::new(),
        document: None,
    }
}

fn dictionary(apis: Vec<Api>) -> ApiDictionary {
    ApiDictionary {
        assembly_name: "core".to_string(),
        apis,
        type_definitions: Vec::new(),
        type_abbreviations: Vec::new(),
    }
}

fn list_length() -> Api {
    module_function(
        &["length", "List"],
        vec![vec![Parameter::of(generic("list", vec![tvar("a")]))]],
        LowType::ident("int"),
    )
}

fn operators_id() -> Api {
    module_function(
        &["id", "Operators"],
        vec![vec![Parameter::of(tvar("a"))]],
        tvar("a"),
    )
}

fn map_add() -> Api {
    let map = generic("Map", vec![tvar("k"), tvar("v")]);
    module_function(
        &["add", "Map"],
        vec![
            vec![Parameter::of(tvar("k"))],
            vec![Parameter::of(tvar("v"))],
            vec![Parameter::of(map.clone())],
        ],
        map,
    )
}

fn printfn() -> Api {
    module_function(
        &["printfn", "Printf"],
        vec![
            vec![Parameter::of(LowType::ident("string"))],
            vec![Parameter::optional(tvar("a"))],
        ],
        LowType::ident("unit"),
    )
}

fn seq_head() -> Api {
    module_function(
        &["head", "Seq"],
        vec![vec![Parameter::of(generic("seq", vec![tvar("a")]))]],
        tvar("a"),
    )
}

fn rows(results: &[SearchResultItem<'_>]) -> Vec<(String, u32)> {
    results
        .iter()
        .map(|item| {
            let name = item.api.name.display_name().expect("display name");
            (siggrep::models::display_name_string(name), item.distance)
        })
        .collect()
}

fn run(
    dictionaries: &[ApiDictionary],
    options: &SearchOptions,
    query: &str,
) -> Vec<(String, u32)> {
    rows(&search::search(dictionaries, options, query).expect("search succeeds"))
}

#[test]
fn s1_identity_match() {
    let dicts = [dictionary(vec![list_length()])];
    let results = run(&dicts, &SearchOptions::default(), "'a list -> int");
    assert_eq!(results, vec![("List.length".to_string(), 0)]);
}

#[test]
fn s2_variable_generalization() {
    let dicts = [dictionary(vec![operators_id()])];
    let results = run(&dicts, &SearchOptions::default(), "int -> int");
    assert_eq!(results, vec![("Operators.id".to_string(), 0)]);
}

#[test]
fn s3_tuple_swap_respects_the_budget() {
    let dicts = [dictionary(vec![map_add()])];
    let query = "'v -> 'k -> Map<'k, 'v> -> Map<'k, 'v>";

    let results = run(&dicts, &SearchOptions::default(), query);
    assert_eq!(results, vec![("Map.add".to_string(), 1)]);

    let mut no_swaps = SearchOptions::default();
    no_swaps.swap_order_depth = 0;
    assert!(run(&dicts, &no_swaps, query).is_empty());
}

#[test]
fn s4_optional_complementation_respects_the_budget() {
    let dicts = [dictionary(vec![printfn()])];
    let query = "string -> unit";

    let results = run(&dicts, &SearchOptions::default(), query);
    assert_eq!(results, vec![("Printf.printfn".to_string(), 1)]);

    let mut no_complement = SearchOptions::default();
    no_complement.complement_depth = 0;
    assert!(run(&dicts, &no_complement, query).is_empty());
}

#[test]
fn s5_abbreviations_resolve_on_the_target_side_only() {
    let mut dict = dictionary(vec![seq_head()]);
    // `list` abbreviates `seq` in the catalog's scope, but Seq.head
    // is typed with plain `seq`, so a `list` query stays distinct.
    dict.type_abbreviations = vec![TypeAbbreviationDefinition {
        name: vec![NameItem::symbol("list")],
        assembly_name: "core".to_string(),
        accessibility: Accessibility::Public,
        generic_parameters: vec![TypeVariable::new("a")],
        abbreviated: generic("list", vec![tvar("a")]),
        original: generic("seq", vec![tvar("a")]),
    }];
    let dicts = [dict];

    assert!(run(&dicts, &SearchOptions::default(), "list<'a> -> 'a").is_empty());
    assert_eq!(
        run(&dicts, &SearchOptions::default(), "seq<'a> -> 'a"),
        vec![("Seq.head".to_string(), 0)]
    );
}

#[test]
fn s6_builder_search_returns_the_builder_and_applicable_apis() {
    let builder = Api {
        name: api_name(&["async"]),
        signature: ApiSignature::ComputationExpressionBuilder(ComputationExpressionBuilder {
            builder_type: LowType::ident("AsyncBuilder"),
            computation_expression_types: vec![generic("async", vec![tvar("a")])],
            syntaxes: vec!["for".to_string(), "let!".to_string(), "return".to_string()],
        }),
        type_constraints: Vec::new(),
        document: None,
    };
    let run_sync = module_function(
        &["RunSynchronously", "Async"],
        vec![vec![Parameter::of(generic("async", vec![tvar("a")]))]],
        tvar("a"),
    );
    let dicts = [dictionary(vec![builder, run_sync, list_length()])];

    let results = run(
        &dicts,
        &SearchOptions::default(),
        "{ let!; return } : async<'a>",
    );
    assert_eq!(
        results,
        vec![
            ("async".to_string(), 0),
            ("Async.RunSynchronously".to_string(), 0),
        ]
    );

    // A syntax the builder does not implement rejects everything.
    assert!(run(
        &dicts,
        &SearchOptions::default(),
        "{ yield! } : async<'a>"
    )
    .is_empty());
}

fn comparison_definition(name: &str, comparison: ConstraintStatus) -> FullTypeDefinition {
    FullTypeDefinition {
        name: vec![NameItem::symbol(name)],
        assembly_name: "core".to_string(),
        accessibility: Accessibility::Public,
        kind: TypeDefinitionKind::Class,
        base_type: None,
        all_interfaces: Vec::new(),
        generic_parameters: Vec::new(),
        type_constraints: Vec::new(),
        instance_members: Vec::new(),
        static_members: Vec::new(),
        implicit_instance_members: Vec::new(),
        implicit_static_members: Vec::new(),
        support_null: ConstraintStatus::NotSatisfy,
        reference_type: ConstraintStatus::NotSatisfy,
        value_type: ConstraintStatus::Satisfy,
        default_constructor: ConstraintStatus::Satisfy,
        equality: ConstraintStatus::Satisfy,
        comparison,
    }
}

fn combined() -> Vec<ApiDictionary> {
    let mut max = module_function(
        &["max", "Compare"],
        vec![vec![Parameter::of(tvar("a"))], vec![Parameter::of(tvar("a"))]],
        tvar("a"),
    );
    max.type_constraints = vec![TypeConstraint {
        variables: vec![TypeVariable::new("a")],
        constraint: Constraint::Comparison,
    }];

    let mut dict = dictionary(vec![
        list_length(),
        operators_id(),
        map_add(),
        printfn(),
        seq_head(),
        max,
    ]);
    dict.type_definitions = vec![
        comparison_definition("int", ConstraintStatus::Satisfy),
        comparison_definition("Handler", ConstraintStatus::NotSatisfy),
    ];
    vec![dict]
}

#[test]
fn searches_are_deterministic() {
    let dicts = combined();
    let options = SearchOptions::default();
    let first = run(&dicts, &options, "'a -> 'a");
    let second = run(&dicts, &options, "'a -> 'a");
    assert_eq!(first, second);
}

#[test]
fn wildcard_queries_match_every_arrow_of_their_arity() {
    let dicts = combined();
    let results = run(&dicts, &SearchOptions::default(), "? -> ?");
    let zero_distance: Vec<&str> = results
        .iter()
        .filter(|(_, d)| *d == 0)
        .map(|(name, _)| name.as_str())
        .collect();
    assert!(zero_distance.contains(&"List.length"));
    assert!(zero_distance.contains(&"Operators.id"));
    assert!(zero_distance.contains(&"Seq.head"));
    // Arity-4 arrows stay out.
    assert!(!results.iter().any(|(name, _)| name == "Map.add"));
}

#[test]
fn ignore_case_produces_a_superset() {
    let dicts = combined();
    let query = "'a List -> int";

    let sensitive = run(&dicts, &SearchOptions::default(), query);
    assert!(sensitive.is_empty());

    let mut options = SearchOptions::default();
    options.ignore_case = OptionStatus::Enabled;
    let insensitive = run(&dicts, &options, query);
    assert_eq!(insensitive, vec![("List.length".to_string(), 0)]);
}

#[test]
fn swap_budget_is_monotone() {
    let dicts = combined();
    let query = "'v -> 'k -> Map<'k, 'v> -> Map<'k, 'v>";
    let mut previous = usize::MAX;
    for depth in [2u16, 1, 0] {
        let mut options = SearchOptions::default();
        options.swap_order_depth = depth;
        let count = run(&dicts, &options, query).len();
        assert!(count <= previous, "raising the budget must not lose results");
        previous = count;
    }
    assert_eq!(previous, 0);
}

#[test]
fn complement_budget_is_monotone() {
    let dicts = combined();
    let query = "string -> unit";
    let counts: Vec<usize> = [0u16, 1, 2]
        .into_iter()
        .map(|depth| {
            let mut options = SearchOptions::default();
            options.complement_depth = depth;
            run(&dicts, &options, query).len()
        })
        .collect();
    assert!(counts[0] <= counts[1] && counts[1] <= counts[2]);
    assert_eq!(counts[0], 0);
    assert_eq!(counts[1], 1);
}

#[test]
fn parallel_and_serial_scans_agree() {
    let dicts = combined();
    for query in ["'a -> 'a", "? -> ?", "string -> unit", "'a list -> int"] {
        let serial = run(&dicts, &SearchOptions::default(), query);
        let mut options = SearchOptions::default();
        options.parallel = OptionStatus::Enabled;
        let mut parallel = run(&dicts, &options, query);
        let mut serial_sorted = serial.clone();
        serial_sorted.sort();
        parallel.sort();
        assert_eq!(serial_sorted, parallel, "query {query}");
    }
}

#[test]
fn constraints_are_sound_in_results() {
    let dicts = combined();

    let satisfied = run(&dicts, &SearchOptions::default(), "int -> int -> int");
    assert!(satisfied.iter().any(|(name, _)| name == "Compare.max"));

    // Handler's comparison status is NotSatisfy, so the constrained
    // API must not appear.
    let refuted = run(&dicts, &SearchOptions::default(), "Handler -> Handler -> Handler");
    assert!(!refuted.iter().any(|(name, _)| name == "Compare.max"));
}

#[test]
fn every_api_matches_its_own_extracted_signature_with_distance_zero() {
    let dicts = combined();
    let options = SearchOptions::default();
    let strategy = strategy_for(options.mode);

    for dict in &dicts {
        for api in &dict.apis {
            let Some(target) = signature_target(&api.signature) else {
                continue;
            };
            let query = Query {
                original_string: "reflexivity".to_string(),
                method: QueryMethod::BySignature(SignaturePart::Signature(
                    target.low_type.clone(),
                )),
            };
            let ctx = strategy.initial_context(&query, &dicts, &options);
            let (lowtype, pipeline) = strategy.matchers(&query, &options, &dicts);
            let result = pipeline
                .test(&lowtype, &query, api, &ctx)
                .expect("no contract error");
            let name = api.name.display_name().expect("display name");
            let ctx = result.into_context().unwrap_or_else(|| {
                panic!(
                    "{} must match its own signature",
                    siggrep::models::display_name_string(name)
                )
            });
            assert_eq!(
                ctx.distance,
                0,
                "{} matched itself at a distance",
                siggrep::models::display_name_string(name)
            );
        }
    }
}

#[test]
fn abbreviated_and_original_queries_return_the_same_set() {
    // Bag.total is typed through an abbreviation node, so both the
    // alias and the resolved spelling reach it.
    let total = module_function(
        &["total", "Bag"],
        vec![vec![Parameter::of(LowType::abbreviation(
            generic("bag", vec![tvar("a")]),
            generic("list", vec![tvar("a")]),
        ))]],
        LowType::ident("int"),
    );
    let dicts = [dictionary(vec![total])];

    let through_alias = run(&dicts, &SearchOptions::default(), "bag<'a> -> int");
    let through_original = run(&dicts, &SearchOptions::default(), "list<'a> -> int");
    assert_eq!(
        through_alias.iter().map(|(n, _)| n).collect::<Vec<_>>(),
        through_original.iter().map(|(n, _)| n).collect::<Vec<_>>()
    );
    assert_eq!(through_alias.len(), 1);

    // Opaque abbreviations block both spellings.
    let mut opaque = SearchOptions::default();
    opaque.ignore_parameter_style = OptionStatus::Disabled;
    assert!(run(&dicts, &opaque, "list<'a> -> int").is_empty());
}
