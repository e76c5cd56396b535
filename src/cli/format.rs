//! Rendering of search results in text, table, and JSON form.

use std::cmp;

use anyhow::Result;
use serde::Serialize;

use crate::models::{
    display_name_string, Api, ApiDictionary, ApiName, ApiSignature, LowType,
};
use crate::search::matchers::signature_target;
use crate::search::SearchResultItem;

/// Schema version for `--format=json` result payloads.
pub const SEARCH_RESULT_VERSION: &str = "0.1.0";

/// Internal representation of a row rendered by the CLI.
struct DisplayRow {
    name: String,
    signature: String,
    kind: &'static str,
    assembly: String,
    distance: u32,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    name: String,
    kind: &'static str,
    signature: String,
    assembly_name: &'a str,
    distance: u32,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    version: &'static str,
    query: &'a str,
    results: Vec<JsonRow<'a>>,
}

/// Render results as one line per hit:
/// `name: signature, kind (assembly), distance n`.
pub fn print_text(results: &[SearchResultItem<'_>]) -> Result<()> {
    for row in build_rows(results) {
        println!(
            "{}: {}, {} ({}), distance {}",
            row.name, row.signature, row.kind, row.assembly, row.distance
        );
    }
    Ok(())
}

/// Render results as a simple aligned table.
pub fn print_table(results: &[SearchResultItem<'_>]) -> Result<()> {
    let rows = build_rows(results);
    if rows.is_empty() {
        return Ok(());
    }

    const MAX_NAME_WIDTH: usize = 40;
    const MAX_SIGNATURE_WIDTH: usize = 60;

    let name_width = cmp::min(
        cmp::max("NAME".len(), rows.iter().map(|r| r.name.len()).max().unwrap_or(0)),
        MAX_NAME_WIDTH,
    );
    let signature_width = cmp::min(
        cmp::max(
            "SIGNATURE".len(),
            rows.iter().map(|r| r.signature.len()).max().unwrap_or(0),
        ),
        MAX_SIGNATURE_WIDTH,
    );
    let kind_width = cmp::max(
        "KIND".len(),
        rows.iter().map(|r| r.kind.len()).max().unwrap_or(0),
    );
    let assembly_width = cmp::max(
        "ASSEMBLY".len(),
        rows.iter().map(|r| r.assembly.len()).max().unwrap_or(0),
    );

    println!(
        "{:<name_width$} {:<signature_width$} {:<kind_width$} {:<assembly_width$} {:>4}",
        "NAME", "SIGNATURE", "KIND", "ASSEMBLY", "DIST"
    );
    for row in rows {
        println!(
            "{:<name_width$} {:<signature_width$} {:<kind_width$} {:<assembly_width$} {:>4}",
            truncate(&row.name, name_width),
            truncate(&row.signature, signature_width),
            row.kind,
            row.assembly,
            row.distance
        );
    }
    Ok(())
}

/// Render results as a single JSON document on stdout.
pub fn print_json(query: &str, results: &[SearchResultItem<'_>]) -> Result<()> {
    let rows: Vec<JsonRow<'_>> = results
        .iter()
        .map(|item| JsonRow {
            name: api_name_string(&item.api.name),
            kind: item.api.signature.kind_label(),
            signature: format_api_signature(item.api),
            assembly_name: item.assembly_name,
            distance: item.distance,
        })
        .collect();
    let payload = JsonResult {
        version: SEARCH_RESULT_VERSION,
        query,
        results: rows,
    };
    serde_json::to_writer(std::io::stdout(), &payload)?;
    println!();
    Ok(())
}

/// Render a `dictionaries` summary in text form.
pub fn print_dictionary_summaries(dictionaries: &[ApiDictionary]) -> Result<()> {
    for dictionary in dictionaries {
        println!(
            "{}: {} apis, {} type definitions, {} type abbreviations",
            dictionary.assembly_name,
            dictionary.apis.len(),
            dictionary.type_definitions.len(),
            dictionary.type_abbreviations.len()
        );
    }
    Ok(())
}

fn build_rows(results: &[SearchResultItem<'_>]) -> Vec<DisplayRow> {
    results
        .iter()
        .map(|item| DisplayRow {
            name: api_name_string(&item.api.name),
            signature: format_api_signature(item.api),
            kind: item.api.signature.kind_label(),
            assembly: item.assembly_name.to_string(),
            distance: item.distance,
        })
        .collect()
}

fn api_name_string(name: &ApiName) -> String {
    match name {
        ApiName::Display(display) => display_name_string(display),
        // Catalog validation rejects these before a search; keep the
        // raw text as a fallback for ad-hoc dictionaries.
        ApiName::Loading { raw } => raw.clone(),
    }
}

/// A printable signature for any API shape.
pub fn format_api_signature(api: &Api) -> String {
    if let Some(target) = signature_target(&api.signature) {
        return format_low_type(&target.low_type);
    }
    match &api.signature {
        ApiSignature::ModuleDefinition(_) => "module".to_string(),
        ApiSignature::FullTypeDefinition(definition) => {
            format!("type, {} generic parameters", definition.generic_parameters.len())
        }
        ApiSignature::TypeAbbreviation(definition) => format!(
            "{} = {}",
            format_low_type(&definition.abbreviated),
            format_low_type(&definition.original)
        ),
        ApiSignature::ComputationExpressionBuilder(builder) => format!(
            "{{ {} }} : {}",
            builder.syntaxes.join("; "),
            builder
                .computation_expression_types
                .iter()
                .map(format_low_type)
                .collect::<Vec<_>>()
                .join(" | ")
        ),
        _ => unreachable!("every other shape has a signature target"),
    }
}

/// Print a low type back in query syntax.
pub fn format_low_type(low_type: &LowType) -> String {
    match low_type {
        LowType::Wildcard(None) => "?".to_string(),
        LowType::Wildcard(Some(tag)) => format!("?{tag}"),
        LowType::Variable(_, variable) => {
            if variable.is_solve_at_compile_time {
                format!("^{}", variable.name)
            } else {
                format!("'{}", variable.name)
            }
        }
        LowType::Identity(identity) => display_name_string(identity.name()),
        LowType::Arrow(elements) => elements
            .iter()
            .map(|element| {
                if matches!(element, LowType::Arrow(_)) {
                    format!("({})", format_low_type(element))
                } else {
                    format_low_type(element)
                }
            })
            .collect::<Vec<_>>()
            .join(" -> "),
        LowType::Tuple { elements, is_struct } => {
            let body = elements
                .iter()
                .map(|element| {
                    if matches!(element, LowType::Arrow(_) | LowType::Tuple { .. }) {
                        format!("({})", format_low_type(element))
                    } else {
                        format_low_type(element)
                    }
                })
                .collect::<Vec<_>>()
                .join(" * ");
            if *is_struct {
                format!("struct ({body})")
            } else {
                body
            }
        }
        LowType::Generic(ctor, args) => format!(
            "{}<{}>",
            format_low_type(ctor),
            args.iter().map(format_low_type).collect::<Vec<_>>().join(", ")
        ),
        LowType::TypeAbbreviation { abbreviation, .. } => format_low_type(abbreviation),
        LowType::Delegate(wrapper, _) => format_low_type(wrapper),
        LowType::Choice(alternatives) => format!(
            "({})",
            alternatives
                .iter()
                .map(format_low_type)
                .collect::<Vec<_>>()
                .join(" | ")
        ),
    }
}

fn truncate(s: &str, max_width: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_width {
        s.to_string()
    } else if max_width <= 1 {
        "…".to_string()
    } else {
        s.chars()
            .take(max_width.saturating_sub(1))
            .collect::<String>()
            + "…"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ApiName, FunctionSignature, NameItem, Parameter, VariableSource,
    };

    #[test]
    fn low_types_print_in_query_syntax() {
        let t = LowType::arrow(vec![
            LowType::arrow(vec![
                LowType::variable(VariableSource::Query, "a"),
                LowType::variable(VariableSource::Query, "b"),
            ]),
            LowType::generic(
                LowType::ident_of(&["list"], 1),
                vec![LowType::variable(VariableSource::Query, "a")],
            ),
            LowType::tuple(vec![LowType::ident("int"), LowType::ident("string")]),
        ]);
        assert_eq!(format_low_type(&t), "('a -> 'b) -> list<'a> -> int * string");
    }

    #[test]
    fn struct_tuples_and_wildcards_round_trip_textually() {
        let t = LowType::Tuple {
            elements: vec![LowType::Wildcard(None), LowType::Wildcard(Some("x".to_string()))],
            is_struct: true,
        };
        assert_eq!(format_low_type(&t), "struct (? * ?x)");
    }

    #[test]
    fn api_signatures_print_through_their_extraction() {
        let api = Api {
            name: ApiName::Display(vec![NameItem::symbol("length"), NameItem::symbol("List")]),
            signature: ApiSignature::ModuleFunction(FunctionSignature {
                parameters: vec![vec![Parameter::of(LowType::generic(
                    LowType::ident_of(&["list"], 1),
                    vec![LowType::variable(VariableSource::Target, "a")],
                ))]],
                return_parameter: Parameter::of(LowType::ident("int")),
            }),
            type_constraints: Vec::new(),
            document: None,
        };
        assert_eq!(format_api_signature(&api), "list<'a> -> int");
    }

    #[test]
    fn truncate_handles_unicode_characters() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("éééé", 2), "é…");
    }
}
