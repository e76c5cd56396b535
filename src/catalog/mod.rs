//! Catalog persistence.
//!
//! Dictionaries are materialized by an external loader and saved as
//! one JSON file per assembly; this module reads them back into
//! memory and validates the data contract on the way in (resolved
//! names, structurally sound types). Loading is the only I/O the
//! tool performs: a catalog is immutable for the lifetime of every
//! search that uses it.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::models::{Api, ApiDictionary, ApiSignature, LowType, SearchError};

/// Load every dictionary in order.
pub fn load_dictionaries(paths: &[impl AsRef<Path>]) -> Result<Vec<ApiDictionary>> {
    paths.iter().map(load_dictionary).collect()
}

/// Load one dictionary file and validate its contract.
pub fn load_dictionary(path: impl AsRef<Path>) -> Result<ApiDictionary> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("cannot open dictionary {}", path.display()))?;
    let dictionary: ApiDictionary = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse dictionary {}", path.display()))?;
    validate_dictionary(&dictionary)
        .with_context(|| format!("invalid dictionary {}", path.display()))?;
    debug!(
        assembly = %dictionary.assembly_name,
        apis = dictionary.apis.len(),
        "dictionary loaded"
    );
    Ok(dictionary)
}

/// Write a dictionary as JSON; the inverse of [`load_dictionary`].
pub fn save_dictionary(dictionary: &ApiDictionary, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("cannot create dictionary {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), dictionary)
        .with_context(|| format!("cannot write dictionary {}", path.display()))?;
    Ok(())
}

/// The loader contract: every name resolved to a display name, every
/// type structurally sound.
fn validate_dictionary(dictionary: &ApiDictionary) -> Result<(), SearchError> {
    for api in &dictionary.apis {
        api.name.display_name()?;
        validate_signature(&api.signature)?;
    }
    for abbreviation in &dictionary.type_abbreviations {
        abbreviation.abbreviated.validate()?;
        abbreviation.original.validate()?;
    }
    Ok(())
}

fn validate_signature(signature: &ApiSignature) -> Result<(), SearchError> {
    let validate_parameters = |groups: &Vec<Vec<crate::models::Parameter>>| {
        groups
            .iter()
            .flatten()
            .try_for_each(|p| p.low_type.validate())
    };
    match signature {
        ApiSignature::ModuleValue(t) => t.validate(),
        ApiSignature::ModuleFunction(f) | ApiSignature::ActivePattern { function: f, .. } => {
            validate_parameters(&f.parameters)?;
            f.return_parameter.low_type.validate()
        }
        ApiSignature::InstanceMember {
            declaring_type,
            member,
        }
        | ApiSignature::StaticMember {
            declaring_type,
            member,
        }
        | ApiSignature::Constructor {
            declaring_type,
            member,
        } => {
            declaring_type.validate()?;
            validate_parameters(&member.parameters)?;
            member.return_parameter.low_type.validate()
        }
        ApiSignature::ExtensionMember(member) => {
            validate_parameters(&member.parameters)?;
            member.return_parameter.low_type.validate()
        }
        ApiSignature::TypeExtension(extension) => {
            extension.existing_type.validate()?;
            validate_parameters(&extension.member.parameters)?;
            extension.member.return_parameter.low_type.validate()
        }
        ApiSignature::UnionCase(case) => {
            case.declaring_type.validate()?;
            case.fields.iter().try_for_each(|f| f.low_type.validate())
        }
        ApiSignature::ComputationExpressionBuilder(builder) => {
            builder.builder_type.validate()?;
            builder
                .computation_expression_types
                .iter()
                .try_for_each(LowType::validate)
        }
        ApiSignature::ModuleDefinition(_)
        | ApiSignature::FullTypeDefinition(_)
        | ApiSignature::TypeAbbreviation(_) => Ok(()),
    }
}

/// Validate an in-memory dictionary the way loading would.
pub fn validate(dictionary: &ApiDictionary) -> Result<(), SearchError> {
    validate_dictionary(dictionary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiName, NameItem};
    use tempfile::tempdir;

    fn dictionary() -> ApiDictionary {
        ApiDictionary {
            assembly_name: "core".to_string(),
            apis: vec![Api {
                name: ApiName::Display(vec![NameItem::symbol("x")]),
                signature: ApiSignature::ModuleValue(LowType::ident("int")),
                type_constraints: Vec::new(),
                document: None,
            }],
            type_definitions: Vec::new(),
            type_abbreviations: Vec::new(),
        }
    }

    #[test]
    fn dictionaries_round_trip_through_json() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("core.json");
        let original = dictionary();

        save_dictionary(&original, &path).expect("save");
        let loaded = load_dictionary(&path).expect("load");
        assert_eq!(loaded, original);
    }

    #[test]
    fn loading_rejects_unresolved_names() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("core.json");
        let mut broken = dictionary();
        broken.apis[0].name = ApiName::Loading {
            raw: "x".to_string(),
        };
        save_dictionary(&broken, &path).expect("save");

        let err = load_dictionary(&path).expect_err("contract violation");
        assert!(err.to_string().contains("invalid dictionary"));
    }

    #[test]
    fn loading_rejects_malformed_types() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("core.json");
        let mut broken = dictionary();
        broken.apis[0].signature =
            ApiSignature::ModuleValue(LowType::Arrow(vec![LowType::ident("int")]));
        save_dictionary(&broken, &path).expect("save");

        assert!(load_dictionary(&path).is_err());
    }

    #[test]
    fn missing_files_error_with_the_path() {
        let err = load_dictionary("definitely/missing.json").expect_err("missing file");
        assert!(err.to_string().contains("missing.json"));
    }
}
