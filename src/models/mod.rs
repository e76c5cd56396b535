//! Shared data models for the signature search engine.
//!
//! These types describe the catalog side of a search: names and
//! identities, the `LowType` type language the matcher unifies over,
//! members and constraints, API signatures, and the immutable
//! per-assembly `ApiDictionary`. The query-side types and search
//! options live in [`query`].
//!
//! Everything here derives `Serialize`/`Deserialize`; the JSON form of
//! `ApiDictionary` is the stable on-disk catalog format written by the
//! loader and read back by the `catalog` module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod query;

pub use query::{
    ActivePatternQuery, ActivePatternSignature, ByNameItem, ComputationExpressionQuery, Mode,
    NameMatchMethod, OptionStatus, Query, QueryMethod, SearchOptions, SignaturePart,
};

/// Structured failures raised by the core.
///
/// Match failures are *values* ([`crate::search::MatchingResult::Failure`])
/// and never surface here; this type covers data-contract violations and
/// query-text rejection, both of which abort the search that hit them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// A `Loading` name reached the matcher. The loader must resolve
    /// every name to a display name before a dictionary is searched.
    #[error("unresolved loading name reached the matcher: {name}")]
    UnresolvedName { name: String },
    /// A structurally invalid type was found in a catalog or query
    /// (arity-1 arrow, arity-1 tuple, generic with no arguments).
    #[error("malformed type: {detail}")]
    MalformedType { detail: String },
    /// The query text could not be parsed.
    #[error("cannot parse query `{query}`: {detail}")]
    ParseError { query: String, detail: String },
}

/// A type variable of the signature language.
///
/// `is_solve_at_compile_time` marks the statically resolved variable
/// family (written `^a` in query syntax). Two variables are equal only
/// when both the name and the flag agree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeVariable {
    pub name: String,
    pub is_solve_at_compile_time: bool,
}

impl TypeVariable {
    pub fn new(name: impl Into<String>) -> Self {
        TypeVariable {
            name: name.into(),
            is_solve_at_compile_time: false,
        }
    }
}

/// One segment of a display name.
///
/// Plain symbols carry just their displayed form; operators and
/// compiled-name symbols also carry the compiled form the metadata
/// uses. Structural equality distinguishes the variants; the matcher
/// compares by displayed form and falls back to compiled forms under
/// its own rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NamePart {
    Symbol(String),
    Operator { display: String, compiled: String },
    WithCompiledName { display: String, compiled: String },
}

impl NamePart {
    pub fn display(&self) -> &str {
        match self {
            NamePart::Symbol(s) => s,
            NamePart::Operator { display, .. } => display,
            NamePart::WithCompiledName { display, .. } => display,
        }
    }

    /// The compiled form when the variant carries one.
    pub fn compiled(&self) -> Option<&str> {
        match self {
            NamePart::Symbol(_) => None,
            NamePart::Operator { compiled, .. } => Some(compiled),
            NamePart::WithCompiledName { compiled, .. } => Some(compiled),
        }
    }
}

/// A display-name segment together with the generic parameters
/// declared at that segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NameItem {
    pub part: NamePart,
    pub generic_parameters: Vec<TypeVariable>,
}

impl NameItem {
    pub fn symbol(name: impl Into<String>) -> Self {
        NameItem {
            part: NamePart::Symbol(name.into()),
            generic_parameters: Vec::new(),
        }
    }
}

/// An ordered sequence of name segments, stored innermost-first: the
/// item itself is the head, enclosing modules/namespaces follow, and
/// the last element is the outermost scope.
pub type DisplayName = Vec<NameItem>;

/// Join a display name into dotted outermost-first text.
pub fn display_name_string(name: &DisplayName) -> String {
    let mut parts: Vec<&str> = name.iter().map(|item| item.part.display()).collect();
    parts.reverse();
    parts.join(".")
}

/// The name attached to an API entry.
///
/// Loaders produce `Loading` names while reading metadata and must
/// resolve every one of them before handing a dictionary to the
/// search engine; a `Loading` name observed by the matcher is a
/// contract violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiName {
    Loading { raw: String },
    Display(DisplayName),
}

impl ApiName {
    pub fn display(name: DisplayName) -> Self {
        ApiName::Display(name)
    }

    /// The resolved display name, or the fatal contract error.
    pub fn display_name(&self) -> Result<&DisplayName, SearchError> {
        match self {
            ApiName::Display(name) => Ok(name),
            ApiName::Loading { raw } => Err(SearchError::UnresolvedName { name: raw.clone() }),
        }
    }
}

/// An assembly-qualified type reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FullIdentity {
    pub assembly_name: String,
    pub name: DisplayName,
    pub generic_parameter_count: usize,
}

/// An unqualified type reference: only the innermost segments the
/// user wrote. Matching treats the missing enclosing scope as a
/// tail wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartialIdentity {
    pub name: DisplayName,
    pub generic_parameter_count: usize,
}

/// A reference to a named type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Identity {
    Full(FullIdentity),
    Partial(PartialIdentity),
}

impl Identity {
    pub fn name(&self) -> &DisplayName {
        match self {
            Identity::Full(f) => &f.name,
            Identity::Partial(p) => &p.name,
        }
    }

    pub fn generic_parameter_count(&self) -> usize {
        match self {
            Identity::Full(f) => f.generic_parameter_count,
            Identity::Partial(p) => p.generic_parameter_count,
        }
    }
}

/// Which side of a search a variable came from. Query and target
/// variables never alias by name; they are only related through the
/// equation store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VariableSource {
    Query,
    Target,
}

/// The type language the matcher unifies over.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LowType {
    /// Matches anything. The optional tag correlates holes: two
    /// wildcards with the same tag must resolve to the same type.
    Wildcard(Option<String>),
    Variable(VariableSource, TypeVariable),
    Identity(Box<Identity>),
    /// Curried function type; always at least two elements, the last
    /// of which is the return type.
    Arrow(Vec<LowType>),
    /// Ordered tuple; always at least two elements.
    Tuple {
        elements: Vec<LowType>,
        is_struct: bool,
    },
    /// Applied type constructor; always at least one argument.
    Generic(Box<LowType>, Vec<LowType>),
    /// Keeps both the abbreviated and the resolved form of a type
    /// abbreviation; `original` is never itself an abbreviation.
    TypeAbbreviation {
        abbreviation: Box<LowType>,
        original: Box<LowType>,
    },
    /// A callable with a nominal wrapper type and its signature types.
    Delegate(Box<LowType>, Vec<LowType>),
    /// Disjunction; matches when any alternative matches.
    Choice(Vec<LowType>),
}

impl LowType {
    /// A partial identity reference with the given dotted segments,
    /// innermost first.
    pub fn ident_of(segments: &[&str], generic_parameter_count: usize) -> LowType {
        let name = segments.iter().map(|s| NameItem::symbol(*s)).collect();
        LowType::Identity(Box::new(Identity::Partial(PartialIdentity {
            name,
            generic_parameter_count,
        })))
    }

    /// A single-segment partial identity with no generic parameters.
    pub fn ident(name: &str) -> LowType {
        LowType::ident_of(&[name], 0)
    }

    pub fn variable(source: VariableSource, name: &str) -> LowType {
        LowType::Variable(source, TypeVariable::new(name))
    }

    pub fn arrow(elements: Vec<LowType>) -> LowType {
        LowType::Arrow(elements)
    }

    pub fn tuple(elements: Vec<LowType>) -> LowType {
        LowType::Tuple {
            elements,
            is_struct: false,
        }
    }

    pub fn generic(ctor: LowType, args: Vec<LowType>) -> LowType {
        LowType::Generic(Box::new(ctor), args)
    }

    pub fn abbreviation(abbreviation: LowType, original: LowType) -> LowType {
        LowType::TypeAbbreviation {
            abbreviation: Box::new(abbreviation),
            original: Box::new(original),
        }
    }

    /// Replace every variable that has a mapping, leaving everything
    /// else untouched. Sources are ignored: instantiation happens
    /// before a type ever meets the matcher.
    pub fn substitute(&self, map: &[(TypeVariable, LowType)]) -> LowType {
        let subst = |t: &LowType| t.substitute(map);
        match self {
            LowType::Variable(_, var) => map
                .iter()
                .find(|(candidate, _)| candidate == var)
                .map(|(_, replacement)| replacement.clone())
                .unwrap_or_else(|| self.clone()),
            LowType::Wildcard(_) | LowType::Identity(_) => self.clone(),
            LowType::Arrow(elements) => LowType::Arrow(elements.iter().map(subst).collect()),
            LowType::Tuple { elements, is_struct } => LowType::Tuple {
                elements: elements.iter().map(subst).collect(),
                is_struct: *is_struct,
            },
            LowType::Generic(ctor, args) => LowType::Generic(
                Box::new(ctor.substitute(map)),
                args.iter().map(subst).collect(),
            ),
            LowType::TypeAbbreviation {
                abbreviation,
                original,
            } => LowType::TypeAbbreviation {
                abbreviation: Box::new(abbreviation.substitute(map)),
                original: Box::new(original.substitute(map)),
            },
            LowType::Delegate(delegate_type, signature) => LowType::Delegate(
                Box::new(delegate_type.substitute(map)),
                signature.iter().map(subst).collect(),
            ),
            LowType::Choice(alternatives) => {
                LowType::Choice(alternatives.iter().map(subst).collect())
            }
        }
    }

    /// Enforce the structural invariants of the type language: arrows
    /// and tuples carry at least two elements, generics at least one
    /// argument, and abbreviation originals are not abbreviations.
    pub fn validate(&self) -> Result<(), SearchError> {
        let malformed = |detail: String| Err(SearchError::MalformedType { detail });
        match self {
            LowType::Wildcard(_) | LowType::Variable(..) | LowType::Identity(_) => Ok(()),
            LowType::Arrow(elements) => {
                if elements.len() < 2 {
                    return malformed(format!("arrow of arity {}", elements.len()));
                }
                elements.iter().try_for_each(LowType::validate)
            }
            LowType::Tuple { elements, .. } => {
                if elements.len() < 2 {
                    return malformed(format!("tuple of arity {}", elements.len()));
                }
                elements.iter().try_for_each(LowType::validate)
            }
            LowType::Generic(ctor, args) => {
                if args.is_empty() {
                    return malformed("generic application with no arguments".to_string());
                }
                ctor.validate()?;
                args.iter().try_for_each(LowType::validate)
            }
            LowType::TypeAbbreviation {
                abbreviation,
                original,
            } => {
                if matches!(original.as_ref(), LowType::TypeAbbreviation { .. }) {
                    return malformed(
                        "abbreviation original is itself an abbreviation".to_string(),
                    );
                }
                abbreviation.validate()?;
                original.validate()
            }
            LowType::Delegate(delegate_type, signature) => {
                delegate_type.validate()?;
                signature.iter().try_for_each(LowType::validate)
            }
            LowType::Choice(alternatives) => {
                if alternatives.is_empty() {
                    return malformed("empty choice".to_string());
                }
                alternatives.iter().try_for_each(LowType::validate)
            }
        }
    }
}

/// A function or member parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub low_type: LowType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
}

impl Parameter {
    pub fn of(low_type: LowType) -> Self {
        Parameter {
            low_type,
            name: None,
            is_optional: false,
        }
    }

    pub fn optional(low_type: LowType) -> Self {
        Parameter {
            low_type,
            name: None,
            is_optional: true,
        }
    }
}

/// Curried-then-tupled parameter shape: the outer list holds arrow
/// segments, each inner list the tuple components of that segment. A
/// singleton inner list is a plain, non-tupled argument.
pub type ParameterGroups = Vec<Vec<Parameter>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Get,
    Set,
    GetSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    Method,
    Property(PropertyKind),
    Field,
}

/// A member of a type: method, property, or field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    #[serde(default)]
    pub generic_parameters: Vec<TypeVariable>,
    #[serde(default)]
    pub parameters: ParameterGroups,
    pub return_parameter: Parameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberModifier {
    Static,
    Instance,
}

/// A single constraint body; the variables it applies to live on
/// [`TypeConstraint`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    Subtype(LowType),
    Nullable,
    HasMember {
        modifier: MemberModifier,
        member: Box<Member>,
    },
    DefaultConstructor,
    ValueType,
    ReferenceType,
    Enumeration,
    Delegate,
    Unmanaged,
    Equality,
    Comparison,
}

/// A set of variables and the constraint that jointly applies to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeConstraint {
    pub variables: Vec<TypeVariable>,
    pub constraint: Constraint,
}

/// Precomputed resolution of a constraint against a type definition.
///
/// `Dependence` defers the answer to the constraint resolution of the
/// named generic parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintStatus {
    Satisfy,
    NotSatisfy,
    Dependence(Vec<TypeVariable>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accessibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDefinitionKind {
    Class,
    Interface,
    Type,
    Union,
    Record,
    Enumeration,
}

/// A fully loaded type definition, with the transitive interface set
/// and the six precomputed constraint-status flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullTypeDefinition {
    pub name: DisplayName,
    pub assembly_name: String,
    pub accessibility: Accessibility,
    pub kind: TypeDefinitionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<LowType>,
    #[serde(default)]
    pub all_interfaces: Vec<LowType>,
    #[serde(default)]
    pub generic_parameters: Vec<TypeVariable>,
    #[serde(default)]
    pub type_constraints: Vec<TypeConstraint>,
    #[serde(default)]
    pub instance_members: Vec<Member>,
    #[serde(default)]
    pub static_members: Vec<Member>,
    #[serde(default)]
    pub implicit_instance_members: Vec<Member>,
    #[serde(default)]
    pub implicit_static_members: Vec<Member>,
    pub support_null: ConstraintStatus,
    pub reference_type: ConstraintStatus,
    pub value_type: ConstraintStatus,
    pub default_constructor: ConstraintStatus,
    pub equality: ConstraintStatus,
    pub comparison: ConstraintStatus,
}

impl FullTypeDefinition {
    /// The identity this definition answers lookups for.
    pub fn identity(&self) -> Identity {
        Identity::Full(FullIdentity {
            assembly_name: self.assembly_name.clone(),
            name: self.name.clone(),
            generic_parameter_count: self.generic_parameters.len(),
        })
    }
}

/// A type abbreviation definition: the alias form and the resolved
/// form it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAbbreviationDefinition {
    pub name: DisplayName,
    pub assembly_name: String,
    pub accessibility: Accessibility,
    #[serde(default)]
    pub generic_parameters: Vec<TypeVariable>,
    pub abbreviated: LowType,
    pub original: LowType,
}

/// A module-level function shape: parameter groups plus the return
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub parameters: ParameterGroups,
    pub return_parameter: Parameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivePatternKind {
    Full,
    Partial,
}

/// A computation-expression builder: its own type, the expression
/// types it builds, and the syntactic forms it implements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationExpressionBuilder {
    pub builder_type: LowType,
    pub computation_expression_types: Vec<LowType>,
    pub syntaxes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub name: DisplayName,
    pub accessibility: Accessibility,
}

/// A member added to an existing type from elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeExtension {
    pub existing_type: LowType,
    pub declaration: DisplayName,
    pub member_modifier: MemberModifier,
    pub member: Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionCaseField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub low_type: LowType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionCase {
    pub declaring_type: LowType,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<UnionCaseField>,
}

/// One variant per API shape the catalog can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiSignature {
    ModuleValue(LowType),
    ModuleFunction(FunctionSignature),
    ActivePattern {
        kind: ActivePatternKind,
        function: FunctionSignature,
    },
    InstanceMember {
        declaring_type: LowType,
        member: Member,
    },
    StaticMember {
        declaring_type: LowType,
        member: Member,
    },
    Constructor {
        declaring_type: LowType,
        member: Member,
    },
    ModuleDefinition(ModuleDefinition),
    FullTypeDefinition(FullTypeDefinition),
    TypeAbbreviation(TypeAbbreviationDefinition),
    TypeExtension(TypeExtension),
    ExtensionMember(Member),
    UnionCase(UnionCase),
    ComputationExpressionBuilder(ComputationExpressionBuilder),
}

impl ApiSignature {
    /// Short label for display rows.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ApiSignature::ModuleValue(_) => "module value",
            ApiSignature::ModuleFunction(_) => "module function",
            ApiSignature::ActivePattern { .. } => "active pattern",
            ApiSignature::InstanceMember { .. } => "instance member",
            ApiSignature::StaticMember { .. } => "static member",
            ApiSignature::Constructor { .. } => "constructor",
            ApiSignature::ModuleDefinition(_) => "module",
            ApiSignature::FullTypeDefinition(_) => "type",
            ApiSignature::TypeAbbreviation(_) => "type abbreviation",
            ApiSignature::TypeExtension(_) => "type extension",
            ApiSignature::ExtensionMember(_) => "extension member",
            ApiSignature::UnionCase(_) => "union case",
            ApiSignature::ComputationExpressionBuilder(_) => "builder",
        }
    }
}

/// A single named catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
    pub name: ApiName,
    pub signature: ApiSignature,
    #[serde(default)]
    pub type_constraints: Vec<TypeConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

/// The immutable in-memory index of one assembly's APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDictionary {
    pub assembly_name: String,
    pub apis: Vec<Api>,
    #[serde(default)]
    pub type_definitions: Vec<FullTypeDefinition>,
    #[serde(default)]
    pub type_abbreviations: Vec<TypeAbbreviationDefinition>,
}

impl ApiDictionary {
    /// Look up a type definition by display-name tail and arity.
    ///
    /// `name` is innermost-first, as everywhere else; a shorter query
    /// name matches the innermost segments of a definition.
    pub fn find_type_definition(
        &self,
        name: &DisplayName,
        generic_parameter_count: usize,
    ) -> Option<&FullTypeDefinition> {
        self.type_definitions.iter().find(|td| {
            td.generic_parameters.len() == generic_parameter_count
                && name_tail_matches(name, &td.name)
        })
    }

    pub fn find_type_abbreviation(
        &self,
        name: &DisplayName,
        generic_parameter_count: usize,
    ) -> Option<&TypeAbbreviationDefinition> {
        self.type_abbreviations.iter().find(|ta| {
            ta.generic_parameters.len() == generic_parameter_count
                && name_tail_matches(name, &ta.name)
        })
    }
}

/// Whether `query` (innermost-first) matches the innermost portion of
/// `full` by displayed form.
fn name_tail_matches(query: &DisplayName, full: &DisplayName) -> bool {
    if query.len() > full.len() {
        return false;
    }
    query
        .iter()
        .zip(full.iter())
        .all(|(q, f)| q.part.display() == f.part.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_parts_expose_display_and_compiled_forms() {
        let plain = NamePart::Symbol("map".to_string());
        assert_eq!(plain.display(), "map");
        assert_eq!(plain.compiled(), None);

        let op = NamePart::Operator {
            display: "+".to_string(),
            compiled: "op_Addition".to_string(),
        };
        assert_eq!(op.display(), "+");
        assert_eq!(op.compiled(), Some("op_Addition"));
    }

    #[test]
    fn display_name_string_prints_outermost_first() {
        let name = vec![NameItem::symbol("map"), NameItem::symbol("Seq")];
        assert_eq!(display_name_string(&name), "Seq.map");
    }

    #[test]
    fn loading_name_is_a_contract_violation() {
        let name = ApiName::Loading {
            raw: "Ns.Type`1".to_string(),
        };
        let err = name.display_name().expect_err("loading name must fail");
        assert!(matches!(err, SearchError::UnresolvedName { .. }));
    }

    #[test]
    fn validate_rejects_arity_one_arrow() {
        let bad = LowType::Arrow(vec![LowType::ident("int")]);
        let err = bad.validate().expect_err("arity-1 arrow must be rejected");
        assert!(matches!(err, SearchError::MalformedType { .. }));
    }

    #[test]
    fn validate_rejects_nested_malformed_types() {
        let bad = LowType::generic(
            LowType::ident_of(&["list"], 1),
            vec![LowType::Tuple {
                elements: vec![LowType::ident("int")],
                is_struct: false,
            }],
        );
        assert!(bad.validate().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_signature() {
        let t = LowType::arrow(vec![
            LowType::generic(
                LowType::ident_of(&["seq"], 1),
                vec![LowType::variable(VariableSource::Query, "a")],
            ),
            LowType::variable(VariableSource::Query, "a"),
        ]);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn dictionary_lookups_match_innermost_tail_and_arity() {
        let td = FullTypeDefinition {
            name: vec![NameItem::symbol("Map"), NameItem::symbol("Collections")],
            assembly_name: "core".to_string(),
            accessibility: Accessibility::Public,
            kind: TypeDefinitionKind::Class,
            base_type: None,
            all_interfaces: Vec::new(),
            generic_parameters: vec![TypeVariable::new("k"), TypeVariable::new("v")],
            type_constraints: Vec::new(),
            instance_members: Vec::new(),
            static_members: Vec::new(),
            implicit_instance_members: Vec::new(),
            implicit_static_members: Vec::new(),
            support_null: ConstraintStatus::NotSatisfy,
            reference_type: ConstraintStatus::Satisfy,
            value_type: ConstraintStatus::NotSatisfy,
            default_constructor: ConstraintStatus::NotSatisfy,
            equality: ConstraintStatus::Dependence(vec![
                TypeVariable::new("k"),
                TypeVariable::new("v"),
            ]),
            comparison: ConstraintStatus::NotSatisfy,
        };
        let dict = ApiDictionary {
            assembly_name: "core".to_string(),
            apis: Vec::new(),
            type_definitions: vec![td],
            type_abbreviations: Vec::new(),
        };

        let query = vec![NameItem::symbol("Map")];
        assert!(dict.find_type_definition(&query, 2).is_some());
        assert!(dict.find_type_definition(&query, 1).is_none());
    }
}
