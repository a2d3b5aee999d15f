//! Abstract syntax tree for query-shape documents.

use std::collections::BTreeMap;
use std::fmt;

/// Variables supplied with an operation.
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// Source location of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Kind of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

/// A parsed operation: the declared query shape of a view or a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub variables: Vec<VariableDef>,
    pub selection: SelectionSet,
    pub span: Span,
}

impl Operation {
    pub fn is_mutation(&self) -> bool {
        self.kind == OperationKind::Mutation
    }

    /// Merge declared defaults under the supplied variables.
    pub fn with_defaults(&self, supplied: &Variables) -> Variables {
        let mut merged = supplied.clone();
        for def in &self.variables {
            if merged.contains_key(&def.name) {
                continue;
            }
            if let Some(default) = &def.default {
                merged.insert(def.name.clone(), default.resolve(supplied));
            }
        }
        merged
    }

    /// Declared non-null variables without a default that are absent from `supplied`.
    pub fn missing_variables<'a>(&'a self, supplied: &'a Variables) -> impl Iterator<Item = &'a str> + 'a {
        self.variables
            .iter()
            .filter(|def| def.type_ref.is_non_null() && def.default.is_none())
            .filter(move |def| supplied.get(&def.name).map_or(true, serde_json::Value::is_null))
            .map(|def| def.name.as_str())
    }
}

/// `$name: Type = default`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name: String,
    pub type_ref: TypeRef,
    pub default: Option<ArgValue>,
}

/// A declared variable type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// An ordered list of fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionSet {
    pub fields: Vec<Field>,
}

impl SelectionSet {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields whose directives include them under `variables`, in document order.
    pub fn included<'a>(&'a self, variables: &'a Variables) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.is_included(variables))
    }
}

/// A field selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<Argument>,
    pub directives: Vec<Directive>,
    /// Present for link fields.
    pub selection: Option<SelectionSet>,
    pub span: Span,
}

impl Field {
    /// A plain scalar field with no arguments.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            directives: Vec::new(),
            selection: None,
            span: Span::default(),
        }
    }

    /// A link field with a sub-selection.
    pub fn link(name: impl Into<String>, selection: SelectionSet) -> Self {
        Self {
            selection: Some(selection),
            ..Self::scalar(name)
        }
    }

    /// Key under which the field appears in responses and resolved data.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_link(&self) -> bool {
        self.selection.is_some()
    }

    /// Key under which the field is stored in a record.
    ///
    /// Arguments are resolved against `variables` and object keys are sorted
    /// at every depth, so the same logical field shares one slot regardless
    /// of how it was written.
    pub fn storage_key(&self, variables: &Variables) -> String {
        if self.arguments.is_empty() {
            return self.name.clone();
        }
        let args = self
            .arguments
            .iter()
            .map(|arg| (arg.name.clone(), arg.value.resolve(variables)))
            .collect();
        format!("{}({})", self.name, canonical(serde_json::Value::Object(args)))
    }

    /// Evaluate `@include(if:)` / `@skip(if:)`.
    pub fn is_included(&self, variables: &Variables) -> bool {
        self.directives.iter().all(|directive| {
            let condition = directive
                .argument("if")
                .map(|v| v.resolve(variables))
                .and_then(|v| v.as_bool());
            match directive.name.as_str() {
                "include" => condition.unwrap_or(false),
                "skip" => !condition.unwrap_or(false),
                _ => true,
            }
        })
    }

    /// Variables referenced by this field's arguments and directives.
    pub fn variable_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        for arg in self.arguments.iter().chain(self.directives.iter().flat_map(|d| &d.arguments)) {
            arg.value.collect_variables(&mut refs);
        }
        refs
    }
}

/// `name: value`
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: ArgValue,
}

/// `@name(args)`
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<Argument>,
}

impl Directive {
    pub fn argument(&self, name: &str) -> Option<&ArgValue> {
        self.arguments.iter().find(|a| a.name == name).map(|a| &a.value)
    }
}

/// An argument or default value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Variable(String),
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    List(Vec<ArgValue>),
    Object(Vec<(String, ArgValue)>),
}

impl ArgValue {
    /// Resolve to JSON; an unsupplied variable resolves to null.
    pub fn resolve(&self, variables: &Variables) -> serde_json::Value {
        match self {
            ArgValue::Variable(name) => variables.get(name).cloned().unwrap_or(serde_json::Value::Null),
            ArgValue::Null => serde_json::Value::Null,
            ArgValue::Bool(b) => serde_json::Value::Bool(*b),
            ArgValue::Int(i) => serde_json::Value::from(*i),
            ArgValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ArgValue::String(s) | ArgValue::Enum(s) => serde_json::Value::String(s.clone()),
            ArgValue::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.resolve(variables)).collect())
            }
            ArgValue::Object(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.resolve(variables)))
                    .collect(),
            ),
        }
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ArgValue::Variable(name) => out.push(name),
            ArgValue::List(items) => items.iter().for_each(|v| v.collect_variables(out)),
            ArgValue::Object(entries) => entries.iter().for_each(|(_, v)| v.collect_variables(out)),
            _ => {}
        }
    }
}

/// Rebuild `value` with object keys in sorted order.
fn canonical(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: BTreeMap<String, serde_json::Value> =
                map.into_iter().map(|(key, value)| (key, canonical(value))).collect();
            serde_json::Value::Object(sorted.into_iter().collect())
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(items.into_iter().map(canonical).collect()),
        leaf => leaf,
    }
}
