//! GraphQL introspection type model.
//!
//! These types mirror the `__Schema`, `__Type`, `__Field`, `__InputValue`
//! and `__EnumValue` introspection objects. A [`Type`] is used both for
//! fully-resolved named types and for the shallow type references that
//! appear on fields and arguments.

mod index;

pub use index::SchemaIndex;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::de::null_as_default;

/// The kind of a GraphQL type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    #[default]
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

impl TypeKind {
    /// Returns true for the LIST and NON_NULL wrapper kinds.
    pub fn is_wrapper(&self) -> bool {
        matches!(self, TypeKind::List | TypeKind::NonNull)
    }

    /// The introspection name of the kind, e.g. `INPUT_OBJECT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Scalar => "SCALAR",
            TypeKind::Object => "OBJECT",
            TypeKind::Interface => "INTERFACE",
            TypeKind::Union => "UNION",
            TypeKind::Enum => "ENUM",
            TypeKind::InputObject => "INPUT_OBJECT",
            TypeKind::List => "LIST",
            TypeKind::NonNull => "NON_NULL",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the type graph.
///
/// Wrapper kinds carry their inner type in `of_type`; named kinds carry a
/// `name` and, once fully resolved, their own fields, input fields and enum
/// values. References to other named types are never followed here; they are
/// resolved by name through a [`SchemaIndex`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Type>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub possible_types: Vec<Type>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<EnumValue>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub input_fields: Vec<InputValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of_type: Option<Box<Type>>,
    #[serde(default, rename = "specifiedByURL", skip_serializing_if = "Option::is_none")]
    pub specified_by_url: Option<String>,
}

impl Type {
    /// Creates a bare reference to a named type.
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Wraps a type in NON_NULL.
    pub fn non_null(inner: Type) -> Self {
        Self {
            kind: TypeKind::NonNull,
            of_type: Some(Box::new(inner)),
            ..Default::default()
        }
    }

    /// Wraps a type in LIST.
    pub fn list(inner: Type) -> Self {
        Self {
            kind: TypeKind::List,
            of_type: Some(Box::new(inner)),
            ..Default::default()
        }
    }

    /// Sets the fields of this type.
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the input fields of this type.
    pub fn with_input_fields(mut self, input_fields: Vec<InputValue>) -> Self {
        self.input_fields = input_fields;
        self
    }

    /// Sets the enum values of this type.
    pub fn with_enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(EnumValue::new).collect();
        self
    }

    /// The type name, or an empty string for wrapper nodes.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Unwraps LIST and NON_NULL layers until a non-wrapper node is reached.
    ///
    /// A wrapper whose `of_type` was cut off by the introspection depth is
    /// returned as-is, so the result can still be a wrapper kind.
    pub fn base_type(&self) -> &Type {
        let mut current = self;
        while let Some(inner) = current.of_type.as_deref() {
            current = inner;
        }
        current
    }

    /// Returns true if this node is a LIST or NON_NULL wrapper.
    pub fn is_wrapper(&self) -> bool {
        self.kind.is_wrapper()
    }

    /// Returns true if the outermost layer is NON_NULL.
    pub fn is_required(&self) -> bool {
        self.kind == TypeKind::NonNull
    }

    /// Renders the type as it appears in a variable declaration,
    /// e.g. `String`, `String!`, `[String]!` or `[String!]!`.
    pub fn signature(&self) -> String {
        match (self.kind, self.of_type.as_deref()) {
            (TypeKind::NonNull, Some(inner)) => format!("{}!", inner.signature()),
            (TypeKind::List, Some(inner)) => format!("[{}]", inner.signature()),
            _ => self.name().to_string(),
        }
    }

    /// Returns true when every type reachable through this type's fields,
    /// arguments and input fields ends in a known base kind.
    ///
    /// Incomplete types come from introspection responses whose `ofType`
    /// chains were cut off before reaching a named type.
    pub fn is_complete(&self) -> bool {
        if self.base_type().is_wrapper() {
            return false;
        }

        self.fields.iter().all(Field::is_complete)
            && self.input_fields.iter().all(|input| input.ty.is_complete())
    }
}

/// A field of an OBJECT or INTERFACE type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub args: Vec<InputValue>,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_reason: Option<String>,
}

impl Field {
    /// Creates a field without arguments.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            ..Default::default()
        }
    }

    /// Appends an argument.
    pub fn with_arg(mut self, arg: InputValue) -> Self {
        self.args.push(arg);
        self
    }

    fn is_complete(&self) -> bool {
        self.ty.is_complete() && self.args.iter().all(|arg| arg.ty.is_complete())
    }
}

/// A field argument or an input-object field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl InputValue {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            ..Default::default()
        }
    }

    /// The variable declaration for this value, e.g. `$id: ID!`.
    pub fn variable_declaration(&self) -> String {
        format!("${}: {}", self.name, self.ty.signature())
    }
}

/// A value of an ENUM type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_reason: Option<String>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A directive definition. Carried along but not used by the crawler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directive {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub args: Vec<InputValue>,
    #[serde(default)]
    pub is_repeatable: bool,
}

/// Name-only reference to a root operation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootTypeRef {
    pub name: String,
}

/// The result of a `__schema` introspection query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub types: Vec<Type>,
    #[serde(default)]
    pub query_type: Option<RootTypeRef>,
    #[serde(default)]
    pub mutation_type: Option<RootTypeRef>,
    #[serde(default)]
    pub subscription_type: Option<RootTypeRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub directives: Vec<Directive>,
}

impl Schema {
    /// Finds a type by name.
    pub fn get_type(&self, name: &str) -> Option<&Type> {
        self.types.iter().find(|t| t.name() == name)
    }
}
