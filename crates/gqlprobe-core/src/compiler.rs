//! Request text compilation.
//!
//! A request has the shape `<kind> (<variable>){\n<field>\n}` where only the
//! first argument is declared and the selection set asks for every required
//! leaf of the returned object.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::schema::{Field, SchemaIndex, Type, TypeKind};

const TYPENAME: &str = "__typename";

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Unhandled return type {kind} in field {field}")]
    UnsupportedReturnType { field: String, kind: TypeKind },

    #[error("Type {0} not found in schema")]
    UnknownType(String),
}

/// The root operation a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Query,
    Mutation,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Query => "query",
            RequestKind::Mutation => "mutation",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds request text for root fields.
pub struct RequestCompiler<'a> {
    index: &'a SchemaIndex,
}

impl<'a> RequestCompiler<'a> {
    pub fn new(index: &'a SchemaIndex) -> Self {
        Self { index }
    }

    /// Compiles a full request for a root field.
    pub fn compile(&self, field: &Field, kind: RequestKind) -> Result<String, CompileError> {
        let input = field
            .args
            .first()
            .map(|arg| format!(" ({})", arg.variable_declaration()))
            .unwrap_or_default();

        Ok(format!("{}{}{{\n{}\n}}", kind, input, self.compile_field(field)?))
    }

    /// Compiles the field call: name, first argument and selection set.
    pub fn compile_field(&self, field: &Field) -> Result<String, CompileError> {
        let base = field.ty.base_type();

        let body = match base.kind {
            TypeKind::Scalar | TypeKind::Enum => String::new(),
            TypeKind::Object => {
                let full = self.lookup(base)?;
                let lines = self.compile_type(full)?;
                format!("{{\n{}\n}}", lines.join("\n"))
            }
            kind => {
                return Err(CompileError::UnsupportedReturnType {
                    field: field.name.clone(),
                    kind,
                })
            }
        };

        let input = field
            .args
            .first()
            .map(|arg| format!(" ({}: ${})", arg.name, arg.name))
            .unwrap_or_default();

        Ok(format!("{}{}{}", field.name, input, body))
    }

    /// Compiles the selection set lines for an object type.
    ///
    /// Only required fields are selected. Object fields open a block and
    /// recurse; a type already on the current path only selects
    /// `__typename`. Returns `["__typename"]` when nothing qualifies.
    pub fn compile_type(&self, ty: &Type) -> Result<Vec<String>, CompileError> {
        let mut path = Vec::new();
        self.compile_type_inner(ty, &mut path)
    }

    fn compile_type_inner<'t>(
        &'t self,
        ty: &'t Type,
        path: &mut Vec<&'t str>,
    ) -> Result<Vec<String>, CompileError> {
        let mut lines = Vec::new();

        if !ty.is_wrapper() {
            path.push(ty.name());

            for field in &ty.fields {
                if !field.ty.is_required() {
                    continue;
                }

                let base = field.ty.base_type();
                match base.kind {
                    TypeKind::Scalar | TypeKind::Enum => lines.push(field.name.clone()),
                    TypeKind::Object => {
                        lines.push(format!("{} {{", field.name));
                        if path.contains(&base.name()) {
                            lines.push(TYPENAME.to_string());
                        } else {
                            let full = self.lookup(base)?;
                            lines.extend(self.compile_type_inner(full, path)?);
                        }
                        lines.push("}".to_string());
                    }
                    kind => {
                        warn!(field = %field.name, %kind, "Skipping field with unhandled type");
                    }
                }
            }

            path.pop();
        }

        if lines.is_empty() {
            lines.push(TYPENAME.to_string());
        }

        Ok(lines)
    }

    fn lookup(&self, reference: &Type) -> Result<&'a Type, CompileError> {
        self.index
            .lookup(reference.name())
            .ok_or_else(|| CompileError::UnknownType(reference.name().to_string()))
    }
}
