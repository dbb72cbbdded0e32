//! Minimal test-data synthesis.
//!
//! Produces the smallest variable payload that makes a field callable:
//! only the first argument is considered, and only required (non-null)
//! input fields are populated. Placeholder values are fixed per scalar.

mod value;

pub use value::Value;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::schema::{Field, SchemaIndex, Type, TypeKind};

/// Errors raised when a value cannot be synthesized.
///
/// These are deliberate refusals: the crawler never guesses values for types
/// it does not understand.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Unhandled scalar type {0}")]
    UnknownScalar(String),

    #[error("Unsupported kind {kind} for input '{name}'")]
    UnsupportedKind { name: String, kind: TypeKind },

    #[error("Type {0} not found in schema")]
    UnknownType(String),

    #[error("Enum {0} has no values")]
    EmptyEnum(String),

    #[error("Input type {0} requires itself")]
    RecursiveInput(String),
}

/// How the custom `Time` scalar is filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimePolicy {
    /// The time at synthesis.
    #[default]
    Now,
    /// A fixed timestamp.
    Fixed(DateTime<Utc>),
}

impl TimePolicy {
    fn resolve(&self) -> DateTime<Utc> {
        match self {
            TimePolicy::Now => Utc::now(),
            TimePolicy::Fixed(ts) => *ts,
        }
    }
}

impl FromStr for TimePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("now") {
            return Ok(TimePolicy::Now);
        }

        DateTime::parse_from_rfc3339(s)
            .map(|ts| TimePolicy::Fixed(ts.with_timezone(&Utc)))
            .map_err(|e| format!("expected \"now\" or an RFC 3339 timestamp, got '{}': {}", s, e))
    }
}

/// Fabricates variables for a field from the schema index.
pub struct Synthesizer<'a> {
    index: &'a SchemaIndex,
    time: TimePolicy,
}

impl<'a> Synthesizer<'a> {
    pub fn new(index: &'a SchemaIndex) -> Self {
        Self {
            index,
            time: TimePolicy::default(),
        }
    }

    /// Sets how `Time` values are produced.
    pub fn with_time_policy(mut self, time: TimePolicy) -> Self {
        self.time = time;
        self
    }

    /// Synthesizes the variables object for `field`.
    ///
    /// Returns `None` when the field has no arguments or its first argument
    /// is nullable. Otherwise returns an object with exactly one entry keyed
    /// by the first argument's name.
    pub fn synthesize(&self, field: &Field) -> Result<Option<Value>, SynthesisError> {
        let Some(arg) = field.args.first() else {
            return Ok(None);
        };

        if !arg.ty.is_required() {
            return Ok(None);
        }

        let base = arg.ty.base_type();
        let value = match base.kind {
            // Top-level enum arguments receive every known value name.
            TypeKind::Enum => {
                let enum_type = self.lookup(base)?;
                Value::List(
                    enum_type
                        .enum_values
                        .iter()
                        .map(|v| Value::String(v.name.clone()))
                        .collect(),
                )
            }
            TypeKind::Scalar => self.scalar(base.name())?,
            TypeKind::InputObject => {
                let input_type = self.lookup(base)?;
                self.synthesize_input(input_type)?
            }
            kind => {
                return Err(SynthesisError::UnsupportedKind {
                    name: arg.name.clone(),
                    kind,
                })
            }
        };

        Ok(Some(Value::object([(arg.name.clone(), value)])))
    }

    /// Synthesizes an object value covering every required input field of
    /// an INPUT_OBJECT type.
    pub fn synthesize_input(&self, ty: &Type) -> Result<Value, SynthesisError> {
        let mut path = Vec::new();
        self.synthesize_input_inner(ty, &mut path)
    }

    fn synthesize_input_inner<'t>(
        &'t self,
        ty: &'t Type,
        path: &mut Vec<&'t str>,
    ) -> Result<Value, SynthesisError> {
        path.push(ty.name());

        let mut entries = Vec::new();
        for input in &ty.input_fields {
            if !input.ty.is_required() {
                continue;
            }

            let base = input.ty.base_type();
            let value = match base.kind {
                // Nested enum fields receive a single value.
                TypeKind::Enum => {
                    let enum_type = self.lookup(base)?;
                    let first = enum_type
                        .enum_values
                        .first()
                        .ok_or_else(|| SynthesisError::EmptyEnum(base.name().to_string()))?;
                    Value::String(first.name.clone())
                }
                TypeKind::Scalar => self.scalar(base.name())?,
                TypeKind::InputObject => {
                    if path.contains(&base.name()) {
                        return Err(SynthesisError::RecursiveInput(base.name().to_string()));
                    }
                    let input_type = self.lookup(base)?;
                    self.synthesize_input_inner(input_type, path)?
                }
                kind => {
                    return Err(SynthesisError::UnsupportedKind {
                        name: input.name.clone(),
                        kind,
                    })
                }
            };

            entries.push((input.name.clone(), value));
        }

        path.pop();
        Ok(Value::Object(entries))
    }

    fn scalar(&self, name: &str) -> Result<Value, SynthesisError> {
        let value = match name {
            "Boolean" => Value::Bool(true),
            "String" => Value::String("0".to_string()),
            "Int" => Value::Int(0),
            "Float" => Value::Float(0.0),
            "ID" => Value::String("0".to_string()),
            "Time" => Value::Timestamp(self.time.resolve()),
            other => return Err(SynthesisError::UnknownScalar(other.to_string())),
        };
        Ok(value)
    }

    fn lookup(&self, reference: &Type) -> Result<&'a Type, SynthesisError> {
        self.index
            .lookup(reference.name())
            .ok_or_else(|| SynthesisError::UnknownType(reference.name().to_string()))
    }
}
