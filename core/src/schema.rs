//! Declared field sets for entities.
//!
//! Every entity lists the fields it knows, their JSON kind, and whether they
//! may be sent on create or update. Checks run before a request is built, so
//! an invalid record never reaches the server.

use std::fmt;

use chrono::DateTime;
use serde_json::{Map, Value};
use thiserror::Error;

/// JSON object of field name to value, as sent to or received from the API.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    /// RFC 3339 timestamp string.
    Timestamp,
    StringList,
    /// Structured value kept verbatim.
    Json,
}

impl FieldKind {
    /// `null` is accepted for every kind.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (FieldKind::Json, _) => true,
            (FieldKind::String, Value::String(_)) => true,
            (FieldKind::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (FieldKind::Number, Value::Number(_)) => true,
            (FieldKind::Boolean, Value::Bool(_)) => true,
            (FieldKind::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s).is_ok(),
            (FieldKind::StringList, Value::Array(items)) => items.iter().all(Value::is_string),
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "RFC 3339 timestamp",
            FieldKind::StringList => "list of strings",
            FieldKind::Json => "JSON value",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub on_create: bool,
    pub on_update: bool,
}

impl FieldSpec {
    /// Server-managed field.
    pub const fn read_only(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            on_create: false,
            on_update: false,
        }
    }

    /// Settable when creating, fixed afterwards.
    pub const fn create_only(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            on_create: true,
            on_update: false,
        }
    }

    pub const fn mutable(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            on_create: true,
            on_update: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Unknown(String),
    NotCreatable(String),
    NotUpdatable(String),
    WrongType { field: String, expected: FieldKind },
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Unknown(field) => write!(f, "unknown field `{field}`"),
            FieldProblem::NotCreatable(field) => write!(f, "`{field}` cannot be set on create"),
            FieldProblem::NotUpdatable(field) => write!(f, "`{field}` cannot be updated"),
            FieldProblem::WrongType { field, expected } => {
                write!(f, "`{field}` must be a {expected}")
            }
        }
    }
}

/// Every offending field of one record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid fields for {entity}: {}", join_problems(.problems))]
pub struct ValidationError {
    pub entity: &'static str,
    pub problems: Vec<FieldProblem>,
}

impl ValidationError {
    /// Names of the offending fields, in record order.
    pub fn fields(&self) -> Vec<&str> {
        self.problems
            .iter()
            .map(|p| match p {
                FieldProblem::Unknown(f)
                | FieldProblem::NotCreatable(f)
                | FieldProblem::NotUpdatable(f)
                | FieldProblem::WrongType { field: f, .. } => f.as_str(),
            })
            .collect()
    }
}

fn join_problems(problems: &[FieldProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Read,
    Create,
    Update,
}

/// The declared fields of one entity.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub entity: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All keys must be declared.
    pub fn check_known(&self, fields: &Fields) -> Result<(), ValidationError> {
        self.check(fields, Operation::Read)
    }

    /// Keys must be declared, creatable and of the declared kind.
    pub fn check_create(&self, fields: &Fields) -> Result<(), ValidationError> {
        self.check(fields, Operation::Create)
    }

    /// Keys must be declared, updatable and of the declared kind.
    pub fn check_update(&self, fields: &Fields) -> Result<(), ValidationError> {
        self.check(fields, Operation::Update)
    }

    fn check(&self, fields: &Fields, op: Operation) -> Result<(), ValidationError> {
        let mut problems = Vec::new();
        for (name, value) in fields {
            let Some(spec) = self.field(name) else {
                problems.push(FieldProblem::Unknown(name.clone()));
                continue;
            };
            match op {
                Operation::Read => continue,
                Operation::Create if !spec.on_create => {
                    problems.push(FieldProblem::NotCreatable(name.clone()));
                    continue;
                }
                Operation::Update if !spec.on_update => {
                    problems.push(FieldProblem::NotUpdatable(name.clone()));
                    continue;
                }
                _ => {}
            }
            if !spec.kind.accepts(value) {
                problems.push(FieldProblem::WrongType {
                    field: name.clone(),
                    expected: spec.kind,
                });
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                entity: self.entity,
                problems,
            })
        }
    }
}
