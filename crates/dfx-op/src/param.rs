//! Operator parameters: declaration, validation and documentation.
//!
//! Every operator declares its tunable fields with a [`ParamDescriptor`].
//! A node's raw [`Attrs`] record is validated against that descriptor and
//! then turned into the operator's typed parameter struct, carried on the
//! node as an [`OpParams`] variant.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{OpError, Result};
use crate::ops::slide_dot::SlideDotParam;

/// Raw key/value attributes attached to a node instance.
pub type Attrs = BTreeMap<String, String>;

/// Value type of a declared parameter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Float,
    Bool,
    Str,
    /// A tuple of non-negative integers, written `(2, 3)` or `[2, 3]`.
    Shape,
}

impl ParamType {
    /// Check that `value` parses as this type.
    fn check(&self, value: &str) -> std::result::Result<(), String> {
        let value = value.trim();
        match self {
            ParamType::Int => value
                .parse::<i64>()
                .map(|_| ())
                .map_err(|e| format!("expected int, got '{}' ({})", value, e)),
            ParamType::Float => value
                .parse::<f64>()
                .map(|_| ())
                .map_err(|e| format!("expected float, got '{}' ({})", value, e)),
            ParamType::Bool => match value {
                "true" | "True" | "1" | "false" | "False" | "0" => Ok(()),
                _ => Err(format!("expected boolean, got '{}'", value)),
            },
            ParamType::Str => Ok(()),
            ParamType::Shape => parse_shape_tuple(value).map(|_| ()),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Int => write!(f, "int"),
            ParamType::Float => write!(f, "float"),
            ParamType::Bool => write!(f, "boolean"),
            ParamType::Str => write!(f, "string"),
            ParamType::Shape => write!(f, "Shape(tuple)"),
        }
    }
}

/// Parse a shape tuple such as `(2, 3)`, `[4]` or `()`.
pub fn parse_shape_tuple(value: &str) -> std::result::Result<Vec<usize>, String> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .or_else(|| trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')))
        .ok_or_else(|| format!("expected shape tuple, got '{}'", value))?;

    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| format!("invalid dimension '{}' in shape '{}'", s, value))
        })
        .collect()
}

/// One declared parameter field.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamField {
    pub name: String,
    pub ty: ParamType,
    /// Default value in attribute-string form; `None` means required.
    pub default: Option<String>,
    pub doc: String,
}

/// The full set of fields an operator accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    name: String,
    fields: Vec<ParamField>,
}

impl ParamDescriptor {
    /// Start building a descriptor for the parameter struct `name`.
    pub fn builder(name: impl Into<String>) -> ParamDescriptorBuilder {
        ParamDescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ParamField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate `attrs` and return them with defaults filled in.
    ///
    /// Fails on keys that are not declared fields, on values that do not
    /// parse as the declared type, and on required fields that are absent.
    pub fn parse(&self, attrs: &Attrs) -> Result<Attrs> {
        for (key, value) in attrs {
            let field = self.field(key).ok_or_else(|| OpError::InvalidParam {
                key: key.clone(),
                reason: format!("not a field of {}", self.name),
            })?;
            field
                .ty
                .check(value)
                .map_err(|reason| OpError::InvalidParam {
                    key: key.clone(),
                    reason,
                })?;
        }

        let mut resolved = attrs.clone();
        for field in &self.fields {
            if resolved.contains_key(&field.name) {
                continue;
            }
            match &field.default {
                Some(default) => {
                    resolved.insert(field.name.clone(), default.clone());
                }
                None => return Err(OpError::MissingParam(field.name.clone())),
            }
        }
        Ok(resolved)
    }

    /// Render documentation lines for every field, one block per field.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for field in &self.fields {
            match &field.default {
                Some(default) => out.push_str(&format!(
                    "{} : {}, optional, default={}\n",
                    field.name, field.ty, default
                )),
                None => out.push_str(&format!("{} : {}, required\n", field.name, field.ty)),
            }
            out.push_str(&format!("    {}\n", field.doc));
        }
        out
    }
}

/// Plain builder for [`ParamDescriptor`].
#[derive(Debug)]
pub struct ParamDescriptorBuilder {
    name: String,
    fields: Vec<ParamField>,
}

impl ParamDescriptorBuilder {
    /// Declare a field. A `default` of `None` makes the field required.
    pub fn field(
        mut self,
        name: impl Into<String>,
        ty: ParamType,
        default: Option<&str>,
        doc: impl Into<String>,
    ) -> Self {
        self.fields.push(ParamField {
            name: name.into(),
            ty,
            default: default.map(str::to_string),
            doc: doc.into(),
        });
        self
    }

    pub fn build(self) -> ParamDescriptor {
        ParamDescriptor {
            name: self.name,
            fields: self.fields,
        }
    }
}

/// Parsed, typed parameters of a node, one variant per operator.
#[derive(Debug, Clone, PartialEq)]
pub enum OpParams {
    SlideDot(SlideDotParam),
}
