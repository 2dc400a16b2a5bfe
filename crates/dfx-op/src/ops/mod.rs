//! Built-in operators.

pub mod slide_dot;

use crate::schema::OpSchema;

/// Schemas of every built-in operator, in registration order.
pub(crate) fn builtin_schemas() -> Vec<OpSchema> {
    vec![slide_dot::schema()]
}
