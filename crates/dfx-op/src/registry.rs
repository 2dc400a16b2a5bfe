//! Process-wide operator registry.
//!
//! The registry is built exactly once, on first access, from the built-in
//! operator list and is read-only afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::debug;

use crate::error::{OpError, Result};
use crate::ops;
use crate::schema::OpSchema;

/// Maps operator names (and their aliases) to schemas.
#[derive(Debug)]
pub struct OpRegistry {
    schemas: HashMap<&'static str, OpSchema>,
    aliases: HashMap<&'static str, &'static str>,
}

static GLOBAL_REGISTRY: OnceLock<OpRegistry> = OnceLock::new();

impl OpRegistry {
    fn from_schemas(schemas: Vec<OpSchema>) -> Self {
        let mut registry = OpRegistry {
            schemas: HashMap::new(),
            aliases: HashMap::new(),
        };
        for schema in schemas {
            registry.register(schema);
        }
        registry
    }

    /// # Panics
    /// Panics if the name or one of the aliases is already taken.
    fn register(&mut self, schema: OpSchema) {
        let name = schema.name;
        assert!(
            !self.contains(name),
            "operator '{}' registered twice",
            name
        );
        for alias in schema.aliases {
            assert!(
                !self.contains(alias) && *alias != name,
                "alias '{}' of '{}' is already registered",
                alias,
                name
            );
            self.aliases.insert(*alias, name);
        }
        debug!(op = name, aliases = ?schema.aliases, "registered operator");
        self.schemas.insert(name, schema);
    }

    fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name) || self.aliases.contains_key(name)
    }

    /// The registry of built-in operators.
    pub fn global() -> &'static OpRegistry {
        GLOBAL_REGISTRY.get_or_init(|| {
            let registry = OpRegistry::from_schemas(ops::builtin_schemas());
            debug!(count = registry.len(), "operator registry initialized");
            registry
        })
    }

    /// Look up an operator by name or alias.
    pub fn get(&self, name: &str) -> Option<&OpSchema> {
        let canonical = self.aliases.get(name).copied().unwrap_or(name);
        self.schemas.get(canonical)
    }

    /// Like [`get`](Self::get), failing with `UnknownOperator`.
    pub fn lookup(&self, name: &str) -> Result<&OpSchema> {
        self.get(name)
            .ok_or_else(|| OpError::UnknownOperator(name.to_string()))
    }

    /// Canonical operator names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
