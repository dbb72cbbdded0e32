use std::collections::HashMap;

use tracing::warn;

use super::{Field, Schema, Type};

const DEFAULT_QUERY_TYPE: &str = "Query";
const DEFAULT_MUTATION_TYPE: &str = "Mutation";
const DEFAULT_SUBSCRIPTION_TYPE: &str = "Subscription";

/// Synthetic root field added by Apollo Federation subgraphs.
const FEDERATION_SERVICE_FIELD: &str = "_service";

/// Read-only lookup structures over a resolved [`Schema`].
///
/// Field and argument types only carry name and kind, so every descent into
/// a referenced type goes through [`SchemaIndex::lookup`].
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    types: HashMap<String, Type>,
    queries: Vec<Field>,
    mutations: Vec<Field>,
    has_subscriptions: bool,
    federated: bool,
}

impl SchemaIndex {
    /// Builds the index, consuming the schema.
    pub fn new(schema: Schema) -> Self {
        let query_name = root_name(&schema.query_type, DEFAULT_QUERY_TYPE);
        let mutation_name = root_name(&schema.mutation_type, DEFAULT_MUTATION_TYPE);
        let subscription_name = root_name(&schema.subscription_type, DEFAULT_SUBSCRIPTION_TYPE);

        let federated = is_federated(&schema);

        let queries = schema
            .get_type(&query_name)
            .map(|t| {
                t.fields
                    .iter()
                    .filter(|f| !(federated && f.name == FEDERATION_SERVICE_FIELD))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mutations = schema
            .get_type(&mutation_name)
            .map(|t| t.fields.clone())
            .unwrap_or_default();

        let has_subscriptions = schema.get_type(&subscription_name).is_some();
        if has_subscriptions {
            warn!("Schema contains subscriptions, these are not supported");
        }

        let types = schema
            .types
            .into_iter()
            .filter_map(|t| t.name.clone().map(|name| (name, t)))
            .collect();

        Self {
            types,
            queries,
            mutations,
            has_subscriptions,
            federated,
        }
    }

    /// Looks up a named type.
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    /// Resolves the full definition of a reference's base type.
    pub fn resolve(&self, type_ref: &Type) -> Option<&Type> {
        self.lookup(type_ref.base_type().name())
    }

    /// Root query fields in schema order.
    pub fn queries(&self) -> &[Field] {
        &self.queries
    }

    /// Root mutation fields in schema order.
    pub fn mutations(&self) -> &[Field] {
        &self.mutations
    }

    pub fn query(&self, name: &str) -> Option<&Field> {
        self.queries.iter().find(|f| f.name == name)
    }

    pub fn mutation(&self, name: &str) -> Option<&Field> {
        self.mutations.iter().find(|f| f.name == name)
    }

    /// Number of named types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn has_subscriptions(&self) -> bool {
        self.has_subscriptions
    }

    /// Returns true if the schema looks like a federation subgraph.
    pub fn is_federated(&self) -> bool {
        self.federated
    }
}

fn root_name(root: &Option<super::RootTypeRef>, fallback: &str) -> String {
    root.as_ref()
        .map(|r| r.name.clone())
        .unwrap_or_else(|| fallback.to_string())
}

fn is_federated(schema: &Schema) -> bool {
    schema.get_type("_Service").is_some()
        || schema
            .directives
            .iter()
            .any(|d| matches!(d.name.as_str(), "key" | "extends" | "external"))
}
