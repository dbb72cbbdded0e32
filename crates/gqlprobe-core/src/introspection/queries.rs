//! Introspection query text.
//!
//! GraphQL has no recursive selection, so the `ofType` chain of the
//! `TypeRef` fragment is spelled out to a fixed depth. The placeholder
//! `__OF_TYPE__` marks where that chain is inserted.

const OF_TYPE_PLACEHOLDER: &str = "__OF_TYPE__";

const FRAGMENTS: &str = r#"
fragment FullType on __Type {
    kind
    name
    description
    fields(includeDeprecated: true) {
        name
        description
        args {
            ...InputValue
        }
        type {
            ...TypeRef
        }
        isDeprecated
        deprecationReason
    }
    inputFields {
        ...InputValue
    }
    interfaces {
        ...TypeRef
    }
    enumValues(includeDeprecated: true) {
        name
        description
        isDeprecated
        deprecationReason
    }
    possibleTypes {
        ...TypeRef
    }
}

fragment InputValue on __InputValue {
    name
    description
    type { ...TypeRef }
    defaultValue
}

fragment TypeRef on __Type {
    kind
    name
    __OF_TYPE__
}
"#;

const TYPE_QUERY: &str = r#"
query TypeQuery($name: String!) {
    __type(name: $name) {
        ...FullType
    }
}
"#;

const SCHEMA_QUERY: &str = r#"
query IntrospectionQuery {
    __schema {
        description
        queryType { name }
        mutationType { name }
        subscriptionType { name }
        types {
            ...FullType
        }
        directives {
            name
            description
            locations
            args {
                ...InputValue
            }
        }
    }
}
"#;

/// Builds the nested `ofType` selection, `depth` levels deep.
pub fn of_type_selection(depth: usize) -> String {
    if depth == 0 {
        return String::new();
    }

    let inner = of_type_selection(depth - 1);
    if inner.is_empty() {
        "ofType { name kind }".to_string()
    } else {
        format!("ofType {{ name kind {} }}", inner)
    }
}

/// The `__type(name: $name)` query with `ofType` repeated `depth` times.
pub fn type_query(depth: usize) -> String {
    with_fragments(TYPE_QUERY, depth)
}

/// The `__schema` query with `ofType` repeated `depth` times.
pub fn schema_query(depth: usize) -> String {
    with_fragments(SCHEMA_QUERY, depth)
}

fn with_fragments(operation: &str, depth: usize) -> String {
    let fragments = FRAGMENTS.replace(OF_TYPE_PLACEHOLDER, &of_type_selection(depth));
    format!("{}{}", operation.trim_end(), fragments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_type_selection_depth() {
        assert_eq!(of_type_selection(0), "");
        assert_eq!(of_type_selection(1), "ofType { name kind }");
        assert_eq!(of_type_selection(4).matches("ofType").count(), 4);
    }

    #[test]
    fn test_type_query_uses_variable() {
        let query = type_query(2);
        assert!(query.contains("__type(name: $name)"));
        assert!(query.contains("fragment TypeRef on __Type"));
        assert_eq!(query.matches("ofType").count(), 2);
        assert!(!query.contains(OF_TYPE_PLACEHOLDER));
    }

    #[test]
    fn test_schema_query() {
        let query = schema_query(4);
        assert!(query.contains("__schema"));
        assert!(query.contains("queryType { name }"));
        assert_eq!(query.matches("ofType").count(), 4);
    }
}
