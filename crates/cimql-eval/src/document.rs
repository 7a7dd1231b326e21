//! JSON query and schema documents
//!
//! A query document names the FROM class, the select list and a structured
//! WHERE tree. A schema document carries class definitions and any instances
//! that references in candidates may point at.

use crate::context::SchemaContext;
use crate::select::SelectStatement;
use cimql_ast::Predicate;
use cimql_diagnostics::{CIMQL0401, QueryError};
use cimql_types::{ChainedIdentifier, ClassDef, CqlValue, Instance};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

fn from_json<T: DeserializeOwned>(text: &str, what: &str) -> Result<T, QueryError> {
    serde_json::from_str(text)
        .map_err(|e| QueryError::system(CIMQL0401, format!("Invalid {}: {}", what, e)))
}

/// An explicit value for `class.property#'constant'`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantBinding {
    pub class: String,
    pub property: String,
    pub constant: String,
    pub value: CqlValue,
}

/// A query as loaded from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDocument {
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub select: Vec<ChainedIdentifier>,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<ConstantBinding>,
}

impl QueryDocument {
    pub fn from_json(text: &str) -> Result<Self, QueryError> {
        from_json(text, "query document")
    }

    /// The unbound statement this document describes
    pub fn statement(&self) -> SelectStatement {
        let mut statement = SelectStatement::new(&self.from).with_select(self.select.iter().cloned());
        if let Some(alias) = &self.alias {
            statement = statement.with_alias(alias);
        }
        if let Some(predicate) = &self.where_clause {
            statement = statement.with_where(predicate.clone());
        }
        statement
    }

    /// A context for this query over `schema`
    pub fn context(&self, schema: SchemaDocument) -> SchemaContext {
        let mut builder = SchemaContext::builder()
            .classes(schema.classes)
            .instances(schema.instances)
            .from_class(&self.from);
        if let Some(alias) = &self.alias {
            builder = builder.from_alias(alias);
        }
        if let Some(namespace) = &self.namespace {
            builder = builder.namespace(namespace);
        }
        for binding in &self.constants {
            builder = builder.constant(
                &binding.class,
                &binding.property,
                &binding.constant,
                binding.value.clone(),
            );
        }
        builder.build()
    }
}

/// Class definitions and referenced instances
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl SchemaDocument {
    pub fn from_json(text: &str) -> Result<Self, QueryError> {
        from_json(text, "schema document")
    }
}

/// Parse a JSON array of candidate instances
pub fn instances_from_json(text: &str) -> Result<Vec<Instance>, QueryError> {
    from_json(text, "instance list")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::QueryContext;
    use cimql_diagnostics::ErrorKind;

    const QUERY: &str = r#"{
        "from": "CIM_Disk",
        "alias": "d",
        "select": ["d.Name", "Status"],
        "where": {
            "body": {
                "kind": "Simple",
                "predicate": {
                    "left": { "terms": [{ "factors": [{ "kind": { "kind": "Value", "node": { "type": "Identifier", "value": "d.Status" } } }] }] },
                    "op": "Eq",
                    "right": { "terms": [{ "factors": [{ "kind": { "kind": "Value", "node": { "type": "Uint64", "value": 2 } } }] }] }
                }
            }
        },
        "constants": [
            { "class": "CIM_Disk", "property": "Status", "constant": "OK", "value": { "type": "Uint64", "value": 2 } }
        ]
    }"#;

    #[test]
    fn test_query_document() {
        let document = QueryDocument::from_json(QUERY).unwrap();
        let statement = document.statement();
        assert_eq!(
            statement.to_string(),
            "SELECT d.Name, Status FROM CIM_Disk AS d WHERE d.Status = 2"
        );

        let ctx = document.context(SchemaDocument::default());
        assert_eq!(ctx.from_alias(), Some("d"));
        assert_eq!(
            ctx.symbolic_constant("CIM_Disk", "Status", "ok").unwrap(),
            CqlValue::Uint64(2)
        );
    }

    #[test]
    fn test_invalid_document_is_system_error() {
        let err = QueryDocument::from_json("{ \"select\": [] }").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::System);
        assert_eq!(err.code(), CIMQL0401);
    }
}
