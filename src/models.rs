use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt;

/// Ordered mapping from section label (e.g. "Entity", "Controller") to
/// generated source text. Key order follows the model's output, so the
/// first section is a meaningful default tab.
pub type CodeSections = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Boolean,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "String",
            FieldType::Integer => "Integer",
            FieldType::Boolean => "Boolean",
        };
        write!(f, "{name}")
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(rename = "isRequired", default)]
    pub is_required: bool,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Database {
    #[default]
    #[serde(rename = "Mongo DB")]
    MongoDb,
    #[serde(rename = "Postgre SQL")]
    PostgreSql,
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Database::MongoDb => "Mongo DB",
            Database::PostgreSql => "Postgre SQL",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationRequest {
    pub entity: String,
    pub fields: Vec<FieldSpec>,
    pub database: Database,
    // Raw string: unrecognized values must reach the handler for its 400.
    pub language: String,
    #[serde(default)]
    pub stream: bool,
}
