use crate::models::{CONTENT_VECTOR_FIELD, TITLE_VECTOR_FIELD};
use crate::SearchError;
use serde::Serialize;

pub const VECTOR_PROFILE: &str = "vector-profile";
pub const HNSW_CONFIG: &str = "hnsw-vector-config";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
    pub vector_search: VectorSearchSettings,
    pub semantic: SemanticSettings,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub key: bool,
    pub searchable: bool,
    pub filterable: bool,
    pub sortable: bool,
    pub facetable: bool,
    pub retrievable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_search_profile: Option<String>,
}

impl FieldSchema {
    fn string(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: "Edm.String".to_string(),
            key: false,
            searchable: false,
            filterable: false,
            sortable: false,
            facetable: false,
            retrievable: true,
            dimensions: None,
            vector_search_profile: None,
        }
    }

    fn vector(name: &str, dimensions: usize) -> Self {
        Self {
            name: name.to_string(),
            field_type: "Collection(Edm.Single)".to_string(),
            searchable: true,
            dimensions: Some(dimensions),
            vector_search_profile: Some(VECTOR_PROFILE.to_string()),
            ..Self::string(name)
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchSettings {
    pub algorithms: Vec<HnswAlgorithm>,
    pub profiles: Vec<VectorProfile>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HnswAlgorithm {
    pub name: String,
    pub kind: String,
    pub hnsw_parameters: HnswParameters,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HnswParameters {
    pub m: u32,
    pub ef_construction: u32,
    pub ef_search: u32,
    pub metric: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VectorProfile {
    pub name: String,
    pub algorithm: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SemanticSettings {
    pub configurations: Vec<SemanticConfiguration>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SemanticConfiguration {
    pub name: String,
    pub prioritized_fields: PrioritizedFields,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedFields {
    pub title_field: Option<SemanticField>,
    pub prioritized_content_fields: Vec<SemanticField>,
    pub prioritized_keywords_fields: Vec<SemanticField>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SemanticField {
    pub field_name: String,
}

impl IndexSchema {
    /// The document layout ingested and searched by this crate: `id` key,
    /// searchable `title`/`content`, facetable metadata, and two cosine HNSW
    /// vector fields of `dimensions` each.
    pub fn default_for(
        name: impl Into<String>,
        dimensions: usize,
        semantic_config: impl Into<String>,
    ) -> Self {
        let title = FieldSchema {
            searchable: true,
            sortable: true,
            filterable: true,
            facetable: true,
            ..FieldSchema::string("title")
        };
        let content = FieldSchema {
            searchable: true,
            ..FieldSchema::string("content")
        };
        let facet = |name: &str| FieldSchema {
            filterable: true,
            facetable: true,
            ..FieldSchema::string(name)
        };

        Self {
            name: name.into(),
            fields: vec![
                FieldSchema {
                    key: true,
                    filterable: true,
                    ..FieldSchema::string("id")
                },
                title,
                content,
                facet("category"),
                FieldSchema::string("sourceUrl"),
                facet("sourceName"),
                FieldSchema::vector(TITLE_VECTOR_FIELD, dimensions),
                FieldSchema::vector(CONTENT_VECTOR_FIELD, dimensions),
            ],
            vector_search: VectorSearchSettings {
                algorithms: vec![HnswAlgorithm {
                    name: HNSW_CONFIG.to_string(),
                    kind: "hnsw".to_string(),
                    hnsw_parameters: HnswParameters {
                        m: 4,
                        ef_construction: 400,
                        ef_search: 500,
                        metric: "cosine".to_string(),
                    },
                }],
                profiles: vec![VectorProfile {
                    name: VECTOR_PROFILE.to_string(),
                    algorithm: HNSW_CONFIG.to_string(),
                }],
            },
            semantic: SemanticSettings {
                configurations: vec![SemanticConfiguration {
                    name: semantic_config.into(),
                    prioritized_fields: PrioritizedFields {
                        title_field: Some(SemanticField {
                            field_name: "title".to_string(),
                        }),
                        prioritized_content_fields: vec![SemanticField {
                            field_name: "content".to_string(),
                        }],
                        prioritized_keywords_fields: Vec::new(),
                    },
                }],
            },
        }
    }

    pub fn vector_dimensions(&self, field: &str) -> Option<usize> {
        self.fields
            .iter()
            .find(|candidate| candidate.name == field)
            .and_then(|candidate| candidate.dimensions)
    }

    pub fn has_semantic_configuration(&self, name: &str) -> bool {
        self.semantic
            .configurations
            .iter()
            .any(|configuration| configuration.name == name)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        let keys = self.fields.iter().filter(|field| field.key).collect::<Vec<_>>();
        match keys.as_slice() {
            [key] if key.name == "id" => {}
            _ => {
                return Err(SearchError::Request(format!(
                    "index {} must declare `id` as its only key field",
                    self.name
                )))
            }
        }

        let title = self.vector_dimensions(TITLE_VECTOR_FIELD);
        let content = self.vector_dimensions(CONTENT_VECTOR_FIELD);
        match (title, content) {
            (Some(title), Some(content)) if title == content && title > 0 => Ok(()),
            (Some(title), Some(content)) => Err(SearchError::DimensionMismatch {
                expected: content,
                actual: title,
            }),
            _ => Err(SearchError::Request(format!(
                "index {} must declare both {TITLE_VECTOR_FIELD} and {CONTENT_VECTOR_FIELD}",
                self.name
            ))),
        }
    }
}
