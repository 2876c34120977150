use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitecturePlan {
    pub project_name: String,
    pub overview: String,
    pub components: Vec<String>,
    pub tech_stack: Vec<String>,
    pub timeline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeFile {
    pub path: String,
    pub content: String,
    pub language: String,
    pub timestamp: i64,
}
