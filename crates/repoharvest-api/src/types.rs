// Wire types for the GraphQL repository search response
//
// Everything above the repository node is optional: a half-empty response
// is GitHub's way of saying "nothing more", not a reason to crash.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<SearchData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub search: Option<SearchConnection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConnection {
    #[serde(default)]
    pub page_info: Option<PageInfo>,
    #[serde(default)]
    pub edges: Option<Vec<SearchEdge>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEdge {
    pub node: RepositoryNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub id: String,
    pub name: String,
    pub name_with_owner: String,
    pub url: String,
    pub stargazer_count: u64,
    pub fork_count: u64,
    pub description: Option<String>,
    #[serde(default)]
    pub repository_topics: Option<NodeList<RepositoryTopic>>,
    #[serde(default)]
    pub languages: Option<NodeList<Language>>,
    #[serde(default)]
    pub primary_language: Option<Language>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeList<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryTopic {
    pub topic: Topic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub stargazer_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
}

impl RepositoryNode {
    pub fn topic_names(&self) -> Vec<String> {
        self.repository_topics
            .as_ref()
            .map(|t| t.nodes.iter().map(|n| n.topic.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn language_names(&self) -> Vec<String> {
        self.languages
            .as_ref()
            .map(|l| l.nodes.iter().map(|n| n.name.clone()).collect())
            .unwrap_or_default()
    }
}
