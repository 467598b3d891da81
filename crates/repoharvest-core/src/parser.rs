// Turns one raw search response into records plus the next cursor
use repoharvest_api::types::{RepositoryNode, SearchResponse};
use serde_json::Value;
use tracing::warn;

use crate::models::RepositoryRecord;

/// One parsed page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub records: Vec<RepositoryRecord>,
    /// `None` when the page is the last one we can reach with this cursor
    pub next_cursor: Option<String>,
}

impl SearchPage {
    /// Raw record count, before any dedup or filtering
    pub fn raw_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest star count on the page
    pub fn max_stars(&self) -> Option<u64> {
        self.records.iter().map(|r| r.stars).max()
    }
}

/// Parse a GraphQL search response
///
/// Missing data of any kind yields an empty page with no cursor, which the
/// controller reads as "done". A page whose start and end cursors are equal
/// also gets no cursor: past ~1000 results GitHub keeps handing back the same
/// cursor instead of moving on.
pub fn parse_search_page(response: Option<&Value>) -> SearchPage {
    let Some(response) = response else {
        return SearchPage::default();
    };

    let parsed: SearchResponse = match serde_json::from_value(response.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Search response has an unexpected shape: {}", e);
            return SearchPage::default();
        }
    };

    let Some(search) = parsed.data.and_then(|d| d.search) else {
        return SearchPage::default();
    };

    let edges = search.edges.unwrap_or_default();
    if edges.is_empty() {
        return SearchPage::default();
    }

    let records = edges
        .into_iter()
        .map(|edge| node_to_record(edge.node))
        .collect();

    let next_cursor = search.page_info.and_then(|info| {
        match (info.start_cursor, info.end_cursor) {
            (Some(start), Some(end)) if start != end => Some(end),
            _ => None,
        }
    });

    SearchPage {
        records,
        next_cursor,
    }
}

/// Convert a GraphQL repository node to our record shape
fn node_to_record(node: RepositoryNode) -> RepositoryRecord {
    let topics = node.topic_names();
    let languages = node.language_names();

    RepositoryRecord {
        id: node.id,
        name: node.name,
        name_with_owner: node.name_with_owner,
        stars: node.stargazer_count,
        forks: node.fork_count,
        primary_language: node.primary_language.map(|l| l.name),
        languages,
        url: node.url,
        description: node.description,
        topics,
        readme: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str, stars: u64) -> Value {
        json!({
            "node": {
                "id": id,
                "name": format!("repo-{}", id),
                "nameWithOwner": format!("owner/repo-{}", id),
                "url": format!("https://github.com/owner/repo-{}", id),
                "stargazerCount": stars,
                "forkCount": 3,
                "description": "A repository",
                "repositoryTopics": {"nodes": [
                    {"topic": {"name": "rust", "stargazerCount": 100}},
                    {"topic": {"name": "cli", "stargazerCount": 50}}
                ]},
                "languages": {"nodes": [{"name": "Rust"}, {"name": "Shell"}]},
                "primaryLanguage": {"name": "Rust"}
            }
        })
    }

    fn page(start: &str, end: &str, edges: Vec<Value>) -> Value {
        json!({
            "data": {
                "search": {
                    "pageInfo": {"startCursor": start, "endCursor": end},
                    "edges": edges
                }
            }
        })
    }

    #[test]
    fn test_parses_records_and_cursor() {
        let raw = page("c1", "c2", vec![node("a", 120), node("b", 130)]);
        let parsed = parse_search_page(Some(&raw));

        assert_eq!(parsed.raw_count(), 2);
        assert_eq!(parsed.next_cursor.as_deref(), Some("c2"));
        assert_eq!(parsed.max_stars(), Some(130));

        let first = &parsed.records[0];
        assert_eq!(first.id, "a");
        assert_eq!(first.name_with_owner, "owner/repo-a");
        assert_eq!(first.topics, vec!["rust", "cli"]);
        assert_eq!(first.languages, vec!["Rust", "Shell"]);
        assert_eq!(first.primary_language.as_deref(), Some("Rust"));
        assert_eq!(first.forks, 3);
        assert!(first.readme.is_none());
    }

    #[test]
    fn test_equal_cursors_end_pagination() {
        let raw = page("same", "same", vec![node("a", 120), node("b", 130)]);
        let parsed = parse_search_page(Some(&raw));

        assert_eq!(parsed.raw_count(), 2);
        assert!(parsed.next_cursor.is_none());
    }

    #[test]
    fn test_zero_edges_is_empty() {
        let raw = page("c1", "c2", vec![]);
        let parsed = parse_search_page(Some(&raw));

        assert!(parsed.is_empty());
        assert!(parsed.next_cursor.is_none());
    }

    #[test]
    fn test_missing_pieces_are_empty() {
        assert!(parse_search_page(None).is_empty());
        assert!(parse_search_page(Some(&json!({}))).is_empty());
        assert!(parse_search_page(Some(&json!({"data": null}))).is_empty());
        assert!(parse_search_page(Some(&json!({"data": {"search": null}}))).is_empty());
        assert!(parse_search_page(Some(&json!({"data": {"search": {"edges": null}}}))).is_empty());
        assert!(parse_search_page(Some(&json!({"errors": [{"message": "boom"}]}))).is_empty());
    }

    #[test]
    fn test_malformed_node_is_empty() {
        let raw = page("c1", "c2", vec![json!({"node": {"id": "a"}})]);
        let parsed = parse_search_page(Some(&raw));
        assert!(parsed.is_empty());
        assert!(parsed.next_cursor.is_none());
    }

    #[test]
    fn test_null_primary_language_and_missing_lists() {
        let raw = page(
            "c1",
            "c2",
            vec![json!({"node": {
                "id": "x",
                "name": "x",
                "nameWithOwner": "o/x",
                "url": "https://github.com/o/x",
                "stargazerCount": 7,
                "forkCount": 0,
                "description": null,
                "repositoryTopics": {"nodes": []},
                "languages": {"nodes": []},
                "primaryLanguage": null
            }})],
        );
        let record = &parse_search_page(Some(&raw)).records[0];

        assert!(record.primary_language.is_none());
        assert!(record.languages.is_empty());
        assert!(!record.has_topics());
        assert!(record.description.is_none());
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let raw = page("c1", "c2", vec![node("a", 120), node("b", 130)]);
        assert_eq!(parse_search_page(Some(&raw)), parse_search_page(Some(&raw)));
    }
}
