// GraphQL search query for repositories above a star threshold
use std::fmt;

/// GitHub's maximum page size for search
pub const PAGE_SIZE: u32 = 100;
/// How many topics / languages we ask for per repository
pub const NESTED_LIMIT: u32 = 50;

/// Where a search page starts
///
/// A cursor only means something together with the star threshold it was
/// issued under, so whoever changes the threshold must go back to `Start`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cursor {
    Start,
    After(String),
}

impl Cursor {
    pub fn is_start(&self) -> bool {
        matches!(self, Cursor::Start)
    }

    /// GraphQL literal for the `after:` argument
    pub fn to_graphql(&self) -> String {
        match self {
            Cursor::Start => "null".to_string(),
            // JSON string escaping produces a valid GraphQL string literal
            Cursor::After(cursor) => {
                serde_json::to_string(cursor).unwrap_or_else(|_| format!("\"{}\"", cursor))
            }
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Start => write!(f, "start"),
            Cursor::After(cursor) => write!(f, "{}", cursor),
        }
    }
}

/// Search qualifier: everything strictly above `min_stars`, fewest stars first
pub fn search_filter(min_stars: u64) -> String {
    format!("stars:>{} sort:stars-asc", min_stars)
}

/// Build the repository search query for one page
pub fn search_query(min_stars: u64, cursor: &Cursor) -> String {
    format!(
        r#"query {{
  search(query: "{filter}", type: REPOSITORY, first: {page_size}, after: {after}) {{
    pageInfo {{
      startCursor
      endCursor
    }}
    edges {{
      node {{
        ... on Repository {{
          id
          name
          nameWithOwner
          url
          stargazerCount
          forkCount
          description
          repositoryTopics(first: {nested}) {{
            nodes {{
              topic {{
                name
                stargazerCount
              }}
            }}
          }}
          languages(first: {nested}) {{
            nodes {{
              name
            }}
          }}
          primaryLanguage {{
            name
          }}
        }}
      }}
    }}
  }}
}}"#,
        filter = search_filter(min_stars),
        page_size = PAGE_SIZE,
        after = cursor.to_graphql(),
        nested = NESTED_LIMIT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_query() {
        let query = search_query(500, &Cursor::Start);
        assert!(query.contains(r#"search(query: "stars:>500 sort:stars-asc""#));
        assert!(query.contains("type: REPOSITORY, first: 100, after: null)"));
        assert!(query.contains("repositoryTopics(first: 50)"));
        assert!(query.contains("languages(first: 50)"));
        assert!(query.contains("nameWithOwner"));
        assert!(query.contains("startCursor"));
    }

    #[test]
    fn test_cursor_is_quoted() {
        let query = search_query(100, &Cursor::After("Y3Vyc29yOjEwMA==".to_string()));
        assert!(query.contains(r#"after: "Y3Vyc29yOjEwMA==")"#));
    }

    #[test]
    fn test_cursor_quotes_are_escaped() {
        let cursor = Cursor::After(r#"we"ird"#.to_string());
        assert_eq!(cursor.to_graphql(), r#""we\"ird""#);
    }

    #[test]
    fn test_query_is_deterministic() {
        let cursor = Cursor::After("abc".to_string());
        assert_eq!(search_query(42, &cursor), search_query(42, &cursor));
        assert_ne!(search_query(42, &cursor), search_query(43, &cursor));
    }
}
