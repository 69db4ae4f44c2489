//! Paginated catalog responses and query parameters.

use serde::Deserialize;

use super::null_as_default;

/// Default page size used by the catalog grid.
pub const DEFAULT_PAGE_SIZE: u32 = 8;

/// A Spring Data page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(deserialize_with = "null_as_default")]
    pub content: Vec<T>,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default = "default_true")]
    pub last: bool,
}

const fn default_true() -> bool {
    true
}

impl<T> Page<T> {
    /// Whether another page can be requested.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        !self.last
    }
}

/// Catalog listing filters for `GET /products`.
///
/// The backend applies `category` in preference to `keyword` when both are
/// set, so only one filter is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u32,
    pub size: u32,
    pub category: Option<String>,
    pub keyword: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            category: None,
            keyword: None,
        }
    }
}

impl ProductQuery {
    /// First page of a category listing.
    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// First page of a keyword search.
    #[must_use]
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Self::default()
        }
    }

    /// The same filters on the following page.
    #[must_use]
    pub fn next_page(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }

    /// Query-string pairs in the order the backend expects them.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        let category = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let keyword = self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty());
        if let Some(category) = category {
            pairs.push(("category", category.to_string()));
        } else if let Some(keyword) = keyword {
            pairs.push(("keyword", keyword.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_spring_page() {
        let page: Page<u32> = serde_json::from_value(json!({
            "content": [1, 2, 3],
            "pageable": {"pageNumber": 0},
            "number": 0,
            "size": 8,
            "totalElements": 11,
            "totalPages": 2,
            "first": true,
            "last": false,
            "empty": false
        }))
        .unwrap();
        assert_eq!(page.content, vec![1, 2, 3]);
        assert_eq!(page.total_elements, 11);
        assert!(page.has_more());
    }

    fn parse_page<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Page<T> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_deserialize_product_page() {
        let page: Page<crate::models::Product> = parse_page(json!({
            "content": [{
                "id": 3, "name": "Aero 14", "description": "Thin", "brand": "Acme",
                "price": 74999, "category": "Laptop",
                "productAvailable": true, "stockQuantity": 2
            }],
            "number": 0,
            "totalElements": 1,
            "totalPages": 1,
            "last": true
        }));
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].stock_quantity, 2);
        assert!(!page.has_more());
    }

    #[test]
    fn test_missing_last_means_no_more() {
        let page: Page<u32> = serde_json::from_value(json!({"content": null})).unwrap();
        assert!(page.content.is_empty());
        assert!(!page.has_more());
    }

    #[test]
    fn test_query_pairs_prefer_category() {
        let query = ProductQuery {
            category: Some("Laptop".to_string()),
            keyword: Some("thin".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page", "0".to_string()),
                ("size", "8".to_string()),
                ("category", "Laptop".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_skip_blank_filters() {
        let query = ProductQuery {
            category: Some("  ".to_string()),
            keyword: Some(" phone ".to_string()),
            ..ProductQuery::default()
        };
        let pairs = query.next_page().to_pairs();
        assert_eq!(pairs.first(), Some(&("page", "1".to_string())));
        assert_eq!(pairs.last(), Some(&("keyword", "phone".to_string())));
    }
}
