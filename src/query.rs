use serde::{Deserialize, Serialize};

use crate::catalog::{parse_leading_float, Catalog, Title};
use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const SEARCH_LIMIT: usize = 10;

/// Field filters, all optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub genre: Option<String>,
    pub year: Option<String>,
    pub country: Option<String>,
    pub min_rating: Option<f64>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.genre.is_none()
            && self.year.is_none()
            && self.country.is_none()
            && self.min_rating.is_none()
    }

    pub fn matches(&self, item: &Title) -> bool {
        if let Some(genre) = &self.genre {
            if !contains_ignore_case(item.genre.as_deref(), genre) {
                return false;
            }
        }
        if let Some(year) = &self.year {
            match &item.year {
                Some(y) if y.loosely_equals(year) => {}
                _ => return false,
            }
        }
        if let Some(country) = &self.country {
            if !contains_ignore_case(item.country.as_deref(), country) {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            match item.rating_value() {
                Some(r) if r >= min => {}
                _ => return false,
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub text: Option<String>,
    pub filters: Filters,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            text: None,
            filters: Filters::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Raw listing query string, shared by the JSON API and the HTML index.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub q: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub country: Option<String>,
    pub rating: Option<String>,
}

impl ListParams {
    pub fn into_query(self) -> Result<ListQuery, ApiError> {
        let page = match non_empty(self.page) {
            Some(raw) => parse_count(&raw, "page")?.max(1),
            None => 1,
        };
        let page_size = match non_empty(self.limit) {
            Some(raw) => match parse_count(&raw, "limit")? {
                0 => DEFAULT_PAGE_SIZE,
                n => n,
            },
            None => DEFAULT_PAGE_SIZE,
        };
        let min_rating = match non_empty(self.rating) {
            Some(raw) => Some(
                parse_leading_float(&raw)
                    .ok_or_else(|| ApiError::bad_request("rating must be numeric"))?,
            ),
            None => None,
        };
        Ok(ListQuery {
            text: non_empty(self.q),
            filters: Filters {
                genre: non_empty(self.genre),
                year: non_empty(self.year),
                country: non_empty(self.country),
                min_rating,
            },
            page,
            page_size,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_count(raw: &str, name: &str) -> Result<usize, ApiError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| ApiError::bad_request(format!("{name} must be a positive integer")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    #[serde(rename = "limit")]
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<'a> {
    #[serde(rename = "data")]
    pub items: Vec<&'a Title>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults<'a> {
    pub films: Vec<&'a Title>,
    pub tv: Vec<&'a Title>,
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

/// Case-insensitive match on title or genre.
pub fn matches_text(item: &Title, needle: &str) -> bool {
    contains_ignore_case(item.title.as_deref(), needle)
        || contains_ignore_case(item.genre.as_deref(), needle)
}

/// Text search in collection order. No query means the whole collection.
pub fn search<'a>(collection: &'a [Title], text: Option<&str>) -> Vec<&'a Title> {
    match text.filter(|t| !t.is_empty()) {
        Some(needle) => collection
            .iter()
            .filter(|item| matches_text(item, needle))
            .collect(),
        None => collection.iter().collect(),
    }
}

pub fn query<'a>(collection: &'a [Title], q: &ListQuery) -> Page<'a> {
    let mut items = search(collection, q.text.as_deref());
    if !q.filters.is_empty() {
        items.retain(|item| q.filters.matches(item));
    }
    paginate(items, q.page, q.page_size)
}

/// Slices one page out of `items`. Pages past the end are empty, not errors.
pub fn paginate<'a>(items: Vec<&'a Title>, page: usize, page_size: usize) -> Page<'a> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = items.len();
    let start = (page - 1).saturating_mul(page_size);
    let end = start.saturating_add(page_size);
    let slice = if start >= total {
        Vec::new()
    } else {
        items[start..end.min(total)].to_vec()
    };
    Page {
        items: slice,
        pagination: Pagination {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
            has_next: end < total,
            has_prev: page > 1,
        },
    }
}

/// Quick search over both collections, each side capped at [`SEARCH_LIMIT`].
pub fn search_catalog<'a>(catalog: &'a Catalog, text: Option<&str>) -> SearchResults<'a> {
    let Some(needle) = text.filter(|t| !t.is_empty()) else {
        return SearchResults::default();
    };
    let capped = |collection: &'a [Title]| -> Vec<&'a Title> {
        collection
            .iter()
            .filter(|item| matches_text(item, needle))
            .take(SEARCH_LIMIT)
            .collect()
    };
    SearchResults {
        films: capped(catalog.films()),
        tv: capped(catalog.tv()),
    }
}
