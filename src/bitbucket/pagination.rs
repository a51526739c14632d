//! Continuation logic for Bitbucket's paged collections.
//!
//! Cloud pages carry a ready-made `next` URL (sometimes under `links.next`),
//! Server pages carry `isLastPage`/`nextPageStart`, and some proxies strip
//! both. Everything here is pure so the fetch loops only decide *whether* to
//! keep going, never *how*.

use crate::errors::Result;
use serde_json::Value;
use url::Url;

/// Keys under which a page lists its items, in priority order
const ITEM_KEYS: [&str; 2] = ["values", "repositories"];

/// Locations of an explicit continuation URL, in priority order
const NEXT_URL_POINTERS: [&str; 3] = ["/next", "/links/next/href", "/links/next/0/href"];

/// How a fetch loop should read continuation metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Explicit next URL, then `isLastPage`/`nextPageStart`, then a size heuristic
    Links,
    /// Explicit next URL, then `isLastPage` driving page/offset increments
    LastPageFlag,
}

/// Pagination fields of one response page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub next: Option<String>,
    pub links_next: Option<String>,
    pub is_last_page: Option<bool>,
    pub next_page_start: Option<u64>,
    pub page: Option<u64>,
    pub start: Option<u64>,
    /// The page carried any of the Server offset fields (`start`, `limit`, `size`)
    pub has_offset_fields: bool,
}

impl PageMeta {
    pub fn from_json(page: &Value) -> Self {
        let non_empty_str = |v: &Value| {
            v.as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let next = page.pointer(NEXT_URL_POINTERS[0]).and_then(non_empty_str);
        let links_next = NEXT_URL_POINTERS[1..]
            .iter()
            .find_map(|ptr| page.pointer(ptr).and_then(non_empty_str));

        Self {
            next,
            links_next,
            is_last_page: page.get("isLastPage").and_then(Value::as_bool),
            next_page_start: page.get("nextPageStart").and_then(Value::as_u64),
            page: page.get("page").and_then(Value::as_u64),
            start: page.get("start").and_then(Value::as_u64),
            has_offset_fields: ["start", "limit", "size"]
                .iter()
                .any(|key| page.get(key).is_some()),
        }
    }

    /// Explicit continuation URL, preferring the top-level `next` field
    pub fn explicit_next(&self) -> Option<&str> {
        self.next.as_deref().or(self.links_next.as_deref())
    }
}

/// Items of a page, taken from the first known collection key holding an array
pub fn extract_items(page: &Value) -> Vec<Value> {
    ITEM_KEYS
        .iter()
        .find_map(|key| page.get(key).and_then(Value::as_array))
        .or_else(|| page.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Work out the URL of the page after `current_url`, or `None` when the
/// collection is exhausted.
pub fn derive_next_url(
    current_url: &str,
    meta: &PageMeta,
    item_count: usize,
    page_size: usize,
    mode: Continuation,
) -> Result<Option<String>> {
    if let Some(next) = meta.explicit_next() {
        return Ok(Some(next.to_string()));
    }

    match (mode, meta.is_last_page) {
        (_, Some(true)) => Ok(None),
        (Continuation::Links, Some(false)) => match meta.next_page_start {
            Some(start) => set_query_param(current_url, "start", &start.to_string()).map(Some),
            None => guess_next_url(current_url, meta, item_count, page_size),
        },
        (Continuation::LastPageFlag, Some(false)) => {
            if let Some(page) = meta.page {
                set_query_param(current_url, "page", &(page + 1).to_string()).map(Some)
            } else if let Some(start) = meta.next_page_start {
                set_query_param(current_url, "start", &start.to_string()).map(Some)
            } else if item_count > 0 {
                let start = current_start(current_url, meta) + item_count as u64;
                set_query_param(current_url, "start", &start.to_string()).map(Some)
            } else {
                Ok(None)
            }
        }
        (_, None) => guess_next_url(current_url, meta, item_count, page_size),
    }
}

/// A full page with no continuation hints probably has a successor; a short
/// page never does.
fn guess_next_url(
    current_url: &str,
    meta: &PageMeta,
    item_count: usize,
    page_size: usize,
) -> Result<Option<String>> {
    if item_count == 0 || item_count < page_size {
        return Ok(None);
    }

    if let Some(page) = meta.page {
        return set_query_param(current_url, "page", &(page + 1).to_string()).map(Some);
    }

    if meta.has_offset_fields || query_param(current_url, "start").is_some() {
        let start = current_start(current_url, meta) + item_count as u64;
        return set_query_param(current_url, "start", &start.to_string()).map(Some);
    }

    Ok(None)
}

fn current_start(current_url: &str, meta: &PageMeta) -> u64 {
    meta.start
        .or_else(|| query_param(current_url, "start").and_then(|s| s.parse().ok()))
        .unwrap_or(0)
}

/// Read a query parameter from a URL
pub fn query_param(url: &str, key: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Replace (or add) a query parameter, keeping the others in order
pub fn set_query_param(url: &str, key: &str, value: &str) -> Result<String> {
    let mut parsed = Url::parse(url)?;
    let retained: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        for (k, v) in &retained {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(key, value);
    }

    Ok(parsed.to_string())
}
