//! Input checks applied before anything is written.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::AdminError;

/// Link value stored when a project has no repository or demo.
pub const PLACEHOLDER_LINK: &str = "#";

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(https?://)?([\da-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$")
            .unwrap_or_else(|e| panic!("url pattern does not compile: {e}"))
    })
}

pub fn is_valid_url(url: &str) -> bool {
    url_pattern().is_match(url)
}

/// Reject blank required fields.
pub fn require(label: &str, value: &str) -> Result<(), AdminError> {
    if value.trim().is_empty() {
        return Err(AdminError::Validation(format!("{} is required", label)));
    }
    Ok(())
}

/// Accept an empty link (stored as the placeholder) or a well-formed URL.
pub fn optional_link(label: &str, value: Option<&str>) -> Result<String, AdminError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() || value == PLACEHOLDER_LINK {
        return Ok(PLACEHOLDER_LINK.to_string());
    }
    if !is_valid_url(value) {
        return Err(AdminError::Validation(format!(
            "please enter a valid {} or leave it empty",
            label
        )));
    }
    Ok(value.to_string())
}

/// Trim image URLs, drop blanks and reject malformed ones (1-based position in
/// the message).
pub fn image_urls(urls: &[String]) -> Result<Vec<String>, AdminError> {
    let mut out = Vec::with_capacity(urls.len());
    for (index, url) in urls.iter().enumerate() {
        let url = url.trim();
        if url.is_empty() {
            continue;
        }
        if !is_valid_url(url) {
            return Err(AdminError::Validation(format!(
                "please enter a valid image URL or leave it empty (URL #{})",
                index + 1
            )));
        }
        out.push(url.to_string());
    }
    Ok(out)
}

/// Split free text on `separator`, trimming and dropping empty items.
pub fn split_list(text: &str, separator: char) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim list items and drop blank ones.
pub fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Drop repeated items, keeping the first occurrence.
pub fn unique_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
