//! Editable, ordered list of `{title, url}` pairs.
//!
//! Used both when composing a new dynamic QR code and when editing the links
//! of an existing one. The list never drops below one entry while the editor
//! is open; nothing is validated until [`LinkSetEditor::commit`].

use std::str::FromStr;
use reqwest::Url;
use validator::{Validate, ValidateUrl};

use crate::error::ValidationError;
use crate::models::LinkEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    Title,
    Url,
}

impl FromStr for LinkField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "title" => Ok(LinkField::Title),
            "url" => Ok(LinkField::Url),
            other => Err(format!("unknown link field '{other}' (expected title or url)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSetEditor {
    entries: Vec<LinkEntry>,
}

impl Default for LinkSetEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkSetEditor {
    /// A blank editor holding a single empty entry.
    pub fn new() -> Self {
        Self {
            entries: vec![LinkEntry::default()],
        }
    }

    /// Seed the editor with a copy of existing links.
    pub fn from_links(links: &[LinkEntry]) -> Self {
        if links.is_empty() {
            return Self::new();
        }
        Self {
            entries: links.to_vec(),
        }
    }

    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_entry(&mut self) {
        self.entries.push(LinkEntry::default());
    }

    /// Remove the entry at `index`. Refuses to remove the last remaining entry.
    pub fn remove_entry(&mut self, index: usize) -> bool {
        if self.entries.len() <= 1 || index >= self.entries.len() {
            return false;
        }
        self.entries.remove(index);
        true
    }

    pub fn update_entry(&mut self, index: usize, field: LinkField, value: impl Into<String>) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        match field {
            LinkField::Title => entry.title = value.into(),
            LinkField::Url => entry.url = value.into(),
        }
        true
    }

    /// Validate every entry and hand back the trimmed list.
    pub fn commit(&self) -> Result<Vec<LinkEntry>, ValidationError> {
        validate_links(&self.entries)
    }
}

/// Validation shared by the editor and dynamic QR creation.
///
/// Reports the first offending entry, title before url.
pub fn validate_links(links: &[LinkEntry]) -> Result<Vec<LinkEntry>, ValidationError> {
    if links.is_empty() {
        return Err(ValidationError::field("links", "At least one link is required"));
    }

    links
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let trimmed = LinkEntry::new(entry.title.trim(), entry.url.trim());
            if let Err(errors) = trimmed.validate() {
                let errors = errors.field_errors();
                if errors.contains_key("title") {
                    return Err(ValidationError::entry(index, "title", "Link title is required"));
                }
                if trimmed.url.is_empty() {
                    return Err(ValidationError::entry(index, "url", "URL is required"));
                }
                return Err(ValidationError::entry(index, "url", "Invalid URL format"));
            }
            if !is_web_url(&trimmed.url) {
                return Err(ValidationError::entry(index, "url", "URL must start with http:// or https://"));
            }
            Ok(trimmed)
        })
        .collect()
}

/// Syntactic URL check used for single-destination static codes.
pub fn is_valid_url(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && url.to_string().validate_url() && is_web_url(url)
}

/// Only `http` and `https` destinations are ever shown to someone scanning.
pub fn is_web_url(url: &str) -> bool {
    Url::parse(url.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_editor_holds_one_empty_entry() {
        let editor = LinkSetEditor::new();
        assert_eq!(editor.entries(), &[LinkEntry::default()]);
    }

    #[test]
    fn removing_the_only_entry_is_a_noop() {
        let mut editor = LinkSetEditor::new();
        assert!(!editor.remove_entry(0));
        assert_eq!(editor.len(), 1);
    }

    #[test]
    fn add_and_remove_keep_order() {
        let mut editor = LinkSetEditor::from_links(&[
            LinkEntry::new("A", "https://a.example"),
            LinkEntry::new("B", "https://b.example"),
        ]);
        editor.add_entry();
        editor.update_entry(2, LinkField::Title, "C");
        editor.update_entry(2, LinkField::Url, "https://c.example");

        assert!(editor.remove_entry(0));
        let titles: Vec<_> = editor.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["B", "C"]);
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let mut editor = LinkSetEditor::new();
        editor.add_entry();
        assert!(!editor.remove_entry(5));
        assert!(!editor.update_entry(5, LinkField::Url, "https://x.example"));
        assert_eq!(editor.len(), 2);
    }

    #[test]
    fn commit_reports_first_invalid_entry() {
        let editor = LinkSetEditor::from_links(&[
            LinkEntry::new("Site", "https://a.example"),
            LinkEntry::new("Docs", "not a url"),
            LinkEntry::new("", "https://c.example"),
        ]);
        let err = editor.commit().unwrap_err();
        assert_eq!(err.index, Some(1));
        assert_eq!(err.field, "url");
    }

    #[test]
    fn commit_requires_titles_and_urls() {
        let mut editor = LinkSetEditor::new();
        editor.update_entry(0, LinkField::Url, "https://a.example");
        let err = editor.commit().unwrap_err();
        assert_eq!((err.index, err.field), (Some(0), "title"));

        editor.update_entry(0, LinkField::Title, "Site");
        editor.update_entry(0, LinkField::Url, "   ");
        let err = editor.commit().unwrap_err();
        assert_eq!(err.message, "URL is required");
    }

    #[test]
    fn commit_trims_values() {
        let editor = LinkSetEditor::from_links(&[LinkEntry::new("  Site ", " https://a.example ")]);
        assert_eq!(
            editor.commit().unwrap(),
            vec![LinkEntry::new("Site", "https://a.example")]
        );
    }

    #[test]
    fn empty_seed_still_opens_with_one_entry() {
        assert_eq!(LinkSetEditor::from_links(&[]).len(), 1);
        assert!(validate_links(&[]).is_err());
    }

    #[test]
    fn url_check_rejects_blank_and_relative() {
        assert!(is_valid_url("https://menu.example/today"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("/relative/path"));
    }

    #[test]
    fn script_and_data_urls_are_rejected() {
        for url in [
            "javascript:alert(document.cookie)",
            "data:text/html,<script>alert(1)</script>",
            "ftp://files.example/menu.pdf",
        ] {
            assert!(!is_valid_url(url), "{url}");
            let err = LinkSetEditor::from_links(&[LinkEntry::new("Site", url)])
                .commit()
                .unwrap_err();
            assert_eq!((err.index, err.field), (Some(0), "url"));
        }
        assert!(is_valid_url("http://menu.example"));
    }

    #[test]
    fn link_field_parses_case_insensitively() {
        assert_eq!("URL".parse::<LinkField>().unwrap(), LinkField::Url);
        assert!("href".parse::<LinkField>().is_err());
    }
}
