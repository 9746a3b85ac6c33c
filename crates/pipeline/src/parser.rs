//! Source document parsing into per-page text.

use crate::types::SourcePage;
use docqa_core::{AppError, AppResult};
use lopdf::Document;
use std::fs;
use std::path::Path;

/// Page separator in plain-text and markdown sources.
const FORM_FEED: char = '\u{000C}';

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Pdf,
    Markdown,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("md") | Some("markdown") => Self::Markdown,
            Some("txt") | Some("text") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Turns a document on disk into ordered pages.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, path: &Path) -> AppResult<Vec<SourcePage>>;
}

/// Parser dispatching on file extension.
///
/// PDFs yield one page per physical page. Text and markdown files are split
/// on form feeds, so a file without them is a single page.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileParser;

impl DocumentParser for FileParser {
    fn parse(&self, path: &Path) -> AppResult<Vec<SourcePage>> {
        if !path.is_file() {
            return Err(AppError::DocumentRead(format!(
                "No such file: {}",
                path.display()
            )));
        }

        let content_type = ContentType::from_path(path);
        tracing::debug!("Parsing {:?} as {}", path, content_type.as_str());

        let pages = match content_type {
            ContentType::Pdf => parse_pdf(path)?,
            ContentType::Markdown => split_form_feeds(&read_text(path)?, clean_markdown),
            ContentType::PlainText => split_form_feeds(&read_text(path)?, |page| page.to_string()),
            ContentType::Unknown => {
                return Err(AppError::DocumentRead(format!(
                    "Unsupported document type: {}",
                    path.display()
                )))
            }
        };

        if pages.is_empty() {
            return Err(AppError::DocumentRead(format!(
                "Document has no readable text: {}",
                path.display()
            )));
        }

        tracing::info!("Parsed {} pages from {:?}", pages.len(), path);
        Ok(pages)
    }
}

fn parse_pdf(path: &Path) -> AppResult<Vec<SourcePage>> {
    let document = Document::load(path).map_err(|e| {
        AppError::DocumentRead(format!("Failed to load PDF {}: {}", path.display(), e))
    })?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = document.extract_text(&[page_no]).map_err(|e| {
            AppError::DocumentRead(format!(
                "Failed to extract page {} of {}: {}",
                page_no,
                path.display(),
                e
            ))
        })?;

        if text.trim().is_empty() {
            tracing::debug!("Skipping blank PDF page {}", page_no);
            continue;
        }

        pages.push(SourcePage::new(page_no, text));
    }

    Ok(pages)
}

fn read_text(path: &Path) -> AppResult<String> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::DocumentRead(format!("Failed to read {}: {}", path.display(), e))
    })?;

    if raw.contains('\0') {
        return Err(AppError::DocumentRead(format!(
            "Binary file not supported: {}",
            path.display()
        )));
    }

    Ok(raw)
}

/// Split on form feeds into 1-based pages, dropping blank ones.
fn split_form_feeds(text: &str, clean: impl Fn(&str) -> String) -> Vec<SourcePage> {
    text.split(FORM_FEED)
        .enumerate()
        .map(|(i, page)| SourcePage::new(i as u32 + 1, clean(page)))
        .filter(|page| !page.raw_text.trim().is_empty())
        .collect()
}

/// Strip markdown structure that carries no content.
pub fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}
