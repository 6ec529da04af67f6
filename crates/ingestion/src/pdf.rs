//! PDF text extraction
//!
//! Extracts text content from PDF files using lopdf, page by page, so
//! passages can carry the page they came from.

use crate::errors::IngestionError;
use regex_lite::Regex;
use std::path::Path;
use tracing::{debug, warn};

/// Text of a single PDF page
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number
    pub page: u32,
    /// Cleaned page text
    pub text: String,
}

/// Extract cleaned text from every page of a PDF file
///
/// Pages that fail extraction are skipped with a warning. The call fails
/// only when the whole document yields no text.
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>, IngestionError> {
    let doc = lopdf::Document::load(path).map_err(|e| IngestionError::PdfParseError {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let pages = doc.get_pages();
    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut result = Vec::with_capacity(pages.len());

    for (page_num, page_id) in pages.iter() {
        match doc.get_page_content(*page_id) {
            Ok(content) => {
                let raw = extract_text_from_content(&content);
                let cleaned = clean_text(&raw);
                if !cleaned.is_empty() {
                    result.push(PageText {
                        page: *page_num,
                        text: cleaned,
                    });
                }
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    if result.is_empty() {
        return Err(IngestionError::PdfParseError {
            path: path.display().to_string(),
            message: "No text content extracted from PDF".to_string(),
        });
    }

    debug!(extracted_pages = result.len(), "Text extraction complete");

    Ok(result)
}

/// Extract text from a PDF content stream
fn extract_text_from_content(content: &[u8]) -> String {
    // Text sits between BT and ET operators
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;
    let mut current_text = String::new();

    for line in content_str.lines() {
        let trimmed = line.trim();

        if trimmed == "BT" {
            in_text_block = true;
            continue;
        }

        if trimmed == "ET" {
            in_text_block = false;
            if !current_text.is_empty() {
                text.push_str(&current_text);
                text.push(' ');
                current_text.clear();
            }
            continue;
        }

        if in_text_block {
            // Text showing operators: Tj, TJ, ', "
            if let Some(text_content) = extract_text_from_operator(trimmed) {
                current_text.push_str(&text_content);
            }
        }
    }

    text
}

/// Extract text from a PDF text operator
fn extract_text_from_operator(line: &str) -> Option<String> {
    // Handle (text) Tj operator
    if line.ends_with("Tj") || line.ends_with("'") || line.ends_with("\"") {
        if let Some(start) = line.find('(') {
            if let Some(end) = line.rfind(')') {
                let text = &line[start + 1..end];
                return Some(decode_pdf_string(text));
            }
        }
    }

    // Handle [(text) num (text) num] TJ operator (array of text)
    if line.ends_with("TJ") {
        let mut result = String::new();
        let mut in_paren = false;
        let mut current = String::new();

        for ch in line.chars() {
            match ch {
                '(' => {
                    in_paren = true;
                }
                ')' => {
                    in_paren = false;
                    result.push_str(&decode_pdf_string(&current));
                    current.clear();
                }
                _ if in_paren => {
                    current.push(ch);
                }
                _ => {}
            }
        }

        if !result.is_empty() {
            return Some(result);
        }
    }

    None
}

/// Decode PDF string escapes
fn decode_pdf_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('(') => result.push('('),
                Some(')') => result.push(')'),
                Some(c) => result.push(c),
                None => {}
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Clean extracted page text: collapse blank-line runs and excess whitespace
pub fn clean_text(text: &str) -> String {
    let blank_lines = Regex::new(r"\n\s*\n").unwrap();
    let multi_space = Regex::new(r"[ \t]{2,}").unwrap();

    let collapsed = blank_lines.replace_all(text, "\n");
    let collapsed = multi_space.replace_all(&collapsed, " ");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        let input = "Hello   World\n\n\nSecond  line";
        assert_eq!(clean_text(input), "Hello World\nSecond line");
    }

    #[test]
    fn test_clean_text_trims() {
        assert_eq!(clean_text("  padded  "), "padded");
        assert_eq!(clean_text("\n\n"), "");
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string("Hello\\nWorld"), "Hello\nWorld");
        assert_eq!(decode_pdf_string("Test\\(paren\\)"), "Test(paren)");
    }

    #[test]
    fn test_extract_tj_operator() {
        assert_eq!(
            extract_text_from_operator("(Hello World) Tj"),
            Some("Hello World".to_string())
        );
        assert_eq!(
            extract_text_from_operator("[(Hel) 12 (lo)] TJ"),
            Some("Hello".to_string())
        );
        assert_eq!(extract_text_from_operator("1 0 0 1 50 700 Tm"), None);
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = extract_pages(Path::new("/nonexistent/file.pdf")).unwrap_err();
        assert!(matches!(err, IngestionError::PdfParseError { .. }));
    }
}
