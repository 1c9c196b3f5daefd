//! Document Text Extractor: plain text from the first pages of an in-memory PDF.
//!
//! Page failures are local: a page that cannot be decoded contributes an empty
//! string and extraction moves on. Deciding what an empty result means is left
//! to the caller.

use std::fmt::Display;

use lopdf::Document;
use tracing::{debug, warn};

/// Upper bound on pages read from any upload.
pub const MAX_PAGES: usize = 5;

/// Characters of extracted text echoed to the debug log.
const LOG_PREVIEW_CHARS: usize = 200;

/// Extracts text from at most `MAX_PAGES` pages, in page order.
///
/// Returns an empty string when the bytes are not a loadable PDF or no page
/// yields any text. CPU-bound; call from `spawn_blocking` in async contexts.
pub fn extract_text(bytes: &[u8]) -> String {
    let document = match Document::load_mem(bytes) {
        Ok(document) => document,
        Err(e) => {
            warn!("Failed to load PDF ({} bytes): {e}", bytes.len());
            return String::new();
        }
    };

    let page_numbers: Vec<u32> = document.get_pages().into_keys().collect();
    debug!(
        "PDF loaded: {} pages, reading up to {}",
        page_numbers.len(),
        MAX_PAGES
    );

    let pages = page_numbers
        .iter()
        .take(MAX_PAGES)
        .map(|&number| (number, document.extract_text(&[number])));
    let text = join_pages(pages);

    debug!(
        "Extracted text (first {} chars): {}",
        LOG_PREVIEW_CHARS,
        text.chars().take(LOG_PREVIEW_CHARS).collect::<String>()
    );
    text
}

/// Concatenates per-page results in order; failed pages contribute `""`.
fn join_pages<I, E>(pages: I) -> String
where
    I: IntoIterator<Item = (u32, Result<String, E>)>,
    E: Display,
{
    let mut text = String::new();
    for (number, result) in pages {
        match result {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!("Skipping page {number}: text extraction failed: {e}"),
        }
    }
    text
}
