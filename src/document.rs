//! Plain-text extraction from source documents.
//!
//! Text files are returned verbatim and Markdown is flattened to prose.
//! Binary formats (PDF, office documents) need an external extractor and are
//! rejected.

use std::fs;
use std::path::Path;

use pulldown_cmark::{Event, Options, Parser, TagEnd};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported document format: {0}")]
    Unsupported(String),

    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

const BINARY_EXTENSIONS: &[&str] = &["pdf", "docx", "doc", "xlsx", "xls", "pptx", "epub", "zip"];

/// Extract the plain text of the document at `path`.
pub fn load_document(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if BINARY_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DocumentError::Unsupported(format!(
            ".{} files need text extraction before indexing",
            extension
        )));
    }

    let bytes = fs::read(path)?;
    if bytes.contains(&0) {
        return Err(DocumentError::Unsupported(format!(
            "{} looks like a binary file",
            path.display()
        )));
    }
    let text = String::from_utf8(bytes)?;

    log::debug!("Loaded {} ({} bytes)", path.display(), text.len());

    match extension.as_str() {
        "md" | "markdown" => Ok(markdown_to_text(&text)),
        _ => Ok(text),
    }
}

/// Flatten Markdown into plain text, one blank line between blocks.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(markdown, options);

    let mut text = String::new();
    for event in parser {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::TableCell) => text.push(' '),
            Event::End(TagEnd::Item) | Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => {
                end_line(&mut text)
            }
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::CodeBlock)
            | Event::End(TagEnd::BlockQuote)
            | Event::End(TagEnd::List(_))
            | Event::End(TagEnd::Table) => end_block(&mut text),
            _ => {}
        }
    }

    text.trim_end().to_string()
}

fn end_line(text: &mut String) {
    let trimmed = text.trim_end_matches(' ').len();
    text.truncate(trimmed);
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

fn end_block(text: &mut String) {
    end_line(text);
    if !text.is_empty() && !text.ends_with("\n\n") {
        text.push('\n');
    }
}
