// ============================
// mdwiki-backend-lib/src/render.rs
// ============================
//! Markup-to-HTML rendering seam.
//!
//! The core only hands markup text in and takes HTML text out; the engine
//! behind the trait is swappable.
use pulldown_cmark::{html, Options, Parser};

pub trait Renderer: Send + Sync {
    /// Render an HTML fragment for embedding in a page body
    fn to_html_fragment(&self, markup: &str) -> String;

    /// Render a standalone HTML document (used for PDF export)
    fn to_html_document(&self, title: &str, markup: &str) -> String;
}

/// Markdown renderer with all pulldown-cmark extensions enabled
#[derive(Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn to_html_fragment(&self, markup: &str) -> String {
        let parser = Parser::new_ext(markup, Options::all());
        let mut out = String::new();
        html::push_html(&mut out, parser);
        out
    }

    fn to_html_document(&self, title: &str, markup: &str) -> String {
        let body = self.to_html_fragment(markup);
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
            escape_html(title),
            body
        )
    }
}

/// Escape text for safe interpolation into HTML
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_markdown_fragment() {
        let html = MarkdownRenderer.to_html_fragment("# Heading\n\nbody text");
        assert!(html.contains("<h1>Heading</h1>"));
        assert!(html.contains("<p>body text</p>"));
    }

    #[test]
    fn document_escapes_title() {
        let html = MarkdownRenderer.to_html_document("<Ops> & Tricks", "text");
        assert!(html.contains("<title>&lt;Ops&gt; &amp; Tricks</title>"));
        assert!(html.contains("<!DOCTYPE html>"));
    }
}
