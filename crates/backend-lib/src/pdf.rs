// ============================
// mdwiki-backend-lib/src/pdf.rs
// ============================
//! HTML-to-PDF rendering seam.
//!
//! The default implementation shells out to the `wkhtmltopdf` command line
//! tool, streaming the HTML document through stdin and reading the PDF bytes
//! from stdout.
use crate::error::AppError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Rendering options handed to the PDF engine
#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub page_size: String,
    pub margin_top: String,
    pub margin_right: String,
    pub margin_bottom: String,
    pub margin_left: String,
    pub encoding: String,
    /// Stylesheet applied to the exported document
    pub stylesheet: Option<PathBuf>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_size: "A4".to_string(),
            margin_top: "0in".to_string(),
            margin_right: "0in".to_string(),
            margin_bottom: "0in".to_string(),
            margin_left: "0in".to_string(),
            encoding: "UTF-8".to_string(),
            stylesheet: None,
        }
    }
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>, AppError>;
}

/// Renderer backed by the `wkhtmltopdf` binary
pub struct WkhtmltopdfRenderer {
    binary: PathBuf,
}

impl WkhtmltopdfRenderer {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("wkhtmltopdf"),
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for WkhtmltopdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PdfRenderer for WkhtmltopdfRenderer {
    async fn render(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>, AppError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--quiet")
            .arg("--encoding")
            .arg(&options.encoding)
            .arg("--page-size")
            .arg(&options.page_size)
            .arg("--margin-top")
            .arg(&options.margin_top)
            .arg("--margin-right")
            .arg(&options.margin_right)
            .arg("--margin-bottom")
            .arg(&options.margin_bottom)
            .arg("--margin-left")
            .arg(&options.margin_left);
        if let Some(stylesheet) = &options.stylesheet {
            cmd.arg("--user-style-sheet").arg(stylesheet);
        }
        // read HTML from stdin, write PDF to stdout
        cmd.arg("-").arg("-");

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::PdfRender(format!("failed to spawn {:?}: {e}", self.binary)))?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(html.as_bytes()).await?;
        }
        drop(child.stdin.take());

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::PdfRender(stderr.trim().to_string()));
        }
        Ok(output.stdout)
    }
}
