//! Text extraction from PDF and plain-text files.
//!
//! PDFs are read through their text layer first. Scanned documents (no text
//! layer) and PDFs the native parser rejects are rasterized with `pdftoppm`
//! and run through `tesseract`.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::ExtractError;
use crate::models::{IngestConfig, SourceType};

/// Upper bound on the native parser; some font tables make it spin.
const TEXT_LAYER_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns an input file into raw text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Why the native text layer could not be used.
#[derive(Debug)]
enum NativeOutcome {
    Text(String),
    Empty,
    Failed(String),
}

/// Extractor backed by `pdf-extract` with an OCR fallback.
#[derive(Debug, Clone)]
pub struct FileExtractor {
    ocr_languages: String,
    ocr_dpi: u32,
}

impl FileExtractor {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            ocr_languages: config.ocr_languages.clone(),
            ocr_dpi: config.ocr_dpi,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&IngestConfig::default())
    }

    fn extract_txt(path: &Path) -> Result<String, ExtractError> {
        std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn extract_pdf(&self, path: &Path) -> Result<String, ExtractError> {
        match Self::extract_text_layer(path) {
            NativeOutcome::Text(text) => Ok(text),
            NativeOutcome::Empty => {
                tracing::info!("[OCR] Scanned PDF (no text layer): {}", path.display());
                self.ocr_pdf(path)
            }
            NativeOutcome::Failed(reason) => {
                tracing::warn!(
                    "[OCR] Native extraction failed for {}: {}; falling back to OCR",
                    path.display(),
                    reason
                );
                self.ocr_pdf(path)
            }
        }
    }

    fn extract_text_layer(path: &Path) -> NativeOutcome {
        let owned = path.to_path_buf();
        let (tx, rx) = mpsc::channel();

        // A panic inside pdf-extract drops the sender.
        let handle = thread::spawn(move || {
            let _ = tx.send(pdf_extract::extract_text(&owned));
        });

        match rx.recv_timeout(TEXT_LAYER_TIMEOUT) {
            Ok(result) => {
                let _ = handle.join();
                match result {
                    Ok(text) if text.trim().is_empty() => NativeOutcome::Empty,
                    Ok(text) => NativeOutcome::Text(text),
                    Err(e) => NativeOutcome::Failed(e.to_string()),
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => NativeOutcome::Failed(format!(
                "parser timed out after {}s",
                TEXT_LAYER_TIMEOUT.as_secs()
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                NativeOutcome::Failed("parser panicked".to_string())
            }
        }
    }

    /// Rasterize every page and concatenate the recognized text in page order.
    fn ocr_pdf(&self, path: &Path) -> Result<String, ExtractError> {
        let ocr_error = |message: String| ExtractError::Ocr {
            path: path.display().to_string(),
            message,
        };

        let temp_dir = tempfile::Builder::new()
            .prefix("mlqa-ocr-")
            .tempdir()
            .map_err(|e| ocr_error(format!("failed to create temp dir: {e}")))?;
        let page_prefix = temp_dir.path().join("page");

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.ocr_dpi.to_string())
            .arg(path)
            .arg(&page_prefix)
            .output()
            .map_err(|e| ocr_error(format!("pdftoppm could not be started: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ocr_error(format!("pdftoppm error: {}", stderr.trim())));
        }

        let page_images = collect_page_images(temp_dir.path())
            .map_err(|e| ocr_error(format!("failed to read page images: {e}")))?;
        if page_images.is_empty() {
            return Err(ocr_error("pdftoppm produced no images".to_string()));
        }

        let mut text = String::new();
        for (i, image) in page_images.iter().enumerate() {
            let output = Command::new("tesseract")
                .arg(image)
                .arg("stdout")
                .arg("-l")
                .arg(&self.ocr_languages)
                .output()
                .map_err(|e| ocr_error(format!("tesseract could not be started: {e}")))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ocr_error(format!(
                    "tesseract failed on page {}: {}",
                    i + 1,
                    stderr.trim()
                )));
            }
            text.push_str(&String::from_utf8_lossy(&output.stdout));
        }

        tracing::debug!(
            "OCR extracted {} characters from {} pages of {}",
            text.len(),
            page_images.len(),
            path.display()
        );
        Ok(text)
    }
}

impl TextExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        match SourceType::from_path(path) {
            Some(SourceType::Txt) => Self::extract_txt(path),
            Some(SourceType::Pdf) => self.extract_pdf(path),
            None => Err(ExtractError::UnsupportedFile(path.display().to_string())),
        }
    }
}

/// PNG files written by `pdftoppm`, ordered by page number.
fn collect_page_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .map(|p| (page_number(&p).unwrap_or(u32::MAX), p))
        .collect();
    pages.sort();
    Ok(pages.into_iter().map(|(_, p)| p).collect())
}

/// Page number from a `page-<n>.png` name; zero-padding width varies with page count.
fn page_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit('-').next()?.parse().ok()
}

/// Single-page PDFs with a Helvetica text layer, one `Tj` per line.
#[cfg(test)]
pub(crate) fn text_layer_pdf(lines: &[String]) -> Vec<u8> {
    let mut content = String::from("BT /F1 8 Tf 40 780 Td\n");
    for line in lines {
        content.push_str(&format!("({line}) Tj 0 -10 Td\n"));
    }
    content.push_str("ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref = pdf.len();
    let mut trailer = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        trailer.push_str(&format!("{offset:010} 00000 n \n"));
    }
    trailer.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));
    pdf.extend_from_slice(trailer.as_bytes());
    pdf
}
