use crate::domain::ports::DocumentReader;
use crate::utils::error::{EtlError, Result};

/// Reads the text layer of every page, in page order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextReader;

impl DocumentReader for PdfTextReader {
    fn extract_text(&self, data: &[u8]) -> Result<String> {
        if !data.starts_with(b"%PDF") {
            return Err(EtlError::PdfError {
                message: "input does not start with a %PDF header".to_string(),
            });
        }

        let text = pdf_extract::extract_text_from_mem(data).map_err(|e| EtlError::PdfError {
            message: e.to_string(),
        })?;

        let text = text.trim();
        if text.is_empty() {
            // 掃描檔沒有文字層
            return Err(EtlError::PdfError {
                message: "no extractable text (scanned PDF?)".to_string(),
            });
        }

        tracing::debug!("Extracted {} characters of PDF text", text.len());
        Ok(text.to_string())
    }
}
