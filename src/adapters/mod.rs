// Adapters layer: concrete implementations for external systems (LLM API, PDF text).

pub mod gemini;
pub mod pdf;

pub use gemini::GeminiClient;
pub use pdf::PdfTextReader;
