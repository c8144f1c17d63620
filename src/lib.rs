pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{GeminiClient, PdfTextReader};
pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use crate::core::{etl::EtlEngine, etl::EtlOutput, pipeline::WorkOrderPipeline};
pub use domain::model::WorkOrderDocument;
pub use utils::error::{EtlError, Result};
