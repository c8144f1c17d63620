pub mod etl;
pub mod normalize;
pub mod pipeline;
pub mod prompt;

pub use crate::domain::model::{RawExtraction, TransformResult, WorkOrderDocument};
pub use crate::domain::ports::{ConfigProvider, DocumentReader, LlmClient, LlmResponse, Pipeline, Storage};
pub use crate::utils::error::Result;
