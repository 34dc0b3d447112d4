pub mod cleaning;
pub mod encoding;
pub mod etl;
pub mod layers;
pub mod pipeline;
pub mod reader;
pub mod render;

pub use crate::domain::model::{Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
