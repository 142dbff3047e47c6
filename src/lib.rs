pub mod cell;
pub mod config;
pub mod dataset;
pub mod error;
pub mod partition;
pub mod pipeline;
pub mod province;
pub mod remap;
pub mod succession;
pub mod title;

pub use config::{ConverterParams, NameSettings, PartitionSettings, SuccessionSettings, WaterSettings};
pub use dataset::MapDataset;
pub use error::{ConvertError, Result};
pub use pipeline::{ConversionOutput, ConversionReport, convert};
