#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for descriptor validation, configuration and the pipeline.
pub mod error;

/// Selector parsing for the grayscale converter.
pub mod config;

/// Filter descriptors and their validation from tokenized text.
pub mod descriptor;

/// The filter pipeline state machine.
pub mod pipeline;

pub use crate::descriptor::{FilterDescriptor, FilterKind};
pub use crate::error::{ConfigError, DescriptorError, PipelineError};
pub use crate::pipeline::{FilterPipeline, PipelineState};
