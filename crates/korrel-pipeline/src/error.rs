use korrel_image::ImageError;

/// An error raised while building a filter descriptor.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DescriptorError {
    /// Error when the descriptor ends before a required field.
    #[error("Missing descriptor field: {0}")]
    MissingField(&'static str),

    /// Error when a field or a weight is not a number.
    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber {
        /// The field being parsed.
        field: &'static str,
        /// The offending token.
        value: String,
    },

    /// Error when a scalar field line carries more than one token.
    #[error("Unexpected trailing data after {0}")]
    TrailingData(&'static str),

    /// Error when a kernel dimension is not positive.
    #[error("Kernel {0} must be > 0, got {1}")]
    InvalidKernelSize(&'static str, i64),

    /// Error when the number of kernel rows does not match the declared size.
    #[error("Expected {expected} kernel rows, found {found}")]
    KernelRowCount {
        /// The number of rows declared by the descriptor.
        expected: usize,
        /// The number of rows supplied.
        found: usize,
    },

    /// Error when a kernel row has the wrong number of weights.
    #[error("Kernel row {row} has {found} weights, expected {expected}")]
    KernelRowWidth {
        /// The index of the row.
        row: usize,
        /// The expected number of weights.
        expected: usize,
        /// The number of weights supplied.
        found: usize,
    },

    /// Error when the stride is not positive.
    #[error("Stride must be > 0, got {0}")]
    InvalidStride(i64),

    /// Error when the activation name is not known.
    #[error("Unknown activation: {0:?}")]
    UnknownActivation(String),

    /// Error when the depth of a joint channel kernel does not match the channel count.
    #[error("Kernel depth ({found}) does not match the number of image channels ({expected})")]
    DepthMismatch {
        /// The number of image channels.
        expected: usize,
        /// The declared kernel depth.
        found: usize,
    },

    /// Error when the filter kind is not known.
    #[error("Unknown filter kind: {0:?}")]
    UnknownKind(String),

    /// Error when the kernel cannot be built from the supplied weights.
    #[error("Invalid kernel. {0}")]
    InvalidKernel(#[from] ImageError),
}

/// An error raised by a configuration selector.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    /// Error when the grayscale method selector is not known.
    #[error("Unknown grayscale method {0:?}, use 'g' or 'y'")]
    UnknownGrayscaleMethod(String),
}

/// An error raised by the filter pipeline.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PipelineError {
    /// The filter descriptor is not valid.
    #[error("Invalid filter descriptor. {0}")]
    Descriptor(#[from] DescriptorError),

    /// The configuration is not valid.
    #[error("Invalid configuration. {0}")]
    Config(#[from] ConfigError),

    /// The image buffers do not agree in shape.
    #[error("Image error. {0}")]
    Image(#[from] ImageError),
}
