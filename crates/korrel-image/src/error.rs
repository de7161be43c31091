/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image sizes do not match.
    #[error("Image size mismatch ({0}x{1}) vs ({2}x{3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index {0} is out of bounds for an image with {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when the pixel coordinates are out of bounds.
    #[error("Pixel ({0}, {1}) is out of bounds for an image of size {2}x{3}")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a value cannot be represented in the target type.
    #[error("Failed to cast image data to {0}")]
    CastError(String),

    /// Error when the kernel data does not match the declared kernel shape.
    #[error("Kernel data length ({0}) does not match the kernel shape ({1}x{2})")]
    InvalidKernelShape(usize, usize, usize),

    /// Error when a kernel has no weights.
    #[error("Kernel must have at least one row and one column")]
    EmptyKernel,

    /// Error when a kernel weight is not a finite number.
    #[error("Kernel weight {0} is not finite")]
    NonFiniteKernelWeight(usize),

    /// Error when the kernel depth does not match the number of image channels.
    #[error("Kernel depth ({0}) does not match the number of image channels ({1})")]
    KernelDepthMismatch(usize, usize),

    /// Error when the sampling stride is not valid.
    #[error("Stride must be > 0, got {0}")]
    InvalidStride(usize),

    /// Error when the number of histogram bins is not valid.
    #[error("Invalid number of histogram bins: {0}")]
    InvalidHistogramBins(usize),
}
