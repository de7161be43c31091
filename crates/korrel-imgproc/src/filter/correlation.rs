use std::ops::Range;

use korrel_image::{Image, ImageError, ImageSize};

use super::Kernel2d;
use crate::histogram;
use crate::parallel::{self, ExecutionStrategy};

/// Elementwise nonlinearity applied after the bias.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activation {
    /// Leave the value unchanged.
    #[default]
    Identity,
    /// Rectified linear unit, `max(0, x)`.
    Relu,
}

impl Activation {
    /// Apply the activation to a value.
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Identity => x,
            Activation::Relu => x.max(0.0),
        }
    }
}

/// Parameters of a correlation pass.
///
/// The default value describes a plain correlation: no bias, every valid
/// position computed, identity activation and no gradient post-processing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrelationParams {
    /// Constant added to every correlation result before the activation.
    pub bias: f32,
    /// Spacing between computed output positions along both axes, `>= 1`.
    pub stride: usize,
    /// Nonlinearity applied after the bias.
    pub activation: Activation,
    /// Take the absolute value of the field and stretch it to `[0, 255]`.
    pub gradient: bool,
}

impl Default for CorrelationParams {
    fn default() -> Self {
        Self {
            bias: 0.0,
            stride: 1,
            activation: Activation::Identity,
            gradient: false,
        }
    }
}

/// The output positions along one axis where a kernel of `ksize` taps fits
/// entirely inside a signal of `len` samples.
///
/// The window around position `i` spans `[i - ksize / 2, i + ksize - ksize / 2)`,
/// so the range is `[ksize / 2, len - (ksize - ksize / 2 - 1))`, or empty when
/// the kernel is larger than the signal.
///
/// # Example
///
/// ```
/// use korrel_imgproc::filter::valid_range;
///
/// assert_eq!(valid_range(5, 3), 1..4);
/// assert_eq!(valid_range(5, 2), 1..5);
/// assert!(valid_range(2, 3).is_empty());
/// ```
pub fn valid_range(len: usize, ksize: usize) -> Range<usize> {
    let anchor = ksize / 2;
    let tail = ksize.saturating_sub(anchor + 1);
    let end = len.saturating_sub(tail);
    anchor..end.max(anchor)
}

/// Correlate one channel of an interleaved buffer into a `H x W` field.
///
/// Cells outside the valid window, or skipped by the stride, are zero.
fn correlate_plane<const C: usize>(
    src: &[f32],
    size: ImageSize,
    channel: usize,
    kernel: &Kernel2d,
    params: &CorrelationParams,
    strategy: ExecutionStrategy,
    out: &mut [f32],
) {
    let (ph, pw) = kernel.anchor();
    let valid_rows = valid_range(size.height, kernel.rows());
    let valid_cols = valid_range(size.width, kernel.cols());
    let stride = params.stride;

    parallel::for_each_row(strategy, out, size.width, |i, out_row| {
        out_row.iter_mut().for_each(|v| *v = 0.0);

        if !valid_rows.contains(&i) || (i - valid_rows.start) % stride != 0 {
            return;
        }

        for j in valid_cols.clone().step_by(stride) {
            let mut acc = 0.0f32;
            for di in 0..kernel.rows() {
                let base = ((i - ph + di) * size.width + (j - pw)) * C + channel;
                for (dj, &w) in kernel.row(di).iter().enumerate() {
                    acc += src[base + dj * C] * w;
                }
            }
            out_row[j] = params.activation.apply(acc + params.bias);
        }
    });

    if params.gradient {
        histogram::abs_inplace(out);
        histogram::stretch_histogram_inplace(out);
    }
}

fn check_params(params: &CorrelationParams) -> Result<(), ImageError> {
    if params.stride == 0 {
        return Err(ImageError::InvalidStride(params.stride));
    }
    Ok(())
}

/// Correlate a single channel image with a 2d kernel.
///
/// For each valid position `(i, j)`, stepped by `params.stride` from the first
/// valid row and column, the output is
/// `activation(sum(src[i - ph + di, j - pw + dj] * kernel[di, dj]) + bias)`
/// with `(ph, pw)` the kernel anchor. Every other cell is zero. The kernel is
/// not flipped. With `params.gradient` set the whole field is replaced by its
/// absolute value stretched to `[0, 255]`.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, 1).
/// * `dst` - The destination image with shape (H, W, 1).
/// * `kernel` - The correlation kernel.
/// * `params` - The bias, stride, activation and gradient mode.
/// * `strategy` - How the output rows are scheduled.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
///
/// # Example
///
/// ```
/// use korrel_image::Image;
/// use korrel_imgproc::filter::{correlate2d, CorrelationParams, Kernel2d};
/// use korrel_imgproc::parallel::ExecutionStrategy;
///
/// let src = Image::<f32, 1>::new([3, 1].into(), vec![1.0, 2.0, 4.0]).unwrap();
/// let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0).unwrap();
/// let kernel = Kernel2d::new(1, 2, vec![-1.0, 1.0]).unwrap();
///
/// correlate2d(&src, &mut dst, &kernel, &CorrelationParams::default(), ExecutionStrategy::Serial)
///     .unwrap();
/// assert_eq!(dst.as_slice(), &[0.0, 1.0, 2.0]);
/// ```
pub fn correlate2d(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel: &Kernel2d,
    params: &CorrelationParams,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    correlate2d_channels(src, dst, kernel, params, strategy)
}

/// Correlate every channel of an image independently with the same 2d kernel.
///
/// Each channel goes through [`correlate2d`]; in gradient mode the histogram
/// stretch uses the range of each channel separately.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn correlate2d_channels<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel: &Kernel2d,
    params: &CorrelationParams,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    check_params(params)?;

    let size = src.size();
    let mut plane = vec![0.0f32; size.width * size.height];

    for ch in 0..C {
        correlate_plane::<C>(
            src.as_slice(),
            size,
            ch,
            kernel,
            params,
            strategy,
            &mut plane,
        );

        dst.as_slice_mut()
            .chunks_exact_mut(C)
            .zip(plane.iter())
            .for_each(|(pixel, &v)| pixel[ch] = v);
    }

    Ok(())
}
