use korrel_image::{Image, ImageError};

use super::{valid_range, Kernel3d};
use crate::histogram;
use crate::parallel::{self, ExecutionStrategy};

/// Correlate all channels of an image jointly with a 3d kernel.
///
/// For each valid position `(i, j)` the output is the sum over channel `c`,
/// row offset `di` and column offset `dj` of
/// `src[i - ph + di, j - pw + dj, c] * kernel[c, di, dj]`, accumulated with the
/// channel innermost. The valid window follows the same rule as
/// [`super::correlate2d`] and every other cell is zero.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination intensity map with shape (H, W, 1).
/// * `kernel` - The joint kernel, with depth equal to `C`.
/// * `strategy` - How the output rows are scheduled.
///
/// # Errors
///
/// Returns an error if the sizes differ or the kernel depth is not `C`.
pub fn correlate3d<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, 1>,
    kernel: &Kernel3d,
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

    if kernel.depth() != C {
        return Err(ImageError::KernelDepthMismatch(kernel.depth(), C));
    }

    let width = src.width();
    let (ph, pw) = kernel.anchor();
    let valid_rows = valid_range(src.height(), kernel.rows());
    let valid_cols = valid_range(width, kernel.cols());
    let src_data = src.as_slice();
    let window_len = kernel.cols() * C;

    parallel::for_each_row(strategy, dst.as_slice_mut(), width, |i, out_row| {
        out_row.iter_mut().for_each(|v| *v = 0.0);

        if !valid_rows.contains(&i) {
            return;
        }

        for j in valid_cols.clone() {
            let mut acc = 0.0f32;
            for di in 0..kernel.rows() {
                // (col, channel) pairs of one window row are contiguous in both buffers
                let start = ((i - ph + di) * width + (j - pw)) * C;
                let window = &src_data[start..start + window_len];
                for (&x, &w) in window.iter().zip(kernel.row(di)) {
                    acc += x * w;
                }
            }
            out_row[j] = acc;
        }
    });

    Ok(())
}

/// Detect edges jointly across channels and return them as a gray image.
///
/// The raw field of [`correlate3d`] is replaced by its absolute value,
/// stretched to `[0, 255]` and replicated into every output channel.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel` - The joint kernel, with depth equal to `C`.
/// * `strategy` - How the output rows are scheduled.
///
/// # Example
///
/// ```
/// use korrel_image::Image;
/// use korrel_imgproc::filter::{joint_channel_edges, kernels};
/// use korrel_imgproc::parallel::ExecutionStrategy;
///
/// let src = Image::<f32, 3>::from_size_val([8, 8].into(), 42.0).unwrap();
/// let mut dst = Image::<f32, 3>::from_size_val(src.size(), 0.0).unwrap();
/// let kernel = kernels::sobel_kernel_3d(kernels::SobelDirection::Horizontal, 3).unwrap();
///
/// joint_channel_edges(&src, &mut dst, &kernel, ExecutionStrategy::ParallelRows).unwrap();
/// // a flat image has no edges
/// assert!(dst.as_slice().iter().all(|&v| v == 0.0));
/// ```
pub fn joint_channel_edges<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel: &Kernel3d,
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

    let mut intensity = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    correlate3d(src, &mut intensity, kernel, strategy)?;

    histogram::abs_inplace(intensity.as_slice_mut());
    histogram::stretch_histogram_inplace(intensity.as_slice_mut());

    dst.as_slice_mut()
        .chunks_exact_mut(C)
        .zip(intensity.as_slice().iter())
        .for_each(|(pixel, &v)| pixel.iter_mut().for_each(|p| *p = v));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{kernels, Kernel2d};

    #[test]
    fn test_correlate3d_channel_weights() -> Result<(), ImageError> {
        // constant channels 1, 2, 3 with a 1x1 kernel weighting them 100, 10, 1
        let src = Image::<f32, 3>::new([2, 2].into(), [1.0, 2.0, 3.0].repeat(4))?;
        let mut dst = Image::from_size_val(src.size(), 0.0)?;
        let kernel = Kernel3d::new(3, 1, 1, vec![100.0, 10.0, 1.0])?;

        correlate3d(&src, &mut dst, &kernel, ExecutionStrategy::Serial)?;
        assert_eq!(dst.as_slice(), &[123.0; 4]);
        Ok(())
    }

    #[test]
    fn test_correlate3d_border_is_zero() -> Result<(), ImageError> {
        let src = Image::<f32, 3>::from_size_val([5, 6].into(), 1.0)?;
        let mut dst = Image::from_size_val(src.size(), -1.0)?;
        let kernel = Kernel3d::new(3, 2, 3, vec![1.0; 18])?;

        correlate3d(&src, &mut dst, &kernel, ExecutionStrategy::ParallelRows)?;

        // rows [1, 6), cols [1, 4)
        for y in 0..6 {
            for x in 0..5 {
                let inside = (1..6).contains(&y) && (1..4).contains(&x);
                let expected = if inside { 18.0 } else { 0.0 };
                assert_eq!(*dst.get_pixel(x, y, 0)?, expected, "cell ({x}, {y})");
            }
        }
        Ok(())
    }

    #[test]
    fn test_correlate3d_matches_sum_of_planes() -> Result<(), ImageError> {
        use crate::filter::{correlate2d, CorrelationParams};

        let size = [6, 5].into();
        let data = (0..6 * 5 * 3).map(|i| ((i * 37) % 251) as f32).collect();
        let src = Image::<f32, 3>::new(size, data)?;
        let planes = [
            Kernel2d::new(2, 2, vec![1.0, -1.0, 0.0, 2.0])?,
            Kernel2d::new(2, 2, vec![0.0, 1.0, 1.0, 0.0])?,
            Kernel2d::new(2, 2, vec![-2.0, 0.0, 0.0, 1.0])?,
        ];
        let kernel = Kernel3d::from_planes(&planes)?;

        let mut joint = Image::from_size_val(size, 0.0)?;
        correlate3d(&src, &mut joint, &kernel, ExecutionStrategy::Serial)?;

        let channels = src.split_channels()?;
        let mut expected = vec![0.0f32; 30];
        for (channel, plane) in channels.iter().zip(planes.iter()) {
            let mut out = Image::from_size_val(size, 0.0)?;
            correlate2d(
                channel,
                &mut out,
                plane,
                &CorrelationParams::default(),
                ExecutionStrategy::Serial,
            )?;
            expected
                .iter_mut()
                .zip(out.as_slice())
                .for_each(|(e, &v)| *e += v);
        }

        // integer valued inputs keep both summation orders exact
        assert_eq!(joint.as_slice(), expected.as_slice());
        Ok(())
    }

    #[test]
    fn test_correlate3d_depth_mismatch() -> Result<(), ImageError> {
        let src = Image::<f32, 3>::from_size_val([3, 3].into(), 0.0)?;
        let mut dst = Image::from_size_val(src.size(), 0.0)?;
        let kernel = Kernel3d::new(2, 1, 1, vec![1.0, 1.0])?;
        assert_eq!(
            correlate3d(&src, &mut dst, &kernel, ExecutionStrategy::Serial),
            Err(ImageError::KernelDepthMismatch(2, 3))
        );
        Ok(())
    }

    #[test]
    fn test_joint_channel_edges_replicated() -> Result<(), ImageError> {
        // red step along the columns, green and blue flat
        let size = [6, 5].into();
        let data = (0..30)
            .flat_map(|i| {
                let x = i % 6;
                [if x < 3 { 10.0 } else { 200.0 }, 80.0, 80.0]
            })
            .collect();
        let src = Image::<f32, 3>::new(size, data)?;
        let mut dst = Image::from_size_val(size, 0.0)?;
        let kernel = kernels::sobel_kernel_3d(kernels::SobelDirection::Horizontal, 3)?;

        joint_channel_edges(&src, &mut dst, &kernel, ExecutionStrategy::ParallelRows)?;

        let mut max = 0.0f32;
        for pixel in dst.as_slice().chunks_exact(3) {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
            assert!(pixel[0] >= 0.0);
            max = max.max(pixel[0]);
        }
        assert_eq!(max, 255.0);
        // columns next to the step carry the edge
        assert_eq!(*dst.get_pixel(2, 2, 0)?, 255.0);
        assert_eq!(*dst.get_pixel(3, 2, 1)?, 255.0);
        assert_eq!(*dst.get_pixel(1, 2, 2)?, 0.0);
        Ok(())
    }
}
