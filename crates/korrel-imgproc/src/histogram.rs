use korrel_image::{Image, ImageError};
use rayon::prelude::*;

/// Replace every value by its absolute value.
pub fn abs_inplace(values: &mut [f32]) {
    values.iter_mut().for_each(|v| *v = v.abs());
}

/// Linearly map the values of a field onto `[0, 255]`.
///
/// With `lo` and `hi` the minimum and maximum of the finite values of the
/// field, each value becomes `(x - lo) * 255 / (hi - lo)`, so the minimum lands
/// on exactly 0 and the maximum on exactly 255. The quotient is taken in `f64`
/// so that a range wider than `f32::MAX` still scales.
///
/// A field that is constant or has no finite value is set to zero.
/// `NaN` maps to 0, `+inf` to 255 and `-inf` to 0.
///
/// # Example
///
/// ```
/// use korrel_imgproc::histogram::stretch_histogram_inplace;
///
/// let mut field = vec![10.0, 20.0, 30.0];
/// stretch_histogram_inplace(&mut field);
/// assert_eq!(field, vec![0.0, 127.5, 255.0]);
///
/// let mut flat = vec![7.0; 4];
/// stretch_histogram_inplace(&mut flat);
/// assert_eq!(flat, vec![0.0; 4]);
/// ```
pub fn stretch_histogram_inplace(values: &mut [f32]) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if lo >= hi {
        values.iter_mut().for_each(|v| *v = 0.0);
        return;
    }

    let range = f64::from(hi) - f64::from(lo);
    values.iter_mut().for_each(|v| {
        *v = if v.is_nan() || *v <= lo {
            0.0
        } else if *v >= hi {
            // pin the maximum, the scaled quotient may round just below 255
            255.0
        } else {
            ((f64::from(*v) - f64::from(lo)) * 255.0 / range) as f32
        };
    });
}

/// Stretch the values of an image onto `[0, 255]`.
///
/// The minimum and maximum are taken over all channels together; see
/// [`stretch_histogram_inplace`].
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `dst` - The output image with shape (H, W, C).
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn stretch_histogram<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    dst.as_slice_mut().copy_from_slice(src.as_slice());
    stretch_histogram_inplace(dst.as_slice_mut());

    Ok(())
}

/// Compute the pixel intensity histogram of an image.
///
/// NOTE: this is limited to 8-bit images; all channels are counted together.
///
/// # Arguments
///
/// * `src` - The input image to compute the histogram.
/// * `hist` - The output histogram, counts are added to it.
/// * `num_bins` - The number of bins to use for the histogram.
///
/// # Errors
///
/// Returns an error if the number of bins is invalid.
///
/// # Example
///
/// ```
/// use korrel_image::{Image, ImageSize};
/// use korrel_imgproc::histogram::compute_histogram;
///
/// let image = Image::<u8, 1>::new(
///     ImageSize {
///         width: 3,
///         height: 3,
///     },
///     vec![0, 2, 4, 128, 130, 132, 254, 255, 255],
/// )
/// .unwrap();
///
/// let mut histogram = vec![0; 3];
///
/// compute_histogram(&image, &mut histogram, 3).unwrap();
/// assert_eq!(histogram, vec![3, 3, 3]);
/// ```
pub fn compute_histogram<const C: usize>(
    src: &Image<u8, C>,
    hist: &mut [usize],
    num_bins: usize,
) -> Result<(), ImageError> {
    if num_bins == 0 || num_bins > 256 || hist.len() != num_bins {
        return Err(ImageError::InvalidHistogramBins(num_bins));
    }

    let mut bin_lut = [0usize; 256];
    for (i, bin) in bin_lut.iter_mut().enumerate() {
        *bin = (i * num_bins) >> 8;
    }

    let counts = src
        .as_slice()
        .par_chunks(4096)
        .fold(
            || vec![0usize; num_bins],
            |mut local, chunk| {
                for &px in chunk {
                    local[bin_lut[px as usize]] += 1;
                }
                local
            },
        )
        .reduce(
            || vec![0usize; num_bins],
            |mut a, b| {
                a.iter_mut().zip(b.iter()).for_each(|(x, y)| *x += y);
                a
            },
        );

    hist.iter_mut()
        .zip(counts.iter())
        .for_each(|(h, c)| *h += c);

    Ok(())
}
