use crate::parallel;
use korrel_image::{Image, ImageError};

/// Luma weights of the red, green and blue channels.
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Index of the green channel in an RGB pixel.
const GREEN: usize = 1;

/// How a color pixel is reduced to a single gray value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrayscaleMethod {
    /// Take the green channel as is.
    GreenReplicate,
    /// Take the luma `0.299 * R + 0.587 * G + 0.114 * B`.
    LumaWeighted,
}

fn check_same_size<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &Image<T2, C2>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    Ok(())
}

/// Reduce an RGB image to its luma.
///
/// Each output sample is `0.299 * R + 0.587 * G + 0.114 * B`, computed row by
/// row on the rayon pool.
///
/// # Arguments
///
/// * `src` - The RGB image with shape (H, W, 3).
/// * `dst` - The luma image with shape (H, W, 1).
///
/// # Errors
///
/// Returns an error if the sizes differ.
///
/// # Example
///
/// ```
/// use korrel_image::Image;
/// use korrel_imgproc::color::gray_from_rgb;
///
/// let rgb = Image::<f32, 3>::new([2, 1].into(), vec![255.0, 255.0, 255.0, 0.0, 100.0, 0.0]).unwrap();
/// let mut luma = Image::<f32, 1>::from_size_val(rgb.size(), 0.0).unwrap();
///
/// gray_from_rgb(&rgb, &mut luma).unwrap();
/// assert!((luma.as_slice()[0] - 255.0).abs() < 1e-3);
/// assert!((luma.as_slice()[1] - 58.7).abs() < 1e-3);
/// ```
pub fn gray_from_rgb<T>(src: &Image<T, 3>, dst: &mut Image<T, 1>) -> Result<(), ImageError>
where
    T: Send + Sync + num_traits::Float,
{
    check_same_size(src, dst)?;

    let [rw, gw, bw] = luma_weights::<T>()?;

    parallel::par_iter_rows(src, dst, |rgb, luma| {
        luma[0] = rw * rgb[0] + gw * rgb[1] + bw * rgb[2];
    });

    Ok(())
}

/// Spread a single channel image into the three channels of an RGB image.
///
/// # Arguments
///
/// * `src` - The single channel image with shape (H, W, 1).
/// * `dst` - The RGB image with shape (H, W, 3).
///
/// # Errors
///
/// Returns an error if the sizes differ.
pub fn rgb_from_gray<T>(src: &Image<T, 1>, dst: &mut Image<T, 3>) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    check_same_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |gray, rgb| {
        rgb.iter_mut().for_each(|v| *v = gray[0]);
    });

    Ok(())
}

/// Convert an RGB image to a gray looking RGB image.
///
/// The gray value chosen by `method` is extracted into a single channel and
/// then spread into the three output channels with [`rgb_from_gray`]. No
/// normalization is applied: the green channel is copied and the luma is a
/// convex combination, so inputs in `[0, 255]` stay in that range up to rounding.
///
/// # Arguments
///
/// * `src` - The input RGB image.
/// * `dst` - The output RGB image.
/// * `method` - The gray value to replicate.
///
/// # Example
///
/// ```
/// use korrel_image::Image;
/// use korrel_imgproc::color::{gray_replicated_from_rgb, GrayscaleMethod};
///
/// let image = Image::<f32, 3>::new([1, 1].into(), vec![10.0, 20.0, 30.0]).unwrap();
/// let mut gray = Image::<f32, 3>::from_size_val(image.size(), 0.0).unwrap();
///
/// gray_replicated_from_rgb(&image, &mut gray, GrayscaleMethod::GreenReplicate).unwrap();
/// assert_eq!(gray.as_slice(), &[20.0, 20.0, 20.0]);
/// ```
pub fn gray_replicated_from_rgb<T>(
    src: &Image<T, 3>,
    dst: &mut Image<T, 3>,
    method: GrayscaleMethod,
) -> Result<(), ImageError>
where
    T: Send + Sync + num_traits::Float,
{
    check_same_size(src, dst)?;

    let gray = match method {
        GrayscaleMethod::GreenReplicate => src.channel(GREEN)?,
        GrayscaleMethod::LumaWeighted => {
            let mut luma = Image::<T, 1>::from_size_val(src.size(), T::zero())?;
            gray_from_rgb(src, &mut luma)?;
            luma
        }
    };

    rgb_from_gray(&gray, dst)
}

fn luma_weights<T: num_traits::Float>() -> Result<[T; 3], ImageError> {
    let mut weights = [T::zero(); 3];
    for (w, &l) in weights.iter_mut().zip(LUMA_WEIGHTS.iter()) {
        *w = T::from(l)
            .ok_or_else(|| ImageError::CastError(std::any::type_name::<T>().to_string()))?;
    }
    Ok(weights)
}
