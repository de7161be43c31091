use crate::{Image, ImageError};

/// Cast the pixel data of an image to a different type.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image.
/// * `scale` - The scale to multiply the pixel data with.
///
/// Example:
///
/// ```
/// use korrel_image::{Image, ImageSize};
/// use korrel_image::ops::cast_and_scale;
///
/// let image = Image::<u8, 1>::new(
///     ImageSize {
///         width: 2,
///         height: 1,
///     },
///     vec![0u8, 255],
/// )
/// .unwrap();
///
/// let mut image_f32 = Image::from_size_val(image.size(), 0.0f32).unwrap();
///
/// cast_and_scale(&image, &mut image_f32, 1. / 255.0).unwrap();
///
/// assert_eq!(image_f32.get_pixel(0, 0, 0).unwrap(), &0.0f32);
/// assert_eq!(image_f32.get_pixel(1, 0, 0).unwrap(), &1.0f32);
/// ```
pub fn cast_and_scale<T, U, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<U, C>,
    scale: U,
) -> Result<(), ImageError>
where
    T: Copy + num_traits::NumCast,
    U: Copy + num_traits::NumCast + std::ops::Mul<U, Output = U>,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    dst.as_slice_mut()
        .iter_mut()
        .zip(src.as_slice().iter())
        .try_for_each(|(out, &inp)| {
            let x = U::from(inp).ok_or(ImageError::CastError(
                std::any::type_name::<U>().to_string(),
            ))?;
            *out = x * scale;
            Ok::<(), ImageError>(())
        })?;

    Ok(())
}

/// Reconstruct an 8-bit image from floating point samples.
///
/// Every sample is clipped to `[0, 255]` and rounded to the nearest integer,
/// with halfway cases rounded away from zero.
///
/// # Arguments
///
/// * `src` - The source image with unclamped floating point samples.
/// * `dst` - The destination 8-bit image.
///
/// Example:
///
/// ```
/// use korrel_image::Image;
/// use korrel_image::ops::clip_round_u8;
///
/// let image = Image::<f32, 1>::new([4, 1].into(), vec![-12.0, 7.5, 254.4, 300.0]).unwrap();
/// let mut out = Image::<u8, 1>::from_size_val(image.size(), 0).unwrap();
///
/// clip_round_u8(&image, &mut out).unwrap();
/// assert_eq!(out.as_slice(), &[0, 8, 254, 255]);
/// ```
pub fn clip_round_u8<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<u8, C>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    dst.as_slice_mut()
        .iter_mut()
        .zip(src.as_slice().iter())
        .for_each(|(out, &inp)| {
            // NaN maps to zero
            *out = if inp.is_nan() {
                0
            } else {
                inp.clamp(0.0, 255.0).round() as u8
            };
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageSize;

    #[test]
    fn test_cast_and_scale() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                height: 2,
                width: 1,
            },
            vec![0u8, 0, 255, 0, 0, 255],
        )?;

        let mut image_f64: Image<f64, 3> = Image::from_size_val(image.size(), 0.0)?;

        super::cast_and_scale(&image, &mut image_f64, 1. / 255.0)?;

        let expected = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0];

        assert_eq!(image_f64.as_slice(), expected);

        Ok(())
    }

    #[test]
    fn test_cast_and_scale_size_mismatch() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::from_size_val([2, 2].into(), 1)?;
        let mut out = Image::<f32, 1>::from_size_val([2, 3].into(), 0.0)?;
        assert_eq!(
            cast_and_scale(&image, &mut out, 1.0),
            Err(ImageError::InvalidImageSize(2, 2, 2, 3))
        );
        Ok(())
    }

    #[test]
    fn test_clip_round_u8() -> Result<(), ImageError> {
        let image = Image::<f32, 3>::new(
            [2, 1].into(),
            vec![-0.4, 0.5, 1.49, 254.5, 255.0, 1e6],
        )?;
        let mut out = Image::<u8, 3>::from_size_val(image.size(), 7)?;
        clip_round_u8(&image, &mut out)?;
        assert_eq!(out.as_slice(), &[0, 1, 1, 255, 255, 255]);
        Ok(())
    }
}
