use std::path::{Path, PathBuf};

use korrel_image::{Image, ImageSize};

use crate::error::IoError;

/// File extensions accepted by [`read_image_any_rgb8`] and [`write_image_any`].
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "tif", "tiff", "bmp"];

fn check_extension(file_path: &Path) -> Result<(), IoError> {
    let supported = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));

    if !supported {
        return Err(IoError::InvalidFileExtension(file_path.to_path_buf()));
    }
    Ok(())
}

/// Reads an image from the given file path and converts it to RGB8.
///
/// The method reads any of the [`SUPPORTED_EXTENSIONS`] formats decoded by the
/// image crate. Grayscale and alpha images are converted to three channels.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An RGB8 image containing the image data.
///
/// # Errors
///
/// Returns an error if the file does not exist, has an unsupported extension
/// or cannot be decoded.
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path: PathBuf = file_path.as_ref().to_owned();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path));
    }

    check_extension(&file_path)?;

    let img = image::ImageReader::open(&file_path)?
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    let image = Image::<u8, 3>::new(size, img.into_rgb8().into_raw())?;

    log::debug!("read {} ({})", file_path.display(), size);

    Ok(image)
}

/// Writes an RGB8 image to the given file path.
///
/// The format is chosen from the file extension.
///
/// # Arguments
///
/// * `file_path` - The path to the output image.
/// * `image` - The image to write.
pub fn write_image_any(file_path: impl AsRef<Path>, image: &Image<u8, 3>) -> Result<(), IoError> {
    let file_path = file_path.as_ref();

    check_extension(file_path)?;

    image::save_buffer(
        file_path,
        image.as_slice(),
        image.width() as u32,
        image.height() as u32,
        image::ExtendedColorType::Rgb8,
    )?;

    log::debug!("wrote {} ({})", file_path.display(), image.size());

    Ok(())
}
