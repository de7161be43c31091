use korrel_imgproc::color::GrayscaleMethod;

use crate::error::ConfigError;

/// Resolve a grayscale method from its selector.
///
/// `g` (or `green`) selects [`GrayscaleMethod::GreenReplicate`] and `y` (or
/// `luma`) selects [`GrayscaleMethod::LumaWeighted`]. Case is ignored.
///
/// # Example
///
/// ```
/// use korrel_imgproc::color::GrayscaleMethod;
/// use korrel_pipeline::config::grayscale_method;
///
/// assert_eq!(grayscale_method("Y").unwrap(), GrayscaleMethod::LumaWeighted);
/// assert!(grayscale_method("hsv").is_err());
/// ```
pub fn grayscale_method(selector: &str) -> Result<GrayscaleMethod, ConfigError> {
    match selector.trim().to_ascii_lowercase().as_str() {
        "g" | "green" => Ok(GrayscaleMethod::GreenReplicate),
        "y" | "luma" => Ok(GrayscaleMethod::LumaWeighted),
        _ => Err(ConfigError::UnknownGrayscaleMethod(selector.to_string())),
    }
}
