use std::fmt;

use korrel_image::{ops, Image};
use korrel_imgproc::color::{gray_replicated_from_rgb, GrayscaleMethod};
use korrel_imgproc::filter::{correlate2d_channels, joint_channel_edges};
use korrel_imgproc::parallel::ExecutionStrategy;

use crate::config;
use crate::descriptor::{FilterDescriptor, FilterKernel, FilterKind};
use crate::error::PipelineError;

/// The stages a filter invocation walks through.
///
/// Every invocation starts and ends in [`PipelineState::Idle`]; a failure
/// returns there directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineState {
    /// Waiting for an invocation.
    #[default]
    Idle,
    /// The descriptor has been validated.
    DescriptorParsed,
    /// The kernel has been normalized, if its kind and tag call for it.
    KernelNormalized,
    /// The correlation field has been computed.
    Correlated,
    /// The field has been replaced by its stretched absolute value.
    GradientNormalized,
    /// The field has been clipped and rounded into an 8-bit image.
    Reconstructed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Applies filter descriptors and grayscale conversions to RGB8 images.
///
/// The input image is never modified; each call allocates its own output.
///
/// # Example
///
/// ```
/// use korrel_image::Image;
/// use korrel_imgproc::parallel::ExecutionStrategy;
/// use korrel_pipeline::{FilterKind, FilterPipeline};
///
/// let image = Image::<u8, 3>::from_size_val([4, 4].into(), 100).unwrap();
/// let lines: Vec<Vec<String>> = ["sobel x", "1", "-1 1"]
///     .iter()
///     .map(|l| l.split_whitespace().map(String::from).collect())
///     .collect();
///
/// let mut pipeline = FilterPipeline::new().with_strategy(ExecutionStrategy::Serial);
/// let edges = pipeline
///     .apply_tokens(&image, FilterKind::PlainCorrelation, &lines)
///     .unwrap();
/// assert!(edges.as_slice().iter().all(|&v| v == 0));
/// ```
#[derive(Debug, Default)]
pub struct FilterPipeline {
    strategy: ExecutionStrategy,
    state: PipelineState,
}

/// Lift an 8 bit image into the `f32` working space of the engines.
fn to_f32(image: &Image<u8, 3>) -> Result<Image<f32, 3>, PipelineError> {
    let mut src = Image::<f32, 3>::from_size_val(image.size(), 0.0)?;
    ops::cast_and_scale(image, &mut src, 1.0)?;
    Ok(src)
}

impl FilterPipeline {
    /// Creates a new pipeline running on the global thread pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how output rows are scheduled.
    ///
    /// The result does not depend on the strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The execution strategy.
    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// The current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("pipeline state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Apply a validated filter descriptor to an image.
    ///
    /// Plain and parameterized descriptors correlate each channel with the 2d
    /// kernel; joint channel descriptors produce a stretched edge map that is
    /// replicated into the three channels. The float result is clipped to
    /// `[0, 255]` and rounded.
    ///
    /// # Arguments
    ///
    /// * `image` - The input image.
    /// * `descriptor` - The filter to apply.
    ///
    /// # Returns
    ///
    /// A new image with the same size as the input.
    pub fn apply(
        &mut self,
        image: &Image<u8, 3>,
        descriptor: &FilterDescriptor,
    ) -> Result<Image<u8, 3>, PipelineError> {
        let res = self.run_filter(image, descriptor);
        self.transition(PipelineState::Idle);

        if res.is_ok() {
            log::info!(
                "applied {} filter '{}' to a {} image",
                descriptor.kind(),
                descriptor.tag(),
                image.size()
            );
        }
        res
    }

    fn run_filter(
        &mut self,
        image: &Image<u8, 3>,
        descriptor: &FilterDescriptor,
    ) -> Result<Image<u8, 3>, PipelineError> {
        self.transition(PipelineState::DescriptorParsed);
        // normalization is settled when the descriptor is built
        self.transition(PipelineState::KernelNormalized);

        let src = to_f32(image)?;
        let mut field = Image::<f32, 3>::from_size_val(image.size(), 0.0)?;

        let stretched = match descriptor.kernel() {
            FilterKernel::Planar(kernel) => {
                let params = descriptor.correlation_params().unwrap_or_default();
                correlate2d_channels(&src, &mut field, kernel, &params, self.strategy)?;
                params.gradient
            }
            FilterKernel::Joint(kernel) => {
                joint_channel_edges(&src, &mut field, kernel, self.strategy)?;
                true
            }
        };

        self.transition(PipelineState::Correlated);
        if stretched {
            self.transition(PipelineState::GradientNormalized);
        }

        let mut out = Image::<u8, 3>::from_size_val(image.size(), 0)?;
        ops::clip_round_u8(&field, &mut out)?;
        self.transition(PipelineState::Reconstructed);

        Ok(out)
    }

    /// Validate tokenized descriptor lines and apply the filter to an image.
    ///
    /// # Arguments
    ///
    /// * `image` - The input image.
    /// * `kind` - The kind of filter the lines describe.
    /// * `lines` - The descriptor lines, each split into tokens.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Descriptor`] if the lines do not describe a
    /// valid filter. Nothing is computed in that case.
    pub fn apply_tokens(
        &mut self,
        image: &Image<u8, 3>,
        kind: FilterKind,
        lines: &[Vec<String>],
    ) -> Result<Image<u8, 3>, PipelineError> {
        let descriptor = FilterDescriptor::from_tokens(kind, lines).inspect_err(|e| {
            log::warn!("rejected {kind} filter descriptor: {e}");
        })?;
        self.apply(image, &descriptor)
    }

    /// Like [`FilterPipeline::apply_tokens`] but always returns an image.
    ///
    /// On failure the returned image is a copy of the input, paired with the
    /// diagnostic.
    pub fn apply_or_keep(
        &mut self,
        image: &Image<u8, 3>,
        kind: FilterKind,
        lines: &[Vec<String>],
    ) -> (Image<u8, 3>, Option<PipelineError>) {
        match self.apply_tokens(image, kind, lines) {
            Ok(filtered) => (filtered, None),
            Err(e) => {
                log::warn!("keeping the original image: {e}");
                (image.clone(), Some(e))
            }
        }
    }

    /// Convert an image to a gray looking RGB image.
    ///
    /// # Arguments
    ///
    /// * `image` - The input image.
    /// * `method` - The gray value replicated into the three channels.
    pub fn grayscale(
        &mut self,
        image: &Image<u8, 3>,
        method: GrayscaleMethod,
    ) -> Result<Image<u8, 3>, PipelineError> {
        let src = to_f32(image)?;
        let mut gray = Image::<f32, 3>::from_size_val(image.size(), 0.0)?;
        gray_replicated_from_rgb(&src, &mut gray, method)?;

        let mut out = Image::<u8, 3>::from_size_val(image.size(), 0)?;
        ops::clip_round_u8(&gray, &mut out)?;

        log::info!("converted a {} image to gray with {method:?}", image.size());
        Ok(out)
    }

    /// Convert an image to a gray looking RGB image, selecting the method by name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the selector is not `g` or `y`.
    pub fn grayscale_with_selector(
        &mut self,
        image: &Image<u8, 3>,
        selector: &str,
    ) -> Result<Image<u8, 3>, PipelineError> {
        let method = config::grayscale_method(selector).inspect_err(|e| {
            log::warn!("rejected grayscale selector: {e}");
        })?;
        self.grayscale(image, method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, DescriptorError};
    use korrel_imgproc::filter::{Activation, Kernel2d, Kernel3d};

    fn lines(text: &[&str]) -> Vec<Vec<String>> {
        text.iter()
            .map(|l| l.split_whitespace().map(String::from).collect())
            .collect()
    }

    fn gradient_image() -> Result<Image<u8, 3>, PipelineError> {
        let size = [5, 4].into();
        let data = (0..20u8)
            .flat_map(|i| [i * 10, i * 5, 200 - i * 3])
            .collect();
        Ok(Image::new(size, data)?)
    }

    #[test]
    fn working_space_keeps_values() -> Result<(), PipelineError> {
        let image = gradient_image()?;
        let src = to_f32(&image)?;
        assert_eq!(src.size(), image.size());
        for (a, &b) in src.as_slice().iter().zip(image.as_slice()) {
            assert_eq!(*a, b as f32);
        }
        Ok(())
    }

    #[test]
    fn identity_kernel_keeps_interior() -> Result<(), PipelineError> {
        let image = gradient_image()?;
        let descriptor = FilterDescriptor::plain(
            "identity",
            Kernel2d::new(3, 3, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0])?,
        );

        let mut pipeline = FilterPipeline::new();
        let out = pipeline.apply(&image, &descriptor)?;
        assert_eq!(pipeline.state(), PipelineState::Idle);

        for y in 0..4 {
            for x in 0..5 {
                for c in 0..3 {
                    let v = *out.get_pixel(x, y, c)?;
                    if (1..3).contains(&y) && (1..4).contains(&x) {
                        assert_eq!(v, *image.get_pixel(x, y, c)?);
                    } else {
                        assert_eq!(v, 0);
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    fn relu_and_clipping() -> Result<(), PipelineError> {
        let image = Image::<u8, 3>::new([3, 1].into(), vec![0, 0, 0, 10, 10, 10, 250, 250, 250])?;
        // difference kernel, not normalized since it sums to zero
        let kernel = Kernel2d::new(1, 2, vec![-1.0, 1.0])?;

        let descriptor =
            FilterDescriptor::parameterized("diff", kernel.clone(), 20.0, 1, Activation::Identity)?;
        let out = FilterPipeline::new().apply(&image, &descriptor)?;
        // 10 + 20 = 30, 240 + 20 = 260 -> 255
        assert_eq!(out.as_slice(), &[0, 0, 0, 30, 30, 30, 255, 255, 255]);

        let descriptor =
            FilterDescriptor::parameterized("diff", kernel, -20.0, 1, Activation::Relu)?;
        let out = FilterPipeline::new().apply(&image, &descriptor)?;
        assert_eq!(out.as_slice(), &[0, 0, 0, 0, 0, 0, 220, 220, 220]);
        Ok(())
    }

    #[test]
    fn joint_channel_replicates() -> Result<(), PipelineError> {
        let image = gradient_image()?;
        let kernel = Kernel3d::new(3, 1, 2, vec![-1.0, 1.0, -1.0, 1.0, -1.0, 1.0])?;
        let descriptor = FilterDescriptor::joint_channel_3d("box3d", kernel)?;

        let out = FilterPipeline::new()
            .with_strategy(ExecutionStrategy::Serial)
            .apply(&image, &descriptor)?;

        for pixel in out.as_slice().chunks_exact(3) {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
        }
        // the stretched maximum is exactly 255
        assert_eq!(out.as_slice().iter().max(), Some(&255));
        Ok(())
    }

    #[test]
    fn invalid_descriptor_keeps_image() -> Result<(), PipelineError> {
        let image = gradient_image()?;
        let mut pipeline = FilterPipeline::new();

        let (out, err) = pipeline.apply_or_keep(
            &image,
            FilterKind::ParameterizedCorrelation,
            &lines(&["blur", "0", "1", "softmax", "1", "1"]),
        );
        assert_eq!(out, image);
        assert_eq!(
            err,
            Some(PipelineError::Descriptor(DescriptorError::UnknownActivation(
                "softmax".to_string()
            )))
        );
        assert_eq!(pipeline.state(), PipelineState::Idle);
        Ok(())
    }

    #[test]
    fn grayscale_methods() -> Result<(), PipelineError> {
        let image = Image::<u8, 3>::new([2, 1].into(), vec![10, 20, 30, 255, 255, 255])?;
        let mut pipeline = FilterPipeline::new();

        let green = pipeline.grayscale_with_selector(&image, "g")?;
        assert_eq!(green.as_slice(), &[20, 20, 20, 255, 255, 255]);

        let luma = pipeline.grayscale_with_selector(&image, "Y")?;
        // 0.299 * 10 + 0.587 * 20 + 0.114 * 30 = 18.15
        assert_eq!(luma.as_slice(), &[18, 18, 18, 255, 255, 255]);

        assert_eq!(
            pipeline.grayscale_with_selector(&image, "hsv"),
            Err(PipelineError::Config(ConfigError::UnknownGrayscaleMethod(
                "hsv".to_string()
            )))
        );
        Ok(())
    }
}
