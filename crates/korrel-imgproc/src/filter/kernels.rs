use korrel_image::ImageError;

use super::{Kernel2d, Kernel3d};

/// The axis along which a gradient kernel differentiates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SobelDirection {
    /// Derivative along the columns, responds to vertical edges.
    Horizontal,
    /// Derivative along the rows, responds to horizontal edges.
    Vertical,
}

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A vector of the kernel.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = kernel_size.saturating_sub(1) as f32 / 2.0;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f32 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Create the separable pair of a 3x3 sobel kernel.
///
/// # Returns
///
/// The `(derivative, smoothing)` 1d kernels.
pub fn sobel_kernel_1d() -> (Vec<f32>, Vec<f32>) {
    (vec![-1.0, 0.0, 1.0], vec![1.0, 2.0, 1.0])
}

/// Build a 2d kernel as the outer product `column * row`.
///
/// # Errors
///
/// Returns an error if one of the vectors is empty.
pub fn outer_product(column: &[f32], row: &[f32]) -> Result<Kernel2d, ImageError> {
    let data = column
        .iter()
        .flat_map(|&c| row.iter().map(move |&r| c * r))
        .collect();
    Kernel2d::new(column.len(), row.len(), data)
}

/// Create a kernel with a single unit weight at the anchor.
///
/// Correlating with it copies every valid pixel unchanged.
///
/// # Errors
///
/// Returns an error if `rows` or `cols` is zero.
pub fn identity_kernel_2d(rows: usize, cols: usize) -> Result<Kernel2d, ImageError> {
    let mut data = vec![0.0; rows * cols];
    if let Some(w) = data.get_mut((rows / 2) * cols + cols / 2) {
        *w = 1.0;
    }
    Kernel2d::new(rows, cols, data)
}

/// Create a box kernel of ones.
///
/// The weights are not normalized, mirroring how averaging filters are
/// usually written down before normalization.
///
/// # Errors
///
/// Returns an error if `rows` or `cols` is zero.
pub fn box_kernel_2d(rows: usize, cols: usize) -> Result<Kernel2d, ImageError> {
    Kernel2d::new(rows, cols, vec![1.0; rows * cols])
}

/// Create a normalized 2d gaussian kernel.
///
/// # Errors
///
/// Returns an error if `kernel_size` is zero.
pub fn gaussian_kernel_2d(kernel_size: usize, sigma: f32) -> Result<Kernel2d, ImageError> {
    let kernel = gaussian_kernel_1d(kernel_size, sigma);
    outer_product(&kernel, &kernel)
}

/// Create a 3x3 sobel kernel.
///
/// # Example
///
/// ```
/// use korrel_imgproc::filter::kernels::{sobel_kernel_2d, SobelDirection};
///
/// let kernel = sobel_kernel_2d(SobelDirection::Horizontal).unwrap();
/// assert_eq!(kernel.row(1), &[-2.0, 0.0, 2.0]);
/// assert_eq!(kernel.sum(), 0.0);
/// ```
pub fn sobel_kernel_2d(direction: SobelDirection) -> Result<Kernel2d, ImageError> {
    let (derivative, smoothing) = sobel_kernel_1d();
    match direction {
        SobelDirection::Horizontal => outer_product(&smoothing, &derivative),
        SobelDirection::Vertical => outer_product(&derivative, &smoothing),
    }
}

/// Create a joint channel sobel kernel, the same 3x3 plane for every channel.
///
/// # Errors
///
/// Returns an error if `depth` is zero.
pub fn sobel_kernel_3d(direction: SobelDirection, depth: usize) -> Result<Kernel3d, ImageError> {
    let plane = sobel_kernel_2d(direction)?;
    Kernel3d::from_planes(&vec![plane; depth])
}
