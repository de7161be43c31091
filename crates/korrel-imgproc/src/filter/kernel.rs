use korrel_image::ImageError;

/// A two dimensional correlation kernel of `rows x cols` weights.
///
/// The weights are stored row-major. Both dimensions are at least one and may
/// be even or odd; see [`Kernel2d::anchor`] for how even sizes are positioned.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel2d {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Kernel2d {
    /// Create a new kernel from row-major weights.
    ///
    /// # Arguments
    ///
    /// * `rows` - The number of kernel rows.
    /// * `cols` - The number of kernel columns.
    /// * `data` - The weights, `rows * cols` values in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::EmptyKernel`] if a dimension is zero,
    /// [`ImageError::InvalidKernelShape`] if the data length does not match and
    /// [`ImageError::NonFiniteKernelWeight`] if a weight is `NaN` or infinite.
    ///
    /// # Example
    ///
    /// ```
    /// use korrel_imgproc::filter::Kernel2d;
    ///
    /// let kernel = Kernel2d::new(1, 2, vec![-1.0, 1.0]).unwrap();
    /// assert_eq!(kernel.anchor(), (0, 1));
    /// assert_eq!(kernel.sum(), 0.0);
    /// ```
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, ImageError> {
        if rows == 0 || cols == 0 {
            return Err(ImageError::EmptyKernel);
        }
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(ImageError::InvalidKernelShape(data.len(), rows, cols));
        }
        check_finite(&data)?;
        Ok(Self { rows, cols, data })
    }

    /// Create a new kernel from a list of rows.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no rows, the rows are empty or the rows
    /// have different lengths.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, ImageError> {
        let num_rows = rows.len();
        let num_cols = rows.first().map_or(0, |r| r.len());

        if let Some(bad) = rows.iter().find(|r| r.len() != num_cols) {
            return Err(ImageError::InvalidKernelShape(bad.len(), num_rows, num_cols));
        }

        Self::new(num_rows, num_cols, rows.into_iter().flatten().collect())
    }

    /// The number of kernel rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The number of kernel columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The kernel anchor `(rows / 2, cols / 2)`.
    ///
    /// Odd kernels are centered; even kernels lean toward the lower index side,
    /// so the window around output `(i, j)` spans rows
    /// `[i - anchor.0, i + rows - anchor.0)` and the matching columns.
    pub fn anchor(&self) -> (usize, usize) {
        (self.rows / 2, self.cols / 2)
    }

    /// The weight at `(row, col)`, if in bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    /// The weights of one kernel row.
    ///
    /// PRECONDITION: `row < self.rows()`.
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// The weights in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The sum of all weights.
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Divide every weight by the sum of the weights.
    ///
    /// Kernels whose weights sum to zero, or to a sum too large for `f32`, are
    /// left untouched.
    ///
    /// # Returns
    ///
    /// Whether the kernel was rescaled.
    ///
    /// # Example
    ///
    /// ```
    /// use korrel_imgproc::filter::Kernel2d;
    ///
    /// let mut kernel = Kernel2d::new(1, 4, vec![1.0, 1.0, 1.0, 1.0]).unwrap();
    /// assert!(kernel.normalize_by_sum());
    /// assert_eq!(kernel.as_slice(), &[0.25, 0.25, 0.25, 0.25]);
    /// ```
    pub fn normalize_by_sum(&mut self) -> bool {
        let sum = self.sum();
        if sum == 0.0 || !sum.is_finite() {
            return false;
        }
        self.data.iter_mut().for_each(|w| *w /= sum);
        true
    }
}

/// A joint channel kernel of `depth x rows x cols` weights.
///
/// The weights are kept in (row, col, depth) order so that the channel is the
/// innermost dimension, matching the interleaved layout of [`korrel_image::Image`].
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel3d {
    depth: usize,
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Kernel3d {
    /// Create a new kernel from weights given plane by plane.
    ///
    /// # Arguments
    ///
    /// * `depth` - The number of planes, one per image channel.
    /// * `rows` - The number of kernel rows.
    /// * `cols` - The number of kernel columns.
    /// * `data` - The weights in (depth, row, col) order.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::EmptyKernel`] if a dimension is zero,
    /// [`ImageError::InvalidKernelShape`] if the data length does not match and
    /// [`ImageError::NonFiniteKernelWeight`] if a weight is `NaN` or infinite.
    pub fn new(depth: usize, rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, ImageError> {
        if depth == 0 || rows == 0 || cols == 0 {
            return Err(ImageError::EmptyKernel);
        }
        let plane = rows.checked_mul(cols);
        if plane.and_then(|p| p.checked_mul(depth)) != Some(data.len()) {
            return Err(ImageError::InvalidKernelShape(
                data.len(),
                depth.saturating_mul(rows),
                cols,
            ));
        }
        check_finite(&data)?;

        // (depth, row, col) -> (row, col, depth)
        let mut interleaved = vec![0.0; data.len()];
        for (idx, &w) in data.iter().enumerate() {
            let c = idx / (rows * cols);
            let rc = idx % (rows * cols);
            interleaved[rc * depth + c] = w;
        }

        Ok(Self {
            depth,
            rows,
            cols,
            data: interleaved,
        })
    }

    /// Create a new kernel stacking one 2d kernel per channel.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no planes or the planes differ in shape.
    pub fn from_planes(planes: &[Kernel2d]) -> Result<Self, ImageError> {
        let Some(first) = planes.first() else {
            return Err(ImageError::EmptyKernel);
        };

        if let Some(bad) = planes
            .iter()
            .find(|p| p.rows() != first.rows() || p.cols() != first.cols())
        {
            return Err(ImageError::InvalidKernelShape(
                bad.as_slice().len(),
                first.rows(),
                first.cols(),
            ));
        }

        let data = planes
            .iter()
            .flat_map(|p| p.as_slice().iter().copied())
            .collect();

        Self::new(planes.len(), first.rows(), first.cols(), data)
    }

    /// The number of planes.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The number of kernel rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The number of kernel columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The kernel anchor `(rows / 2, cols / 2)`, same rule as [`Kernel2d::anchor`].
    pub fn anchor(&self) -> (usize, usize) {
        (self.rows / 2, self.cols / 2)
    }

    /// The weight of `channel` at `(row, col)`, if in bounds.
    pub fn get(&self, channel: usize, row: usize, col: usize) -> Option<f32> {
        if channel >= self.depth || row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[(row * self.cols + col) * self.depth + channel])
    }

    /// The weights of one kernel row, `cols * depth` values with the channel innermost.
    ///
    /// PRECONDITION: `row < self.rows()`.
    pub fn row(&self, row: usize) -> &[f32] {
        let len = self.cols * self.depth;
        &self.data[row * len..(row + 1) * len]
    }

    /// The sum of all weights.
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }
}

fn check_finite(data: &[f32]) -> Result<(), ImageError> {
    match data.iter().position(|w| !w.is_finite()) {
        Some(idx) => Err(ImageError::NonFiniteKernelWeight(idx)),
        None => Ok(()),
    }
}
