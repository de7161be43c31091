use std::fmt;
use std::str::FromStr;

use korrel_imgproc::filter::{Activation, CorrelationParams, Kernel2d, Kernel3d};

use crate::error::DescriptorError;

/// The number of channels a joint channel kernel must span.
pub const JOINT_CHANNEL_DEPTH: usize = 3;

/// The kinds of filter a descriptor can describe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    /// Per channel correlation with a 2d kernel.
    PlainCorrelation,
    /// Per channel correlation with bias, stride and activation.
    ParameterizedCorrelation,
    /// Joint correlation of all channels with a 3d kernel.
    JointChannel3D,
}

impl FromStr for FilterKind {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(FilterKind::PlainCorrelation),
            "parameterized" | "param" => Ok(FilterKind::ParameterizedCorrelation),
            "3d" | "joint" => Ok(FilterKind::JointChannel3D),
            _ => Err(DescriptorError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterKind::PlainCorrelation => "plain",
            FilterKind::ParameterizedCorrelation => "parameterized",
            FilterKind::JointChannel3D => "3d",
        };
        write!(f, "{name}")
    }
}

/// A borrowed view of the kernel held by a descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterKernel<'a> {
    /// A kernel applied to each channel on its own.
    Planar(&'a Kernel2d),
    /// A kernel applied to all channels at once.
    Joint(&'a Kernel3d),
}

/// A validated description of one filter.
///
/// Descriptors are only built through the checked constructors, so the kernel
/// shape always agrees with the declared dimensions. The tag is stored lower
/// cased and the gradient flag is derived from it once.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterDescriptor {
    /// Plain per channel correlation.
    PlainCorrelation {
        /// Free form label.
        tag: String,
        /// Whether the tag names a gradient filter.
        gradient: bool,
        /// The kernel, normalized unless `gradient` is set.
        kernel: Kernel2d,
    },
    /// Per channel correlation with bias, stride and activation.
    ParameterizedCorrelation {
        /// Free form label.
        tag: String,
        /// Whether the tag names a gradient filter.
        gradient: bool,
        /// The kernel, normalized unless `gradient` is set.
        kernel: Kernel2d,
        /// Constant added to every result.
        bias: f32,
        /// Spacing between computed positions, `>= 1`.
        stride: usize,
        /// Nonlinearity applied after the bias.
        activation: Activation,
    },
    /// Joint channel correlation.
    JointChannel3D {
        /// Free form label.
        tag: String,
        /// Whether the tag names a gradient filter.
        gradient: bool,
        /// The joint kernel, with depth [`JOINT_CHANNEL_DEPTH`].
        kernel: Kernel3d,
    },
}

fn gradient_flag(tag: &str) -> bool {
    tag.contains("sobel")
}

fn normalized(mut kernel: Kernel2d, gradient: bool) -> Kernel2d {
    if !gradient {
        kernel.normalize_by_sum();
    }
    kernel
}

/// Parse an activation name.
///
/// `relu` selects [`Activation::Relu`]; `none`, `identity` and `linear` select
/// [`Activation::Identity`]. Case is ignored.
pub fn parse_activation(name: &str) -> Result<Activation, DescriptorError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "relu" => Ok(Activation::Relu),
        "none" | "identity" | "linear" => Ok(Activation::Identity),
        _ => Err(DescriptorError::UnknownActivation(name.to_string())),
    }
}

impl FilterDescriptor {
    /// Create a plain correlation descriptor.
    ///
    /// Unless the tag contains `sobel`, a kernel with a nonzero sum is divided
    /// by its sum.
    ///
    /// # Example
    ///
    /// ```
    /// use korrel_imgproc::filter::Kernel2d;
    /// use korrel_pipeline::descriptor::{FilterDescriptor, FilterKernel};
    ///
    /// let kernel = Kernel2d::new(1, 2, vec![1.0, 3.0]).unwrap();
    /// let descriptor = FilterDescriptor::plain("Blur", kernel);
    /// assert_eq!(descriptor.tag(), "blur");
    /// let FilterKernel::Planar(k) = descriptor.kernel() else { unreachable!() };
    /// assert_eq!(k.as_slice(), &[0.25, 0.75]);
    /// ```
    pub fn plain(tag: impl Into<String>, kernel: Kernel2d) -> Self {
        let tag = tag.into().to_lowercase();
        let gradient = gradient_flag(&tag);
        FilterDescriptor::PlainCorrelation {
            kernel: normalized(kernel, gradient),
            tag,
            gradient,
        }
    }

    /// Create a parameterized correlation descriptor.
    ///
    /// The kernel is normalized with the same rule as [`FilterDescriptor::plain`].
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidStride`] if `stride` is zero.
    pub fn parameterized(
        tag: impl Into<String>,
        kernel: Kernel2d,
        bias: f32,
        stride: usize,
        activation: Activation,
    ) -> Result<Self, DescriptorError> {
        if stride == 0 {
            return Err(DescriptorError::InvalidStride(0));
        }
        let tag = tag.into().to_lowercase();
        let gradient = gradient_flag(&tag);
        Ok(FilterDescriptor::ParameterizedCorrelation {
            kernel: normalized(kernel, gradient),
            tag,
            gradient,
            bias,
            stride,
            activation,
        })
    }

    /// Create a joint channel descriptor.
    ///
    /// Joint kernels are never normalized.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::DepthMismatch`] if the kernel depth is not
    /// [`JOINT_CHANNEL_DEPTH`].
    pub fn joint_channel_3d(tag: impl Into<String>, kernel: Kernel3d) -> Result<Self, DescriptorError> {
        if kernel.depth() != JOINT_CHANNEL_DEPTH {
            return Err(DescriptorError::DepthMismatch {
                expected: JOINT_CHANNEL_DEPTH,
                found: kernel.depth(),
            });
        }
        let tag = tag.into().to_lowercase();
        let gradient = gradient_flag(&tag);
        Ok(FilterDescriptor::JointChannel3D {
            tag,
            gradient,
            kernel,
        })
    }

    /// Build a descriptor from tokenized descriptor lines.
    ///
    /// The line order is fixed per kind:
    ///
    /// * plain: `tag`, `size N`, then `N` kernel rows.
    /// * parameterized: `tag`, `bias`, `stride`, `activation`, `size N`, then `N` kernel rows.
    /// * 3d: `tag`, `height`, `width`, `depth`, then `height * depth` rows of `width`
    ///   weights, plane by plane.
    ///
    /// The rows of a 2d kernel must all have the same, nonzero, number of
    /// weights. No partial descriptor is ever returned.
    ///
    /// # Arguments
    ///
    /// * `kind` - The kind of filter the lines describe.
    /// * `lines` - The lines of the descriptor, each split into tokens.
    ///
    /// # Example
    ///
    /// ```
    /// use korrel_pipeline::descriptor::{FilterDescriptor, FilterKind};
    ///
    /// let lines: Vec<Vec<String>> = ["Sobel X", "1", "-1 1"]
    ///     .iter()
    ///     .map(|l| l.split_whitespace().map(String::from).collect())
    ///     .collect();
    ///
    /// let descriptor = FilterDescriptor::from_tokens(FilterKind::PlainCorrelation, &lines).unwrap();
    /// assert!(descriptor.is_gradient());
    /// ```
    pub fn from_tokens(kind: FilterKind, lines: &[Vec<String>]) -> Result<Self, DescriptorError> {
        let mut fields = Fields::new(lines);
        let tag = fields.tag()?;

        match kind {
            FilterKind::PlainCorrelation => {
                let size = fields.kernel_size("size")?;
                let rows = fields.kernel_rows(size, None)?;
                Ok(Self::plain(tag, Kernel2d::from_rows(rows)?))
            }
            FilterKind::ParameterizedCorrelation => {
                let bias = fields.float("bias")?;
                let stride = fields.integer("stride")?;
                if stride < 1 {
                    return Err(DescriptorError::InvalidStride(stride));
                }
                let stride =
                    usize::try_from(stride).map_err(|_| DescriptorError::InvalidStride(stride))?;
                let activation = parse_activation(fields.scalar("activation")?)?;
                let size = fields.kernel_size("size")?;
                let rows = fields.kernel_rows(size, None)?;
                Self::parameterized(tag, Kernel2d::from_rows(rows)?, bias, stride, activation)
            }
            FilterKind::JointChannel3D => {
                let height = fields.kernel_size("height")?;
                let width = fields.kernel_size("width")?;
                let depth = fields.kernel_size("depth")?;
                if depth != JOINT_CHANNEL_DEPTH {
                    return Err(DescriptorError::DepthMismatch {
                        expected: JOINT_CHANNEL_DEPTH,
                        found: depth,
                    });
                }
                let count = height.checked_mul(depth).ok_or_else(|| {
                    let value = i64::try_from(height).unwrap_or(i64::MAX);
                    DescriptorError::InvalidKernelSize("height", value)
                })?;
                let rows = fields.kernel_rows(count, Some(width))?;
                let data = rows.into_iter().flatten().collect();
                Self::joint_channel_3d(tag, Kernel3d::new(depth, height, width, data)?)
            }
        }
    }

    /// The kind of filter.
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterDescriptor::PlainCorrelation { .. } => FilterKind::PlainCorrelation,
            FilterDescriptor::ParameterizedCorrelation { .. } => {
                FilterKind::ParameterizedCorrelation
            }
            FilterDescriptor::JointChannel3D { .. } => FilterKind::JointChannel3D,
        }
    }

    /// The lower cased tag.
    pub fn tag(&self) -> &str {
        match self {
            FilterDescriptor::PlainCorrelation { tag, .. }
            | FilterDescriptor::ParameterizedCorrelation { tag, .. }
            | FilterDescriptor::JointChannel3D { tag, .. } => tag,
        }
    }

    /// Whether the tag contains `sobel`.
    pub fn is_gradient(&self) -> bool {
        match self {
            FilterDescriptor::PlainCorrelation { gradient, .. }
            | FilterDescriptor::ParameterizedCorrelation { gradient, .. }
            | FilterDescriptor::JointChannel3D { gradient, .. } => *gradient,
        }
    }

    /// The kernel, after normalization.
    pub fn kernel(&self) -> FilterKernel<'_> {
        match self {
            FilterDescriptor::PlainCorrelation { kernel, .. }
            | FilterDescriptor::ParameterizedCorrelation { kernel, .. } => {
                FilterKernel::Planar(kernel)
            }
            FilterDescriptor::JointChannel3D { kernel, .. } => FilterKernel::Joint(kernel),
        }
    }

    /// The correlation parameters of a 2d descriptor, `None` for joint kernels.
    pub fn correlation_params(&self) -> Option<CorrelationParams> {
        match self {
            FilterDescriptor::PlainCorrelation { gradient, .. } => Some(CorrelationParams {
                gradient: *gradient,
                ..Default::default()
            }),
            FilterDescriptor::ParameterizedCorrelation {
                gradient,
                bias,
                stride,
                activation,
                ..
            } => Some(CorrelationParams {
                bias: *bias,
                stride: *stride,
                activation: *activation,
                gradient: *gradient,
            }),
            FilterDescriptor::JointChannel3D { .. } => None,
        }
    }
}

/// Sequential reader over the lines of a descriptor.
struct Fields<'a> {
    lines: &'a [Vec<String>],
}

impl<'a> Fields<'a> {
    fn new(lines: &'a [Vec<String>]) -> Self {
        Self { lines }
    }

    fn next_line(&mut self, field: &'static str) -> Result<&'a [String], DescriptorError> {
        let (first, rest) = self
            .lines
            .split_first()
            .ok_or(DescriptorError::MissingField(field))?;
        self.lines = rest;
        Ok(first)
    }

    fn tag(&mut self) -> Result<String, DescriptorError> {
        match self.next_line("tag")? {
            [] => Err(DescriptorError::MissingField("tag")),
            tokens => Ok(tokens.join(" ")),
        }
    }

    fn scalar(&mut self, field: &'static str) -> Result<&'a str, DescriptorError> {
        match self.next_line(field)? {
            [token] => Ok(token.as_str()),
            [] => Err(DescriptorError::MissingField(field)),
            _ => Err(DescriptorError::TrailingData(field)),
        }
    }

    fn integer(&mut self, field: &'static str) -> Result<i64, DescriptorError> {
        let token = self.scalar(field)?;
        token.parse().map_err(|_| DescriptorError::InvalidNumber {
            field,
            value: token.to_string(),
        })
    }

    fn float(&mut self, field: &'static str) -> Result<f32, DescriptorError> {
        let token = self.scalar(field)?;
        parse_float(field, token)
    }

    fn kernel_size(&mut self, field: &'static str) -> Result<usize, DescriptorError> {
        let value = self.integer(field)?;
        match usize::try_from(value) {
            Ok(size) if size > 0 => Ok(size),
            _ => Err(DescriptorError::InvalidKernelSize(field, value)),
        }
    }

    /// Consume the remaining lines as exactly `count` rows of weights.
    ///
    /// Without an explicit `width` the first row sets it.
    fn kernel_rows(
        &mut self,
        count: usize,
        width: Option<usize>,
    ) -> Result<Vec<Vec<f32>>, DescriptorError> {
        let rows = std::mem::take(&mut self.lines);
        if rows.len() != count {
            return Err(DescriptorError::KernelRowCount {
                expected: count,
                found: rows.len(),
            });
        }

        let expected = width.unwrap_or_else(|| rows.first().map_or(0, Vec::len));

        rows.iter()
            .enumerate()
            .map(|(row, tokens)| {
                if tokens.len() != expected {
                    return Err(DescriptorError::KernelRowWidth {
                        row,
                        expected,
                        found: tokens.len(),
                    });
                }
                tokens
                    .iter()
                    .map(|t| parse_float("weight", t))
                    .collect::<Result<Vec<f32>, _>>()
            })
            .collect()
    }
}

fn parse_float(field: &'static str, token: &str) -> Result<f32, DescriptorError> {
    match token.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DescriptorError::InvalidNumber {
            field,
            value: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &[&str]) -> Vec<Vec<String>> {
        text.iter()
            .map(|l| l.split_whitespace().map(String::from).collect())
            .collect()
    }

    #[test]
    fn filter_kind_from_str() {
        assert_eq!("plain".parse(), Ok(FilterKind::PlainCorrelation));
        assert_eq!("Parameterized".parse(), Ok(FilterKind::ParameterizedCorrelation));
        assert_eq!("3D".parse(), Ok(FilterKind::JointChannel3D));
        assert_eq!(
            "4d".parse::<FilterKind>(),
            Err(DescriptorError::UnknownKind("4d".to_string()))
        );
        assert_eq!(FilterKind::JointChannel3D.to_string(), "3d");
    }

    #[test]
    fn plain_box_is_normalized() -> Result<(), DescriptorError> {
        let descriptor = FilterDescriptor::from_tokens(
            FilterKind::PlainCorrelation,
            &lines(&["Box", "3", "1 1 1", "1 1 1", "1 1 1"]),
        )?;
        assert_eq!(descriptor.tag(), "box");
        assert!(!descriptor.is_gradient());

        let FilterKernel::Planar(kernel) = descriptor.kernel() else {
            panic!("expected a planar kernel");
        };
        approx::assert_relative_eq!(kernel.sum(), 1.0, epsilon = 1e-6);
        assert_eq!(descriptor.correlation_params(), Some(CorrelationParams::default()));
        Ok(())
    }

    #[test]
    fn sobel_is_not_normalized() -> Result<(), DescriptorError> {
        // sums to 4, but gradient kernels keep their weights
        let descriptor = FilterDescriptor::from_tokens(
            FilterKind::PlainCorrelation,
            &lines(&["SOBEL custom", "3", "-1 0 1", "-2 4 2", "-1 0 1"]),
        )?;
        assert!(descriptor.is_gradient());
        let FilterKernel::Planar(kernel) = descriptor.kernel() else {
            panic!("expected a planar kernel");
        };
        assert_eq!(kernel.sum(), 4.0);
        assert_eq!(kernel.get(1, 1), Some(4.0));
        Ok(())
    }

    #[test]
    fn parameterized_fields() -> Result<(), DescriptorError> {
        let descriptor = FilterDescriptor::from_tokens(
            FilterKind::ParameterizedCorrelation,
            &lines(&["sobel x", "-10", "2", "ReLU", "3", "-1 0 1", "-2 0 2", "-1 0 1"]),
        )?;
        assert_eq!(descriptor.kind(), FilterKind::ParameterizedCorrelation);
        assert_eq!(
            descriptor.correlation_params(),
            Some(CorrelationParams {
                bias: -10.0,
                stride: 2,
                activation: Activation::Relu,
                gradient: true,
            })
        );
        Ok(())
    }

    #[test]
    fn parameterized_errors() {
        let cases = [
            (
                vec!["f", "1", "0", "relu", "1", "1"],
                DescriptorError::InvalidStride(0),
            ),
            (
                vec!["f", "1", "-2", "relu", "1", "1"],
                DescriptorError::InvalidStride(-2),
            ),
            (
                vec!["f", "1", "1", "tanh", "1", "1"],
                DescriptorError::UnknownActivation("tanh".to_string()),
            ),
            (
                vec!["f", "one", "1", "relu", "1", "1"],
                DescriptorError::InvalidNumber {
                    field: "bias",
                    value: "one".to_string(),
                },
            ),
            (
                vec!["f", "1", "1 2", "relu", "1", "1"],
                DescriptorError::TrailingData("stride"),
            ),
            (vec!["f", "1", "1"], DescriptorError::MissingField("activation")),
        ];

        for (text, expected) in cases {
            let res =
                FilterDescriptor::from_tokens(FilterKind::ParameterizedCorrelation, &lines(&text));
            assert_eq!(res, Err(expected), "descriptor {text:?}");
        }
    }

    #[test]
    fn kernel_row_mismatches() {
        let res = FilterDescriptor::from_tokens(
            FilterKind::PlainCorrelation,
            &lines(&["blur", "3", "1 1 1", "1 1 1"]),
        );
        assert_eq!(
            res,
            Err(DescriptorError::KernelRowCount {
                expected: 3,
                found: 2
            })
        );

        let res = FilterDescriptor::from_tokens(
            FilterKind::PlainCorrelation,
            &lines(&["blur", "2", "1 1", "1 1", "1 1"]),
        );
        assert_eq!(
            res,
            Err(DescriptorError::KernelRowCount {
                expected: 2,
                found: 3
            })
        );

        let res = FilterDescriptor::from_tokens(
            FilterKind::PlainCorrelation,
            &lines(&["blur", "2", "1 1", "1"]),
        );
        assert_eq!(
            res,
            Err(DescriptorError::KernelRowWidth {
                row: 1,
                expected: 2,
                found: 1
            })
        );

        let res = FilterDescriptor::from_tokens(
            FilterKind::PlainCorrelation,
            &lines(&["blur", "1", "1 x"]),
        );
        assert_eq!(
            res,
            Err(DescriptorError::InvalidNumber {
                field: "weight",
                value: "x".to_string()
            })
        );

        let res =
            FilterDescriptor::from_tokens(FilterKind::PlainCorrelation, &lines(&["blur", "0"]));
        assert_eq!(res, Err(DescriptorError::InvalidKernelSize("size", 0)));

        let res = FilterDescriptor::from_tokens(FilterKind::PlainCorrelation, &[]);
        assert_eq!(res, Err(DescriptorError::MissingField("tag")));

        // a blank tag line must not let the size slide into its place
        let res = FilterDescriptor::from_tokens(
            FilterKind::PlainCorrelation,
            &lines(&["", "1", "1"]),
        );
        assert_eq!(res, Err(DescriptorError::MissingField("tag")));
    }

    #[test]
    fn joint_channel_layout() -> Result<(), DescriptorError> {
        // 1x2 planes for R, G and B
        let descriptor = FilterDescriptor::from_tokens(
            FilterKind::JointChannel3D,
            &lines(&["box3d", "1", "2", "3", "1 2", "3 4", "5 6"]),
        )?;
        let FilterKernel::Joint(kernel) = descriptor.kernel() else {
            panic!("expected a joint kernel");
        };
        assert_eq!(kernel.depth(), 3);
        assert_eq!(kernel.get(1, 0, 0), Some(3.0));
        assert_eq!(kernel.get(2, 0, 1), Some(6.0));
        // joint kernels are never normalized
        assert_eq!(kernel.sum(), 21.0);
        assert_eq!(descriptor.correlation_params(), None);
        Ok(())
    }

    #[test]
    fn joint_channel_errors() {
        let huge = i64::MAX.to_string();
        let res = FilterDescriptor::from_tokens(
            FilterKind::JointChannel3D,
            &lines(&["box3d", huge.as_str(), "1", "3", "1"]),
        );
        assert_eq!(
            res,
            Err(DescriptorError::InvalidKernelSize("height", i64::MAX))
        );

        let res = FilterDescriptor::from_tokens(
            FilterKind::JointChannel3D,
            &lines(&["box3d", "1", "1", "2", "1", "1"]),
        );
        assert_eq!(
            res,
            Err(DescriptorError::DepthMismatch {
                expected: 3,
                found: 2
            })
        );

        let res = FilterDescriptor::from_tokens(
            FilterKind::JointChannel3D,
            &lines(&["box3d", "1", "2", "3", "1 2", "3 4", "5"]),
        );
        assert_eq!(
            res,
            Err(DescriptorError::KernelRowWidth {
                row: 2,
                expected: 2,
                found: 1
            })
        );

        let res = FilterDescriptor::from_tokens(
            FilterKind::JointChannel3D,
            &lines(&["box3d", "2", "1", "3", "1", "1", "1"]),
        );
        assert_eq!(
            res,
            Err(DescriptorError::KernelRowCount {
                expected: 6,
                found: 3
            })
        );
    }

    #[test]
    fn typed_constructors() -> Result<(), Box<dyn std::error::Error>> {
        let kernel = Kernel2d::new(1, 1, vec![2.0])?;
        assert_eq!(
            FilterDescriptor::parameterized("f", kernel, 0.0, 0, Activation::Identity),
            Err(DescriptorError::InvalidStride(0))
        );

        let kernel = Kernel3d::new(1, 1, 1, vec![1.0])?;
        assert_eq!(
            FilterDescriptor::joint_channel_3d("f", kernel),
            Err(DescriptorError::DepthMismatch {
                expected: 3,
                found: 1
            })
        );
        Ok(())
    }

    #[test]
    fn activation_names() {
        assert_eq!(parse_activation("RELU"), Ok(Activation::Relu));
        assert_eq!(parse_activation("none"), Ok(Activation::Identity));
        assert_eq!(parse_activation("linear"), Ok(Activation::Identity));
        assert!(parse_activation("sigmoid").is_err());
    }
}
