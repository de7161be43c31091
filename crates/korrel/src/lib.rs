#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use korrel_image as image;

#[doc(inline)]
pub use korrel_imgproc as imgproc;

#[doc(inline)]
pub use korrel_io as io;

#[doc(inline)]
pub use korrel_pipeline as pipeline;
