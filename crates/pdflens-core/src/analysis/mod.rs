//! Image filtering and analysis.

mod analyzer;
mod describe;
mod filter;
mod stats;

pub use analyzer::ImageAnalyzer;
pub use describe::describe;
pub use filter::{ImageFilter, likely_has_text};
pub use stats::{Luminance, luminance, pixel_stats};

#[cfg(test)]
pub(crate) use analyzer::tests::{FakeCaptioner, FakeOcr, gray_png};
