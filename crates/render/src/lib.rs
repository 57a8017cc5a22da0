//! HTML to PDF rendering with headless Chrome/Chromium.
//!
//! ```no_run
//! use html2pdf_render::{ConversionRequest, PdfOptions, RenderOptions, Renderer};
//! # use html2pdf_render::error::Result;
//!
//! # async fn example() -> Result<()> {
//! let renderer = Renderer::new()?;
//! let request = ConversionRequest::from_html("<h1>Hi</h1>", "out.pdf");
//! let output = renderer.convert(&request, &PdfOptions::default(), &RenderOptions::default()).await?;
//! println!("{}", output.display());
//! # Ok(())
//! # }
//! ```

mod chrome;
mod convert;
pub mod error;
mod export;
pub mod options;
pub mod prepare;
mod session;
pub mod templates;

use crate::chrome::Chrome;
use crate::error::Result;
use std::path::Path;

pub use crate::convert::ConversionRequest;
pub use crate::export::print_params;
pub use crate::options::{Margins, Media, PdfOptions, RenderOptions, WaitUntil};

/// Converts HTML to PDF using a discovered or configured browser executable.
///
/// Holds no browser state between calls: every [`convert`](Self::convert)
/// launches and tears down its own browser, so a single `Renderer` can be
/// shared across concurrent conversions.
#[derive(Clone, Debug)]
pub struct Renderer {
    chrome: Chrome,
}
impl Renderer {
    /// Search `PATH` for a Chrome/Chromium executable.
    pub fn new() -> Result<Self> {
        Ok(Self { chrome: Chrome::discover()? })
    }

    /// Use a specific browser executable.
    pub fn with_chrome(executable: impl AsRef<Path>) -> Self {
        Self { chrome: Chrome::at(executable) }
    }

    pub fn chrome_path(&self) -> &Path {
        self.chrome.path()
    }
}
