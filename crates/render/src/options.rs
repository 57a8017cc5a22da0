//! Conversion options.
//!
//! [`PdfOptions`] describes the printed page, [`RenderOptions`] describes how
//! the document is loaded before printing. Both are plain values built once
//! per conversion.

use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_FORMAT: &str = "A4";
pub const DEFAULT_MARGINS: &str = "16mm,14mm,16mm,14mm";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);

const CSS_PIXELS_PER_INCH: f64 = 96.0;

/// Page layout passed to the browser's print-to-PDF call.
#[derive(Clone, Debug, PartialEq)]
pub struct PdfOptions {
    /// Named paper format (see [`PaperFormat`]). Ignored when both `width`
    /// and `height` are set.
    pub format: String,
    /// Explicit page width as a CSS length, e.g. `"210mm"`.
    pub width: Option<String>,
    /// Explicit page height as a CSS length, e.g. `"297mm"`.
    pub height: Option<String>,
    pub margins: Margins,
    pub print_background: bool,
    /// Let `@page { size: … }` in the document win over `format`/`width`/`height`.
    pub prefer_css_page_size: bool,
    pub scale: f64,
    /// Print header and footer templates. When disabled, both templates are
    /// ignored entirely.
    pub display_header_footer: bool,
    pub header_template: String,
    pub footer_template: String,
}
impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_string(),
            width: None,
            height: None,
            margins: Margins::default(),
            print_background: true,
            prefer_css_page_size: true,
            scale: 1.0,
            display_header_footer: false,
            header_template: String::new(),
            footer_template: String::new(),
        }
    }
}
impl PdfOptions {
    /// Enable header/footer display with the given templates.
    pub fn with_header_footer(mut self, header: impl Into<String>, footer: impl Into<String>) -> Self {
        self.display_header_footer = true;
        self.header_template = header.into();
        self.footer_template = footer.into();
        self
    }
}

/// How the document is loaded before it is printed.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    /// Ceiling for the navigation wait. Must be non-zero.
    pub timeout: Duration,
    pub wait_until: WaitUntil,
    pub emulate_media: Media,
    /// When `false`, every request that is not for a `file://` URL is blocked.
    pub allow_network: bool,
    /// Additional stylesheet inlined into the document head.
    pub extra_css: Option<PathBuf>,
    /// Inject a `<base href>` so relative resources resolve against the base
    /// directory instead of the temporary copy of the document.
    pub base_tag: bool,
}
impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            wait_until: WaitUntil::default(),
            emulate_media: Media::default(),
            allow_network: true,
            extra_css: None,
            base_tag: true,
        }
    }
}

/// The point in the page lifecycle at which navigation counts as finished,
/// in increasing strictness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WaitUntil {
    /// The `load` event fired.
    Load,
    /// The `DOMContentLoaded` event fired.
    DomContentLoaded,
    /// No network activity for at least 500ms.
    #[default]
    NetworkIdle,
}
impl WaitUntil {
    /// Name of the DevTools `Page.lifecycleEvent` that satisfies this condition.
    pub(crate) fn lifecycle_event(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkIdle",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "domcontentloaded",
            Self::NetworkIdle => "networkidle",
        }
    }
}
impl FromStr for WaitUntil {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "load" => Ok(Self::Load),
            "domcontentloaded" => Ok(Self::DomContentLoaded),
            "networkidle" => Ok(Self::NetworkIdle),
            _ => exn::bail!(ErrorKind::InvalidInput(format!("unknown wait condition: {s}"))),
        }
    }
}
impl Display for WaitUntil {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// CSS media type emulated while rendering, so `@media print` (or `screen`)
/// rules apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Media {
    Screen,
    #[default]
    Print,
}
impl Media {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Print => "print",
        }
    }
}
impl FromStr for Media {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "screen" => Ok(Self::Screen),
            "print" => Ok(Self::Print),
            _ => exn::bail!(ErrorKind::InvalidInput(format!("unknown media type: {s}"))),
        }
    }
}
impl Display for Media {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Page margins as CSS length strings, kept verbatim until export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}
impl Default for Margins {
    fn default() -> Self {
        Self { top: "16mm".into(), right: "14mm".into(), bottom: "16mm".into(), left: "14mm".into() }
    }
}
/// Parses `top,right,bottom,left`. Exactly four comma-separated values are
/// required; each is trimmed but otherwise not validated here.
impl FromStr for Margins {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [top, right, bottom, left] = parts.as_slice() else {
            exn::bail!(ErrorKind::InvalidInput(format!(
                "expected four comma-separated margins (top,right,bottom,left), got `{s}`"
            )));
        };
        Ok(Self { top: top.to_string(), right: right.to_string(), bottom: bottom.to_string(), left: left.to_string() })
    }
}
impl Display for Margins {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{},{},{},{}", self.top, self.right, self.bottom, self.left)
    }
}

/// A CSS length (`px`, `in`, `cm` or `mm`; unit-less means pixels) resolved
/// to inches, the unit the DevTools print call expects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Length(f64);
impl Length {
    pub fn inches(&self) -> f64 {
        self.0
    }
}
impl FromStr for Length {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Ok(Self(0.0));
        }
        let (value, pixels_per_unit) = match text.len().checked_sub(2).and_then(|at| text.split_at_checked(at)) {
            Some((value, unit)) if unit.eq_ignore_ascii_case("px") => (value, 1.0),
            Some((value, unit)) if unit.eq_ignore_ascii_case("in") => (value, CSS_PIXELS_PER_INCH),
            Some((value, unit)) if unit.eq_ignore_ascii_case("cm") => (value, 37.8),
            Some((value, unit)) if unit.eq_ignore_ascii_case("mm") => (value, 3.78),
            _ => (text, 1.0),
        };
        let value: f64 = match value.trim().parse() {
            Ok(value) if f64::is_finite(value) && value >= 0.0 => value,
            _ => exn::bail!(ErrorKind::InvalidInput(format!("invalid CSS length: `{s}`"))),
        };
        Ok(Self(value * pixels_per_unit / CSS_PIXELS_PER_INCH))
    }
}

/// Named paper sizes understood by `--format`, matched case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaperFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}
impl PaperFormat {
    /// Width and height in inches.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
            Self::Tabloid => (11.0, 17.0),
            Self::Ledger => (17.0, 11.0),
            Self::A0 => (33.1, 46.8),
            Self::A1 => (23.4, 33.1),
            Self::A2 => (16.54, 23.4),
            Self::A3 => (11.7, 16.54),
            Self::A4 => (8.27, 11.7),
            Self::A5 => (5.83, 8.27),
            Self::A6 => (4.13, 5.83),
        }
    }
}
impl FromStr for PaperFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "tabloid" => Ok(Self::Tabloid),
            "ledger" => Ok(Self::Ledger),
            "a0" => Ok(Self::A0),
            "a1" => Ok(Self::A1),
            "a2" => Ok(Self::A2),
            "a3" => Ok(Self::A3),
            "a4" => Ok(Self::A4),
            "a5" => Ok(Self::A5),
            "a6" => Ok(Self::A6),
            _ => exn::bail!(ErrorKind::InvalidInput(format!("unknown paper format: {s}"))),
        }
    }
}
