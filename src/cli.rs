//! Command-line surface.
//!
//! Flags left unset fall back to [`Config`], which in turn falls back to the
//! built-in defaults shown in `--help`.

use crate::config::Config;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use html2pdf_render::{ConversionRequest, Margins, Media, PdfOptions, RenderOptions, WaitUntil, templates};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Render errors from the library as plain messages for clap's usage output.
fn parse_with<T>(value: &str) -> std::result::Result<T, String>
where
    T: FromStr<Err = html2pdf_render::error::Error>,
{
    T::from_str(value).map_err(|e| (*e).to_string())
}

#[derive(Debug, Parser)]
#[command(name = "html2pdf", version, about = "Convert HTML to PDF with headless Chrome/Chromium")]
pub struct Cli {
    /// HTML file to convert (e.g. page.html)
    pub input: PathBuf,
    /// Output PDF path
    #[arg(short, long, default_value = "out.pdf")]
    pub output: PathBuf,
    /// Directory relative resources resolve against [default: the input file's directory]
    #[arg(long)]
    pub base_dir: Option<PathBuf>,
    /// Additional stylesheet to inline into the document
    #[arg(long)]
    pub css: Option<PathBuf>,
    /// Block every request that is not for a local file
    #[arg(long)]
    pub no_network: bool,
    /// Navigation timeout in milliseconds [default: 60000]
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Paper format: Letter, Legal, Tabloid, Ledger, A0-A6 [default: A4]
    #[arg(long)]
    pub format: Option<String>,
    /// Explicit page width as a CSS length; overrides --format
    #[arg(long, requires = "height")]
    pub width: Option<String>,
    /// Explicit page height as a CSS length; overrides --format
    #[arg(long, requires = "width")]
    pub height: Option<String>,
    /// Margins as top,right,bottom,left [default: 16mm,14mm,16mm,14mm]
    #[arg(long, value_parser = parse_with::<Margins>)]
    pub margin: Option<Margins>,
    /// Print a footer with page numbers
    #[arg(long)]
    pub header_footer: bool,
    /// When navigation is done: load, domcontentloaded or networkidle [default: networkidle]
    #[arg(long, value_parser = parse_with::<WaitUntil>)]
    pub wait_until: Option<WaitUntil>,
    /// CSS media type to emulate: screen or print [default: print]
    #[arg(long, value_parser = parse_with::<Media>)]
    pub media: Option<Media>,
    /// Rendering scale
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
    /// Do not inject a <base> tag for relative resources
    #[arg(long)]
    pub no_base_tag: bool,
    /// Chrome/Chromium executable [default: searched in PATH]
    #[arg(long)]
    pub chrome: Option<PathBuf>,
    /// Configuration file [default: config.toml in the platform config directory]
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn request(&self) -> ConversionRequest {
        let request = ConversionRequest::from_file(&self.input, &self.output);
        match &self.base_dir {
            Some(base_dir) => request.with_base_dir(base_dir),
            None => request,
        }
    }

    pub fn pdf_options(&self, config: &Config) -> Result<PdfOptions> {
        let margins = match &self.margin {
            Some(margins) => margins.clone(),
            None => config.margin.parse::<Margins>().or_raise(|| ErrorKind::Config)?,
        };
        let pdf = PdfOptions {
            format: self.format.clone().unwrap_or_else(|| config.format.clone()),
            width: self.width.clone(),
            height: self.height.clone(),
            margins,
            scale: self.scale,
            ..Default::default()
        };
        if !self.header_footer {
            return Ok(pdf);
        }
        let footer = templates::default_footer().or_raise(|| ErrorKind::Convert)?;
        Ok(pdf.with_header_footer("", footer))
    }

    pub fn render_options(&self, config: &Config) -> RenderOptions {
        RenderOptions {
            timeout: Duration::from_millis(self.timeout.unwrap_or(config.timeout)),
            wait_until: self.wait_until.unwrap_or(config.wait_until),
            emulate_media: self.media.unwrap_or(config.media),
            allow_network: !self.no_network && config.network,
            extra_css: self.css.clone(),
            base_tag: !self.no_base_tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind as ClapErrorKind;
    use rstest::rstest;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("html2pdf").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let cli = parse(&["page.html"]).unwrap();
        let config = Config::default();
        assert_eq!(cli.output, PathBuf::from("out.pdf"));

        let request = cli.request();
        assert_eq!(request.html_path, Some(PathBuf::from("page.html")));
        assert_eq!(request.html, None);
        assert_eq!(request.base_dir, None);

        let pdf = cli.pdf_options(&config).unwrap();
        assert_eq!(pdf, PdfOptions::default());

        let render = cli.render_options(&config);
        assert_eq!(render, RenderOptions::default());
    }

    #[test]
    fn margin_flag() {
        let cli = parse(&["page.html", "--margin", "16mm,14mm,16mm,14mm"]).unwrap();
        let margins = cli.margin.unwrap();
        assert_eq!(margins.top, "16mm");
        assert_eq!(margins.right, "14mm");
        assert_eq!(margins.bottom, "16mm");
        assert_eq!(margins.left, "14mm");
    }

    #[rstest]
    #[case("bad")]
    #[case("1mm,2mm")]
    #[case("1mm,2mm,3mm,4mm,5mm")]
    fn malformed_margin_is_a_usage_error(#[case] margin: &str) {
        let err = parse(&["page.html", "--margin", margin]).unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn wait_until_values() {
        let cli = parse(&["page.html", "--wait-until", "domcontentloaded"]).unwrap();
        assert_eq!(cli.wait_until, Some(WaitUntil::DomContentLoaded));
        assert_eq!(parse(&["page.html", "--wait-until", "soon"]).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn width_requires_height() {
        assert!(parse(&["page.html", "--width", "210mm"]).is_err());
        let cli = parse(&["page.html", "--width", "210mm", "--height", "297mm"]).unwrap();
        let pdf = cli.pdf_options(&Config::default()).unwrap();
        assert_eq!(pdf.width.as_deref(), Some("210mm"));
        assert_eq!(pdf.height.as_deref(), Some("297mm"));
    }

    #[test]
    fn flags_map_to_options() {
        let cli = parse(&[
            "page.html",
            "-o",
            "build/report.pdf",
            "--base-dir",
            "assets",
            "--css",
            "print.css",
            "--no-network",
            "--timeout",
            "1500",
            "--format",
            "Letter",
            "--header-footer",
            "--media",
            "screen",
            "--no-base-tag",
        ])
        .unwrap();
        let config = Config::default();

        let request = cli.request();
        assert_eq!(request.output, PathBuf::from("build/report.pdf"));
        assert_eq!(request.base_dir, Some(PathBuf::from("assets")));

        let pdf = cli.pdf_options(&config).unwrap();
        assert_eq!(pdf.format, "Letter");
        assert!(pdf.display_header_footer);
        assert!(pdf.footer_template.contains("pageNumber"));

        let render = cli.render_options(&config);
        assert_eq!(render.timeout, Duration::from_millis(1500));
        assert!(!render.allow_network);
        assert_eq!(render.extra_css, Some(PathBuf::from("print.css")));
        assert_eq!(render.emulate_media, Media::Screen);
        assert!(!render.base_tag);
    }

    #[test]
    fn config_fills_unset_flags() {
        let cli = parse(&["page.html"]).unwrap();
        let config = Config {
            timeout: 10,
            format: "A3".to_string(),
            margin: "0,0,0,0".to_string(),
            network: false,
            ..Default::default()
        };
        let pdf = cli.pdf_options(&config).unwrap();
        assert_eq!(pdf.format, "A3");
        assert_eq!(pdf.margins.to_string(), "0,0,0,0");
        let render = cli.render_options(&config);
        assert_eq!(render.timeout, Duration::from_millis(10));
        assert!(!render.allow_network);
    }

    #[test]
    fn bad_configured_margin() {
        let cli = parse(&["page.html"]).unwrap();
        let config = Config { margin: "wide".to_string(), ..Default::default() };
        assert_eq!(*cli.pdf_options(&config).unwrap_err(), ErrorKind::Config);
    }
}
