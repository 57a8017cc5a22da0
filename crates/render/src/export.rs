//! Print-to-PDF.
//!
//! [`print_params`] is pure, so it runs before the browser is launched and a
//! bad page size or margin never costs a browser start. [`export`] then does
//! a single print call and writes the bytes; there are no retries.

use crate::error::{ErrorKind, Result};
use crate::options::{Length, PaperFormat, PdfOptions};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use exn::ResultExt;
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

fn inches(value: &str) -> Result<f64> {
    Length::from_str(value).map(|length| length.inches()).map_err(|e| ErrorKind::render(&*e))
}

/// Translate [`PdfOptions`] into DevTools print parameters.
///
/// Explicit `width`/`height` win only when both are set; otherwise the named
/// format applies. Templates are only passed when header/footer display is
/// enabled.
pub fn print_params(options: &PdfOptions) -> Result<PrintToPdfParams> {
    let (paper_width, paper_height) = match (&options.width, &options.height) {
        (Some(width), Some(height)) => (inches(width)?, inches(height)?),
        _ => PaperFormat::from_str(&options.format).map_err(|e| ErrorKind::render(&*e))?.dimensions(),
    };
    let mut params = PrintToPdfParams {
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(inches(&options.margins.top)?),
        margin_right: Some(inches(&options.margins.right)?),
        margin_bottom: Some(inches(&options.margins.bottom)?),
        margin_left: Some(inches(&options.margins.left)?),
        print_background: Some(options.print_background),
        prefer_css_page_size: Some(options.prefer_css_page_size),
        scale: Some(options.scale),
        display_header_footer: Some(options.display_header_footer),
        ..Default::default()
    };
    if options.display_header_footer {
        params.header_template = Some(options.header_template.clone());
        params.footer_template = Some(options.footer_template.clone());
    }
    Ok(params)
}

/// Print the page and persist the PDF, creating parent directories.
#[instrument(skip_all, fields(output = %output.display()))]
pub(crate) async fn export(page: &Page, params: PrintToPdfParams, output: &Path) -> Result<u64> {
    let pdf = page.pdf(params).await.map_err(ErrorKind::render)?;
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Io)?;
    }
    tokio::fs::write(output, &pdf).await.or_raise(|| ErrorKind::Io)?;
    let size = pdf.len() as u64;
    tracing::debug!(size, "PDF written");
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Margins;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn defaults_to_a4() {
        let params = print_params(&PdfOptions::default()).unwrap();
        assert!(approx(params.paper_width, 8.27));
        assert!(approx(params.paper_height, 11.7));
        assert!(approx(params.margin_top, 16.0 * 3.78 / 96.0));
        assert!(approx(params.margin_right, 14.0 * 3.78 / 96.0));
        assert!(approx(params.margin_bottom, 16.0 * 3.78 / 96.0));
        assert!(approx(params.margin_left, 14.0 * 3.78 / 96.0));
        assert_eq!(params.print_background, Some(true));
        assert_eq!(params.prefer_css_page_size, Some(true));
        assert_eq!(params.scale, Some(1.0));
        assert_eq!(params.display_header_footer, Some(false));
    }

    #[test]
    fn named_format() {
        let options = PdfOptions { format: "letter".to_string(), ..Default::default() };
        let params = print_params(&options).unwrap();
        assert!(approx(params.paper_width, 8.5));
        assert!(approx(params.paper_height, 11.0));
    }

    #[test]
    fn width_and_height_override_format() {
        let options = PdfOptions {
            format: "Letter".to_string(),
            width: Some("210mm".to_string()),
            height: Some("4in".to_string()),
            ..Default::default()
        };
        let params = print_params(&options).unwrap();
        assert!(approx(params.paper_width, 210.0 * 3.78 / 96.0));
        assert!(approx(params.paper_height, 4.0));
    }

    #[test]
    fn width_alone_is_ignored() {
        let options = PdfOptions { width: Some("100mm".to_string()), ..Default::default() };
        let params = print_params(&options).unwrap();
        assert!(approx(params.paper_width, 8.27));
        assert!(approx(params.paper_height, 11.7));
    }

    #[test]
    fn templates_ignored_when_disabled() {
        let options = PdfOptions {
            header_template: "<span class=title></span>".to_string(),
            footer_template: "<span class=pageNumber></span>".to_string(),
            ..Default::default()
        };
        let params = print_params(&options).unwrap();
        assert_eq!(params.display_header_footer, Some(false));
        assert_eq!(params.header_template, None);
        assert_eq!(params.footer_template, None);
    }

    #[test]
    fn templates_passed_when_enabled() {
        let options = PdfOptions::default().with_header_footer("", "<span class=pageNumber></span>");
        let params = print_params(&options).unwrap();
        assert_eq!(params.display_header_footer, Some(true));
        assert_eq!(params.header_template.as_deref(), Some(""));
        assert_eq!(params.footer_template.as_deref(), Some("<span class=pageNumber></span>"));
    }

    #[test]
    fn bad_sizes_are_render_errors() {
        let options = PdfOptions { format: "B5".to_string(), ..Default::default() };
        let err = print_params(&options).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Render(message) if message.contains("B5")));

        let options = PdfOptions {
            margins: Margins { top: "1furlong".to_string(), ..Default::default() },
            ..Default::default()
        };
        assert!(matches!(*print_params(&options).unwrap_err(), ErrorKind::Render(_)));
    }
}
