//! Conversion orchestration.
//!
//! `Validate → Prepare → Render → Export → Cleanup`. Validation happens
//! before any file is read or written. The prepared document lives in a
//! temporary directory that, like the browser session, is released when
//! [`Renderer::convert`] returns, whether it succeeded or not.

use crate::error::{ErrorKind, Result};
use crate::export::{self, print_params};
use crate::options::{PdfOptions, RenderOptions};
use crate::prepare::{base_href, inject_base_tag, wrap_with_extra_css};
use crate::session::RenderSession;
use crate::Renderer;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use exn::{OptionExt, ResultExt};
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use tracing::instrument;
use url::Url;

const TEMP_PREFIX: &str = "html2pdf_";
const DOCUMENT_NAME: &str = "index.html";
const PROFILE_NAME: &str = "profile";

/// What to convert and where to put the result.
///
/// Exactly one of `html` and `html_path` must be set; anything else is
/// rejected by [`Renderer::convert`] before any I/O happens. Prefer the
/// [`from_html`](Self::from_html) and [`from_file`](Self::from_file)
/// constructors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Inline HTML document.
    pub html: Option<String>,
    /// HTML document on disk.
    pub html_path: Option<PathBuf>,
    /// Directory relative resources resolve against. Defaults to the HTML
    /// file's directory, or the current working directory for inline HTML.
    pub base_dir: Option<PathBuf>,
    pub output: PathBuf,
}
impl ConversionRequest {
    pub fn from_html(html: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self { html: Some(html.into()), output: output.into(), ..Default::default() }
    }

    pub fn from_file(html_path: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self { html_path: Some(html_path.into()), output: output.into(), ..Default::default() }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }
}

enum Source<'a> {
    Inline(&'a str),
    File(PathBuf),
}

/// Everything checked and resolved before the first read or write.
struct Validated<'a> {
    source: Source<'a>,
    extra_css: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    output: PathBuf,
    params: PrintToPdfParams,
}

fn validate<'a>(request: &'a ConversionRequest, pdf: &PdfOptions, render: &RenderOptions) -> Result<Validated<'a>> {
    let source = match (&request.html, &request.html_path) {
        (Some(html), None) => Source::Inline(html),
        (None, Some(path)) => {
            if !path.exists() {
                exn::bail!(ErrorKind::NotFound(path.clone()));
            }
            Source::File(path.canonicalize().or_raise(|| ErrorKind::Io)?)
        },
        (None, None) | (Some(_), Some(_)) => exn::bail!(ErrorKind::InvalidInput(
            "provide exactly one of inline HTML or an HTML file path".to_string()
        )),
    };
    if render.timeout.is_zero() {
        exn::bail!(ErrorKind::InvalidInput("timeout must be greater than zero".to_string()));
    }
    let extra_css = match &render.extra_css {
        Some(css) if !css.exists() => exn::bail!(ErrorKind::NotFound(css.clone())),
        Some(css) => Some(css.canonicalize().or_raise(|| ErrorKind::Io)?),
        None => None,
    };
    let base_dir = request.base_dir.as_deref().map(resolve).transpose()?;
    let output = resolve(&request.output)?;
    let params = print_params(pdf)?;
    Ok(Validated { source, extra_css, base_dir, output, params })
}

/// Absolute form of `path` with `.` and `..` folded away. Purely lexical:
/// the path does not have to exist yet.
fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).or_raise(|| ErrorKind::Io)?;
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                resolved.pop();
            },
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

/// Produce the final HTML text: extra stylesheet first, then the base tag,
/// so the base tag still finds the head the stylesheet may have created.
async fn prepare(validated: &Validated<'_>, render: &RenderOptions) -> Result<String> {
    let (mut html, default_base) = match &validated.source {
        Source::Inline(html) => (html.to_string(), std::env::current_dir().or_raise(|| ErrorKind::Io)?),
        Source::File(path) => {
            let html = tokio::fs::read_to_string(path).await.or_raise(|| ErrorKind::Io)?;
            let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (html, parent)
        },
    };
    if let Some(css) = &validated.extra_css {
        let css = tokio::fs::read_to_string(css).await.or_raise(|| ErrorKind::Io)?;
        html = wrap_with_extra_css(&html, &css);
    }
    if render.base_tag {
        let base_dir = validated.base_dir.as_deref().unwrap_or(&default_base);
        let href = base_href(base_dir)?;
        tracing::debug!(base = %href, "Injecting base tag");
        html = inject_base_tag(&html, &href);
    }
    Ok(html)
}

impl Renderer {
    /// Convert an HTML document to a PDF file.
    ///
    /// Returns the absolute path of the written PDF. Browser failures of any
    /// kind surface as [`ErrorKind::Render`]; nothing is retried.
    #[instrument(skip_all, fields(output = %request.output.display()))]
    pub async fn convert(
        &self,
        request: &ConversionRequest,
        pdf: &PdfOptions,
        render: &RenderOptions,
    ) -> Result<PathBuf> {
        let validated = validate(request, pdf, render)?;
        let html = prepare(&validated, render).await?;

        let scratch = tempfile::Builder::new().prefix(TEMP_PREFIX).tempdir().or_raise(|| ErrorKind::Io)?;
        let document = scratch.path().join(DOCUMENT_NAME);
        tokio::fs::write(&document, html).await.or_raise(|| ErrorKind::Io)?;
        let url = Url::from_file_path(&document)
            .ok()
            .ok_or_raise(|| ErrorKind::InvalidInput(format!("not a usable path: {}", document.display())))?;

        let blocked = self.print(&scratch, url.as_str(), validated.params, &validated.output, render).await?;
        tracing::info!(output = %validated.output.display(), blocked, "PDF rendered");
        Ok(validated.output)
    }

    /// Render the prepared document and export it. Returns how many remote
    /// requests were blocked along the way.
    async fn print(
        &self,
        scratch: &TempDir,
        url: &str,
        params: PrintToPdfParams,
        output: &Path,
        render: &RenderOptions,
    ) -> Result<usize> {
        let profile = scratch.path().join(PROFILE_NAME);
        let mut session = RenderSession::launch(&self.chrome, &profile, render.timeout).await?;
        let outcome = async {
            if !render.allow_network {
                session.block_remote_requests().await?;
            }
            session.emulate_media(render.emulate_media).await?;
            session.navigate(url, render.wait_until, render.timeout).await?;
            session.wait_for_fonts().await;
            export::export(session.page(), params, output).await
        }
        .await;
        let blocked = session.close().await;
        outcome.map(|_| blocked)
    }
}
