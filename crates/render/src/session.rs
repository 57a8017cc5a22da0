//! Headless browser session.
//!
//! A [`RenderSession`] is a linear ownership chain: the browser process owns
//! an isolated browser context, which owns a single page. Everything is
//! released in reverse order by [`RenderSession::close`], which callers must
//! reach on every exit path; if a session is dropped without closing,
//! `chromiumoxide` still kills the child process.

use crate::chrome::Chrome;
use crate::error::{ErrorKind, Result};
use crate::options::{Media, WaitUntil};
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetEmulatedMediaParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, NavigateParams, SetLifecycleEventsEnabledParams};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use futures::StreamExt;
use futures::future::{self, Either};
use std::path::Path;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::instrument;
use url::Url;

const FONTS_READY: &str = "document.fonts ? document.fonts.ready.then(() => true) : false";
/// Floor for DevTools commands; matches `chromiumoxide`'s own default.
const MIN_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
/// Ceiling for DevTools commands. Navigation has its own deadline.
const MAX_COMMAND_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Timeout for individual DevTools commands, derived from the navigation
/// timeout. Printing a large document can take longer than a short
/// navigation timeout, and `chromiumoxide` adds this value to an `Instant`,
/// so it must stay bounded.
fn command_timeout(navigation: Duration) -> Duration {
    navigation.clamp(MIN_COMMAND_TIMEOUT, MAX_COMMAND_TIMEOUT)
}

/// Only `file://` requests may leave the page when networking is disabled.
fn is_local(url: &str) -> bool {
    Url::parse(url).is_ok_and(|url| url.scheme() == "file")
}

/// Tracks lifecycle events of the main frame until the document created by
/// a navigation reaches the wanted event.
///
/// The new document is known either from its `init` event or from the
/// navigate response, whichever arrives first. Events for other frames, and
/// for the document being replaced, are ignored.
#[derive(Debug)]
struct Settle {
    wanted: &'static str,
    main_frame: Option<String>,
    loader: Option<String>,
    reached: Vec<String>,
}
impl Settle {
    fn new(wanted: &'static str, main_frame: Option<&str>) -> Self {
        Self { wanted, main_frame: main_frame.map(str::to_string), loader: None, reached: Vec::new() }
    }

    /// Record a lifecycle event; true once navigation has settled.
    fn lifecycle(&mut self, frame: &str, loader: &str, name: &str) -> bool {
        if self.main_frame.as_deref().is_some_and(|main| main != frame) {
            return false;
        }
        if name == "init" {
            self.loader = Some(loader.to_string());
        }
        if name != self.wanted {
            return false;
        }
        if self.loader.as_deref() == Some(loader) {
            return true;
        }
        self.reached.push(loader.to_string());
        false
    }

    /// Record the navigate response; true if its document already settled.
    fn navigated(&mut self, loader: Option<&str>) -> bool {
        if let Some(loader) = loader {
            self.loader = Some(loader.to_string());
        }
        self.loader.as_ref().is_some_and(|loader| self.reached.contains(loader))
    }
}

/// The browser process and the task driving its DevTools connection.
struct Process {
    browser: Browser,
    handler: JoinHandle<()>,
}
impl Process {
    async fn launch(chrome: &Chrome, profile: &Path, navigation_timeout: Duration) -> Result<Self> {
        let config = BrowserConfig::builder()
            .chrome_executable(chrome.path())
            .user_data_dir(profile)
            .request_timeout(command_timeout(navigation_timeout))
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--hide-scrollbars")
            .build()
            .map_err(ErrorKind::render)?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(ErrorKind::render)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "Browser handler error");
                }
            }
        });
        Ok(Self { browser, handler })
    }

    async fn new_context(&self) -> Result<BrowserContextId> {
        let response =
            self.browser.execute(CreateBrowserContextParams::default()).await.map_err(ErrorKind::render)?;
        Ok(response.result.browser_context_id)
    }

    async fn new_page(&self, context: &BrowserContextId) -> Result<Page> {
        let mut target = CreateTargetParams::new("about:blank");
        target.browser_context_id = Some(context.clone());
        self.browser.new_page(target).await.map_err(ErrorKind::render)
    }

    async fn dispose_context(&self, context: BrowserContextId) {
        if let Err(e) = self.browser.execute(DisposeBrowserContextParams::new(context)).await {
            tracing::warn!(error = %e, "Failed to dispose browser context");
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "Failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "Failed to wait for browser exit");
        }
        self.handler.abort();
    }
}

/// Network interception running alongside the page.
struct Interceptor {
    task: JoinHandle<()>,
    blocked: Arc<AtomicUsize>,
}

pub(crate) struct RenderSession {
    process: Process,
    context: BrowserContextId,
    page: Page,
    interceptor: Option<Interceptor>,
}
impl RenderSession {
    /// Launch a browser with its own profile directory, then open one page
    /// inside a fresh browser context. Anything acquired before a failure is
    /// released before returning the error.
    #[instrument(skip_all, fields(chrome = %chrome.path().display()))]
    pub(crate) async fn launch(chrome: &Chrome, profile: &Path, navigation_timeout: Duration) -> Result<Self> {
        let process = Process::launch(chrome, profile, navigation_timeout).await?;
        let context = match process.new_context().await {
            Ok(context) => context,
            Err(e) => {
                process.close().await;
                return Err(e);
            },
        };
        let page = match process.new_page(&context).await {
            Ok(page) => page,
            Err(e) => {
                process.dispose_context(context).await;
                process.close().await;
                return Err(e);
            },
        };
        tracing::debug!("Browser session ready");
        Ok(Self { process, context, page, interceptor: None })
    }

    pub(crate) fn page(&self) -> &Page {
        &self.page
    }

    /// Abort every request whose scheme is not `file`. Blocked requests fail
    /// only the resource they were for (image, font, script), never the
    /// navigation.
    pub(crate) async fn block_remote_requests(&mut self) -> Result<()> {
        let mut paused = self.page.event_listener::<EventRequestPaused>().await.map_err(ErrorKind::render)?;
        let page = self.page.clone();
        let blocked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&blocked);
        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let url = &event.request.url;
                let outcome = if is_local(url) {
                    page.execute(ContinueRequestParams::new(event.request_id.clone())).await.map(drop)
                } else {
                    counter.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(url = %url, "Blocked network request");
                    page.execute(FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient))
                        .await
                        .map(drop)
                };
                if let Err(e) = outcome {
                    tracing::debug!(url = %url, error = %e, "Failed to resolve intercepted request");
                }
            }
        });
        self.interceptor = Some(Interceptor { task, blocked });
        let enable = FetchEnableParams {
            patterns: Some(vec![RequestPattern { url_pattern: Some("*".to_string()), ..Default::default() }]),
            ..Default::default()
        };
        self.page.execute(enable).await.map_err(ErrorKind::render)?;
        Ok(())
    }

    /// Must happen before navigation so `@media` rules are evaluated against
    /// the emulated type from the first layout.
    pub(crate) async fn emulate_media(&self, media: Media) -> Result<()> {
        let params = SetEmulatedMediaParams { media: Some(media.as_str().to_string()), ..Default::default() };
        self.page.execute(params).await.map_err(ErrorKind::render)?;
        Ok(())
    }

    /// Navigate and block until `wait_until` is reached for this navigation,
    /// or fail once `timeout` elapses.
    #[instrument(skip(self, timeout))]
    pub(crate) async fn navigate(&self, url: &str, wait_until: WaitUntil, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.navigate_and_wait(url, wait_until)).await {
            Ok(result) => result,
            Err(_) => {
                exn::bail!(ErrorKind::Render(format!("navigation timed out after {}ms", timeout.as_millis())))
            },
        }
    }

    async fn navigate_and_wait(&self, url: &str, wait_until: WaitUntil) -> Result<()> {
        self.page.execute(SetLifecycleEventsEnabledParams::new(true)).await.map_err(ErrorKind::render)?;
        let main_frame = self.page.mainframe().await.map_err(ErrorKind::render)?;
        let mut settle = Settle::new(wait_until.lifecycle_event(), main_frame.as_ref().map(AsRef::<str>::as_ref));
        let mut lifecycle = self.page.event_listener::<EventLifecycleEvent>().await.map_err(ErrorKind::render)?;
        // `chromiumoxide` only answers a navigate command once the page has
        // loaded, so the response is raced against the lifecycle events
        // instead of awaited first.
        let mut navigation = pin!(self.page.execute(NavigateParams::new(url)));
        let mut navigated = false;
        loop {
            let event = if navigated {
                lifecycle.next().await
            } else {
                match future::select(&mut navigation, lifecycle.next()).await {
                    Either::Left((response, _)) => {
                        navigated = true;
                        let response = response.map_err(ErrorKind::render)?;
                        if let Some(error) = &response.result.error_text {
                            exn::bail!(ErrorKind::Render(format!("navigation to {url} failed: {error}")));
                        }
                        if settle.navigated(response.result.loader_id.as_ref().map(AsRef::<str>::as_ref)) {
                            break;
                        }
                        continue;
                    },
                    Either::Right((event, _)) => event,
                }
            };
            let Some(event) = event else {
                exn::bail!(ErrorKind::Render("browser closed before navigation finished".to_string()));
            };
            if settle.lifecycle(event.frame_id.as_ref(), event.loader_id.as_ref(), &event.name) {
                break;
            }
        }
        tracing::debug!(event = settle.wanted, "Navigation settled");
        Ok(())
    }

    /// Wait for `document.fonts.ready`.
    ///
    /// Best effort by contract: if the Font Loading API is missing or the
    /// wait fails, the document is printed anyway. Nothing here can fail the
    /// conversion.
    pub(crate) async fn wait_for_fonts(&self) {
        let mut params = EvaluateParams::new(FONTS_READY);
        params.await_promise = Some(true);
        params.return_by_value = Some(true);
        match self.page.execute(params).await {
            Ok(response) => match &response.result.exception_details {
                Some(details) => tracing::debug!(exception = %details.text, "Font readiness check threw; continuing"),
                None => tracing::trace!("Fonts ready"),
            },
            Err(e) => tracing::debug!(error = %e, "Font readiness check failed; continuing"),
        }
    }

    /// Tear down page, context and process, in that order. Returns the
    /// number of requests blocked while networking was disabled.
    pub(crate) async fn close(self) -> usize {
        let Self { process, context, page, interceptor } = self;
        let mut blocked = 0;
        if let Some(interceptor) = interceptor {
            interceptor.task.abort();
            blocked = interceptor.blocked.load(Ordering::Relaxed);
            tracing::debug!(blocked, "Blocked non-local network requests");
        }
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "Failed to close page");
        }
        process.dispose_context(context).await;
        process.close().await;
        tracing::debug!("Browser session closed");
        blocked
    }
}
