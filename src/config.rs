//! Configuration layering.
//!
//! Built-in defaults, then `config.toml` from the platform config directory
//! (or `--config`), then `HTML2PDF_*` environment variables. Command-line
//! flags are applied on top by the caller.

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use html2pdf_render::options::{DEFAULT_FORMAT, DEFAULT_MARGINS, DEFAULT_TIMEOUT};
use html2pdf_render::{Media, WaitUntil};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "HTML2PDF_";
const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chrome/Chromium executable; discovered from `PATH` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome: Option<PathBuf>,
    /// Navigation timeout in milliseconds.
    pub timeout: u64,
    pub format: String,
    /// `top,right,bottom,left`
    pub margin: String,
    pub wait_until: WaitUntil,
    pub media: Media,
    /// Allow requests to non-`file://` URLs.
    pub network: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            chrome: None,
            timeout: DEFAULT_TIMEOUT.as_millis() as u64,
            format: DEFAULT_FORMAT.to_string(),
            margin: DEFAULT_MARGINS.to_string(),
            wait_until: WaitUntil::default(),
            media: Media::default(),
            network: true,
        }
    }
}
impl Config {
    /// Location of the user's configuration file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "html2pdf").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        // A missing file is not an error; Toml::file only contributes if present.
        if let Some(file) = file.map(Path::to_path_buf).or_else(Self::default_path) {
            tracing::debug!(path = %file.display(), "Loading configuration file");
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::figment(file).extract().or_raise(|| ErrorKind::Config)
    }
}
