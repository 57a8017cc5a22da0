//! Embedded header/footer templates.
//!
//! Chrome fills elements with the classes `pageNumber`, `totalPages`, `date`,
//! `title` and `url` inside these templates. They are embedded into the
//! binary at compile time using [`rust-embed`](rust_embed).

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "assets/templates/"]
struct Builtins;
impl Builtins {
    fn load(name: &str) -> Result<String> {
        let file = Self::get(name).ok_or_raise(|| ErrorKind::NotFound(format!("builtin:{name}").into()))?;
        String::from_utf8(file.data.into_owned()).or_raise(|| ErrorKind::Io)
    }
}

/// The built-in footer: a small grey "Generated" label on the left and a
/// `page / total` indicator on the right.
pub fn default_footer() -> Result<String> {
    Builtins::load("footer.html")
}

/// Names of all embedded templates.
pub fn list() -> Vec<String> {
    Builtins::iter().filter(|f| f.ends_with(".html")).map(|f| f.into_owned()).collect()
}
