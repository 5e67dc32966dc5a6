//! Stylesheet and viewer script shipped with the rendered pages.
//!
//! Both files are compiled into the crate via `rust-embed` and copied into
//! the output's `_static/` directory once per build.

use std::fs;
use std::io;
use std::path::Path;

use crate::node::escape_html;

/// Viewer library loaded before `render.js` unless configured otherwise.
pub const DEFAULT_VIEWER_SCRIPT: &str = "https://unpkg.com/vtk.js";

/// Output directory receiving the assets.
pub const STATIC_DIR: &str = "_static";

const STYLESHEET: &str = "cadquery.css";
const RENDER_SCRIPT: &str = "render.js";

#[derive(rust_embed::RustEmbed)]
#[folder = "static/"]
struct Static;

/// Installs the assets and produces the tags referencing them.
#[derive(Debug)]
pub struct AssetInstaller {
    installed: bool,
    viewer_script: String,
}

impl Default for AssetInstaller {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWER_SCRIPT)
    }
}

impl AssetInstaller {
    #[must_use]
    pub fn new(viewer_script: impl Into<String>) -> Self {
        Self {
            installed: false,
            viewer_script: viewer_script.into(),
        }
    }

    /// Write the assets under `out_dir/_static/`.
    ///
    /// Only the first call writes; later calls return `Ok(false)`.
    pub fn install(&mut self, out_dir: &Path) -> io::Result<bool> {
        if self.installed {
            return Ok(false);
        }

        let dir = out_dir.join(STATIC_DIR);
        fs::create_dir_all(&dir)?;
        for name in Static::iter() {
            if let Some(file) = Static::get(&name) {
                fs::write(dir.join(name.as_ref()), file.data)?;
            }
        }
        tracing::debug!(dir = %dir.display(), "Installed CadQuery assets");

        self.installed = true;
        Ok(true)
    }

    /// `<link>` tag for a page `depth` levels below the output root.
    #[must_use]
    pub fn stylesheet_links(&self, depth: usize) -> String {
        format!(
            r#"<link rel="stylesheet" href="{}{STATIC_DIR}/{STYLESHEET}">"#,
            "../".repeat(depth)
        )
    }

    /// `<script>` tags for the viewer library and `render.js`.
    #[must_use]
    pub fn script_tags(&self, depth: usize) -> String {
        let prefix = "../".repeat(depth);
        let viewer = if is_absolute_url(&self.viewer_script) {
            self.viewer_script.clone()
        } else {
            format!("{prefix}{}", self.viewer_script)
        };
        format!(
            "<script src=\"{}\"></script>\n\
             <script src=\"{prefix}{STATIC_DIR}/{RENDER_SCRIPT}\"></script>",
            escape_html(&viewer)
        )
    }
}

fn is_absolute_url(src: &str) -> bool {
    src.starts_with("//") || src.contains("://")
}
