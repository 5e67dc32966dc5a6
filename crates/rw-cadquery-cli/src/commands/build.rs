//! `rw-cadquery build` command implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use ignore::WalkBuilder;
use pulldown_cmark::{Options, Parser, html};
use rw_cadquery::{
    AssetInstaller, CadProcessor, CadProcessorConfig, CadQueryDomain, CadSettings, ProcessKernel,
};
use rw_cadquery_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover rw-cadquery.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory for the rendered pages (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Hide the script below each model unless a directive asks for it.
    #[arg(long)]
    no_include_source: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            include_source: self.no_include_source.then_some(false),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let docs = &config.docs_resolved;

        output.info(&format!("Source: {}", docs.source_dir.display()));
        output.info(&format!("Output: {}", docs.output_dir.display()));

        let kernel = ProcessKernel::from_command(&config.kernel.command)
            .ok_or_else(|| CliError::Validation("kernel.command must name a program".to_owned()))?
            .working_dir(&docs.source_dir);
        let settings =
            CadSettings::new(Arc::new(kernel)).with_include_source(config.cadquery.include_source);

        let mut site = SiteBuilder::new(
            settings,
            &docs.source_dir,
            &docs.output_dir,
            AssetInstaller::new(config.cadquery.viewer_script.clone()),
        );
        let report = site.build()?;

        for warning in &report.warnings {
            output.warning(warning);
        }
        output.success(&format!(
            "Rendered {} pages to {} ({} warnings)",
            report.pages,
            docs.output_dir.display(),
            report.warnings.len()
        ));
        Ok(())
    }
}

/// Outcome of a site build.
#[derive(Debug, Default)]
struct BuildReport {
    pages: usize,
    warnings: Vec<String>,
}

/// Renders every markdown page under a source directory.
struct SiteBuilder<'a> {
    settings: CadSettings,
    source_dir: &'a Path,
    output_dir: &'a Path,
    assets: AssetInstaller,
}

impl<'a> SiteBuilder<'a> {
    fn new(
        settings: CadSettings,
        source_dir: &'a Path,
        output_dir: &'a Path,
        assets: AssetInstaller,
    ) -> Self {
        Self {
            settings,
            source_dir,
            output_dir,
            assets,
        }
    }

    fn build(&mut self) -> Result<BuildReport, CliError> {
        if !self.source_dir.is_dir() {
            return Err(CliError::Validation(format!(
                "source directory does not exist: {}",
                self.source_dir.display()
            )));
        }

        fs::create_dir_all(self.output_dir)?;
        self.assets.install(self.output_dir)?;

        let mut report = BuildReport::default();
        for page in self.markdown_pages()? {
            let relative = page.strip_prefix(self.source_dir).unwrap_or(&page).to_path_buf();
            let markdown = fs::read_to_string(&page)?;

            let (document, warnings) = self.render_page(&markdown, &relative);

            let target = self.output_dir.join(&relative).with_extension("html");
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, document)?;
            tracing::info!(page = %relative.display(), "Rendered page");

            report.pages += 1;
            report.warnings.extend(warnings);
        }

        Ok(report)
    }

    /// Markdown files under the source directory, in path order.
    fn markdown_pages(&self) -> Result<Vec<PathBuf>, CliError> {
        let mut pages = Vec::new();
        for entry in WalkBuilder::new(self.source_dir).build() {
            let entry = entry?;
            let path = entry.path();
            let is_file = entry.file_type().is_some_and(|t| t.is_file());
            if is_file && path.extension().is_some_and(|e| e == "md") {
                pages.push(path.to_path_buf());
            }
        }
        pages.sort();
        Ok(pages)
    }

    /// Render one page to a complete HTML document.
    fn render_page(&self, markdown: &str, relative: &Path) -> (String, Vec<String>) {
        let config = CadProcessorConfig::new()
            .with_source_root(self.source_dir)
            .with_source_path(relative);
        let depth = config.depth();
        let mut processor = CadQueryDomain::new(self.settings.clone(), self.output_dir)
            .register(CadProcessor::with_config(config));

        let processed = processor.process(markdown);
        let mut body = String::new();
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        html::push_html(&mut body, Parser::new_ext(&processed, options));
        processor.post_process(&mut body);

        let title = relative
            .file_stem()
            .map_or_else(|| "Documentation".to_owned(), |s| s.to_string_lossy().into_owned());
        let document = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{}</title>\n{}\n{}\n</head>\n\
             <body>\n{body}</body>\n</html>\n",
            rw_cadquery::node::escape_html(&title),
            self.assets.stylesheet_links(depth),
            self.assets.script_tags(depth),
        );

        (document, processor.warnings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rw_cadquery::{Evaluation, Kernel, KernelFailure};

    /// Kernel rejecting every script.
    struct RejectingKernel;

    impl Kernel for RejectingKernel {
        fn build(&self, _source: &str) -> Result<Evaluation, KernelFailure> {
            Err(KernelFailure::new("ModuleNotFoundError: No module named 'cadquery'"))
        }
    }

    fn builder<'a>(source: &'a Path, output: &'a Path) -> SiteBuilder<'a> {
        SiteBuilder::new(
            CadSettings::new(Arc::new(RejectingKernel)),
            source,
            output,
            AssetInstaller::default(),
        )
    }

    #[test]
    fn test_build_writes_pages_and_assets() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("docs");
        let output = dir.path().join("site");
        fs::create_dir_all(source.join("guide")).unwrap();
        fs::write(source.join("index.md"), "# Home\n\nPlain page.\n").unwrap();
        fs::write(source.join("guide/parts.md"), "# Parts\n").unwrap();
        fs::write(source.join("notes.txt"), "not markdown").unwrap();

        let report = builder(&source, &output).build().unwrap();

        assert_eq!(report.pages, 2);
        assert!(report.warnings.is_empty());
        let index = fs::read_to_string(output.join("index.html")).unwrap();
        assert!(index.contains("<h1>Home</h1>"));
        assert!(index.contains(r#"href="_static/cadquery.css""#));
        let nested = fs::read_to_string(output.join("guide/parts.html")).unwrap();
        assert!(nested.contains(r#"src="../_static/render.js""#));
        assert!(output.join("_static/render.js").exists());
        assert!(!output.join("notes.html").exists());
    }

    #[test]
    fn test_script_failure_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("docs");
        let output = dir.path().join("site");
        fs::create_dir_all(&source).unwrap();
        let page = ":::cadquery-vtk\nimport cadquery as cq\n:::\n";
        fs::write(source.join("index.md"), page).unwrap();

        let report = builder(&source, &output).build().unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.warnings.len(), 1);
        let expected = "index.md:1: Script error in cadquery-vtk directive:";
        assert!(report.warnings[0].starts_with(expected));
        let index = fs::read_to_string(output.join("index.html")).unwrap();
        assert!(index.contains("cadquery-error"));
    }

    #[test]
    fn test_missing_source_dir() {
        let dir = tempfile::tempdir().unwrap();

        let result = builder(&dir.path().join("missing"), &dir.path().join("site")).build();

        assert!(matches!(result, Err(CliError::Validation(_))));
    }
}
