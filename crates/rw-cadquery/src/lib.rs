//! CAD model directives for markdown documentation.
//!
//! Pages embed CadQuery scripts in `:::` container blocks. Each script is
//! evaluated by a [`Kernel`], the selected value is exported, and the block
//! is replaced by either a static SVG drawing or an interactive vtk.js
//! viewer.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rw_cadquery::{
//!     CadProcessor, CadProcessorConfig, CadQueryDomain, CadSettings, ProcessKernel,
//! };
//!
//! let kernel = Arc::new(ProcessKernel::new("python3", vec!["-m".into(), "cq_eval".into()]));
//! let config = CadProcessorConfig::new()
//!     .with_source_root("docs")
//!     .with_source_path("docs/index.md");
//! let mut processor = CadQueryDomain::new(CadSettings::new(kernel), "site")
//!     .register(CadProcessor::with_config(config));
//!
//! let script = ":::cadquery-vtk\nresult = cq.Workplane().box(1, 1, 1)\n:::\n";
//! let markdown = processor.process(script);
//! let mut html = String::new();
//! pulldown_cmark::html::push_html(&mut html, pulldown_cmark::Parser::new(&markdown));
//! processor.post_process(&mut html);
//! ```

pub mod assets;
pub mod directive;
pub mod domain;
mod error;
mod evaluator;
pub mod export;
pub mod geometry;
pub mod kernel;
pub mod node;
pub mod options;
pub mod select;
#[cfg(test)]
mod test_support;

pub use assets::AssetInstaller;
pub use directive::{CadProcessor, CadProcessorConfig, CadSettings};
pub use domain::{CadQueryDomain, SvgPlaceholder, export_file_name};
pub use error::CadError;
pub use evaluator::evaluate;
pub use kernel::{Evaluation, Kernel, KernelFailure, ProcessKernel};
