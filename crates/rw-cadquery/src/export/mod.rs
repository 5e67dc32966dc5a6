//! Exporters from selected geometry to page payloads.
//!
//! - [`export_svg`]: hidden-line SVG drawing for figures and inline images
//! - [`export_scene_json`]: scene graph for the 3D viewer

mod scene;
mod svg;

pub use scene::export_scene_json;
pub use svg::{VIEW_DIRECTION, export_svg};

use crate::error::CadError;
use crate::evaluator::evaluate;
use crate::geometry::Rgba;
use crate::kernel::Kernel;
use crate::select::{select, to_assembly};

/// Evaluate `source` and export the selected value as SVG.
pub fn render_svg(kernel: &dyn Kernel, source: &str, select_key: &str) -> Result<String, CadError> {
    let evaluation = evaluate(kernel, source)?;
    let geometry = select(&evaluation, select_key)?;
    export_svg(&geometry)
}

/// Evaluate `source` and export the selected value as scene JSON.
///
/// Bare shapes and sketches are drawn in `color`.
pub fn render_scene(
    kernel: &dyn Kernel,
    source: &str,
    select_key: &str,
    color: Rgba,
) -> Result<String, CadError> {
    let evaluation = evaluate(kernel, source)?;
    let geometry = select(&evaluation, select_key)?;
    export_scene_json(&to_assembly(geometry, color))
}
