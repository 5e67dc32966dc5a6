//! Raw HTML fragments for rendered models.

use crate::node::escape_html;

/// Badge shown over figure images.
pub(crate) const SVG_OVERLAY: &str =
    r#"<div class="cadquery-overlay"><span class="cadquery-overlay-label">SVG</span></div>"#;

/// SVG document without its XML declaration, for inline embedding.
pub(crate) fn inline_svg(svg: &str) -> &str {
    match svg.strip_prefix("<?xml") {
        Some(rest) => rest.find("?>").map_or(svg, |end| rest[end + 2..].trim_start()),
        None => svg,
    }
}

/// Viewer host element with an inline call to the embedded `render` script.
pub(crate) fn vtk_container(scene_json: &str, height: &str) -> String {
    format!(
        r#"<div class="cadquery-vtk" style="height: {}"><script>render({}, document.currentScript.parentNode);</script></div>"#,
        escape_html(height),
        script_safe(scene_json)
    )
}

/// Keep JSON from terminating the surrounding `<script>` element.
fn script_safe(json: &str) -> String {
    json.replace("</", r"<\/")
}
