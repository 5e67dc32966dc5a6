//! Picking the value to render out of an evaluation.

use std::borrow::Cow;

use crate::error::CadError;
use crate::geometry::{Assembly, Geometry, Rgba, Shape};
use crate::kernel::Evaluation;

/// Default selection key.
pub const DEFAULT_SELECT: &str = "result";

/// Select the geometry to render.
///
/// An explicitly shown value always wins; `key` is only consulted when the
/// script showed nothing.
///
/// # Errors
///
/// Returns [`CadError::UnknownSelection`] if `key` is not bound, or
/// [`CadError::NoRenderableResult`] if the chosen value is not geometry.
pub fn select<'a>(evaluation: &'a Evaluation, key: &str) -> Result<Geometry<'a>, CadError> {
    let value = match &evaluation.first_result {
        Some(value) => value,
        None => evaluation
            .env
            .get(key)
            .ok_or_else(|| CadError::UnknownSelection(key.to_owned()))?,
    };
    value.as_geometry().ok_or(CadError::NoRenderableResult)
}

/// Wrap geometry into an assembly for scene export.
///
/// Assemblies are returned unchanged and `color` is ignored for them.
#[must_use]
pub fn to_assembly(geometry: Geometry<'_>, color: Rgba) -> Cow<'_, Assembly> {
    match geometry {
        Geometry::Assembly(assembly) => Cow::Borrowed(assembly),
        Geometry::Sketch(sketch) => Cow::Owned(Assembly::from_shape(
            Shape::from_faces(sketch.faces.clone()),
            color,
        )),
        Geometry::Shape(shape) => Cow::Owned(Assembly::from_shape(shape.clone(), color)),
    }
}
