//! JSON export serializer.
//!
//! Produces a pretty-printed document:
//!
//! ```json
//! {
//!   "width": 2,
//!   "height": 1,
//!   "regions": [
//!     { "id": 0, "color": [255, 0, 0, 255], "bounding_box_area": 1,
//!       "polygon": [[0, 0], [1, 0], [1, 1], [0, 1]] }
//!   ]
//! }
//! ```
//!
//! Polygons stay in the pipeline's Cartesian space (origin bottom-left).
//! Regions appear in the order given.

use serde::Serialize;

use regiontrace_pipeline::{Dimensions, Emitter, OutputRecord};

use crate::ExportError;

#[derive(Serialize)]
struct Document<'a, C> {
    width: u32,
    height: u32,
    regions: Vec<Region<'a, C>>,
}

#[derive(Serialize)]
struct Region<'a, C> {
    id: usize,
    color: &'a C,
    bounding_box_area: i64,
    polygon: Vec<[i64; 2]>,
}

/// Serialize traced regions into a JSON document string.
///
/// # Errors
///
/// Returns the `serde_json` error if a color fails to serialize.
pub fn to_json<C: Serialize>(
    records: &[OutputRecord<C>],
    dimensions: Dimensions,
) -> Result<String, serde_json::Error> {
    let document = Document {
        width: dimensions.width,
        height: dimensions.height,
        regions: records
            .iter()
            .map(|r| Region {
                id: r.region,
                color: &r.color,
                bounding_box_area: r.polygon.bounding_box_area(),
                polygon: r.polygon.vertices().iter().map(|v| [v.x, v.y]).collect(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&document)
}

/// [`Emitter`] producing a JSON document string.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEmitter;

impl<C: Serialize> Emitter<C> for JsonEmitter {
    type Output = String;
    type Error = ExportError;

    fn emit(
        &mut self,
        records: &[OutputRecord<C>],
        dimensions: Dimensions,
    ) -> Result<String, ExportError> {
        Ok(to_json(records, dimensions)?)
    }
}
