//! Region ordering: largest outlines first.
//!
//! Consumers that draw records in sequence paint larger regions first so
//! smaller ones layer on top of them.

use crate::types::OutputRecord;

/// Sort `records` by descending bounding-box area.
///
/// The sort is stable: records with equal area keep their incoming
/// (discovery) order.
#[must_use]
pub fn order_records<C>(mut records: Vec<OutputRecord<C>>) -> Vec<OutputRecord<C>> {
    records.sort_by_key(|r| std::cmp::Reverse(r.polygon.bounding_box_area()));
    records
}

/// Whether `records` is sorted by non-increasing bounding-box area.
#[must_use]
pub fn is_ordered<C>(records: &[OutputRecord<C>]) -> bool {
    records
        .windows(2)
        .all(|w| w[0].polygon.bounding_box_area() >= w[1].polygon.bounding_box_area())
}
