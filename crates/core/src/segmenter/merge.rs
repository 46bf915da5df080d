use serde::{Deserialize, Serialize};

use crate::types::{ChapterBoundary, TaggedBoundary};

/// How per-chunk boundaries are combined into one chapter list.
///
/// Both policies sort by `start_timestamp` as a string. That is only a time
/// ordering because every timestamp has the fixed `HH:MM:SS.mmm` width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Concatenate and sort. Chapters that straddle a chunk seam stay duplicated.
    #[default]
    None,
    /// Sort, then fold a boundary into its predecessor when they come from
    /// different chunks and their ranges overlap.
    Overlap,
}

impl MergePolicy {
    pub fn merge(self, tagged: Vec<TaggedBoundary>) -> Vec<ChapterBoundary> {
        let sorted = sort_lexically(tagged);
        match self {
            MergePolicy::None => sorted.into_iter().map(|t| t.boundary).collect(),
            MergePolicy::Overlap => fold_overlaps(sorted),
        }
    }
}

/// Stable sort: ties keep chunk order.
fn sort_lexically(mut tagged: Vec<TaggedBoundary>) -> Vec<TaggedBoundary> {
    tagged.sort_by_key(|t| t.chunk_index);
    tagged.sort_by(|a, b| a.boundary.start_timestamp.cmp(&b.boundary.start_timestamp));
    tagged
}

fn fold_overlaps(sorted: Vec<TaggedBoundary>) -> Vec<ChapterBoundary> {
    let mut merged: Vec<TaggedBoundary> = Vec::with_capacity(sorted.len());

    for next in sorted {
        match merged.last_mut() {
            Some(last)
                if last.chunk_index != next.chunk_index
                    && next.boundary.start_timestamp <= last.boundary.end_timestamp =>
            {
                if next.boundary.end_timestamp > last.boundary.end_timestamp {
                    last.boundary.end_timestamp = next.boundary.end_timestamp;
                }
                // Later chunks continue the folded chapter.
                last.chunk_index = next.chunk_index;
            }
            _ => merged.push(next),
        }
    }

    merged.into_iter().map(|t| t.boundary).collect()
}
