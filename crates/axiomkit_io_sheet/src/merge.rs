//! Merge region planning for nested headers and grouped body rows.

use crate::column::{SpecColumnAccessor, calculate_column_span};
use crate::spec::{SpecColumn, SpecMergeRange, SpecRowSpan};

////////////////////////////////////////////////////////////////////////////////
// #region HeaderMerges

/// Plan header merges for the column tree.
///
/// Leaves merge vertically from their own level down to `n_depth_max`;
/// branches merge horizontally over their descendant leaves on their level.
pub fn plan_header_merges(columns: &[SpecColumn], n_depth_max: usize) -> Vec<SpecMergeRange> {
    let (_, l_merges) = fold_header_merges(columns, 0, n_depth_max, 0);
    l_merges
}

fn fold_header_merges(
    columns: &[SpecColumn],
    n_depth: usize,
    n_depth_max: usize,
    n_col_cursor: usize,
) -> (usize, Vec<SpecMergeRange>) {
    columns.iter().fold(
        (n_col_cursor, Vec::new()),
        |(n_col_cursor, mut l_merges), col| {
            if col.is_leaf() {
                l_merges.push(SpecMergeRange {
                    row_start: n_depth,
                    col_start: n_col_cursor,
                    row_end: n_depth_max,
                    col_end: n_col_cursor,
                });
                return (n_col_cursor + 1, l_merges);
            }

            l_merges.push(SpecMergeRange {
                row_start: n_depth,
                col_start: n_col_cursor,
                row_end: n_depth,
                col_end: n_col_cursor + calculate_column_span(col) - 1,
            });
            let (n_col_cursor_next, l_merges_children) =
                fold_header_merges(&col.children, n_depth + 1, n_depth_max, n_col_cursor);
            l_merges.extend(l_merges_children);
            (n_col_cursor_next, l_merges)
        },
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BodyMerges

/// Plan vertical body merges for every mergeable leaf column.
///
/// `n_row_offset` shifts body row indices into sheet coordinates.
pub fn plan_body_merges(
    leaf_columns: &[&SpecColumn],
    accessor: &SpecColumnAccessor,
    row_spans: &[SpecRowSpan],
    n_row_offset: usize,
) -> Vec<SpecMergeRange> {
    leaf_columns
        .iter()
        .enumerate()
        .filter(|(_, col)| accessor.if_merge(col))
        .flat_map(|(col_idx, _)| {
            row_spans
                .iter()
                .filter(|span| span.n_rows_extra > 0)
                .map(move |span| SpecMergeRange {
                    row_start: n_row_offset + span.row_idx,
                    col_start: col_idx,
                    row_end: n_row_offset + span.row_idx + span.n_rows_extra,
                    col_end: col_idx,
                })
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
