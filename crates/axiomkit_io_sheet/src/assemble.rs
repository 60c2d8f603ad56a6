//! Sheet model assembly: runs every stage and overlays header titles.

use crate::column::{SpecColumnAccessor, calculate_column_depth, flatten_columns};
use crate::conf::{
    C_TITLE_LINE_BREAK, EnumFmtKey, N_WIDTH_CHARS_DEFAULT, N_WIDTH_PIXELS_DEFAULT,
    derive_default_sheet_formats,
};
use crate::format::derive_formatted_grid;
use crate::merge::{plan_body_merges, plan_header_merges};
use crate::rows::{convert_records_to_rows, derive_row_span_records, derive_row_spans};
use crate::spec::{
    EnumCellValue, EnumWidthUnit, SpecCellFormat, SpecColumn, SpecColumnWidth, SpecSheetConfig,
    SpecSheetModel, TypeRecord,
};

////////////////////////////////////////////////////////////////////////////////
// #region Validation

/// Validate attribute keys and width policy of `config`.
pub fn validate_sheet_config(config: &SpecSheetConfig) -> Result<(), String> {
    for (c_name, c_key) in [
        ("key_align", &config.key_align),
        ("key_merge", &config.key_merge),
        ("key_fraction", &config.key_fraction),
        ("key_width", &config.key_width),
    ] {
        if c_key.trim().is_empty() {
            return Err(format!("config.{c_name} must be a non-empty string."));
        }
    }
    if let Some(n_multiplier) = config.width_multiplier
        && !(n_multiplier.is_finite() && n_multiplier > 0.0)
    {
        return Err("config.width_multiplier must be finite and > 0.".to_string());
    }
    if let Some(n_width) = config.width_default
        && !(n_width.is_finite() && n_width > 0.0)
    {
        return Err("config.width_default must be finite and > 0.".to_string());
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderTitles

/// Header title text with the line-break marker rendered as a space.
pub fn derive_header_title(title: &str) -> String {
    title.replace(C_TITLE_LINE_BREAK, " ")
}

/// Plan `(row, col, title)` placements for every column of the tree.
pub fn plan_header_titles(columns: &[SpecColumn]) -> Vec<(usize, usize, String)> {
    let (_, l_titles) = fold_header_titles(columns, 0, 0);
    l_titles
}

fn fold_header_titles(
    columns: &[SpecColumn],
    n_depth: usize,
    n_col_cursor: usize,
) -> (usize, Vec<(usize, usize, String)>) {
    columns.iter().fold(
        (n_col_cursor, Vec::new()),
        |(n_col_cursor, mut l_titles), col| {
            l_titles.push((n_depth, n_col_cursor, derive_header_title(&col.title)));
            if col.is_leaf() {
                return (n_col_cursor + 1, l_titles);
            }
            let (n_col_cursor_next, l_titles_children) =
                fold_header_titles(&col.children, n_depth + 1, n_col_cursor);
            l_titles.extend(l_titles_children);
            (n_col_cursor_next, l_titles)
        },
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnWidths

/// Width hint per leaf column.
///
/// Column width times multiplier, else the configured default, else the
/// unit default.
pub fn derive_column_widths(
    leaf_columns: &[&SpecColumn],
    accessor: &SpecColumnAccessor,
    config: &SpecSheetConfig,
) -> Vec<SpecColumnWidth> {
    let n_width_default = config.width_default.unwrap_or(match config.unit_width {
        EnumWidthUnit::Pixels => N_WIDTH_PIXELS_DEFAULT,
        EnumWidthUnit::Characters => N_WIDTH_CHARS_DEFAULT,
    });
    let n_multiplier = config.width_multiplier.unwrap_or(1.0);

    leaf_columns
        .iter()
        .map(|col| SpecColumnWidth {
            width: accessor
                .derive_width(col)
                .map_or(n_width_default, |n_width| n_width * n_multiplier),
            unit: config.unit_width,
            if_hidden: false,
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Assembly

/// Assemble a sheet model with the default body/header styles.
///
/// `records` is expected to be non-empty; callers short-circuit empty input.
pub fn assemble_sheet_model(
    records: &[TypeRecord],
    columns: &[SpecColumn],
    config: &SpecSheetConfig,
    group_field: Option<&str>,
) -> SpecSheetModel {
    let dict_fmt = derive_default_sheet_formats();
    let fmt_body = dict_fmt
        .get(EnumFmtKey::Body.as_str())
        .cloned()
        .unwrap_or_default();
    let fmt_header = dict_fmt
        .get(EnumFmtKey::Header.as_str())
        .cloned()
        .unwrap_or_default();
    assemble_sheet_model_with_formats(
        records,
        columns,
        config,
        group_field,
        &fmt_body,
        &fmt_header,
    )
}

/// Assemble a sheet model: header rows, formatted body, merges and widths.
pub fn assemble_sheet_model_with_formats(
    records: &[TypeRecord],
    columns: &[SpecColumn],
    config: &SpecSheetConfig,
    group_field: Option<&str>,
    fmt_body: &SpecCellFormat,
    fmt_header: &SpecCellFormat,
) -> SpecSheetModel {
    let accessor = SpecColumnAccessor::from_config(config);
    let leaf_columns = flatten_columns(columns);
    let n_depth = calculate_column_depth(columns);
    let n_rows_header = n_depth + 1;
    let if_row_span_col = group_field.is_some();

    for col in leaf_columns.iter().filter(|col| col.field.is_none()) {
        log::warn!("Leaf column {:?} has no field; its cells stay blank.", col.id);
    }

    let l_row_spans = derive_row_spans(records, group_field);
    let l_rows = convert_records_to_rows(records, &leaf_columns, &l_row_spans);
    let l_span_records = derive_row_span_records(&l_row_spans);

    let mut grid = derive_formatted_grid(
        &l_rows,
        &leaf_columns,
        &accessor,
        n_depth,
        fmt_body,
        fmt_header,
        if_row_span_col,
    );
    for (row_idx, col_idx, c_title) in plan_header_titles(columns) {
        grid[row_idx][col_idx].value = EnumCellValue::String(c_title);
    }

    let mut merges = plan_header_merges(columns, n_depth);
    merges.extend(plan_body_merges(
        &leaf_columns,
        &accessor,
        &l_span_records,
        n_rows_header,
    ));

    let mut column_widths = derive_column_widths(&leaf_columns, &accessor, config);
    let col_idx_row_span = if if_row_span_col {
        column_widths.push(SpecColumnWidth {
            width: 0.0,
            unit: config.unit_width,
            if_hidden: true,
        });
        Some(leaf_columns.len())
    } else {
        None
    };

    log::debug!(
        "Assembled sheet: leaves={} depth={} rows={} merges={} groups={}",
        leaf_columns.len(),
        n_depth,
        grid.len(),
        merges.len(),
        l_span_records.len()
    );

    SpecSheetModel {
        grid,
        merges,
        column_widths,
        n_rows_header,
        col_idx_row_span,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
