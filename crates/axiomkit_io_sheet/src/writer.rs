//! XLSX serializer that writes an assembled sheet model into a workbook.

use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::{
    EnumCellValue, EnumWidthUnit, SheetExportError, SpecSheetCell, SpecSheetModel,
    SpecXlsxValuePolicy, SpecXlsxWriteOptions,
};

/// Save `model` as a single-sheet workbook at `path_file_out`.
pub fn save_sheet_model(
    model: &SpecSheetModel,
    path_file_out: &Path,
    sheet_name: &str,
    options: &SpecXlsxWriteOptions,
) -> Result<(), SheetExportError> {
    let mut workbook = derive_workbook(model, sheet_name, options)?;
    workbook
        .save(path_file_out)
        .map_err(derive_xlsx_error)?;
    log::info!("Saved sheet {sheet_name:?} to {}", path_file_out.display());
    Ok(())
}

/// Serialize `model` as a single-sheet workbook into memory.
pub fn save_sheet_model_to_buffer(
    model: &SpecSheetModel,
    sheet_name: &str,
    options: &SpecXlsxWriteOptions,
) -> Result<Vec<u8>, SheetExportError> {
    let mut workbook = derive_workbook(model, sheet_name, options)?;
    workbook.save_to_buffer().map_err(derive_xlsx_error)
}

fn derive_workbook(
    model: &SpecSheetModel,
    sheet_name: &str,
    options: &SpecXlsxWriteOptions,
) -> Result<Workbook, SheetExportError> {
    validate_sheet_model(model)?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sanitize_sheet_name(sheet_name, "_"))
        .map_err(derive_xlsx_error)?;
    write_sheet_model(worksheet, model, options)?;
    Ok(workbook)
}

/// Write grid, merges, widths and panes of `model` into `worksheet`.
///
/// Merges go first (XLSX keeps only the anchor value), then every cell value
/// so that numeric anchors keep their type.
pub fn write_sheet_model(
    worksheet: &mut Worksheet,
    model: &SpecSheetModel,
    options: &SpecXlsxWriteOptions,
) -> Result<(), SheetExportError> {
    let mut n_merges_skipped = 0usize;
    for merge in &model.merges {
        if merge.is_single_cell() {
            n_merges_skipped += 1;
            continue;
        }
        let format = model
            .cell(merge.row_start, merge.col_start)
            .map(derive_rust_xlsx_format)
            .unwrap_or_default();
        worksheet
            .merge_range(
                cast_row_num(merge.row_start)?,
                cast_col_num(merge.col_start)?,
                cast_row_num(merge.row_end)?,
                cast_col_num(merge.col_end)?,
                "",
                &format,
            )
            .map_err(derive_xlsx_error)?;
    }

    for (row_idx, row_cells) in model.grid.iter().enumerate() {
        for (col_idx, cell) in row_cells.iter().enumerate() {
            write_cell_with_format(
                worksheet,
                row_idx,
                col_idx,
                cell,
                &derive_rust_xlsx_format(cell),
                &options.value_policy,
            )?;
        }
    }

    for (col_idx, column_width) in model.column_widths.iter().enumerate() {
        let n_col = cast_col_num(col_idx)?;
        if column_width.if_hidden {
            if options.if_hide_row_span_column {
                worksheet.set_column_hidden(n_col).map_err(derive_xlsx_error)?;
            }
            continue;
        }
        let n_width_chars = match column_width.unit {
            EnumWidthUnit::Characters => column_width.width,
            EnumWidthUnit::Pixels => convert_pixels_to_chars(column_width.width),
        };
        worksheet
            .set_column_width(n_col, n_width_chars)
            .map_err(derive_xlsx_error)?;
    }

    if options.if_freeze_header {
        worksheet
            .set_freeze_panes(cast_row_num(model.n_rows_header)?, 0)
            .map_err(derive_xlsx_error)?;
    }

    log::debug!(
        "Wrote sheet model: rows={} cols={} merges={} (single-cell skipped={n_merges_skipped})",
        model.height(),
        model.width(),
        model.merges.len()
    );
    Ok(())
}

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Convert `NaN`/`Inf` to policy string; return error for finite values.
pub fn convert_nan_inf_to_str(
    x: f64,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<String, String> {
    if x.is_nan() {
        return Ok(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Ok(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    Err("Input is neither NaN nor Inf.".to_string())
}

/// Excel character width for a pixel width (default font metrics).
pub fn convert_pixels_to_chars(n_pixels: f64) -> f64 {
    if n_pixels <= 12.0 {
        n_pixels / 12.0
    } else {
        (n_pixels - 5.0) / 7.0
    }
}

fn validate_sheet_model(model: &SpecSheetModel) -> Result<(), SheetExportError> {
    if model.height() > N_NROWS_EXCEL_MAX {
        return Err(SheetExportError::Write(format!(
            "Sheet has {} rows; Excel limit is {N_NROWS_EXCEL_MAX}.",
            model.height()
        )));
    }
    if model.width() > N_NCOLS_EXCEL_MAX {
        return Err(SheetExportError::Write(format!(
            "Sheet has {} columns; Excel limit is {N_NCOLS_EXCEL_MAX}.",
            model.width()
        )));
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    cell: &SpecSheetCell,
    format: &Format,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<(), SheetExportError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match &cell.value {
        EnumCellValue::None => {
            worksheet
                .write_blank(n_row, n_col, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(n_row, n_col, val, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Number(val) if val.is_finite() => {
            worksheet
                .write_number_with_format(n_row, n_col, *val, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Number(val) => {
            let c_text = convert_nan_inf_to_str(*val, value_policy)
                .unwrap_or_else(|_| value_policy.nan_str.clone());
            log::warn!("Non-finite number at ({row_idx}, {col_idx}) written as {c_text:?}");
            worksheet
                .write_string_with_format(n_row, n_col, c_text, format)
                .map_err(derive_xlsx_error)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(cell: &SpecSheetCell) -> Format {
    let spec = &cell.style;
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &cell.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, SheetExportError> {
    u32::try_from(value).map_err(|_| SheetExportError::Write(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, SheetExportError> {
    u16::try_from(value)
        .map_err(|_| SheetExportError::Write(format!("column index overflow: {value}")))
}

fn derive_xlsx_error(err: XlsxError) -> SheetExportError {
    SheetExportError::Write(err.to_string())
}
