//! `axiomkit_io_sheet` v1:
//! Hierarchical-header sheet export kernel.
//!
//! Pipeline modules:
//! - `conf`     : constants and default presets
//! - `spec`     : specs/models/options/errors
//! - `column`   : column tree flattening, depth and config accessors
//! - `rows`     : record copy and group-span annotation
//! - `format`   : per-cell display values and number formats
//! - `merge`    : header and body merge planning
//! - `assemble` : sheet model assembly
//! - `record`   : polars record sources
//! - `writer`   : XLSX serializer
//! - `worker`   : synchronous and background export entry points
pub mod assemble;
pub mod column;
pub mod conf;
pub mod format;
pub mod merge;
pub mod record;
pub mod rows;
pub mod spec;
pub mod worker;
pub mod writer;

pub use assemble::{assemble_sheet_model, assemble_sheet_model_with_formats, validate_sheet_config};
pub use column::{SpecColumnAccessor, calculate_column_depth, flatten_columns};
pub use conf::{
    C_FIELD_ROW_SPAN, C_SHEET_NAME_DEFAULT, EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX,
    N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL, derive_default_sheet_config,
    derive_default_sheet_formats, derive_default_xlsx_write_options,
};
pub use format::{derive_formatted_grid, format_body_rows, format_cell};
pub use merge::{plan_body_merges, plan_header_merges};
pub use record::{derive_records_from_dataframe, derive_records_from_ipc_bytes};
pub use rows::{convert_records_to_rows, derive_row_span_records, derive_row_spans};
pub use spec::{
    EnumCellValue, EnumColumnAttr, EnumColumnType, EnumRowSpan, EnumSheetExportReply,
    EnumWidthUnit, SheetExportError, SpecBodyRow, SpecCellFormat, SpecColumn, SpecColumnWidth,
    SpecMergeRange, SpecRowSpan, SpecSheetCell, SpecSheetConfig, SpecSheetExportRequest,
    SpecSheetModel, SpecXlsxValuePolicy, SpecXlsxWriteOptions, TypeRecord,
};
pub use worker::{SheetExportWorker, export_sheet_to_buffer, export_sheet_to_file};
pub use writer::{sanitize_sheet_name, save_sheet_model, save_sheet_model_to_buffer, write_sheet_model};
