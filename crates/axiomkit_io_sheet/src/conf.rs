//! Sheet export constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{SpecCellFormat, SpecSheetConfig, SpecXlsxWriteOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Record field name of the hidden row-span bookkeeping column.
pub const C_FIELD_ROW_SPAN: &str = "cellRowSpan";
/// Line-break marker allowed in column titles; rendered as a single space.
pub const C_TITLE_LINE_BREAK: &str = "<br/>";
/// Default sheet name of an exported workbook.
pub const C_SHEET_NAME_DEFAULT: &str = "sheet1";

/// Default column width in character units.
pub const N_WIDTH_CHARS_DEFAULT: f64 = 14.0;
/// Default column width in pixel units.
pub const N_WIDTH_PIXELS_DEFAULT: f64 = 100.0;

/// Default horizontal alignment of body cells.
pub const C_ALIGN_BODY_DEFAULT: &str = "center";

/// Percentage display pattern for whole numbers.
pub const C_NUM_FORMAT_PERCENT_INTEGER: &str = "0%";
/// Percentage display pattern for fractional numbers.
pub const C_NUM_FORMAT_PERCENT_DECIMAL: &str = "0.00%";
/// Thousands-grouped display pattern for whole currency values.
pub const C_NUM_FORMAT_CURRENCY_INTEGER: &str = "#,##0";
/// Thousands-grouped display pattern for fractional currency values.
pub const C_NUM_FORMAT_CURRENCY_DECIMAL: &str = "#,##0.00";
/// Maximum decimal places Excel accepts in a number format.
pub const N_NUM_FORMAT_FRACTION_MAX: usize = 30;
/// Display pattern of date columns.
pub const C_NUM_FORMAT_DATE: &str = "yyyy-mm-dd";

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFmtKey {
    /// Body cell format.
    Body,
    /// Header cell format.
    Header,
}

impl EnumFmtKey {
    /// Preset map key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Header => "header",
        }
    }
}

/// Build default named format presets used by the cell formatter.
pub fn derive_default_sheet_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Malgun Gothic".to_string()),
        font_size: Some(11),
        border: Some(1),
        valign: Some("vcenter".to_string()),
        text_wrap: Some(true),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(
        EnumFmtKey::Body.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some(C_ALIGN_BODY_DEFAULT.to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Header.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            bg_color: Some("#7A7A7A".to_string()),
            font_color: Some("#FFFFFF".to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}

/// Build default sheet config (column attribute keys of the classic grid schema).
pub fn derive_default_sheet_config() -> SpecSheetConfig {
    SpecSheetConfig::default()
}

/// Build default write options.
pub fn derive_default_xlsx_write_options() -> SpecXlsxWriteOptions {
    SpecXlsxWriteOptions::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formats_share_border_and_font() {
        let dict_fmt = derive_default_sheet_formats();
        let fmt_body = &dict_fmt["body"];
        let fmt_header = &dict_fmt["header"];

        assert_eq!(fmt_body.border, Some(1));
        assert_eq!(fmt_header.border, Some(1));
        assert_eq!(fmt_body.font_name, fmt_header.font_name);
        assert_eq!(fmt_body.align.as_deref(), Some("center"));
        assert_eq!(fmt_header.bold, Some(true));
        assert_eq!(fmt_body.bold, None);
    }
}
