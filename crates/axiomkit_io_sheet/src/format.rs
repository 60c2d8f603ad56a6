//! Cell classification (percentage/currency/date/text) and body styling.

use std::sync::LazyLock;

use regex::Regex;

use crate::column::SpecColumnAccessor;
use crate::conf::{
    C_ALIGN_BODY_DEFAULT, C_NUM_FORMAT_CURRENCY_DECIMAL, C_NUM_FORMAT_CURRENCY_INTEGER,
    C_NUM_FORMAT_DATE, C_NUM_FORMAT_PERCENT_DECIMAL, C_NUM_FORMAT_PERCENT_INTEGER,
    N_NUM_FORMAT_FRACTION_MAX,
};
use crate::spec::{
    EnumCellValue, EnumColumnType, EnumRowSpan, SpecBodyRow, SpecCellFormat, SpecColumn,
    SpecSheetCell,
};

static RE_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?\s*%$").expect("valid percent pattern"));
static RE_NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?").expect("valid number pattern")
});

////////////////////////////////////////////////////////////////////////////////
// #region NumberParsing

/// Parse caller text as a number.
///
/// Empty text is `0`; otherwise the leading ASCII decimal number (the whole
/// text when it is one); anything else, `inf`/`nan` spellings included, is
/// `NaN`.
pub fn parse_number_lenient(text: &str) -> f64 {
    let c_text = text.trim();
    if c_text.is_empty() {
        return 0.0;
    }
    RE_NUMBER_PREFIX
        .find(c_text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

fn is_whole_number(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

/// Thousands-grouped pattern for a currency value.
///
/// `n_fraction` overrides the decimal places; `Some(0)` gives `#,##0`.
pub fn derive_currency_num_format(value: f64, n_fraction: Option<usize>) -> String {
    match n_fraction {
        Some(0) => C_NUM_FORMAT_CURRENCY_INTEGER.to_string(),
        Some(n) => format!(
            "{C_NUM_FORMAT_CURRENCY_INTEGER}.{}",
            "0".repeat(n.min(N_NUM_FORMAT_FRACTION_MAX))
        ),
        None if is_whole_number(value) => C_NUM_FORMAT_CURRENCY_INTEGER.to_string(),
        None => C_NUM_FORMAT_CURRENCY_DECIMAL.to_string(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatting

/// Body style of `column`: base style with the configured alignment.
pub fn derive_body_style(
    column: &SpecColumn,
    accessor: &SpecColumnAccessor,
    fmt_body: &SpecCellFormat,
) -> SpecCellFormat {
    fmt_body.with_(SpecCellFormat {
        align: Some(
            accessor
                .derive_align(column)
                .unwrap_or_else(|| C_ALIGN_BODY_DEFAULT.to_string()),
        ),
        ..Default::default()
    })
}

/// Classify and style one raw cell of `column`.
///
/// Order: percentage text, currency column, date column, plain value.
pub fn format_cell(
    column: &SpecColumn,
    accessor: &SpecColumnAccessor,
    value_raw: &EnumCellValue,
    fmt_body: &SpecCellFormat,
) -> SpecSheetCell {
    let style = derive_body_style(column, accessor, fmt_body);
    let c_text = value_raw.to_text();

    if RE_PERCENT.is_match(&c_text) {
        let n_percent = parse_number_lenient(c_text.trim_end_matches('%'));
        return SpecSheetCell {
            value: EnumCellValue::Number(n_percent / 100.0),
            num_format: Some(
                if is_whole_number(n_percent) {
                    C_NUM_FORMAT_PERCENT_INTEGER
                } else {
                    C_NUM_FORMAT_PERCENT_DECIMAL
                }
                .to_string(),
            ),
            style,
        };
    }

    match column.col_type {
        EnumColumnType::Currency => {
            let n_value = match value_raw {
                EnumCellValue::Number(n) => *n,
                _ => parse_number_lenient(&c_text.replace(',', "")),
            };
            if !n_value.is_finite() {
                log::warn!(
                    "Currency column {:?} holds non-numeric text {c_text:?}",
                    column.id
                );
            }
            SpecSheetCell {
                value: EnumCellValue::Number(n_value),
                num_format: Some(derive_currency_num_format(
                    n_value,
                    accessor.derive_fraction(column),
                )),
                style: style.with_(SpecCellFormat {
                    align: Some("right".to_string()),
                    ..Default::default()
                }),
            }
        }
        EnumColumnType::Date => SpecSheetCell {
            value: value_raw.clone(),
            num_format: Some(C_NUM_FORMAT_DATE.to_string()),
            style,
        },
        EnumColumnType::General => SpecSheetCell {
            value: value_raw.clone(),
            num_format: None,
            style,
        },
    }
}

/// Format body rows; mergeable cells of continuation rows become blank.
///
/// With `if_row_span_col`, a trailing cell carries the span count of each
/// group start row.
pub fn format_body_rows(
    rows: &[SpecBodyRow],
    leaf_columns: &[&SpecColumn],
    accessor: &SpecColumnAccessor,
    fmt_body: &SpecCellFormat,
    if_row_span_col: bool,
) -> Vec<Vec<SpecSheetCell>> {
    let l_if_merge: Vec<bool> = leaf_columns.iter().map(|col| accessor.if_merge(col)).collect();

    rows.iter()
        .map(|row| {
            let if_covered = row.row_span == EnumRowSpan::SpanContinuation;
            let mut l_cells: Vec<SpecSheetCell> = leaf_columns
                .iter()
                .zip(&row.cells)
                .zip(&l_if_merge)
                .map(|((col, value_raw), if_merge)| {
                    let mut cell = format_cell(col, accessor, value_raw, fmt_body);
                    if *if_merge && if_covered {
                        cell.value = EnumCellValue::None;
                    }
                    cell
                })
                .collect();

            if if_row_span_col {
                let mut cell = SpecSheetCell::blank(fmt_body);
                if let EnumRowSpan::SpanStart(n_rows) = row.row_span {
                    cell.value = EnumCellValue::Number(n_rows as f64);
                }
                l_cells.push(cell);
            }
            l_cells
        })
        .collect()
}

/// Body grid prefixed with `depth + 1` blank header rows.
pub fn derive_formatted_grid(
    rows: &[SpecBodyRow],
    leaf_columns: &[&SpecColumn],
    accessor: &SpecColumnAccessor,
    n_depth: usize,
    fmt_body: &SpecCellFormat,
    fmt_header: &SpecCellFormat,
    if_row_span_col: bool,
) -> Vec<Vec<SpecSheetCell>> {
    let n_width = leaf_columns.len() + usize::from(if_row_span_col);
    let row_header_blank = vec![SpecSheetCell::blank(fmt_header); n_width];

    let mut l_grid = vec![row_header_blank; n_depth + 1];
    l_grid.extend(format_body_rows(
        rows,
        leaf_columns,
        accessor,
        fmt_body,
        if_row_span_col,
    ));
    l_grid
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{EnumColumnAttr, SpecSheetConfig};

    fn derive_accessor() -> SpecColumnAccessor {
        SpecColumnAccessor::from_config(&SpecSheetConfig::default())
    }

    fn derive_fmt_body() -> SpecCellFormat {
        SpecCellFormat {
            border: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_percent_text_becomes_fraction() {
        let col = SpecColumn::leaf("p", "p", "P");
        let accessor = derive_accessor();

        let cell = format_cell(&col, &accessor, &EnumCellValue::from("42%"), &derive_fmt_body());
        assert_eq!(cell.value, EnumCellValue::Number(0.42));
        assert_eq!(cell.num_format.as_deref(), Some("0%"));

        let cell = format_cell(
            &col,
            &accessor,
            &EnumCellValue::from("12.5 %"),
            &derive_fmt_body(),
        );
        assert_eq!(cell.value, EnumCellValue::Number(0.125));
        assert_eq!(cell.num_format.as_deref(), Some("0.00%"));
    }

    #[test]
    fn test_percent_wins_over_currency() {
        let col = SpecColumn::leaf("p", "p", "P").with_type(EnumColumnType::Currency);
        let cell = format_cell(
            &col,
            &derive_accessor(),
            &EnumCellValue::from("50%"),
            &derive_fmt_body(),
        );
        assert_eq!(cell.value, EnumCellValue::Number(0.5));
        assert_eq!(cell.num_format.as_deref(), Some("0%"));
    }

    #[test]
    fn test_non_percent_text_stays_text() {
        let col = SpecColumn::leaf("p", "p", "P");
        for c_text in ["-5%", "abc%", "5%%", "% 5"] {
            let cell = format_cell(
                &col,
                &derive_accessor(),
                &EnumCellValue::from(c_text),
                &derive_fmt_body(),
            );
            assert_eq!(cell.value, EnumCellValue::from(c_text));
            assert_eq!(cell.num_format, None);
        }
    }

    #[test]
    fn test_currency_strips_grouping_separators() {
        let col = SpecColumn::leaf("c", "c", "C")
            .with_type(EnumColumnType::Currency)
            .with_attr("excelAlign", EnumColumnAttr::String("left".to_string()));
        let accessor = derive_accessor();

        let cell = format_cell(&col, &accessor, &EnumCellValue::from("1,234.5"), &derive_fmt_body());
        assert_eq!(cell.value, EnumCellValue::Number(1234.5));
        assert_eq!(cell.num_format.as_deref(), Some("#,##0.00"));
        assert_eq!(cell.style.align.as_deref(), Some("right"));

        let cell = format_cell(&col, &accessor, &EnumCellValue::from("1,000"), &derive_fmt_body());
        assert_eq!(cell.value, EnumCellValue::Number(1000.0));
        assert_eq!(cell.num_format.as_deref(), Some("#,##0"));
    }

    #[test]
    fn test_currency_fraction_override() {
        let col = SpecColumn::leaf("c", "c", "C")
            .with_type(EnumColumnType::Currency)
            .with_attr("excelFraction", EnumColumnAttr::Number(3.0));
        let cell = format_cell(
            &col,
            &derive_accessor(),
            &EnumCellValue::Number(12.0),
            &derive_fmt_body(),
        );
        assert_eq!(cell.value, EnumCellValue::Number(12.0));
        assert_eq!(cell.num_format.as_deref(), Some("#,##0.000"));

        assert_eq!(derive_currency_num_format(1.5, Some(0)), "#,##0");
    }

    #[test]
    fn test_currency_fraction_capped() {
        let col = SpecColumn::leaf("c", "c", "C")
            .with_type(EnumColumnType::Currency)
            .with_attr("excelFraction", EnumColumnAttr::Number(1e300));
        let cell = format_cell(
            &col,
            &derive_accessor(),
            &EnumCellValue::from("1"),
            &derive_fmt_body(),
        );
        assert_eq!(cell.value, EnumCellValue::Number(1.0));
        assert_eq!(cell.num_format, Some(format!("#,##0.{}", "0".repeat(30))));
        assert_eq!(
            derive_currency_num_format(1.0, Some(usize::MAX)),
            format!("#,##0.{}", "0".repeat(30))
        );
    }

    #[test]
    fn test_non_ascii_digits_stay_text() {
        let col = SpecColumn::leaf("p", "p", "P");
        let cell = format_cell(
            &col,
            &derive_accessor(),
            &EnumCellValue::from("٤٢%"),
            &derive_fmt_body(),
        );
        assert_eq!(cell.value, EnumCellValue::from("٤٢%"));
        assert_eq!(cell.num_format, None);

        assert!(parse_number_lenient("٤٢").is_nan());
        assert_eq!(parse_number_lenient("7٤"), 7.0);
    }

    #[test]
    fn test_parse_number_lenient_rejects_special_spellings() {
        for c_text in ["inf", "-Infinity", "NaN", "infinity"] {
            assert!(parse_number_lenient(c_text).is_nan(), "{c_text}");
        }
        assert_eq!(parse_number_lenient(" 1.5e3 "), 1500.0);
        assert_eq!(parse_number_lenient("-.5"), -0.5);
        assert_eq!(parse_number_lenient(""), 0.0);

        let col = SpecColumn::leaf("c", "c", "C").with_type(EnumColumnType::Currency);
        let cell = format_cell(
            &col,
            &derive_accessor(),
            &EnumCellValue::from("inf"),
            &derive_fmt_body(),
        );
        assert!(matches!(cell.value, EnumCellValue::Number(n) if n.is_nan()));
    }

    #[test]
    fn test_currency_unparsable_text() {
        let col = SpecColumn::leaf("c", "c", "C").with_type(EnumColumnType::Currency);
        let accessor = derive_accessor();

        let cell = format_cell(&col, &accessor, &EnumCellValue::from("12abc"), &derive_fmt_body());
        assert_eq!(cell.value, EnumCellValue::Number(12.0));

        let cell = format_cell(&col, &accessor, &EnumCellValue::from("n/a"), &derive_fmt_body());
        assert!(matches!(cell.value, EnumCellValue::Number(n) if n.is_nan()));
        assert_eq!(cell.num_format.as_deref(), Some("#,##0.00"));

        let cell = format_cell(&col, &accessor, &EnumCellValue::None, &derive_fmt_body());
        assert_eq!(cell.value, EnumCellValue::Number(0.0));
    }

    #[test]
    fn test_date_keeps_value_and_tags_format() {
        let col = SpecColumn::leaf("d", "d", "D").with_type(EnumColumnType::Date);
        let cell = format_cell(
            &col,
            &derive_accessor(),
            &EnumCellValue::from("2024-03-01"),
            &derive_fmt_body(),
        );
        assert_eq!(cell.value, EnumCellValue::from("2024-03-01"));
        assert_eq!(cell.num_format.as_deref(), Some("yyyy-mm-dd"));
    }

    #[test]
    fn test_body_style_alignment() {
        let col = SpecColumn::leaf("t", "t", "T");
        let cell = format_cell(&col, &derive_accessor(), &EnumCellValue::from("x"), &derive_fmt_body());
        assert_eq!(cell.style.align.as_deref(), Some("center"));
        assert_eq!(cell.style.border, Some(1));
    }

    #[test]
    fn test_continuation_rows_blank_only_mergeable_cells() {
        let columns = [
            SpecColumn::leaf("g", "g", "G").with_attr("isMerge", EnumColumnAttr::Boolean(true)),
            SpecColumn::leaf("v", "v", "V"),
        ];
        let leaf_columns: Vec<&SpecColumn> = columns.iter().collect();
        let rows = vec![
            SpecBodyRow {
                cells: vec![EnumCellValue::from("x"), EnumCellValue::from("1")],
                row_span: EnumRowSpan::SpanStart(2),
            },
            SpecBodyRow {
                cells: vec![EnumCellValue::from("x"), EnumCellValue::from("2")],
                row_span: EnumRowSpan::SpanContinuation,
            },
            SpecBodyRow {
                cells: vec![EnumCellValue::None, EnumCellValue::from("3")],
                row_span: EnumRowSpan::NoMerge,
            },
        ];

        let l_grid = format_body_rows(&rows, &leaf_columns, &derive_accessor(), &derive_fmt_body(), true);

        assert_eq!(l_grid[0][0].value, EnumCellValue::from("x"));
        assert_eq!(l_grid[1][0].value, EnumCellValue::None);
        assert_eq!(l_grid[1][1].value, EnumCellValue::from("2"));
        assert_eq!(l_grid[0][2].value, EnumCellValue::Number(2.0));
        assert_eq!(l_grid[1][2].value, EnumCellValue::None);
        assert_eq!(l_grid[2][2].value, EnumCellValue::None);
    }

    #[test]
    fn test_formatted_grid_pads_header_rows() {
        let columns = [SpecColumn::leaf("a", "a", "A")];
        let leaf_columns: Vec<&SpecColumn> = columns.iter().collect();
        let rows = vec![SpecBodyRow {
            cells: vec![EnumCellValue::from("1")],
            row_span: EnumRowSpan::NoMerge,
        }];
        let fmt_header = SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        };

        let l_grid = derive_formatted_grid(
            &rows,
            &leaf_columns,
            &derive_accessor(),
            2,
            &derive_fmt_body(),
            &fmt_header,
            false,
        );
        assert_eq!(l_grid.len(), 4);
        assert!(l_grid[..3].iter().all(|row| row.len() == 1 && row[0].style == fmt_header));
        assert_eq!(l_grid[3][0].value, EnumCellValue::from("1"));
    }
}
