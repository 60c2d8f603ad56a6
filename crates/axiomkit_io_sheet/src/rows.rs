//! Record-to-row conversion and row grouping spans.

use crate::spec::{EnumCellValue, EnumRowSpan, SpecBodyRow, SpecColumn, SpecRowSpan, TypeRecord};

////////////////////////////////////////////////////////////////////////////////
// #region GroupSpans

/// Annotate each record with its grouping span on `group_field`.
///
/// Consecutive records with equal non-empty values form one group: the first
/// row gets `SpanStart(len)` (also for `len == 1`), the others
/// `SpanContinuation`. Blank values and a missing `group_field` give `NoMerge`.
pub fn derive_row_spans(records: &[TypeRecord], group_field: Option<&str>) -> Vec<EnumRowSpan> {
    let mut l_row_spans = vec![EnumRowSpan::NoMerge; records.len()];
    let Some(group_field) = group_field else {
        return l_row_spans;
    };

    let n_rows = records.len();
    let mut n_row_idx_start = 0;
    while n_row_idx_start < n_rows {
        let Some(value_group) = derive_group_value(&records[n_row_idx_start], group_field) else {
            n_row_idx_start += 1;
            continue;
        };

        let mut n_row_idx_next = n_row_idx_start + 1;
        while n_row_idx_next < n_rows
            && derive_group_value(&records[n_row_idx_next], group_field) == Some(value_group)
        {
            n_row_idx_next += 1;
        }

        l_row_spans[n_row_idx_start] = EnumRowSpan::SpanStart(n_row_idx_next - n_row_idx_start);
        for row_span in &mut l_row_spans[(n_row_idx_start + 1)..n_row_idx_next] {
            *row_span = EnumRowSpan::SpanContinuation;
        }
        n_row_idx_start = n_row_idx_next;
    }

    l_row_spans
}

/// Span records for groups covering more than one row.
pub fn derive_row_span_records(row_spans: &[EnumRowSpan]) -> Vec<SpecRowSpan> {
    row_spans
        .iter()
        .enumerate()
        .filter_map(|(row_idx, row_span)| match row_span {
            EnumRowSpan::SpanStart(n_rows) if *n_rows > 1 => Some(SpecRowSpan {
                row_idx,
                n_rows_extra: n_rows - 1,
            }),
            _ => None,
        })
        .collect()
}

fn derive_group_value<'a>(record: &'a TypeRecord, group_field: &str) -> Option<&'a EnumCellValue> {
    record.get(group_field).filter(|value| !value.is_empty())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowConversion

/// Copy records into body rows, one cell per leaf column.
///
/// Input records are only read; each row owns fresh cell values and carries
/// its span annotation from `row_spans` (`NoMerge` when shorter).
pub fn convert_records_to_rows(
    records: &[TypeRecord],
    leaf_columns: &[&SpecColumn],
    row_spans: &[EnumRowSpan],
) -> Vec<SpecBodyRow> {
    records
        .iter()
        .enumerate()
        .map(|(row_idx, record)| SpecBodyRow {
            cells: leaf_columns
                .iter()
                .map(|col| {
                    col.field
                        .as_deref()
                        .and_then(|field| record.get(field))
                        .cloned()
                        .unwrap_or(EnumCellValue::None)
                })
                .collect(),
            row_span: row_spans.get(row_idx).copied().unwrap_or_default(),
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn derive_records(field: &str, values: &[&str]) -> Vec<TypeRecord> {
        values
            .iter()
            .map(|value| {
                let mut record = TypeRecord::new();
                if !value.is_empty() {
                    record.insert(field.to_string(), EnumCellValue::from(*value));
                }
                record
            })
            .collect()
    }

    #[test]
    fn test_row_spans_three_way_annotation() {
        let records = derive_records("g", &["x", "x", "x", "y", "", "", "z", "z"]);
        let l_row_spans = derive_row_spans(&records, Some("g"));

        assert_eq!(
            l_row_spans,
            vec![
                EnumRowSpan::SpanStart(3),
                EnumRowSpan::SpanContinuation,
                EnumRowSpan::SpanContinuation,
                EnumRowSpan::SpanStart(1),
                EnumRowSpan::NoMerge,
                EnumRowSpan::NoMerge,
                EnumRowSpan::SpanStart(2),
                EnumRowSpan::SpanContinuation,
            ]
        );
    }

    #[test]
    fn test_non_empty_singleton_is_explicit_one() {
        let records = derive_records("g", &["x", "y", "x"]);
        assert_eq!(
            derive_row_spans(&records, Some("g")),
            vec![EnumRowSpan::SpanStart(1); 3]
        );
        assert!(derive_row_span_records(&derive_row_spans(&records, Some("g"))).is_empty());
    }

    #[test]
    fn test_row_spans_without_group_field() {
        let records = derive_records("g", &["x", "x"]);
        assert_eq!(
            derive_row_spans(&records, None),
            vec![EnumRowSpan::NoMerge, EnumRowSpan::NoMerge]
        );
    }

    #[test]
    fn test_row_spans_are_stable_and_sum_to_run_length() {
        let records = derive_records("g", &["a", "a", "b", "b", "b", "", "c"]);
        let l_first = derive_row_spans(&records, Some("g"));
        let l_second = derive_row_spans(&records, Some("g"));
        assert_eq!(l_first, l_second);

        let l_span_records = derive_row_span_records(&l_first);
        assert_eq!(
            l_span_records,
            vec![
                SpecRowSpan {
                    row_idx: 0,
                    n_rows_extra: 1
                },
                SpecRowSpan {
                    row_idx: 2,
                    n_rows_extra: 2
                },
            ]
        );
        let n_rows_covered: usize = l_span_records.iter().map(|s| 1 + s.n_rows_extra).sum();
        assert_eq!(n_rows_covered, 5);
        assert!(
            l_span_records
                .iter()
                .all(|s| !(s.row_idx..=s.row_idx + s.n_rows_extra).contains(&5))
        );
    }

    #[test]
    fn test_numbers_group_by_value() {
        let records: Vec<TypeRecord> = [1.0, 1.0, 2.0]
            .iter()
            .map(|n| TypeRecord::from([("g".to_string(), EnumCellValue::Number(*n))]))
            .collect();
        assert_eq!(
            derive_row_spans(&records, Some("g")),
            vec![
                EnumRowSpan::SpanStart(2),
                EnumRowSpan::SpanContinuation,
                EnumRowSpan::SpanStart(1)
            ]
        );
    }

    #[test]
    fn test_convert_records_to_rows_blanks_missing_fields() {
        let columns = [
            SpecColumn::leaf("a", "a", "A"),
            SpecColumn::leaf("b", "b", "B"),
            SpecColumn {
                id: "c".to_string(),
                title: "C".to_string(),
                ..Default::default()
            },
        ];
        let leaf_columns: Vec<&SpecColumn> = columns.iter().collect();
        let records = vec![TypeRecord::from([
            ("a".to_string(), EnumCellValue::from("1")),
            ("z".to_string(), EnumCellValue::from("ignored")),
        ])];
        let records_before = records.clone();

        let l_rows = convert_records_to_rows(&records, &leaf_columns, &[EnumRowSpan::SpanStart(1)]);

        assert_eq!(records, records_before);
        assert_eq!(l_rows.len(), 1);
        assert_eq!(
            l_rows[0].cells,
            vec![
                EnumCellValue::from("1"),
                EnumCellValue::None,
                EnumCellValue::None
            ]
        );
        assert_eq!(l_rows[0].row_span, EnumRowSpan::SpanStart(1));
    }
}
