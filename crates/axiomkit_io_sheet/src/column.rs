//! Column tree flattening and config-driven attribute access.

use crate::conf::N_NUM_FORMAT_FRACTION_MAX;
use crate::spec::{EnumColumnAttr, SpecColumn, SpecSheetConfig};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnTree

/// Collect leaf columns depth-first, left to right.
pub fn flatten_columns(columns: &[SpecColumn]) -> Vec<&SpecColumn> {
    let mut l_leaves = Vec::new();
    for col in columns {
        if col.is_leaf() {
            l_leaves.push(col);
        } else {
            l_leaves.extend(flatten_columns(&col.children));
        }
    }
    l_leaves
}

/// Maximum number of branch levels below the roots (flat headers: `0`).
pub fn calculate_column_depth(columns: &[SpecColumn]) -> usize {
    columns
        .iter()
        .filter(|col| !col.is_leaf())
        .map(|col| 1 + calculate_column_depth(&col.children))
        .max()
        .unwrap_or(0)
}

/// Number of leaf columns covered by `column`.
pub fn calculate_column_span(column: &SpecColumn) -> usize {
    if column.is_leaf() {
        return 1;
    }
    column.children.iter().map(calculate_column_span).sum()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnAccessor

type TypeAttrExtractor<T> = Box<dyn Fn(&SpecColumn) -> Option<T> + Send + Sync>;

/// Extractors for the four caller-named column attributes.
///
/// Built once per request from [`SpecSheetConfig`] so that no stage reads
/// attribute names directly.
pub struct SpecColumnAccessor {
    /// Horizontal alignment.
    pub align: TypeAttrExtractor<String>,
    /// Mergeable flag.
    pub merge: TypeAttrExtractor<bool>,
    /// Currency fraction digits, capped at the Excel limit.
    pub fraction: TypeAttrExtractor<usize>,
    /// Column width in config units.
    pub width: TypeAttrExtractor<f64>,
}

impl SpecColumnAccessor {
    /// Bind extractors to the attribute keys named by `config`.
    pub fn from_config(config: &SpecSheetConfig) -> Self {
        let key_align = config.key_align.clone();
        let key_merge = config.key_merge.clone();
        let key_fraction = config.key_fraction.clone();
        let key_width = config.key_width.clone();

        Self {
            align: Box::new(move |col| match col.attrs.get(&key_align)? {
                EnumColumnAttr::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            }),
            merge: Box::new(move |col| match col.attrs.get(&key_merge)? {
                EnumColumnAttr::Boolean(b) => Some(*b),
                EnumColumnAttr::Number(n) => Some(*n != 0.0),
                EnumColumnAttr::String(s) => Some(s.eq_ignore_ascii_case("true")),
            }),
            fraction: Box::new(move |col| match col.attrs.get(&key_fraction)? {
                EnumColumnAttr::Number(n) if n.is_finite() && *n >= 0.0 => {
                    Some((*n as usize).min(N_NUM_FORMAT_FRACTION_MAX))
                }
                EnumColumnAttr::String(s) => s
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .map(|n| n.min(N_NUM_FORMAT_FRACTION_MAX)),
                _ => None,
            }),
            width: Box::new(move |col| match col.attrs.get(&key_width)? {
                EnumColumnAttr::Number(n) if n.is_finite() => Some(*n),
                EnumColumnAttr::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
                _ => None,
            }),
        }
    }

    /// Configured alignment of `column`.
    pub fn derive_align(&self, column: &SpecColumn) -> Option<String> {
        (self.align)(column)
    }

    /// `true` when `column` is flagged mergeable.
    pub fn if_merge(&self, column: &SpecColumn) -> bool {
        (self.merge)(column).unwrap_or(false)
    }

    /// Configured fraction digits of `column`.
    pub fn derive_fraction(&self, column: &SpecColumn) -> Option<usize> {
        (self.fraction)(column)
    }

    /// Configured width of `column`.
    pub fn derive_width(&self, column: &SpecColumn) -> Option<f64> {
        (self.width)(column)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn derive_columns_two_level() -> Vec<SpecColumn> {
        vec![
            SpecColumn::branch(
                "a",
                "A",
                vec![
                    SpecColumn::leaf("a1", "a1", "A1"),
                    SpecColumn::leaf("a2", "a2", "A2"),
                ],
            ),
            SpecColumn::leaf("b", "b", "B"),
        ]
    }

    #[test]
    fn test_flatten_columns_keeps_leaf_order() {
        let columns = vec![
            SpecColumn::leaf("x", "x", "X"),
            SpecColumn::branch(
                "g",
                "G",
                vec![
                    SpecColumn::branch("h", "H", vec![SpecColumn::leaf("h1", "h1", "H1")]),
                    SpecColumn::leaf("g1", "g1", "G1"),
                ],
            ),
            SpecColumn::leaf("y", "y", "Y"),
        ];

        let l_ids: Vec<&str> = flatten_columns(&columns)
            .iter()
            .map(|col| col.id.as_str())
            .collect();
        assert_eq!(l_ids, vec!["x", "h1", "g1", "y"]);
        assert_eq!(calculate_column_depth(&columns), 2);
        assert_eq!(calculate_column_span(&columns[1]), 2);
    }

    #[test]
    fn test_depth_of_flat_and_two_level_trees() {
        let flat = vec![SpecColumn::leaf("a", "a", "A"), SpecColumn::leaf("b", "b", "B")];
        assert_eq!(calculate_column_depth(&flat), 0);
        assert_eq!(calculate_column_depth(&derive_columns_two_level()), 1);
        assert_eq!(calculate_column_depth(&[]), 0);
    }

    #[test]
    fn test_children_win_over_field() {
        let mut col = SpecColumn::branch("a", "A", vec![SpecColumn::leaf("a1", "a1", "A1")]);
        col.field = Some("a".to_string());
        let columns = vec![col];

        let l_leaves = flatten_columns(&columns);
        assert_eq!(l_leaves.len(), 1);
        assert_eq!(l_leaves[0].id, "a1");
    }

    #[test]
    fn test_accessor_reads_caller_named_keys() {
        let config = SpecSheetConfig {
            key_align: "align_x".to_string(),
            key_merge: "merge_x".to_string(),
            key_fraction: "frac_x".to_string(),
            key_width: "width_x".to_string(),
            ..SpecSheetConfig::default()
        };
        let accessor = SpecColumnAccessor::from_config(&config);

        let col = SpecColumn::leaf("a", "a", "A")
            .with_attr("align_x", EnumColumnAttr::String("left".to_string()))
            .with_attr("merge_x", EnumColumnAttr::Boolean(true))
            .with_attr("frac_x", EnumColumnAttr::Number(3.0))
            .with_attr("width_x", EnumColumnAttr::Number(20.0))
            .with_attr("excelAlign", EnumColumnAttr::String("right".to_string()));

        assert_eq!(accessor.derive_align(&col).as_deref(), Some("left"));
        assert!(accessor.if_merge(&col));
        assert_eq!(accessor.derive_fraction(&col), Some(3));
        assert_eq!(accessor.derive_width(&col), Some(20.0));

        let col_wide = SpecColumn::leaf("w", "w", "W")
            .with_attr("frac_x", EnumColumnAttr::Number(1e300));
        assert_eq!(accessor.derive_fraction(&col_wide), Some(30));
        let col_wide = SpecColumn::leaf("w", "w", "W")
            .with_attr("frac_x", EnumColumnAttr::String("99".to_string()));
        assert_eq!(accessor.derive_fraction(&col_wide), Some(30));

        let col_bare = SpecColumn::leaf("b", "b", "B");
        assert_eq!(accessor.derive_align(&col_bare), None);
        assert!(!accessor.if_merge(&col_bare));
        assert_eq!(accessor.derive_fraction(&col_bare), None);
        assert_eq!(accessor.derive_width(&col_bare), None);
    }
}
