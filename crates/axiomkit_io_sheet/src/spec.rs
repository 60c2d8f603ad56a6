//! Shared sheet export specification models.

use std::collections::BTreeMap;
use std::fmt;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell style: alignment, border, font and fill.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Raw or classified cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// `true` for blank values and empty strings.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Text form used for pattern matching and numeric parsing.
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// One input data record: field name to value. Absent fields are blank.
pub type TypeRecord = BTreeMap<String, EnumCellValue>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnSpecification

/// Data type hint of a leaf column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumColumnType {
    /// Thousands-grouped number.
    Currency,
    /// Date rendered as `yyyy-mm-dd`.
    Date,
    /// Passed through unchanged.
    #[default]
    General,
}

impl EnumColumnType {
    /// Parse a column type name; unknown names fall back to `General`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "currency" => Self::Currency,
            "date" => Self::Date,
            _ => Self::General,
        }
    }
}

/// Value of a dynamically-named column attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumColumnAttr {
    /// String attribute value.
    String(String),
    /// Numeric attribute value.
    Number(f64),
    /// Boolean attribute value.
    Boolean(bool),
}

/// Column tree node.
///
/// A node with non-empty `children` is a branch and its `field` is ignored;
/// any other node is a leaf mapped to `field`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecColumn {
    /// Identifier, unique within one request.
    pub id: String,
    /// Record field read by a leaf column.
    pub field: Option<String>,
    /// Header title; may contain the `<br/>` line-break marker.
    pub title: String,
    /// Ordered child columns.
    pub children: Vec<SpecColumn>,
    /// Data type hint.
    pub col_type: EnumColumnType,
    /// Caller-named attributes (alignment, merge flag, fraction digits, width).
    pub attrs: BTreeMap<String, EnumColumnAttr>,
}

impl SpecColumn {
    /// Build a leaf column.
    pub fn leaf(id: impl Into<String>, field: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field: Some(field.into()),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Build a branch column.
    pub fn branch(id: impl Into<String>, title: impl Into<String>, children: Vec<SpecColumn>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            children,
            ..Default::default()
        }
    }

    /// Set column type.
    pub fn with_type(mut self, col_type: EnumColumnType) -> Self {
        self.col_type = col_type;
        self
    }

    /// Set one dynamic attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: EnumColumnAttr) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// `true` when the column maps to a data field.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetConfig

/// Unit of column width values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumWidthUnit {
    /// Pixels (`wpx`).
    Pixels,
    /// Character count (`wch`).
    #[default]
    Characters,
}

impl EnumWidthUnit {
    /// Parse `wpx`/`pixels` and `wch`/`characters`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "wpx" | "px" | "pixels" => Some(Self::Pixels),
            "wch" | "chars" | "characters" => Some(Self::Characters),
            _ => None,
        }
    }
}

/// Per-request config: names of the column attributes and width policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetConfig {
    /// Attribute key holding horizontal alignment.
    pub key_align: String,
    /// Attribute key holding the mergeable flag.
    pub key_merge: String,
    /// Attribute key holding currency fraction digits.
    pub key_fraction: String,
    /// Attribute key holding column width.
    pub key_width: String,
    /// Unit of width values.
    pub unit_width: EnumWidthUnit,
    /// Multiplier applied to column-provided widths.
    pub width_multiplier: Option<f64>,
    /// Width used when a column provides none.
    pub width_default: Option<f64>,
}

impl Default for SpecSheetConfig {
    fn default() -> Self {
        Self {
            key_align: "excelAlign".to_string(),
            key_merge: "isMerge".to_string(),
            key_fraction: "excelFraction".to_string(),
            key_width: "excelWidth".to_string(),
            unit_width: EnumWidthUnit::Characters,
            width_multiplier: None,
            width_default: None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BodySpecification

/// Row grouping annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumRowSpan {
    /// Not part of any group (blank group value or no grouping).
    #[default]
    NoMerge,
    /// First row of a group spanning this many rows (`1` for a singleton).
    SpanStart(usize),
    /// Covered by the group started above.
    SpanContinuation,
}

/// Vertical span record for groups longer than one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecRowSpan {
    /// Body row index of the group start.
    pub row_idx: usize,
    /// Rows covered below the start row.
    pub n_rows_extra: usize,
}

/// One body row: raw cells in leaf-column order plus its span annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecBodyRow {
    /// Raw cell values.
    pub cells: Vec<EnumCellValue>,
    /// Span annotation travelling with the row.
    pub row_span: EnumRowSpan,
}

/// Classified and styled output cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetCell {
    /// Stored value.
    pub value: EnumCellValue,
    /// Display pattern for numeric/date values.
    pub num_format: Option<String>,
    /// Cell style.
    pub style: SpecCellFormat,
}

impl SpecSheetCell {
    /// Blank cell with `style`.
    pub fn blank(style: &SpecCellFormat) -> Self {
        Self {
            value: EnumCellValue::None,
            num_format: None,
            style: style.clone(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetModelSpecification

/// Merge region, zero-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecMergeRange {
    /// First row.
    pub row_start: usize,
    /// First column.
    pub col_start: usize,
    /// Last row.
    pub row_end: usize,
    /// Last column.
    pub col_end: usize,
}

impl SpecMergeRange {
    /// `true` when the region covers exactly one cell.
    pub fn is_single_cell(&self) -> bool {
        self.row_start == self.row_end && self.col_start == self.col_end
    }
}

/// Width hint for one output column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecColumnWidth {
    /// Width value in `unit`.
    pub width: f64,
    /// Width unit.
    pub unit: EnumWidthUnit,
    /// Column must not render.
    pub if_hidden: bool,
}

/// Assembled sheet: grid, merges and column widths.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetModel {
    /// Header rows followed by body rows.
    pub grid: Vec<Vec<SpecSheetCell>>,
    /// Header and body merge regions.
    pub merges: Vec<SpecMergeRange>,
    /// One entry per grid column.
    pub column_widths: Vec<SpecColumnWidth>,
    /// Number of header rows (`depth + 1`).
    pub n_rows_header: usize,
    /// Index of the hidden bookkeeping column when grouping was requested.
    pub col_idx_row_span: Option<usize>,
}

impl SpecSheetModel {
    /// Grid row count.
    pub fn height(&self) -> usize {
        self.grid.len()
    }

    /// Grid column count.
    pub fn width(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    /// Borrow one cell.
    pub fn cell(&self, row_idx: usize, col_idx: usize) -> Option<&SpecSheetCell> {
        self.grid.get(row_idx).and_then(|row| row.get(col_idx))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Replacement strings for non-finite numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxValuePolicy {
    /// Replacement text for NaN.
    pub nan_str: String,
    /// Replacement text for positive infinity.
    pub posinf_str: String,
    /// Replacement text for negative infinity.
    pub neginf_str: String,
}

impl Default for SpecXlsxValuePolicy {
    fn default() -> Self {
        Self {
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

/// Writer options controlling serialization of a sheet model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxWriteOptions {
    /// Value conversion policy.
    pub value_policy: SpecXlsxValuePolicy,
    /// Freeze panes below the header rows.
    pub if_freeze_header: bool,
    /// Hide the row-span bookkeeping column.
    pub if_hide_row_span_column: bool,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            value_policy: SpecXlsxValuePolicy::default(),
            if_freeze_header: true,
            if_hide_row_span_column: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportMessages

/// One export request: a full snapshot of data, schema and config.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetExportRequest {
    /// Ordered data records.
    pub records: Vec<TypeRecord>,
    /// Column tree roots.
    pub columns: Vec<SpecColumn>,
    /// Attribute keys and width policy.
    pub config: SpecSheetConfig,
    /// Field whose consecutive equal values are merged vertically.
    pub group_field: Option<String>,
    /// Output sheet name.
    pub sheet_name: String,
}

/// Reply to one export request.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumSheetExportReply {
    /// No records; nothing was produced.
    Empty,
    /// Serialized XLSX workbook.
    Artifact(Vec<u8>),
    /// Conversion or serialization failed.
    Failed(String),
}

/// Top-level export errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetExportError {
    /// The request carries no records.
    EmptyRecords,
    /// Invalid sheet config or write options.
    InvalidConfig(String),
    /// Records could not be read from the given source.
    InvalidRecords(String),
    /// Workbook serialization failed.
    Write(String),
    /// Background worker could not be started or has gone away.
    WorkerUnavailable(String),
}

impl fmt::Display for SheetExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRecords => write!(f, "No records to export."),
            Self::InvalidConfig(msg) => write!(f, "Invalid sheet config: {msg}"),
            Self::InvalidRecords(msg) => write!(f, "Invalid records: {msg}"),
            Self::Write(msg) => write!(f, "xlsx write error: {msg}"),
            Self::WorkerUnavailable(msg) => write!(f, "Export worker unavailable: {msg}"),
        }
    }
}

impl std::error::Error for SheetExportError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////
