use std::collections::BTreeMap;
use std::path::PathBuf;

use axiomkit_io_sheet::conf::{C_SHEET_NAME_DEFAULT, derive_default_xlsx_write_options};
use axiomkit_io_sheet::record::derive_records_from_ipc_bytes;
use axiomkit_io_sheet::spec::{
    EnumCellValue, EnumColumnAttr, EnumColumnType, EnumWidthUnit, SheetExportError, SpecColumn,
    SpecSheetConfig, SpecSheetExportRequest, SpecXlsxWriteOptions, TypeRecord,
};
use axiomkit_io_sheet::worker::{export_sheet_to_buffer, export_sheet_to_file};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyAny, PyBool, PyBytes, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "axiomkit.sheet.export.v1";
const C_BRIDGE_TRANSPORT: &str = "records_or_ipc";

const TUP_COLUMN_KEYS_RESERVED: [&str; 5] = ["id", "field", "title", "children", "type"];

#[pyfunction]
#[pyo3(signature = (
    file_out,
    records,
    columns,
    config = None,
    group_field = None,
    sheet_name = C_SHEET_NAME_DEFAULT.to_string(),
    write_options = None
))]
#[allow(clippy::too_many_arguments)]
fn write_sheet(
    py: Python<'_>,
    file_out: String,
    records: &Bound<'_, PyAny>,
    columns: &Bound<'_, PyAny>,
    config: Option<&Bound<'_, PyAny>>,
    group_field: Option<String>,
    sheet_name: String,
    write_options: Option<&Bound<'_, PyAny>>,
) -> PyResult<()> {
    let request = derive_export_request(py, records, columns, config, group_field, sheet_name)?;
    let cfg_write_options = parse_spec_xlsx_write_options(write_options)?
        .unwrap_or_else(derive_default_xlsx_write_options);
    let path_file_out = PathBuf::from(&file_out);

    py.allow_threads(|| export_sheet_to_file(&request, &path_file_out, &cfg_write_options))
        .map_err(convert_export_error)
}

#[pyfunction]
#[pyo3(signature = (
    records,
    columns,
    config = None,
    group_field = None,
    sheet_name = C_SHEET_NAME_DEFAULT.to_string(),
    write_options = None
))]
fn export_sheet_bytes<'py>(
    py: Python<'py>,
    records: &Bound<'py, PyAny>,
    columns: &Bound<'py, PyAny>,
    config: Option<&Bound<'py, PyAny>>,
    group_field: Option<String>,
    sheet_name: String,
    write_options: Option<&Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyBytes>> {
    let request = derive_export_request(py, records, columns, config, group_field, sheet_name)?;
    let cfg_write_options = parse_spec_xlsx_write_options(write_options)?
        .unwrap_or_else(derive_default_xlsx_write_options);

    let v_bytes = py
        .allow_threads(|| export_sheet_to_buffer(&request, &cfg_write_options))
        .map_err(convert_export_error)?;
    Ok(PyBytes::new(py, &v_bytes))
}

fn derive_export_request(
    py: Python<'_>,
    records: &Bound<'_, PyAny>,
    columns: &Bound<'_, PyAny>,
    config: Option<&Bound<'_, PyAny>>,
    group_field: Option<String>,
    sheet_name: String,
) -> PyResult<SpecSheetExportRequest> {
    let request = SpecSheetExportRequest {
        records: parse_records(py, records)?,
        columns: parse_columns(columns)?,
        config: parse_spec_sheet_config(config)?.unwrap_or_default(),
        group_field,
        sheet_name,
    };
    log::debug!(
        "Parsed export request: records={} root_columns={} group_field={:?}",
        request.records.len(),
        request.columns.len(),
        request.group_field
    );
    Ok(request)
}

fn convert_export_error(err: SheetExportError) -> PyErr {
    match err {
        SheetExportError::EmptyRecords
        | SheetExportError::InvalidConfig(_)
        | SheetExportError::InvalidRecords(_) => PyValueError::new_err(err.to_string()),
        SheetExportError::Write(_) | SheetExportError::WorkerUnavailable(_) => {
            PyRuntimeError::new_err(err.to_string())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region Records

fn parse_records(py: Python<'_>, records: &Bound<'_, PyAny>) -> PyResult<Vec<TypeRecord>> {
    if records.is_instance_of::<PyList>() || records.is_instance_of::<PyTuple>() {
        let mut l_records = Vec::new();
        for (n_idx, item) in records.try_iter()?.enumerate() {
            let item = item?;
            let dict_item = item.downcast::<PyDict>().map_err(|_| {
                PyValueError::new_err(format!("records[{n_idx}] must be a dict."))
            })?;
            l_records.push(parse_record(dict_item)?);
        }
        return Ok(l_records);
    }

    let df_polars = convert_to_polars_dataframe(py, records)?;
    let obj_buffer = df_polars.call_method1("write_ipc", (py.None(),))?;
    let v_ipc_df = obj_buffer.call_method0("getvalue")?.extract::<Vec<u8>>()?;
    derive_records_from_ipc_bytes(&v_ipc_df)
        .map_err(|err| convert_export_error(SheetExportError::InvalidRecords(err)))
}

fn parse_record(dict_item: &Bound<'_, PyDict>) -> PyResult<TypeRecord> {
    let mut record = TypeRecord::new();
    for (key, value) in dict_item.iter() {
        let c_key = key.str()?.to_string();
        match parse_cell_value(&value)? {
            EnumCellValue::None => {}
            value => {
                record.insert(c_key, value);
            }
        }
    }
    Ok(record)
}

fn parse_cell_value(value: &Bound<'_, PyAny>) -> PyResult<EnumCellValue> {
    if value.is_none() {
        return Ok(EnumCellValue::None);
    }
    if let Ok(val) = value.downcast::<PyBool>() {
        let c_value = if val.is_true() { "True" } else { "False" };
        return Ok(EnumCellValue::from(c_value));
    }
    if value.is_instance_of::<PyInt>() || value.is_instance_of::<PyFloat>() {
        return Ok(EnumCellValue::Number(value.extract::<f64>()?));
    }
    if let Ok(val) = value.downcast::<PyString>() {
        return Ok(EnumCellValue::String(val.to_str()?.to_string()));
    }
    Ok(EnumCellValue::String(value.str()?.to_string()))
}

fn convert_to_polars_dataframe<'py>(
    py: Python<'py>,
    df: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyAny>> {
    let module_polars = py.import("polars")?;
    let cls_dataframe = module_polars.getattr("DataFrame")?;

    if df.is_instance(&cls_dataframe)? {
        return Ok(df.clone());
    }

    cls_dataframe.call1((df,))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Columns

fn parse_columns(columns: &Bound<'_, PyAny>) -> PyResult<Vec<SpecColumn>> {
    let mut l_columns = Vec::new();
    for item in columns.try_iter()? {
        l_columns.push(parse_column(&item?)?);
    }
    Ok(l_columns)
}

fn parse_column(obj: &Bound<'_, PyAny>) -> PyResult<SpecColumn> {
    let dict_column = obj
        .downcast::<PyDict>()
        .map_err(|_| PyValueError::new_err("Each column must be a dict."))?;

    let field = extract_optional_item::<String>(dict_column, "field")?;
    let id = match extract_optional_item::<String>(dict_column, "id")? {
        Some(id) => id,
        None => field.clone().unwrap_or_default(),
    };
    let title = extract_optional_item::<String>(dict_column, "title")?.unwrap_or_default();
    let children = match dict_column.get_item("children")? {
        Some(obj_children) if !obj_children.is_none() => parse_columns(&obj_children)?,
        _ => Vec::new(),
    };
    let col_type = extract_optional_item::<String>(dict_column, "type")?
        .map(|c_type| EnumColumnType::from_name(&c_type))
        .unwrap_or_default();

    let mut attrs = BTreeMap::new();
    for (key, value) in dict_column.iter() {
        let c_key = key.str()?.to_string();
        if TUP_COLUMN_KEYS_RESERVED.contains(&c_key.as_str()) {
            continue;
        }
        if let Some(attr) = parse_column_attr(&value)? {
            attrs.insert(c_key, attr);
        }
    }

    Ok(SpecColumn {
        id,
        field,
        title,
        children,
        col_type,
        attrs,
    })
}

fn parse_column_attr(value: &Bound<'_, PyAny>) -> PyResult<Option<EnumColumnAttr>> {
    if let Ok(val) = value.downcast::<PyBool>() {
        return Ok(Some(EnumColumnAttr::Boolean(val.is_true())));
    }
    if value.is_instance_of::<PyInt>() || value.is_instance_of::<PyFloat>() {
        return Ok(Some(EnumColumnAttr::Number(value.extract::<f64>()?)));
    }
    if let Ok(val) = value.downcast::<PyString>() {
        return Ok(Some(EnumColumnAttr::String(val.to_str()?.to_string())));
    }
    Ok(None)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

fn parse_spec_sheet_config(obj: Option<&Bound<'_, PyAny>>) -> PyResult<Option<SpecSheetConfig>> {
    let Some(obj) = obj else {
        return Ok(None);
    };
    if obj.is_none() {
        return Ok(None);
    }

    let mut cfg_sheet = SpecSheetConfig::default();

    if let Some(v) = extract_optional_attr::<String>(obj, "key_align")? {
        cfg_sheet.key_align = v;
    }
    if let Some(v) = extract_optional_attr::<String>(obj, "key_merge")? {
        cfg_sheet.key_merge = v;
    }
    if let Some(v) = extract_optional_attr::<String>(obj, "key_fraction")? {
        cfg_sheet.key_fraction = v;
    }
    if let Some(v) = extract_optional_attr::<String>(obj, "key_width")? {
        cfg_sheet.key_width = v;
    }
    if let Some(v) = extract_optional_attr::<String>(obj, "unit_width")? {
        cfg_sheet.unit_width = EnumWidthUnit::from_name(&v).ok_or_else(|| {
            PyValueError::new_err("config.unit_width must be one of: 'wpx', 'wch'.")
        })?;
    }
    cfg_sheet.width_multiplier = extract_optional_attr::<f64>(obj, "width_multiplier")?;
    cfg_sheet.width_default = extract_optional_attr::<f64>(obj, "width_default")?;

    Ok(Some(cfg_sheet))
}

fn parse_spec_xlsx_write_options(
    obj: Option<&Bound<'_, PyAny>>,
) -> PyResult<Option<SpecXlsxWriteOptions>> {
    let Some(obj) = obj else {
        return Ok(None);
    };
    if obj.is_none() {
        return Ok(None);
    }

    let mut cfg_write_options = derive_default_xlsx_write_options();

    if let Some(value_policy_obj) = extract_optional_attr_bound(obj, "value_policy")? {
        if let Some(v) = extract_optional_attr::<String>(&value_policy_obj, "nan_str")? {
            cfg_write_options.value_policy.nan_str = v;
        }
        if let Some(v) = extract_optional_attr::<String>(&value_policy_obj, "posinf_str")? {
            cfg_write_options.value_policy.posinf_str = v;
        }
        if let Some(v) = extract_optional_attr::<String>(&value_policy_obj, "neginf_str")? {
            cfg_write_options.value_policy.neginf_str = v;
        }
    }
    if let Some(v) = extract_optional_attr::<bool>(obj, "if_freeze_header")? {
        cfg_write_options.if_freeze_header = v;
    }
    if let Some(v) = extract_optional_attr::<bool>(obj, "if_hide_row_span_column")? {
        cfg_write_options.if_hide_row_span_column = v;
    }

    Ok(Some(cfg_write_options))
}

fn extract_optional_attr<T>(obj: &Bound<'_, PyAny>, attr: &str) -> PyResult<Option<T>>
where
    for<'a> T: FromPyObject<'a>,
{
    if !obj.hasattr(attr)? {
        return Ok(None);
    }
    let val = obj.getattr(attr)?;
    if val.is_none() {
        return Ok(None);
    }
    Ok(Some(val.extract::<T>()?))
}

fn extract_optional_attr_bound<'py>(
    obj: &Bound<'py, PyAny>,
    attr: &str,
) -> PyResult<Option<Bound<'py, PyAny>>> {
    if !obj.hasattr(attr)? {
        return Ok(None);
    }
    let val = obj.getattr(attr)?;
    if val.is_none() {
        return Ok(None);
    }
    Ok(Some(val))
}

fn extract_optional_item<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<Option<T>>
where
    for<'a> T: FromPyObject<'a>,
{
    match dict.get_item(key)? {
        Some(val) if !val.is_none() => Ok(Some(val.extract::<T>()?)),
        _ => Ok(None),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[pymodule]
fn _axiomkit_io_sheet_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(write_sheet, module)?)?;
    module.add_function(wrap_pyfunction!(export_sheet_bytes, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
