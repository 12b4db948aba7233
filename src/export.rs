use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use parquet::basic::{ConvertedType, LogicalType, Repetition, TimeUnit, Type as PhysicalType};
use parquet::data_type::{BoolType, ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;
use tracing::info;

use crate::errors::ExportError;
use crate::flatten::{Cell, Dataset};

/// Physical layout chosen for one column from the cells it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Bool,
    Int,
    Float,
    Timestamp,
    Text,
}

/// Narrowest kind that holds every non-null cell. All-null columns are text.
pub fn infer_kind<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for cell in cells {
        let cell_kind = match cell {
            Cell::Null => continue,
            Cell::Bool(_) => ColumnKind::Bool,
            Cell::Int(_) => ColumnKind::Int,
            Cell::Float(_) => ColumnKind::Float,
            Cell::Timestamp(_) => ColumnKind::Timestamp,
            Cell::Text(_) | Cell::List(_) => ColumnKind::Text,
        };
        kind = Some(match (kind, cell_kind) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int), ColumnKind::Float) | (Some(ColumnKind::Float), ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => ColumnKind::Text,
        });
        if kind == Some(ColumnKind::Text) {
            break;
        }
    }
    kind.unwrap_or(ColumnKind::Text)
}

/// Logical type of timestamp columns: milliseconds, local wall-clock time.
pub fn local_timestamp_type() -> LogicalType {
    LogicalType::Timestamp {
        is_adjusted_to_u_t_c: false,
        unit: TimeUnit::MILLIS(Default::default()),
    }
}

fn field_type(name: &str, kind: ColumnKind) -> Result<Type, ExportError> {
    let builder = Type::primitive_type_builder(name, physical_type(kind))
        .with_repetition(Repetition::OPTIONAL);
    let builder = match kind {
        // Cells hold naive local times; the legacy converted type is derived by the builder.
        ColumnKind::Timestamp => builder.with_logical_type(Some(local_timestamp_type())),
        ColumnKind::Text => builder.with_converted_type(ConvertedType::UTF8),
        ColumnKind::Bool | ColumnKind::Int | ColumnKind::Float => builder,
    };
    Ok(builder.build()?)
}

fn physical_type(kind: ColumnKind) -> PhysicalType {
    match kind {
        ColumnKind::Bool => PhysicalType::BOOLEAN,
        ColumnKind::Int | ColumnKind::Timestamp => PhysicalType::INT64,
        ColumnKind::Float => PhysicalType::DOUBLE,
        ColumnKind::Text => PhysicalType::BYTE_ARRAY,
    }
}

fn text_value(cell: &Cell) -> Result<String, ExportError> {
    Ok(match cell {
        Cell::Text(s) => s.clone(),
        Cell::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S").to_string(),
        other => serde_json::to_string(&other.to_json())?,
    })
}

/// Definition levels (1 present, 0 null) plus the present values.
fn split_nulls<'a, T>(
    cells: &[&'a Cell],
    mut value: impl FnMut(&'a Cell) -> Result<Option<T>, ExportError>,
) -> Result<(Vec<T>, Vec<i16>), ExportError> {
    let mut values = Vec::with_capacity(cells.len());
    let mut levels = Vec::with_capacity(cells.len());
    for &cell in cells {
        match value(cell)? {
            Some(v) => {
                values.push(v);
                levels.push(1);
            }
            None => levels.push(0),
        }
    }
    Ok((values, levels))
}

/// Write `data` to `path` as a single-row-group Parquet file.
pub fn write_parquet(data: &Dataset, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let columns: Vec<&str> = data.columns().collect();
    if columns.is_empty() {
        return Err(ExportError::Empty);
    }

    let kinds: Vec<ColumnKind> = columns
        .iter()
        .map(|name| infer_kind(data.column(name)))
        .collect();
    let fields = columns
        .iter()
        .zip(&kinds)
        .map(|(name, kind)| field_type(name, *kind).map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;
    let schema = Arc::new(
        Type::group_type_builder("schema")
            .with_fields(fields)
            .build()?,
    );

    let file = File::create(path)?;
    let props = Arc::new(WriterProperties::builder().build());
    let mut writer = SerializedFileWriter::new(file, schema, props)?;
    let mut row_group = writer.next_row_group()?;

    for (name, kind) in columns.iter().zip(&kinds) {
        let Some(mut column) = row_group.next_column()? else {
            break;
        };
        let cells = data.column(name);
        match kind {
            ColumnKind::Bool => {
                let (values, levels) = split_nulls(&cells, |c| {
                    Ok(match c {
                        Cell::Bool(b) => Some(*b),
                        _ => None,
                    })
                })?;
                column
                    .typed::<BoolType>()
                    .write_batch(&values, Some(levels.as_slice()), None)?;
            }
            ColumnKind::Int => {
                let (values, levels) = split_nulls(&cells, |c| Ok(c.as_i64()))?;
                column
                    .typed::<Int64Type>()
                    .write_batch(&values, Some(levels.as_slice()), None)?;
            }
            ColumnKind::Float => {
                let (values, levels) = split_nulls(&cells, |c| {
                    Ok(match c {
                        Cell::Float(f) => Some(*f),
                        Cell::Int(i) => Some(*i as f64),
                        _ => None,
                    })
                })?;
                column
                    .typed::<DoubleType>()
                    .write_batch(&values, Some(levels.as_slice()), None)?;
            }
            ColumnKind::Timestamp => {
                let (values, levels) = split_nulls(&cells, |c| {
                    Ok(c.as_timestamp()
                        .map(|ts| ts.and_utc().timestamp_millis()))
                })?;
                column
                    .typed::<Int64Type>()
                    .write_batch(&values, Some(levels.as_slice()), None)?;
            }
            ColumnKind::Text => {
                let (values, levels) = split_nulls(&cells, |c| {
                    if c.is_null() {
                        return Ok(None);
                    }
                    Ok(Some(ByteArray::from(text_value(c)?.into_bytes())))
                })?;
                column
                    .typed::<ByteArrayType>()
                    .write_batch(&values, Some(levels.as_slice()), None)?;
            }
        }
        column.close()?;
    }

    row_group.close()?;
    writer.close()?;
    info!(path = %path.display(), rows = data.len(), columns = columns.len(), "dataset exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn kinds_widen_to_text_on_conflict() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(infer_kind([&Cell::Int(1), &Cell::Null]), ColumnKind::Int);
        assert_eq!(infer_kind([&Cell::Int(1), &Cell::Float(0.5)]), ColumnKind::Float);
        assert_eq!(infer_kind([&Cell::Timestamp(ts)]), ColumnKind::Timestamp);
        assert_eq!(infer_kind([&Cell::Bool(true), &Cell::Int(1)]), ColumnKind::Text);
        assert_eq!(infer_kind([&Cell::Null]), ColumnKind::Text);
        assert_eq!(infer_kind([&Cell::List(vec![])]), ColumnKind::Text);
    }

    #[test]
    fn timestamp_columns_are_not_utc_adjusted() {
        let field = field_type("timestamp", ColumnKind::Timestamp).unwrap();
        assert_eq!(field.get_basic_info().logical_type(), Some(local_timestamp_type()));
        assert_eq!(field.get_physical_type(), PhysicalType::INT64);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let err = write_parquet(&Dataset::new(), temp.path().join("x.parquet")).unwrap_err();
        assert!(matches!(err, ExportError::Empty));
    }

    #[test]
    fn text_cells_encode_lists_as_json() {
        let cell = Cell::List(vec![serde_json::json!("a"), serde_json::json!(1)]);
        assert_eq!(text_value(&cell).unwrap(), r#"["a",1]"#);
        assert_eq!(text_value(&Cell::Bool(true)).unwrap(), "true");
    }
}
