use crate::error::{Error, Result};
use crate::metadata::BlockMetadata;
use crate::row::{json_kind_name, MappingRow, RowKind, SequenceRow, Value};
use crate::schema::Schema;
use bytes::BufMut;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Caller-supplied block contents. The variant states the orientation, so
/// normalization never has to guess it from the data.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockData {
    /// Rows keyed by column name, projected in schema order.
    MappingRows(Vec<MappingRow>),
    /// Rows of positional values in schema order.
    SequenceRows(Vec<SequenceRow>),
    /// Columns already aligned to the schema, e.g. decoded from server
    /// output. Skips normalization and type checking.
    PrebuiltColumns(Vec<Vec<Value>>),
}

/// A batch of rows stored column by column.
///
/// Every column holds the same number of values, and when the schema is not
/// empty there is exactly one column per schema entry. Row input is
/// transposed once, in the constructor; afterwards the block is read-only
/// apart from its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    schema: Schema,
    data: Vec<Vec<Value>>,
    types_check: bool,
    metadata: BlockMetadata,
}

impl Block {
    /// Build a block. Absent schema, data or metadata fall back to an empty
    /// schema, no rows and default metadata.
    pub fn new(
        schema: Option<Schema>,
        data: Option<BlockData>,
        metadata: Option<BlockMetadata>,
        types_check: bool,
    ) -> Result<Self> {
        let schema = schema.unwrap_or_default();
        let normalizer = RowNormalizer::new(&schema, types_check);

        let data = match data {
            None => normalizer.empty_columns(),
            Some(BlockData::MappingRows(rows)) => {
                let rows = normalizer.project_mapping_rows(&rows)?;
                normalizer.normalize(rows, RowKind::Mapping)?
            }
            Some(BlockData::SequenceRows(rows)) => normalizer.normalize(rows, RowKind::Sequence)?,
            Some(BlockData::PrebuiltColumns(columns)) => normalizer.check_columns(columns)?,
        };

        Ok(Self {
            schema,
            data,
            types_check,
            metadata: metadata.unwrap_or_default(),
        })
    }

    pub fn builder() -> BlockBuilder {
        BlockBuilder::default()
    }

    /// Build a block from trusted columnar data.
    pub fn from_columns(
        schema: Schema,
        columns: Vec<Vec<Value>>,
        metadata: BlockMetadata,
    ) -> Result<Self> {
        Self::new(
            Some(schema),
            Some(BlockData::PrebuiltColumns(columns)),
            Some(metadata),
            false,
        )
    }

    /// Build a block from dynamic JSON rows. The first row decides the
    /// orientation: an object selects keyed rows, an array positional rows.
    /// Scalars are converted using the schema column types.
    pub fn from_json_rows(
        schema: Option<Schema>,
        rows: &[JsonValue],
        metadata: Option<BlockMetadata>,
        types_check: bool,
    ) -> Result<Self> {
        let schema = schema.unwrap_or_default();
        let normalizer = RowNormalizer::new(&schema, types_check);

        let data = match rows.first() {
            None => normalizer.empty_columns(),
            Some(first) => {
                let kind = RowKind::of_json(first).ok_or_else(|| {
                    Error::Type(format!(
                        "Unsupported row type: {}. object or array is expected.",
                        json_kind_name(first)
                    ))
                })?;
                if types_check {
                    normalizer.check_json_row_kinds(rows, kind)?;
                }
                let converted = normalizer.convert_json_rows(rows, kind)?;
                normalizer.normalize(converted, kind)?
            }
        };

        Ok(Self {
            schema,
            data,
            types_check,
            metadata: metadata.unwrap_or_default(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn types_check(&self) -> bool {
        self.types_check
    }

    pub fn metadata(&self) -> &BlockMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut BlockMetadata {
        &mut self.metadata
    }

    /// Columnar storage, one `Vec` per column.
    pub fn columns(&self) -> &[Vec<Value>] {
        &self.data
    }

    /// Column by schema name.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.schema
            .field_index(name)
            .and_then(|idx| self.data.get(idx))
            .map(Vec::as_slice)
    }

    /// Materialize the row view. Storage is left untouched.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        let n_rows = self.row_count();
        let mut rows: Vec<Vec<Value>> = Vec::with_capacity(n_rows);
        for i in 0..n_rows {
            rows.push(self.data.iter().map(|column| column[i].clone()).collect());
        }
        rows
    }

    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.data.iter().map(|column| column[index].clone()).collect())
    }

    pub fn row_count(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    pub fn column_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Write the block metadata record ahead of the body.
    pub fn write_metadata<B: BufMut>(&self, buf: &mut B) {
        self.metadata.write(buf);
    }
}

/// Builder for [`Block`].
#[derive(Debug, Default)]
pub struct BlockBuilder {
    schema: Option<Schema>,
    data: Option<BlockData>,
    metadata: Option<BlockMetadata>,
    types_check: bool,
}

impl BlockBuilder {
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn data(mut self, data: BlockData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn mapping_rows(self, rows: Vec<MappingRow>) -> Self {
        self.data(BlockData::MappingRows(rows))
    }

    pub fn sequence_rows(self, rows: Vec<SequenceRow>) -> Self {
        self.data(BlockData::SequenceRows(rows))
    }

    pub fn prebuilt_columns(self, columns: Vec<Vec<Value>>) -> Self {
        self.data(BlockData::PrebuiltColumns(columns))
    }

    pub fn metadata(mut self, metadata: BlockMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn types_check(mut self, enabled: bool) -> Self {
        self.types_check = enabled;
        self
    }

    pub fn build(self) -> Result<Block> {
        Block::new(self.schema, self.data, self.metadata, self.types_check)
    }
}

/// Turns row input into validated columnar storage for one schema.
struct RowNormalizer<'a> {
    schema: &'a Schema,
    types_check: bool,
}

impl<'a> RowNormalizer<'a> {
    fn new(schema: &'a Schema, types_check: bool) -> Self {
        Self { schema, types_check }
    }

    /// Zero-row storage: one empty column per schema entry.
    fn empty_columns(&self) -> Vec<Vec<Value>> {
        vec![Vec::new(); self.schema.len()]
    }

    fn project_mapping_rows(&self, rows: &[MappingRow]) -> Result<Vec<Vec<Value>>> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                self.schema
                    .fields
                    .iter()
                    .map(|field| {
                        row.get(&field.name)
                            .cloned()
                            .ok_or_else(|| missing_column(i, &field.name))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }

    fn check_json_row_kinds(&self, rows: &[JsonValue], expected: RowKind) -> Result<()> {
        for (i, row) in rows.iter().enumerate() {
            if RowKind::of_json(row) != Some(expected) {
                return Err(Error::Type(format!(
                    "Row {}: unsupported row type {}. {} is expected.",
                    i,
                    json_kind_name(row),
                    expected
                )));
            }
        }
        Ok(())
    }

    fn convert_json_rows(&self, rows: &[JsonValue], kind: RowKind) -> Result<Vec<Vec<Value>>> {
        let fields = &self.schema.fields;
        rows.iter()
            .enumerate()
            .map(|(i, row)| match (kind, row) {
                (RowKind::Mapping, JsonValue::Object(map)) => fields
                    .iter()
                    .map(|field| {
                        map.get(&field.name)
                            .map(|v| Value::from_json_typed(v, &field.data_type))
                            .ok_or_else(|| missing_column(i, &field.name))
                    })
                    .collect::<Result<Vec<_>>>(),
                (RowKind::Sequence, JsonValue::Array(items)) => Ok(items
                    .iter()
                    .enumerate()
                    .map(|(j, item)| match fields.get(j) {
                        Some(field) => Value::from_json_typed(item, &field.data_type),
                        None => Value::from_json(item),
                    })
                    .collect::<Vec<_>>()),
                (kind, row) => Err(Error::Type(format!(
                    "Row {}: unsupported row type {}. {} is expected.",
                    i,
                    json_kind_name(row),
                    kind
                ))),
            })
            .collect()
    }

    /// Validate positional rows and transpose them.
    fn normalize(&self, rows: Vec<Vec<Value>>, kind: RowKind) -> Result<Vec<Vec<Value>>> {
        let Some(first) = rows.first() else {
            return Ok(self.empty_columns());
        };

        let width = if self.schema.is_empty() {
            first.len()
        } else {
            self.schema.len()
        };
        self.check_row_widths(&rows, width)?;
        if self.types_check {
            self.check_cell_types(&rows)?;
        }

        debug!(
            rows = rows.len(),
            columns = width,
            orientation = %kind,
            "transposing rows into columns"
        );
        Ok(transpose(rows, width))
    }

    fn check_row_widths(&self, rows: &[Vec<Value>], expected: usize) -> Result<()> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(Error::Shape(format!(
                    "Row {}: expected {} columns, got {}",
                    i,
                    expected,
                    row.len()
                )));
            }
        }
        Ok(())
    }

    fn check_cell_types(&self, rows: &[Vec<Value>]) -> Result<()> {
        if self.schema.is_empty() {
            return Ok(());
        }
        for (i, row) in rows.iter().enumerate() {
            for (value, field) in row.iter().zip(&self.schema.fields) {
                if !value.is_compatible_with(&field.data_type) {
                    return Err(Error::Type(format!(
                        "Row {}, column '{}': expected {}, got {}",
                        i,
                        field.name,
                        field.data_type,
                        value.data_type()
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_columns(&self, columns: Vec<Vec<Value>>) -> Result<Vec<Vec<Value>>> {
        if columns.is_empty() {
            return Ok(self.empty_columns());
        }
        if !self.schema.is_empty() && columns.len() != self.schema.len() {
            return Err(Error::Shape(format!(
                "Expected {} columns, got {}",
                self.schema.len(),
                columns.len()
            )));
        }
        let expected = columns[0].len();
        if let Some((j, column)) = columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.len() != expected)
        {
            return Err(Error::Shape(format!(
                "Column {}: expected {} rows, got {}",
                j,
                expected,
                column.len()
            )));
        }
        Ok(columns)
    }
}

fn missing_column(row: usize, name: &str) -> Error {
    Error::Key(format!("Row {}: missing column '{}'", row, name))
}

/// `columns[j][i] = rows[i][j]`. Every row must already be `width` long.
fn transpose(rows: Vec<Vec<Value>>, width: usize) -> Vec<Vec<Value>> {
    if width == 0 {
        return Vec::new();
    }
    let n_rows = rows.len();
    let mut columns: Vec<Vec<Value>> = (0..width).map(|_| Vec::with_capacity(n_rows)).collect();
    for row in rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }
    columns
}
