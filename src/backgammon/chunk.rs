//! Column layout and row writing shared by the `read_xg*` table functions.

use super::error::ErrorAccumulator;
use duckdb::core::{DataChunkHandle, Inserter, LogicalTypeHandle, LogicalTypeId};
use std::borrow::Cow;
use std::ffi::CString;

pub(crate) const ROWS_PER_CHUNK: usize = 2048;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum XgLogicalType {
    Varchar,
    Boolean,
    Integer,
    UInteger,
    BigInt,
    Float,
}

impl XgLogicalType {
    pub(crate) fn to_handle(self) -> LogicalTypeHandle {
        match self {
            Self::Varchar => LogicalTypeHandle::from(LogicalTypeId::Varchar),
            Self::Boolean => LogicalTypeHandle::from(LogicalTypeId::Boolean),
            Self::Integer => LogicalTypeHandle::from(LogicalTypeId::Integer),
            Self::UInteger => LogicalTypeHandle::from(LogicalTypeId::UInteger),
            Self::BigInt => LogicalTypeHandle::from(LogicalTypeId::Bigint),
            Self::Float => LogicalTypeHandle::from(LogicalTypeId::Float),
        }
    }
}

pub(crate) struct XgColumnDef {
    pub(crate) name: &'static str,
    pub(crate) logical_type: XgLogicalType,
}

pub(crate) fn sanitize_for_cstring<'a>(
    value: &'a str,
    field_name: &str,
    parse_error: &mut ErrorAccumulator,
) -> Cow<'a, str> {
    if value.contains('\0') {
        parse_error.push(&format!("Sanitized interior NUL in {}", field_name));
        Cow::Owned(value.replace('\0', " "))
    } else {
        Cow::Borrowed(value)
    }
}

fn sanitize_for_cstring_silent(value: &str) -> Cow<'_, str> {
    if value.contains('\0') {
        Cow::Owned(value.replace('\0', " "))
    } else {
        Cow::Borrowed(value)
    }
}

/// Row cursor over one output chunk. Column indices follow the caller's column array.
pub(crate) struct ChunkWriter<'a> {
    output: &'a mut DataChunkHandle,
    columns: &'static [XgColumnDef],
    row_count: usize,
}

impl<'a> ChunkWriter<'a> {
    pub(crate) fn new(output: &'a mut DataChunkHandle, columns: &'static [XgColumnDef]) -> Self {
        Self {
            output,
            columns,
            row_count: 0,
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.row_count >= ROWS_PER_CHUNK
    }

    /// Close the current row. Every column must have been written or nulled.
    pub(crate) fn finish_row(&mut self) {
        self.row_count += 1;
    }

    pub(crate) fn set_output_len(&mut self) {
        self.output.set_len(self.row_count);
    }

    pub(crate) fn write_null(&mut self, column: usize) {
        let row_idx = self.row_count;
        self.output.flat_vector(column).set_null(row_idx);
    }

    pub(crate) fn write_varchar(
        &mut self,
        column: usize,
        value: Option<&str>,
        parse_error: &mut ErrorAccumulator,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let row_idx = self.row_count;
        let name = self.columns[column].name;
        let mut vector = self.output.flat_vector(column);
        if let Some(value) = value {
            let sanitized = sanitize_for_cstring(value, name, parse_error);
            vector.insert(row_idx, CString::new(sanitized.as_ref())?);
        } else {
            vector.set_null(row_idx);
        }
        Ok(())
    }

    pub(crate) fn write_parse_error(
        &mut self,
        column: usize,
        mut parse_error: ErrorAccumulator,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let row_idx = self.row_count;
        let mut vector = self.output.flat_vector(column);
        match parse_error.take() {
            None => vector.set_null(row_idx),
            Some(message) => {
                let message = sanitize_for_cstring_silent(message.as_str());
                vector.insert(row_idx, CString::new(message.as_ref())?);
            }
        }
        Ok(())
    }

    pub(crate) fn write_bool(&mut self, column: usize, value: Option<bool>) {
        self.write_fixed(column, value);
    }

    pub(crate) fn write_i32(&mut self, column: usize, value: Option<i32>) {
        self.write_fixed(column, value);
    }

    pub(crate) fn write_u32(&mut self, column: usize, value: Option<u32>) {
        self.write_fixed(column, value);
    }

    pub(crate) fn write_i64(&mut self, column: usize, value: Option<i64>) {
        self.write_fixed(column, value);
    }

    pub(crate) fn write_f32(&mut self, column: usize, value: Option<f32>) {
        self.write_fixed(column, value);
    }

    fn write_fixed<T: Copy>(&mut self, column: usize, value: Option<T>) {
        let row_idx = self.row_count;
        let mut vector = self.output.flat_vector(column);
        match value {
            Some(value) => vector.as_mut_slice::<T>()[row_idx] = value,
            None => vector.set_null(row_idx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_per_chunk_constant_matches_vector_size() {
        assert_eq!(ROWS_PER_CHUNK, 2048);
    }

    #[test]
    fn test_sanitize_for_cstring_preserves_clean_values() {
        let mut parse_error = ErrorAccumulator::default();
        let sanitized = sanitize_for_cstring("Alice", "bottom_player", &mut parse_error);
        assert!(matches!(sanitized, Cow::Borrowed("Alice")));
        assert!(parse_error.is_empty());
    }

    #[test]
    fn test_sanitize_for_cstring_replaces_interior_nul_and_records_error() {
        let mut parse_error = ErrorAccumulator::default();
        let sanitized = sanitize_for_cstring("Al\0ice", "bottom_player", &mut parse_error);
        assert_eq!(sanitized.as_ref(), "Al ice");
        let message = parse_error.take().unwrap();
        assert_eq!(message, "Sanitized interior NUL in bottom_player");
    }

    #[test]
    fn test_sanitize_silent_does_not_record() {
        assert_eq!(sanitize_for_cstring_silent("a\0b").as_ref(), "a b");
    }
}
