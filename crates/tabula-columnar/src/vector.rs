use std::sync::Arc;

use crate::bitmap::Bitmap;
use crate::types::LogicalType;

/// The engine's fixed batch capacity. Scans hand over at most this many rows
/// per chunk.
pub const STANDARD_VECTOR_SIZE: usize = 2048;

/// A single materialized cell value, used for point lookups and assertions.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    BigInt(i64),
    Double(f64),
    Date(i32),
    Time(i64),
    Timestamp(i64),
    TimestampSeconds(i64),
    Varchar(Arc<str>),
}

#[derive(Clone, Debug)]
enum VectorData {
    Boolean(Vec<bool>),
    BigInt(Vec<i64>),
    Double(Vec<f64>),
    Date(Vec<i32>),
    Time(Vec<i64>),
    Timestamp(Vec<i64>),
    TimestampSeconds(Vec<i64>),
    Varchar(Vec<Arc<str>>),
}

impl VectorData {
    fn with_capacity(ty: LogicalType, capacity: usize) -> Self {
        match ty {
            LogicalType::Boolean => VectorData::Boolean(Vec::with_capacity(capacity)),
            LogicalType::BigInt => VectorData::BigInt(Vec::with_capacity(capacity)),
            LogicalType::Double => VectorData::Double(Vec::with_capacity(capacity)),
            LogicalType::Date => VectorData::Date(Vec::with_capacity(capacity)),
            LogicalType::Time => VectorData::Time(Vec::with_capacity(capacity)),
            LogicalType::Timestamp => VectorData::Timestamp(Vec::with_capacity(capacity)),
            LogicalType::TimestampSeconds => {
                VectorData::TimestampSeconds(Vec::with_capacity(capacity))
            }
            LogicalType::Varchar => VectorData::Varchar(Vec::with_capacity(capacity)),
        }
    }

    fn len(&self) -> usize {
        match self {
            VectorData::Boolean(v) => v.len(),
            VectorData::BigInt(v) => v.len(),
            VectorData::Double(v) => v.len(),
            VectorData::Date(v) => v.len(),
            VectorData::Time(v) => v.len(),
            VectorData::Timestamp(v) => v.len(),
            VectorData::TimestampSeconds(v) => v.len(),
            VectorData::Varchar(v) => v.len(),
        }
    }

    fn clear(&mut self) {
        match self {
            VectorData::Boolean(v) => v.clear(),
            VectorData::BigInt(v) => v.clear(),
            VectorData::Double(v) => v.clear(),
            VectorData::Date(v) => v.clear(),
            VectorData::Time(v) => v.clear(),
            VectorData::Timestamp(v) => v.clear(),
            VectorData::TimestampSeconds(v) => v.clear(),
            VectorData::Varchar(v) => v.clear(),
        }
    }
}

/// A typed column vector with a validity mask.
#[derive(Clone, Debug)]
pub struct Vector {
    ty: LogicalType,
    data: VectorData,
    validity: Bitmap,
}

impl Vector {
    pub fn new(ty: LogicalType) -> Self {
        Self::with_capacity(ty, STANDARD_VECTOR_SIZE)
    }

    pub fn with_capacity(ty: LogicalType, capacity: usize) -> Self {
        Self {
            ty,
            data: VectorData::with_capacity(ty, capacity),
            validity: Bitmap::new(),
        }
    }

    pub fn logical_type(&self) -> LogicalType {
        self.ty
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_valid(&self, row: usize) -> bool {
        self.validity.get(row)
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.validity.clear();
    }

    /// Append a null slot. The backing value is the type's zero value.
    pub fn push_null(&mut self) {
        match &mut self.data {
            VectorData::Boolean(v) => v.push(false),
            VectorData::BigInt(v) => v.push(0),
            VectorData::Double(v) => v.push(0.0),
            VectorData::Date(v) => v.push(0),
            VectorData::Time(v) => v.push(0),
            VectorData::Timestamp(v) => v.push(0),
            VectorData::TimestampSeconds(v) => v.push(0),
            VectorData::Varchar(v) => v.push(Arc::from("")),
        }
        self.validity.push(false);
    }

    pub fn push_value(&mut self, value: Value) {
        match (&mut self.data, value) {
            (_, Value::Null) => {
                self.push_null();
                return;
            }
            (VectorData::Boolean(v), Value::Boolean(b)) => v.push(b),
            (VectorData::BigInt(v), Value::BigInt(i)) => v.push(i),
            (VectorData::Double(v), Value::Double(f)) => v.push(f),
            (VectorData::Date(v), Value::Date(d)) => v.push(d),
            (VectorData::Time(v), Value::Time(t)) => v.push(t),
            (VectorData::Timestamp(v), Value::Timestamp(t)) => v.push(t),
            (VectorData::TimestampSeconds(v), Value::TimestampSeconds(t)) => v.push(t),
            (VectorData::Varchar(v), Value::Varchar(s)) => v.push(s),
            (_, value) => panic!(
                "value {value:?} does not match vector type {}",
                self.ty.name()
            ),
        }
        self.validity.push(true);
    }

    pub fn value(&self, row: usize) -> Value {
        if !self.validity.get(row) {
            return Value::Null;
        }
        match &self.data {
            VectorData::Boolean(v) => Value::Boolean(v[row]),
            VectorData::BigInt(v) => Value::BigInt(v[row]),
            VectorData::Double(v) => Value::Double(v[row]),
            VectorData::Date(v) => Value::Date(v[row]),
            VectorData::Time(v) => Value::Time(v[row]),
            VectorData::Timestamp(v) => Value::Timestamp(v[row]),
            VectorData::TimestampSeconds(v) => Value::TimestampSeconds(v[row]),
            VectorData::Varchar(v) => Value::Varchar(v[row].clone()),
        }
    }

    pub fn str_at(&self, row: usize) -> Option<&str> {
        if !self.validity.get(row) {
            return None;
        }
        match &self.data {
            VectorData::Varchar(v) => Some(&v[row]),
            _ => None,
        }
    }

    pub fn double_at(&self, row: usize) -> Option<f64> {
        match self.value(row) {
            Value::Double(f) => Some(f),
            Value::BigInt(i) => Some(i as f64),
            _ => None,
        }
    }
}

/// A batch of column vectors with a shared cardinality.
#[derive(Clone, Debug)]
pub struct DataChunk {
    columns: Vec<Vector>,
    cardinality: usize,
}

impl DataChunk {
    pub fn new(types: &[LogicalType]) -> Self {
        Self {
            columns: types.iter().map(|&ty| Vector::new(ty)).collect(),
            cardinality: 0,
        }
    }

    pub fn from_columns(columns: Vec<Vector>) -> Self {
        let cardinality = columns.first().map_or(0, Vector::len);
        debug_assert!(columns.iter().all(|c| c.len() == cardinality));
        Self {
            columns,
            cardinality,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, idx: usize) -> &Vector {
        &self.columns[idx]
    }

    pub fn column_mut(&mut self, idx: usize) -> &mut Vector {
        &mut self.columns[idx]
    }

    pub fn columns(&self) -> &[Vector] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.cardinality
    }

    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    pub fn set_cardinality(&mut self, cardinality: usize) {
        debug_assert!(self.columns.iter().all(|c| c.len() >= cardinality));
        self.cardinality = cardinality;
    }

    pub fn reset(&mut self) {
        for col in &mut self.columns {
            col.clear();
        }
        self.cardinality = 0;
    }
}
