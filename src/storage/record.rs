//! Record and Value types for ChronoDB
//!
//! This module defines how rows are represented in memory and how they are
//! encoded into page slots.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::io::{Cursor, Read};

use crate::catalog::{Column, ColumnType};
use crate::error::{Error, Result};

const TAG_INT: u8 = 0;
const TAG_FLOAT: u8 = 1;
const TAG_STRING: u8 = 2;

/// A typed field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Integer value (32-bit)
    Int(i32),
    /// Float value (32-bit)
    Float(f32),
    /// String value
    String(String),
}

impl Value {
    /// Coerce a command token to the declared column type.
    ///
    /// Integers and floats use strict parsing; strings are taken verbatim.
    /// Non-finite floats are refused so every stored value stays ordered.
    pub fn parse_as(text: &str, column_type: ColumnType) -> Option<Value> {
        match column_type {
            ColumnType::Int => text.parse::<i32>().ok().map(Value::Int),
            ColumnType::Float => text
                .parse::<f32>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float),
            ColumnType::String => Some(Value::String(text.to_string())),
        }
    }

    /// Get the column type this value belongs to
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Int(_) => ColumnType::Int,
            Value::Float(_) => ColumnType::Float,
            Value::String(_) => ColumnType::String,
        }
    }

    /// Try to convert to i32
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to convert to f32
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Compare two values of the same type
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A record (row): one value per column, in schema order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    /// Create a new record from values
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get a value by index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Set a value by index
    pub fn set(&mut self, index: usize, value: Value) {
        if index < self.values.len() {
            self.values[index] = value;
        }
    }

    /// Get all values
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if record is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Identity value: field 0 when it is an integer
    pub fn id(&self) -> Option<i32> {
        self.values.first().and_then(Value::as_i32)
    }

    /// True when field count and every field type match the columns
    pub fn matches_columns(&self, columns: &[Column]) -> bool {
        self.values.len() == columns.len()
            && self
                .values
                .iter()
                .zip(columns)
                .all(|(value, column)| value.column_type() == column.column_type)
    }

    /// Serialize record to binary format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        bytes.write_u16::<LittleEndian>(self.values.len() as u16)?;

        for value in &self.values {
            match value {
                Value::Int(i) => {
                    bytes.write_u8(TAG_INT)?;
                    bytes.write_i32::<LittleEndian>(*i)?;
                }
                Value::Float(f) => {
                    bytes.write_u8(TAG_FLOAT)?;
                    bytes.write_f32::<LittleEndian>(*f)?;
                }
                Value::String(s) => {
                    let len = u16::try_from(s.len())
                        .map_err(|_| Error::RecordTooLarge(s.len()))?;
                    bytes.write_u8(TAG_STRING)?;
                    bytes.write_u16::<LittleEndian>(len)?;
                    bytes.extend_from_slice(s.as_bytes());
                }
            }
        }
        Ok(bytes)
    }

    /// Deserialize record from binary format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let truncated =
            |_: std::io::Error| Error::CorruptedRecord("unexpected end of record".to_string());
        let mut cursor = Cursor::new(bytes);

        let count = cursor.read_u16::<LittleEndian>().map_err(truncated)? as usize;
        let mut values = Vec::with_capacity(count);

        for _ in 0..count {
            let tag = cursor.read_u8().map_err(truncated)?;
            let value = match tag {
                TAG_INT => Value::Int(cursor.read_i32::<LittleEndian>().map_err(truncated)?),
                TAG_FLOAT => Value::Float(cursor.read_f32::<LittleEndian>().map_err(truncated)?),
                TAG_STRING => {
                    let len = cursor.read_u16::<LittleEndian>().map_err(truncated)? as usize;
                    let mut buf = vec![0u8; len];
                    cursor.read_exact(&mut buf).map_err(truncated)?;
                    Value::String(
                        String::from_utf8(buf).map_err(|e| Error::CorruptedRecord(e.to_string()))?,
                    )
                }
                other => {
                    return Err(Error::CorruptedRecord(format!("unknown type tag {}", other)))
                }
            };
            values.push(value);
        }

        if cursor.position() as usize != bytes.len() {
            return Err(Error::CorruptedRecord("trailing bytes after record".to_string()));
        }

        Ok(Record::new(values))
    }
}

impl FromIterator<Value> for Record {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Record::new(iter.into_iter().collect())
    }
}
