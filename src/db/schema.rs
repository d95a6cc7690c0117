//! Schema descriptor for the queried table.
//!
//! A static description of one table's columns, loaded once at start-up and
//! used to render prompts and fallback SQL.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Describes the single table questions are asked about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Table name, used verbatim in prompts and generated SQL.
    pub table_name: String,

    /// Columns in declaration order.
    pub columns: Vec<Column>,
}

impl SchemaDescriptor {
    /// Creates a descriptor with the given table name and columns.
    pub fn new(table_name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
        }
    }

    /// The built-in `students` table.
    pub fn students() -> Self {
        Self::new(
            "students",
            vec![
                Column::new("student_id", ColumnType::Int),
                Column::new("name", ColumnType::Varchar),
                Column::new("age", ColumnType::Int),
                Column::new("department", ColumnType::Varchar),
                Column::new("attendance_percentage", ColumnType::Int),
                Column::new("internal_marks", ColumnType::Int),
                Column::new("external_marks", ColumnType::Int),
            ],
        )
    }

    /// Formats the column list for inclusion in a prompt, one `- name (TYPE)` per line.
    pub fn format_for_llm(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("- {} ({})", c.name, c.data_type))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Columns that are not part of the primary key.
    pub fn non_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.primary_key)
    }

    /// Returns true if the table declares a column with this name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self::students()
    }
}

/// A column in the described table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared SQL type.
    #[serde(rename = "type")]
    pub data_type: ColumnType,

    /// Whether the column is part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
}

impl Column {
    /// Creates a new non-key column with the given name and type.
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
        }
    }

    /// Marks the column as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// Declared column type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    Int,
    BigInt,
    Float,
    Decimal,
    Varchar,
    Text,
    Bool,
    Date,
    Timestamp,
}

impl ColumnType {
    /// Returns the type as rendered in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::BigInt => "BIGINT",
            Self::Float => "FLOAT",
            Self::Decimal => "DECIMAL",
            Self::Varchar => "VARCHAR",
            Self::Text => "TEXT",
            Self::Bool => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    /// Returns true for types that can be averaged.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::BigInt | Self::Float | Self::Decimal)
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INT" | "INTEGER" | "INT64" => Ok(Self::Int),
            "BIGINT" => Ok(Self::BigInt),
            "FLOAT" | "DOUBLE" | "REAL" | "FLOAT64" => Ok(Self::Float),
            "DECIMAL" | "NUMERIC" => Ok(Self::Decimal),
            "VARCHAR" | "STRING" => Ok(Self::Varchar),
            "TEXT" => Ok(Self::Text),
            "BOOL" | "BOOLEAN" => Ok(Self::Bool),
            "DATE" => Ok(Self::Date),
            "TIMESTAMP" | "DATETIME" => Ok(Self::Timestamp),
            _ => Err(format!("Unknown column type: {s}")),
        }
    }
}

impl TryFrom<String> for ColumnType {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
