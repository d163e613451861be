//! レコードのフラット化
//!
//! 形の異なるレコード列を、全キーの和集合を列とする1つの表に変換する。
//! ネストしたオブジェクトは `親.子` 形式の列名に展開し、配列はJSON文字列にする。

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::types::{OcrRecord, IMAGE_FILE_KEY, IMAGE_PATH_KEY};

/// セル値
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map(Cell::Number)
                .unwrap_or_else(|| Cell::Text(n.to_string())),
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// フラット化された表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 行番号と列名でセルを取得
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// レコード列を表に変換
///
/// 列順: `image_file`, `image_path`, 以降は出現順。
/// レコードに存在しないキーは `Cell::Empty`。
pub fn flatten_records(records: &[OcrRecord]) -> Table {
    let mut columns = vec![IMAGE_FILE_KEY.to_string(), IMAGE_PATH_KEY.to_string()];
    let mut index: HashMap<String, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.clone(), i))
        .collect();

    let flat_records: Vec<Vec<(String, Cell)>> = records
        .iter()
        .map(|record| {
            let mut fields = Vec::new();
            flatten_object("", &record.to_json_map(), &mut fields);
            fields
        })
        .collect();

    for fields in &flat_records {
        for (key, _) in fields {
            if !index.contains_key(key) {
                index.insert(key.clone(), columns.len());
                columns.push(key.clone());
            }
        }
    }

    let rows = flat_records
        .into_iter()
        .map(|fields| {
            let mut row = vec![Cell::Empty; columns.len()];
            for (key, cell) in fields {
                row[index[&key]] = cell;
            }
            row
        })
        .collect();

    Table { columns, rows }
}

fn flatten_object(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, Cell)>) {
    for (key, value) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Object(nested) if !nested.is_empty() => flatten_object(&name, nested, out),
            other => out.push((name, Cell::from_value(other))),
        }
    }
}
