//! Schema catalog: table and column descriptions keyed case-insensitively.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Description of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name exactly as the catalog spells it.
    pub col: String,
    /// Human-readable column description.
    #[serde(default)]
    pub col_desc: String,
}

/// Description of a table and its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name exactly as the catalog spells it.
    pub table_name: String,
    /// Human-readable table description.
    #[serde(default)]
    pub table_desc: String,
    /// Columns in catalog order.
    #[serde(default)]
    pub cols: Vec<ColumnDescriptor>,
}

/// Ordered, read-only collection of table descriptors.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Vec<TableDescriptor>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, rejecting blank or duplicate (case-insensitive) table names.
    pub fn new(tables: Vec<TableDescriptor>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(tables.len());
        for (idx, table) in tables.iter().enumerate() {
            anyhow::ensure!(
                !table.table_name.trim().is_empty(),
                "catalog entry {} has an empty table name",
                idx
            );
            let key = table.table_name.to_lowercase();
            if let Some(previous) = by_name.insert(key, idx) {
                anyhow::bail!(
                    "table {:?} appears twice in the catalog (entries {} and {})",
                    table.table_name,
                    previous,
                    idx
                );
            }
        }
        Ok(Self { tables, by_name })
    }

    /// Parses a catalog from JSON.
    ///
    /// Accepts a list of `{table_name, table_desc, cols}` objects, a list of single-key
    /// `{"NAME": {table_desc, cols}}` objects, or one object keyed by table name.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let document: CatalogDocument =
            serde_json::from_str(raw).context("catalog is not a recognized JSON document")?;
        let tables = match document {
            CatalogDocument::List(entries) => entries
                .into_iter()
                .flat_map(CatalogEntry::into_tables)
                .collect(),
            CatalogDocument::Keyed(map) => keyed_tables(map),
        };
        Self::new(tables)
    }

    /// Reads and parses a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {:?}", path))?;
        Self::from_json_str(&raw).with_context(|| format!("invalid catalog {:?}", path))
    }

    /// Tables in catalog order.
    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    /// Looks up a table by name, ignoring case.
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&idx| &self.tables[idx])
    }

    /// Looks up each of `names`, keeping catalog order and failing on unknown names.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&TableDescriptor>> {
        let mut wanted = HashSet::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let table = self
                .table(name)
                .with_context(|| format!("table {:?} is not in the catalog", name))?;
            wanted.insert(table.table_name.as_str());
        }
        Ok(self
            .tables
            .iter()
            .filter(|table| wanted.contains(table.table_name.as_str()))
            .collect())
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the catalog has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|table| table.cols.len()).sum()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<CatalogEntry>),
    Keyed(IndexMap<String, KeyedTable>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogEntry {
    Typed(TableDescriptor),
    Keyed(IndexMap<String, KeyedTable>),
}

impl CatalogEntry {
    fn into_tables(self) -> Vec<TableDescriptor> {
        match self {
            CatalogEntry::Typed(table) => vec![table],
            CatalogEntry::Keyed(map) => keyed_tables(map),
        }
    }
}

#[derive(Deserialize)]
struct KeyedTable {
    #[serde(default)]
    table_desc: String,
    #[serde(default)]
    cols: Vec<ColumnDescriptor>,
}

fn keyed_tables(map: IndexMap<String, KeyedTable>) -> Vec<TableDescriptor> {
    map.into_iter()
        .map(|(table_name, table)| TableDescriptor {
            table_name,
            table_desc: table.table_desc,
            cols: table.cols,
        })
        .collect()
}
