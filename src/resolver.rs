//! Resolves extracted references to catalog descriptions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::extractor::ReferenceSet;

/// Catalog descriptions for the names one statement references.
///
/// Keys use the catalog's spelling, never the statement's or the model's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingContext {
    /// Table name to table description.
    pub table: BTreeMap<String, String>,
    /// Column name to column description.
    pub column: BTreeMap<String, String>,
}

impl GroundingContext {
    /// Whether nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty() && self.column.is_empty()
    }
}

/// Builds the grounding context for `references` in a single pass over `catalog`.
///
/// Columns are only considered inside referenced tables and are matched by name alone, so
/// two referenced tables sharing a column name both contribute; when the keys collide the
/// later table in catalog order wins. References with no catalog match are dropped.
pub fn resolve(catalog: &Catalog, references: &ReferenceSet) -> GroundingContext {
    let tables = references.tables_lower();
    let columns = references.columns_lower();
    let mut grounding = GroundingContext::default();
    if tables.is_empty() {
        return grounding;
    }

    for table in catalog.tables() {
        if !tables.contains(&table.table_name.to_lowercase()) {
            continue;
        }
        grounding
            .table
            .insert(table.table_name.clone(), table.table_desc.clone());
        for col in &table.cols {
            if columns.contains(&col.col.to_lowercase()) {
                grounding.column.insert(col.col.clone(), col.col_desc.clone());
            }
        }
    }
    grounding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDescriptor, TableDescriptor};

    fn table(name: &str, desc: &str, cols: &[(&str, &str)]) -> TableDescriptor {
        TableDescriptor {
            table_name: name.to_string(),
            table_desc: desc.to_string(),
            cols: cols
                .iter()
                .map(|(col, col_desc)| ColumnDescriptor {
                    col: col.to_string(),
                    col_desc: col_desc.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn uses_catalog_casing() {
        let catalog = Catalog::new(vec![table(
            "ORDERS",
            "Order records",
            &[("ORDER_DATE", "Date placed"), ("STATUS", "Order status")],
        )])
        .unwrap();
        let grounding = resolve(&catalog, &ReferenceSet::new(["orders"], ["order_date"]));

        assert_eq!(
            grounding.table,
            BTreeMap::from([("ORDERS".to_string(), "Order records".to_string())])
        );
        assert_eq!(
            grounding.column,
            BTreeMap::from([("ORDER_DATE".to_string(), "Date placed".to_string())])
        );
    }

    #[test]
    fn unmatched_references_are_dropped() {
        let catalog = Catalog::new(vec![table("a", "A", &[("x", "X")])]).unwrap();
        let grounding = resolve(&catalog, &ReferenceSet::new(["a", "ghost"], ["x", "nope"]));
        assert_eq!(grounding.table.len(), 1);
        assert_eq!(grounding.column.len(), 1);
    }

    #[test]
    fn columns_of_unreferenced_tables_are_ignored() {
        let catalog = Catalog::new(vec![
            table("a", "A", &[("id", "a id")]),
            table("b", "B", &[("name", "b name")]),
        ])
        .unwrap();
        let grounding = resolve(&catalog, &ReferenceSet::new(["a"], ["id", "name"]));
        assert_eq!(grounding.column.keys().collect::<Vec<_>>(), ["id"]);
    }

    #[test]
    fn shared_column_name_keeps_last_table_in_catalog_order() {
        let catalog = Catalog::new(vec![
            table("a", "A", &[("id", "a id")]),
            table("b", "B", &[("id", "b id"), ("ID", "b upper id")]),
        ])
        .unwrap();
        let grounding = resolve(&catalog, &ReferenceSet::new(["A", "B"], ["Id"]));
        assert_eq!(grounding.column.get("id").map(String::as_str), Some("b id"));
        assert_eq!(
            grounding.column.get("ID").map(String::as_str),
            Some("b upper id")
        );
    }

    #[test]
    fn empty_references_resolve_to_empty_context() {
        let catalog = Catalog::new(vec![table("a", "A", &[("x", "X")])]).unwrap();
        assert!(resolve(&catalog, &ReferenceSet::default()).is_empty());
    }
}
