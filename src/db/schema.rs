//! Static description of the tables the query engine works against.
//!
//! Hosts declare their schema once as a `static` and hand a reference to the
//! database handle; nothing here touches the database.

use super::DatabaseError;

#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    pub tables: &'static [TableDef],
}

#[derive(Debug, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

#[derive(Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
}

impl Schema {
    pub const fn new(tables: &'static [TableDef]) -> Self {
        Self { tables }
    }

    pub fn table(&self, name: &str) -> Option<&'static TableDef> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn require_table(&self, name: &str) -> Result<&'static TableDef, DatabaseError> {
        self.table(name)
            .ok_or_else(|| DatabaseError::UnknownTable(name.to_string()))
    }
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Double-quoted identifier, safe to splice into SQL.
    pub fn quoted_name(&self) -> String {
        format!("\"{}\"", self.name.replace('"', "\"\""))
    }
}
