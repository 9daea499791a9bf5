//! System catalog (§4.2 bootstrap, §9 catalog design notes). Unlike the
//! teacher's JSON-sidecar catalog, table and index metadata here are rows
//! in two ordinary tables — `pg_catalog` and `pg_indexes` — riding on the
//! same `buffer::TableStore` used for user data. Bootstrapping those two
//! tables requires a hard-coded schema, since `pg_catalog` cannot describe
//! itself before it exists.

use ahash::RandomState;
use buffer::TableStore;
use common::{DbError, DbResult, TableId};
use expr::{BinaryOp, Expr};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use storage::{ColumnInfo, Page, PageType, TableSchema};
use types::{SqlType, Value};

type Map<K, V> = HashMap<K, V, RandomState>;

pub const CATALOG_TABLE: &str = "pg_catalog";
pub const INDEX_TABLE: &str = "pg_indexes";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexKind {
    BTree,
    Hash,
}

impl IndexKind {
    fn as_str(&self) -> &'static str {
        match self {
            IndexKind::BTree => "btree",
            IndexKind::Hash => "hash",
        }
    }

    fn parse(s: &str) -> DbResult<IndexKind> {
        match s {
            "btree" => Ok(IndexKind::BTree),
            "hash" => Ok(IndexKind::Hash),
            other => Err(DbError::Semantic(format!("unknown index kind '{other}'"))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IndexMeta {
    pub id: IndexId,
    pub name: String,
    pub table: String,
    pub column: String,
    pub kind: IndexKind,
    pub unique: bool,
}

#[derive(Clone, Debug)]
pub struct TableMeta {
    pub id: TableId,
    pub name: String,
    pub schema: TableSchema,
}

/// In-memory view over the catalog tables, kept in sync with `pg_catalog`
/// and `pg_indexes` on every mutation.
#[derive(Default)]
pub struct Catalog {
    tables: Vec<TableMeta>,
    table_name_index: Map<String, usize>,
    indexes: Vec<IndexMeta>,
    next_table_id: u64,
    next_index_id: u64,
}

fn catalog_schema() -> TableSchema {
    TableSchema::try_new(vec![
        ColumnInfo::new("table_name", SqlType::Varchar),
        ColumnInfo::new("column_info", SqlType::Varchar),
        ColumnInfo::new("created_at", SqlType::Varchar),
        ColumnInfo::new("page_count", SqlType::Int),
    ])
    .expect("hard-coded pg_catalog schema is always valid")
}

fn index_schema() -> TableSchema {
    TableSchema::try_new(vec![
        ColumnInfo::new("index_name", SqlType::Varchar),
        ColumnInfo::new("table_name", SqlType::Varchar),
        ColumnInfo::new("column_name", SqlType::Varchar),
        ColumnInfo::new("unique", SqlType::Varchar),
        ColumnInfo::new("created_at", SqlType::Varchar),
        ColumnInfo::new("kind", SqlType::Varchar),
    ])
    .expect("hard-coded pg_indexes schema is always valid")
}

/// One entry of `pg_catalog.column_info`, a JSON array of `{name, type,
/// nullable}` objects — observable as-is by selecting the column directly.
#[derive(Serialize, Deserialize)]
struct ColumnInfoJson {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    nullable: bool,
}

fn encode_columns(schema: &TableSchema) -> String {
    let entries: Vec<ColumnInfoJson> = schema
        .columns
        .iter()
        .map(|c| ColumnInfoJson {
            name: c.name.clone(),
            data_type: c.data_type.as_str().to_string(),
            nullable: c.nullable,
        })
        .collect();
    serde_json::to_string(&entries).expect("column metadata always serializes")
}

fn decode_columns(encoded: &str) -> DbResult<TableSchema> {
    let entries: Vec<ColumnInfoJson> = serde_json::from_str(encoded)
        .map_err(|err| DbError::Storage(format!("malformed column_info: {err}")))?;
    let columns = entries
        .into_iter()
        .map(|e| {
            let data_type = SqlType::parse(&e.data_type)
                .ok_or_else(|| DbError::Storage(format!("unknown column type '{}'", e.data_type)))?;
            Ok(ColumnInfo { name: e.name, data_type, nullable: e.nullable })
        })
        .collect::<DbResult<Vec<_>>>()?;
    TableSchema::try_new(columns)
}

fn eq_text(column: &str, value: &str) -> Expr {
    Expr::Binary {
        left: Box::new(Expr::Column { table: None, name: column.into() }),
        op: BinaryOp::Eq,
        right: Box::new(Expr::Literal(Value::Text(value.to_string()))),
    }
}

fn and(a: Expr, b: Expr) -> Expr {
    Expr::Binary { left: Box::new(a), op: BinaryOp::And, right: Box::new(b) }
}

impl Catalog {
    fn empty() -> Self {
        Self {
            tables: Vec::new(),
            table_name_index: Map::default(),
            indexes: Vec::new(),
            next_table_id: 1,
            next_index_id: 1,
        }
    }

    /// Ensures `pg_catalog`/`pg_indexes` exist in `store`, then rebuilds the
    /// in-memory view from whatever rows they already hold.
    ///
    /// `store` always starts with an empty in-memory table map, even when
    /// its underlying page file already has data on disk (a fresh
    /// `TableStore` never knows about pages it didn't allocate itself). So
    /// on every bootstrap we first scan the page file for already-allocated
    /// data pages and group them by table name; a table whose pages are
    /// found there is reattached with `attach_existing_table` instead of
    /// created fresh, which is what makes reopening a page file work.
    pub fn bootstrap(store: &mut TableStore) -> DbResult<Catalog> {
        let mut pages_by_table = group_data_pages_by_table(store)?;

        attach_or_create(store, CATALOG_TABLE, catalog_schema(), &mut pages_by_table)?;
        attach_or_create(store, INDEX_TABLE, index_schema(), &mut pages_by_table)?;

        let mut catalog = Self::empty();
        catalog.reload(store)?;

        for table in &catalog.tables {
            if !store.table_exists(&table.name) {
                let pages = pages_by_table.remove(&table.name).unwrap_or_default();
                store.attach_existing_table(&table.name, table.schema.clone(), pages)?;
            }
        }

        Ok(catalog)
    }

    fn reload(&mut self, store: &mut TableStore) -> DbResult<()> {
        self.tables.clear();
        self.table_name_index.clear();
        self.indexes.clear();

        let rows = store.scan(CATALOG_TABLE, None)?;
        for row in rows {
            let table_name = row.values[0].as_text().unwrap_or_default().to_string();
            let column_info = row.values[1].as_text().unwrap_or_default();
            let schema = decode_columns(column_info)?;
            let id = TableId(self.next_table_id);
            self.next_table_id += 1;
            self.table_name_index.insert(table_name.clone(), self.tables.len());
            self.tables.push(TableMeta { id, name: table_name, schema });
        }

        let index_rows = store.scan(INDEX_TABLE, None)?;
        for row in index_rows {
            let name = row.values[0].as_text().unwrap_or_default().to_string();
            let table = row.values[1].as_text().unwrap_or_default().to_string();
            let column = row.values[2].as_text().unwrap_or_default().to_string();
            let unique = row.values[3].as_text().unwrap_or_default() == "true";
            let kind = IndexKind::parse(row.values[5].as_text().unwrap_or_default())?;
            let id = IndexId(self.next_index_id);
            self.next_index_id += 1;
            self.indexes.push(IndexMeta { id, name, table, column, kind, unique });
        }

        Ok(())
    }

    pub fn table(&self, name: &str) -> DbResult<&TableMeta> {
        let idx = self
            .table_name_index
            .get(name)
            .copied()
            .ok_or_else(|| DbError::Semantic(format!("table '{name}' does not exist")))?;
        Ok(&self.tables[idx])
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.table_name_index.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableMeta> {
        self.tables.iter()
    }

    pub fn indexes_on(&self, table: &str) -> impl Iterator<Item = &IndexMeta> {
        self.indexes.iter().filter(move |i| i.table == table)
    }

    pub fn index_on_column(&self, table: &str, column: &str) -> Option<&IndexMeta> {
        self.indexes.iter().find(|i| i.table == table && i.column == column)
    }

    /// Finds an index by name alone, regardless of which table it's on.
    /// Needed by `DROP INDEX`, whose grammar doesn't name the table.
    pub fn index_by_name(&self, name: &str) -> Option<&IndexMeta> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn create_table(
        &mut self,
        store: &mut TableStore,
        name: &str,
        columns: Vec<ColumnInfo>,
    ) -> DbResult<TableId> {
        if self.table_exists(name) {
            return Err(DbError::Semantic(format!("table '{name}' already exists")));
        }
        let schema = TableSchema::try_new(columns)?;
        store.create_table(name, schema.clone())?;

        let row = vec![
            Value::Text(name.to_string()),
            Value::Text(encode_columns(&schema)),
            Value::Text(now_string()),
            Value::Int(0),
        ];
        store.insert(CATALOG_TABLE, row)?;

        let id = TableId(self.next_table_id);
        self.next_table_id += 1;
        self.table_name_index.insert(name.to_string(), self.tables.len());
        self.tables.push(TableMeta { id, name: name.to_string(), schema });
        Ok(id)
    }

    pub fn create_index(
        &mut self,
        store: &mut TableStore,
        table: &str,
        index_name: &str,
        column: &str,
        kind: IndexKind,
        unique: bool,
    ) -> DbResult<IndexId> {
        let meta = self.table(table)?;
        if meta.schema.position(column).is_none() {
            return Err(DbError::Semantic(format!("unknown column '{column}' on table '{table}'")));
        }
        if self.index_on_column(table, column).is_some() {
            return Err(DbError::Semantic(format!(
                "column '{column}' on table '{table}' already has an index"
            )));
        }

        let row = vec![
            Value::Text(index_name.to_string()),
            Value::Text(table.to_string()),
            Value::Text(column.to_string()),
            Value::Text(unique.to_string()),
            Value::Text(now_string()),
            Value::Text(kind.as_str().to_string()),
        ];
        store.insert(INDEX_TABLE, row)?;

        let id = IndexId(self.next_index_id);
        self.next_index_id += 1;
        self.indexes.push(IndexMeta {
            id,
            name: index_name.to_string(),
            table: table.to_string(),
            column: column.to_string(),
            kind,
            unique,
        });
        Ok(id)
    }

    pub fn drop_index(&mut self, store: &mut TableStore, table: &str, index_name: &str) -> DbResult<()> {
        if self.indexes.iter().find(|i| i.table == table && i.name == index_name).is_none() {
            return Err(DbError::Semantic(format!(
                "index '{index_name}' does not exist on table '{table}'"
            )));
        }
        let predicate = and(eq_text("table_name", table), eq_text("index_name", index_name));
        store.delete(INDEX_TABLE, Some(&predicate))?;
        self.indexes.retain(|i| !(i.table == table && i.name == index_name));
        Ok(())
    }
}

fn group_data_pages_by_table(store: &mut TableStore) -> DbResult<Map<String, Vec<Page>>> {
    let pages = store.cache_mut().page_manager_mut().scan_allocated()?;
    let mut by_table: Map<String, Vec<Page>> = Map::default();
    for page in pages {
        if page.page_type == PageType::Data {
            by_table.entry(page.table_name.clone()).or_default().push(page);
        }
    }
    Ok(by_table)
}

fn attach_or_create(
    store: &mut TableStore,
    table: &str,
    schema: TableSchema,
    pages_by_table: &mut Map<String, Vec<Page>>,
) -> DbResult<()> {
    match pages_by_table.remove(table) {
        Some(pages) => store.attach_existing_table(table, schema, pages),
        None => store.create_table(table, schema),
    }
}

fn now_string() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
