//! Top-level wiring: owns the page file, buffer cache, catalog and live
//! index registry behind a single synchronous entry point. No concurrency,
//! no network, no replication — a database instance is one page file plus
//! the in-memory structures rebuilt from it on open.

use std::time::Instant;

use buffer::{BufferCache, TableStore};
use catalog::Catalog;
use common::{Config, DbError, DbResult, RowMap};
use executor::IndexRegistry;
use parser::parse_sql;
use storage::PageManager;
use types::Value;

/// Outcome of `Database::execute_sql`. Always returned, never an `Err` —
/// every `DbError` raised while parsing, planning, or executing is caught
/// here and folded into `success = false` with a human-readable message.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    pub columns: Vec<String>,
    pub rows: Vec<RowMap>,
    pub rows_affected: u64,
    pub duration_seconds: f64,
}

pub struct Database {
    catalog: Catalog,
    store: TableStore,
    indexes: IndexRegistry,
}

impl Database {
    /// Opens the page file named by `config.path`, creating it if it
    /// doesn't exist. Bootstraps `pg_catalog`/`pg_indexes` (reattaching
    /// their pages on reopen), then rebuilds every index named in
    /// `pg_indexes` by scanning its table — indexes are never persisted
    /// in their own right, only the fact that they exist is.
    pub fn open(config: &Config) -> DbResult<Self> {
        let page_manager = PageManager::open(&config.path)?;
        let cache = BufferCache::new(
            page_manager,
            config.buffer_pool_pages,
            config.eviction_policy,
            config.lrfu_decay,
        );
        let mut store = TableStore::new(cache);
        let catalog = Catalog::bootstrap(&mut store)?;

        let mut indexes = IndexRegistry::new();
        for table in catalog.tables() {
            for index in catalog.indexes_on(&table.name) {
                indexes.rebuild(&mut store, &table.name, &index.column, &index.kind)?;
            }
        }

        tracing::debug!(
            tables = catalog.tables().count(),
            path = %config.path.display(),
            "database opened"
        );

        Ok(Self { catalog, store, indexes })
    }

    /// Parses, plans, and executes a single SQL statement, timing the
    /// whole pipeline. Never panics on malformed SQL or storage failures —
    /// any `DbError` becomes a non-success result with `message = "{err}"`.
    pub fn execute_sql(&mut self, sql: &str) -> ExecutionResult {
        let start = Instant::now();
        let outcome = self.run(sql);
        let duration_seconds = start.elapsed().as_secs_f64();

        match outcome {
            Ok(result) => ExecutionResult {
                success: true,
                message: result.message,
                columns: result.columns,
                rows: result.rows,
                rows_affected: result.rows_affected,
                duration_seconds,
            },
            Err(err) => ExecutionResult {
                success: false,
                message: format!("{err}"),
                columns: Vec::new(),
                rows: Vec::new(),
                rows_affected: 0,
                duration_seconds,
            },
        }
    }

    /// Executes every statement `sql` parses to, in order, and returns the
    /// last one's result — a caller passing a loader's worth of
    /// `;`-separated statements in one call gets each applied in sequence.
    fn run(&mut self, sql: &str) -> DbResult<executor::ExecutionResult> {
        let statements = parse_sql(sql)?;
        let mut last = None;
        for stmt in statements {
            let plan = planner::plan(stmt, &self.catalog)?;
            last = Some(executor::execute(plan, &mut self.catalog, &mut self.store, &mut self.indexes)?);
        }
        last.ok_or_else(|| DbError::Semantic("no SQL statement given".into()))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Point-searches a column's live index, returning the record ids of
    /// every row currently matching `key`. Returns an empty vec if the
    /// column has no index rather than erroring, since "no match" and
    /// "no index" look the same to a caller that only wants locations.
    pub fn index_lookup(
        &self,
        table: &str,
        column: &str,
        key: &Value,
    ) -> DbResult<Vec<common::RecordId>> {
        match self.indexes.get(table, column) {
            Some(handle) => handle.search(key),
            None => Ok(Vec::new()),
        }
    }
}
