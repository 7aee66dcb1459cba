use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

use crate::config::ConnectOptions;
use crate::driver::{Driver, DriverRows, DriverStatement, TxFlags};
use crate::error::{CODE_DRIVER_FAILURE, StmtMiddlewareError};
use crate::types::{RowValues, TypeTag};

/// Step at which the recording driver should fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailAt {
    Prepare,
    Bind,
    /// Fail on the n-th chunk (0-based) sent for any parameter.
    Chunk(usize),
    Execute,
}

/// What the recording driver saw for one executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionRecord {
    pub sql: String,
    pub tags: Vec<TypeTag>,
    pub params: Vec<RowValues>,
    /// Chunks received per long-data parameter index, in arrival order.
    pub chunks: BTreeMap<usize, Vec<Vec<u8>>>,
}

impl ExecutionRecord {
    /// Concatenated long data received for `index`.
    #[must_use]
    pub fn long_data(&self, index: usize) -> Option<Vec<u8>> {
        self.chunks.get(&index).map(|chunks| chunks.concat())
    }
}

#[derive(Debug, Clone)]
struct ScriptedResult {
    columns: Vec<String>,
    rows: Vec<Vec<RowValues>>,
}

#[derive(Debug, Default)]
struct Recorder {
    results: HashMap<String, ScriptedResult>,
    affected: HashMap<String, u64>,
    failures: HashMap<String, FailAt>,
    next_insert_id: u64,
    executions: Vec<ExecutionRecord>,
    transactions: Vec<String>,
    prepared: usize,
    open_statements: usize,
    open_results: usize,
    closed: bool,
}

/// In-memory driver that records everything it is asked to do.
///
/// Query results, affected-row counts and failures are scripted per exact SQL
/// text. Statements starting with `INSERT` or `REPLACE` receive increasing
/// generated ids starting at 1.
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    state: Rc<RefCell<Recorder>>,
}

impl RecordingDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `sql` return a result set with these columns and rows.
    pub fn script_result(&self, sql: &str, columns: &[&str], rows: Vec<Vec<RowValues>>) {
        self.state.borrow_mut().results.insert(
            sql.to_owned(),
            ScriptedResult {
                columns: columns.iter().map(|c| (*c).to_owned()).collect(),
                rows,
            },
        );
    }

    /// Make `sql` report `affected` rows when executed.
    pub fn script_affected(&self, sql: &str, affected: u64) {
        self.state
            .borrow_mut()
            .affected
            .insert(sql.to_owned(), affected);
    }

    /// Make `sql` fail at the given step.
    pub fn fail(&self, sql: &str, at: FailAt) {
        self.state.borrow_mut().failures.insert(sql.to_owned(), at);
    }

    #[must_use]
    pub fn executions(&self) -> Vec<ExecutionRecord> {
        self.state.borrow().executions.clone()
    }

    #[must_use]
    pub fn last_execution(&self) -> Option<ExecutionRecord> {
        self.state.borrow().executions.last().cloned()
    }

    /// Transaction commands received, e.g. `"begin flags=2 name=sp1"`.
    #[must_use]
    pub fn transactions(&self) -> Vec<String> {
        self.state.borrow().transactions.clone()
    }

    #[must_use]
    pub fn prepared_count(&self) -> usize {
        self.state.borrow().prepared
    }

    /// Statement handles currently alive.
    #[must_use]
    pub fn open_statements(&self) -> usize {
        self.state.borrow().open_statements
    }

    /// Result handles currently alive.
    #[must_use]
    pub fn open_results(&self) -> usize {
        self.state.borrow().open_results
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    fn record_tx(&self, verb: &str, flags: TxFlags, name: Option<&str>) {
        self.state.borrow_mut().transactions.push(format!(
            "{verb} flags={} name={}",
            flags.bits(),
            name.unwrap_or("")
        ));
    }
}

fn injected(step: &str, sql: &str) -> StmtMiddlewareError {
    StmtMiddlewareError::execution(format!("injected {step} failure for {sql}"), CODE_DRIVER_FAILURE)
}

impl Driver for RecordingDriver {
    type Statement<'a> = RecordingStatement;

    fn connect(_opts: &ConnectOptions) -> Result<Self, StmtMiddlewareError> {
        Ok(Self::new())
    }

    fn prepare<'a>(&'a mut self, sql: &str) -> Result<Self::Statement<'a>, StmtMiddlewareError> {
        let fail = {
            let mut state = self.state.borrow_mut();
            state.prepared += 1;
            state.failures.get(sql).cloned()
        };
        if fail == Some(FailAt::Prepare) {
            return Err(injected("prepare", sql));
        }
        self.state.borrow_mut().open_statements += 1;
        Ok(RecordingStatement {
            state: Rc::clone(&self.state),
            fail,
            chunks_seen: 0,
            record: ExecutionRecord {
                sql: sql.to_owned(),
                ..ExecutionRecord::default()
            },
            affected_rows: 0,
            insert_id: 0,
            result: None,
        })
    }

    fn begin(&mut self, flags: TxFlags, name: Option<&str>) -> Result<(), StmtMiddlewareError> {
        self.record_tx("begin", flags, name);
        Ok(())
    }

    fn commit(&mut self, flags: TxFlags, name: Option<&str>) -> Result<(), StmtMiddlewareError> {
        self.record_tx("commit", flags, name);
        Ok(())
    }

    fn rollback(&mut self, flags: TxFlags, name: Option<&str>) -> Result<(), StmtMiddlewareError> {
        self.record_tx("rollback", flags, name);
        Ok(())
    }

    fn close(self) -> Result<(), StmtMiddlewareError> {
        self.state.borrow_mut().closed = true;
        Ok(())
    }
}

/// Statement handle handed out by [`RecordingDriver`].
#[derive(Debug)]
pub struct RecordingStatement {
    state: Rc<RefCell<Recorder>>,
    fail: Option<FailAt>,
    chunks_seen: usize,
    record: ExecutionRecord,
    affected_rows: u64,
    insert_id: u64,
    result: Option<RecordingRows>,
}

impl DriverStatement for RecordingStatement {
    type Rows = RecordingRows;

    fn bind(&mut self, tags: &[TypeTag], params: &[RowValues]) -> Result<(), StmtMiddlewareError> {
        if self.fail == Some(FailAt::Bind) {
            return Err(injected("bind", &self.record.sql));
        }
        self.record.tags = tags.to_vec();
        self.record.params = params.to_vec();
        Ok(())
    }

    fn send_long_data(&mut self, index: usize, chunk: &[u8]) -> Result<(), StmtMiddlewareError> {
        if self.fail == Some(FailAt::Chunk(self.chunks_seen)) {
            return Err(injected("chunk", &self.record.sql));
        }
        self.chunks_seen += 1;
        self.record
            .chunks
            .entry(index)
            .or_default()
            .push(chunk.to_vec());
        Ok(())
    }

    fn execute(&mut self) -> Result<(), StmtMiddlewareError> {
        if self.fail == Some(FailAt::Execute) {
            return Err(injected("execute", &self.record.sql));
        }
        let mut state = self.state.borrow_mut();
        let sql = self.record.sql.as_str();
        if let Some(scripted) = state.results.get(sql).cloned() {
            self.affected_rows = scripted.rows.len() as u64;
            self.insert_id = 0;
            state.open_results += 1;
            self.result = Some(RecordingRows {
                state: Rc::clone(&self.state),
                columns: scripted.columns,
                rows: scripted.rows.into(),
            });
        } else {
            let upper = sql.trim_start().to_ascii_uppercase();
            if upper.starts_with("INSERT") || upper.starts_with("REPLACE") {
                state.next_insert_id += 1;
                self.insert_id = state.next_insert_id;
            }
            self.affected_rows = state.affected.get(sql).copied().unwrap_or(1);
        }
        state.executions.push(self.record.clone());
        Ok(())
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn insert_id(&self) -> u64 {
        self.insert_id
    }

    fn take_result(&mut self) -> Result<Option<RecordingRows>, StmtMiddlewareError> {
        Ok(self.result.take())
    }
}

impl Drop for RecordingStatement {
    fn drop(&mut self) {
        self.state.borrow_mut().open_statements -= 1;
    }
}

/// Result handle handed out by [`RecordingStatement`].
#[derive(Debug)]
pub struct RecordingRows {
    state: Rc<RefCell<Recorder>>,
    columns: Vec<String>,
    rows: VecDeque<Vec<RowValues>>,
}

impl DriverRows for RecordingRows {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn num_rows(&self) -> u64 {
        self.rows.len() as u64
    }

    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, StmtMiddlewareError> {
        Ok(self.rows.pop_front())
    }
}

impl Drop for RecordingRows {
    fn drop(&mut self) {
        self.state.borrow_mut().open_results -= 1;
    }
}
