// Shared in-memory driver used by the integration tests.
//
// `FakeDriver` implements the call-level interface over plain collections:
// handles are counters, prepared queries are strings, and execution effects
// are staged per query text before the test runs. It also records enough of
// what the middleware did (bind calls, autocommit changes, live handles) for
// tests to assert on the call sequence, not just the results.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use odbc_middleware::prelude::*;

/// One stored row; `None` is SQL NULL.
pub type FakeRow = Vec<Option<String>>;

/// What executing a staged query should do.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Produce these result sets, all sharing one column count.
    Rows { columns: u16, sets: Vec<Vec<FakeRow>> },
    /// Append the bound parameters as a row to the store.
    Insert,
    /// Report no result data from the execute call itself.
    NoData,
    /// Produce the committed store as a single result set.
    SelectStore { columns: u16 },
    /// Fail the prepare call with these diagnostics.
    FailPrepare { diags: Vec<DiagRecord> },
    /// Fail every bind call with these diagnostics.
    FailBind { diags: Vec<DiagRecord> },
    /// Fail the execute call with this code and these diagnostics.
    FailExecute { code: SqlCode, diags: Vec<DiagRecord> },
}

struct ResultData {
    columns: u16,
    rows: Vec<FakeRow>,
}

#[derive(Default)]
struct StatementData {
    query: String,
    sets: Vec<ResultData>,
    set_index: usize,
    row_index: usize,
    bound: Vec<Option<String>>,
}

#[derive(Default)]
struct Inner {
    next_handle: u64,
    environments: HashSet<u64>,
    connections: HashSet<u64>,
    statements: HashMap<u64, StatementData>,
    diags: HashMap<u64, Vec<DiagRecord>>,
    effects: HashMap<String, Effect>,
    committed: Vec<FakeRow>,
    staged: Vec<FakeRow>,
    autocommit: bool,
    autocommit_changes: Vec<bool>,
    bind_calls: usize,
    connect_failure: Option<Vec<DiagRecord>>,
}

pub struct FakeDriver {
    inner: RefCell<Inner>,
}

impl FakeDriver {
    #[must_use]
    pub fn new() -> Self {
        let mut inner = Inner::default();
        inner.autocommit = true;
        Self {
            inner: RefCell::new(inner),
        }
    }

    /// Stage what executing `query` should do.
    pub fn stage(&self, query: &str, effect: Effect) {
        self.inner
            .borrow_mut()
            .effects
            .insert(query.to_owned(), effect);
    }

    /// Make the next connect call fail with these diagnostics.
    pub fn fail_connect(&self, diags: Vec<DiagRecord>) {
        self.inner.borrow_mut().connect_failure = Some(diags);
    }

    pub fn committed_rows(&self) -> Vec<FakeRow> {
        self.inner.borrow().committed.clone()
    }

    pub fn staged_rows(&self) -> Vec<FakeRow> {
        self.inner.borrow().staged.clone()
    }

    /// Every value the middleware set the autocommit attribute to, in order.
    pub fn autocommit_changes(&self) -> Vec<bool> {
        self.inner.borrow().autocommit_changes.clone()
    }

    /// Handles allocated but not yet freed, across all kinds.
    pub fn live_handles(&self) -> usize {
        let inner = self.inner.borrow();
        inner.environments.len() + inner.connections.len() + inner.statements.len()
    }

    /// Number of native bind calls the middleware issued.
    pub fn bind_calls(&self) -> usize {
        self.inner.borrow().bind_calls
    }

    fn next(inner: &mut Inner) -> RawHandle {
        inner.next_handle += 1;
        RawHandle(inner.next_handle)
    }

    fn decode_binding(binding: &ParamBinding) -> Option<String> {
        match binding.data() {
            ParamData::Int(i) => Some(i.to_string()),
            ParamData::Bytes(bytes) => {
                let text = bytes.strip_suffix(&[0]).unwrap_or(bytes);
                Some(String::from_utf8_lossy(text).into_owned())
            }
            ParamData::None => None,
        }
    }
}

impl OdbcDriver for FakeDriver {
    fn alloc_handle(
        &self,
        kind: HandleKind,
        parent: Option<RawHandle>,
    ) -> (SqlCode, Option<RawHandle>) {
        let mut inner = self.inner.borrow_mut();
        match kind {
            HandleKind::Environment => {
                if parent.is_some() {
                    return (SqlCode::InvalidHandle, None);
                }
                let handle = Self::next(&mut inner);
                inner.environments.insert(handle.0);
                (SqlCode::Success, Some(handle))
            }
            HandleKind::Connection => match parent {
                Some(parent) if inner.environments.contains(&parent.0) => {
                    let handle = Self::next(&mut inner);
                    inner.connections.insert(handle.0);
                    (SqlCode::Success, Some(handle))
                }
                _ => (SqlCode::InvalidHandle, None),
            },
            HandleKind::Statement => match parent {
                Some(parent) if inner.connections.contains(&parent.0) => {
                    let handle = Self::next(&mut inner);
                    inner.statements.insert(handle.0, StatementData::default());
                    (SqlCode::Success, Some(handle))
                }
                _ => (SqlCode::InvalidHandle, None),
            },
        }
    }

    fn free_handle(&self, kind: HandleKind, handle: RawHandle) -> SqlCode {
        let mut inner = self.inner.borrow_mut();
        inner.diags.remove(&handle.0);
        let freed = match kind {
            HandleKind::Environment => inner.environments.remove(&handle.0),
            HandleKind::Connection => inner.connections.remove(&handle.0),
            HandleKind::Statement => inner.statements.remove(&handle.0).is_some(),
        };
        if freed {
            SqlCode::Success
        } else {
            SqlCode::InvalidHandle
        }
    }

    fn set_env_version(&self, environment: RawHandle, _version: OdbcVersion) -> SqlCode {
        if self.inner.borrow().environments.contains(&environment.0) {
            SqlCode::Success
        } else {
            SqlCode::InvalidHandle
        }
    }

    fn connect(
        &self,
        connection: RawHandle,
        _dsn: &str,
        _username: &str,
        _password: &str,
    ) -> SqlCode {
        let mut inner = self.inner.borrow_mut();
        if let Some(diags) = inner.connect_failure.take() {
            inner.diags.insert(connection.0, diags);
            return SqlCode::Error;
        }
        SqlCode::Success
    }

    fn disconnect(&self, _connection: RawHandle) -> SqlCode {
        SqlCode::Success
    }

    fn set_connect_attr(&self, _connection: RawHandle, attr: ConnectAttr) -> SqlCode {
        let ConnectAttr::Autocommit(enabled) = attr;
        let mut inner = self.inner.borrow_mut();
        inner.autocommit = enabled;
        inner.autocommit_changes.push(enabled);
        SqlCode::Success
    }

    fn end_transaction(&self, _connection: RawHandle, completion: Completion) -> SqlCode {
        let mut inner = self.inner.borrow_mut();
        match completion {
            Completion::Commit => {
                let staged = std::mem::take(&mut inner.staged);
                inner.committed.extend(staged);
            }
            Completion::Rollback => inner.staged.clear(),
        }
        SqlCode::Success
    }

    fn prepare(&self, statement: RawHandle, query: &str) -> SqlCode {
        let mut inner = self.inner.borrow_mut();
        if let Some(Effect::FailPrepare { diags }) = inner.effects.get(query).cloned() {
            inner.diags.insert(statement.0, diags);
            return SqlCode::Error;
        }
        match inner.statements.get_mut(&statement.0) {
            Some(data) => {
                data.query = query.to_owned();
                SqlCode::Success
            }
            None => SqlCode::InvalidHandle,
        }
    }

    fn num_params(&self, statement: RawHandle) -> (SqlCode, u16) {
        let inner = self.inner.borrow();
        match inner.statements.get(&statement.0) {
            Some(data) => {
                let count = data.query.matches('?').count();
                (SqlCode::Success, u16::try_from(count).unwrap_or(u16::MAX))
            }
            None => (SqlCode::InvalidHandle, 0),
        }
    }

    fn bind_parameter(
        &self,
        statement: RawHandle,
        number: u16,
        binding: &ParamBinding,
    ) -> SqlCode {
        let mut inner = self.inner.borrow_mut();
        inner.bind_calls += 1;
        let query = match inner.statements.get(&statement.0) {
            Some(data) => data.query.clone(),
            None => return SqlCode::InvalidHandle,
        };
        if let Some(Effect::FailBind { diags }) = inner.effects.get(&query).cloned() {
            inner.diags.insert(statement.0, diags);
            return SqlCode::Error;
        }
        let value = Self::decode_binding(binding);
        let data = inner
            .statements
            .get_mut(&statement.0)
            .expect("statement checked above");
        let slot = usize::from(number) - 1;
        if data.bound.len() <= slot {
            data.bound.resize(slot + 1, None);
        }
        data.bound[slot] = value;
        SqlCode::Success
    }

    fn execute(&self, statement: RawHandle) -> SqlCode {
        let mut inner = self.inner.borrow_mut();
        let query = match inner.statements.get(&statement.0) {
            Some(data) => data.query.clone(),
            None => return SqlCode::InvalidHandle,
        };
        let effect = inner.effects.get(&query).cloned();
        let autocommit = inner.autocommit;
        let committed = inner.committed.clone();
        let data = inner
            .statements
            .get_mut(&statement.0)
            .expect("statement checked above");
        data.set_index = 0;
        data.row_index = 0;
        data.sets.clear();
        match effect {
            Some(Effect::Rows { columns, sets }) => {
                data.sets = sets
                    .into_iter()
                    .map(|rows| ResultData { columns, rows })
                    .collect();
                SqlCode::Success
            }
            Some(Effect::SelectStore { columns }) => {
                data.sets = vec![ResultData {
                    columns,
                    rows: committed,
                }];
                SqlCode::Success
            }
            Some(Effect::Insert) => {
                let row = data.bound.clone();
                if autocommit {
                    inner.committed.push(row);
                } else {
                    inner.staged.push(row);
                }
                SqlCode::Success
            }
            Some(Effect::NoData) => SqlCode::NoData,
            Some(Effect::FailExecute { code, diags }) => {
                inner.diags.insert(statement.0, diags);
                code
            }
            Some(Effect::FailPrepare { .. } | Effect::FailBind { .. }) | None => SqlCode::Success,
        }
    }

    fn num_result_cols(&self, statement: RawHandle) -> (SqlCode, u16) {
        let inner = self.inner.borrow();
        match inner.statements.get(&statement.0) {
            Some(data) => {
                let columns = data.sets.get(data.set_index).map_or(0, |set| set.columns);
                (SqlCode::Success, columns)
            }
            None => (SqlCode::InvalidHandle, 0),
        }
    }

    fn fetch(&self, statement: RawHandle) -> SqlCode {
        let mut inner = self.inner.borrow_mut();
        match inner.statements.get_mut(&statement.0) {
            Some(data) => match data.sets.get(data.set_index) {
                Some(set) if data.row_index < set.rows.len() => {
                    data.row_index += 1;
                    SqlCode::Success
                }
                _ => SqlCode::NoData,
            },
            None => SqlCode::InvalidHandle,
        }
    }

    fn get_data(
        &self,
        statement: RawHandle,
        column: u16,
        buffer: &mut [u8],
    ) -> (SqlCode, Indicator) {
        let inner = self.inner.borrow();
        let Some(data) = inner.statements.get(&statement.0) else {
            return (SqlCode::InvalidHandle, Indicator::Null);
        };
        let cell = data
            .sets
            .get(data.set_index)
            .and_then(|set| set.rows.get(data.row_index.wrapping_sub(1)))
            .and_then(|row| row.get(usize::from(column) - 1));
        match cell {
            Some(Some(text)) => {
                let copied = text.len().min(buffer.len());
                buffer[..copied].copy_from_slice(&text.as_bytes()[..copied]);
                (SqlCode::Success, Indicator::Length(text.len()))
            }
            Some(None) => (SqlCode::Success, Indicator::Null),
            None => (SqlCode::Error, Indicator::Null),
        }
    }

    fn more_results(&self, statement: RawHandle) -> SqlCode {
        let mut inner = self.inner.borrow_mut();
        match inner.statements.get_mut(&statement.0) {
            Some(data) if data.set_index + 1 < data.sets.len() => {
                data.set_index += 1;
                data.row_index = 0;
                SqlCode::Success
            }
            Some(_) => SqlCode::NoData,
            None => SqlCode::InvalidHandle,
        }
    }

    fn close_cursor(&self, statement: RawHandle) -> SqlCode {
        let mut inner = self.inner.borrow_mut();
        match inner.statements.get_mut(&statement.0) {
            Some(data) => {
                data.sets.clear();
                data.set_index = 0;
                data.row_index = 0;
                data.bound.clear();
                SqlCode::Success
            }
            None => SqlCode::InvalidHandle,
        }
    }

    fn diag_record(
        &self,
        _kind: HandleKind,
        handle: RawHandle,
        record: i16,
    ) -> (SqlCode, Option<DiagRecord>) {
        let inner = self.inner.borrow();
        let records = inner.diags.get(&handle.0);
        let index = usize::try_from(record).ok().and_then(|r| r.checked_sub(1));
        match (records, index) {
            (Some(records), Some(index)) if index < records.len() => {
                (SqlCode::Success, Some(records[index].clone()))
            }
            _ => (SqlCode::NoData, None),
        }
    }
}

/// Build a diagnostic record in one line.
#[must_use]
pub fn diag(state: &str, native_code: i32, message: &str) -> DiagRecord {
    DiagRecord {
        state: state.to_owned(),
        native_code,
        message: message.to_owned(),
    }
}
