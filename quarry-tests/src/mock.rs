use async_stream::try_stream;
use quarry::{
    ColumnInfo, Dialect, Error, Executor, Introspection, QueryResult, Result, RowLabeled,
    RowNames, RowsAffected, Statement, Value, stream::Stream,
};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Table or view known to the [`MockExecutor`] catalog.
#[derive(Debug, Clone)]
pub struct MockTable {
    pub schema: String,
    pub name: String,
    pub view: bool,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
    pub identity: Vec<String>,
}

impl MockTable {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            view: false,
            columns: Vec::new(),
            primary_key: Vec::new(),
            identity: Vec::new(),
        }
    }

    pub fn view(mut self) -> Self {
        self.view = true;
        self
    }

    pub fn column(mut self, name: &str, sql_type: &str, nullable: bool) -> Self {
        let length = sql_type
            .split_once('(')
            .and_then(|(_, v)| v.trim_end_matches(')').parse().ok());
        self.columns.push(ColumnInfo {
            name: name.into(),
            sql_type: sql_type.into(),
            length,
            nullable,
        });
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn identity(mut self, column: &str) -> Self {
        self.identity.push(column.into());
        self
    }

    fn is(&self, schema: &str, name: &str) -> bool {
        self.schema.to_lowercase() == schema && self.name.to_lowercase() == name
    }
}

/// What the next non introspection statement returns.
#[derive(Debug, Clone)]
pub enum Response {
    Rows(Vec<RowLabeled>),
    Affected(RowsAffected),
    Error(String),
}

/// In-memory [`Executor`].
///
/// Statements equal to one of the dialect introspection statements are
/// answered from the catalog. Every other statement is recorded and gets the
/// next queued [`Response`], nothing at all when the queue is empty.
pub struct MockExecutor {
    dialect: Arc<dyn Dialect>,
    tables: Vec<MockTable>,
    sequences: Vec<(String, String)>,
    responses: Mutex<VecDeque<Response>>,
    statements: Mutex<Vec<Statement>>,
    introspections: AtomicUsize,
    delay: Option<Duration>,
}

pub fn row(labels: &[&str], values: Vec<Value>) -> RowLabeled {
    let labels: RowNames = labels.iter().map(|v| v.to_string()).collect();
    RowLabeled::new(labels, values.into_boxed_slice())
}

fn count(value: usize) -> Vec<QueryResult> {
    vec![row(&["count"], vec![Value::Int64(Some(value as i64))]).into()]
}

impl MockExecutor {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            tables: Vec::new(),
            sequences: Vec::new(),
            responses: Default::default(),
            statements: Default::default(),
            introspections: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_table(mut self, table: MockTable) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_sequence(mut self, schema: &str, name: &str) -> Self {
        self.sequences.push((schema.into(), name.into()));
        self
    }

    /// Every statement waits `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn enqueue(&self, response: Response) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn push_rows(&self, labels: &[&str], rows: Vec<Vec<Value>>) {
        self.enqueue(Response::Rows(
            rows.into_iter().map(|v| row(labels, v)).collect(),
        ));
    }

    pub fn push_affected(&self, rows_affected: u64, last_affected_id: Option<i64>) {
        self.enqueue(Response::Affected(RowsAffected {
            rows_affected,
            last_affected_id,
        }));
    }

    pub fn push_error(&self, message: &str) {
        self.enqueue(Response::Error(message.into()));
    }

    /// Statements received, introspection excluded.
    pub fn statements(&self) -> Vec<Statement> {
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_statement(&self) -> Statement {
        self.statements().pop().unwrap_or_default()
    }

    pub fn clear_statements(&self) {
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of introspection statements answered.
    pub fn introspections(&self) -> usize {
        self.introspections.load(Ordering::SeqCst)
    }

    fn param(statement: &Statement, name: &str) -> String {
        statement
            .params
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    fn introspect(&self, query: Introspection, statement: &Statement) -> Vec<QueryResult> {
        self.introspections.fetch_add(1, Ordering::SeqCst);
        let schema = Self::param(statement, "schema");
        let name = Self::param(statement, "name");
        let table = self.tables.iter().find(|t| t.is(&schema, &name));
        match query {
            Introspection::TableExists => count(table.filter(|t| !t.view).iter().count()),
            Introspection::ViewExists => count(table.filter(|t| t.view).iter().count()),
            Introspection::PrimaryKeyColumns => table
                .iter()
                .flat_map(|t| &t.primary_key)
                .map(|v| row(&["column_name"], vec![v.clone().into()]).into())
                .collect(),
            Introspection::Columns => table
                .iter()
                .flat_map(|t| &t.columns)
                .map(|c| {
                    row(
                        &["name", "type", "length", "nullable"],
                        vec![
                            c.name.clone().into(),
                            c.sql_type.clone().into(),
                            Value::UInt32(c.length),
                            if c.nullable { "YES" } else { "NO" }.into(),
                        ],
                    )
                    .into()
                })
                .collect(),
            Introspection::IdentityColumn => {
                let column = Self::param(statement, "column");
                count(
                    table
                        .iter()
                        .flat_map(|t| &t.identity)
                        .filter(|v| v.to_lowercase() == column)
                        .count(),
                )
            }
            Introspection::SequenceExists => count(
                self.sequences
                    .iter()
                    .filter(|(s, n)| s.to_lowercase() == schema && n.to_lowercase() == name)
                    .count(),
            ),
        }
    }

    fn respond(&self, statement: Statement) -> Result<Vec<QueryResult>> {
        let introspection = Introspection::ALL
            .into_iter()
            .find(|q| self.dialect.introspection(*q).ok() == Some(statement.sql.as_str()));
        if let Some(query) = introspection {
            return Ok(self.introspect(query, &statement));
        }
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(statement);
        let response = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(match response {
            None => Vec::new(),
            Some(Response::Rows(rows)) => rows.into_iter().map(Into::into).collect(),
            Some(Response::Affected(affected)) => vec![affected.into()],
            Some(Response::Error(message)) => return Err(Error::msg(message)),
        })
    }
}

impl Executor for MockExecutor {
    fn run(&self, statement: Statement) -> impl Stream<Item = Result<QueryResult>> + Send {
        let delay = self.delay;
        let response = self.respond(statement);
        try_stream! {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            for item in response? {
                yield item;
            }
        }
    }
}
