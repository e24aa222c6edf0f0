use super::*;
use sea_orm::{DatabaseConnection, ExecResult, MockDatabase, MockExecResult, QueryResult};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use test_log::test;

/// A connection recording all statements, before handing them to a mock database.
pub(crate) struct Recorder {
    db: DatabaseConnection,
    statements: Mutex<Vec<Statement>>,
}

impl Recorder {
    pub fn new(db: MockDatabase) -> Self {
        Self {
            db: db.into_connection(),
            statements: Default::default(),
        }
    }

    fn record(&self, stmt: &Statement) {
        self.statements
            .lock()
            .expect("lock must not be poisoned")
            .push(stmt.clone());
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements
            .lock()
            .expect("lock must not be poisoned")
            .clone()
    }

    /// The position of the first occurrence of a query.
    pub fn position(&self, query: impl Query) -> Option<usize> {
        let sql = query.statement(DbBackend::Postgres).sql;
        self.statements().iter().position(|stmt| stmt.sql == sql)
    }

    /// The values of all the occurrences of a query, in order.
    pub fn values(&self, query: impl Query) -> Vec<Vec<Value>> {
        let sql = query.statement(DbBackend::Postgres).sql;
        self.statements()
            .into_iter()
            .filter(|stmt| stmt.sql == sql)
            .map(|stmt| stmt.values.map(|values| values.0).unwrap_or_default())
            .collect()
    }
}

#[async_trait::async_trait]
impl ConnectionTrait for Recorder {
    fn get_database_backend(&self) -> DbBackend {
        self.db.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        self.record(&stmt);
        self.db.execute(stmt).await
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        self.record(&Statement::from_string(self.get_database_backend(), sql));
        self.db.execute_unprepared(sql).await
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        self.record(&stmt);
        self.db.query_one(stmt).await
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        self.record(&stmt);
        self.db.query_all(stmt).await
    }
}

pub(crate) fn row<const N: usize>(
    values: [(&'static str, Value); N],
) -> BTreeMap<&'static str, Value> {
    BTreeMap::from(values)
}

pub(crate) fn executed(n: usize) -> impl Iterator<Item = MockExecResult> {
    (0..n).map(|_| MockExecResult {
        last_insert_id: 0,
        rows_affected: 1,
    })
}

pub(crate) fn mock() -> MockDatabase {
    MockDatabase::new(DbBackend::Postgres)
}

#[derive(Clone, Copy, Debug)]
enum Probe {
    Touch,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Query for Probe {
    fn statement(self, backend: DbBackend) -> Statement {
        Statement::from_string(backend, "UPDATE probe SET touched = $1")
    }
}

#[derive(Default)]
struct ProbeStep {
    applied: AtomicBool,
    rolled_back: AtomicBool,
}

impl Step for ProbeStep {
    fn name(&self) -> &'static str {
        "probe"
    }

    async fn apply(&self, tx: &DatabaseTransaction) -> Result<(), MigrationError> {
        write(tx, Probe::Touch, [true.into()]).await?;
        self.applied.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self, tx: &DatabaseTransaction) -> Result<(), MigrationError> {
        write(tx, Probe::Touch, [false.into()]).await?;
        self.rolled_back.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[test(tokio::test)]
async fn run_dispatches_on_direction() -> Result<(), anyhow::Error> {
    let db = mock().append_exec_results(executed(2)).into_connection();
    let step = ProbeStep::default();

    run(&db, &step, Direction::Apply).await?;
    assert!(step.applied.load(Ordering::SeqCst));
    assert!(!step.rolled_back.load(Ordering::SeqCst));

    run(&db, &step, Direction::Rollback).await?;
    assert!(step.rolled_back.load(Ordering::SeqCst));

    Ok(())
}

#[test(tokio::test)]
async fn run_propagates_the_failing_statement() {
    let db = mock()
        .append_exec_errors([DbErr::Custom("injected".into())])
        .into_connection();
    let step = ProbeStep::default();

    let err = run(&db, &step, Direction::Apply)
        .await
        .expect_err("must fail");

    assert!(matches!(err, MigrationError::Write { .. }));
    assert_eq!(err.statement(), Some("Touch"));
    assert!(!step.applied.load(Ordering::SeqCst));
}

#[test(tokio::test)]
async fn write_binds_values() -> Result<(), anyhow::Error> {
    let recorder = Recorder::new(mock().append_exec_results(executed(1)));

    let affected = write(&recorder, Probe::Touch, [true.into()]).await?;

    assert_eq!(affected, 1);
    assert_eq!(recorder.values(Probe::Touch), vec![vec![Value::from(true)]]);

    Ok(())
}

#[test]
fn direction_display() {
    assert_eq!(Direction::Apply.to_string(), "apply");
    assert_eq!(Direction::Rollback.to_string(), "rollback");
}

#[test]
fn migration_error_converts_into_db_err() {
    let err = MigrationError::Schema {
        statement: "Touch".into(),
        source: DbErr::Custom("boom".into()),
    };

    match DbErr::from(err) {
        DbErr::Migration(msg) => {
            assert!(msg.starts_with("schema alteration 'Touch' failed"));
            assert!(msg.contains("boom"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
