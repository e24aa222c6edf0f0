//! Split the combined `name:version` identifier of a namespace into two columns.

use super::Sql;
use crate::{
    data::{alter, read, write},
    error::MigrationError,
};
use sea_orm::{ConnectionTrait, FromQueryResult};

/// The version assigned to namespaces whose name doesn't carry a version.
pub const UNKNOWN_VERSION: &str = "unknown";

#[derive(Debug, FromQueryResult)]
struct Namespace {
    id: i32,
    name: String,
}

#[derive(Debug, FromQueryResult)]
struct VersionedNamespace {
    id: i32,
    name: String,
    version: Option<String>,
}

/// Split an identifier into name and version.
///
/// Only an identifier of exactly two non-empty segments, separated by a single colon, is split.
/// Anything else is kept as name, with a version of [`UNKNOWN_VERSION`].
pub fn split(identifier: &str) -> (&str, &str) {
    match identifier.split_once(':') {
        Some((name, version))
            if !name.is_empty() && !version.is_empty() && !version.contains(':') =>
        {
            (name, version)
        }
        _ => (identifier, UNKNOWN_VERSION),
    }
}

/// Join name and version back into a single identifier.
pub fn join(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{name}:{version}"),
        None => name.to_string(),
    }
}

pub async fn apply<C: ConnectionTrait>(tx: &C) -> Result<(), MigrationError> {
    let namespaces: Vec<Namespace> = read(tx, Sql::ListNamespace).await?;

    alter(tx, Sql::AddNamespaceVersion).await?;

    let mut unknown = 0usize;
    for namespace in &namespaces {
        let (name, version) = split(&namespace.name);
        if version == UNKNOWN_VERSION && name == namespace.name {
            log::debug!("no version in namespace '{}'", namespace.name);
            unknown += 1;
        }

        write(
            tx,
            Sql::SplitNamespace,
            [namespace.id.into(), name.into(), version.into()],
        )
        .await?;
    }

    log::info!(
        "split {} namespaces, {unknown} without a version",
        namespaces.len()
    );

    Ok(())
}

pub async fn rollback<C: ConnectionTrait>(tx: &C) -> Result<(), MigrationError> {
    let namespaces: Vec<VersionedNamespace> = read(tx, Sql::ListVersionedNamespace).await?;

    alter(tx, Sql::DropNamespaceVersion).await?;

    for namespace in &namespaces {
        let name = join(&namespace.name, namespace.version.as_deref());
        write(tx, Sql::JoinNamespace, [namespace.id.into(), name.into()]).await?;
    }

    log::info!("joined {} namespaces", namespaces.len());

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::{
        Query,
        test::{Recorder, executed, mock, row},
    };
    use sea_orm::{DbErr, Value};
    use std::collections::BTreeMap;
    use test_log::test;

    #[test]
    fn split_name_and_version() {
        assert_eq!(split("abc:1"), ("abc", "1"));
        assert_eq!(split("debian:8"), ("debian", "8"));
        assert_eq!(split("centos:7.2"), ("centos", "7.2"));
    }

    #[test]
    fn split_without_exactly_one_separator() {
        for identifier in ["abc", "a:b:c", "", ":", ":1", "abc:", "a::b"] {
            assert_eq!(
                split(identifier),
                (identifier, UNKNOWN_VERSION),
                "identifier: {identifier:?}"
            );
        }
    }

    #[test]
    fn join_name_and_version() {
        assert_eq!(join("abc", Some("1")), "abc:1");
        assert_eq!(join("abc", Some(UNKNOWN_VERSION)), "abc:unknown");
        assert_eq!(join("abc", None), "abc");
    }

    #[test]
    fn split_then_join() {
        for identifier in ["abc:1", "xyz:1", "ubuntu:16.04"] {
            let (name, version) = split(identifier);
            assert_eq!(join(name, Some(version)), identifier);
        }
    }

    fn namespaces() -> Vec<BTreeMap<&'static str, Value>> {
        vec![
            row([("id", 1i32.into()), ("name", "abc:1".into())]),
            row([("id", 2i32.into()), ("name", "abc:2".into())]),
            row([("id", 3i32.into()), ("name", "legacy".into())]),
        ]
    }

    #[test(tokio::test)]
    async fn apply_reads_alters_then_writes() -> Result<(), anyhow::Error> {
        let tx = Recorder::new(
            mock()
                .append_query_results([namespaces()])
                .append_exec_results(executed(4)),
        );

        apply(&tx).await?;

        assert_eq!(tx.position(Sql::ListNamespace), Some(0));
        assert_eq!(tx.position(Sql::AddNamespaceVersion), Some(1));
        assert_eq!(tx.position(Sql::SplitNamespace), Some(2));
        let expected: Vec<Vec<Value>> = vec![
            vec![1i32.into(), "abc".into(), "1".into()],
            vec![2i32.into(), "abc".into(), "2".into()],
            vec![3i32.into(), "legacy".into(), UNKNOWN_VERSION.into()],
        ];
        assert_eq!(tx.values(Sql::SplitNamespace), expected);

        Ok(())
    }

    #[test(tokio::test)]
    async fn apply_aborts_on_failing_write() {
        let tx = Recorder::new(
            mock()
                .append_query_results([namespaces()])
                .append_exec_results(executed(2))
                .append_exec_errors([DbErr::Custom("injected".into())]),
        );

        let err = apply(&tx).await.expect_err("must fail");

        assert!(matches!(err, MigrationError::Write { .. }));
        assert_eq!(err.statement(), Some("SplitNamespace"));
        // the third namespace is never written
        assert_eq!(tx.values(Sql::SplitNamespace).len(), 2);
    }

    #[test(tokio::test)]
    async fn apply_aborts_on_failing_alter() {
        let tx = Recorder::new(
            mock()
                .append_query_results([namespaces()])
                .append_exec_errors([DbErr::Custom("column exists".into())]),
        );

        let err = apply(&tx).await.expect_err("must fail");

        assert!(matches!(err, MigrationError::Schema { .. }));
        assert_eq!(err.statement(), Some("AddNamespaceVersion"));
        assert!(tx.values(Sql::SplitNamespace).is_empty());
    }

    #[test(tokio::test)]
    async fn apply_without_namespaces() -> Result<(), anyhow::Error> {
        let tx = Recorder::new(
            mock()
                .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
                .append_exec_results(executed(1)),
        );

        apply(&tx).await?;

        assert_eq!(tx.statements().len(), 2);

        Ok(())
    }

    #[test(tokio::test)]
    async fn rollback_joins() -> Result<(), anyhow::Error> {
        let tx = Recorder::new(
            mock()
                .append_query_results([[
                    row([
                        ("id", 1i32.into()),
                        ("name", "abc".into()),
                        ("version", "1".into()),
                    ]),
                    row([
                        ("id", 2i32.into()),
                        ("name", "legacy".into()),
                        ("version", UNKNOWN_VERSION.into()),
                    ]),
                    row([
                        ("id", 3i32.into()),
                        ("name", "fresh".into()),
                        ("version", Value::String(None)),
                    ]),
                ]])
                .append_exec_results(executed(4)),
        );

        rollback(&tx).await?;

        assert_eq!(tx.position(Sql::ListVersionedNamespace), Some(0));
        assert_eq!(tx.position(Sql::DropNamespaceVersion), Some(1));
        let expected: Vec<Vec<Value>> = vec![
            vec![1i32.into(), "abc:1".into()],
            vec![2i32.into(), "legacy:unknown".into()],
            vec![3i32.into(), "fresh".into()],
        ];
        assert_eq!(tx.values(Sql::JoinNamespace), expected);

        Ok(())
    }

    #[test]
    fn statements_are_parameterized() {
        let stmt = Sql::SplitNamespace.statement(sea_orm::DbBackend::Postgres);
        assert!(stmt.values.is_none());
        assert!(stmt.sql.contains("$3"));
    }
}
