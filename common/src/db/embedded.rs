use crate::{config, db::Database};
use anyhow::Context;
use postgresql_embedded::{PostgreSQL, Settings, VersionReq};
use std::{path::Path, time::Duration};
use tracing::{Instrument, info_span};

/// Create common default settings for the embedded database
fn default_settings() -> anyhow::Result<Settings> {
    let version = VersionReq::parse("=17.2.0").context("valid psql version")?;
    Ok(Settings {
        version,
        username: "postgres".to_string(),
        password: "layerdb".to_string(),
        temporary: true,
        ..Default::default()
    })
}

async fn start(settings: Settings) -> anyhow::Result<PostgreSQL> {
    async {
        let mut postgresql = PostgreSQL::new(settings);
        postgresql
            .setup()
            .await
            .context("Setting up the embedded database")?;
        postgresql
            .start()
            .await
            .context("Starting the embedded database")?;
        Ok::<_, anyhow::Error>(postgresql)
    }
    .instrument(info_span!("start database"))
    .await
}

/// Create a new, temporary embedded database instance, bootstrapped as database `test`.
pub async fn create() -> anyhow::Result<(Database, PostgreSQL)> {
    let postgresql = start(default_settings()?).await?;

    let config = config::Database {
        username: "postgres".into(),
        password: "layerdb".into(),
        host: "localhost".into(),
        name: "test".into(),
        port: postgresql.settings().port,
        url: None,
        ..config::Database::from_env()?
    };
    let db = Database::bootstrap(&config)
        .await
        .context("Bootstrapping the embedded database")?;

    Ok((db, postgresql))
}

/// Run a persistent embedded database instance in `base`.
///
/// The credentials and database name are taken from `database`, its port is updated to the one
/// of the running instance. A fresh instance is bootstrapped, an existing one only connected to.
pub async fn managed(
    base: impl AsRef<Path>,
    database: &mut config::Database,
) -> anyhow::Result<(Database, PostgreSQL)> {
    let base = base.as_ref();
    let data_dir = base.join("data");
    let fresh = !data_dir.join("PG_VERSION").exists();

    let postgresql = start(Settings {
        data_dir,
        installation_dir: base.join("instance"),
        username: database.username.clone(),
        password: database.password.clone(),
        temporary: false,
        timeout: Some(Duration::from_secs(30)),
        ..default_settings()?
    })
    .await?;

    database.host = "localhost".into();
    database.port = postgresql.settings().port;
    database.url = None;

    log::info!(
        "embedded database in {}, running on port {}",
        base.display(),
        database.port
    );

    let db = if fresh {
        Database::bootstrap(database).await
    } else {
        Database::new(database).await
    }
    .context("Connecting to the embedded database")?;

    Ok((db, postgresql))
}
