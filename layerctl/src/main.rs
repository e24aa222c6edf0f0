use anyhow::Context;
use layerdb_common::{config::Database, db};
use std::{
    path::PathBuf,
    process::{ExitCode, Termination},
};
use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Manage the schema migrations
    #[command(subcommand)]
    Migrate(Migrate),
    /// Drop and re-create the database, then apply all migrations
    Bootstrap,
}

#[derive(clap::Subcommand, Debug)]
pub enum Migrate {
    /// Apply pending migrations
    Up {
        /// Number of migrations to apply, all pending ones if not set
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        /// Number of migrations to roll back
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Roll back all migrations, then apply them again
    Refresh,
    /// Show applied and pending migrations
    Status,
}

#[derive(clap::Parser, Debug)]
#[command(
    author,
    version = env!("CARGO_PKG_VERSION"),
    about = "layerctl",
    long_about = None
)]
pub struct Layerctl {
    #[command(subcommand)]
    pub(crate) command: Command,

    /// Run against an embedded database, persisted in this directory
    #[arg(long, env = "LAYERDB_EMBEDDED")]
    pub embedded: Option<PathBuf>,

    #[command(flatten)]
    pub database: Database,
}

impl Layerctl {
    async fn run(self) -> ExitCode {
        match self.run_command().await {
            Ok(code) => code,
            Err(err) => {
                log::error!("Error: {err}");
                for (n, err) in err.chain().skip(1).enumerate() {
                    if n == 0 {
                        log::error!("Caused by:");
                    }
                    log::error!("\t{err}");
                }

                ExitCode::FAILURE
            }
        }
    }

    async fn run_command(mut self) -> anyhow::Result<ExitCode> {
        // to keep in scope while running.
        let mut managed = None;

        let db = match &self.embedded {
            Some(base) => {
                let (db, postgresql) = db::embedded::managed(base, &mut self.database).await?;
                managed.replace(postgresql);
                Some(db)
            }
            None => None,
        };

        let db = match (self.command, db) {
            (Command::Bootstrap, _) => db::Database::bootstrap(&self.database).await?,
            (Command::Migrate(migrate), db) => {
                let db = match db {
                    Some(db) => db,
                    None => db::Database::new(&self.database)
                        .await
                        .context("connecting to the database")?,
                };
                migrate.run(&db).await?;
                db
            }
        };

        db.close().await?;

        if let Some(postgresql) = managed {
            postgresql.stop().await?;
        }

        Ok(ExitCode::SUCCESS)
    }
}

impl Migrate {
    async fn run(self, db: &db::Database) -> anyhow::Result<()> {
        match self {
            Self::Up { steps } => db.migrate(steps).await?,
            Self::Down { steps } => db.rollback(Some(steps)).await?,
            Self::Refresh => db.refresh().await?,
            Self::Status => {
                for name in db.applied().await? {
                    println!("applied  {name}");
                }
                for name in db.pending().await? {
                    println!("pending  {name}");
                }
            }
        }

        Ok(())
    }
}

fn init_log() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .try_init()
        .context("error initializing logging")?;

    Ok(())
}

#[tokio::main]
async fn main() -> impl Termination {
    use clap::Parser;

    if let Err(err) = init_log() {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    Layerctl::parse().run().await
}
