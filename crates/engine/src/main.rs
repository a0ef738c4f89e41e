//! CoC7 Engine - world migration entry point.
//!
//! Loads a world directory, runs the update gate and, when a migration is
//! offered and accepted, migrates the world and saves it back.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coc7_engine::infrastructure::{
    clock::SystemClock,
    config::MigrationConfig,
    memory::InMemoryWorld,
    ports::ClockPort,
    settings::SqliteSettingsRepo,
    world_dir::WorldDirectory,
};
use coc7_engine::use_cases::{MigrationOptions, UpdateDecision};
use coc7_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root.
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coc7_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MigrationConfig::from_env()?;
    tracing::info!(
        world = %config.world_dir.display(),
        system = %config.system_id,
        dry_run = config.dry_run,
        "Starting CoC7 migration"
    );

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);

    let world_dir = WorldDirectory::new(&config.world_dir);
    let host = world_dir.load_host().await?;
    let world = Arc::new(InMemoryWorld::from_state(world_dir.load().await?));
    let settings =
        Arc::new(SqliteSettingsRepo::new(&config.settings_db.to_string_lossy(), clock).await?);

    let app = App::new(
        world.clone(),
        world.clone(),
        settings,
        Arc::new(host),
        &config.system_id,
    )?;

    match app.use_cases.migration.check.execute().await? {
        UpdateDecision::UpToDate => {
            tracing::info!("World data is up to date");
            return Ok(());
        }
        UpdateDecision::GmRequired { version } => {
            tracing::warn!(
                %version,
                "World data needs migrating, but only a game master may run it"
            );
            return Ok(());
        }
        UpdateDecision::OfferMigration { version, modules } => {
            for module in &modules {
                tracing::info!(
                    package = %module.package,
                    title = %module.title,
                    version = %module.version,
                    "Module compendium content needs migrating"
                );
            }
            if !config.auto_migrate && !config.dry_run {
                tracing::warn!(
                    %version,
                    "World data needs migrating; set COC7_AUTO_MIGRATE=true to run it, \
                     and back up the world first"
                );
                return Ok(());
            }
        }
    }

    let report = app
        .use_cases
        .migration
        .migrate
        .execute(MigrationOptions {
            dry_run: config.dry_run,
        })
        .await?;

    for failure in &report.failures {
        tracing::warn!(
            scope = %failure.scope,
            document_id = %failure.id,
            document_name = %failure.name,
            error = %failure.message,
            "Document was not migrated"
        );
    }
    for skipped in &report.skipped_rules {
        tracing::warn!(
            document_id = %skipped.document_id,
            rule = %skipped.rule,
            reason = %skipped.reason,
            "Rule skipped"
        );
    }

    if config.dry_run {
        tracing::info!(
            report = %serde_json::to_string_pretty(&report)?,
            "Dry run finished, nothing was written"
        );
        return Ok(());
    }

    world_dir.save(&world.snapshot().await).await?;
    if report.is_clean() {
        tracing::info!(%report, "System migration finished");
    } else {
        tracing::warn!(%report, "System migration finished with errors");
    }
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
