//! Courseware server entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use courseware::app::{build_server_with_state, hasher_from_config, AppState};
use courseware::config::{ConfigLoader, CoursewareConfig};
use courseware::seed::SeedData;
use courseware::server::ShutdownSignal;
use courseware::store::InMemoryStore;

const CONFIG_ENV: &str = "COURSEWARE_CONFIG";
const DEFAULT_CONFIG: &str = "courseware.toml";
const ENV_PREFIX: &str = "COURSEWARE";

/// Where to read configuration from.
enum ConfigSource {
    /// Named explicitly; must exist.
    Required(PathBuf),
    /// The default file; skipped when absent.
    Optional(PathBuf),
}

fn config_source() -> ConfigSource {
    if let Some(path) = std::env::args().nth(1) {
        return ConfigSource::Required(PathBuf::from(path));
    }
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.is_empty() => ConfigSource::Required(PathBuf::from(path)),
        _ => ConfigSource::Optional(PathBuf::from(DEFAULT_CONFIG)),
    }
}

fn load_config() -> anyhow::Result<CoursewareConfig> {
    let loader = ConfigLoader::new().with_dotenv();
    let loader = match config_source() {
        ConfigSource::Required(path) => loader
            .with_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        ConfigSource::Optional(path) => loader.with_optional_file(&path)?,
    };
    Ok(loader.with_env_prefix(ENV_PREFIX).load()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("invalid configuration")?;

    courseware::telemetry::init_telemetry(&config.telemetry.to_telemetry_config())
        .context("failed to initialize logging")?;

    let store = Arc::new(InMemoryStore::new());
    let hasher = hasher_from_config(&config).context("invalid hash parameters")?;

    if let Some(seed_file) = &config.store.seed_file {
        let summary = SeedData::from_file(seed_file)
            .await?
            .apply(store.as_ref(), &hasher)
            .await
            .with_context(|| format!("seeding from {seed_file}"))?;
        info!(
            seed_file = %seed_file,
            users = summary.users,
            courses = summary.courses,
            "store seeded"
        );
    }

    let state = AppState::new(store, hasher);
    let server = build_server_with_state(&config, &state);

    info!(
        addr = %config.server.http_addr,
        log_errors = config.errors.log_errors,
        "starting courseware"
    );
    server
        .run_with_shutdown(ShutdownSignal::with_os_signals())
        .await
        .context("server error")?;

    info!("courseware stopped");
    Ok(())
}
