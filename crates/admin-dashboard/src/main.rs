use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use admin_dashboard::config::{Config, View};
use admin_dashboard::error::AppError;
use admin_dashboard::pages::emergencies::EmergenciesPage;
use admin_dashboard::pages::guides::GuidesPage;
use admin_dashboard::pages::health_alerts::HealthAlertsPage;
use admin_dashboard::pages::units::UnitsPage;
use admin_dashboard::pages::users::UsersPage;
use dashboard_common::api::DashboardApi;
use dashboard_common::memory::{InMemoryApi, Snapshot};
use dashboard_common::notify::{LogNotifier, Notifier};
use guide_editor::EditorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the JSON page, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting admin-dashboard");

    let config = Config::from_env()?;
    info!(
        snapshot = %config.snapshot_path.display(),
        view = %config.view,
        "configuration loaded"
    );

    let raw = std::fs::read_to_string(&config.snapshot_path).map_err(|e| {
        AppError::Snapshot(format!("{}: {e}", config.snapshot_path.display()))
    })?;
    let snapshot = Snapshot::from_json(&raw).map_err(|e| AppError::Snapshot(e.to_string()))?;
    info!(
        users = snapshot.users.len(),
        emergencies = snapshot.emergencies.len(),
        units = snapshot.emergency_units.len(),
        guides = snapshot.guides.len(),
        alerts = snapshot.health_alerts.len(),
        "snapshot loaded"
    );

    let api: Arc<dyn DashboardApi> = Arc::new(InMemoryApi::new(snapshot));
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let now = Utc::now();

    let output = match config.view {
        View::Users => {
            let mut page = UsersPage::new(api, notifier);
            ensure_loaded(page.load(now).await, config.view)?;
            *page.list.query_mut() = config.query.clone();
            page.list.go_to_page(config.page, now);
            json!({
                "view": config.view.as_str(),
                "page": page.list.page(now),
                "pendingVerifications": page.pending_verifications().len(),
            })
        }
        View::Emergencies => {
            let mut page = EmergenciesPage::new(api, notifier);
            ensure_loaded(page.load(now).await, config.view)?;
            *page.list.query_mut() = config.query.clone();
            page.list.go_to_page(config.page, now);
            json!({
                "view": config.view.as_str(),
                "page": page.list.page(now),
                "typeOptions": page.type_options(),
            })
        }
        View::Units => {
            let mut page = UnitsPage::new(api, notifier);
            ensure_loaded(page.load(now).await, config.view)?;
            *page.list.query_mut() = config.query.clone();
            page.list.go_to_page(config.page, now);
            json!({
                "view": config.view.as_str(),
                "page": page.list.page(now),
                "stats": page.stats(),
                "serviceOptions": page.service_options(),
            })
        }
        View::Guides => {
            let mut page = GuidesPage::new(api, notifier, EditorConfig::from_env());
            ensure_loaded(page.load(now).await, config.view)?;
            *page.list.query_mut() = config.query.clone();
            page.list.go_to_page(config.page, now);
            json!({
                "view": config.view.as_str(),
                "page": page.list.page(now),
            })
        }
        View::Alerts => {
            let mut page = HealthAlertsPage::new(api, notifier);
            ensure_loaded(page.load(now).await, config.view)?;
            *page.list.query_mut() = config.query.clone();
            page.list.go_to_page(config.page, now);
            let schedule = page.load_schedule(now).await.clone();
            json!({
                "view": config.view.as_str(),
                "page": page.list.page(now),
                "activeCount": page.active_count(),
                "schedule": schedule,
                "nextRunIn": page.next_run_countdown(now),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn ensure_loaded(loaded: bool, view: View) -> anyhow::Result<()> {
    if loaded {
        Ok(())
    } else {
        anyhow::bail!("failed to load {view}")
    }
}
