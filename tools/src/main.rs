//! remedy-server: tenant-scoped JSON HTTP API for the remediation-effect
//! simulation engine.
//!
//! Usage:
//!   remedy-server --db remedy.db --addr 127.0.0.1:8080
//!   remedy-server --db remedy.db --seed-demo
//!   remedy-server --config server.json

mod api;

use anyhow::Result;
use remedysim_core::action::{Action, NotificationChannel};
use remedysim_core::config::SimConfig;
use remedysim_core::engine::SimEngine;
use remedysim_core::error::SimError;
use remedysim_core::metrics::SeverityCounts;
use remedysim_core::playbook::{PlaybookConfig, PlaybookDraft};
use remedysim_core::store::SimStore;
use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or("remedy.db");
    let addr = flag_value(&args, "--addr").unwrap_or("127.0.0.1:8080");
    let seed_demo = args.iter().any(|a| a == "--seed-demo");

    let config = match flag_value(&args, "--config") {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };

    let store = SimStore::open(db)?;
    store.migrate()?;

    let engine = Arc::new(Mutex::new(SimEngine::new(store, config)));
    if seed_demo {
        seed_demo_data(&engine)?;
    }

    // Reconciliation sweep: a hard crash can leave runs `running`; anything
    // past the configured ceiling gets finalized as failed.
    {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(60));
            loop {
                ticker.tick().await;
                if let Err(e) = api::lock_engine(&engine).sweep_stale_runs() {
                    log::error!("stale-run sweep failed: {e}");
                }
            }
        });
    }

    let app = api::router(engine);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("remedy-server listening on {addr} (db: {db})");
    axum::serve(listener, app).await?;
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|pair| pair[0] == flag)
        .map(|pair| pair[1].as_str())
}

/// Seed a demo tenant with 30 days of plausible rollups and one playbook,
/// so the API is explorable out of the box. Deterministic on purpose.
fn seed_demo_data(engine: &api::SharedEngine) -> Result<()> {
    let engine = api::lock_engine(engine);
    engine.store.upsert_tenant("demo", "Demo Tenant")?;

    let today = chrono::Utc::now().date_naive();
    for back in 0..30u64 {
        let day = today - chrono::Days::new(back);
        let wave = back % 7;
        engine.store.insert_monitoring_rollup(
            "demo",
            day,
            SeverityCounts {
                critical: 1 + wave % 2,
                high: 4 + wave,
                medium: 18 + wave * 2,
                low: 11 + wave,
            },
            2 + wave / 2,
            9 + wave,
            24 + wave * 3,
            58.0 + wave as f64 * 1.5,
        )?;
        engine
            .store
            .insert_notification_rollup("demo", day, NotificationChannel::Email, 14 + wave)?;
        engine
            .store
            .insert_notification_rollup("demo", day, NotificationChannel::Slack, 8 + wave)?;
        engine
            .store
            .insert_notification_rollup("demo", day, NotificationChannel::Webhook, 2)?;
    }

    let draft = PlaybookDraft {
        name: "Quiet the noisy login rule".to_string(),
        description: Some("Disable the login-failure rule and mute email floods".to_string()),
        category: Some("noise-reduction".to_string()),
        config: PlaybookConfig {
            actions: vec![
                Action::DisableRule { rule_id: "rule-login-failures".to_string() },
                Action::SuppressNotificationChannel {
                    channel: NotificationChannel::Email,
                    duration_minutes: 240,
                },
            ],
            notes: None,
        },
    };
    match engine.create_playbook("demo", draft) {
        Ok(playbook) => log::info!("seeded demo playbook {}", playbook.playbook_id),
        // Re-seeding an existing database is fine; the playbook is already
        // there.
        Err(SimError::Conflict(_)) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
