use std::path::{Path, PathBuf};

use axum::Router;
use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tower_http::services::ServeDir;
use tower_livereload::LiveReloadLayer;
use tracing::{error, info};

use crate::snapshot;

/// Re-read the scene configuration and publish it into the site
fn republish(config: Option<&Path>, site: &Path) -> anyhow::Result<()> {
    let scene = snapshot::load_config(config, None)?;
    snapshot::write_site_config(&scene, site)?;
    Ok(())
}

/// Whether a watcher event touched `path`
fn touches(event: &Event, path: &Path) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event.paths.iter().any(|p| p.ends_with(path))
}

/// Serve `site` with live reload, republishing `config` whenever it changes
pub async fn serve(site: &Path, config: Option<&Path>, port: u16) -> anyhow::Result<()> {
    anyhow::ensure!(site.is_dir(), "site directory {} not found", site.display());

    republish(config, site)?;

    // Create channel for config change notifications
    let (tx, mut rx) = mpsc::channel::<()>(1);

    let config_watcher = match config {
        Some(config) => {
            let watched = config.canonicalize().unwrap_or_else(|_| config.to_path_buf());
            let file_name = PathBuf::from(watched.file_name().unwrap_or_default());
            let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
                if let Ok(event) = res {
                    // siblings, including the published copy, are ignored
                    if touches(&event, &file_name) {
                        let _ = tx.blocking_send(());
                    }
                }
            })?;

            let watch_path = watched
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

            let config = config.to_path_buf();
            let site = site.to_path_buf();
            tokio::spawn(async move {
                while rx.recv().await.is_some() {
                    // Debounce: wait a bit for rapid changes to settle
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    while rx.try_recv().is_ok() {}

                    match republish(Some(&config), &site) {
                        Ok(()) => info!("scene configuration republished"),
                        // the previous configuration stays in place
                        Err(e) => error!("error reloading configuration: {e:#}"),
                    }
                }
            });
            Some(watcher)
        }
        None => None,
    };

    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    // Any change under the site reloads the browser
    let mut site_watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if event.kind.is_modify() || event.kind.is_create() {
                reloader.reload();
            }
        }
    })?;
    site_watcher.watch(site, RecursiveMode::Recursive)?;

    let app = Router::new()
        .fallback_service(ServeDir::new(site))
        .layer(livereload);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("development server running at http://localhost:{port}");
    if let Some(config) = config {
        info!("watching {} for changes", config.display());
    }
    println!("Press Ctrl+C to stop");

    // Keep watchers alive
    let _config_watcher = config_watcher;
    let _site_watcher = site_watcher;

    axum::serve(listener, app).await?;

    Ok(())
}
