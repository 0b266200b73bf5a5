//! Generate static files

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::generator::Generator;
use crate::{Site, CONFIG_FILE};

/// Quiet period before a burst of file events triggers a rebuild
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Generate the static site
pub fn run(site: &Site) -> Result<()> {
    let start = Instant::now();

    let stats = Generator::new(site)?.generate()?;

    tracing::info!(
        "Generated {} pages, {} posts ({} listed), {} static files in {:.2}s",
        stats.pages,
        stats.posts,
        stats.listed,
        stats.assets,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Watch the site sources and regenerate on change
pub async fn watch(site: &Site) -> Result<()> {
    let site = site.clone();
    tokio::task::spawn_blocking(move || watch_changes(&site, || {})).await?
}

/// Block, regenerating after each debounced batch of changes
///
/// `on_generated` runs after every successful rebuild. A batch that touches
/// `_config.yml` reloads the configuration first.
pub fn watch_changes<F: FnMut()>(site: &Site, mut on_generated: F) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(DEBOUNCE, tx)?;

    for dir in [&site.posts_dir, &site.pages_dir, &site.static_dir] {
        if dir.exists() {
            debouncer.watcher().watch(dir, RecursiveMode::Recursive)?;
            tracing::debug!("Watching: {:?}", dir);
        }
    }

    let config_path = site.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let mut site = site.clone();
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let paths: Vec<PathBuf> = events.into_iter().map(|e| e.path).collect();
                let Some(reload_config) = plan_rebuild(&paths) else {
                    continue;
                };

                for path in paths.iter().filter(|p| is_relevant(p)) {
                    tracing::info!("File changed: {}", path.display());
                }

                if reload_config {
                    match Site::new(&site.base_dir) {
                        Ok(reloaded) => site = reloaded,
                        Err(e) => tracing::error!("Failed to reload config: {}", e),
                    }
                }

                match run(&site) {
                    Ok(()) => on_generated(),
                    Err(e) => tracing::error!("Generation failed: {}", e),
                }
            }
            Ok(Err(e)) => tracing::error!("Watch error: {:?}", e),
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// What a batch of changed paths calls for: `None` when nothing relevant
/// changed, otherwise whether the configuration must be reloaded
fn plan_rebuild(paths: &[PathBuf]) -> Option<bool> {
    let relevant: Vec<&PathBuf> = paths.iter().filter(|p| is_relevant(p)).collect();
    if relevant.is_empty() {
        return None;
    }
    Some(relevant.iter().any(|p| p.ends_with(CONFIG_FILE)))
}

/// Editor swap files and VCS internals never trigger a rebuild
fn is_relevant(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    !path_str.contains(".git")
        && !path_str.contains(".DS_Store")
        && !path_str.ends_with('~')
        && !path_str.ends_with(".swp")
}
