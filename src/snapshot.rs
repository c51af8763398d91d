use std::path::{Path, PathBuf};

use anyhow::Context;
use neuroscape_scene::scene::SceneSummary;
use neuroscape_scene::frame::FrameSummary;
use neuroscape_scene::{
    FrameUpdater, HeadlessRenderer, Scene, SceneAssembler, SceneConfig, Viewport,
};
use serde::Serialize;
use tracing::{debug, info};

/// File the page fetches its scene configuration from
pub const SITE_CONFIG_FILE: &str = "scene-config.json";

/// A generated scene, as written by `neuroscape generate`
#[derive(Debug, Serialize)]
pub struct SceneSnapshot {
    pub seed: Option<u64>,
    pub summary: SceneSummary,
    pub scene: Scene,
}

/// Load the configuration file if one was given, then apply the seed override
pub fn load_config(path: Option<&Path>, seed: Option<u64>) -> anyhow::Result<SceneConfig> {
    let mut config = match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene configuration {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(config)
}

pub fn generate(config: &SceneConfig) -> SceneSnapshot {
    let mut rng = config.rng();
    let (scene, signals) = SceneAssembler::assemble(config, &mut rng);
    SceneSnapshot {
        seed: config.seed,
        summary: scene.summary(&signals),
        scene,
    }
}

/// Serialize by extension: `.yaml`/`.yml` as YAML, anything else as JSON
pub fn write_snapshot(snapshot: &SceneSnapshot, output: &Path) -> anyhow::Result<()> {
    let yaml = matches!(
        output.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let text = if yaml {
        serde_yaml::to_string(snapshot)?
    } else {
        serde_json::to_string_pretty(snapshot)?
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, text).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

/// Run `frames` headless ticks at `fps` and hand each frame's summary to `emit`
pub fn simulate(
    config: &SceneConfig,
    frames: usize,
    fps: f64,
    mut emit: impl FnMut(usize, &FrameSummary) -> anyhow::Result<()>,
) -> anyhow::Result<HeadlessRenderer> {
    anyhow::ensure!(fps > 0.0, "--fps must be positive");
    let viewport = Viewport::default();
    let mut updater = FrameUpdater::new(config, 0.0, viewport);
    let mut renderer = HeadlessRenderer::default();

    // sweep the pointer across the window so the parallax is exercised
    for i in 1..=frames {
        let t = i as f32 / frames.max(1) as f32;
        updater.set_pointer(viewport.width * t, viewport.height * (1.0 - t));
        let frame = updater.tick(i as f64 / fps, &mut renderer);
        emit(i, &frame.summary())?;
    }
    debug!(frames = renderer.frames_rendered, "simulation finished");
    Ok(renderer)
}

/// Write the configuration the page fetches into `site`
pub fn write_site_config(config: &SceneConfig, site: &Path) -> anyhow::Result<PathBuf> {
    let path = site.join(SITE_CONFIG_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(config)?)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "scene configuration written");
    Ok(path)
}
