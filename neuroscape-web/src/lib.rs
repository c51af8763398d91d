//! Browser front end for the neuroscape backdrop
//!
//! This crate provides WASM bindings that run the animated 3D backdrop on
//! the page's canvas and drive the portfolio page effects.

mod app;
mod canvas2d;
mod logging;
mod page;
#[cfg(feature = "webgpu")]
mod webgpu;

use neuroscape_scene::SceneConfig;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;

pub use app::{App, CANVAS_ID};
pub use canvas2d::Canvas2DRenderer;
pub use page::PageBinding;
#[cfg(feature = "webgpu")]
pub use webgpu::WebGpuRenderer;

/// Initialize WASM panic hook and console logging
///
/// The log level comes from `<html data-log-level="debug">`, default `info`.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let level = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.document_element())
        .and_then(|el| el.get_attribute("data-log-level"));
    logging::init(logging::parse_level(level.as_deref()));
}

/// Check if WebGPU is supported in the current browser
#[wasm_bindgen]
pub fn check_webgpu_support() -> bool {
    web_sys::window()
        .map(|w| js_sys::Reflect::has(&w.navigator(), &JsValue::from_str("gpu")).unwrap_or(false))
        .unwrap_or(false)
}

/// Start the page effects and the backdrop
///
/// `config_url` points at a JSON scene configuration; without one, or when
/// it cannot be loaded, the built-in defaults are used.
#[wasm_bindgen]
pub async fn start(config_url: Option<String>, use_webgpu: bool) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let config = match config_url {
        Some(url) => match app::fetch_config(&window, &url).await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = ?e, url = %url, "using default scene configuration");
                SceneConfig::default()
            }
        },
        None => SceneConfig::default(),
    };
    launch(window, config, use_webgpu).await
}

/// Start with an inline JSON configuration instead of a URL
#[wasm_bindgen]
pub async fn start_with_config(config_json: String, use_webgpu: bool) -> Result<(), JsValue> {
    let config = SceneConfig::from_json_str(&config_json).map_err(app::to_js)?;
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    launch(window, config, use_webgpu).await
}

async fn launch(
    window: web_sys::Window,
    config: SceneConfig,
    use_webgpu: bool,
) -> Result<(), JsValue> {
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // page effects come first so they run even without a canvas
    let page = PageBinding::bind(window.clone(), document)?;
    let app = App::new(window, &config, page, use_webgpu && check_webgpu_support()).await;
    info!(visuals = app.has_visuals(), "neuroscape started");
    app::run(app)
}
