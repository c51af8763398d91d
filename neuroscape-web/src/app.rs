//! Backdrop lifecycle: surface selection, input listeners and the frame loop

use std::cell::RefCell;
use std::rc::Rc;

use neuroscape_scene::frame::Renderer;
use neuroscape_scene::pointer::PointerSmoother;
use neuroscape_scene::{FrameUpdater, SceneConfig, SceneError, Viewport};
use tracing::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlCanvasElement, MouseEvent, Response, Window};

use crate::canvas2d::Canvas2DRenderer;
use crate::page::SharedPage;

/// Id of the full-window canvas behind the page
pub const CANVAS_ID: &str = "three-canvas";

pub fn to_js(err: SceneError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Fetch and parse a JSON scene configuration
pub async fn fetch_config(window: &Window, url: &str) -> Result<SceneConfig, JsValue> {
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "{url}: HTTP {}",
            response.status()
        )));
    }
    let text = JsFuture::from(response.text()?).await?;
    let text = text
        .as_string()
        .ok_or_else(|| JsValue::from_str("configuration body is not text"))?;
    SceneConfig::from_json_str(&text).map_err(to_js)
}

/// Window size and pixel ratio, capped at `max_pixel_ratio`
pub fn window_viewport(window: &Window, max_pixel_ratio: f32) -> Viewport {
    let size = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
    Viewport::new(
        size(window.inner_width()),
        size(window.inner_height()),
        window.device_pixel_ratio() as f32,
        max_pixel_ratio,
    )
}

fn find_canvas(window: &Window) -> Result<HtmlCanvasElement, SceneError> {
    window
        .document()
        .and_then(|d| d.get_element_by_id(CANVAS_ID))
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        .ok_or_else(|| SceneError::MissingSurface(format!("#{CANVAS_ID}")))
}

#[cfg(feature = "webgpu")]
async fn webgpu_renderer(
    canvas: &HtmlCanvasElement,
    viewport: Viewport,
) -> Option<Box<dyn Renderer>> {
    match crate::webgpu::WebGpuRenderer::new(canvas.clone(), viewport).await {
        Ok(renderer) => Some(Box::new(renderer)),
        Err(e) => {
            warn!(error = %e, "WebGPU unavailable, using Canvas 2D");
            None
        }
    }
}

#[cfg(not(feature = "webgpu"))]
async fn webgpu_renderer(
    _canvas: &HtmlCanvasElement,
    _viewport: Viewport,
) -> Option<Box<dyn Renderer>> {
    warn!("built without WebGPU support, using Canvas 2D");
    None
}

/// Pick a renderer for the canvas
async fn make_renderer(
    canvas: HtmlCanvasElement,
    viewport: Viewport,
    near: f32,
    use_webgpu: bool,
) -> Result<Box<dyn Renderer>, SceneError> {
    if use_webgpu {
        if let Some(renderer) = webgpu_renderer(&canvas, viewport).await {
            info!("rendering with WebGPU");
            return Ok(renderer);
        }
    }
    info!("rendering with Canvas 2D");
    Ok(Box::new(Canvas2DRenderer::new(canvas, viewport, near)?))
}

struct Visuals {
    updater: FrameUpdater,
    renderer: Box<dyn Renderer>,
}

/// Everything the frame loop touches
pub struct App {
    window: Window,
    visuals: Option<Visuals>,
    page: SharedPage,
    /// Drives the cursor glow when there is no scene to do it
    glow: PointerSmoother,
    max_pixel_ratio: f32,
}

impl App {
    /// Build the backdrop. A missing canvas only disables the visuals; the
    /// page effects keep running.
    pub async fn new(
        window: Window,
        config: &SceneConfig,
        page: SharedPage,
        use_webgpu: bool,
    ) -> Self {
        let max_pixel_ratio = config.camera.max_pixel_ratio;
        let viewport = window_viewport(&window, max_pixel_ratio);

        let visuals = match find_canvas(&window) {
            Ok(canvas) => {
                match make_renderer(canvas, viewport, config.camera.near, use_webgpu).await {
                    Ok(renderer) => {
                        let now = now_seconds(&window);
                        let updater = FrameUpdater::new(config, now, viewport);
                        let summary = updater.scene().summary(updater.signals());
                        info!(
                            nodes = summary.nodes,
                            edges = summary.edges,
                            particles = summary.particles,
                            "scene assembled"
                        );
                        Some(Visuals { updater, renderer })
                    }
                    Err(e) => {
                        warn!(error = %e, "backdrop disabled");
                        None
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "backdrop disabled");
                None
            }
        };

        Self {
            window,
            visuals,
            page,
            glow: PointerSmoother::new(config.motion.glow_smoothing),
            max_pixel_ratio,
        }
    }

    pub fn has_visuals(&self) -> bool {
        self.visuals.is_some()
    }

    fn pointer_moved(&mut self, client_x: f32, client_y: f32) {
        self.glow.set_raw(client_x, client_y);
        if let Some(v) = &mut self.visuals {
            v.updater.set_pointer(client_x, client_y);
        }
    }

    fn resized(&mut self) {
        let viewport = window_viewport(&self.window, self.max_pixel_ratio);
        if let Some(v) = &mut self.visuals {
            v.updater.resize(viewport, v.renderer.as_mut());
        }
    }

    fn frame(&mut self) {
        let glow = match &mut self.visuals {
            Some(v) => {
                let now = now_seconds(&self.window);
                v.updater.tick(now, v.renderer.as_mut()).cursor_glow
            }
            None => self.glow.tick(),
        };
        self.page.borrow_mut().tick(glow);
    }
}

fn now_seconds(window: &Window) -> f64 {
    window.performance().map(|p| p.now() / 1000.0).unwrap_or(0.0)
}

/// Hook up pointer and resize listeners, then start the animation loop
pub fn run(app: App) -> Result<(), JsValue> {
    let window = app.window.clone();
    let app = Rc::new(RefCell::new(app));

    {
        let app = app.clone();
        let on_move = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            app.borrow_mut()
                .pointer_moved(event.client_x() as f32, event.client_y() as f32);
        });
        window.add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())?;
        on_move.forget();
    }
    {
        let app = app.clone();
        let on_resize = Closure::<dyn FnMut()>::new(move || app.borrow_mut().resized());
        window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
        on_resize.forget();
    }

    // The callback re-registers itself, so it has to be reachable from inside
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    let loop_window = window.clone();
    *g.borrow_mut() = Some(Closure::new(move || {
        app.borrow_mut().frame();
        if let Some(callback) = f.borrow().as_ref() {
            if let Err(e) = loop_window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                warn!(error = ?e, "animation loop stopped");
            }
        }
    }));

    if let Some(callback) = g.borrow().as_ref() {
        window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    }
    Ok(())
}
