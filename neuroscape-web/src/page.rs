//! Binds the page effects controller to the live document
//!
//! Elements are looked up once, wrapped as [`Target`]s, and every browser
//! event is forwarded as a [`PageEvent`]. The commands coming back are
//! applied here and nowhere else.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use neuroscape_scene::dom::{
    ClickTarget, DomCommand, DomEffectsController, ElementKey, FormFields, Observed, PageEvent,
    PageLayout, Target,
};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CssStyleDeclaration, Document, Element, Event, EventTarget, HtmlButtonElement, HtmlElement,
    HtmlFormElement, HtmlInputElement, HtmlTextAreaElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition, ScrollToOptions, Window,
};

/// Attribute carrying an observed element's key back from the observer
const KEY_ATTR: &str = "data-neuroscape-key";
const AVATAR_GRADIENT: &str = "linear-gradient(135deg, #6c63ff 0%, #00d4aa 100%)";

/// Inline styles for the photo wrapper once the image failed to load
const AVATAR_WRAPPER_STYLE: &[(&str, &str)] = &[
    ("background", AVATAR_GRADIENT),
    ("display", "flex"),
    ("align-items", "center"),
    ("justify-content", "center"),
    ("font-size", "4rem"),
    ("border-radius", "16px"),
];

/// Inline styles for the initial shown in place of the photo
const AVATAR_LETTER_STYLE: &[(&str, &str)] = &[
    ("color", "#ffffff"),
    ("font-size", "5rem"),
    ("font-family", "Space Grotesk, sans-serif"),
    ("font-weight", "700"),
];

/// Observer slots: reveals use their own margins, rings and counters share one
const REVEAL_OBSERVER: usize = 0;
const HALF_OBSERVER: usize = 1;

/// The effects controller plus the elements its targets resolve to
pub struct PageBinding {
    window: Window,
    document: Document,
    controller: DomEffectsController,
    targets: HashMap<Target, Element>,
    sections: Vec<HtmlElement>,
    observed: Vec<(Element, usize)>,
    observers: Vec<IntersectionObserver>,
}

pub type SharedPage = Rc<RefCell<PageBinding>>;

impl PageBinding {
    /// Read the layout from the document and wire every listener
    pub fn bind(window: Window, document: Document) -> Result<SharedPage, JsValue> {
        let layout = read_layout(&document)?;
        debug!(
            sections = layout.sections.len(),
            nav_links = layout.nav_links.len(),
            phrases = layout.phrases.len(),
            "page layout"
        );

        let mut targets = HashMap::new();
        for (id, target) in [
            ("navbar", Target::Navbar),
            ("mobile-menu-btn", Target::MenuButton),
            ("back-to-top", Target::BackToTop),
            ("typing-text", Target::TypingText),
            ("form-status", Target::FormStatus),
            ("submit-btn", Target::SubmitButton),
            ("preloader", Target::Preloader),
            ("cursor-glow", Target::CursorGlow),
        ] {
            if let Some(el) = document.get_element_by_id(id) {
                targets.insert(target, el);
            }
        }
        if let Some(el) = document.query_selector(".nav-links")? {
            targets.insert(Target::NavLinks, el);
        }
        for (i, el) in select_all(&document, ".nav-link[data-section]")?.into_iter().enumerate() {
            targets.insert(Target::NavLink(i), el);
        }
        for (i, el) in select_all(&document, ".stagger-item")?.into_iter().enumerate() {
            targets.insert(Target::StaggerItem(i), el);
        }

        let sections = select_all(&document, ".section")?
            .into_iter()
            .filter_map(|el| el.dyn_into::<HtmlElement>().ok())
            .collect();

        let page = Rc::new(RefCell::new(PageBinding {
            window: window.clone(),
            document: document.clone(),
            controller: DomEffectsController::new(layout),
            targets,
            sections,
            observed: Vec::new(),
            observers: Vec::new(),
        }));

        let observers = vec![
            make_observer(&page, Observed::reveal(0.0))?,
            make_observer(&page, Observed::ring(0.0))?,
        ];
        page.borrow_mut().observers = observers;
        register_observed(&page, &document)?;
        register_listeners(&page, &window, &document)?;

        dispatch(&page, PageEvent::Ready);
        Ok(page)
    }

    fn now(&self) -> f64 {
        self.window.performance().map(|p| p.now()).unwrap_or(0.0)
    }

    /// Per-frame pump: move the cursor glow and fire due timers
    pub fn tick(&mut self, glow: (f32, f32)) {
        let now = self.now();
        let mut commands = self
            .controller
            .dispatch(now, &PageEvent::CursorGlow { x: glow.0, y: glow.1 });
        commands.extend(self.controller.advance(now));
        self.apply(commands);
    }

    fn section_tops(&self) -> Vec<f64> {
        self.sections.iter().map(|s| s.offset_top() as f64).collect()
    }

    fn target(&self, target: &Target) -> Option<&Element> {
        let el = self.targets.get(target);
        if el.is_none() {
            debug!(?target, "target not on page");
        }
        el
    }

    fn apply(&mut self, commands: Vec<DomCommand>) {
        for command in commands {
            if let Err(e) = self.apply_one(command) {
                warn!(error = ?e, "failed to apply page command");
            }
        }
    }

    fn apply_one(&mut self, command: DomCommand) -> Result<(), JsValue> {
        match command {
            DomCommand::SetClass {
                target,
                class,
                enabled,
            } => {
                if let Some(el) = self.target(&target) {
                    el.class_list().toggle_with_force(class, enabled)?;
                }
            }
            DomCommand::SetClassName { target, class_name } => {
                if let Some(el) = self.target(&target) {
                    el.set_class_name(class_name);
                }
            }
            DomCommand::SetText { target, text } => {
                if let Some(el) = self.target(&target) {
                    el.set_text_content(Some(&text));
                }
            }
            DomCommand::SetStyle {
                target,
                property,
                value,
            } => {
                if let Some(el) = self.target(&target) {
                    style_of(el)?.set_property(property, &value)?;
                }
            }
            DomCommand::SetDisabled { target, disabled } => {
                if let Some(button) = self
                    .target(&target)
                    .and_then(|el| el.dyn_ref::<HtmlButtonElement>())
                {
                    button.set_disabled(disabled);
                }
            }
            DomCommand::MoveTo { target, left, top } => {
                if let Some(el) = self.target(&target) {
                    let style = style_of(el)?;
                    style.set_property("left", &format!("{left}px"))?;
                    style.set_property("top", &format!("{top}px"))?;
                }
            }
            DomCommand::ResetForm => {
                if let Some(form) = self
                    .document
                    .get_element_by_id("contact-form")
                    .and_then(|el| el.dyn_into::<HtmlFormElement>().ok())
                {
                    form.reset();
                }
            }
            DomCommand::ScrollTo { top } => {
                let options = ScrollToOptions::new();
                options.set_top(top);
                options.set_behavior(ScrollBehavior::Smooth);
                self.window.scroll_to_with_scroll_to_options(&options);
            }
            DomCommand::ScrollIntoView { id } => {
                if let Some(el) = self.document.get_element_by_id(&id) {
                    let options = ScrollIntoViewOptions::new();
                    options.set_behavior(ScrollBehavior::Smooth);
                    options.set_block(ScrollLogicalPosition::Start);
                    el.scroll_into_view_with_scroll_into_view_options(&options);
                }
            }
            DomCommand::Unobserve(ElementKey(key)) => {
                if let Some((el, slot)) = self.observed.get(key) {
                    if let Some(observer) = self.observers.get(*slot) {
                        observer.unobserve(el);
                    }
                }
            }
            DomCommand::ShowFallbackAvatar { initial } => self.show_fallback_avatar(initial)?,
        }
        Ok(())
    }

    fn show_fallback_avatar(&self, initial: char) -> Result<(), JsValue> {
        let Some(img) = self.document.get_element_by_id("profile-img") else {
            return Ok(());
        };
        style_of(&img)?.set_property("display", "none")?;
        let Some(wrapper) = img.parent_element() else {
            return Ok(());
        };

        apply_style(&wrapper, AVATAR_WRAPPER_STYLE)?;

        let letter = self.document.create_element("div")?;
        letter.set_text_content(Some(&initial.to_string()));
        apply_style(&letter, AVATAR_LETTER_STYLE)?;
        wrapper.prepend_with_node_1(&letter)?;
        Ok(())
    }
}

/// Forward one event through the controller and apply what comes back
pub fn dispatch(page: &SharedPage, event: PageEvent) {
    let mut page = page.borrow_mut();
    let now = page.now();
    let commands = page.controller.dispatch(now, &event);
    page.apply(commands);
}

/// `style` works for SVG elements too, which `HtmlElement::style` does not
fn style_of(el: &Element) -> Result<CssStyleDeclaration, JsValue> {
    js_sys::Reflect::get(el, &JsValue::from_str("style"))?.dyn_into()
}

fn apply_style(el: &Element, properties: &[(&str, &str)]) -> Result<(), JsValue> {
    let style = style_of(el)?;
    for (name, value) in properties {
        style.set_property(name, value)?;
    }
    Ok(())
}

fn select_all(document: &Document, selector: &str) -> Result<Vec<Element>, JsValue> {
    let list = document.query_selector_all(selector)?;
    Ok((0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

fn attr_f64(el: &Element, name: &str) -> Option<f64> {
    el.get_attribute(name)
        .and_then(|v| v.trim().parse::<f64>().ok())
}

fn read_layout(document: &Document) -> Result<PageLayout, JsValue> {
    let defaults = PageLayout::default();

    let sections = select_all(document, ".section")?
        .iter()
        .map(|el| el.id())
        .collect();
    let nav_links = select_all(document, ".nav-link[data-section]")?
        .iter()
        .filter_map(|el| el.get_attribute("data-section"))
        .collect();
    let anchor_targets = select_all(document, "a[href^=\"#\"]")?
        .iter()
        .filter_map(|el| el.get_attribute("href"))
        .map(|href| href.trim_start_matches('#').to_string())
        .filter(|id| !id.is_empty() && document.get_element_by_id(id).is_some())
        .collect();

    let phrases = document
        .get_element_by_id("typing-text")
        .and_then(|el| el.get_attribute("data-phrases"))
        .and_then(|raw| match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(phrases) => Some(phrases),
            Err(e) => {
                warn!(error = %e, "ignoring malformed data-phrases");
                None
            }
        })
        .unwrap_or(defaults.phrases);

    let profile_initial = document
        .get_element_by_id("profile-img")
        .and_then(|el| el.get_attribute("data-initial"))
        .and_then(|s| s.chars().next())
        .unwrap_or(defaults.profile_initial);

    Ok(PageLayout {
        sections,
        nav_links,
        anchor_targets,
        phrases,
        stagger_count: select_all(document, ".stagger-item")?.len(),
        profile_initial,
    })
}

fn make_observer(page: &SharedPage, kind: Observed) -> Result<IntersectionObserver, JsValue> {
    let options = kind.options();
    let init = IntersectionObserverInit::new();
    init.set_threshold(&JsValue::from_f64(options.threshold));
    init.set_root_margin(options.root_margin);

    let page = page.clone();
    let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
        move |entries: js_sys::Array, _observer: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if !entry.is_intersecting() {
                    continue;
                }
                let key = entry
                    .target()
                    .get_attribute(KEY_ATTR)
                    .and_then(|k| k.parse::<usize>().ok());
                if let Some(key) = key {
                    dispatch(&page, PageEvent::Visible(ElementKey(key)));
                }
            }
        },
    );
    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
    // observers live as long as the page
    callback.forget();
    Ok(observer)
}

fn register_observed(page: &SharedPage, document: &Document) -> Result<(), JsValue> {
    let mut binding = page.borrow_mut();
    let binding = &mut *binding;

    let mut watch = |el: Element, style_target: Element, observed: Observed, slot: usize| {
        let key = binding.controller.observe(observed);
        el.set_attribute(KEY_ATTR, &key.0.to_string())?;
        if let Some(observer) = binding.observers.get(slot) {
            observer.observe(&el);
        }
        binding.targets.insert(Target::Element(key), style_target);
        binding.observed.push((el, slot));
        Ok::<(), JsValue>(())
    };

    for el in select_all(document, ".reveal")? {
        let delay = attr_f64(&el, "data-delay").unwrap_or(0.0);
        watch(el.clone(), el, Observed::reveal(delay), REVEAL_OBSERVER)?;
    }
    for el in select_all(document, ".skill-ring[data-percent]")? {
        let percent = attr_f64(&el, "data-percent").unwrap_or(0.0);
        let fill = el.query_selector(".ring-fill")?.unwrap_or_else(|| el.clone());
        watch(el, fill, Observed::ring(percent), HALF_OBSERVER)?;
    }
    for el in select_all(document, ".stat-number[data-count]")? {
        let count = attr_f64(&el, "data-count").unwrap_or(0.0);
        watch(el.clone(), el, Observed::counter(count), HALF_OBSERVER)?;
    }
    debug!(observed = binding.observed.len(), "visibility observers attached");
    Ok(())
}

/// Attach `handler` for `event` on `target`; listeners live as long as the page
fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn read_field(document: &Document, id: &str) -> String {
    let Some(el) = document.get_element_by_id(id) else {
        return String::new();
    };
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        area.value()
    } else {
        String::new()
    }
}

fn register_listeners(page: &SharedPage, window: &Window, document: &Document) -> Result<(), JsValue> {
    {
        let page = page.clone();
        let win = window.clone();
        listen(window, "scroll", move |_: Event| {
            let section_tops = page.borrow().section_tops();
            dispatch(&page, PageEvent::Layout { section_tops });
            let y = win.scroll_y().unwrap_or(0.0);
            dispatch(&page, PageEvent::Scroll { y });
        })?;
    }
    {
        let page = page.clone();
        listen(window, "load", move |_: Event| {
            dispatch(&page, PageEvent::Load);
        })?;
    }

    if let Some(button) = document.get_element_by_id("mobile-menu-btn") {
        let page = page.clone();
        listen(&button, "click", move |_: Event| {
            dispatch(&page, PageEvent::Click(ClickTarget::MenuButton));
        })?;
    }
    if let Some(button) = document.get_element_by_id("back-to-top") {
        let page = page.clone();
        listen(&button, "click", move |_: Event| {
            dispatch(&page, PageEvent::Click(ClickTarget::BackToTop));
        })?;
    }

    for (i, link) in select_all(document, ".nav-link[data-section]")?.into_iter().enumerate() {
        let page = page.clone();
        listen(&link, "click", move |event: Event| {
            event.prevent_default();
            dispatch(&page, PageEvent::Click(ClickTarget::NavLink(i)));
        })?;
    }
    // every menu entry closes the mobile menu, section links included above
    for link in select_all(document, ".nav-links .nav-link:not([data-section])")? {
        let page = page.clone();
        let href = link.get_attribute("href").unwrap_or_default();
        listen(&link, "click", move |event: Event| {
            if href.starts_with('#') {
                event.prevent_default();
            }
            dispatch(&page, PageEvent::Click(ClickTarget::MenuLink(href.clone())));
        })?;
    }
    for anchor in select_all(document, "a[href^=\"#\"]")? {
        if anchor.class_list().contains("nav-link") {
            continue;
        }
        let page = page.clone();
        let href = anchor.get_attribute("href").unwrap_or_default();
        listen(&anchor, "click", move |event: Event| {
            event.prevent_default();
            dispatch(&page, PageEvent::Click(ClickTarget::Anchor(href.clone())));
        })?;
    }

    if let Some(form) = document.get_element_by_id("contact-form") {
        let page = page.clone();
        let doc = document.clone();
        listen(&form, "submit", move |event: Event| {
            event.prevent_default();
            let fields = FormFields {
                name: read_field(&doc, "name"),
                email: read_field(&doc, "email"),
                message: read_field(&doc, "message"),
            };
            dispatch(&page, PageEvent::Submit(fields));
        })?;
    }

    if let Some(img) = document.get_element_by_id("profile-img") {
        let page = page.clone();
        listen(&img, "error", move |_: Event| {
            dispatch(&page, PageEvent::ImageError);
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(style: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
        style.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    #[test]
    fn fallback_avatar_wrapper_is_a_rounded_gradient_tile() {
        assert_eq!(value(AVATAR_WRAPPER_STYLE, "background"), Some(AVATAR_GRADIENT));
        assert_eq!(value(AVATAR_WRAPPER_STYLE, "display"), Some("flex"));
        assert_eq!(value(AVATAR_WRAPPER_STYLE, "font-size"), Some("4rem"));
        assert_eq!(value(AVATAR_WRAPPER_STYLE, "border-radius"), Some("16px"));
    }

    #[test]
    fn fallback_avatar_letter_is_large_and_bold() {
        assert_eq!(value(AVATAR_LETTER_STYLE, "font-size"), Some("5rem"));
        assert_eq!(value(AVATAR_LETTER_STYLE, "font-weight"), Some("700"));
        assert_eq!(value(AVATAR_LETTER_STYLE, "color"), Some("#ffffff"));
    }
}
