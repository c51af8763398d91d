//! Page effects as host-independent state machines
//!
//! The host (the browser binding in `neuroscape-web`, or a test) feeds
//! [`PageEvent`]s into a [`DomEffectsController`] and applies the
//! [`DomCommand`]s it gets back. Delays are entries in a [`TimerQueue`]
//! drained by [`DomEffectsController::advance`], so the whole page behaviour
//! can be driven with a synthetic clock.

pub mod chrome;
pub mod form;
pub mod nav;
pub mod observe;
pub mod registry;
pub mod timers;
pub mod typing;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use form::{ContactForm, FormError, FormFields};
pub use observe::{ObserverOptions, Observed, StatCounter};
pub use registry::{EventRegistry, Handler};
pub use timers::{TimerAction, TimerQueue};
pub use typing::Typewriter;

/// Handle for an element registered for visibility observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementKey(pub usize);

/// Page elements a command can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Element(ElementKey),
    Navbar,
    NavLinks,
    NavLink(usize),
    MenuButton,
    BackToTop,
    TypingText,
    FormStatus,
    SubmitButton,
    Preloader,
    StaggerItem(usize),
    CursorGlow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickTarget {
    MenuButton,
    NavLink(usize),
    /// Menu link without a section, carrying its `href`
    MenuLink(String),
    BackToTop,
    /// In-page link to `#id`
    Anchor(String),
}

/// Something that happened in the host page
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// Script start; the typing loop begins here
    Ready,
    /// All page resources loaded
    Load,
    /// Measured `offsetTop` of each section, parallel to [`PageLayout::sections`]
    Layout { section_tops: Vec<f64> },
    Scroll { y: f64 },
    /// An observed element crossed its visibility threshold
    Visible(ElementKey),
    Click(ClickTarget),
    Submit(FormFields),
    /// The profile image failed to load
    ImageError,
    /// Smoothed cursor position for this animation frame, client pixels
    CursorGlow { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Load,
    Layout,
    Scroll,
    Visible,
    Click,
    Submit,
    ImageError,
    CursorGlow,
}

impl PageEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PageEvent::Ready => EventKind::Ready,
            PageEvent::Load => EventKind::Load,
            PageEvent::Layout { .. } => EventKind::Layout,
            PageEvent::Scroll { .. } => EventKind::Scroll,
            PageEvent::Visible(_) => EventKind::Visible,
            PageEvent::Click(_) => EventKind::Click,
            PageEvent::Submit(_) => EventKind::Submit,
            PageEvent::ImageError => EventKind::ImageError,
            PageEvent::CursorGlow { .. } => EventKind::CursorGlow,
        }
    }
}

/// A DOM mutation for the host to apply
#[derive(Debug, Clone, PartialEq)]
pub enum DomCommand {
    SetClass {
        target: Target,
        class: &'static str,
        enabled: bool,
    },
    /// Replace the whole `className`
    SetClassName {
        target: Target,
        class_name: &'static str,
    },
    SetText {
        target: Target,
        text: String,
    },
    SetStyle {
        target: Target,
        property: &'static str,
        value: String,
    },
    SetDisabled {
        target: Target,
        disabled: bool,
    },
    /// Place a fixed-position element at client coordinates
    MoveTo {
        target: Target,
        left: f32,
        top: f32,
    },
    ResetForm,
    ScrollTo {
        top: f64,
    },
    ScrollIntoView {
        id: String,
    },
    Unobserve(ElementKey),
    ShowFallbackAvatar {
        initial: char,
    },
}

/// Static description of the page the effects run on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    /// Section ids in document order
    pub sections: Vec<String>,
    /// `data-section` of each nav link
    pub nav_links: Vec<String>,
    /// Other ids that in-page links may point at
    pub anchor_targets: Vec<String>,
    pub phrases: Vec<String>,
    pub stagger_count: usize,
    pub profile_initial: char,
}

impl Default for PageLayout {
    fn default() -> Self {
        let sections: Vec<String> = ["home", "about", "skills", "projects", "contact"]
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            nav_links: sections.clone(),
            sections,
            anchor_targets: Vec::new(),
            phrases: [
                "Generative AI Developer",
                "LLM Engineer",
                "NLP Specialist",
                "Voice AI Builder",
                "Deep Learning Enthusiast",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            stagger_count: 0,
            profile_initial: 'N',
        }
    }
}

impl PageLayout {
    /// Whether `#id` resolves to an element on the page
    pub fn has_target(&self, id: &str) -> bool {
        self.sections.iter().chain(&self.anchor_targets).any(|s| s == id)
    }
}

/// Mutable page state shared by the handlers
#[derive(Debug)]
pub struct PageState {
    layout: PageLayout,
    section_tops: Vec<f64>,
    observed: Vec<Observed>,
    counters: HashMap<ElementKey, StatCounter>,
    nav: nav::NavState,
    typing: Option<Typewriter>,
    form: ContactForm,
    avatar_replaced: bool,
}

impl PageState {
    fn new(layout: PageLayout) -> Self {
        Self {
            typing: Typewriter::new(&layout.phrases),
            layout,
            section_tops: Vec::new(),
            observed: Vec::new(),
            counters: HashMap::new(),
            nav: nav::NavState::default(),
            form: ContactForm::default(),
            avatar_replaced: false,
        }
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn observed(&self, key: ElementKey) -> Option<&Observed> {
        self.observed.get(key.0)
    }

    pub fn counter(&self, key: ElementKey) -> Option<&StatCounter> {
        self.counters.get(&key)
    }

    pub fn menu_open(&self) -> bool {
        self.nav.menu_open
    }

    pub fn active_section(&self) -> Option<&str> {
        self.nav.active.as_deref()
    }

    pub fn is_sending(&self) -> bool {
        self.form.sending
    }
}

/// Output channels available to a handler
pub struct Effects<'a> {
    /// Time the handler runs at; delays are relative to this
    pub now_ms: f64,
    commands: &'a mut Vec<DomCommand>,
    timers: &'a mut TimerQueue,
}

impl Effects<'_> {
    pub fn emit(&mut self, command: DomCommand) {
        self.commands.push(command);
    }

    pub fn set_class(&mut self, target: Target, class: &'static str, enabled: bool) {
        self.emit(DomCommand::SetClass {
            target,
            class,
            enabled,
        });
    }

    /// Run `action` after `delay_ms`
    pub fn after(&mut self, delay_ms: f64, action: TimerAction) {
        self.timers.schedule(self.now_ms + delay_ms, action);
    }
}

pub struct DomEffectsController {
    state: PageState,
    registry: EventRegistry,
    timers: TimerQueue,
}

impl DomEffectsController {
    pub fn new(layout: PageLayout) -> Self {
        Self::with_registry(layout, EventRegistry::with_defaults())
    }

    pub fn with_registry(layout: PageLayout, registry: EventRegistry) -> Self {
        Self {
            state: PageState::new(layout),
            registry,
            timers: TimerQueue::default(),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Register an element for visibility observation
    pub fn observe(&mut self, observed: Observed) -> ElementKey {
        let key = ElementKey(self.state.observed.len());
        self.state.observed.push(observed);
        key
    }

    /// Run every handler registered for the event's kind
    pub fn dispatch(&mut self, now_ms: f64, event: &PageEvent) -> Vec<DomCommand> {
        let mut commands = Vec::new();
        let mut effects = Effects {
            now_ms,
            commands: &mut commands,
            timers: &mut self.timers,
        };
        for handler in self.registry.handlers(event.kind()) {
            handler(&mut self.state, event, &mut effects);
        }
        commands
    }

    /// Fire every timer due at or before `now_ms`, in due order.
    ///
    /// Each action runs at its own due time, so follow-up timers keep their
    /// cadence even when the host polls late.
    pub fn advance(&mut self, now_ms: f64) -> Vec<DomCommand> {
        let mut commands = Vec::new();
        while let Some(timer) = self.timers.pop_due(now_ms) {
            let mut effects = Effects {
                now_ms: timer.due_ms,
                commands: &mut commands,
                timers: &mut self.timers,
            };
            run_timer(&mut self.state, timer.action, &mut effects);
        }
        commands
    }

    /// Due time of the next pending timer, if any
    pub fn next_due(&self) -> Option<f64> {
        self.timers.next_due()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

fn run_timer(state: &mut PageState, action: TimerAction, fx: &mut Effects<'_>) {
    match action {
        TimerAction::AddClass { target, class } => fx.set_class(target, class, true),
        TimerAction::TypingStep => typing::step(state, fx),
        TimerAction::CounterTick(key) => observe::counter_tick(state, key, fx),
        TimerAction::HidePreloader => chrome::hide_preloader(state, fx),
        TimerAction::FinishSubmission => form::finish_submission(state, fx),
        TimerAction::ClearStatus => form::clear_status(fx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kinds_match_variants() {
        assert_eq!(PageEvent::Scroll { y: 1.0 }.kind(), EventKind::Scroll);
        assert_eq!(
            PageEvent::Click(ClickTarget::BackToTop).kind(),
            EventKind::Click
        );
        assert_eq!(PageEvent::ImageError.kind(), EventKind::ImageError);
    }

    #[test]
    fn layout_deserializes_partially() {
        let layout: PageLayout =
            serde_json::from_str(r#"{"phrases": ["One"], "stagger_count": 3}"#).unwrap();
        assert_eq!(layout.phrases, vec!["One"]);
        assert_eq!(layout.stagger_count, 3);
        assert_eq!(layout.profile_initial, 'N');
        assert!(layout.has_target("contact"));
        assert!(!layout.has_target("nowhere"));
    }

    #[test]
    fn empty_registry_ignores_events() {
        let mut page = DomEffectsController::with_registry(
            PageLayout::default(),
            EventRegistry::default(),
        );
        assert!(page.dispatch(0.0, &PageEvent::Scroll { y: 900.0 }).is_empty());
        assert!(page.dispatch(0.0, &PageEvent::Load).is_empty());
        assert_eq!(page.pending_timers(), 0);
    }

    #[test]
    fn late_advance_fires_timers_in_order() {
        let mut page = DomEffectsController::new(PageLayout {
            stagger_count: 2,
            ..PageLayout::default()
        });
        page.dispatch(0.0, &PageEvent::Load);
        let commands = page.advance(10_000.0);
        assert_eq!(
            commands,
            vec![
                DomCommand::SetClass {
                    target: Target::Preloader,
                    class: "hidden",
                    enabled: true
                },
                DomCommand::SetClass {
                    target: Target::StaggerItem(0),
                    class: "visible",
                    enabled: true
                },
                DomCommand::SetClass {
                    target: Target::StaggerItem(1),
                    class: "visible",
                    enabled: true
                },
            ]
        );
        assert_eq!(page.next_due(), None);
    }
}
