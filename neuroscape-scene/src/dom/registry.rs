//! Event kind to handler table

use std::collections::HashMap;

use super::{Effects, EventKind, PageEvent, PageState, chrome, form, nav, observe, typing};

/// A page event handler. Handlers mutate page state and push commands or
/// timers; they run synchronously in registration order.
pub type Handler = fn(&mut PageState, &PageEvent, &mut Effects<'_>);

#[derive(Default)]
pub struct EventRegistry {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl EventRegistry {
    /// Registry wired with every built-in page behaviour
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry
            .on(EventKind::Ready, typing::on_ready)
            .on(EventKind::Load, chrome::on_load)
            .on(EventKind::Layout, nav::on_layout)
            .on(EventKind::Scroll, nav::update_navbar)
            .on(EventKind::Scroll, nav::update_back_to_top)
            .on(EventKind::Visible, observe::on_visible)
            .on(EventKind::Click, nav::on_click)
            .on(EventKind::Submit, form::on_submit)
            .on(EventKind::ImageError, chrome::on_image_error)
            .on(EventKind::CursorGlow, chrome::on_cursor_glow);
        registry
    }

    pub fn on(&mut self, kind: EventKind, handler: Handler) -> &mut Self {
        self.handlers.entry(kind).or_default().push(handler);
        self
    }

    pub fn handlers(&self, kind: EventKind) -> &[Handler] {
        self.handlers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomCommand, DomEffectsController, PageLayout, Target};

    fn shout(_: &mut PageState, _: &PageEvent, fx: &mut Effects<'_>) {
        fx.emit(DomCommand::SetText {
            target: Target::TypingText,
            text: "scrolled".into(),
        });
    }

    #[test]
    fn defaults_cover_every_kind() {
        let registry = EventRegistry::with_defaults();
        for kind in [
            EventKind::Ready,
            EventKind::Load,
            EventKind::Layout,
            EventKind::Visible,
            EventKind::Click,
            EventKind::Submit,
            EventKind::ImageError,
            EventKind::CursorGlow,
        ] {
            assert_eq!(registry.handlers(kind).len(), 1, "{kind:?}");
        }
        assert_eq!(registry.handlers(EventKind::Scroll).len(), 2);
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn custom_handler_runs_after_defaults() {
        let mut registry = EventRegistry::with_defaults();
        registry.on(EventKind::Scroll, shout);
        let mut page = DomEffectsController::with_registry(PageLayout::default(), registry);

        let commands = page.dispatch(0.0, &PageEvent::Scroll { y: 100.0 });
        assert_eq!(
            commands.first(),
            Some(&DomCommand::SetClass {
                target: Target::Navbar,
                class: "scrolled",
                enabled: true
            })
        );
        assert!(matches!(commands.last(), Some(DomCommand::SetText { .. })));
    }

    #[test]
    fn empty_registry() {
        let registry = EventRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.handlers(EventKind::Load).is_empty());
    }
}
