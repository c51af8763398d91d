//! Navbar, back-to-top button, mobile menu and in-page anchor scrolling

use tracing::warn;

use super::{ClickTarget, DomCommand, Effects, PageEvent, PageState, Target};

/// Scroll offset past which the navbar gets its solid background
pub const NAVBAR_SCROLLED_AFTER: f64 = 80.0;
/// A section counts as current once it is this close to the top
pub const SECTION_ACTIVATION_OFFSET: f64 = 200.0;
pub const BACK_TO_TOP_AFTER: f64 = 500.0;

#[derive(Debug, Default)]
pub struct NavState {
    pub scrolled: bool,
    pub active: Option<String>,
    pub back_to_top: bool,
    pub menu_open: bool,
}

/// Last section whose top, less the activation offset, is at or above `y`
pub fn active_section<'a>(sections: &'a [String], tops: &[f64], y: f64) -> Option<&'a str> {
    sections
        .iter()
        .zip(tops)
        .filter(|(_, top)| y >= *top - SECTION_ACTIVATION_OFFSET)
        .map(|(id, _)| id.as_str())
        .last()
}

pub fn on_layout(state: &mut PageState, event: &PageEvent, _fx: &mut Effects<'_>) {
    let PageEvent::Layout { section_tops } = event else {
        return;
    };
    if section_tops.len() != state.layout.sections.len() {
        warn!(
            measured = section_tops.len(),
            sections = state.layout.sections.len(),
            "section measurement does not match layout"
        );
    }
    state.section_tops = section_tops.clone();
}

/// Navbar background and active link highlighting.
///
/// Commands are only emitted when a class actually changes.
pub fn update_navbar(state: &mut PageState, event: &PageEvent, fx: &mut Effects<'_>) {
    let PageEvent::Scroll { y } = *event else {
        return;
    };

    let scrolled = y > NAVBAR_SCROLLED_AFTER;
    if scrolled != state.nav.scrolled {
        state.nav.scrolled = scrolled;
        fx.set_class(Target::Navbar, "scrolled", scrolled);
    }

    let active =
        active_section(&state.layout.sections, &state.section_tops, y).map(str::to_owned);
    if active == state.nav.active {
        return;
    }
    for (i, link) in state.layout.nav_links.iter().enumerate() {
        let was = state.nav.active.as_deref() == Some(link.as_str());
        let is = active.as_deref() == Some(link.as_str());
        if was != is {
            fx.set_class(Target::NavLink(i), "active", is);
        }
    }
    state.nav.active = active;
}

pub fn update_back_to_top(state: &mut PageState, event: &PageEvent, fx: &mut Effects<'_>) {
    let PageEvent::Scroll { y } = *event else {
        return;
    };
    let visible = y > BACK_TO_TOP_AFTER;
    if visible != state.nav.back_to_top {
        state.nav.back_to_top = visible;
        fx.set_class(Target::BackToTop, "visible", visible);
    }
}

pub fn on_click(state: &mut PageState, event: &PageEvent, fx: &mut Effects<'_>) {
    let PageEvent::Click(target) = event else {
        return;
    };

    match target {
        ClickTarget::MenuButton => {
            state.nav.menu_open = !state.nav.menu_open;
            set_menu(fx, state.nav.menu_open);
        }
        ClickTarget::NavLink(index) => {
            state.nav.menu_open = false;
            set_menu(fx, false);
            match state.layout.nav_links.get(*index) {
                Some(id) => scroll_to_anchor(state, id, fx),
                None => warn!(index, "click on unknown nav link"),
            }
        }
        ClickTarget::MenuLink(href) => {
            state.nav.menu_open = false;
            set_menu(fx, false);
            if href.starts_with('#') {
                scroll_to_anchor(state, href, fx);
            }
        }
        ClickTarget::BackToTop => fx.emit(DomCommand::ScrollTo { top: 0.0 }),
        ClickTarget::Anchor(id) => scroll_to_anchor(state, id, fx),
    }
}

fn set_menu(fx: &mut Effects<'_>, open: bool) {
    fx.set_class(Target::MenuButton, "open", open);
    fx.set_class(Target::NavLinks, "open", open);
}

fn scroll_to_anchor(state: &PageState, id: &str, fx: &mut Effects<'_>) {
    let id = id.trim_start_matches('#');
    if state.layout.has_target(id) {
        fx.emit(DomCommand::ScrollIntoView { id: id.to_owned() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomEffectsController, PageLayout};

    fn page() -> DomEffectsController {
        let mut page = DomEffectsController::new(PageLayout::default());
        page.dispatch(
            0.0,
            &PageEvent::Layout {
                section_tops: vec![0.0, 900.0, 1800.0, 2700.0, 3600.0],
            },
        );
        page
    }

    fn scroll(page: &mut DomEffectsController, y: f64) -> Vec<DomCommand> {
        page.dispatch(0.0, &PageEvent::Scroll { y })
    }

    fn class(target: Target, class: &'static str, enabled: bool) -> DomCommand {
        DomCommand::SetClass {
            target,
            class,
            enabled,
        }
    }

    #[test]
    fn active_section_is_last_reached() {
        let sections: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let tops = [0.0, 500.0, 1000.0];
        assert_eq!(active_section(&sections, &tops, 0.0), Some("a"));
        assert_eq!(active_section(&sections, &tops, 299.0), Some("a"));
        assert_eq!(active_section(&sections, &tops, 300.0), Some("b"));
        assert_eq!(active_section(&sections, &tops, 5000.0), Some("c"));
        assert_eq!(active_section(&sections, &[300.0], 50.0), None);
    }

    #[test]
    fn navbar_scrolled_threshold() {
        let mut page = page();
        assert!(!scroll(&mut page, 80.0).contains(&class(Target::Navbar, "scrolled", true)));
        assert!(scroll(&mut page, 81.0).contains(&class(Target::Navbar, "scrolled", true)));
        // unchanged state emits nothing for the navbar
        assert!(!scroll(&mut page, 120.0).iter().any(|c| matches!(
            c,
            DomCommand::SetClass {
                target: Target::Navbar,
                ..
            }
        )));
        assert!(scroll(&mut page, 0.0).contains(&class(Target::Navbar, "scrolled", false)));
    }

    #[test]
    fn active_link_moves_between_sections() {
        let mut page = page();
        let first = scroll(&mut page, 10.0);
        assert!(first.contains(&class(Target::NavLink(0), "active", true)));
        assert_eq!(page.state().active_section(), Some("home"));

        let second = scroll(&mut page, 750.0);
        assert!(second.contains(&class(Target::NavLink(0), "active", false)));
        assert!(second.contains(&class(Target::NavLink(1), "active", true)));
        assert_eq!(page.state().active_section(), Some("about"));
    }

    #[test]
    fn back_to_top_visibility_and_click() {
        let mut page = page();
        assert!(scroll(&mut page, 501.0).contains(&class(Target::BackToTop, "visible", true)));
        assert!(scroll(&mut page, 500.0).contains(&class(Target::BackToTop, "visible", false)));
        assert_eq!(
            page.dispatch(0.0, &PageEvent::Click(ClickTarget::BackToTop)),
            vec![DomCommand::ScrollTo { top: 0.0 }]
        );
    }

    #[test]
    fn menu_toggles_and_nav_link_closes_it() {
        let mut page = page();
        let open = page.dispatch(0.0, &PageEvent::Click(ClickTarget::MenuButton));
        assert_eq!(
            open,
            vec![
                class(Target::MenuButton, "open", true),
                class(Target::NavLinks, "open", true)
            ]
        );
        assert!(page.state().menu_open());

        let link = page.dispatch(0.0, &PageEvent::Click(ClickTarget::NavLink(4)));
        assert_eq!(
            link,
            vec![
                class(Target::MenuButton, "open", false),
                class(Target::NavLinks, "open", false),
                DomCommand::ScrollIntoView {
                    id: "contact".into()
                },
            ]
        );
        assert!(!page.state().menu_open());
    }

    #[test]
    fn any_menu_link_closes_the_menu() {
        let mut page = page();
        page.dispatch(0.0, &PageEvent::Click(ClickTarget::MenuButton));
        assert!(page.state().menu_open());

        let external = page.dispatch(
            0.0,
            &PageEvent::Click(ClickTarget::MenuLink("https://example.org/cv.pdf".into())),
        );
        assert_eq!(
            external,
            vec![
                class(Target::MenuButton, "open", false),
                class(Target::NavLinks, "open", false),
            ]
        );
        assert!(!page.state().menu_open());

        page.dispatch(0.0, &PageEvent::Click(ClickTarget::MenuButton));
        let local = page.dispatch(0.0, &PageEvent::Click(ClickTarget::MenuLink("#about".into())));
        assert_eq!(
            local,
            vec![
                class(Target::MenuButton, "open", false),
                class(Target::NavLinks, "open", false),
                DomCommand::ScrollIntoView { id: "about".into() },
            ]
        );
        assert!(!page.state().menu_open());
    }

    #[test]
    fn unknown_anchor_is_ignored() {
        let mut page = page();
        assert!(
            page.dispatch(0.0, &PageEvent::Click(ClickTarget::Anchor("#missing".into())))
                .is_empty()
        );
        assert_eq!(
            page.dispatch(0.0, &PageEvent::Click(ClickTarget::Anchor("#skills".into()))),
            vec![DomCommand::ScrollIntoView {
                id: "skills".into()
            }]
        );
    }
}
