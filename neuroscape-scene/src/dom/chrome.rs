//! Preloader, profile image fallback and cursor glow

use tracing::debug;

use super::{DomCommand, Effects, PageEvent, PageState, Target, TimerAction};

/// How long the preloader stays up after the page has loaded
pub const PRELOADER_MS: f64 = 2000.0;
pub const STAGGER_START_MS: f64 = 200.0;
pub const STAGGER_STEP_MS: f64 = 150.0;

pub fn on_load(_state: &mut PageState, _event: &PageEvent, fx: &mut Effects<'_>) {
    fx.after(PRELOADER_MS, TimerAction::HidePreloader);
}

pub(super) fn hide_preloader(state: &mut PageState, fx: &mut Effects<'_>) {
    fx.set_class(Target::Preloader, "hidden", true);
    for i in 0..state.layout.stagger_count {
        fx.after(
            STAGGER_START_MS + i as f64 * STAGGER_STEP_MS,
            TimerAction::AddClass {
                target: Target::StaggerItem(i),
                class: "visible",
            },
        );
    }
}

pub fn on_image_error(state: &mut PageState, _event: &PageEvent, fx: &mut Effects<'_>) {
    if state.avatar_replaced {
        return;
    }
    debug!("profile image failed, showing initial");
    state.avatar_replaced = true;
    fx.emit(DomCommand::ShowFallbackAvatar {
        initial: state.layout.profile_initial,
    });
}

pub fn on_cursor_glow(_state: &mut PageState, event: &PageEvent, fx: &mut Effects<'_>) {
    let PageEvent::CursorGlow { x, y } = *event else {
        return;
    };
    fx.emit(DomCommand::MoveTo {
        target: Target::CursorGlow,
        left: x,
        top: y,
    });
}
