//! `UserAction` dispatch. Kept as free functions over `&KneeboardState`
//! rather than inherent methods so the match arms read as one table.
use apievent::UserAction;
use view::Bookmark;

use crate::error::StateError;
use crate::KneeboardState;

const BRIGHTNESS_STEP: f32 = 0.1;

pub fn dispatch(state: &KneeboardState, action: UserAction) -> Result<(), StateError> {
    match action {
        UserAction::PreviousBookmark => step_bookmark(state, -1)?,
        UserAction::NextBookmark => step_bookmark(state, 1)?,
        UserAction::ToggleBookmark => toggle_bookmark(state)?,
        UserAction::PreviousTab => state.step_active_tab(-1),
        UserAction::NextTab => state.step_active_tab(1),
        UserAction::PreviousPage => with_active_tab(state, |tab| tab.view.previous_page())?,
        UserAction::NextPage => with_active_tab(state, |tab| tab.view.next_page())?,
        UserAction::PreviousProfile => state.step_profile(-1)?,
        UserAction::NextProfile => state.step_profile(1)?,
        UserAction::ToggleVisibility => state.set_visible(!state.is_visible()),
        UserAction::ToggleForceZoom => state.toggle_force_zoom(),
        UserAction::SwitchKneeboards => state.switch_kneeboards(),
        UserAction::RecenterVR => state.recenter_vr(),
        UserAction::Hide => state.set_visible(false),
        UserAction::Show => state.set_visible(true),
        UserAction::CycleActiveView => state.cycle_active_view(),
        UserAction::SwapFirstTwoViews => state.swap_first_two_views(),
        UserAction::RepaintNow => {}
        UserAction::EnableTint => state.set_tint(true),
        UserAction::DisableTint => state.set_tint(false),
        UserAction::ToggleTint => state.set_tint(!state.is_tint_enabled()),
        UserAction::IncreaseBrightness => state.adjust_brightness(BRIGHTNESS_STEP),
        UserAction::DecreaseBrightness => state.adjust_brightness(-BRIGHTNESS_STEP),
    }
    state.mark_needs_repaint();
    Ok(())
}

fn with_active_tab(state: &KneeboardState, f: impl FnOnce(&crate::tabs::TabEntry)) -> Result<(), StateError> {
    let tabs = state.tabs.lock().unwrap();
    let index = state.active_tab_index();
    let entry = tabs.by_index(index as u32)?;
    f(entry);
    Ok(())
}

fn step_bookmark(state: &KneeboardState, delta: i32) -> Result<(), StateError> {
    with_active_tab(state, |entry| {
        let page_id = entry.view.current_page_id();
        let bookmarks = state.bookmarks.lock().unwrap();
        let target = if delta < 0 {
            bookmarks.previous(entry.id, page_id)
        } else {
            bookmarks.next(entry.id, page_id)
        };
        if let Some(bookmark) = target {
            entry.view.set_page_id(bookmark.page_id);
        }
    })
}

fn toggle_bookmark(state: &KneeboardState) -> Result<(), StateError> {
    with_active_tab(state, |entry| {
        let page_id = entry.view.current_page_id();
        state
            .bookmarks
            .lock()
            .unwrap()
            .toggle(Bookmark::new(entry.id, page_id));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::PixelSize;
    use pagesource::FolderPageSource;
    use view::TabView;

    fn sample_state() -> std::sync::Arc<KneeboardState> {
        let state = KneeboardState::new(settings::KneeboardSettings::default());
        let view = TabView::new(FolderPageSource::new(vec![
            PixelSize::new(800, 600),
            PixelSize::new(800, 600),
        ]));
        state.tabs.lock().unwrap().add("Checklist", view);
        state
    }

    #[test]
    fn next_page_advances_the_active_tab() {
        let state = sample_state();
        let first_page = {
            let tabs = state.tabs.lock().unwrap();
            tabs.by_index(0).unwrap().view.current_page_id()
        };
        dispatch(&state, UserAction::NextPage).unwrap();
        let second_page = {
            let tabs = state.tabs.lock().unwrap();
            tabs.by_index(0).unwrap().view.current_page_id()
        };
        assert_ne!(first_page, second_page);
        assert!(state.needs_repaint());
    }

    #[test]
    fn toggle_bookmark_then_previous_bookmark_returns_to_it() {
        let state = sample_state();
        dispatch(&state, UserAction::ToggleBookmark).unwrap();
        dispatch(&state, UserAction::NextPage).unwrap();
        dispatch(&state, UserAction::PreviousBookmark).unwrap();

        let tabs = state.tabs.lock().unwrap();
        let entry = tabs.by_index(0).unwrap();
        assert!(state
            .bookmarks
            .lock()
            .unwrap()
            .contains(entry.id, entry.view.current_page_id()));
    }

    #[test]
    fn recenter_vr_bumps_the_wire_recenter_count() {
        let state = sample_state();
        let before = state.vr_settings().recenter_count;
        dispatch(&state, UserAction::RecenterVR).unwrap();
        assert_eq!(state.vr_settings().recenter_count, before + 1);
    }

    #[test]
    fn toggle_force_zoom_flips_both_runtime_and_wire_state() {
        let state = sample_state();
        assert!(!state.vr_settings().force_zoom);
        dispatch(&state, UserAction::ToggleForceZoom).unwrap();
        assert!(state.vr_settings().force_zoom);
    }

    #[test]
    fn brightness_clamps_to_the_unit_range() {
        let state = sample_state();
        for _ in 0..20 {
            dispatch(&state, UserAction::IncreaseBrightness).unwrap();
        }
        assert_eq!(state.brightness(), 1.0);
        for _ in 0..20 {
            dispatch(&state, UserAction::DecreaseBrightness).unwrap();
        }
        assert_eq!(state.brightness(), 0.0);
    }

    #[test]
    fn hide_then_show_round_trips_visibility() {
        let state = sample_state();
        dispatch(&state, UserAction::Hide).unwrap();
        assert!(!state.is_visible());
        dispatch(&state, UserAction::Show).unwrap();
        assert!(state.is_visible());
    }
}
