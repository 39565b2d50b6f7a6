//! `KneeboardState`: the orchestrator tying every
//! other component together. Owns the long-lived singletons, dispatches
//! `UserAction`s to view or settings mutation, and drains the ordered
//! APIEvent queue with a per-frame time budget.
pub mod dispatch;
pub mod error;
pub mod tabs;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use std::collections::VecDeque;

use apievent::{decode_builtin, decode_multi_event, BuiltinEvent, EventQueue, EVT_MULTI_EVENT};
use event::{Event, EventReceiver};
use settings::KneeboardSettings;
use utils::{log, timing::TimingManager};
use vr::VRKneeboard;

pub use error::StateError;
pub use tabs::{TabEntry, TabList};

/// How long one `drain_ordered_events` call is allowed to run before
/// yielding the rest of the queue to the next frame. Matches the
/// original engine's frame budget of a fraction of a 60Hz frame.
pub const ORDERED_EVENT_FRAME_BUDGET_MS: u64 = 8;

pub struct KneeboardState {
    settings: Mutex<KneeboardSettings>,
    tabs: Mutex<TabList>,
    bookmarks: Mutex<view::BookmarkList>,
    active_tab_index: Mutex<usize>,
    vr: Arc<VRKneeboard>,
    vr_settings: Mutex<shm::VRSettings>,
    needs_repaint: AtomicBool,
    visible: AtomicBool,
    tint_enabled: AtomicBool,
    brightness: Mutex<f32>,
    view_order: Mutex<Vec<usize>>,
    active_view_position: Mutex<usize>,
    pub profile_changed: Arc<Event<String>>,
    _receiver: EventReceiver,
}

impl KneeboardState {
    pub fn new(settings: KneeboardSettings) -> Arc<Self> {
        let vr_settings = shm::VRSettings {
            force_zoom: settings.vr.force_zoom,
            gaze_input_focus: settings.vr.gaze_input_focus,
            ..Default::default()
        };
        Arc::new(KneeboardState {
            settings: Mutex::new(settings),
            tabs: Mutex::new(TabList::new()),
            bookmarks: Mutex::new(view::BookmarkList::new()),
            active_tab_index: Mutex::new(0),
            vr: Arc::new(VRKneeboard::new()),
            vr_settings: Mutex::new(vr_settings),
            needs_repaint: AtomicBool::new(true),
            visible: AtomicBool::new(true),
            tint_enabled: AtomicBool::new(false),
            brightness: Mutex::new(1.0),
            view_order: Mutex::new(vec![0]),
            active_view_position: Mutex::new(0),
            profile_changed: Event::new(),
            _receiver: EventReceiver::new(),
        })
    }

    pub fn vr(&self) -> &Arc<VRKneeboard> {
        &self.vr
    }

    pub fn vr_settings(&self) -> shm::VRSettings {
        *self.vr_settings.lock().unwrap()
    }

    pub fn with_settings<R>(&self, f: impl FnOnce(&KneeboardSettings) -> R) -> R {
        f(&self.settings.lock().unwrap())
    }

    pub fn tabs(&self) -> &Mutex<TabList> {
        &self.tabs
    }

    pub fn bookmarks(&self) -> &Mutex<view::BookmarkList> {
        &self.bookmarks
    }

    pub fn active_tab_index(&self) -> usize {
        *self.active_tab_index.lock().unwrap()
    }

    /// `IsRepaintNeeded()`.
    pub fn needs_repaint(&self) -> bool {
        self.needs_repaint.load(Ordering::SeqCst)
    }

    pub fn mark_needs_repaint(&self) {
        self.needs_repaint.store(true, Ordering::SeqCst);
    }

    /// `Repainted()`: called once the renderer has consumed the
    /// pending repaint.
    pub fn repainted(&self) {
        self.needs_repaint.store(false, Ordering::SeqCst);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    pub fn is_tint_enabled(&self) -> bool {
        self.tint_enabled.load(Ordering::SeqCst)
    }

    pub fn set_tint(&self, enabled: bool) {
        self.tint_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn brightness(&self) -> f32 {
        *self.brightness.lock().unwrap()
    }

    pub fn adjust_brightness(&self, delta: f32) {
        let mut brightness = self.brightness.lock().unwrap();
        *brightness = (*brightness + delta).clamp(0.0, 1.0);
    }

    pub fn toggle_force_zoom(&self) {
        let mut vr_settings = self.vr_settings.lock().unwrap();
        vr_settings.force_zoom = !vr_settings.force_zoom;
        self.settings.lock().unwrap().vr.force_zoom = vr_settings.force_zoom;
    }

    pub fn recenter_vr(&self) {
        self.vr_settings.lock().unwrap().recenter_count =
            self.vr_settings.lock().unwrap().recenter_count.wrapping_add(1);
    }

    pub fn switch_kneeboards(&self) {
        let mut settings = self.settings.lock().unwrap();
        settings.app.dual_kneeboards_enabled = !settings.app.dual_kneeboards_enabled;
        drop(settings);
        *self.active_view_position.lock().unwrap() = 0;
    }

    pub fn active_view_position(&self) -> usize {
        *self.active_view_position.lock().unwrap()
    }

    pub fn cycle_active_view(&self) {
        let len = self.view_order.lock().unwrap().len().max(1);
        let mut position = self.active_view_position.lock().unwrap();
        *position = (*position + 1) % len;
    }

    pub fn swap_first_two_views(&self) {
        let mut order = self.view_order.lock().unwrap();
        if order.len() >= 2 {
            order.swap(0, 1);
        }
    }

    pub fn step_active_tab(&self, delta: i32) {
        let len = self.tabs.lock().unwrap().len();
        if len == 0 {
            return;
        }
        let mut index = self.active_tab_index.lock().unwrap();
        let next = (*index as i32 + delta).rem_euclid(len as i32);
        *index = next as usize;
    }

    /// Switches the active profile, applying its settled settings and
    /// re-emitting `evCurrentProfileChanged`. Rebuilding tabs/views/renderer
    /// caches is the caller's responsibility (it owns those
    /// singletons' lifetimes); this only settles the settings-level
    /// active profile and notifies listeners.
    pub fn switch_profile(&self, name: &str) -> Result<(), StateError> {
        let exists = self
            .settings
            .lock()
            .unwrap()
            .profiles
            .profiles
            .iter()
            .any(|p| p.name == name);
        if !exists {
            return Err(StateError::UnknownProfile(name.to_string()));
        }
        self.settings.lock().unwrap().profiles.active_profile = name.to_string();
        self.profile_changed.emit(name.to_string());
        Ok(())
    }

    pub fn step_profile(&self, delta: i32) -> Result<(), StateError> {
        let (names, active) = {
            let settings = self.settings.lock().unwrap();
            (
                settings
                    .profiles
                    .profiles
                    .iter()
                    .map(|p| p.name.clone())
                    .collect::<Vec<_>>(),
                settings.profiles.active_profile.clone(),
            )
        };
        if names.is_empty() {
            return Ok(());
        }
        let current = names.iter().position(|n| *n == active).unwrap_or(0);
        let next = (current as i32 + delta).rem_euclid(names.len() as i32) as usize;
        self.switch_profile(&names[next])
    }

    /// Drains the ordered APIEvent queue, dispatching each
    /// decoded event in turn, until either the queue is empty or
    /// `budget` is overdue - whichever comes first. `MultiEvent`
    /// payloads are expanded in place so their constituent events keep
    /// their relative order with everything else in the queue. Malformed events are logged and skipped rather
    /// than stalling the rest of the queue; events left over in a
    /// partially expanded `MultiEvent` when the budget runs out are
    /// re-enqueued so nothing is silently dropped.
    pub fn drain_ordered_events(self: &Arc<Self>, queue: &EventQueue, budget: &mut TimingManager) {
        let mut pending: VecDeque<apievent::APIEvent> = VecDeque::new();
        loop {
            if budget.is_overdue() {
                for event in pending.drain(..) {
                    queue.enqueue_event(event);
                }
                break;
            }
            let event = match pending.pop_front().or_else(|| queue.pop_front()) {
                Some(event) => event,
                None => break,
            };
            if event.name == EVT_MULTI_EVENT {
                match decode_multi_event(&event.value) {
                    Ok(events) => {
                        for (offset, event) in events.into_iter().enumerate() {
                            pending.insert(offset, event);
                        }
                    }
                    Err(e) => log::error!("dropping malformed MultiEvent: {e}"),
                }
                continue;
            }
            match decode_builtin(&event) {
                Ok(decoded) => self.handle_builtin(decoded),
                Err(e) => log::error!("dropping malformed APIEvent '{}': {e}", event.name),
            }
        }
    }

    fn handle_builtin(self: &Arc<Self>, event: BuiltinEvent) {
        let result = match event {
            BuiltinEvent::SetTabByID(e) => {
                let index = self.tabs.lock().unwrap().index_of(shm::RenderTargetID::from_raw(e.id));
                self.select_tab(index, e.page_number)
            }
            BuiltinEvent::SetTabByName(e) => {
                let tabs = self.tabs.lock().unwrap();
                let index = tabs.by_name(&e.name).ok().and_then(|entry| tabs.index_of(entry.id));
                drop(tabs);
                self.select_tab(index, e.page_number)
            }
            BuiltinEvent::SetTabByIndex(e) => self.select_tab(Some(e.index as usize), e.page_number),
            BuiltinEvent::SetProfileByGUID(name) | BuiltinEvent::SetProfileByName(name) => {
                self.switch_profile(&name)
            }
            BuiltinEvent::SetBrightness(b) => {
                match b.mode {
                    apievent::BrightnessMode::Absolute => {
                        *self.brightness.lock().unwrap() = b.brightness.clamp(0.0, 1.0)
                    }
                    apievent::BrightnessMode::Relative => self.adjust_brightness(b.brightness),
                }
                Ok(())
            }
            BuiltinEvent::RemoteUserAction(action) => dispatch::dispatch(self, action),
            BuiltinEvent::PluginTabCustomAction(custom) => {
                log::info!("ignoring plugin tab custom action '{}': not implemented", custom.action_id);
                Ok(())
            }
            BuiltinEvent::Other(event) => {
                log::debug!("no handler for APIEvent '{}'", event.name);
                Ok(())
            }
        };
        if let Err(e) = result {
            log::error!("APIEvent dispatch failed: {e}");
        }
        self.mark_needs_repaint();
    }

    fn select_tab(&self, index: Option<usize>, page_number: Option<u32>) -> Result<(), StateError> {
        let Some(index) = index else {
            return Err(StateError::UnknownTabIndex(0));
        };
        let tabs = self.tabs.lock().unwrap();
        let entry = tabs.by_index(index as u32)?;
        *self.active_tab_index.lock().unwrap() = index;
        if let Some(page_number) = page_number {
            if let Some(page_id) = entry.view.root_tab().page_ids().get(page_number as usize) {
                entry.view.set_page_id(*page_id);
            }
        }
        Ok(())
    }
}
