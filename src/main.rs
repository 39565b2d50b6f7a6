// OpenKneeboard orchestrator entry point.
//
// Austin Shafer - 2020 (style); OpenKneeboard contributors - orchestrator
//
// Wires every component into one process: loads settings, brings up
// the APIEvent transport and input adapters, then runs the per-frame
// loop of "drain ordered events -> render the active view -> resolve
// VR placement -> publish to SHM".
use std::path::PathBuf;
use std::sync::Arc;

use apievent::EventQueue;
use geometry::{PixelRect, PixelSize, Point};
use input::DirectInputAdapter;
use render::{DXResources, NullDevice, RenderTarget};
use settings::KneeboardSettings;
use shm::{DisplayArea, Opacity, SHMLayer, ShmWriter, VRPose, LAYER_IDS};
use state::KneeboardState;
use task::StopSource;
use utils::log;
use utils::timing::TimingManager;
use vr::{HmdPose, LayerConfig, ViewType};
use view::KneeboardView;

/// Settings live under `%LOCALAPPDATA%/<product>/Settings`. Falls back
/// to the system temp dir off Windows, where `LOCALAPPDATA` doesn't
/// exist, so the rest of the bootstrap path is exercised the same way
/// in cross-platform tests and CI as it would be on a real install.
fn settings_dir() -> PathBuf {
    let base = std::env::var_os("LOCALAPPDATA")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    base.join("OpenKneeboard").join("Settings")
}

/// The full-canvas size rendered for the single default view until
/// per-view settings (`Views.json`'s `ViewSettings`) drive more than
/// one concurrently. Matches the original engine's default kneeboard
/// aspect ratio closely enough for a sensible first frame.
const DEFAULT_CANVAS: PixelSize = PixelSize {
    width: 768,
    height: 1024,
};

fn main() {
    let dir = settings_dir();
    let settings = match KneeboardSettings::load(&dir) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("failed to load settings from {dir:?}, using defaults: {e}");
            KneeboardSettings::default()
        }
    };

    let state = KneeboardState::new(settings);
    let dx = DXResources::new(Box::new(NullDevice::new()));
    let mut writer = ShmWriter::new();
    let event_queue = Arc::new(EventQueue::new());
    let input_stop = StopSource::new();

    spawn_mailslot_receiver(Arc::clone(&event_queue), input_stop.token());
    spawn_input_adapter(input_stop.token());

    log::info!("OpenKneeboard orchestrator starting; settings dir {dir:?}");
    run_forever(state, dx, &mut writer, &event_queue);
    input_stop.request_stop();
}

/// The mailslot receive loop runs on its own thread and feeds decoded
/// packets into the ordered `EventQueue` the frame loop drains. Off
/// Windows there is no real mailslot to open, so this is a no-op - the
/// rest of the orchestrator still runs against an empty queue, same as
/// it would with no external tool currently connected.
#[cfg(windows)]
fn spawn_mailslot_receiver(queue: Arc<EventQueue>, stop_token: task::StopToken) {
    task::fire_and_forget("apievent-mailslot", move || {
        let mailslot = match apievent::PlatformMailslot::create() {
            Ok(mailslot) => mailslot,
            Err(e) => {
                log::error!("failed to create APIEvent mailslot: {e:?}");
                return;
            }
        };
        apievent::run_receive_loop(&mailslot, &queue, &stop_token);
    });
}

#[cfg(not(windows))]
fn spawn_mailslot_receiver(_queue: Arc<EventQueue>, _stop_token: task::StopToken) {
    log::debug!("APIEvent mailslot transport is only available on Windows");
}

/// Enumerates the real XInput gamepads and the keyboard under Windows
/// and keeps `DirectInputAdapter` reconciled against whichever of them
/// are currently bound in `Input.json`. Off Windows there is no
/// DirectInput/XInput to enumerate, so the adapter is created but
/// never populated - matching how `rescan` degrades to an empty
/// device set with no sources.
#[cfg(windows)]
fn spawn_input_adapter(stop_token: task::StopToken) {
    use input::XInputGamepadSource;
    let adapter = DirectInputAdapter::new();
    task::fire_and_forget("direct-input-rescan", move || {
        while !stop_token.is_cancelled() {
            let sources: Vec<Box<dyn input::RawInputSource>> = (0..4)
                .map(|index| Box::new(XInputGamepadSource::new(index)) as Box<dyn input::RawInputSource>)
                .collect();
            adapter.rescan(sources, &Default::default(), |_| false);
            std::thread::sleep(std::time::Duration::from_secs(2));
        }
    });
}

#[cfg(not(windows))]
fn spawn_input_adapter(_stop_token: task::StopToken) {
    let _adapter = DirectInputAdapter::new();
    log::debug!("DirectInput/XInput enumeration is only available on Windows");
}

/// The frame loop. Runs until the process is
/// killed; there is no in-process shutdown signal for the top-level
/// loop itself (components below it each have their own
/// `DisposalState`/`StopSource` teardown, exercised independently in
/// their own tests).
fn run_forever(state: Arc<KneeboardState>, dx: Arc<DXResources>, writer: &mut ShmWriter, queue: &EventQueue) {
    let canvas = PixelRect::new(Point::new(0, 0), DEFAULT_CANVAS);
    let global_input_layer_id = LAYER_IDS.mint();
    let hmd = HmdPose::new(cgmath::Vector3::new(0.0, 1.7, 0.0), 0.0, 0.0, 0.0);

    loop {
        let mut frame_budget = TimingManager::new(state::ORDERED_EVENT_FRAME_BUDGET_MS);
        state.drain_ordered_events(queue, &mut frame_budget);

        if state.is_visible() && state.needs_repaint() {
            publish_frame(&state, &dx, writer, canvas, global_input_layer_id, &hmd);
            state.repainted();
        }

        std::thread::sleep(std::time::Duration::from_millis(16));
    }
}

/// Renders the active tab's `KneeboardView` into a fresh render
/// target, resolves its VR placement, and publishes the result. With
/// no tabs registered yet (nothing has populated `KneeboardState::tabs`
/// from a loaded profile) this publishes an empty frame, which is a
/// valid "nothing to show" state for readers rather than an error.
fn publish_frame(
    state: &Arc<KneeboardState>,
    dx: &Arc<DXResources>,
    writer: &mut ShmWriter,
    canvas: PixelRect,
    global_input_layer_id: shm::LayerID,
    hmd: &HmdPose,
) {
    let tabs = state.tabs().lock().unwrap();
    let active = state.active_tab_index();
    let Some(entry) = tabs.entries().get(active) else {
        let publish = writer.begin_publish();
        publish.commit(global_input_layer_id, state.vr_settings());
        return;
    };
    let entry_view = Arc::clone(&entry.view);
    drop(tabs);

    let view = KneeboardView::new(entry_view);
    let texture = {
        let device = dx.lock();
        match device.create_texture(canvas.size) {
            Ok(texture) => texture,
            Err(e) => {
                log::error!("failed to create a render target texture: {e}");
                return;
            }
        }
    };
    let target = RenderTarget::new(texture, canvas.size);
    if let Err(e) = view.render(shm::RENDER_TARGET_IDS.mint(), &target, canvas) {
        log::error!("rendering the active view failed: {e}");
        return;
    }
    let shared_handle = dx.lock().shared_handle(texture).map(Arc::new);

    let layer_id = LAYER_IDS.mint();
    let config = LayerConfig {
        layer_id,
        enable_in_vr: true,
        view_type: ViewType::Normal,
        pose: VRPose::default(),
        normal_size_m: (0.25, 0.32),
        zoom_scale: 2.0,
        gaze_target_scale: 1.0,
        enable_gaze_zoom: true,
        opacity: Opacity::default(),
        display_area: DisplayArea::Full,
        physical_size: None,
        cache_key: 0,
    };
    let vr_settings = state.vr_settings();
    let resolved = state.vr().resolve(hmd, &vr_settings, std::slice::from_ref(&config));

    let mut publish = writer.begin_publish();
    for layer in &resolved {
        let mut shm_layer = SHMLayer::new(layer.layer_id, canvas);
        shm_layer.opacity.normal = layer.params.kneeboard_opacity;
        shm_layer.physical_size_m = layer.params.kneeboard_size_m;
        shm_layer.shared_handle = shared_handle.clone();
        if let Err(e) = publish.add_layer(0, shm_layer) {
            log::error!("failed to publish layer: {e}");
        }
    }
    let sequence = publish.commit(global_input_layer_id, vr_settings);
    log::debug!("published frame {sequence}");
}
