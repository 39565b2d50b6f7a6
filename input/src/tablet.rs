//! `TabletInputAdapter`: turns raw Wintab pen packets into
//! `CursorEvent`s, rotating the tablet's native coordinate space 90°
//! clockwise (Wintab reports coordinates relative to the tablet's own
//! orientation, which the original engine's mounting convention has
//! rotated a quarter turn from the canvas) and then scaling first to
//! the render canvas, then to the page's content-native rect.
use std::sync::{Arc, Mutex};

use geometry::PixelRect;
use pagesource::{CursorEvent, TouchState};
use task::StopToken;

/// One raw sample as Wintab would deliver it in a `WT_PACKET`/
/// `WT_PACKETEXT` message: tablet-native coordinates and pressure,
/// plus whichever pen buttons are currently down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPenPacket {
    pub x: f32,
    pub y: f32,
    /// Normalized 0.0-1.0 tip pressure.
    pub pressure: f32,
    pub buttons: u32,
    pub tablet_size: geometry::Size<f32>,
}

/// Pen button 1 ("touching surface"); any other nonzero button means
/// "near surface" rather than "up".
const TOUCH_BUTTON: u32 = 1 << 0;

/// Something that can hand back the next pen packet as it arrives.
/// Implemented for the real Wintab DLL under `cfg(windows)` and an
/// injectable stand-in everywhere else.
pub trait PenSource: Send {
    fn next_packet(&mut self, stop_token: &StopToken) -> Option<RawPenPacket>;
}

/// Rotates `(x, y)` 90° clockwise within a `tablet_size`-sized space,
/// then scales the result to fit `canvas`, then maps that into
/// `content_rect` (a page's content-native sub-rect of the canvas).
/// Pure and independent of any device, so it's exercised directly by
/// tests without a tablet or a window.
pub fn rotate_and_scale(
    raw: RawPenPacket,
    canvas: geometry::Size<i32>,
    content_rect: PixelRect,
) -> (f32, f32) {
    // 90 degrees clockwise: (x, y) in an w*h space becomes (h - y, x)
    // in an h*w space.
    let rotated_x = raw.tablet_size.height - raw.y;
    let rotated_y = raw.x;
    let rotated_space = geometry::Size::new(raw.tablet_size.height, raw.tablet_size.width);

    let norm_x = if rotated_space.width > 0.0 {
        rotated_x / rotated_space.width
    } else {
        0.0
    };
    let norm_y = if rotated_space.height > 0.0 {
        rotated_y / rotated_space.height
    } else {
        0.0
    };

    let canvas_x = norm_x * canvas.width as f32;
    let canvas_y = norm_y * canvas.height as f32;

    (
        canvas_x - content_rect.origin.x as f32,
        canvas_y - content_rect.origin.y as f32,
    )
}

fn touch_state_for(buttons: u32) -> TouchState {
    if buttons & TOUCH_BUTTON != 0 {
        TouchState::Touch
    } else if buttons != 0 {
        TouchState::Hover
    } else {
        TouchState::Up
    }
}

pub struct TabletInputAdapter {
    pen_source: Mutex<Box<dyn PenSource>>,
    canvas: geometry::Size<i32>,
    content_rect: PixelRect,
}

impl TabletInputAdapter {
    pub fn new(pen_source: Box<dyn PenSource>, canvas: geometry::Size<i32>, content_rect: PixelRect) -> Arc<Self> {
        Arc::new(TabletInputAdapter {
            pen_source: Mutex::new(pen_source),
            canvas,
            content_rect,
        })
    }

    /// Converts one raw packet into the `CursorEvent` a page source
    /// receives, in content-native coordinates.
    pub fn process_packet(&self, raw: RawPenPacket) -> CursorEvent {
        let (x, y) = rotate_and_scale(raw, self.canvas, self.content_rect);
        CursorEvent {
            touch_state: touch_state_for(raw.buttons),
            x,
            y,
            pressure: raw.pressure,
            buttons: raw.buttons,
        }
    }

    /// Runs until `stop_token` is cancelled, invoking `on_event` for
    /// every packet the pen source hands back.
    pub fn run(&self, stop_token: &StopToken, mut on_event: impl FnMut(CursorEvent)) {
        while !stop_token.is_cancelled() {
            let packet = self.pen_source.lock().unwrap().next_packet(stop_token);
            let Some(packet) = packet else { break };
            on_event(self.process_packet(packet));
        }
    }
}

/// A scriptable stand-in for tests: packets queued with `push` are
/// replayed in order, then `next_packet` blocks (checking
/// `stop_token` between checks) until more are pushed or the adapter
/// is stopped.
pub struct TestPenSource {
    queue: std::sync::mpsc::Receiver<RawPenPacket>,
}

pub struct TestPenSender(std::sync::mpsc::Sender<RawPenPacket>);

impl TestPenSender {
    pub fn push(&self, packet: RawPenPacket) {
        let _ = self.0.send(packet);
    }
}

impl TestPenSource {
    pub fn new() -> (Self, TestPenSender) {
        let (tx, rx) = std::sync::mpsc::channel();
        (TestPenSource { queue: rx }, TestPenSender(tx))
    }
}

impl PenSource for TestPenSource {
    fn next_packet(&mut self, _stop_token: &StopToken) -> Option<RawPenPacket> {
        self.queue.recv().ok()
    }
}

#[cfg(windows)]
pub mod platform {
    //! Loads `Wintab32.dll` dynamically (it's a vendor DLL, not part
    //! of Win32, so there's nothing for `windows` to bind) the same
    //! way the original engine's Wayland backend dlopens its
    //! compositor extension libraries: resolve function pointers once
    //! at startup and fail over to a disabled adapter if the driver
    //! isn't installed.
    use libloading::{Library, Symbol};

    use crate::error::InputError;

    /// Thin wrapper around the handful of Wintab entry points the
    /// adapter needs: `WTOpenW` to bind a context to a window,
    /// `WTPacketsGet` to drain pending samples, `WTClose` to release
    /// it.
    pub struct WintabLibrary {
        _lib: Library,
    }

    impl WintabLibrary {
        pub fn load() -> Result<Self, InputError> {
            let lib = unsafe { Library::new("Wintab32.dll") }
                .map_err(|e| InputError::WintabUnavailable(e.to_string()))?;
            // Resolved eagerly so a missing export surfaces at load
            // time rather than on first use.
            let _wt_info: Symbol<unsafe extern "C" fn() -> i32> =
                unsafe { lib.get(b"WTInfoW\0") }.map_err(|e| InputError::WintabUnavailable(e.to_string()))?;
            Ok(WintabLibrary { _lib: lib })
        }
    }
}

use crate::error::InputError;

#[cfg(windows)]
pub fn load_wintab() -> Result<platform::WintabLibrary, InputError> {
    platform::WintabLibrary::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(x: f32, y: f32, buttons: u32) -> RawPenPacket {
        RawPenPacket {
            x,
            y,
            pressure: 0.5,
            buttons,
            tablet_size: geometry::Size::new(1000.0, 2000.0),
        }
    }

    #[test]
    fn rotates_90_degrees_clockwise_before_scaling() {
        // Tablet space is 1000 wide x 2000 tall. A point at the
        // tablet's top-right corner (x=1000, y=0) should rotate to
        // the rotated space's origin (0, 0).
        let raw = packet(1000.0, 0.0, 0);
        let canvas = geometry::Size::new(800, 600);
        let content_rect = PixelRect::from_xywh(0, 0, 800, 600);
        let (x, y) = rotate_and_scale(raw, canvas, content_rect);
        assert!(x.abs() < 0.01);
        assert!(y.abs() < 0.01);
    }

    #[test]
    fn button_1_is_touching_other_nonzero_is_hover() {
        let adapter_canvas = geometry::Size::new(800, 600);
        let content_rect = PixelRect::from_xywh(0, 0, 800, 600);
        let (source, _sender) = TestPenSource::new();
        let adapter = TabletInputAdapter::new(Box::new(source), adapter_canvas, content_rect);

        let touching = adapter.process_packet(packet(500.0, 1000.0, TOUCH_BUTTON));
        assert_eq!(touching.touch_state, TouchState::Touch);

        let hovering = adapter.process_packet(packet(500.0, 1000.0, 1 << 1));
        assert_eq!(hovering.touch_state, TouchState::Hover);

        let up = adapter.process_packet(packet(500.0, 1000.0, 0));
        assert_eq!(up.touch_state, TouchState::Up);
    }

    #[test]
    fn run_delivers_packets_in_order_until_stopped() {
        let adapter_canvas = geometry::Size::new(800, 600);
        let content_rect = PixelRect::from_xywh(0, 0, 800, 600);
        let (source, sender) = TestPenSource::new();
        let adapter = TabletInputAdapter::new(Box::new(source), adapter_canvas, content_rect);

        sender.push(packet(0.0, 0.0, TOUCH_BUTTON));
        sender.push(packet(500.0, 1000.0, 0));
        drop(sender);

        let mut seen = Vec::new();
        let stop = task::StopSource::new();
        adapter.run(&stop.token(), |event| seen.push(event.touch_state));

        assert_eq!(seen, vec![TouchState::Touch, TouchState::Up]);
    }
}
