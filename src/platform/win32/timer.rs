// ── Refresh timer ─────────────────────────────────────────────────────────────
//
// `RefreshTimer` over a Win32 message timer.  Ticks arrive as `WM_TIMER`
// messages on the host window's thread, which serializes them with every
// other controller call; the host's WndProc forwards them to
// `Magnifier::on_tick` (see `host.rs`).

#![allow(unsafe_code)]

use windows::Win32::{
    Foundation::HWND,
    UI::WindowsAndMessaging::{KillTimer, SetTimer, USER_TIMER_MINIMUM},
};

use crate::magnifier::RefreshTimer;

/// Timer id used for the refresh tick on the host window.
pub const REFRESH_TIMER_ID: usize = 1;

/// A stoppable/restartable message timer bound to the host window.
pub struct HostTimer {
    hwnd: HWND,
    running: bool,
}

impl HostTimer {
    /// A stopped timer ready to fire `WM_TIMER` at `hwnd`.
    pub fn new(hwnd: HWND) -> Self {
        Self {
            hwnd,
            running: false,
        }
    }
}

impl RefreshTimer for HostTimer {
    fn start(&mut self, interval_ms: u32) {
        // SetTimer silently raises shorter intervals anyway; the clamp keeps
        // the stored state honest.
        let interval = interval_ms.max(USER_TIMER_MINIMUM);
        // SAFETY: hwnd is a live window on the calling thread; reusing the
        // same id replaces the previous timer rather than leaking one.
        let id = unsafe { SetTimer(Some(self.hwnd), REFRESH_TIMER_ID, interval, None) };
        self.running = id != 0;
    }

    fn stop(&mut self) {
        if self.running {
            // SAFETY: the timer with this id was set by start() on this
            // window.  KillTimer on an already-dead window fails harmlessly.
            unsafe {
                let _ = KillTimer(Some(self.hwnd), REFRESH_TIMER_ID);
            }
            self.running = false;
        }
    }

    fn release(&mut self) {
        // A message timer has no resource beyond its id; stop() already
        // freed everything there is to free.
        self.stop();
    }
}
