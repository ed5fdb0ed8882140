#![allow(unsafe_code)]

use windows::Win32::UI::HiDpi::{
    SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
};

/// Opt into Per-Monitor v2 DPI awareness.
/// MUST be called before any window is created on the calling thread, so
/// that client rectangles and cursor positions arrive in physical pixels and
/// the capture math is not distorted by DPI virtualization.
pub(crate) fn init() {
    // SAFETY: Must precede all window creation; single call at process start.
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }
}
