// ── Win32 platform implementation ─────────────────────────────────────────────
//
// This is the only module tree in the codebase where `unsafe` code is
// permitted.  Every `unsafe` block MUST carry a `// SAFETY:` comment that
// states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what callers genuinely need; keep
// the unsafe surface as small as possible.

#![allow(unsafe_code)]

// ── Sub-modules ───────────────────────────────────────────────────────────────

pub mod host; // demo host window, WndProc, message loop
pub mod magnification; // MagBackend over the Magnification API
pub mod timer; // RefreshTimer over SetTimer/KillTimer

pub(crate) mod dpi; // per-monitor DPI v2 opt-in
