// ── Platform abstraction layer ────────────────────────────────────────────────
//
// The controller talks to the OS only through the `MagBackend`/`RefreshTimer`
// traits; this module holds their platform implementations.  No `unsafe`
// lives here; all Win32 FFI is confined to the `win32` sub-module and never
// leaks outward.

#[cfg(windows)]
pub mod win32;
