//! In-window screen magnifier control.
//!
//! `loupe` embeds a live magnified view of the screen region around the mouse
//! cursor inside a host window.  The core controller ([`Magnifier`]) is
//! platform-independent: it drives the capture geometry, the refresh loop,
//! and the two-tier disposal protocol through a pair of injected traits
//! ([`MagBackend`], [`RefreshTimer`]).  The Windows binding in
//! [`platform::win32`] implements both on top of the Win32 Magnification API.
//!
//! Typical embedding, from a host window's message handlers:
//!
//! ```ignore
//! // WM_CREATE
//! let mut magnifier = Magnifier::new(Win32Magnification::new(), HostTimer::new(hwnd), hwnd)?;
//! // WM_SIZE            → magnifier.on_resize();
//! // WM_TIMER           → magnifier.on_tick();
//! // WM_CLOSE           → magnifier.on_closing();
//! // WM_DESTROY         → magnifier.dispose();
//! ```

// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32` – Win32 / WinAPI FFI
// Each unsafe block in that module MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

pub mod error;
pub mod geometry;
pub mod magnifier;
pub mod platform;

pub use error::{LoupeError, Result};
pub use geometry::{source_rect, Point, Rect};
pub use magnifier::{
    MagBackend, Magnifier, RefreshTimer, DEFAULT_MAGNIFICATION, MIN_TICK_INTERVAL_MS,
};
