// ── Magnification API backend ─────────────────────────────────────────────────
//
// `MagBackend` implemented over the Win32 Magnification service plus the
// window/geometry helpers the controller needs.  Handle ownership stays with
// the OS: this type is stateless, and the controller's own invariants decide
// when each call is legal (surface created, subsystem initialized).
//
// All failures here are one-shot OS resource operations, reported as
// `false`/`None` and never retried.

#![allow(unsafe_code)]

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{HWND, POINT, RECT},
        Graphics::Gdi::InvalidateRect,
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            Magnification::{
                MagInitialize, MagSetWindowSource, MagSetWindowTransform, MagUninitialize,
                MAGTRANSFORM,
            },
            WindowsAndMessaging::{
                CreateWindowExW, DestroyWindow, GetClientRect, GetCursorPos, GetSystemMetrics,
                GetWindowLongW, IsWindow, SetWindowLongW, SetWindowPos, GWL_EXSTYLE,
                HWND_TOPMOST, SM_CXSCREEN, SM_CYSCREEN, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
                SWP_NOZORDER, WINDOW_STYLE, WS_CHILD, WS_EX_CLIENTEDGE, WS_EX_LAYERED,
                WS_VISIBLE,
            },
        },
    },
};

use crate::geometry::{Point, Rect};
use crate::magnifier::MagBackend;

// ── Surface identity ──────────────────────────────────────────────────────────

/// Window class registered by the Magnification runtime once `MagInitialize`
/// has succeeded (`WC_MAGNIFIER`).
const MAGNIFIER_CLASS: PCWSTR = w!("Magnifier");

/// `MS_SHOWMAGNIFIEDCURSOR`: magnifier-control style that renders the cursor
/// inside the magnified view.
const MS_SHOWMAGNIFIEDCURSOR: WINDOW_STYLE = WINDOW_STYLE(0x0001);

// ── Conversions ───────────────────────────────────────────────────────────────

fn to_native(r: Rect) -> RECT {
    RECT {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

fn from_native(r: RECT) -> Rect {
    Rect {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// The Win32 rendition of the magnification capability.
#[derive(Debug, Default)]
pub struct Win32Magnification;

impl Win32Magnification {
    pub fn new() -> Self {
        Self
    }
}

impl MagBackend for Win32Magnification {
    type Window = HWND;
    type Surface = HWND;

    fn init_subsystem(&mut self) -> bool {
        // SAFETY: MagInitialize has no preconditions; it returns FALSE when
        // magnification is unavailable, which the controller handles.
        unsafe { MagInitialize() }.as_bool()
    }

    fn uninit_subsystem(&mut self) {
        // SAFETY: balanced against a successful MagInitialize by the
        // controller's `initialized` invariant; a redundant call is a no-op.
        unsafe {
            let _ = MagUninitialize();
        }
    }

    fn create_surface(&mut self, parent: HWND, bounds: Rect) -> Option<HWND> {
        // SAFETY: GetModuleHandleW(None) returns the process's own module,
        // valid for the process lifetime.
        let module = unsafe { GetModuleHandleW(None) }.ok()?;

        // SAFETY: MAGNIFIER_CLASS is registered by the Magnification runtime
        // (the controller only calls this after MagInitialize succeeded);
        // parent is a live window owned by the caller.
        let created = unsafe {
            CreateWindowExW(
                WS_EX_CLIENTEDGE,
                MAGNIFIER_CLASS,
                w!("MagnifierSurface"),
                WS_CHILD | WS_VISIBLE | MS_SHOWMAGNIFIEDCURSOR,
                bounds.left,
                bounds.top,
                bounds.width(),
                bounds.height(),
                Some(parent),
                None,
                Some(module.into()),
                None,
            )
        };

        created.ok()
    }

    fn destroy_surface(&mut self, surface: HWND) {
        // SAFETY: surface was created by create_surface and not destroyed
        // since; destroying a child never posts WM_QUIT.
        unsafe {
            let _ = DestroyWindow(surface);
        }
    }

    fn set_transform(&mut self, surface: HWND, scale: f32) -> bool {
        // 3×3 matrix, scale on the diagonal, identity elsewhere.
        let mut transform = MAGTRANSFORM::default();
        transform.v[0] = scale;
        transform.v[4] = scale;
        transform.v[8] = 1.0;

        // SAFETY: surface is a live magnifier control; the matrix is a plain
        // value that outlives the call.
        unsafe { MagSetWindowTransform(surface, &transform) }.as_bool()
    }

    fn set_source_rect(&mut self, surface: HWND, source: Rect) -> bool {
        // SAFETY: surface is a live magnifier control; the rectangle is
        // passed by value.
        unsafe { MagSetWindowSource(surface, to_native(source)) }.as_bool()
    }

    fn set_surface_bounds(&mut self, surface: HWND, bounds: Rect) -> bool {
        // SAFETY: surface is a live child window; no z-order or activation
        // change is requested.
        unsafe {
            SetWindowPos(
                surface,
                None,
                bounds.left,
                bounds.top,
                bounds.width(),
                bounds.height(),
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .is_ok()
    }

    fn invalidate(&mut self, surface: HWND) {
        // SAFETY: surface is a live window; a NULL rect invalidates the
        // whole client area.  Return value (always nonzero for a valid
        // window) is intentionally unused.
        unsafe {
            let _ = InvalidateRect(Some(surface), None, true);
        }
    }

    fn window_exists(&self, window: HWND) -> bool {
        // SAFETY: IsWindow tolerates any handle value, including NULL and
        // stale handles; that is exactly what this probe is for.
        unsafe { IsWindow(Some(window)) }.as_bool()
    }

    fn client_rect(&self, window: HWND) -> Rect {
        let mut rect = RECT::default();
        // SAFETY: &mut rect is a valid out pointer for the duration of the
        // call.  On failure (window gone) the empty default is returned.
        if unsafe { GetClientRect(window, &mut rect) }.is_ok() {
            from_native(rect)
        } else {
            Rect::default()
        }
    }

    fn make_opaque(&mut self, window: HWND) {
        // Clearing WS_EX_LAYERED drops any transparency key or alpha
        // blending, so magnified content is never composited against a
        // background color.
        // SAFETY: window is a live window owned by the caller; style reads
        // and writes on the UI thread are race-free.
        unsafe {
            let ex_style = GetWindowLongW(window, GWL_EXSTYLE);
            if ex_style as u32 & WS_EX_LAYERED.0 != 0 {
                let _ = SetWindowLongW(window, GWL_EXSTYLE, ex_style & !(WS_EX_LAYERED.0 as i32));
            }
        }
    }

    fn raise_topmost(&mut self, window: HWND) {
        // SAFETY: window is a live window; HWND_TOPMOST with
        // no-move/no-size/no-activate only reasserts stacking order.
        unsafe {
            let _ = SetWindowPos(
                window,
                Some(HWND_TOPMOST),
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            );
        }
    }

    fn cursor_pos(&self) -> Point {
        let mut point = POINT::default();
        // SAFETY: &mut point is a valid out pointer for the duration of the
        // call.
        if unsafe { GetCursorPos(&mut point) }.is_ok() {
            Point {
                x: point.x,
                y: point.y,
            }
        } else {
            Point::default()
        }
    }

    fn screen_size(&self) -> (i32, i32) {
        // SAFETY: GetSystemMetrics is a pure query with no preconditions.
        unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) }
    }
}
