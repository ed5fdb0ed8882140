// ── Demo host window ──────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the host window class and create the top-level window.
//   • Run the Win32 message loop.
//   • Forward WM_CREATE, WM_SIZE, WM_TIMER, WM_CLOSE, WM_DESTROY to the
//     magnifier controller.
//   • Expose a safe error-dialog helper for use by main().
//
// The controller lives in a thread-local slot: everything (creation, event
// handling, ticks, disposal) happens on this one UI thread, so no
// synchronization is needed or wanted.

#![allow(unsafe_code)]

use std::cell::RefCell;

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
        Graphics::Gdi::{GetStockObject, HBRUSH, BLACK_BRUSH},
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
            LoadCursorW, LoadIconW, MessageBoxW, PostQuitMessage, RegisterClassExW, ShowWindow,
            TranslateMessage, UpdateWindow, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, IDC_ARROW,
            IDI_APPLICATION, MB_ICONERROR, MB_OK, MSG, SW_SHOW, WINDOW_EX_STYLE, WM_CLOSE,
            WM_CREATE, WM_DESTROY, WM_SIZE, WM_TIMER, WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
        },
    },
};

use super::{dpi, magnification::Win32Magnification, timer::{HostTimer, REFRESH_TIMER_ID}};
use crate::error::{LoupeError, Result};
use crate::magnifier::Magnifier;

// ── Window identity ───────────────────────────────────────────────────────────

/// Atom name used to register the host window class.
const CLASS_NAME: PCWSTR = w!("LoupeHostWindow");

/// Title bar text.
const APP_TITLE: PCWSTR = w!("Loupe");

/// Default client width in device pixels.
const DEFAULT_WIDTH: i32 = 800;

/// Default client height in device pixels.
const DEFAULT_HEIGHT: i32 = 600;

// ── Controller storage ────────────────────────────────────────────────────────

type HostMagnifier = Magnifier<Win32Magnification, HostTimer>;

thread_local! {
    static MAGNIFIER: RefCell<Option<HostMagnifier>> = const { RefCell::new(None) };
}

/// Run `f` against the live controller, if any.
fn with_magnifier(f: impl FnOnce(&mut HostMagnifier)) {
    MAGNIFIER.with(|slot| {
        // Win32 can re-enter the WndProc while a handler is still running
        // (e.g. WM_WINDOWPOSCHANGED during the topmost re-assert); nested
        // messages skip the controller instead of aliasing it.
        if let Ok(mut slot) = slot.try_borrow_mut() {
            if let Some(magnifier) = slot.as_mut() {
                f(magnifier);
            }
        }
    });
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Register the host window class, create the window with an embedded
/// magnifier, and drive the message loop until the user closes it.
pub fn run() -> Result<()> {
    // Startup benchmark harness, debug builds only.
    #[cfg(debug_assertions)]
    let t0 = std::time::Instant::now();

    // Must precede window creation so all geometry is in physical pixels.
    dpi::init();

    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // always valid for the process lifetime and never fails in practice.
    let hmodule = unsafe { GetModuleHandleW(None) }.map_err(LoupeError::from)?;
    let hinstance = HINSTANCE(hmodule.0);

    register_class(hinstance)?;
    let hwnd = create_window(hinstance)?;

    // SAFETY: hwnd was just returned by CreateWindowExW and is valid.
    // ShowWindow returns the previous visibility state; UpdateWindow returns
    // a success BOOL; both are intentionally ignored here.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }

    #[cfg(debug_assertions)]
    eprintln!("[loupe] window visible in {:.1} ms", t0.elapsed().as_secs_f64() * 1000.0);

    message_loop()
}

/// Show a modal error dialog with the given message.
///
/// Safe to call from any context; performs the UTF-16 conversion internally.
/// Used by `main()` when `run()` returns an error.
pub fn show_error_dialog(message: &str) {
    let msg_wide: Vec<u16> = message.encode_utf16().chain(std::iter::once(0)).collect();

    // SAFETY: msg_wide is a valid null-terminated UTF-16 string that remains
    // allocated for the duration of the MessageBoxW call.  None means the
    // dialog has no owner window.  Return value (button pressed) is
    // intentionally unused for an error dialog.
    unsafe {
        let _ = MessageBoxW(
            None,
            PCWSTR(msg_wide.as_ptr()),
            w!("Loupe — Fatal Error"),
            MB_OK | MB_ICONERROR,
        );
    }
}

// ── Window class registration ─────────────────────────────────────────────────

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: LoadIconW with IDI_APPLICATION and LoadCursorW with IDC_ARROW
    // load built-in resources that exist on all Windows versions.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }.map_err(LoupeError::from)?;
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }.map_err(LoupeError::from)?;

    // SAFETY: GetStockObject with BLACK_BRUSH always returns a valid HGDIOBJ.
    // The brush is only visible for the instant before the magnification
    // surface covers the client area.
    let bg_brush = unsafe { HBRUSH(GetStockObject(BLACK_BRUSH).0) };

    let wndclass = WNDCLASSEXW {
        // WNDCLASSEXW is ~72 bytes; the cast to u32 is always lossless.
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wnd_proc),
        cbClsExtra: 0,
        cbWndExtra: 0,
        hInstance: hinstance,
        hIcon: icon,
        hCursor: cursor,
        hbrBackground: bg_brush,
        lpszMenuName: PCWSTR::null(),
        lpszClassName: CLASS_NAME,
        hIconSm: icon,
    };

    // SAFETY: wndclass is fully initialised with valid handles;
    // CLASS_NAME is a valid null-terminated UTF-16 string literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }

    Ok(())
}

// ── Window creation ───────────────────────────────────────────────────────────

fn create_window(hinstance: HINSTANCE) -> Result<HWND> {
    // SAFETY: CLASS_NAME was just registered; hinstance is the exe's module.
    // None parent/menu creates a plain top-level window; no creation data.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            CLASS_NAME,
            APP_TITLE,
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            None,
            None,
            Some(hinstance),
            None,
        )
    }
    .map_err(LoupeError::from)?;

    Ok(hwnd)
}

// ── Message loop ──────────────────────────────────────────────────────────────

fn message_loop() -> Result<()> {
    let mut msg = MSG::default();

    loop {
        // SAFETY: &mut msg is a valid MSG pointer; None retrieves messages
        // for all windows on this thread; 0,0 filter accepts all.
        let ret = unsafe { GetMessageW(&mut msg, None, 0, 0) };

        match ret.0 {
            // GetMessageW returns -1 on error.
            -1 => return Err(last_error("GetMessageW")),
            // Returns 0 when WM_QUIT is retrieved; exit the loop cleanly.
            0 => break,
            // Any other value: a normal message to dispatch.
            _ => unsafe {
                // SAFETY: msg was populated by a successful GetMessageW call.
                // TranslateMessage return value (whether it generated WM_CHAR)
                // and DispatchMessageW's LRESULT are intentionally unused.
                let _ = TranslateMessage(&msg);
                let _ = DispatchMessageW(&msg);
            },
        }
    }

    Ok(())
}

// ── Window procedure ──────────────────────────────────────────────────────────

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; the controller stores hwnd only for the window's
// own lifetime and probes it with IsWindow before every refresh push.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        // ── Lifecycle ─────────────────────────────────────────────────────────
        WM_CREATE => {
            match Magnifier::new(Win32Magnification::new(), HostTimer::new(hwnd), hwnd) {
                Ok(magnifier) => {
                    MAGNIFIER.with(|slot| *slot.borrow_mut() = Some(magnifier));
                }
                Err(_e) => {
                    // The window stays usable without magnification.
                    #[cfg(debug_assertions)]
                    eprintln!("[loupe] magnifier construction failed: {_e}");
                }
            }
            LRESULT(0)
        }

        WM_CLOSE => {
            // Closing only pauses the refresh loop; teardown happens once in
            // WM_DESTROY.
            with_magnifier(Magnifier::on_closing);
            // SAFETY: hwnd is the window being closed; DestroyWindow triggers
            // WM_DESTROY, which posts WM_QUIT via PostQuitMessage.
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            if let Some(mut magnifier) = MAGNIFIER.with(|slot| slot.borrow_mut().take()) {
                magnifier.dispose();
            }
            // SAFETY: PostQuitMessage with exit code 0 is always safe to call
            // from WM_DESTROY.  It posts WM_QUIT to the thread's queue.
            PostQuitMessage(0);
            LRESULT(0)
        }

        // ── Layout ────────────────────────────────────────────────────────────
        WM_SIZE => {
            with_magnifier(Magnifier::on_resize);
            LRESULT(0)
        }

        // ── Refresh tick ──────────────────────────────────────────────────────
        WM_TIMER if wparam.0 == REFRESH_TIMER_ID => {
            with_magnifier(Magnifier::on_tick);
            LRESULT(0)
        }

        // Default processing for all unhandled messages.
        // SAFETY: hwnd and message parameters are provided intact by Windows.
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Capture the current Win32 last-error code and wrap it in a `LoupeError`.
///
/// Call immediately after a Win32 function that signals failure; GetLastError
/// reads thread-local state that can be overwritten by any subsequent call.
fn last_error(function: &'static str) -> LoupeError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32
    // call.  It is always safe to call and never fails.
    let code = unsafe { GetLastError() };
    LoupeError::Win32 {
        function,
        code: code.0,
    }
}
