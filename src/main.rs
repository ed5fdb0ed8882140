// Demo host: a plain top-level window with an embedded magnifier filling its
// client area, following the cursor until the window is closed.

// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that eprintln! diagnostic output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(windows)]
fn main() {
    if let Err(e) = loupe::platform::win32::host::run() {
        // Startup failed before or during the message loop.
        // Show a modal error dialog, the only safe output path in a GUI app.
        loupe::platform::win32::host::show_error_dialog(&e.to_string());
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn main() {
    eprintln!("loupe: the demo host requires the Win32 Magnification API (Windows only)");
    std::process::exit(1);
}
