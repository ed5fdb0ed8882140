// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in loupe return `error::Result<T>`.  No panics in
// production paths; the demo surfaces startup errors as a modal dialog (see
// `platform::win32::host::show_error_dialog`).
//
// Note that most platform-call failures are deliberately NOT errors: a failed
// subsystem initialization or surface creation degrades the controller to an
// inert state instead of propagating (magnification is legitimately
// unavailable on some configurations and the host app should keep running).

/// Every error that loupe can produce.
#[derive(Debug)]
pub enum LoupeError {
    /// A Win32 API call returned a failure code.
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// The controller was constructed against an absent or already-destroyed
    /// host window.
    MissingHostWindow,

    /// A magnification factor that is zero, negative, or non-finite was
    /// passed to the setter.
    InvalidMagnification {
        /// The rejected factor.
        value: f32,
    },
}

impl std::fmt::Display for LoupeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win32 { function, code } => {
                write!(f, "{function} failed (error {code:#010x})")
            }
            Self::MissingHostWindow => {
                write!(f, "host window is absent or already destroyed")
            }
            Self::InvalidMagnification { value } => {
                write!(f, "magnification factor must be positive and finite, got {value}")
            }
        }
    }
}

impl std::error::Error for LoupeError {}

// Convert a windows-crate error (HRESULT) directly into a LoupeError so that
// `?` can be used on `windows::core::Result<T>` throughout the platform module.
#[cfg(windows)]
impl From<windows::core::Error> for LoupeError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        // Win32 errors appear as 0x8007xxxx HRESULTs.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LoupeError>;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win32_display_includes_function_and_hex_code() {
        let e = LoupeError::Win32 {
            function: "MagSetWindowSource",
            code: 0x8007_0005,
        };
        assert_eq!(e.to_string(), "MagSetWindowSource failed (error 0x80070005)");
    }

    #[test]
    fn invalid_magnification_display_carries_value() {
        let e = LoupeError::InvalidMagnification { value: -1.5 };
        assert!(e.to_string().contains("-1.5"));
    }

    #[test]
    fn missing_host_window_display() {
        let e = LoupeError::MissingHostWindow;
        assert!(e.to_string().contains("host window"));
    }
}
