pub mod driver;
pub mod options;
pub mod pacing;
pub mod session;
pub mod view;

/// Escape a value for use inside a double-quoted CSS attribute selector.
pub(crate) fn css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
