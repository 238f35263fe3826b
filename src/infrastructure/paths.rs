//! Path handling for the Zellij plugin sandbox.
//!
//! Inside the sandbox the host filesystem is mounted under `/host`, which is
//! normally the user's home directory. Paths typed by the user (`~/foto.jpg`)
//! are mapped onto it before reading.

use std::path::PathBuf;

/// Directory holding the local backend store, the hosted session token and
/// the trace file: `/host/.local/share/zellij/mascotas`.
///
/// # Examples
///
/// ```
/// use mascotas::infrastructure::get_data_dir;
///
/// assert_eq!(get_data_dir().to_str(), Some("/host/.local/share/zellij/mascotas"));
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    PathBuf::from("/host/.local/share/zellij").join("mascotas")
}

/// Maps `~` and `~/…` onto the sandbox's `/host` mount. Relative paths are
/// taken relative to `/host` too; absolute paths are left alone.
///
/// # Examples
///
/// ```
/// use mascotas::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("~/fotos/luna.jpg"), "/host/fotos/luna.jpg");
/// assert_eq!(expand_tilde("~"), "/host");
/// assert_eq!(expand_tilde("fotos/luna.jpg"), "/host/fotos/luna.jpg");
/// assert_eq!(expand_tilde("/tmp/luna.jpg"), "/tmp/luna.jpg");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    let path = path.trim();
    if let Some(rest) = path.strip_prefix("~/") {
        format!("/host/{rest}")
    } else if path == "~" {
        "/host".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/host/{path}")
    }
}

/// Removes the `/host` mount prefix for display.
///
/// # Examples
///
/// ```
/// use mascotas::infrastructure::strip_host_prefix;
///
/// assert_eq!(strip_host_prefix("/host/fotos/luna.jpg"), "/fotos/luna.jpg");
/// assert_eq!(strip_host_prefix("/tmp/luna.jpg"), "/tmp/luna.jpg");
/// ```
#[must_use]
pub fn strip_host_prefix(path: &str) -> String {
    path.strip_prefix("/host").unwrap_or(path).to_string()
}
