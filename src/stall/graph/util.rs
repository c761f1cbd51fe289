use std::path::Path;

use crate::stall::planner::Window;

/// Render seconds or rates without float noise: six decimals at most, no
/// trailing zeros.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 1_000_000.0).round() / 1_000_000.0;
    format!("{rounded}")
}

pub fn escape_ffmpeg_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace('\'', "'\\''")
        .replace(':', "\\:")
}

/// `between(t,a,b)` terms joined with `+`, true inside any window.
pub fn enable_expression(windows: impl IntoIterator<Item = Window>) -> String {
    windows
        .into_iter()
        .map(|window| {
            format!(
                "between(t,{},{})",
                format_number(window.start),
                format_number(window.end)
            )
        })
        .collect::<Vec<_>>()
        .join("+")
}
