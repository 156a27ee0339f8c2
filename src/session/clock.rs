/// Render elapsed seconds as `M:SS`
///
/// Minutes are unpadded and unbounded, seconds always two digits.
pub fn format_time(elapsed_secs: u64) -> String {
    format!("{}:{:02}", elapsed_secs / 60, elapsed_secs % 60)
}
