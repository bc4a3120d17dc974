/// Render a Discord relative timestamp tag (`<t:123:R>`).
pub fn relative_timestamp(unix_secs: u64) -> String {
    format!("<t:{}:R>", unix_secs)
}
