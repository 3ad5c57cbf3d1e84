/// Render milliseconds as `HH:MM:SS`. Hours keep growing past 99.
pub fn format_hms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Same as [`format_hms`] for fractional seconds; the fraction is dropped.
pub fn format_secs(secs: f64) -> String {
    match secs {
        s if s.is_finite() && s > 0.0 => format_hms((s * 1000.0) as u64),
        _ => format_hms(0),
    }
}
