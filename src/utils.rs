use std::time::{Duration, Instant};

/// Format a `Duration` as a human-readable string with automatic unit scaling.
///
/// Produces output like `1.94ms` or `2.34s` using Rust's Debug format.
pub fn fmt_duration(d: Duration) -> String {
    format!("{d:.2?}")
}

/// Log a warning if the elapsed time since `start` exceeds `threshold`.
pub fn log_if_slow(start: Instant, threshold: Duration, label: &str) {
    let elapsed = start.elapsed();
    if elapsed > threshold {
        tracing::warn!(duration = fmt_duration(elapsed), "slow upstream call: {label}");
    }
}

/// Normalize a page path: collapse repeated slashes and force a leading and
/// trailing slash, so `photos//2009` becomes `/photos/2009/`.
pub fn clean_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    out.push('/');
    for segment in path.trim().split('/').filter(|s| !s.is_empty()) {
        out.push_str(segment);
        out.push('/');
    }
    out
}

/// Join two path pieces with exactly one slash between them.
pub fn join_path(base: &str, tail: &str) -> String {
    match (base.trim_end_matches('/'), tail.trim_start_matches('/')) {
        ("", tail) => format!("/{tail}"),
        (base, "") => base.to_owned(),
        (base, tail) => format!("{base}/{tail}"),
    }
}
