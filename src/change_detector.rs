// src/change_detector.rs

/// A headline counts as new when it differs from the last processed one by
/// exact string comparison. Case and whitespace differences are significant.
/// With no previous headline, everything is new.
pub fn has_changed(last_title: Option<&str>, current_title: &str) -> bool {
    match last_title {
        Some(last) => last != current_title,
        None => true,
    }
}
