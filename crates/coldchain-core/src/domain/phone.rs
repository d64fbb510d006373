/// Reduces a dialable notification target to digits, keeping a leading `+`.
///
/// Returns `None` when the value carries letters or does not have a plausible
/// number of digits, since the call transport expects a bare number.
pub fn normalize_phone_target(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.chars().any(char::is_alphabetic) {
        return None;
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if !(7..=15).contains(&digits.len()) {
        return None;
    }

    if trimmed.starts_with('+') {
        Some(format!("+{digits}"))
    } else {
        Some(digits)
    }
}
