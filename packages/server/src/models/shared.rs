use crate::error::AppError;

/// Validate a required text field (trimmed, 1..=`max_chars` characters).
pub fn require_text(value: Option<String>, field: &str, max_chars: usize) -> Result<String, AppError> {
    let value = value.map(|s| s.trim().to_string()).unwrap_or_default();
    if value.is_empty() || value.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{max_chars} characters"
        )));
    }
    Ok(value)
}
