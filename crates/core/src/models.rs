pub mod availability;
pub mod booking;
pub mod profile;
pub mod slot;
pub mod time_format;

/// Treats empty and whitespace-only strings the same as an absent field.
pub(crate) fn required(value: Option<String>, message: &str) -> crate::errors::SessionResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(crate::errors::SessionError::validation(message)),
    }
}
