use crate::error::AppError;

/// Sanitizes user-supplied rich text with ammonia's whitelist.
///
/// Formatting tags (`<b>`, `<p>`, links) survive; `<script>` and `<iframe>`
/// are removed along with their content, and event-handler attributes such
/// as `onclick` are stripped. Applied to post and comment bodies before
/// they reach the store.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// `clean_html` for required fields: fails when nothing but whitespace
/// survives sanitizing.
pub fn clean_required(input: &str, field: &str) -> Result<String, AppError> {
    let cleaned = clean_html(input);
    if cleaned.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(cleaned)
}
