use crate::error::ApiError;

/// Collects the names of required fields that are absent or blank, so a
/// single 400 can list all of them.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed text, or an empty string when missing
    pub fn text(&mut self, field: &'static str, value: Option<String>) -> String {
        match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => {
                self.missing.push(field);
                String::new()
            }
        }
    }

    pub fn value<T: Default>(&mut self, field: &'static str, value: Option<T>) -> T {
        match value {
            Some(v) => v,
            None => {
                self.missing.push(field);
                T::default()
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::missing_fields(&self.missing))
        }
    }
}

/// Non-blank text, trimmed
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
