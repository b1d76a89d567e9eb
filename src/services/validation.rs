use crate::constants::limits::MAX_NAME_LENGTH;
use crate::domain::{HttpMethod, StringMap, TagColor};
use crate::errors::AppError;
use serde_json::Value;

/// Schema checks at the JSON boundary. Untyped payloads never reach the stores.
#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(&self, value: &Value, label: &str, trim: bool) -> Result<String, AppError> {
        let text = value.as_str().ok_or_else(|| {
            AppError::invalid_params(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(AppError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(if trim {
            normalized.to_string()
        } else {
            text.to_string()
        })
    }

    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
        trim: bool,
    ) -> Result<Option<String>, AppError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(val) => self.ensure_string(val, label, trim).map(Some),
        }
    }

    /// Any string including empty; used for bodies and URLs still being edited.
    pub fn ensure_optional_text(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<String>, AppError> {
        match value {
            None => Ok(None),
            Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(_) => Err(AppError::invalid_params(format!("{} must be a string", label))),
        }
    }

    pub fn ensure_name(&self, value: &Value, label: &str) -> Result<String, AppError> {
        let name = self.ensure_string(value, label, true)?;
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(AppError::invalid_params(format!(
                "{} must be at most {} characters",
                label, MAX_NAME_LENGTH
            )));
        }
        Ok(name)
    }

    /// Object whose values are all strings. Order of keys is preserved.
    pub fn ensure_string_map(&self, value: Option<&Value>, label: &str) -> Result<StringMap, AppError> {
        let Some(value) = value else {
            return Ok(StringMap::new());
        };
        if value.is_null() {
            return Ok(StringMap::new());
        }
        let obj = value
            .as_object()
            .ok_or_else(|| AppError::invalid_params(format!("{} must be an object", label)))?;
        let mut out = StringMap::new();
        for (key, entry) in obj {
            let text = entry.as_str().ok_or_else(|| {
                AppError::invalid_params(format!("{}.{} must be a string", label, key))
                    .with_details(serde_json::json!({"key": key, "value": entry}))
            })?;
            out.insert(key.clone(), text.to_string());
        }
        Ok(out)
    }

    pub fn ensure_optional_string_map(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<StringMap>, AppError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.ensure_string_map(value, label).map(Some),
        }
    }

    pub fn ensure_id_list(&self, value: Option<&Value>, label: &str) -> Result<Vec<String>, AppError> {
        let Some(value) = value else {
            return Ok(Vec::new());
        };
        if value.is_null() {
            return Ok(Vec::new());
        }
        let items = value
            .as_array()
            .ok_or_else(|| AppError::invalid_params(format!("{} must be an array", label)))?;
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            out.push(self.ensure_string(item, &format!("{}[{}]", label, index), true)?);
        }
        Ok(out)
    }

    pub fn ensure_method(&self, value: &Value) -> Result<HttpMethod, AppError> {
        self.ensure_string(value, "method", true)?.parse()
    }

    pub fn ensure_color(&self, value: &Value) -> Result<TagColor, AppError> {
        self.ensure_string(value, "color", true)?.parse()
    }

    pub fn ensure_optional_bool(&self, value: Option<&Value>, label: &str) -> Result<Option<bool>, AppError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(_) => Err(AppError::invalid_params(format!("{} must be a boolean", label))),
        }
    }

    pub fn ensure_optional_limit(&self, value: Option<&Value>, label: &str) -> Result<Option<usize>, AppError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(val) => val
                .as_u64()
                .filter(|n| *n > 0)
                .map(|n| Some(n as usize))
                .ok_or_else(|| AppError::invalid_params(format!("{} must be a positive integer", label))),
        }
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}
