use super::{HttpMethod, StringMap, Timestamp};
use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_environment_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A stored, possibly templated request owned by a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDefinition {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: StringMap,
    #[serde(default)]
    pub query_params: StringMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RequestDefinition {
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        method: HttpMethod,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            project_id: project_id.into(),
            name: name.into(),
            method,
            url: url.into(),
            headers: StringMap::new(),
            query_params: StringMap::new(),
            body: None,
            tag_ids: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Switching to a bodyless method drops the stored body.
    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = method;
        if !method.allows_body() {
            self.body = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagColor {
    Blue,
    Red,
    Green,
    Purple,
    Yellow,
    Pink,
}

impl TagColor {
    pub const ALL: [TagColor; 6] = [
        TagColor::Blue,
        TagColor::Red,
        TagColor::Green,
        TagColor::Purple,
        TagColor::Yellow,
        TagColor::Pink,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TagColor::Blue => "blue",
            TagColor::Red => "red",
            TagColor::Green => "green",
            TagColor::Purple => "purple",
            TagColor::Yellow => "yellow",
            TagColor::Pink => "pink",
        }
    }
}

impl fmt::Display for TagColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagColor {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        TagColor::ALL
            .iter()
            .copied()
            .find(|color| color.as_str() == normalized)
            .ok_or_else(|| {
                AppError::invalid_params(format!("Unknown tag color '{}'", raw.trim()))
                    .with_hint("Use one of blue, red, green, purple, yellow, pink.")
            })
    }
}

/// Reusable bundle of header and query-parameter overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: TagColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub headers: StringMap,
    #[serde(default)]
    pub query_params: StringMap,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: TagColor) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            color,
            icon: None,
            description: None,
            headers: StringMap::new(),
            query_params: StringMap::new(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub variables: StringMap,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
