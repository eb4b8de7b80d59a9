//! Plugin requests and repository sources.
//!
//! Both are handed to the host's resolution subsystem exactly as declared;
//! nothing here negotiates versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// A requested build plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRequest {
    /// Plugin identifier (e.g., "com.android.application")
    pub id: String,
    /// Requested version
    pub version: String,
    /// Whether the plugin is applied to the root project eagerly
    #[serde(default = "default_apply")]
    pub apply: bool,
}

fn default_apply() -> bool {
    true
}

impl PluginRequest {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            apply: true,
        }
    }

    pub fn with_apply(mut self, apply: bool) -> Self {
        self.apply = apply;
        self
    }
}

/// Ordered plugin requests with unique identifiers
#[derive(Debug, Clone, Default)]
pub struct PluginSet {
    plugins: Vec<PluginRequest>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request. A second request for the same id is rejected rather
    /// than reconciled.
    pub fn add(&mut self, request: PluginRequest) -> Result<()> {
        if request.id.trim().is_empty() || request.version.trim().is_empty() {
            return Err(LayoutError::Configuration(format!(
                "plugin request needs both an id and a version (got id '{}', version '{}')",
                request.id, request.version
            )));
        }

        if let Some(existing) = self.get(&request.id) {
            return Err(LayoutError::Configuration(format!(
                "plugin '{}' requested twice (versions {} and {})",
                request.id, existing.version, request.version
            )));
        }

        self.plugins.push(request);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PluginRequest> {
        self.plugins.iter().find(|p| p.id == id)
    }

    pub fn as_slice(&self) -> &[PluginRequest] {
        &self.plugins
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// A package source passed to the resolution subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Repository {
    Google,
    MavenCentral,
    GradlePluginPortal,
    MavenLocal,
    /// Custom Maven repository by URL
    Maven { url: String },
}

impl Repository {
    pub fn as_str(&self) -> &str {
        match self {
            Repository::Google => "google",
            Repository::MavenCentral => "mavenCentral",
            Repository::GradlePluginPortal => "gradlePluginPortal",
            Repository::MavenLocal => "mavenLocal",
            Repository::Maven { url } => url.as_str(),
        }
    }
}

impl FromStr for Repository {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        // Accept the DSL call form too: google()
        let name = trimmed.strip_suffix("()").unwrap_or(trimmed);

        match name.to_ascii_lowercase().as_str() {
            "google" => Ok(Repository::Google),
            "mavencentral" => Ok(Repository::MavenCentral),
            "gradlepluginportal" => Ok(Repository::GradlePluginPortal),
            "mavenlocal" => Ok(Repository::MavenLocal),
            _ if name.contains("://") => Ok(Repository::Maven {
                url: name.to_string(),
            }),
            _ => Err(LayoutError::Configuration(format!(
                "unknown repository '{}' (expected google, mavenCentral, gradlePluginPortal, mavenLocal or a URL)",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Repository {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Repository> for String {
    fn from(value: Repository) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
