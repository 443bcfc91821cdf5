// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr};

use crate::normalize::{DuplicatePolicy, NormalizeOptions};

/// Whose plans the report is about: the person column and the header
/// marker both follow from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Mentor,
    Mentee,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Mentor => write!(f, "mentor"),
            Role::Mentee => write!(f, "mentee"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mentor" => Ok(Role::Mentor),
            "mentee" => Ok(Role::Mentee),
            other => anyhow::bail!("unknown role `{}` (expected mentor or mentee)", other),
        }
    }
}

/// Sheet name, header markers and column keywords for a PDI report.
/// Every field has a default, so a YAML file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub sheet: Option<String>,
    pub role: Role,
    pub mentor_markers: Vec<String>,
    pub mentee_markers: Vec<String>,
    pub mentor_keyword: String,
    pub mentee_keyword: String,
    pub action_keywords: Vec<String>,
    pub criticality_keyword: String,
    pub resource_keyword: String,
    pub resource_exclude: Option<String>,
    pub duplicates: DuplicatePolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sheet: Some("PDI_CONSOLIDADOS".into()),
            role: Role::Mentor,
            mentor_markers: vec!["MENTOR".into()],
            mentee_markers: vec!["MENTEE".into()],
            mentor_keyword: "MENTOR".into(),
            mentee_keyword: "MENTEE".into(),
            action_keywords: vec!["ACCION".into(), "ACCIÓN".into()],
            criticality_keyword: "CRITICIDAD".into(),
            resource_keyword: "RECURSO".into(),
            resource_exclude: Some("TIPO".into()),
            duplicates: DuplicatePolicy::Fail,
        }
    }
}

impl ReportConfig {
    /// Read a YAML config; missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn markers(&self) -> &[String] {
        match self.role {
            Role::Mentor => &self.mentor_markers,
            Role::Mentee => &self.mentee_markers,
        }
    }

    pub fn person_keyword(&self) -> &str {
        match self.role {
            Role::Mentor => &self.mentor_keyword,
            Role::Mentee => &self.mentee_keyword,
        }
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions::with_markers(self.markers().iter().cloned()).duplicates(self.duplicates)
    }
}
