//! Element and source enumerations.
//!
//! `ElementType` is the partition key used by every index; `Source` names the
//! three backends an element listing can come from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ElementType
// ---------------------------------------------------------------------------

/// The kind of customization content an element holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Persona,
    Skill,
    Template,
    Agent,
    Memory,
    Ensemble,
}

impl ElementType {
    /// Every element type, in canonical order.
    pub const ALL: [ElementType; 6] = [
        ElementType::Persona,
        ElementType::Skill,
        ElementType::Template,
        ElementType::Agent,
        ElementType::Memory,
        ElementType::Ensemble,
    ];

    /// Singular lowercase name (e.g. `"persona"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persona => "persona",
            Self::Skill => "skill",
            Self::Template => "template",
            Self::Agent => "agent",
            Self::Memory => "memory",
            Self::Ensemble => "ensemble",
        }
    }

    /// Directory name used in portfolios and the collection index
    /// (e.g. `"personas"`, `"memories"`).
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Persona => "personas",
            Self::Skill => "skills",
            Self::Template => "templates",
            Self::Agent => "agents",
            Self::Memory => "memories",
            Self::Ensemble => "ensembles",
        }
    }

    /// Resolve a directory name back to its element type.
    pub fn from_dir_name(dir: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.dir_name() == dir)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = String;

    /// Accepts both singular (`persona`) and directory (`personas`) forms,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == lower || t.dir_name() == lower)
            .ok_or_else(|| format!("unknown element type: '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// One of the three backends an element listing can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Local,
    #[serde(rename = "github")]
    GitHub,
    Collection,
}

impl Source {
    /// Every source, in default priority order.
    pub const ALL: [Source; 3] = [Source::Local, Source::GitHub, Source::Collection];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::GitHub => "github",
            Self::Collection => "collection",
        }
    }

    /// Human-readable label for tables and log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Local => "Local Portfolio",
            Self::GitHub => "GitHub Portfolio",
            Self::Collection => "Community Collection",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "github" => Ok(Self::GitHub),
            "collection" => Ok(Self::Collection),
            _ => Err(format!("unknown source: '{s}'")),
        }
    }
}
