use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle tag shared by catalogs, collections and groups. Only `Publish`
/// entities are surfaced by the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Publish,
    Unlist,
    Archive,
}

impl Status {
    pub fn is_published(&self) -> bool {
        matches!(self, Status::Publish)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Publish => "publish",
            Status::Unlist => "unlist",
            Status::Archive => "archive",
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Status::Draft),
            "publish" => Ok(Status::Publish),
            "unlist" => Ok(Status::Unlist),
            "archive" => Ok(Status::Archive),
            _ => Err(format!("unknown status: {s}")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Admin tooling has written both "Publish" and "publish" over the years
impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
