use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ValidationLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationLevel {
    Error,
    Warning,
    Info,
}

impl ValidationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationLevel::Error => "ERROR",
            ValidationLevel::Warning => "WARNING",
            ValidationLevel::Info => "INFO",
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DeltaOperation
// ---------------------------------------------------------------------------

/// Operation recorded on a legacy whole-document change delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeltaOperation {
    Added,
    Modified,
    Removed,
}

impl DeltaOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaOperation::Added => "ADDED",
            DeltaOperation::Modified => "MODIFIED",
            DeltaOperation::Removed => "REMOVED",
        }
    }

    /// Infer the operation from a free-text delta description.
    pub fn infer(description: &str) -> Self {
        let lower = description.to_lowercase();
        if lower.contains("add") {
            DeltaOperation::Added
        } else if lower.contains("remove") || lower.contains("delete") {
            DeltaOperation::Removed
        } else {
            DeltaOperation::Modified
        }
    }
}

impl fmt::Display for DeltaOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeltaOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADDED" => Ok(DeltaOperation::Added),
            "MODIFIED" => Ok(DeltaOperation::Modified),
            "REMOVED" => Ok(DeltaOperation::Removed),
            _ => Err(format!("unknown delta operation: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// ItemType
// ---------------------------------------------------------------------------

/// Kind of artifact addressed by the validate and show commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Spec,
    Change,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Spec => "spec",
            ItemType::Change => "change",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spec" => Ok(ItemType::Spec),
            "change" => Ok(ItemType::Change),
            _ => Err(format!("unknown item type '{s}': expected 'spec' or 'change'")),
        }
    }
}
