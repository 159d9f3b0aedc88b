use std::{borrow::Cow, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const STATUS_SUCCESS: &str = "success";

/// Server-side metadata describing one stored backup or restore operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackupRecord {
    pub id: i64,
    pub file_name: String,
    pub date: String,
    pub operation_type: OperationType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationType {
    Backup,
    Restore,
    Other(Cow<'static, str>),
}

impl OperationType {
    pub fn as_str(&self) -> &str {
        match self {
            OperationType::Backup => "backup",
            OperationType::Restore => "restore",
            OperationType::Other(value) => value.as_ref(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            OperationType::Backup => "Backup",
            OperationType::Restore => "Restore",
            OperationType::Other(value) => value.as_ref(),
        }
    }

    /// CSS modifier for the row badge.
    pub fn badge_class(&self) -> &'static str {
        match self {
            OperationType::Backup => "badge-backup",
            OperationType::Restore => "badge-restore",
            OperationType::Other(_) => "badge-other",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "backup" => OperationType::Backup,
            "restore" => OperationType::Restore,
            other => OperationType::Other(Cow::Owned(other.to_string())),
        }
    }
}

impl Serialize for OperationType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OperationType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(OperationType::from_str(&value))
    }
}

/// Counters reported by a category restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RestoreSummary {
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub skipped: u64,
}

impl fmt::Display for RestoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped",
            self.created, self.updated, self.skipped
        )
    }
}

/// Envelope shared by every backup endpoint.
///
/// Endpoints only fill the fields relevant to them, so everything besides
/// `status` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<BackupRecord>>,
    #[serde(default)]
    pub summary: Option<RestoreSummary>,
}

impl ApiEnvelope {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Data set restored by a category restore. The taxonomy belongs to the
/// server; these are the values it currently accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreCategory {
    #[default]
    Full,
    Students,
    Staff,
    Financial,
    Transport,
    Core,
}

impl RestoreCategory {
    pub const ALL: [RestoreCategory; 6] = [
        RestoreCategory::Full,
        RestoreCategory::Students,
        RestoreCategory::Staff,
        RestoreCategory::Financial,
        RestoreCategory::Transport,
        RestoreCategory::Core,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreCategory::Full => "full",
            RestoreCategory::Students => "students",
            RestoreCategory::Staff => "staff",
            RestoreCategory::Financial => "financial",
            RestoreCategory::Transport => "transport",
            RestoreCategory::Core => "core",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RestoreCategory::Full => "Full system",
            RestoreCategory::Students => "Students",
            RestoreCategory::Staff => "Staff",
            RestoreCategory::Financial => "Financial records",
            RestoreCategory::Transport => "Transport",
            RestoreCategory::Core => "Core settings",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    #[default]
    Merge,
    Replace,
}

impl RestoreMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreMode::Merge => "merge",
            RestoreMode::Replace => "replace",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "merge" => Some(RestoreMode::Merge),
            "replace" => Some(RestoreMode::Replace),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateBackupRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SmartRestoreRequest {
    pub restore_category: RestoreCategory,
    pub restore_mode: RestoreMode,
}
