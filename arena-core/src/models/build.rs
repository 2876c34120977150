use serde::{Deserialize, Serialize};

/// Lifecycle of a backend scaffold build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Queued,
    Planning,
    Generating,
    Validating,
    Packaging,
    Complete,
    Failed,
    #[serde(other)]
    Unknown,
}

impl BuildStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Complete | BuildStatus::Failed)
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BuildStatus::Queued => "queued",
            BuildStatus::Planning => "planning",
            BuildStatus::Generating => "generating",
            BuildStatus::Validating => "validating",
            BuildStatus::Packaging => "packaging",
            BuildStatus::Complete => "complete",
            BuildStatus::Failed => "failed",
            BuildStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Status record as reported by `GET /build/status/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    #[serde(default)]
    pub build_id: Option<String>,
    pub status: BuildStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub download_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
}

impl BuildRecord {
    /// Complete with an archive to fetch.
    pub fn is_ready(&self) -> bool {
        self.status == BuildStatus::Complete && self.download_path.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildStarted {
    #[serde(alias = "buildId")]
    pub build_id: String,
}
