//! Canonical identifiers for Wayfarer's learned state.
//!
//! Three namespaces:
//! - Preferences: how the user likes to move through learning
//! - Constraints: must/must-not facts about the user's environment
//! - Concepts: mental model milestones the user is building
//!
//! Learned events carry these ids as plain strings on the wire; the store
//! and reducers accept any id. The enums here are the canonical vocabulary
//! clients are expected to use, and they round-trip through serde as the
//! dotted string form.

use serde::{Deserialize, Serialize};

/// How the user prefers to learn and move through content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PreferenceId {
    #[serde(rename = "pace.step_size")]
    PaceStepSize,
    #[serde(rename = "explanations.depth")]
    ExplanationsDepth,
    #[serde(rename = "examples.style")]
    ExamplesStyle,
    #[serde(rename = "friction.tolerance")]
    FrictionTolerance,
    #[serde(rename = "autonomy.level")]
    AutonomyLevel,
    #[serde(rename = "ui.preference")]
    UiPreference,
}

impl PreferenceId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaceStepSize => "pace.step_size",
            Self::ExplanationsDepth => "explanations.depth",
            Self::ExamplesStyle => "examples.style",
            Self::FrictionTolerance => "friction.tolerance",
            Self::AutonomyLevel => "autonomy.level",
            Self::UiPreference => "ui.preference",
        }
    }
}

/// Hard constraints about the user's environment and situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConstraintId {
    #[serde(rename = "environment.os")]
    EnvironmentOs,
    #[serde(rename = "environment.install_tolerance")]
    EnvironmentInstallTolerance,
    #[serde(rename = "privacy.public_sharing")]
    PrivacyPublicSharing,
    #[serde(rename = "cost.budget")]
    CostBudget,
    #[serde(rename = "time.available_per_session_minutes")]
    TimeAvailablePerSession,
    #[serde(rename = "tools.allowed")]
    ToolsAllowed,
    #[serde(rename = "network.offline_ok")]
    NetworkOfflineOk,
}

impl ConstraintId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnvironmentOs => "environment.os",
            Self::EnvironmentInstallTolerance => "environment.install_tolerance",
            Self::PrivacyPublicSharing => "privacy.public_sharing",
            Self::CostBudget => "cost.budget",
            Self::TimeAvailablePerSession => "time.available_per_session_minutes",
            Self::ToolsAllowed => "tools.allowed",
            Self::NetworkOfflineOk => "network.offline_ok",
        }
    }
}

/// Mental model milestones the user is building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConceptId {
    // Foundations
    #[serde(rename = "concept.input_output")]
    InputOutput,
    #[serde(rename = "concept.variables_and_types")]
    VariablesAndTypes,
    #[serde(rename = "concept.control_flow")]
    ControlFlow,
    #[serde(rename = "concept.functions")]
    Functions,
    #[serde(rename = "concept.errors_and_debugging")]
    ErrorsAndDebugging,
    #[serde(rename = "concept.files_and_paths")]
    FilesAndPaths,
    #[serde(rename = "concept.dependencies")]
    Dependencies,
    #[serde(rename = "concept.versioning_basic")]
    VersioningBasic,

    // App reality
    #[serde(rename = "concept.program_entrypoint")]
    ProgramEntrypoint,
    #[serde(rename = "concept.config_vs_code")]
    ConfigVsCode,
    #[serde(rename = "concept.state_vs_stateless")]
    StateVsStateless,
    #[serde(rename = "concept.reproducible_runs")]
    ReproducibleRuns,
    #[serde(rename = "concept.packaging_basic")]
    PackagingBasic,
    #[serde(rename = "concept.logging_basic")]
    LoggingBasic,

    // Web basics
    #[serde(rename = "concept.http_request_response")]
    HttpRequestResponse,
    #[serde(rename = "concept.api_basics")]
    ApiBasics,
    #[serde(rename = "concept.json_data")]
    JsonData,
    #[serde(rename = "concept.auth_basic")]
    AuthBasic,

    // Workflow meta-skills
    #[serde(rename = "concept.backtracking_is_safe")]
    BacktrackingIsSafe,
    #[serde(rename = "concept.tradeoffs_exist")]
    TradeoffsExist,
    #[serde(rename = "concept.incremental_progress")]
    IncrementalProgress,
    #[serde(rename = "concept.asking_good_questions")]
    AskingGoodQuestions,
}

impl ConceptId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputOutput => "concept.input_output",
            Self::VariablesAndTypes => "concept.variables_and_types",
            Self::ControlFlow => "concept.control_flow",
            Self::Functions => "concept.functions",
            Self::ErrorsAndDebugging => "concept.errors_and_debugging",
            Self::FilesAndPaths => "concept.files_and_paths",
            Self::Dependencies => "concept.dependencies",
            Self::VersioningBasic => "concept.versioning_basic",
            Self::ProgramEntrypoint => "concept.program_entrypoint",
            Self::ConfigVsCode => "concept.config_vs_code",
            Self::StateVsStateless => "concept.state_vs_stateless",
            Self::ReproducibleRuns => "concept.reproducible_runs",
            Self::PackagingBasic => "concept.packaging_basic",
            Self::LoggingBasic => "concept.logging_basic",
            Self::HttpRequestResponse => "concept.http_request_response",
            Self::ApiBasics => "concept.api_basics",
            Self::JsonData => "concept.json_data",
            Self::AuthBasic => "concept.auth_basic",
            Self::BacktrackingIsSafe => "concept.backtracking_is_safe",
            Self::TradeoffsExist => "concept.tradeoffs_exist",
            Self::IncrementalProgress => "concept.incremental_progress",
            Self::AskingGoodQuestions => "concept.asking_good_questions",
        }
    }
}
