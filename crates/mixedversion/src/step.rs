//! Step catalog: every action an upgrade plan can contain.
//!
//! Steps are plain immutable values. A "changed" step is always a newly
//! constructed value; nothing edits a step once it is part of a plan.

use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use mixedversion_types::{NodeId, StepContext, Version};
use serde::{Deserialize, Serialize};

/// Name of the setting that pins the cluster to its current release.
pub const PRESERVE_DOWNGRADE_OPTION: &str = "cluster.preserve_downgrade_option";

/// Virtual cluster steps target when nothing else is specified.
pub const SYSTEM_VIRTUAL_CLUSTER: &str = "system";

// ============================================================================
// Setting Values
// ============================================================================

/// A value a cluster setting can be set to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Display for SettingValue {
    /// Renders the value as a SQL literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

// ============================================================================
// Step Payloads
// ============================================================================

/// Starts every node of the cluster on `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartClusterStep {
    pub version: Version,
}

/// Pins the cluster version so that it does not auto-upgrade once every
/// node runs the new binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreserveDowngradeOptionStep {
    pub virtual_cluster: String,
    /// Release the cluster is currently on.
    pub version: Version,
}

/// Restarts one node into a different binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartWithNewBinaryStep {
    pub node: NodeId,
    pub version: Version,
}

/// Lets the cluster version advance by resetting the preserve-downgrade
/// option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowUpgradeStep {
    pub virtual_cluster: String,
}

/// Blocks until every node reports the given cluster version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitForStableClusterVersionStep {
    pub version: Version,
}

/// Runs a user-provided hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHookStep {
    pub name: String,
}

/// Sleeps for a fixed amount of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitStep {
    pub duration: Duration,
}

/// `SET CLUSTER SETTING name = value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetClusterSettingStep {
    pub name: String,
    pub value: SettingValue,
    /// At least one node must run this version to service the change.
    pub min_version: Option<Version>,
}

/// `RESET CLUSTER SETTING name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetClusterSettingStep {
    pub name: String,
    pub min_version: Option<Version>,
}

// ============================================================================
// Step
// ============================================================================

/// One action in an upgrade plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    StartCluster(StartClusterStep),
    PreserveDowngradeOption(PreserveDowngradeOptionStep),
    RestartWithNewBinary(RestartWithNewBinaryStep),
    AllowUpgrade(AllowUpgradeStep),
    WaitForStableClusterVersion(WaitForStableClusterVersionStep),
    RunHook(RunHookStep),
    Wait(WaitStep),
    SetClusterSetting(SetClusterSettingStep),
    ResetClusterSetting(ResetClusterSettingStep),
}

/// Discriminant of a [`Step`], for filtering and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepKind {
    StartCluster,
    PreserveDowngradeOption,
    RestartWithNewBinary,
    AllowUpgrade,
    WaitForStableClusterVersion,
    RunHook,
    Wait,
    SetClusterSetting,
    ResetClusterSetting,
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::StartCluster(_) => StepKind::StartCluster,
            Self::PreserveDowngradeOption(_) => StepKind::PreserveDowngradeOption,
            Self::RestartWithNewBinary(_) => StepKind::RestartWithNewBinary,
            Self::AllowUpgrade(_) => StepKind::AllowUpgrade,
            Self::WaitForStableClusterVersion(_) => StepKind::WaitForStableClusterVersion,
            Self::RunHook(_) => StepKind::RunHook,
            Self::Wait(_) => StepKind::Wait,
            Self::SetClusterSetting(_) => StepKind::SetClusterSetting,
            Self::ResetClusterSetting(_) => StepKind::ResetClusterSetting,
        }
    }

    /// Convenience constructor for an allow-upgrade step on the system
    /// virtual cluster.
    pub fn allow_upgrade() -> Self {
        Self::AllowUpgrade(AllowUpgradeStep {
            virtual_cluster: SYSTEM_VIRTUAL_CLUSTER.to_string(),
        })
    }

    /// Returns `true` for SET and RESET cluster setting steps.
    pub fn is_setting_change(&self) -> bool {
        matches!(self, Self::SetClusterSetting(_) | Self::ResetClusterSetting(_))
    }

    /// Minimum version required to run this step, if any.
    pub fn min_version(&self) -> Option<&Version> {
        match self {
            Self::SetClusterSetting(s) => s.min_version.as_ref(),
            Self::ResetClusterSetting(s) => s.min_version.as_ref(),
            _ => None,
        }
    }

    /// The SQL statement this step issues, for steps that talk to the
    /// database directly.
    pub fn sql(&self) -> Option<String> {
        match self {
            Self::PreserveDowngradeOption(s) => Some(format!(
                "SET CLUSTER SETTING {PRESERVE_DOWNGRADE_OPTION} = '{}'",
                s.version.series_string()
            )),
            Self::AllowUpgrade(_) => Some(format!("RESET CLUSTER SETTING {PRESERVE_DOWNGRADE_OPTION}")),
            Self::SetClusterSetting(s) => {
                Some(format!("SET CLUSTER SETTING {} = {}", s.name, s.value))
            }
            Self::ResetClusterSetting(s) => Some(format!("RESET CLUSTER SETTING {}", s.name)),
            Self::StartCluster(_)
            | Self::RestartWithNewBinary(_)
            | Self::WaitForStableClusterVersion(_)
            | Self::RunHook(_)
            | Self::Wait(_) => None,
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartCluster(s) => write!(f, "start cluster at version \"{}\"", s.version),
            Self::PreserveDowngradeOption(s) => write!(
                f,
                "prevent auto-upgrades on {} tenant by setting `preserve_downgrade_option`",
                s.virtual_cluster
            ),
            Self::RestartWithNewBinary(s) => write!(
                f,
                "restart node {} with binary version {}",
                s.node.as_u32(),
                s.version
            ),
            Self::AllowUpgrade(s) => write!(
                f,
                "allow upgrade to happen on {} tenant by resetting `preserve_downgrade_option`",
                s.virtual_cluster
            ),
            Self::WaitForStableClusterVersion(s) => {
                write!(f, "wait for all nodes to acknowledge cluster version {}", s.version)
            }
            Self::RunHook(s) => write!(f, "run {:?}", s.name),
            Self::Wait(s) => write!(f, "wait for {}s", s.duration.as_secs()),
            Self::SetClusterSetting(s) => {
                write!(f, "set cluster setting {:?} to {}", s.name, s.value)
            }
            Self::ResetClusterSetting(s) => write!(f, "reset cluster setting {:?}", s.name),
        }
    }
}

// ============================================================================
// Plan Steps
// ============================================================================

/// Plan-unique identifier of a step, used as a mutation anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepId(u64);

impl StepId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A step bound into a plan, together with the topology it was generated
/// against.
///
/// Contexts are shared: consecutive steps that see the same topology hold
/// the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: StepId,
    pub context: Arc<StepContext>,
    pub step: Step,
}

impl PlanStep {
    pub fn new(id: StepId, context: Arc<StepContext>, step: Step) -> Self {
        Self { id, context, step }
    }

    pub fn kind(&self) -> StepKind {
        self.step.kind()
    }
}
