//! Compute runtime resource as observed from the Workbench API.
//!
//! The orchestration service owns runtimes; this side only reads them and asks for
//! transitions. Unknown JSON fields are carried through untouched so a runtime that
//! was fetched can be posted back to `createRuntime` without losing data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status reported for a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeStatus {
    Creating,
    Starting,
    Running,
    Updating,
    Stopping,
    Stopped,
    Deleting,
    Deleted,
    Error,
    #[serde(other)]
    Unknown,
}

impl RuntimeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RuntimeStatus::Creating => "Creating",
            RuntimeStatus::Starting => "Starting",
            RuntimeStatus::Running => "Running",
            RuntimeStatus::Updating => "Updating",
            RuntimeStatus::Stopping => "Stopping",
            RuntimeStatus::Stopped => "Stopped",
            RuntimeStatus::Deleting => "Deleting",
            RuntimeStatus::Deleted => "Deleted",
            RuntimeStatus::Error => "Error",
            RuntimeStatus::Unknown => "Unknown",
        }
    }

    /// Statuses the remote service is still moving through on its own.
    #[must_use]
    pub const fn is_transitional(self) -> bool {
        matches!(
            self,
            RuntimeStatus::Creating
                | RuntimeStatus::Starting
                | RuntimeStatus::Updating
                | RuntimeStatus::Stopping
                | RuntimeStatus::Deleting
        )
    }
}

impl std::fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sent as `GeneralAnalysis`; the `GENERAL_ANALYSIS` spelling is accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeConfigurationType {
    #[serde(alias = "GENERAL_ANALYSIS")]
    GeneralAnalysis,
    #[serde(alias = "HAIL_GENOMIC_ANALYSIS")]
    HailGenomicAnalysis,
    #[serde(alias = "USER_OVERRIDE")]
    UserOverride,
    /// A value this client does not know. Never sent back.
    #[serde(other)]
    Unknown,
}

impl RuntimeConfigurationType {
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, RuntimeConfigurationType::Unknown)
    }
}

#[allow(clippy::ref_option)]
fn omit_configuration_type(kind: &Option<RuntimeConfigurationType>) -> bool {
    !kind.is_some_and(RuntimeConfigurationType::is_known)
}

/// Every field is optional; unmodeled ones ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataprocConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_machine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_disk_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_machine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_disk_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_preemptible_workers: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A runtime record.
///
/// Everything except the identity and lifecycle fields is optional on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RuntimeStatus>,
    #[serde(default, skip_serializing_if = "omit_configuration_type")]
    pub configuration_type: Option<RuntimeConfigurationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gce_config: Option<GceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataproc_config: Option<DataprocConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Runtime {
    #[must_use]
    pub fn has_status(&self, status: RuntimeStatus) -> bool {
        self.status == Some(status)
    }

    /// `project/name`, for log lines and error messages.
    #[must_use]
    pub fn display_id(&self) -> String {
        format!(
            "{}/{}",
            self.google_project.as_deref().unwrap_or("?"),
            self.runtime_name.as_deref().unwrap_or("?")
        )
    }
}

// ============================================================================
// Presets
// ============================================================================

/// A named runtime configuration offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimePreset {
    GeneralAnalysis,
    HailAnalysis,
}

impl RuntimePreset {
    pub const ALL: [RuntimePreset; 2] =
        [RuntimePreset::GeneralAnalysis, RuntimePreset::HailAnalysis];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            RuntimePreset::GeneralAnalysis => "General Analysis",
            RuntimePreset::HailAnalysis => "Hail Genomics Analysis",
        }
    }

    #[must_use]
    pub const fn configuration_type(self) -> RuntimeConfigurationType {
        match self {
            RuntimePreset::GeneralAnalysis => RuntimeConfigurationType::GeneralAnalysis,
            RuntimePreset::HailAnalysis => RuntimeConfigurationType::HailGenomicAnalysis,
        }
    }

    #[must_use]
    pub fn for_configuration_type(kind: RuntimeConfigurationType) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.configuration_type() == kind)
    }

    /// The runtime body sent when creating a runtime from this preset.
    #[must_use]
    pub fn template(self) -> Runtime {
        match self {
            RuntimePreset::GeneralAnalysis => Runtime {
                configuration_type: Some(self.configuration_type()),
                gce_config: Some(GceConfig {
                    machine_type: Some("n1-standard-4".to_string()),
                    disk_size: Some(100),
                    ..GceConfig::default()
                }),
                ..Runtime::default()
            },
            RuntimePreset::HailAnalysis => Runtime {
                configuration_type: Some(self.configuration_type()),
                dataproc_config: Some(DataprocConfig {
                    master_machine_type: Some("n1-standard-4".to_string()),
                    master_disk_size: Some(100),
                    worker_machine_type: Some("n1-standard-4".to_string()),
                    worker_disk_size: Some(100),
                    number_of_workers: Some(2),
                    number_of_preemptible_workers: Some(0),
                    ..DataprocConfig::default()
                }),
                ..Runtime::default()
            },
        }
    }
}

/// Refresh a preset-typed runtime with the current preset values.
///
/// User-customized runtimes, and runtimes without a configuration type, are returned
/// unchanged.
#[must_use]
pub fn apply_preset_override(runtime: &Runtime) -> Runtime {
    let Some(preset) = runtime
        .configuration_type
        .and_then(RuntimePreset::for_configuration_type)
    else {
        return runtime.clone();
    };

    let template = preset.template();
    Runtime {
        gce_config: template.gce_config,
        dataproc_config: template.dataproc_config,
        ..runtime.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_and_keeps_unknown_fields() {
        let runtime: Runtime = serde_json::from_value(json!({
            "runtimeName": "rt-1",
            "googleProject": "proj-1",
            "status": "Running",
            "configurationType": "USER_OVERRIDE",
            "gceConfig": {"machineType": "n1-standard-16", "diskSize": 777},
            "toolDockerImage": "docker"
        }))
        .unwrap();

        assert_eq!(runtime.status, Some(RuntimeStatus::Running));
        assert_eq!(
            runtime.configuration_type,
            Some(RuntimeConfigurationType::UserOverride)
        );
        assert_eq!(runtime.gce_config.as_ref().unwrap().disk_size, Some(777));
        assert_eq!(runtime.extra.get("toolDockerImage"), Some(&json!("docker")));

        let back = serde_json::to_value(&runtime).unwrap();
        assert_eq!(back["toolDockerImage"], json!("docker"));
        assert_eq!(back["gceConfig"]["machineType"], json!("n1-standard-16"));
    }

    #[test]
    fn configuration_type_accepts_both_spellings() {
        for raw in ["GeneralAnalysis", "GENERAL_ANALYSIS"] {
            let runtime: Runtime =
                serde_json::from_value(json!({"configurationType": raw})).unwrap();
            assert_eq!(
                runtime.configuration_type,
                Some(RuntimeConfigurationType::GeneralAnalysis)
            );
        }
        let body = serde_json::to_value(RuntimePreset::HailAnalysis.template()).unwrap();
        assert_eq!(body["configurationType"], json!("HailGenomicAnalysis"));
    }

    #[test]
    fn unrecognized_status_maps_to_unknown() {
        let runtime: Runtime = serde_json::from_value(json!({"status": "Hibernating"})).unwrap();
        assert_eq!(runtime.status, Some(RuntimeStatus::Unknown));
    }

    #[test]
    fn unlisted_configuration_type_and_partial_configs_still_decode() {
        let runtime: Runtime = serde_json::from_value(json!({
            "status": "Running",
            "configurationType": "GpuAnalysis",
            "gceConfig": {"machineType": "n1-standard-4", "gpuConfig": {"numOfGpus": 1}},
            "dataprocConfig": {"numberOfWorkers": 3},
        }))
        .unwrap();

        assert_eq!(
            runtime.configuration_type,
            Some(RuntimeConfigurationType::Unknown)
        );
        let gce = runtime.gce_config.as_ref().unwrap();
        assert_eq!(gce.disk_size, None);
        assert_eq!(gce.extra["gpuConfig"], json!({"numOfGpus": 1}));
        assert_eq!(runtime.dataproc_config.as_ref().unwrap().number_of_workers, Some(3));
        assert_eq!(apply_preset_override(&runtime), runtime);

        let back = serde_json::to_value(&runtime).unwrap();
        assert!(back.get("configurationType").is_none(), "{back}");
        assert_eq!(back["gceConfig"]["gpuConfig"]["numOfGpus"], json!(1));
    }

    #[test]
    fn preset_override_replaces_stale_preset_config() {
        let stale = Runtime {
            runtime_name: Some("rt".to_string()),
            configuration_type: Some(RuntimeConfigurationType::GeneralAnalysis),
            gce_config: Some(GceConfig {
                machine_type: Some("n1-standard-16".to_string()),
                disk_size: Some(777),
                ..GceConfig::default()
            }),
            status: Some(RuntimeStatus::Deleted),
            ..Runtime::default()
        };

        let refreshed = apply_preset_override(&stale);
        assert_eq!(
            refreshed.gce_config,
            RuntimePreset::GeneralAnalysis.template().gce_config
        );
        assert_eq!(refreshed.runtime_name.as_deref(), Some("rt"));
    }

    #[test]
    fn preset_override_keeps_user_override() {
        let custom = Runtime {
            configuration_type: Some(RuntimeConfigurationType::UserOverride),
            gce_config: Some(GceConfig {
                machine_type: Some("n1-standard-16".to_string()),
                disk_size: Some(777),
                ..GceConfig::default()
            }),
            ..Runtime::default()
        };

        assert_eq!(apply_preset_override(&custom), custom);
    }

    #[test]
    fn hail_preset_round_trips_through_configuration_type() {
        let preset =
            RuntimePreset::for_configuration_type(RuntimeConfigurationType::HailGenomicAnalysis);
        assert_eq!(preset, Some(RuntimePreset::HailAnalysis));
        assert!(preset.unwrap().template().dataproc_config.is_some());
        assert_eq!(
            RuntimePreset::for_configuration_type(RuntimeConfigurationType::UserOverride),
            None
        );
    }

    #[test]
    fn transitional_statuses() {
        assert!(RuntimeStatus::Creating.is_transitional());
        assert!(RuntimeStatus::Deleting.is_transitional());
        assert!(!RuntimeStatus::Running.is_transitional());
        assert!(!RuntimeStatus::Error.is_transitional());
    }
}
