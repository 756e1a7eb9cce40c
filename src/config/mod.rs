//! Unified configuration loaded from YAML.
//!
//! Every section is optional in the file and falls back to its defaults,
//! so a partial config (or none at all) is always usable.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Error loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(String),
    /// YAML did not parse into a valid config
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Full segmap configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SegmapConfig {
    /// Persistent map settings
    #[serde(default)]
    pub map: MapSection,

    /// Label voting and merge settings
    #[serde(default)]
    pub labeling: LabelingSection,

    /// Publication settings
    #[serde(default)]
    pub publish: PublishSection,

    /// Stream liveness settings
    #[serde(default)]
    pub liveness: LivenessSection,
}

impl SegmapConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Load from the default config path (configs/config.yaml), falling
    /// back to defaults when the file does not exist.
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new("configs/config.yaml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }

    /// Idle timeout converted to microseconds.
    pub fn idle_timeout_us(&self) -> u64 {
        (self.liveness.idle_timeout_s.max(0.0) * 1_000_000.0) as u64
    }
}

/// Persistent map settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSection {
    /// Voxel edge length in meters
    pub voxel_size: f32,
}

impl Default for MapSection {
    fn default() -> Self {
        Self { voxel_size: 0.05 }
    }
}

/// Label voting and merge settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingSection {
    /// Fraction of a segment's footprint an existing label must cover to
    /// be an assignment candidate
    pub min_overlap_fraction: f32,
    /// Minimum accumulated evidence weight for a merge edge to count
    pub merge_evidence_min: u32,
    /// When false, voting is skipped and every segment gets a fresh label
    pub use_label_propagation: bool,
}

impl Default for LabelingSection {
    fn default() -> Self {
        Self {
            min_overlap_fraction: 0.3,
            merge_evidence_min: 20,
            use_label_propagation: true,
        }
    }
}

/// Publication settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSection {
    /// Default mode for timer-driven publication: all labels vs dirty only
    pub publish_all: bool,
    /// Attach extracted geometry to updates
    pub mesh_on_publish: bool,
    /// Emit scene-level aggregates
    pub scene_updates: bool,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            publish_all: false,
            mesh_on_publish: true,
            scene_updates: true,
        }
    }
}

/// Stream liveness settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessSection {
    /// Seconds without an accepted frame before the stream counts as idle
    pub idle_timeout_s: f32,
}

impl Default for LivenessSection {
    fn default() -> Self {
        Self { idle_timeout_s: 5.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SegmapConfig::default();
        assert_eq!(config.map.voxel_size, 0.05);
        assert_eq!(config.labeling.min_overlap_fraction, 0.3);
        assert!(config.labeling.use_label_propagation);
        assert_eq!(config.idle_timeout_us(), 5_000_000);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = SegmapConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = SegmapConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.map.voxel_size, config.map.voxel_size);
        assert_eq!(parsed.labeling.merge_evidence_min, config.labeling.merge_evidence_min);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed = SegmapConfig::from_yaml("labeling:\n  min_overlap_fraction: 0.5\n").unwrap();
        assert_eq!(parsed.labeling.min_overlap_fraction, 0.5);
        assert_eq!(parsed.map.voxel_size, 0.05);
    }

    #[test]
    fn test_bad_yaml_is_parse_error() {
        assert!(matches!(
            SegmapConfig::from_yaml("map: ["),
            Err(ConfigLoadError::Parse(_))
        ));
    }
}
