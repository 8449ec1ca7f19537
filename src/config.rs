use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub camera: CameraConfig,
    pub model: ModelConfig,
    pub compliance: ComplianceConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    /// Device index (e.g. "0") or a stream URL (e.g. "rtsp://...").
    pub source: String,
    #[serde(default = "default_frame_size")]
    pub frame_width: i32,
    #[serde(default = "default_frame_size")]
    pub frame_height: i32,
    /// Run the detector every N frames; stale results are redrawn in between.
    #[serde(default = "default_detection_stride")]
    pub detection_stride: u64,
}

fn default_frame_size() -> i32 {
    640
}

fn default_detection_stride() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub onnx_file: String,
    pub model_dir: PathBuf,
    pub labels_file: String,
    #[serde(default = "default_model_instances")]
    pub num_instances: usize,
    /// Detector-side probability gate, applied before the row is decoded.
    #[serde(default = "default_min_probability")]
    pub min_probability: f32,
}

fn default_model_instances() -> usize {
    1
}

fn default_min_probability() -> f32 {
    0.7
}

impl ModelConfig {
    pub fn get_model_path(&self) -> PathBuf {
        self.model_dir.join(&self.onnx_file)
    }

    pub fn get_labels_path(&self) -> PathBuf {
        self.model_dir.join(&self.labels_file)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.get_model_path().exists() {
            return Err(format!("Model file not found: {:?}", self.get_model_path()));
        }
        if !self.get_labels_path().exists() {
            return Err(format!(
                "Labels file not found: {:?}",
                self.get_labels_path()
            ));
        }
        Ok(())
    }
}

/// Thresholds and label sets driving the assignment engine. Built once at
/// startup and passed by reference into every component.
#[derive(Debug, Deserialize, Clone)]
pub struct ComplianceConfig {
    /// Parser-side confidence gate; lower-scored detections are dropped.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Fraction of a PPE box that must lie inside the padded person box.
    #[serde(default = "default_containment_threshold")]
    pub containment_threshold: f64,
    /// Symmetric padding around a person box before containment testing.
    #[serde(default = "default_person_pad_px")]
    pub person_pad_px: i32,
    pub person_aliases: HashSet<String>,
    /// Required PPE classes, in display order for missing-item lists.
    pub required_classes: Vec<String>,
    #[serde(default)]
    pub class_synonyms: HashMap<String, String>,
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_containment_threshold() -> f64 {
    0.5
}

fn default_person_pad_px() -> i32 {
    10
}

impl ComplianceConfig {
    pub fn is_person(&self, canonical_label: &str) -> bool {
        self.person_aliases.contains(canonical_label)
    }

    pub fn is_required(&self, canonical_label: &str) -> bool {
        self.required_classes.iter().any(|c| c == canonical_label)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.containment_threshold) {
            return Err(format!(
                "containment_threshold must be in [0, 1], got {}",
                self.containment_threshold
            ));
        }
        if self.required_classes.is_empty() {
            return Err("required_classes must not be empty".to_string());
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.detection_stride == 0 {
            return Err("camera.detection_stride must be at least 1".to_string());
        }
        self.model.validate()?;
        self.compliance.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(format!("{}.yaml", environment.as_str())),
        ))
        .add_source(
            config::Environment::with_prefix("PPE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config = config.try_deserialize::<Config>()?;

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        return Err(config::ConfigError::Message(e));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compliance_config() -> ComplianceConfig {
        ComplianceConfig {
            confidence_threshold: 0.5,
            containment_threshold: 0.5,
            person_pad_px: 10,
            person_aliases: HashSet::from([
                "human".to_string(),
                "person".to_string(),
                "people".to_string(),
            ]),
            required_classes: vec!["mask".to_string()],
            class_synonyms: HashMap::new(),
        }
    }

    #[test]
    fn test_log_level_parsing() {
        assert!(matches!(
            LogLevel::try_from("DEBUG".to_string()),
            Ok(LogLevel::Debug)
        ));
        assert!(matches!(
            LogLevel::try_from("info".to_string()),
            Ok(LogLevel::Info)
        ));
        assert!(LogLevel::try_from("verbose".to_string()).is_err());
    }

    #[test]
    fn test_environment_parsing() {
        assert!(matches!(
            Environment::try_from("Local".to_string()),
            Ok(Environment::Local)
        ));
        assert!(Environment::try_from("staging".to_string()).is_err());
    }

    #[test]
    fn test_compliance_validation() {
        assert!(compliance_config().validate().is_ok());

        let mut cfg = compliance_config();
        cfg.containment_threshold = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = compliance_config();
        cfg.required_classes.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_label_set_membership() {
        let cfg = compliance_config();
        assert!(cfg.is_person("human"));
        assert!(!cfg.is_person("mask"));
        assert!(cfg.is_required("mask"));
        assert!(!cfg.is_required("glove"));
    }
}
