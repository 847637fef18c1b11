//! Engine configuration document.
//!
//! The engine consumes a single JSON object at `init`. Key order and
//! separators follow the engine's documented schema: `"key": value` pairs
//! joined by `,` and arrays rendered as `[0, 0, 0, 0]`.

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

/// Which variant of the configuration schema to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigProfile {
    /// Base schema: face detection, liveness and disguise detection.
    #[default]
    Liveness,
    /// Base schema plus explicit liveness switch and deepfake detection, all enabled.
    Full,
    /// Deepfake detection only, tuned for smaller faces (video frames).
    Deepfake,
}

impl ConfigProfile {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "liveness" => Some(ConfigProfile::Liveness),
            "full" => Some(ConfigProfile::Full),
            "deepfake" => Some(ConfigProfile::Deepfake),
            _ => None,
        }
    }
}

/// Deepfake detector section, present in the `Full` and `Deepfake` profiles.
#[derive(Debug, Clone, Serialize)]
pub struct DeepfakeOptions {
    pub deepfake_detect_enabled: bool,
    pub deepfake_tf_num_threads: i32,
    pub deepfake_tf_gpu_memory_alloc_max_percent: f64,
    pub deepfake_minscore: f64,
}

impl Default for DeepfakeOptions {
    fn default() -> Self {
        Self {
            deepfake_detect_enabled: true,
            deepfake_tf_num_threads: -1,
            deepfake_tf_gpu_memory_alloc_max_percent: 0.2,
            deepfake_minscore: 0.5,
        }
    }
}

/// Immutable engine configuration. Field order is the serialized key order.
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    debug_level: &'static str,
    debug_write_input_image_enabled: bool,
    debug_internal_data_path: &'static str,

    num_threads: i32,
    gpgpu_enabled: bool,
    max_latency: i32,
    image_interpolation: &'static str,
    asm_enabled: bool,
    intrin_enabled: bool,

    openvino_enabled: bool,
    openvino_device: &'static str,

    detect_tf_num_threads: i32,
    detect_tf_gpu_memory_alloc_max_percent: f64,
    detect_roi: [i32; 4],
    detect_minscore: f64,
    detect_face_minsize: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    liveness_detect_enabled: Option<bool>,
    liveness_tf_num_threads: i32,
    liveness_tf_gpu_memory_alloc_max_percent: f64,
    liveness_face_minsize: u32,
    liveness_genuine_minscore: f64,
    liveness_disputed_minscore: f64,
    liveness_toofar_threshold: f64,

    #[serde(flatten)]
    deepfake: Option<DeepfakeOptions>,

    disguise_detect_enabled: bool,
    disguise_tf_num_threads: i32,
    disguise_tf_gpu_memory_alloc_max_percent: f64,
    disguise_minscore: f64,

    assets_folder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_token_file: Option<String>,
    license_token_data: String,
}

impl EngineConfig {
    /// Build the configuration for `profile` with the two caller-supplied values.
    ///
    /// Values are embedded as given; the engine is the one that validates them.
    pub fn new(profile: ConfigProfile, assets_folder: &str, license_token_data: &str) -> Self {
        let mut config = Self {
            debug_level: "info",
            debug_write_input_image_enabled: false,
            debug_internal_data_path: ".",

            num_threads: -1,
            gpgpu_enabled: true,
            max_latency: -1,
            image_interpolation: "bicubic",
            asm_enabled: true,
            intrin_enabled: true,

            openvino_enabled: false,
            openvino_device: "CPU",

            detect_tf_num_threads: -1,
            detect_tf_gpu_memory_alloc_max_percent: 0.2,
            detect_roi: [0, 0, 0, 0],
            detect_minscore: 0.9,
            detect_face_minsize: 128,

            liveness_detect_enabled: None,
            liveness_tf_num_threads: -1,
            liveness_tf_gpu_memory_alloc_max_percent: 0.2,
            liveness_face_minsize: 128,
            liveness_genuine_minscore: 0.98,
            liveness_disputed_minscore: 0.5,
            liveness_toofar_threshold: 0.5,

            deepfake: None,

            disguise_detect_enabled: true,
            disguise_tf_num_threads: -1,
            disguise_tf_gpu_memory_alloc_max_percent: 0.2,
            disguise_minscore: 0.5,

            assets_folder: assets_folder.to_string(),
            license_token_file: None,
            license_token_data: license_token_data.to_string(),
        };

        match profile {
            ConfigProfile::Liveness => {}
            ConfigProfile::Full => {
                config.liveness_detect_enabled = Some(true);
                config.deepfake = Some(DeepfakeOptions::default());
            }
            ConfigProfile::Deepfake => {
                config.detect_face_minsize = 64;
                config.liveness_face_minsize = 64;
                config.liveness_detect_enabled = Some(false);
                config.deepfake = Some(DeepfakeOptions::default());
                config.disguise_detect_enabled = false;
            }
        }

        config
    }

    /// Point the engine at a license token file in addition to inline token data.
    pub fn with_license_token_file(mut self, path: impl Into<String>) -> Self {
        self.license_token_file = Some(path.into());
        self
    }

    /// Render the JSON document passed to the engine's `init`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        render(self)
    }
}

/// Render the base-schema configuration for the two caller-supplied values.
///
/// Deterministic: identical inputs always produce identical text.
pub fn build_config_json(
    assets_folder: &str,
    license_token_base64: &str,
) -> serde_json::Result<String> {
    EngineConfig::new(ConfigProfile::Liveness, assets_folder, license_token_base64).to_json()
}

/// Configuration for the runtime license key request. Only the keys needed
/// to locate the license manager are sent.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeKeyConfig {
    pub assets_folder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_type: Option<String>,
}

impl RuntimeKeyConfig {
    pub fn to_json(&self) -> serde_json::Result<String> {
        render(self)
    }
}

fn render<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut out = Vec::with_capacity(1024);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SchemaFormatter);
    value.serialize(&mut ser)?;
    String::from_utf8(out).map_err(|e| <serde_json::Error as serde::ser::Error>::custom(e))
}

/// Compact output with a space after `:` and after array commas.
struct SchemaFormatter;

impl Formatter for SchemaFormatter {
    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIVENESS_MODELS: &str = concat!(
        "{",
        "\"debug_level\": \"info\",",
        "\"debug_write_input_image_enabled\": false,",
        "\"debug_internal_data_path\": \".\",",
        "\"num_threads\": -1,",
        "\"gpgpu_enabled\": true,",
        "\"max_latency\": -1,",
        "\"image_interpolation\": \"bicubic\",",
        "\"asm_enabled\": true,",
        "\"intrin_enabled\": true,",
        "\"openvino_enabled\": false,",
        "\"openvino_device\": \"CPU\",",
        "\"detect_tf_num_threads\": -1,",
        "\"detect_tf_gpu_memory_alloc_max_percent\": 0.2,",
        "\"detect_roi\": [0, 0, 0, 0],",
        "\"detect_minscore\": 0.9,",
        "\"detect_face_minsize\": 128,",
        "\"liveness_tf_num_threads\": -1,",
        "\"liveness_tf_gpu_memory_alloc_max_percent\": 0.2,",
        "\"liveness_face_minsize\": 128,",
        "\"liveness_genuine_minscore\": 0.98,",
        "\"liveness_disputed_minscore\": 0.5,",
        "\"liveness_toofar_threshold\": 0.5,",
        "\"disguise_detect_enabled\": true,",
        "\"disguise_tf_num_threads\": -1,",
        "\"disguise_tf_gpu_memory_alloc_max_percent\": 0.2,",
        "\"disguise_minscore\": 0.5,",
        "\"assets_folder\": \"./models\",",
        "\"license_token_data\": \"\"",
        "}"
    );

    fn keys(json: &str) -> Vec<String> {
        // serde_json's default map is sorted; walk the text instead to keep order.
        json.split(",\"")
            .map(|chunk| {
                let chunk = chunk.trim_start_matches('{').trim_start_matches('"');
                chunk.split('"').next().unwrap_or_default().to_string()
            })
            .collect()
    }

    #[test]
    fn test_liveness_schema_text() {
        let json = build_config_json("./models", "").unwrap();
        assert_eq!(json, LIVENESS_MODELS);
    }

    #[test]
    fn test_builder_is_deterministic() {
        let a = build_config_json("/opt/assets", "dG9rZW4=").unwrap();
        let b = build_config_json("/opt/assets", "dG9rZW4=").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_is_valid_json() {
        let json = build_config_json("/opt/assets", "dG9rZW4=").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["assets_folder"], "/opt/assets");
        assert_eq!(value["license_token_data"], "dG9rZW4=");
        assert_eq!(value["detect_roi"], serde_json::json!([0, 0, 0, 0]));
    }

    #[test]
    fn test_values_pass_through_unvalidated() {
        let json = build_config_json("not a real folder", "%%%").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["assets_folder"], "not a real folder");
        assert_eq!(value["license_token_data"], "%%%");
    }

    #[test]
    fn test_full_profile_adds_sections_in_order() {
        let json = EngineConfig::new(ConfigProfile::Full, "a", "t").to_json().unwrap();
        let keys = keys(&json);
        let pos = |k: &str| keys.iter().position(|x| x == k).unwrap();
        assert!(pos("detect_face_minsize") < pos("liveness_detect_enabled"));
        assert!(pos("liveness_detect_enabled") < pos("liveness_tf_num_threads"));
        assert!(pos("liveness_toofar_threshold") < pos("deepfake_detect_enabled"));
        assert!(pos("deepfake_minscore") < pos("disguise_detect_enabled"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["liveness_detect_enabled"], true);
        assert_eq!(value["deepfake_detect_enabled"], true);
        assert_eq!(value["detect_face_minsize"], 128);
    }

    #[test]
    fn test_deepfake_profile_thresholds() {
        let json = EngineConfig::new(ConfigProfile::Deepfake, "a", "").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["detect_face_minsize"], 64);
        assert_eq!(value["liveness_face_minsize"], 64);
        assert_eq!(value["liveness_detect_enabled"], false);
        assert_eq!(value["disguise_detect_enabled"], false);
        assert_eq!(value["deepfake_minscore"], 0.5);
    }

    #[test]
    fn test_base_profile_has_no_deepfake_keys() {
        let json = build_config_json("a", "").unwrap();
        assert!(!json.contains("deepfake"));
        assert!(!json.contains("liveness_detect_enabled"));
        assert!(!json.contains("license_token_file"));
    }

    #[test]
    fn test_token_file_sits_between_assets_and_data() {
        let json = EngineConfig::new(ConfigProfile::Liveness, "a", "t")
            .with_license_token_file("/etc/fld/license.lic")
            .to_json()
            .unwrap();
        assert!(json.ends_with(
            "\"assets_folder\": \"a\",\"license_token_file\": \"/etc/fld/license.lic\",\"license_token_data\": \"t\"}"
        ));
    }

    #[test]
    fn test_runtime_key_config() {
        let cfg = RuntimeKeyConfig {
            assets_folder: "./assets".into(),
            host_type: Some("aws-instance".into()),
        };
        assert_eq!(
            cfg.to_json().unwrap(),
            "{\"assets_folder\": \"./assets\",\"host_type\": \"aws-instance\"}"
        );
        let bare = RuntimeKeyConfig {
            assets_folder: "./assets".into(),
            host_type: None,
        };
        assert_eq!(bare.to_json().unwrap(), "{\"assets_folder\": \"./assets\"}");
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(ConfigProfile::parse("full"), Some(ConfigProfile::Full));
        assert_eq!(ConfigProfile::parse("deepfake"), Some(ConfigProfile::Deepfake));
        assert_eq!(ConfigProfile::parse("other"), None);
    }
}
