//! Execution backends and their tunable environment flags.
//!
//! A backend name is `<runtime>-<device>` (e.g. `tfjs-webgl`). The runtime prefix
//! decides how a model is loaded; the flags tune the runtime once it is selected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Execution backend a detector runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    #[serde(rename = "mediapipe-gpu")]
    MediapipeGpu,
    #[serde(rename = "tfjs-webgl")]
    TfjsWebgl,
    #[serde(rename = "tfjs-wasm")]
    TfjsWasm,
    #[serde(rename = "tfjs-webgpu")]
    TfjsWebgpu,
}

/// Runtime family (prefix of the backend name)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Mediapipe,
    Tfjs,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::Mediapipe => "mediapipe",
            Runtime::Tfjs => "tfjs",
        }
    }
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::MediapipeGpu,
        Backend::TfjsWebgl,
        Backend::TfjsWasm,
        Backend::TfjsWebgpu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::MediapipeGpu => "mediapipe-gpu",
            Backend::TfjsWebgl => "tfjs-webgl",
            Backend::TfjsWasm => "tfjs-wasm",
            Backend::TfjsWebgpu => "tfjs-webgpu",
        }
    }

    /// Runtime name: everything before the first '-'
    pub fn runtime_name(&self) -> &'static str {
        let name = self.as_str();
        name.split('-').next().unwrap_or(name)
    }

    pub fn runtime(&self) -> Runtime {
        match self {
            Backend::MediapipeGpu => Runtime::Mediapipe,
            _ => Runtime::Tfjs,
        }
    }

    /// Environment flags that apply to this backend
    pub fn tunable_flags(&self) -> &'static [&'static str] {
        match self {
            Backend::TfjsWebgl => &[
                WEBGL_VERSION,
                WEBGL_CPU_FORWARD,
                WEBGL_PACK,
                WEBGL_FORCE_F16_TEXTURES,
                WEBGL_RENDER_FLOAT32_CAPABLE,
                WEBGL_FLUSH_THRESHOLD,
            ],
            Backend::TfjsWasm => &[WASM_HAS_SIMD_SUPPORT, WASM_HAS_MULTITHREAD_SUPPORT],
            Backend::MediapipeGpu | Backend::TfjsWebgpu => &[],
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown backend: {}", s))
    }
}

// ============================================================================
// ENVIRONMENT FLAGS
// ============================================================================

pub const WEBGL_VERSION: &str = "WEBGL_VERSION";
pub const WEBGL_CPU_FORWARD: &str = "WEBGL_CPU_FORWARD";
pub const WEBGL_PACK: &str = "WEBGL_PACK";
pub const WEBGL_FORCE_F16_TEXTURES: &str = "WEBGL_FORCE_F16_TEXTURES";
pub const WEBGL_RENDER_FLOAT32_CAPABLE: &str = "WEBGL_RENDER_FLOAT32_CAPABLE";
pub const WEBGL_FLUSH_THRESHOLD: &str = "WEBGL_FLUSH_THRESHOLD";
pub const WASM_HAS_SIMD_SUPPORT: &str = "WASM_HAS_SIMD_SUPPORT";
pub const WASM_HAS_MULTITHREAD_SUPPORT: &str = "WASM_HAS_MULTITHREAD_SUPPORT";

const WEBGL_VERSION_VALUES: [f32; 2] = [1.0, 2.0];
const FLUSH_THRESHOLD_VALUES: [f32; 10] = [-1.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Value of a single environment flag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Number(f32),
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Allowed values for a flag
pub fn flag_values(name: &str) -> Vec<FlagValue> {
    match name {
        WEBGL_VERSION => WEBGL_VERSION_VALUES.iter().map(|v| FlagValue::Number(*v)).collect(),
        WEBGL_FLUSH_THRESHOLD => FLUSH_THRESHOLD_VALUES.iter().map(|v| FlagValue::Number(*v)).collect(),
        _ => vec![FlagValue::Bool(true), FlagValue::Bool(false)],
    }
}

/// Check a value against the flag's allowed set
pub fn is_valid_flag_value(name: &str, value: FlagValue) -> bool {
    flag_values(name).contains(&value)
}

/// Named environment flags (sorted for stable display)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvFlags(BTreeMap<String, FlagValue>);

impl EnvFlags {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Stock flag values for a backend
    pub fn defaults_for(backend: Backend) -> Self {
        let mut flags = Self::new();
        for name in backend.tunable_flags() {
            let value = match *name {
                WEBGL_VERSION => FlagValue::Number(2.0),
                WEBGL_FLUSH_THRESHOLD => FlagValue::Number(-1.0),
                WEBGL_FORCE_F16_TEXTURES => FlagValue::Bool(false),
                _ => FlagValue::Bool(true),
            };
            flags.0.insert(name.to_string(), value);
        }
        flags
    }

    pub fn get(&self, name: &str) -> Option<FlagValue> {
        self.0.get(name).copied()
    }

    pub fn set(&mut self, name: &str, value: FlagValue) {
        self.0.insert(name.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FlagValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
