use clap::Parser;
use std::path::PathBuf;

// Build version with stand-in info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Poses:  recorded replay (JSON)\n",
    "Camera: image sequence / test pattern\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Pose-driven physics playground
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Startup query, e.g. "model=blazepose&type=full&backend=tfjs-webgl"
    #[arg(short = 'q', long = "query", value_name = "QUERY")]
    pub query: Option<String>,

    /// Model family (movenet, blazepose, posenet); overrides the query
    #[arg(short = 'm', long = "model", value_name = "MODEL")]
    pub model: Option<String>,

    /// Pose type (lightning|thunder|multipose, lite|full|heavy)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub model_type: Option<String>,

    /// Execution backend (mediapipe-gpu, tfjs-webgl, tfjs-wasm, tfjs-webgpu)
    #[arg(short = 'b', long = "backend", value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Physics scene: 1 = letter chains, 2 = falling objects
    #[arg(short = 's', long = "scene", value_name = "1|2", default_value = "1")]
    pub scene: String,

    /// Image sequence to use as the camera (glob or directory)
    #[arg(short = 'f', long = "frames", value_name = "GLOB|DIR")]
    pub frames: Option<String>,

    /// Pose recording (JSON) replayed as detector output
    #[arg(short = 'p', long = "poses", value_name = "FILE")]
    pub poses: Option<PathBuf>,

    /// Camera target FPS
    #[arg(long = "fps", value_name = "N")]
    pub fps: Option<u32>,

    /// Camera size preset (640x480, 640x360, 360x270, 360x202)
    #[arg(long = "size", value_name = "WxH")]
    pub size: Option<String>,

    /// Max poses for multi-pose models (1-6)
    #[arg(long = "max-poses", value_name = "N")]
    pub max_poses: Option<usize>,

    /// Custom model URL (MoveNet)
    #[arg(long = "model-url", value_name = "URL")]
    pub model_url: Option<String>,

    /// Enable pose tracking (MoveNet multipose)
    #[arg(long = "tracking")]
    pub tracking: bool,

    /// Settings file (default: posefield.json in the config dir)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging to file (default: posefield.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// Startup query with the discrete flags folded in (flags win)
    pub fn startup_query(&self) -> String {
        let mut params: Vec<(String, String)> = self
            .query
            .as_deref()
            .unwrap_or("")
            .trim_start_matches('?')
            .split('&')
            .filter_map(|p| p.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (key, value) in [("model", &self.model), ("type", &self.model_type), ("backend", &self.backend)] {
            if let Some(value) = value {
                params.retain(|(k, _)| k != key);
                params.push((key.to_string(), value.clone()));
            }
        }
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}
