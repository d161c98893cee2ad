use std::path::PathBuf;
use std::time::Duration;

use crate::infer::RetryPolicy;

/// Base URL of the WebUI API on the pod.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:3000/sdapi/v1";

/// Directory the WebUI loads LoRA weights from.
pub const DEFAULT_LORA_DIR: &str = "/stable-diffusion-webui/models/Lora";

/// Process-wide settings. `Default` matches the pod layout this worker
/// ships alongside.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub lora_dir: PathBuf,
    /// Per-attempt timeout for the startup readiness probe.
    pub probe_timeout: Duration,
    /// Pause between readiness attempts.
    pub probe_delay: Duration,
    /// Inference request timeout. Image generation is slow, so this is
    /// generous.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            lora_dir: PathBuf::from(DEFAULT_LORA_DIR),
            probe_timeout: Duration::from_secs(120),
            probe_delay: Duration::from_millis(200),
            request_timeout: Duration::from_secs(600),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Full URL of the synchronous generation endpoint.
    pub fn txt2img_url(&self) -> String {
        format!("{}/txt2img", self.api_base.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt2img_url_joins_base() {
        let config = Config::default();
        assert_eq!(
            config.txt2img_url(),
            "http://127.0.0.1:3000/sdapi/v1/txt2img"
        );
    }

    #[test]
    fn txt2img_url_tolerates_trailing_slash() {
        let config = Config {
            api_base: "http://localhost:3000/sdapi/v1/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.txt2img_url(), "http://localhost:3000/sdapi/v1/txt2img");
    }
}
