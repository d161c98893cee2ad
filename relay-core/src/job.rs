use std::path::PathBuf;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::{fetch_asset, Config, Error, InferenceClient};

/// Validated per-job parameters pulled out of the job input.
#[derive(Debug, Clone)]
pub struct JobInput {
    pub lora_link: Url,
    pub lora_name: String,
}

impl JobInput {
    /// Validate the required keys of a job input mapping.
    ///
    /// Only `lora_link` and `lora_name` are inspected; the rest of the
    /// mapping is forwarded to the inference endpoint untouched.
    pub fn from_value(input: &Value) -> Result<Self, Error> {
        let lora_link = required_str(input, "lora_link")?;
        let lora_name = required_str(input, "lora_name")?;

        let lora_link = Url::parse(lora_link).map_err(|e| Error::InvalidField {
            field: "lora_link",
            reason: e.to_string(),
        })?;
        match lora_link.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Error::InvalidField {
                    field: "lora_link",
                    reason: format!("unsupported URL scheme `{scheme}`"),
                });
            }
        }

        // The name becomes a single path component under the LoRA directory.
        if lora_name.contains('/') || lora_name.contains('\\') || lora_name == ".." {
            return Err(Error::InvalidField {
                field: "lora_name",
                reason: "must be a bare filename".to_string(),
            });
        }

        Ok(Self {
            lora_link,
            lora_name: lora_name.to_string(),
        })
    }
}

fn required_str<'a>(input: &'a Value, field: &'static str) -> Result<&'a str, Error> {
    let value = input.get(field).ok_or(Error::MissingField(field))?;
    let value = value.as_str().ok_or_else(|| Error::InvalidField {
        field,
        reason: "expected a string".to_string(),
    })?;
    if value.is_empty() {
        return Err(Error::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(value)
}

/// Per-process worker wiring: one pooled HTTP client shared by the
/// readiness probe, the downloader, and the inference calls.
pub struct Worker {
    http: Client,
    inference: InferenceClient,
    lora_dir: PathBuf,
}

impl Worker {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http = Client::builder().build()?;
        let inference = InferenceClient::new(http.clone(), config);
        Ok(Self {
            http,
            inference,
            lora_dir: config.lora_dir.clone(),
        })
    }

    /// The shared HTTP client, exposed for the startup readiness probe.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Handle one job: stage the LoRA file, then run inference with the
    /// original input and return the endpoint's JSON verbatim.
    ///
    /// The download must succeed before inference is attempted; a failure
    /// at either stage fails the whole job.
    pub async fn handle(&self, job: &Value) -> Result<Value, Error> {
        let input = job.get("input").ok_or(Error::MissingField("input"))?;
        let params = JobInput::from_value(input)?;

        fetch_asset(
            &self.http,
            params.lora_link.as_str(),
            &params.lora_name,
            &self.lora_dir,
        )
        .await?;

        self.inference.txt2img(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_input() {
        let input = json!({
            "lora_link": "http://example.com/style.safetensors",
            "lora_name": "style.safetensors",
            "prompt": "cat"
        });
        let parsed = JobInput::from_value(&input).unwrap();
        assert_eq!(
            parsed.lora_link.as_str(),
            "http://example.com/style.safetensors"
        );
        assert_eq!(parsed.lora_name, "style.safetensors");
    }

    #[test]
    fn missing_link_is_named() {
        let input = json!({ "lora_name": "style.safetensors" });
        match JobInput::from_value(&input) {
            Err(Error::MissingField("lora_link")) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_name_is_named() {
        let input = json!({ "lora_link": "http://example.com/a.bin" });
        match JobInput::from_value(&input) {
            Err(Error::MissingField("lora_name")) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_string_fields() {
        let input = json!({ "lora_link": 42, "lora_name": "a.bin" });
        match JobInput::from_value(&input) {
            Err(Error::InvalidField { field: "lora_link", .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_http_schemes() {
        let input = json!({
            "lora_link": "file:///etc/passwd",
            "lora_name": "a.bin"
        });
        assert!(matches!(
            JobInput::from_value(&input),
            Err(Error::InvalidField { field: "lora_link", .. })
        ));
    }

    #[test]
    fn accepts_names_with_consecutive_dots() {
        let input = json!({
            "lora_link": "http://example.com/a.bin",
            "lora_name": "v2..final.safetensors"
        });
        let parsed = JobInput::from_value(&input).unwrap();
        assert_eq!(parsed.lora_name, "v2..final.safetensors");
    }

    #[test]
    fn rejects_parent_dir_and_separator_names() {
        for name in ["..", "a\\b", "sub/dir.bin"] {
            let input = json!({
                "lora_link": "http://example.com/a.bin",
                "lora_name": name
            });
            assert!(
                matches!(
                    JobInput::from_value(&input),
                    Err(Error::InvalidField { field: "lora_name", .. })
                ),
                "expected `{name}` to be rejected"
            );
        }
    }

    #[test]
    fn rejects_path_traversal_names() {
        let input = json!({
            "lora_link": "http://example.com/a.bin",
            "lora_name": "../../etc/passwd"
        });
        assert!(matches!(
            JobInput::from_value(&input),
            Err(Error::InvalidField { field: "lora_name", .. })
        ));
    }
}
