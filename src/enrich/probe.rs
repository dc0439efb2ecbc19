//! Chapter probes.
//!
//! The production probe shells out to `ffprobe`; tests plug in their own
//! implementation of [`ChapterProbe`].

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::EnrichSettings;
use crate::domain::Chapter;

/// Source of chapter markers for one media file
#[async_trait]
pub trait ChapterProbe: Send + Sync {
    /// Human-readable probe name
    fn name(&self) -> &str;

    /// Chapters of the file at `target` (a path or URL), in file order
    async fn probe(&self, target: &str) -> Result<Vec<Chapter>>;
}

/// ffprobe JSON output, chapters section only
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    chapters: Vec<ProbeChapter>,
}

#[derive(Debug, Deserialize)]
struct ProbeChapter {
    start_time: String,
    #[serde(default)]
    tags: ProbeTags,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    #[serde(default)]
    title: String,
}

/// Probe using the ffprobe binary
pub struct FfprobeProbe {
    binary_path: String,
    timeout: Duration,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::from_settings(&EnrichSettings::default())
    }
}

impl FfprobeProbe {
    pub fn from_settings(settings: &EnrichSettings) -> Self {
        Self::with_binary_path(settings.probe_binary.clone(), settings.probe_timeout())
    }

    /// Create a probe with a custom binary path
    pub fn with_binary_path(binary_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ChapterProbe for FfprobeProbe {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn probe(&self, target: &str) -> Result<Vec<Chapter>> {
        let child = Command::new(&self.binary_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_chapters"])
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = timeout(self.timeout, child)
            .await
            .with_context(|| format!("ffprobe timed out after {:?} on {}", self.timeout, target))?
            .with_context(|| format!("Failed to run {}", self.binary_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "ffprobe failed on {} with exit code {}: {}",
                target,
                exit_code,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8(output.stdout).context("ffprobe output is not valid UTF-8")?;
        parse_chapters(&stdout)
    }
}

/// Parse ffprobe `-show_chapters` JSON; start times are truncated to seconds
fn parse_chapters(json: &str) -> Result<Vec<Chapter>> {
    let output: ProbeOutput = serde_json::from_str(json).context("Failed to parse ffprobe JSON")?;

    output
        .chapters
        .into_iter()
        .map(|c| {
            let seconds: f64 = c
                .start_time
                .trim()
                .parse()
                .with_context(|| format!("Invalid chapter start time: {}", c.start_time))?;

            Ok(Chapter {
                title: c.tags.title,
                start_time: seconds.max(0.0) as u64,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chapters() {
        let json = r#"{
            "chapters": [
                {
                    "id": 0, "start_time": "0.000000", "end_time": "61.5",
                    "tags": {"title": "Opening"}
                },
                {
                    "id": 1, "start_time": "61.900000", "end_time": "300.0",
                    "tags": {"title": "Part One"}
                },
                {"id": 2, "start_time": "300.000000", "end_time": "400.0"}
            ]
        }"#;

        let chapters = parse_chapters(json).unwrap();
        assert_eq!(
            chapters,
            vec![
                Chapter {
                    title: "Opening".to_string(),
                    start_time: 0
                },
                Chapter {
                    title: "Part One".to_string(),
                    start_time: 61
                },
                Chapter {
                    title: String::new(),
                    start_time: 300
                },
            ]
        );
    }

    #[test]
    fn test_parse_no_chapters() {
        assert!(parse_chapters("{}").unwrap().is_empty());
        assert!(parse_chapters(r#"{"chapters": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_chapters("not json").is_err());
        assert!(parse_chapters(r#"{"chapters": [{"start_time": "soon"}]}"#).is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_fails() {
        let probe = FfprobeProbe::with_binary_path(
            "/nonexistent/audioshelf-ffprobe",
            Duration::from_secs(1),
        );
        assert_eq!(probe.name(), "ffprobe");
        assert!(probe.probe("/tmp/none.mp3").await.is_err());
    }
}
