//! Graphviz rendering.
//!
//! Plans are rendered by piping DOT source into the external `dot`
//! executable. Graphviz is installed separately and must be reachable via
//! `PATH` (or configured with `DOT_BINARY`).

use crate::error::AppError;
use serde::Deserialize;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Output formats offered for plan graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    /// DOT source, no Graphviz needed
    Dot,
    #[default]
    Svg,
    Png,
    Pdf,
}

impl GraphFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            GraphFormat::Dot => "text/vnd.graphviz; charset=utf-8",
            GraphFormat::Svg => "image/svg+xml",
            GraphFormat::Png => "image/png",
            GraphFormat::Pdf => "application/pdf",
        }
    }

    fn output_flag(self) -> &'static str {
        match self {
            GraphFormat::Dot => "-Tdot",
            GraphFormat::Svg => "-Tsvg",
            GraphFormat::Png => "-Tpng",
            GraphFormat::Pdf => "-Tpdf",
        }
    }
}

/// Handle on the Graphviz executable.
#[derive(Debug, Clone)]
pub struct Graphviz {
    binary: String,
    timeout: Duration,
}

impl Graphviz {
    pub fn new(binary: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Check that Graphviz can be started and return its version line.
    ///
    /// `dot -V` prints the version on stderr.
    pub async fn probe(&self) -> Result<String, AppError> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.binary)
                .arg("-V")
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| AppError::GraphvizUnavailable(format!("{} -V timed out", self.binary)))?
        .map_err(|e| AppError::GraphvizUnavailable(format!("{}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(AppError::GraphvizUnavailable(format!(
                "{} -V exited with {}",
                self.binary, output.status
            )));
        }

        let text = if output.stderr.is_empty() {
            output.stdout
        } else {
            output.stderr
        };
        Ok(String::from_utf8_lossy(&text)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    /// Render DOT source to `format`.
    ///
    /// `GraphFormat::Dot` returns the source unchanged without running Graphviz.
    pub async fn render(&self, dot: &str, format: GraphFormat) -> Result<Vec<u8>, AppError> {
        if format == GraphFormat::Dot {
            return Ok(dot.as_bytes().to_vec());
        }

        let mut child = Command::new(&self.binary)
            .arg(format.output_flag())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::GraphvizUnavailable(format!("{}: {e}", self.binary)))?;

        // Stdin is written from its own task while output is collected
        if let Some(mut stdin) = child.stdin.take() {
            let source = dot.as_bytes().to_vec();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&source).await {
                    if e.kind() != ErrorKind::BrokenPipe {
                        tracing::warn!(error = %e, "failed to write DOT source to graphviz");
                    }
                }
            });
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AppError::RenderFailed(format!(
                    "graphviz timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?
            .map_err(|e| AppError::RenderFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = %output.status, stderr = %stderr, "graphviz failed");
            return Err(AppError::RenderFailed(if stderr.is_empty() {
                format!("graphviz exited with {}", output.status)
            } else {
                stderr
            }));
        }
        if output.stdout.is_empty() {
            return Err(AppError::RenderFailed(
                "graphviz produced no output".to_string(),
            ));
        }

        tracing::debug!(bytes = output.stdout.len(), ?format, "graph rendered");
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_BINARY: &str = "qep-lens-no-such-graphviz-binary";

    #[tokio::test]
    async fn dot_format_skips_graphviz() {
        let graphviz = Graphviz::new(MISSING_BINARY, 1_000);

        let bytes = graphviz
            .render("digraph plan {}", GraphFormat::Dot)
            .await
            .unwrap();

        assert_eq!(bytes, b"digraph plan {}");
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let graphviz = Graphviz::new(MISSING_BINARY, 1_000);

        assert!(matches!(
            graphviz.render("digraph plan {}", GraphFormat::Svg).await,
            Err(AppError::GraphvizUnavailable(_))
        ));
        assert!(matches!(
            graphviz.probe().await,
            Err(AppError::GraphvizUnavailable(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_or_silent_renderer_is_a_render_failure() {
        let failing = Graphviz::new("false", 5_000);
        assert!(matches!(
            failing.render("digraph plan {}", GraphFormat::Png).await,
            Err(AppError::RenderFailed(_))
        ));

        let silent = Graphviz::new("true", 5_000);
        assert!(matches!(
            silent.render("digraph plan {}", GraphFormat::Svg).await,
            Err(AppError::RenderFailed(msg)) if msg.contains("no output")
        ));
    }

    #[test]
    fn formats_deserialize_from_lowercase_names() {
        let format: GraphFormat = serde_json::from_str("\"png\"").unwrap();
        assert_eq!(format, GraphFormat::Png);
        assert_eq!(GraphFormat::default(), GraphFormat::Svg);
        assert_eq!(GraphFormat::Svg.content_type(), "image/svg+xml");
    }
}
