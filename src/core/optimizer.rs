use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use once_cell::sync::OnceCell;
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::core::request::BitDepth;

/// Adapter around the external `pngquant` binary.
///
/// Optimization is strictly best-effort: if the binary is missing, the
/// invocation fails, or the result is not smaller than the input, the
/// original buffer is returned untouched. Concurrent invocations are
/// bounded by a semaphore since the binary is CPU-bound.
pub struct Optimizer {
    binary: String,
    limiter: Semaphore,
    max_concurrent: usize,
    probed: OnceCell<bool>,
}

impl Optimizer {
    pub fn new(binary: String, max_concurrent: usize) -> Self {
        let slots = max_concurrent.max(1);
        Self {
            binary,
            limiter: Semaphore::new(slots),
            max_concurrent: slots,
            probed: OnceCell::new(),
        }
    }

    /// Whether the optimizer binary answered a version probe. The probe
    /// runs once per process and is cached.
    pub fn available(&self) -> bool {
        *self.probed.get_or_init(|| {
            let probe = std::process::Command::new(&self.binary)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            match probe {
                Ok(status) if status.success() => true,
                _ => {
                    tracing::warn!(
                        binary = %self.binary,
                        "optimizer binary unavailable, size optimization disabled"
                    );
                    false
                }
            }
        })
    }

    pub fn available_permits(&self) -> usize {
        self.limiter.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Runs the optimizer over a PNG buffer. Returns the optimized bytes
    /// only when they are strictly smaller than the input; on any other
    /// outcome the input comes back unchanged.
    pub async fn optimize(&self, input: Vec<u8>, depth: BitDepth) -> Vec<u8> {
        if !self.available() {
            return input;
        }
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => return input,
        };
        match self.run(&input, depth).await {
            Ok(output) if output.len() < input.len() => {
                tracing::debug!(
                    before = input.len(),
                    after = output.len(),
                    "optimizer reduced image size"
                );
                output
            }
            Ok(output) => {
                tracing::debug!(
                    before = input.len(),
                    after = output.len(),
                    "optimizer produced no smaller image, keeping original"
                );
                input
            }
            Err(e) => {
                tracing::warn!("optimization failed, keeping original buffer: {e:#}");
                input
            }
        }
    }

    async fn run(&self, input: &[u8], depth: BitDepth) -> Result<Vec<u8>> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        // Unique names keep concurrent invocations from trampling each
        // other; the drop guards delete both files on every exit path.
        let infile = tempfile::Builder::new()
            .prefix(&format!("qr-opt-{stamp}-in-"))
            .suffix(".png")
            .tempfile()
            .context("creating optimizer input file")?;
        let outfile = tempfile::Builder::new()
            .prefix(&format!("qr-opt-{stamp}-out-"))
            .suffix(".png")
            .tempfile()
            .context("creating optimizer output file")?;

        tokio::fs::write(infile.path(), input)
            .await
            .context("writing optimizer input")?;

        let mut cmd = Command::new(&self.binary);
        match depth {
            BitDepth::One => cmd.args(["--quality", "0-0", "--speed", "1"]),
            _ => cmd.args(["--quality", "0-50"]),
        };
        let output = cmd
            .arg("--force")
            .arg("--output")
            .arg(outfile.path())
            .arg(infile.path())
            .output()
            .await
            .context("invoking optimizer binary")?;

        if !output.status.success() {
            bail!(
                "optimizer exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let optimized = tokio::fs::read(outfile.path())
            .await
            .context("reading optimizer output")?;
        if optimized.is_empty() {
            bail!("optimizer produced an empty file");
        }
        Ok(optimized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_binary_returns_input_unchanged() {
        let opt = Optimizer::new("qr-renderer-no-such-binary".to_string(), 2);
        assert!(!opt.available());
        let input = vec![1u8, 2, 3, 4];
        let out = opt.optimize(input.clone(), BitDepth::One).await;
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn output_is_never_larger_than_input() {
        // Even against `true` (which succeeds but writes nothing useful)
        // the size gate must hold.
        let opt = Optimizer::new("true".to_string(), 2);
        let input = vec![0u8; 64];
        let out = opt.optimize(input.clone(), BitDepth::Eight).await;
        assert!(out.len() <= input.len());
        assert_eq!(out, input);
    }

    #[test]
    fn slot_count_is_never_zero() {
        let opt = Optimizer::new("pngquant".to_string(), 0);
        assert_eq!(opt.max_concurrent(), 1);
        assert_eq!(opt.available_permits(), 1);
    }
}
