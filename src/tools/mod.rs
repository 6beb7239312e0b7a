//! Subprocess invocation for the external numeric tools (graph generators,
//! layout algorithms, property/metric calculators). Every tool is an opaque
//! executable honoring a fixed CLI/stdio contract: `--output=PATH`,
//! `--meta=STDIO`, zero exit on success, one JSON object on the chosen
//! stream, and the `MSC_RANDOM_SEED` environment variable for determinism.

mod perf;

pub use perf::ToolTimer;

use crate::errors::GraphStudyError;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaStream {
    Stdout,
    Stderr,
}

pub enum ToolStdin {
    Bytes(Vec<u8>),
    File(PathBuf),
}

pub struct ToolInvocation {
    pub command: String,
    pub args: Vec<String>,
    pub meta: MetaStream,
    pub stdin: Option<ToolStdin>,
    pub timeout: Duration,
    /// `None` disables the deterministic-seed environment variable.
    pub seed: Option<u64>,
}

impl ToolInvocation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            meta: MetaStream::Stdout,
            stdin: None,
            timeout: Duration::from_secs(60),
            seed: Some(0),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn output(self, path: &Path) -> Self {
        self.arg(format!("--output={}", path.display()))
    }
}

pub struct ToolOutcome {
    pub meta: serde_json::Value,
    pub elapsed: Duration,
}

/// Run `invocation`, capture its meta JSON, and return it alongside the
/// elapsed wall-clock time. Every failure mode here is `Recoverable`: the
/// caller logs it, records it in the bad-log, and moves to the next item.
pub async fn call_graphstudy_tool(invocation: ToolInvocation) -> Result<ToolOutcome, GraphStudyError> {
    let mut command = Command::new(&invocation.command);
    command
        .args(&invocation.args)
        .arg("--meta=stdio")
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    if matches!(invocation.stdin, Some(ToolStdin::Bytes(_))) {
        command.stdin(std::process::Stdio::piped());
    } else {
        command.stdin(std::process::Stdio::null());
    }

    if let Some(seed) = invocation.seed {
        command.env("MSC_RANDOM_SEED", seed.to_string());
    } else {
        command.env_remove("MSC_RANDOM_SEED");
    }

    let description = format!("{} {}", invocation.command, invocation.args.join(" "));
    let timer = ToolTimer::start();

    let mut child = command
        .spawn()
        .map_err(|e| GraphStudyError::recoverable(format!("cannot spawn {description}: {e}")))?;

    if let Some(ToolStdin::Bytes(bytes)) = &invocation.stdin {
        use tokio::io::AsyncWriteExt;
        if let Some(stdin) = child.stdin.take() {
            let mut stdin = stdin;
            stdin
                .write_all(bytes)
                .await
                .map_err(|e| GraphStudyError::recoverable(format!("cannot write stdin to {description}: {e}")))?;
        }
    }

    let waited = tokio::time::timeout(invocation.timeout, child.wait_with_output()).await;
    let output = match waited {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(GraphStudyError::recoverable(format!("{description} failed: {e}"))),
        Err(_) => {
            return Err(GraphStudyError::recoverable(format!(
                "{description} exceeded its {:?} timeout",
                invocation.timeout
            )))
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::warn!("{description} exited with {}: {stderr}", output.status);
        return Err(GraphStudyError::recoverable(format!(
            "{description} exited with {}",
            output.status
        )));
    }

    let raw = match invocation.meta {
        MetaStream::Stdout => output.stdout,
        MetaStream::Stderr => output.stderr,
    };
    let meta: serde_json::Value = serde_json::from_slice(&raw)
        .map_err(|e| GraphStudyError::recoverable(format!("{description}: malformed meta JSON: {e}")))?;

    Ok(ToolOutcome {
        meta,
        elapsed: timer.elapsed(),
    })
}

/// A scoped temporary directory under the data root, removed when dropped.
pub struct ScopedWorkdir {
    path: PathBuf,
}

impl ScopedWorkdir {
    pub fn new(data_root: &Path, prefix: &str) -> anyhow::Result<Self> {
        let base = data_root.join("tmp");
        std::fs::create_dir_all(&base)?;
        let unique = {
            let mut rng = rand::rng();
            let mut bytes = [0u8; 8];
            rand::RngCore::fill_bytes(&mut rng, &mut bytes);
            hex::encode(bytes)
        };
        let path = base.join(format!("{prefix}-{unique}"));
        std::fs::create_dir(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedWorkdir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("failed to remove scratch directory {}: {e}", self.path.display());
            }
        }
    }
}

/// Read an output file that may be missing — used for the "null filename"
/// terminator convention in property tool output.
pub async fn read_optional(path: Option<&Path>) -> anyhow::Result<Option<Vec<u8>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(anyhow::anyhow!("cannot open {}: {e}", path.display())),
    };
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await?;
    Ok(Some(buf))
}
