use std::ffi::OsString;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::bytecode::{ByteCodeCompiler, ByteCodeError, ByteCodeRequest};
use crate::config::ToolConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs an external compiler once per shader, passing source and output
/// through files in a scratch directory.
#[derive(Debug, Clone)]
pub struct ToolCompiler {
    config: ToolConfig,
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

impl ToolCompiler {
    pub fn new(config: ToolConfig) -> ToolCompiler {
        ToolCompiler { config }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    fn arguments(&self, request: &ByteCodeRequest, input: &Path, output: &Path) -> Vec<OsString> {
        let debug_args: &[String] = if request.debug {
            self.config.debug_args.as_slice()
        } else {
            &[]
        };
        debug_args
            .iter()
            .chain(self.config.args.iter())
            .map(|arg| {
                let arg = arg
                    .replace("{input}", &input.to_string_lossy())
                    .replace("{output}", &output.to_string_lossy())
                    .replace("{profile}", &request.profile);
                OsString::from(arg)
            })
            .collect()
    }

    /// Checks that the configured tool exists, either at the given path or
    /// on `PATH` when the path is a bare program name.
    pub fn probe(&self) -> Result<(), ByteCodeError> {
        let path = &self.config.path;
        let missing = || ByteCodeError::ToolMissing { path: path.clone() };
        if path.components().count() > 1 || path.is_absolute() {
            return if path.is_file() { Ok(()) } else { Err(missing()) };
        }
        let search = std::env::var_os("PATH").unwrap_or_default();
        let found = std::env::split_paths(&search).any(|dir| {
            let candidate = dir.join(path);
            candidate.is_file() || candidate.with_extension("exe").is_file()
        });
        if found {
            Ok(())
        } else {
            Err(missing())
        }
    }

    fn wait(&self, child: &mut std::process::Child) -> Result<ExitStatus, ByteCodeError> {
        let Some(timeout) = self.config.timeout() else {
            return Ok(child.wait()?);
        };
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if start.elapsed() >= timeout {
                warn!(tool = %self.config.path.display(), ?timeout, "killing shader compiler");
                // The process may exit between the poll and the kill.
                let _ = child.kill();
                child.wait()?;
                return Err(ByteCodeError::Timeout { timeout });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn read_log(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default().trim().to_owned()
}

impl ByteCodeCompiler for ToolCompiler {
    fn compile(&self, request: &ByteCodeRequest) -> Result<Vec<u8>, ByteCodeError> {
        let dir = tempfile::Builder::new().prefix("shadefx").tempdir()?;
        let stem = file_stem(&request.name);
        let input = dir.path().join(format!("{}.hlsl", stem));
        let output = dir.path().join(format!("{}.bin", stem));
        let stdout_path = dir.path().join("stdout.log");
        let stderr_path = dir.path().join("stderr.log");
        fs::write(&input, &request.source)?;

        let args = self.arguments(request, &input, &output);
        debug!(tool = %self.config.path.display(), shader = %request.name, ?args, "running shader compiler");
        let mut child = Command::new(&self.config.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(File::create(&stdout_path)?)
            .stderr(File::create(&stderr_path)?)
            .spawn()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => ByteCodeError::ToolMissing {
                    path: self.config.path.clone(),
                },
                _ => ByteCodeError::ToolUnusable {
                    path: self.config.path.clone(),
                    source,
                },
            })?;

        let status = self.wait(&mut child)?;
        if !status.success() {
            let mut message = read_log(&stderr_path);
            if message.is_empty() {
                message = read_log(&stdout_path);
            }
            return Err(ByteCodeError::Failed {
                status: status.to_string(),
                message,
            });
        }

        match fs::read(&output) {
            Ok(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(ByteCodeError::MissingOutput),
        }
    }
}
