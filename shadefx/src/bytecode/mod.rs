//! Compilation of generated HLSL to native byte code.
//!
//! Two compilers are provided: [`ToolCompiler`] runs an external command line
//! tool, [`ShadercCompiler`] compiles in process when the `shaderc` feature
//! is enabled. Generated GLSL can be checked with [`validate_glsl`] when the
//! `naga` feature is enabled.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::ShaderStage;

mod naga;
mod shaderc;
mod tool;

pub use self::naga::validate_glsl;
pub use self::shaderc::ShadercCompiler;
pub use self::tool::ToolCompiler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteCodeRequest {
    /// Human readable name used in diagnostics and scratch file names.
    pub name: String,
    pub source: String,
    pub stage: ShaderStage,
    pub profile: String,
    pub debug: bool,
}

#[derive(Debug, Error)]
pub enum ByteCodeError {
    #[error("shader compiler `{}` was not found", path.display())]
    ToolMissing { path: PathBuf },
    #[error("shader compiler `{}` cannot be started: {source}", path.display())]
    ToolUnusable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader compiler exited with {status}: {message}")]
    Failed { status: String, message: String },
    #[error("shader compiler did not finish within {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("shader compiler produced no output")]
    MissingOutput,
    #[error("cannot prepare shader compiler input: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Backend(String),
}

impl ByteCodeError {
    /// Errors that will recur for every shader, so compilation stops.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ByteCodeError::ToolMissing { .. } | ByteCodeError::ToolUnusable { .. }
        )
    }
}

pub trait ByteCodeCompiler: Send + Sync {
    fn compile(&self, request: &ByteCodeRequest) -> Result<Vec<u8>, ByteCodeError>;
}
