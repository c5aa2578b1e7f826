//! Compilation options, loadable from JSON.
//!
//! ```json
//! {
//!     "compile_bytecode": true,
//!     "jobs": 4,
//!     "tool": { "path": "C:/sdk/bin/fxc.exe", "timeout_ms": 30000 }
//! }
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ShaderStage;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Include GLSL programs in the asset stream.
    pub emit_glsl: bool,
    /// Compile HLSL programs and input signatures to byte code.
    pub compile_bytecode: bool,
    pub debug_info: bool,
    pub vertex_profile: String,
    pub fragment_profile: String,
    /// Check generated GLSL with `naga`; requires the `naga` feature.
    pub validate_glsl: bool,
    /// Worker threads for per-file compilation.
    pub jobs: usize,
    pub tool: ToolConfig,
}

impl Default for CompileOptions {
    fn default() -> CompileOptions {
        CompileOptions {
            emit_glsl: true,
            compile_bytecode: false,
            debug_info: false,
            vertex_profile: "vs_4_0".to_owned(),
            fragment_profile: "ps_4_0".to_owned(),
            validate_glsl: false,
            jobs: 1,
            tool: ToolConfig::default(),
        }
    }
}

impl CompileOptions {
    pub fn from_json(text: &str) -> Result<CompileOptions, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<CompileOptions, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        CompileOptions::from_json(&text)
    }

    pub fn profile(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex_profile,
            ShaderStage::Fragment => &self.fragment_profile,
        }
    }
}

/// External byte-code compiler invocation. `{input}`, `{output}` and
/// `{profile}` in the argument templates are replaced per shader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    /// Prepended to `args` when debug information is requested.
    pub debug_args: Vec<String>,
    /// `None` waits forever.
    pub timeout_ms: Option<u64>,
}

impl Default for ToolConfig {
    fn default() -> ToolConfig {
        let args = ["/nologo", "/T", "{profile}", "/E", "main", "/Fo", "{output}", "{input}"];
        ToolConfig {
            path: PathBuf::from("fxc"),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            debug_args: vec!["/Zi".to_owned()],
            timeout_ms: Some(60_000),
        }
    }
}

impl ToolConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
