//! # shadefx
//!
//! Cross-compiles shader effects written in a subset of Rust into GLSL and
//! HLSL, and packs the results into a binary asset stream.
//!
//! ## Declaring an Effect
//!
//! An effect is a struct carrying `#[effect]`. Its fields are shader
//! constants, textures and techniques; its inherent `impl` blocks hold
//! literals, helper methods and the stage entry points.
//!
//! ```ignore
//! #[effect(namespace = "game::fx")]
//! pub struct Sprite {
//!     #[buffer(name = "Camera", slot = 1, shared)]
//!     pub view_projection: Matrix,
//!     pub tint: Vector4,
//!     pub diffuse: Texture2D,
//!     #[technique(vertex = vs, fragment = fs)]
//!     pub standard: Technique,
//! }
//!
//! impl Sprite {
//!     const GAMMA: f32 = 2.2;
//!
//!     #[vertex]
//!     pub fn vs(
//!         &self,
//!         #[semantics(Position)] position: Vector4,
//!         #[semantics(TexCoord0)] uv: Vector2,
//!         #[semantics(Position)] clip: &mut Vector4,
//!         #[semantics(TexCoord0)] uv_out: &mut Vector2,
//!     ) {
//!         *clip = self.view_projection * position;
//!         *uv_out = uv;
//!     }
//!
//!     #[fragment]
//!     pub fn fs(&self, #[semantics(TexCoord0)] uv: Vector2, #[semantics(Color0)] color: &mut Vector4) {
//!         *color = Self::correct(sample(self.diffuse, uv) * self.tint);
//!     }
//!
//!     fn correct(color: Vector4) -> Vector4 {
//!         pow(color, Vector4::splat(1.0 / Self::GAMMA))
//!     }
//! }
//! ```
//!
//! Parameters taken by value are stage inputs, `&mut` parameters are
//! outputs. Every stage parameter names its semantics.
//!
//! ## Constant Buffers
//!
//! Constants without a `#[buffer]` attribute land in `<Effect>Buffer0`.
//! `#[buffer(slot = N)]` selects the default buffer of another slot, and
//! `#[buffer(name = "...")]` groups constants into a named buffer. Buffers
//! marked `shared` must be declared identically by every effect of a batch.
//! Constants are packed into 16-byte registers; see [`layout`].
//!
//! ## Compiling
//!
//! ```ignore
//! let options = CompileOptions::load(Path::new("shadefx.json"))?;
//! let tool = ToolCompiler::new(options.tool.clone());
//! let compiler = EffectCompiler::new(options).with_bytecode_compiler(&tool);
//! let batch = compiler.compile_batch(&sources)?;
//! for diagnostic in batch.diagnostics() {
//!     eprintln!("{}", diagnostic);
//! }
//! batch.write_assets(File::create("effects.bin")?)?;
//! ```
//!
//! Mistakes in effect sources never abort a batch: they are reported as
//! [`Diagnostic`]s and the offending file emits no shaders. Only an
//! unusable byte-code compiler stops compilation.
//!
//! ## Features
//!
//! - `shaderc`: [`ShadercCompiler`] compiles the generated HLSL to SPIR-V in
//! process.
//! - `naga`: [`CompileOptions::validate_glsl`] checks generated GLSL with the
//! `naga` front end.

pub mod asset;
pub mod backends;
pub mod bytecode;
pub mod config;
pub mod discover;
pub mod error;
pub mod layout;
pub mod model;
pub mod names;
pub mod pipeline;
pub mod resolve;
pub mod signature;
pub mod translate;
pub mod types;
pub mod validate;
pub mod writer;

pub use backends::{GlslBackend, HlslBackend, ShaderBackend};
pub use bytecode::{ByteCodeCompiler, ByteCodeError, ByteCodeRequest, ShadercCompiler, ToolCompiler};
pub use config::{CompileOptions, ConfigError, ToolConfig};
pub use error::{CompileError, Diagnostic, DiagnosticKind, ErrorCategory, Location};
pub use pipeline::{BatchOutput, CompiledShader, EffectCompiler, FileOutput, SourceFile};
pub use resolve::{EffectScope, SymbolResolver};
pub use types::{DataType, Semantics, ShaderStage};
