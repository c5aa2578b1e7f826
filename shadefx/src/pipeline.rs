//! Per-file compilation and batch merging.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, info, warn};

use crate::asset::AssetWriter;
use crate::backends::{GlslBackend, HlslBackend};
use crate::bytecode::{validate_glsl, ByteCodeCompiler, ByteCodeRequest};
use crate::config::CompileOptions;
use crate::discover::discover_effects;
use crate::error::{CompileError, Diagnostic, DiagnosticKind, Location};
use crate::model::{ConstantBuffer, EffectDeclaration, ShaderMethod};
use crate::resolve::EffectScope;
use crate::signature::{ShaderSignature, SignatureTable};
use crate::translate::generate_stage;
use crate::types::ShaderStage;
use crate::validate::validate;

/// One effect source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Namespace for an effect that does not declare one.
    pub namespace: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, namespace: impl Into<String>, text: impl Into<String>) -> SourceFile {
        SourceFile {
            path: path.into(),
            namespace: namespace.into(),
            text: text.into(),
        }
    }

    pub fn read(path: impl Into<PathBuf>, namespace: impl Into<String>) -> std::io::Result<SourceFile> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)?;
        Ok(SourceFile::new(path, namespace, text))
    }
}

#[derive(Debug, Clone)]
pub struct CompiledShader {
    /// Qualified effect name, `namespace::Effect`.
    pub effect: String,
    pub method: String,
    pub stage: ShaderStage,
    /// GLSL program without the asset preamble.
    pub glsl: String,
    pub hlsl: String,
    pub bytecode: Option<Vec<u8>>,
    /// Index into the batch signature table, for vertex shaders.
    pub signature: Option<usize>,
    pub input_signature: Option<ShaderSignature>,
}

impl CompiledShader {
    pub fn name(&self) -> String {
        format!("{}::{}", self.effect, self.method)
    }
}

#[derive(Debug, Clone)]
pub struct FileOutput {
    pub path: PathBuf,
    pub effect: Option<String>,
    pub buffers: Vec<ConstantBuffer>,
    /// Empty when the file has any diagnostic.
    pub shaders: Vec<CompiledShader>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub files: Vec<FileOutput>,
    pub signatures: SignatureTable,
    /// Diagnostics that concern more than one file.
    pub diagnostics: Vec<Diagnostic>,
    emit_glsl: bool,
}

fn same_layout(a: &ConstantBuffer, b: &ConstantBuffer) -> bool {
    a.slot == b.slot
        && a.constants.len() == b.constants.len()
        && a.constants.iter().zip(&b.constants).all(|(a, b)| {
            a.name == b.name
                && a.data_type == b.data_type
                && a.is_array == b.is_array
                && a.array_length == b.array_length
        })
}

impl BatchOutput {
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files
            .iter()
            .flat_map(|file| file.diagnostics.iter())
            .chain(self.diagnostics.iter())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics().next().is_some()
    }

    /// Compiled shaders in file and declaration order.
    pub fn shaders(&self) -> impl Iterator<Item = &CompiledShader> {
        self.files.iter().flat_map(|file| file.shaders.iter())
    }

    /// Shared buffers of the same name must be declared identically in every
    /// file. A file that disagrees with the first declaration loses its
    /// shaders.
    fn check_shared_buffers(&mut self) {
        let mut first: HashMap<&str, (&Path, &ConstantBuffer)> = HashMap::new();
        let mut diagnostics = Vec::new();
        let mut rejected = Vec::new();
        for (index, file) in self.files.iter().enumerate() {
            for buffer in file.buffers.iter().filter(|buffer| buffer.shared) {
                match first.get(buffer.name.as_str()) {
                    Some((path, declared)) if !same_layout(declared, buffer) => {
                        diagnostics.push(
                            Diagnostic::new(
                                DiagnosticKind::SharedBufferMismatch {
                                    buffer: buffer.name.clone(),
                                    other: path.display().to_string(),
                                },
                                buffer.location,
                            )
                            .in_file(&file.path),
                        );
                        rejected.push(index);
                    }
                    Some(_) => {}
                    None => {
                        first.insert(buffer.name.as_str(), (file.path.as_path(), buffer));
                    }
                }
            }
        }
        for index in rejected {
            let file = &mut self.files[index];
            if !file.shaders.is_empty() {
                warn!(path = %file.path.display(), "shared buffer mismatch; no shaders emitted");
                file.shaders.clear();
            }
        }
        self.diagnostics.extend(diagnostics);
    }

    /// Writes every compiled shader followed by the signature table.
    pub fn write_assets<W: Write>(&self, w: W) -> Result<(), CompileError> {
        let mut writer = AssetWriter::new(w);
        for shader in self.shaders() {
            let glsl = self.emit_glsl.then_some(shader.glsl.as_str());
            writer.write_shader(glsl, shader.bytecode.as_deref())?;
        }
        writer.write_signatures(&self.signatures)?;
        Ok(())
    }
}

/// Compiles effect sources with one set of options.
pub struct EffectCompiler<'a> {
    options: CompileOptions,
    bytecode: Option<&'a dyn ByteCodeCompiler>,
}

impl<'a> EffectCompiler<'a> {
    pub fn new(options: CompileOptions) -> EffectCompiler<'a> {
        EffectCompiler {
            options,
            bytecode: None,
        }
    }

    pub fn with_bytecode_compiler(mut self, compiler: &'a dyn ByteCodeCompiler) -> EffectCompiler<'a> {
        self.bytecode = Some(compiler);
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    fn compile_bytecode(
        &self,
        name: &str,
        source: &str,
        method: &ShaderMethod,
        stage: ShaderStage,
    ) -> Result<Result<Vec<u8>, Diagnostic>, CompileError> {
        let Some(compiler) = self.bytecode else {
            return Err(CompileError::MissingByteCodeCompiler);
        };
        let request = ByteCodeRequest {
            name: name.to_owned(),
            source: source.to_owned(),
            stage,
            profile: self.options.profile(stage).to_owned(),
            debug: self.options.debug_info,
        };
        match compiler.compile(&request) {
            Ok(bytecode) => Ok(Ok(bytecode)),
            Err(error) if error.is_fatal() => Err(CompileError::ToolEnvironment(error)),
            Err(error) => Ok(Err(Diagnostic::new(
                DiagnosticKind::ByteCode {
                    shader: name.to_owned(),
                    message: error.to_string(),
                },
                method.location,
            ))),
        }
    }

    fn compile_effect(
        &self,
        effect: &EffectDeclaration,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<CompiledShader>, CompileError> {
        let scope = EffectScope::new(effect);
        let full_name = effect.full_name();
        let mut shaders = Vec::new();
        for (index, method) in effect.entry_points() {
            let Some(stage) = method.stage else {
                continue;
            };
            let name = format!("{}::{}", full_name, method.name);
            let glsl = generate_stage(effect, &scope, index, &GlslBackend);
            let hlsl = generate_stage(effect, &scope, index, &HlslBackend);
            // Both backends walk the same body, so their diagnostics agree.
            let (glsl, hlsl) = match (glsl, hlsl) {
                (Ok(glsl), Ok(hlsl)) => (glsl, hlsl),
                (Err(errors), _) | (Ok(_), Err(errors)) => {
                    diagnostics.extend(errors);
                    continue;
                }
            };

            if self.options.validate_glsl {
                if let Err(message) = validate_glsl(&glsl, stage) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::GlslValidation {
                            shader: name.clone(),
                            message,
                        },
                        method.location,
                    ));
                }
            }

            let bytecode = if self.options.compile_bytecode {
                match self.compile_bytecode(&name, &hlsl, method, stage)? {
                    Ok(bytecode) => Some(bytecode),
                    Err(diagnostic) => {
                        diagnostics.push(diagnostic);
                        None
                    }
                }
            } else {
                None
            };

            debug!(shader = %name, %stage, "compiled stage");
            shaders.push(CompiledShader {
                effect: full_name.clone(),
                method: method.name.clone(),
                stage,
                glsl,
                hlsl,
                bytecode,
                signature: None,
                input_signature: (stage == ShaderStage::Vertex).then(|| ShaderSignature::of(method)),
            });
        }
        Ok(shaders)
    }

    /// Compiles one source file. Problems in the file are reported as
    /// diagnostics; only an unusable byte-code compiler is an error.
    #[tracing::instrument(skip_all, fields(path = %source.path.display()))]
    pub fn compile_file(&self, source: &SourceFile) -> Result<FileOutput, CompileError> {
        let mut output = FileOutput {
            path: source.path.clone(),
            effect: None,
            buffers: Vec::new(),
            shaders: Vec::new(),
            diagnostics: Vec::new(),
        };
        let mut diagnostics = Vec::new();

        match syn::parse_file(&source.text) {
            Ok(file) => {
                let discovery = discover_effects(&file, &source.namespace);
                diagnostics.extend(discovery.diagnostics);
                if let Some(effect) = discovery.effect {
                    diagnostics.extend(validate(&effect));
                    output.effect = Some(effect.full_name());
                    output.buffers = effect.buffers.clone();
                    if diagnostics.is_empty() {
                        output.shaders = self.compile_effect(&effect, &mut diagnostics)?;
                    }
                }
            }
            Err(error) => diagnostics.push(Diagnostic::new(
                DiagnosticKind::Syntax {
                    message: error.to_string(),
                },
                Location::of(error.span()),
            )),
        }

        if !diagnostics.is_empty() {
            warn!(errors = diagnostics.len(), "effect has errors; no shaders emitted");
            output.shaders.clear();
        }
        output.diagnostics = diagnostics
            .into_iter()
            .map(|diagnostic| diagnostic.in_file(&source.path))
            .collect();
        Ok(output)
    }

    fn compile_files(&self, sources: &[SourceFile]) -> Result<Vec<FileOutput>, CompileError> {
        let jobs = self.options.jobs.max(1);
        if jobs == 1 || sources.len() < 2 {
            return sources.iter().map(|source| self.compile_file(source)).collect();
        }
        let chunk_size = sources.len().div_ceil(jobs);
        thread::scope(|scope| {
            let workers = sources
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|source| self.compile_file(source))
                            .collect::<Result<Vec<_>, _>>()
                    })
                })
                .collect::<Vec<_>>();
            let mut files = Vec::with_capacity(sources.len());
            for worker in workers {
                match worker.join() {
                    Ok(chunk) => files.extend(chunk?),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            Ok(files)
        })
    }

    /// Compiles every file, then builds the signature table and checks
    /// shared buffers across the batch.
    pub fn compile_batch(&self, sources: &[SourceFile]) -> Result<BatchOutput, CompileError> {
        if self.options.compile_bytecode && self.bytecode.is_none() {
            return Err(CompileError::MissingByteCodeCompiler);
        }

        let files = self.compile_files(sources)?;
        let mut batch = BatchOutput {
            files,
            signatures: SignatureTable::new(),
            diagnostics: Vec::new(),
            emit_glsl: self.options.emit_glsl,
        };
        batch.check_shared_buffers();

        for file in &mut batch.files {
            for shader in &mut file.shaders {
                if let Some(signature) = &shader.input_signature {
                    shader.signature = Some(batch.signatures.insert(signature.clone()));
                }
            }
        }

        if self.options.compile_bytecode {
            if let Some(compiler) = self.bytecode {
                let diagnostics = batch
                    .signatures
                    .compile(&HlslBackend, compiler, &self.options)
                    .map_err(CompileError::ToolEnvironment)?;
                batch.diagnostics.extend(diagnostics);
            }
        }

        info!(
            files = batch.files.len(),
            shaders = batch.shaders().count(),
            signatures = batch.signatures.len(),
            errors = batch.diagnostics().count(),
            "compiled effect batch"
        );
        Ok(batch)
    }
}
