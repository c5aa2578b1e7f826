use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use shadefx::backends::glsl::PREAMBLE;
use shadefx::{
    ByteCodeCompiler, ByteCodeError, ByteCodeRequest, CompileError, CompileOptions, DiagnosticKind,
    EffectCompiler, ErrorCategory, ShaderStage, SourceFile,
};

const SPRITE: &str = include_str!("effects/sprite.rs");
const MISMATCH: &str = include_str!("effects/mismatch.rs");

fn glsl_only() -> CompileOptions {
    CompileOptions::default()
}

fn with_bytecode() -> CompileOptions {
    CompileOptions {
        compile_bytecode: true,
        ..CompileOptions::default()
    }
}

enum Behavior {
    Succeed,
    Fail,
    Missing,
}

/// Byte-code compiler that answers without running anything.
struct FakeCompiler {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeCompiler {
    fn new(behavior: Behavior) -> FakeCompiler {
        FakeCompiler {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ByteCodeCompiler for FakeCompiler {
    fn compile(&self, request: &ByteCodeRequest) -> Result<Vec<u8>, ByteCodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(request.profile.as_bytes().to_vec()),
            Behavior::Fail => Err(ByteCodeError::Failed {
                status: "exit status: 1".to_owned(),
                message: "X3000: syntax error".to_owned(),
            }),
            Behavior::Missing => Err(ByteCodeError::ToolMissing {
                path: "fxc".into(),
            }),
        }
    }
}

/// Cursor over an asset stream.
struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, count: usize) -> &'a [u8] {
        let (head, tail) = self.bytes.split_at(count);
        self.bytes = tail;
        head
    }

    fn u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take(4).try_into().unwrap())
    }
}

#[test]
fn sprite_compiles_both_stages() {
    let compiler = EffectCompiler::new(glsl_only());
    let batch = compiler
        .compile_batch(&[SourceFile::new("sprite.rs", "", SPRITE)])
        .unwrap();
    assert!(!batch.has_errors(), "{:?}", batch.diagnostics().collect::<Vec<_>>());

    let file = &batch.files[0];
    assert_eq!(file.effect.as_deref(), Some("game::fx::Sprite"));
    let buffers = file
        .buffers
        .iter()
        .map(|buffer| (buffer.name.as_str(), buffer.slot, buffer.shared))
        .collect::<Vec<_>>();
    assert_eq!(buffers, vec![("Camera", 1, true), ("SpriteBuffer0", 0, false)]);

    let shaders = batch.shaders().collect::<Vec<_>>();
    assert_eq!(shaders.len(), 2);
    assert_eq!(shaders[0].name(), "game::fx::Sprite::vs");
    assert_eq!(shaders[0].stage, ShaderStage::Vertex);
    assert_eq!(shaders[0].signature, Some(0));
    assert_eq!(shaders[1].stage, ShaderStage::Fragment);
    assert_eq!(shaders[1].signature, None);
    assert!(shaders[1].hlsl.contains("SV_Target0"));
    assert!(shaders.iter().all(|shader| shader.bytecode.is_none()));
    assert_eq!(batch.signatures.len(), 1);
}

#[test]
fn signatures_are_shared_across_files() {
    let compiler = EffectCompiler::new(glsl_only());
    let batch = compiler
        .compile_batch(&[
            SourceFile::new("a.rs", "", SPRITE),
            SourceFile::new("b.rs", "", SPRITE),
        ])
        .unwrap();
    let signatures = batch
        .shaders()
        .map(|shader| shader.signature)
        .collect::<Vec<_>>();
    assert_eq!(signatures, vec![Some(0), None, Some(0), None]);
    assert_eq!(batch.signatures.len(), 1);
}

#[test]
fn a_broken_file_emits_no_shaders() {
    let compiler = EffectCompiler::new(glsl_only());
    let batch = compiler
        .compile_batch(&[
            SourceFile::new("mismatch.rs", "", MISMATCH),
            SourceFile::new("sprite.rs", "", SPRITE),
        ])
        .unwrap();
    assert!(batch.files[0].shaders.is_empty());
    assert_eq!(batch.files[1].shaders.len(), 2);

    let categories = batch
        .diagnostics()
        .map(|diagnostic| diagnostic.category())
        .collect::<Vec<_>>();
    assert_eq!(
        categories,
        vec![ErrorCategory::InterfaceMismatch, ErrorCategory::InterfaceMismatch]
    );
    for diagnostic in batch.diagnostics() {
        assert_eq!(diagnostic.file.as_deref(), Some(Path::new("mismatch.rs")));
    }
}

#[test]
fn shared_buffers_must_agree() {
    let water = r#"
        #[effect]
        pub struct Water {
            #[buffer(name = "Camera", slot = 1, shared)]
            pub view_projection: Vector4,
            #[technique(vertex = vs, fragment = fs)]
            pub standard: Technique,
        }
        impl Water {
            #[vertex]
            pub fn vs(&self, #[semantics(Position)] position: Vector4, #[semantics(Position)] clip: &mut Vector4) {
                *clip = position + self.view_projection;
            }
            #[fragment]
            pub fn fs(&self, #[semantics(Color0)] color: &mut Vector4) {
                *color = self.view_projection;
            }
        }
    "#;
    let compiler = EffectCompiler::new(glsl_only());
    let water_alone = compiler
        .compile_file(&SourceFile::new("water.rs", "", water))
        .unwrap();
    assert_eq!(water_alone.shaders.len(), 2, "{:?}", water_alone.diagnostics);

    let batch = compiler
        .compile_batch(&[
            SourceFile::new("sprite.rs", "", SPRITE),
            SourceFile::new("water.rs", "", water),
            SourceFile::new("sprite_again.rs", "", SPRITE),
        ])
        .unwrap();
    assert_eq!(batch.diagnostics.len(), 1, "{:?}", batch.diagnostics);
    let diagnostic = &batch.diagnostics[0];
    assert_eq!(
        diagnostic.kind,
        DiagnosticKind::SharedBufferMismatch {
            buffer: "Camera".to_owned(),
            other: "sprite.rs".to_owned(),
        }
    );
    assert_eq!(diagnostic.file.as_deref(), Some(Path::new("water.rs")));

    assert_eq!(batch.files[0].shaders.len(), 2);
    assert!(batch.files[1].shaders.is_empty());
    assert_eq!(batch.files[2].shaders.len(), 2);
    assert!(batch.shaders().all(|shader| shader.effect == "game::fx::Sprite"));
    // Water's position-only input layout never reaches the table.
    assert_eq!(batch.signatures.len(), 1);

    let mut bytes = Vec::new();
    batch.write_assets(&mut bytes).unwrap();
    let mut reader = Reader { bytes: &bytes };
    for _ in 0..4 {
        assert_eq!(reader.u8(), 0);
        assert_eq!(reader.u8(), 1);
        let len = reader.i32() as usize;
        reader.take(len);
    }
    assert_eq!(reader.i32(), 1, "signature count follows the four sprite shaders");
}

#[test]
fn oversized_buffers_are_diagnosed() {
    let source = r#"
        #[effect]
        pub struct Blur {
            pub weights: [f32; 300000000],
            #[technique(vertex = vs, fragment = fs)]
            pub standard: Technique,
        }
        impl Blur {
            #[vertex]
            pub fn vs(#[semantics(Position)] p: Vector4, #[semantics(Position)] clip: &mut Vector4) {
                *clip = p;
            }
            #[fragment]
            pub fn fs(&self, #[semantics(Color0)] color: &mut Vector4) {
                *color = Vector4::splat(self.weights[0]);
            }
        }
    "#;
    let output = EffectCompiler::new(glsl_only())
        .compile_file(&SourceFile::new("blur.rs", "", source))
        .unwrap();
    assert!(output.shaders.is_empty());
    assert_eq!(output.diagnostics.len(), 1, "{:?}", output.diagnostics);
    assert!(matches!(
        output.diagnostics[0].kind,
        DiagnosticKind::BufferTooLarge { .. }
    ));
    assert_eq!(output.diagnostics[0].category(), ErrorCategory::Structural);
}

#[test]
fn syntax_errors_carry_the_file() {
    let compiler = EffectCompiler::new(glsl_only());
    let output = compiler
        .compile_file(&SourceFile::new("broken.rs", "", "#[effect] pub struct Broken {"))
        .unwrap();
    assert_eq!(output.effect, None);
    assert_eq!(output.diagnostics.len(), 1);
    let diagnostic = &output.diagnostics[0];
    assert!(matches!(diagnostic.kind, DiagnosticKind::Syntax { .. }));
    assert!(diagnostic.location.is_some());
    assert!(diagnostic.to_string().starts_with("broken.rs:"), "{}", diagnostic);
}

#[test]
fn files_without_an_effect_are_reported() {
    let compiler = EffectCompiler::new(glsl_only());
    let output = compiler
        .compile_file(&SourceFile::new("plain.rs", "", "pub struct Plain;"))
        .unwrap();
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].kind, DiagnosticKind::NoEffect);
    assert_eq!(output.diagnostics[0].to_string(), "plain.rs: error: no `#[effect]` declaration found");
}

#[test]
fn asset_stream_layout() {
    let compiler = EffectCompiler::new(glsl_only());
    let batch = compiler
        .compile_batch(&[SourceFile::new("sprite.rs", "", SPRITE)])
        .unwrap();
    let mut bytes = Vec::new();
    batch.write_assets(&mut bytes).unwrap();

    let mut reader = Reader { bytes: &bytes };
    for shader in batch.shaders() {
        assert_eq!(reader.u8(), 0, "no byte code");
        assert_eq!(reader.u8(), 1, "has GLSL");
        let len = reader.i32() as usize;
        let text = reader.take(len);
        assert_eq!(text.last(), Some(&0));
        let text = std::str::from_utf8(&text[..len - 1]).unwrap();
        assert_eq!(text, format!("{}{}", PREAMBLE, shader.glsl));
    }
    // One signature: Vector4 Position and Vector2 TexCoord0, no byte code.
    assert_eq!(reader.bytes, &[1, 0, 0, 0, 2, 5, 0, 3, 12, 0, 0, 0, 0]);
}

#[test]
fn glsl_can_be_left_out_of_the_stream() {
    let options = CompileOptions {
        emit_glsl: false,
        ..CompileOptions::default()
    };
    let batch = EffectCompiler::new(options)
        .compile_batch(&[SourceFile::new("sprite.rs", "", SPRITE)])
        .unwrap();
    let mut bytes = Vec::new();
    batch.write_assets(&mut bytes).unwrap();
    assert_eq!(&bytes[..4], &[0, 0, 0, 0]);
}

#[test]
fn byte_code_is_compiled_for_shaders_and_signatures() {
    let fake = FakeCompiler::new(Behavior::Succeed);
    let compiler = EffectCompiler::new(with_bytecode()).with_bytecode_compiler(&fake);
    let batch = compiler
        .compile_batch(&[SourceFile::new("sprite.rs", "", SPRITE)])
        .unwrap();
    assert!(!batch.has_errors());
    assert_eq!(fake.calls.load(Ordering::SeqCst), 3);

    let bytecode = batch
        .shaders()
        .map(|shader| shader.bytecode.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        bytecode,
        vec![Some(b"vs_4_0".to_vec()), Some(b"ps_4_0".to_vec())]
    );
    assert_eq!(batch.signatures.entries()[0].bytecode, b"vs_4_0".to_vec());

    let mut bytes = Vec::new();
    batch.write_assets(&mut bytes).unwrap();
    assert_eq!(&bytes[..2], &[1, 1]);
}

#[test]
fn failed_byte_code_is_a_diagnostic() {
    let fake = FakeCompiler::new(Behavior::Fail);
    let compiler = EffectCompiler::new(with_bytecode()).with_bytecode_compiler(&fake);
    let batch = compiler
        .compile_batch(&[SourceFile::new("sprite.rs", "", SPRITE)])
        .unwrap();
    assert_eq!(batch.shaders().count(), 0);
    assert!(batch.signatures.is_empty());

    let diagnostics = batch.diagnostics().collect::<Vec<_>>();
    assert_eq!(diagnostics.len(), 2);
    for diagnostic in diagnostics {
        assert_eq!(diagnostic.category(), ErrorCategory::ToolInvocation);
        assert!(diagnostic.to_string().contains("X3000: syntax error"), "{}", diagnostic);
    }
}

#[test]
fn missing_tool_stops_the_batch() {
    let fake = FakeCompiler::new(Behavior::Missing);
    let compiler = EffectCompiler::new(with_bytecode()).with_bytecode_compiler(&fake);
    let error = compiler
        .compile_batch(&[SourceFile::new("sprite.rs", "", SPRITE)])
        .unwrap_err();
    assert!(matches!(
        error,
        CompileError::ToolEnvironment(ByteCodeError::ToolMissing { .. })
    ));
    assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn byte_code_needs_a_compiler() {
    let error = EffectCompiler::new(with_bytecode())
        .compile_batch(&[SourceFile::new("sprite.rs", "", SPRITE)])
        .unwrap_err();
    assert!(matches!(error, CompileError::MissingByteCodeCompiler));
}

#[test]
fn parallel_batches_keep_file_order() {
    let options = CompileOptions {
        jobs: 4,
        ..CompileOptions::default()
    };
    let sources = (0..5)
        .map(|i| {
            SourceFile::new(
                format!("e{}.rs", i),
                "fx",
                format!("#[effect] pub struct E{} {{ pub x: f32 }}", i),
            )
        })
        .collect::<Vec<_>>();
    let batch = EffectCompiler::new(options).compile_batch(&sources).unwrap();
    assert!(!batch.has_errors());
    let effects = batch
        .files
        .iter()
        .map(|file| file.effect.clone().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(effects, vec!["fx::E0", "fx::E1", "fx::E2", "fx::E3", "fx::E4"]);
}
