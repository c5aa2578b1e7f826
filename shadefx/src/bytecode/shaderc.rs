#[allow(unused_imports)]
use crate::bytecode::{ByteCodeCompiler, ByteCodeError, ByteCodeRequest};
#[allow(unused_imports)]
use crate::types::ShaderStage;

/// Compiles HLSL to SPIR-V in process through `shaderc`. The request's
/// profile is not used; the stage selects the shader kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadercCompiler;

impl ByteCodeCompiler for ShadercCompiler {
    fn compile(&self, request: &ByteCodeRequest) -> Result<Vec<u8>, ByteCodeError> {
        compile(request).map_err(ByteCodeError::Backend)
    }
}

#[cfg(feature = "shaderc")]
fn compile(request: &ByteCodeRequest) -> Result<Vec<u8>, String> {
    let shader_kind = match request.stage {
        ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
        ShaderStage::Fragment => shaderc::ShaderKind::Fragment,
    };

    let mut opt = shaderc::CompileOptions::new()
        .ok_or("cannot create `shaderc::CompileOptions`")?;
    opt.set_source_language(shaderc::SourceLanguage::HLSL);
    opt.set_target_env(
        shaderc::TargetEnv::Vulkan,
        shaderc::EnvVersion::Vulkan1_0 as u32,
    );
    opt.set_auto_bind_uniforms(true);
    opt.set_optimization_level(shaderc::OptimizationLevel::Zero);
    if request.debug {
        opt.set_generate_debug_info();
    }

    #[allow(unused_mut)]
    let mut compiler = shaderc::Compiler::new()
        .ok_or("cannot create `shaderc::Compiler`")?;
    let out = compiler
        .compile_into_spirv(&request.source, shader_kind, &request.name, "main", Some(&opt))
        .map_err(|e| e.to_string())?;
    if out.get_num_warnings() != 0 {
        return Err(out.get_warning_messages());
    }
    Ok(out.as_binary_u8().to_vec())
}

#[cfg(not(feature = "shaderc"))]
fn compile(_: &ByteCodeRequest) -> Result<Vec<u8>, String> {
    Err("shaderc backend is not enabled".to_owned())
}
