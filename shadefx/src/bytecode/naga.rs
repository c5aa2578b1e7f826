#[allow(unused_imports)]
use crate::types::ShaderStage;

/// Runs generated GLSL through the `naga` front end and validator.
///
/// `naga` only accepts GLSL 4.40 and newer, so the program is checked under
/// a `#version 450` header rather than the asset preamble.
#[cfg(feature = "naga")]
pub fn validate_glsl(source: &str, stage: ShaderStage) -> Result<(), String> {
    use naga::valid::{Capabilities, ValidationFlags, Validator};

    let stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let source = format!("#version 450 core\n{}", source);
    let module = naga::front::glsl::Frontend::default()
        .parse(&naga::front::glsl::Options::from(stage), &source)
        .map_err(|e| format!("{:?}", e))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| format!("{:?}", e))?;
    Ok(())
}

#[cfg(not(feature = "naga"))]
pub fn validate_glsl(_: &str, _: ShaderStage) -> Result<(), String> {
    Err("naga backend is not enabled".to_owned())
}
