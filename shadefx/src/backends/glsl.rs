use crate::backends::{construct, MatrixOrder, ShaderBackend};
use crate::layout::LayoutedConstant;
use crate::model::{ConstantBuffer, ShaderLiteral, ShaderMethod, ShaderParameter, ShaderTexture};
use crate::names;
use crate::signature::ShaderSignature;
use crate::translate::intrinsics::Intrinsic;
use crate::types::{DataType, Direction, Semantics, ShaderStage, TextureKind};
use crate::writer::SourceWriter;

/// Header prepended to every GLSL program in the asset stream.
pub const PREAMBLE: &str = "#version 330 core\n\
#extension GL_ARB_separate_shader_objects : require\n\
#extension GL_ARB_shading_language_420pack : require\n";

/// Parenthesizes `operand` unless it is a name, a number or a member access.
fn group(operand: &str) -> String {
    if operand
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        operand.to_owned()
    } else {
        format!("({})", operand)
    }
}

/// GLSL 3.30 with explicit binding and location layouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlslBackend;

impl GlslBackend {
    /// Built-in variable standing in for a parameter, if any.
    fn builtin(stage: ShaderStage, parameter: &ShaderParameter) -> Option<&'static str> {
        match (stage, parameter.direction, parameter.semantics) {
            (ShaderStage::Vertex, Direction::Out, Some(Semantics::Position)) => Some("gl_Position"),
            (ShaderStage::Fragment, Direction::In, Some(Semantics::Position)) => Some("gl_FragCoord"),
            _ => None,
        }
    }

    fn location(stage: ShaderStage, parameter: &ShaderParameter) -> u8 {
        let semantics = parameter.semantics.unwrap_or(Semantics::Position);
        match (stage, parameter.direction) {
            (ShaderStage::Fragment, Direction::Out) => semantics.color_index().unwrap_or(0),
            _ => semantics.to_byte(),
        }
    }

    /// Integer varyings cannot be interpolated.
    fn is_flat(stage: ShaderStage, parameter: &ShaderParameter) -> bool {
        let varying = matches!(
            (stage, parameter.direction),
            (ShaderStage::Vertex, Direction::Out) | (ShaderStage::Fragment, Direction::In)
        );
        varying && parameter.data_type == DataType::Int
    }
}

impl ShaderBackend for GlslBackend {
    fn language(&self) -> &'static str {
        "glsl"
    }

    fn type_name(&self, ty: DataType) -> &'static str {
        match ty {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Vector2 => "vec2",
            DataType::Vector3 => "vec3",
            DataType::Vector4 => "vec4",
            DataType::Matrix => "mat4",
        }
    }

    fn texture_type_name(&self, kind: TextureKind) -> &'static str {
        match kind {
            TextureKind::Texture2D => "sampler2D",
            TextureKind::TextureCube => "samplerCube",
        }
    }

    fn zero_value(&self, ty: DataType) -> String {
        match ty {
            DataType::Bool => "false".to_owned(),
            DataType::Int => "0".to_owned(),
            DataType::Float => "0.0".to_owned(),
            ty => format!("{}(0.0)", self.type_name(ty)),
        }
    }

    fn intrinsic_name(&self, intrinsic: Intrinsic) -> &'static str {
        match intrinsic {
            Intrinsic::Atan2 => "atan",
            Intrinsic::Ddx => "dFdx",
            Intrinsic::Ddy => "dFdy",
            Intrinsic::Frac => "fract",
            Intrinsic::InverseSqrt => "inversesqrt",
            Intrinsic::Lerp => "mix",
            intrinsic => intrinsic.base_name(),
        }
    }

    fn intrinsic_call(&self, intrinsic: Intrinsic, args: &[String]) -> Option<String> {
        match (intrinsic, args) {
            (Intrinsic::Saturate, [value]) => Some(format!("clamp({}, 0.0, 1.0)", value)),
            _ => None,
        }
    }

    fn sample(
        &self,
        _stage: ShaderStage,
        texture: &ShaderTexture,
        coords: &str,
        lod: Option<&str>,
    ) -> String {
        let name = names::escaped(&texture.name);
        match lod {
            Some(lod) => format!("textureLod({}, {}, {})", name, coords, lod),
            None => format!("texture({}, {})", name, coords),
        }
    }

    // `mod` floors; Rust's `%` truncates toward zero.
    fn remainder(&self, left: &str, right: &str) -> String {
        let (left, right) = (group(left), group(right));
        format!("({} - {} * trunc({} / {}))", left, right, left, right)
    }

    fn matrix_order(&self) -> MatrixOrder {
        MatrixOrder::ColumnRow
    }

    fn matrix_multiply(&self, left: &str, right: &str) -> String {
        format!("({} * {})", left, right)
    }

    fn write_literal(&self, out: &mut SourceWriter, literal: &ShaderLiteral, value: &str) {
        out.line(format!(
            "const {} {} = {};",
            self.type_name(literal.data_type),
            names::escaped(&literal.name),
            value
        ));
    }

    fn write_constant_buffer(
        &self,
        out: &mut SourceWriter,
        buffer: &ConstantBuffer,
        layout: &[LayoutedConstant<'_>],
    ) {
        out.line(format!(
            "layout(std140, binding = {}) uniform {}",
            buffer.slot,
            names::buffer(&buffer.name)
        ));
        out.open();
        for constant in layout {
            let array = if constant.constant.is_array {
                format!("[{}]", constant.element_count)
            } else {
                String::new()
            };
            out.line(format!(
                "{} {}{};",
                self.type_name(constant.constant.data_type),
                names::escaped(&constant.constant.name),
                array
            ));
        }
        out.close_with("};");
    }

    fn write_texture(&self, out: &mut SourceWriter, texture: &ShaderTexture) {
        out.line(format!(
            "layout(binding = {}) uniform {} {};",
            texture.slot,
            self.texture_type_name(texture.kind),
            names::escaped(&texture.name)
        ));
    }

    fn write_stage_interface(&self, out: &mut SourceWriter, stage: ShaderStage, method: &ShaderMethod) {
        for parameter in &method.parameters {
            if Self::builtin(stage, parameter).is_some() {
                continue;
            }
            let (qualifier, name) = match parameter.direction {
                Direction::In => ("in", names::input(&parameter.name)),
                Direction::Out => ("out", names::output(&parameter.name)),
            };
            let flat = if Self::is_flat(stage, parameter) { "flat " } else { "" };
            out.line(format!(
                "layout(location = {}) {}{} {} {};",
                Self::location(stage, parameter),
                flat,
                qualifier,
                self.type_name(parameter.data_type),
                name
            ));
        }
    }

    fn write_entry_header(&self, out: &mut SourceWriter, _stage: ShaderStage, _method: &ShaderMethod) {
        out.line("void main()");
    }

    fn input_source(&self, stage: ShaderStage, parameter: &ShaderParameter) -> String {
        match Self::builtin(stage, parameter) {
            Some(builtin) => builtin.to_owned(),
            None => names::input(&parameter.name),
        }
    }

    fn output_target(&self, stage: ShaderStage, parameter: &ShaderParameter) -> String {
        match Self::builtin(stage, parameter) {
            Some(builtin) => builtin.to_owned(),
            None => names::output(&parameter.name),
        }
    }

    fn write_signature_shader(&self, out: &mut SourceWriter, signature: &ShaderSignature) {
        for (index, element) in signature.elements.iter().enumerate() {
            out.line(format!(
                "layout(location = {}) in {} fxin_{};",
                element.semantics.to_byte(),
                self.type_name(element.format),
                index
            ));
        }
        out.blank();
        out.line("void main()");
        out.open();
        out.line(format!(
            "gl_Position = {};",
            construct("vec4", &["0.0".into(), "0.0".into(), "0.0".into(), "1.0".into()])
        ));
        out.close();
    }
}
