use crate::backends::{construct, MatrixOrder, ShaderBackend};
use crate::layout::LayoutedConstant;
use crate::model::{ConstantBuffer, ShaderLiteral, ShaderMethod, ShaderParameter, ShaderTexture};
use crate::names;
use crate::signature::ShaderSignature;
use crate::types::{DataType, Direction, Semantics, ShaderStage, TextureKind};
use crate::writer::SourceWriter;

/// HLSL for shader model 4.
#[derive(Debug, Clone, Copy, Default)]
pub struct HlslBackend;

pub fn semantic_name(stage: ShaderStage, direction: Direction, semantics: Semantics) -> String {
    match semantics {
        Semantics::Position => {
            if stage == ShaderStage::Vertex && direction == Direction::In {
                "POSITION".to_owned()
            } else {
                "SV_Position".to_owned()
            }
        }
        Semantics::Normal => "NORMAL".to_owned(),
        Semantics::Tangent => "TANGENT".to_owned(),
        Semantics::Binormal => "BINORMAL".to_owned(),
        Semantics::Color(index) => {
            if stage == ShaderStage::Fragment && direction == Direction::Out {
                format!("SV_Target{}", index)
            } else {
                format!("COLOR{}", index)
            }
        }
        Semantics::TexCoord(index) => format!("TEXCOORD{}", index),
        Semantics::BlendIndices => "BLENDINDICES".to_owned(),
        Semantics::BlendWeight => "BLENDWEIGHT".to_owned(),
        Semantics::PointSize => "PSIZE".to_owned(),
    }
}

fn pack_offset(constant: &LayoutedConstant<'_>) -> String {
    const COMPONENTS: [&str; 4] = ["", ".y", ".z", ".w"];
    format!(
        "packoffset(c{}{})",
        constant.register(),
        COMPONENTS[constant.component() as usize]
    )
}

impl ShaderBackend for HlslBackend {
    fn language(&self) -> &'static str {
        "hlsl"
    }

    fn type_name(&self, ty: DataType) -> &'static str {
        match ty {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Vector2 => "float2",
            DataType::Vector3 => "float3",
            DataType::Vector4 => "float4",
            DataType::Matrix => "float4x4",
        }
    }

    fn texture_type_name(&self, kind: TextureKind) -> &'static str {
        match kind {
            TextureKind::Texture2D => "Texture2D",
            TextureKind::TextureCube => "TextureCube",
        }
    }

    fn zero_value(&self, ty: DataType) -> String {
        match ty {
            DataType::Bool => "false".to_owned(),
            DataType::Int => "0".to_owned(),
            DataType::Float => "0.0".to_owned(),
            ty => format!("({})0", self.type_name(ty)),
        }
    }

    fn splat(&self, ty: DataType, value: &str) -> String {
        format!("({})({})", self.type_name(ty), value)
    }

    fn sample(
        &self,
        stage: ShaderStage,
        texture: &ShaderTexture,
        coords: &str,
        lod: Option<&str>,
    ) -> String {
        let name = names::escaped(&texture.name);
        let sampler = names::sampler(&texture.name);
        // Vertex shaders have no derivatives to pick a mip level from.
        let lod = match (lod, stage) {
            (Some(lod), _) => lod,
            (None, ShaderStage::Vertex) => "0",
            (None, ShaderStage::Fragment) => {
                return format!("{}.Sample({}, {})", name, sampler, coords)
            }
        };
        format!("{}.SampleLevel({}, {}, {})", name, sampler, coords, lod)
    }

    fn remainder(&self, left: &str, right: &str) -> String {
        format!("fmod({}, {})", left, right)
    }

    fn matrix_order(&self) -> MatrixOrder {
        MatrixOrder::RowColumn
    }

    fn matrix_multiply(&self, left: &str, right: &str) -> String {
        format!("mul({}, {})", left, right)
    }

    fn write_literal(&self, out: &mut SourceWriter, literal: &ShaderLiteral, value: &str) {
        out.line(format!(
            "static const {} {} = {};",
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
            "cbuffer {} : register(b{})",
            names::buffer(&buffer.name),
            buffer.slot
        ));
        out.open();
        for constant in layout {
            let array = if constant.constant.is_array {
                format!("[{}]", constant.element_count)
            } else {
                String::new()
            };
            out.line(format!(
                "{} {}{} : {};",
                self.type_name(constant.constant.data_type),
                names::escaped(&constant.constant.name),
                array,
                pack_offset(constant)
            ));
        }
        out.close_with("};");
    }

    fn write_texture(&self, out: &mut SourceWriter, texture: &ShaderTexture) {
        out.line(format!(
            "{} {} : register(t{});",
            self.texture_type_name(texture.kind),
            names::escaped(&texture.name),
            texture.slot
        ));
        out.line(format!(
            "SamplerState {} : register(s{});",
            names::sampler(&texture.name),
            texture.slot
        ));
    }

    /// Stage parameters are declared on `main` itself.
    fn write_stage_interface(&self, _out: &mut SourceWriter, _stage: ShaderStage, _method: &ShaderMethod) {}

    fn write_entry_header(&self, out: &mut SourceWriter, stage: ShaderStage, method: &ShaderMethod) {
        if method.parameters.is_empty() {
            out.line("void main()");
            return;
        }
        out.line("void main(");
        let last = method.parameters.len() - 1;
        for (index, parameter) in method.parameters.iter().enumerate() {
            let semantics = parameter.semantics.unwrap_or(Semantics::Position);
            let varying = matches!(
                (stage, parameter.direction),
                (ShaderStage::Vertex, Direction::Out) | (ShaderStage::Fragment, Direction::In)
            );
            let interpolation = if varying && parameter.data_type == DataType::Int {
                "nointerpolation "
            } else {
                ""
            };
            let (qualifier, name) = match parameter.direction {
                Direction::In => ("", names::input(&parameter.name)),
                Direction::Out => ("out ", names::output(&parameter.name)),
            };
            let separator = if index == last { ")" } else { "," };
            out.line(format!(
                "    {}{}{} {} : {}{}",
                interpolation,
                qualifier,
                self.type_name(parameter.data_type),
                name,
                semantic_name(stage, parameter.direction, semantics),
                separator
            ));
        }
    }

    fn input_source(&self, _stage: ShaderStage, parameter: &ShaderParameter) -> String {
        names::input(&parameter.name)
    }

    fn output_target(&self, _stage: ShaderStage, parameter: &ShaderParameter) -> String {
        names::output(&parameter.name)
    }

    fn write_signature_shader(&self, out: &mut SourceWriter, signature: &ShaderSignature) {
        if signature.elements.is_empty() {
            out.line("float4 main() : SV_Position");
        } else {
            out.line("float4 main(");
            let last = signature.elements.len() - 1;
            for (index, element) in signature.elements.iter().enumerate() {
                let separator = if index == last { ") : SV_Position" } else { "," };
                out.line(format!(
                    "    {} fxin_{} : {}{}",
                    self.type_name(element.format),
                    index,
                    semantic_name(ShaderStage::Vertex, Direction::In, element.semantics),
                    separator
                ));
            }
        }
        out.open();
        out.line(format!(
            "return {};",
            construct("float4", &["0.0".into(), "0.0".into(), "0.0".into(), "1.0".into()])
        ));
        out.close();
    }
}
