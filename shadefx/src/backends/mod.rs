//! Target language backends.
//!
//! The translator in [`crate::translate`] walks method bodies once and asks a
//! [`ShaderBackend`] for every piece of text that differs between targets:
//! type names, resource declarations, the stage interface and a handful of
//! expression forms.

use crate::layout::LayoutedConstant;
use crate::model::{ConstantBuffer, ShaderLiteral, ShaderMethod, ShaderParameter, ShaderTexture};
use crate::signature::ShaderSignature;
use crate::translate::intrinsics::Intrinsic;
use crate::types::{DataType, ShaderStage, TextureKind};
use crate::writer::SourceWriter;

pub mod glsl;
pub mod hlsl;

pub use glsl::GlslBackend;
pub use hlsl::HlslBackend;

/// Order of the two subscripts produced for `m[(row, column)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixOrder {
    /// `m[row][column]`
    RowColumn,
    /// `m[column][row]`
    ColumnRow,
}

pub trait ShaderBackend: Sync {
    fn language(&self) -> &'static str;

    fn type_name(&self, ty: DataType) -> &'static str;

    fn texture_type_name(&self, kind: TextureKind) -> &'static str;

    fn zero_value(&self, ty: DataType) -> String;

    /// Vector of type `ty` with every component set to `value`.
    fn splat(&self, ty: DataType, value: &str) -> String {
        construct(self.type_name(ty), &[value.to_owned()])
    }

    fn intrinsic_name(&self, intrinsic: Intrinsic) -> &'static str {
        intrinsic.base_name()
    }

    /// Replaces a whole intrinsic call. `None` emits `name(args)`.
    fn intrinsic_call(&self, _intrinsic: Intrinsic, _args: &[String]) -> Option<String> {
        None
    }

    /// Samples `texture` at `coords`, at an explicit mip level when `lod` is
    /// given.
    fn sample(
        &self,
        stage: ShaderStage,
        texture: &ShaderTexture,
        coords: &str,
        lod: Option<&str>,
    ) -> String;

    /// Floating-point `left % right`, truncating like Rust does.
    fn remainder(&self, left: &str, right: &str) -> String;

    fn matrix_order(&self) -> MatrixOrder;

    fn matrix_multiply(&self, left: &str, right: &str) -> String;

    fn write_literal(&self, out: &mut SourceWriter, literal: &ShaderLiteral, value: &str);

    fn write_constant_buffer(
        &self,
        out: &mut SourceWriter,
        buffer: &ConstantBuffer,
        layout: &[LayoutedConstant<'_>],
    );

    fn write_texture(&self, out: &mut SourceWriter, texture: &ShaderTexture);

    /// Declares the stage inputs and outputs outside of `main`.
    fn write_stage_interface(&self, out: &mut SourceWriter, stage: ShaderStage, method: &ShaderMethod);

    /// Writes the `main` signature up to, not including, its opening brace.
    fn write_entry_header(&self, out: &mut SourceWriter, stage: ShaderStage, method: &ShaderMethod);

    /// Expression reading an input parameter inside `main`.
    fn input_source(&self, stage: ShaderStage, parameter: &ShaderParameter) -> String;

    /// Assignable expression an output parameter is written through.
    fn output_target(&self, stage: ShaderStage, parameter: &ShaderParameter) -> String;

    /// A vertex shader that only consumes `signature` and emits a constant
    /// position.
    fn write_signature_shader(&self, out: &mut SourceWriter, signature: &ShaderSignature);
}

/// `type(a, b, ...)`
pub(crate) fn construct(type_name: &str, args: &[String]) -> String {
    format!("{}({})", type_name, args.join(", "))
}
