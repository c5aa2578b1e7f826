//! In-memory model of an effect, produced by [`crate::discover`] and checked
//! by [`crate::validate`].

use std::fmt;

use crate::error::Location;
use crate::layout::{self, LayoutedConstant};
use crate::types::{DataType, Direction, Semantics, ShaderStage, TextureKind};

/// Highest binding slot for buffers and textures.
pub const MAX_SLOT: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Public,
    Restricted,
    Const,
    Async,
    Unsafe,
    Extern,
    Generic,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modifier::Public => "pub",
            Modifier::Restricted => "pub(restricted)",
            Modifier::Const => "const",
            Modifier::Async => "async",
            Modifier::Unsafe => "unsafe",
            Modifier::Extern => "extern",
            Modifier::Generic => "generic",
        };
        f.write_str(name)
    }
}

pub fn describe_modifiers(modifiers: &[Modifier]) -> String {
    if modifiers.is_empty() {
        return "private".to_owned();
    }
    modifiers
        .iter()
        .map(Modifier::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct EffectDeclaration {
    pub name: String,
    pub namespace: String,
    pub documentation: String,
    pub location: Location,
    pub buffers: Vec<ConstantBuffer>,
    pub textures: Vec<ShaderTexture>,
    pub literals: Vec<ShaderLiteral>,
    pub methods: Vec<ShaderMethod>,
    pub techniques: Vec<EffectTechnique>,
}

impl EffectDeclaration {
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace, self.name)
        }
    }

    pub fn method(&self, name: &str) -> Option<(usize, &ShaderMethod)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, method)| method.name == name)
    }

    /// Stage entry points in declaration order.
    pub fn entry_points(&self) -> impl Iterator<Item = (usize, &ShaderMethod)> {
        self.methods
            .iter()
            .enumerate()
            .filter(|(_, method)| method.stage.is_some())
    }

    pub fn constants(&self) -> impl Iterator<Item = &ShaderConstant> {
        self.buffers.iter().flat_map(|buffer| buffer.constants.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderConstant {
    pub name: String,
    pub data_type: DataType,
    pub is_array: bool,
    pub array_length: Option<u32>,
    pub modifiers: Vec<Modifier>,
    pub location: Location,
}

impl ShaderConstant {
    pub fn element_count(&self) -> u32 {
        self.array_length.unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBuffer {
    pub name: String,
    pub slot: u32,
    pub constants: Vec<ShaderConstant>,
    pub shared: bool,
    pub location: Location,
}

impl ConstantBuffer {
    pub fn layout(&self) -> Vec<LayoutedConstant<'_>> {
        layout::layout(&self.constants)
    }

    /// Total size in bytes, a multiple of 16 unless it saturated.
    pub fn size(&self) -> u32 {
        layout::buffer_size(&self.layout())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderTexture {
    pub name: String,
    pub kind: TextureKind,
    pub slot: u32,
    pub modifiers: Vec<Modifier>,
    pub location: Location,
}

/// A compile-time value declared as an associated `const`.
#[derive(Debug, Clone)]
pub struct ShaderLiteral {
    pub name: String,
    pub data_type: DataType,
    pub value: syn::Expr,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderParameter {
    pub name: String,
    pub data_type: DataType,
    pub direction: Direction,
    pub semantics: Option<Semantics>,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    None,
    Ref,
    Other,
}

#[derive(Debug, Clone)]
pub struct ShaderMethod {
    pub name: String,
    /// `None` for helper methods.
    pub stage: Option<ShaderStage>,
    pub parameters: Vec<ShaderParameter>,
    pub return_type: Option<DataType>,
    /// Whether the signature spells out any return type at all.
    pub declared_return: bool,
    pub receiver: Receiver,
    pub modifiers: Vec<Modifier>,
    pub body: syn::Block,
    pub location: Location,
}

impl ShaderMethod {
    pub fn is_helper(&self) -> bool {
        self.stage.is_none()
    }

    pub fn inputs(&self) -> impl Iterator<Item = &ShaderParameter> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.direction == Direction::In)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &ShaderParameter> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.direction == Direction::Out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub name: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectTechnique {
    pub name: String,
    pub vertex: Vec<MethodRef>,
    pub fragment: Vec<MethodRef>,
    pub modifiers: Vec<Modifier>,
    pub location: Location,
}

impl EffectTechnique {
    pub fn references(&self, stage: ShaderStage) -> &[MethodRef] {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}
