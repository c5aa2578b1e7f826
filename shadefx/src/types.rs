use std::fmt;

/// Scalar, vector and matrix types usable for constants, parameters and
/// locals. The discriminant doubles as the vertex element format byte written
/// into the signature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DataType {
    Bool = 0,
    Int = 1,
    Float = 2,
    Vector2 = 3,
    Vector3 = 4,
    Vector4 = 5,
    Matrix = 6,
}

impl DataType {
    /// Recognizes the host type names accepted in effect source. The `glam`
    /// spellings are accepted alongside the long names.
    pub fn from_type_name(name: &str) -> Option<DataType> {
        let ty = match name {
            "bool" => DataType::Bool,
            "i32" => DataType::Int,
            "f32" => DataType::Float,
            "Vector2" | "Vec2" => DataType::Vector2,
            "Vector3" | "Vec3" => DataType::Vector3,
            "Vector4" | "Vec4" => DataType::Vector4,
            "Matrix" | "Mat4" => DataType::Matrix,
            _ => return None,
        };
        Some(ty)
    }

    /// Size in bytes of one element of this type inside a constant buffer.
    pub fn size(self) -> u32 {
        match self {
            DataType::Bool | DataType::Int | DataType::Float => 4,
            DataType::Vector2 => 8,
            DataType::Vector3 => 12,
            DataType::Vector4 => 16,
            DataType::Matrix => 64,
        }
    }

    pub fn format(self) -> u8 {
        self as u8
    }

    pub fn from_format(format: u8) -> Option<DataType> {
        let ty = match format {
            0 => DataType::Bool,
            1 => DataType::Int,
            2 => DataType::Float,
            3 => DataType::Vector2,
            4 => DataType::Vector3,
            5 => DataType::Vector4,
            6 => DataType::Matrix,
            _ => return None,
        };
        Some(ty)
    }

    /// Float vector with the given component count; a single component is a
    /// plain `Float`.
    pub fn vector(components: usize) -> Option<DataType> {
        match components {
            1 => Some(DataType::Float),
            2 => Some(DataType::Vector2),
            3 => Some(DataType::Vector3),
            4 => Some(DataType::Vector4),
            _ => None,
        }
    }

    pub fn components(self) -> usize {
        match self {
            DataType::Bool | DataType::Int | DataType::Float => 1,
            DataType::Vector2 => 2,
            DataType::Vector3 => 3,
            DataType::Vector4 => 4,
            DataType::Matrix => 16,
        }
    }

    pub fn is_scalar(self) -> bool {
        matches!(self, DataType::Bool | DataType::Int | DataType::Float)
    }

    pub fn is_vector(self) -> bool {
        matches!(self, DataType::Vector2 | DataType::Vector3 | DataType::Vector4)
    }

    pub fn is_matrix(self) -> bool {
        self == DataType::Matrix
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::Int => "i32",
            DataType::Float => "f32",
            DataType::Vector2 => "Vector2",
            DataType::Vector3 => "Vector3",
            DataType::Vector4 => "Vector4",
            DataType::Matrix => "Matrix",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture2D,
    TextureCube,
}

impl TextureKind {
    pub fn from_type_name(name: &str) -> Option<TextureKind> {
        match name {
            "Texture2D" => Some(TextureKind::Texture2D),
            "TextureCube" => Some(TextureKind::TextureCube),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("input"),
            Direction::Out => f.write_str("output"),
        }
    }
}

/// Pipeline role of a stage parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semantics {
    Position,
    Normal,
    Tangent,
    Binormal,
    Color(u8),
    TexCoord(u8),
    BlendIndices,
    BlendWeight,
    PointSize,
}

impl Semantics {
    /// Highest index accepted for `ColorN` and `TexCoordN`.
    pub const MAX_INDEX: u8 = 7;

    pub fn parse(name: &str) -> Option<Semantics> {
        let fixed = match name {
            "Position" => Some(Semantics::Position),
            "Normal" => Some(Semantics::Normal),
            "Tangent" => Some(Semantics::Tangent),
            "Binormal" => Some(Semantics::Binormal),
            "BlendIndices" => Some(Semantics::BlendIndices),
            "BlendWeight" => Some(Semantics::BlendWeight),
            "PointSize" => Some(Semantics::PointSize),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }
        let (ctor, index): (fn(u8) -> Semantics, &str) =
            if let Some(index) = name.strip_prefix("Color") {
                (Semantics::Color, index)
            } else if let Some(index) = name.strip_prefix("TexCoord") {
                (Semantics::TexCoord, index)
            } else {
                return None;
            };
        let index = if index.is_empty() { 0 } else { index.parse::<u8>().ok()? };
        if index > Semantics::MAX_INDEX {
            return None;
        }
        Some(ctor(index))
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Semantics::Position => 0,
            Semantics::Normal => 1,
            Semantics::Tangent => 2,
            Semantics::Binormal => 3,
            Semantics::Color(index) => 4 + index,
            Semantics::TexCoord(index) => 12 + index,
            Semantics::BlendIndices => 20,
            Semantics::BlendWeight => 21,
            Semantics::PointSize => 22,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Semantics> {
        let semantics = match byte {
            0 => Semantics::Position,
            1 => Semantics::Normal,
            2 => Semantics::Tangent,
            3 => Semantics::Binormal,
            4..=11 => Semantics::Color(byte - 4),
            12..=19 => Semantics::TexCoord(byte - 12),
            20 => Semantics::BlendIndices,
            21 => Semantics::BlendWeight,
            22 => Semantics::PointSize,
            _ => return None,
        };
        Some(semantics)
    }

    pub fn color_index(self) -> Option<u8> {
        match self {
            Semantics::Color(index) => Some(index),
            _ => None,
        }
    }
}

impl fmt::Display for Semantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semantics::Position => f.write_str("Position"),
            Semantics::Normal => f.write_str("Normal"),
            Semantics::Tangent => f.write_str("Tangent"),
            Semantics::Binormal => f.write_str("Binormal"),
            Semantics::Color(index) => write!(f, "Color{}", index),
            Semantics::TexCoord(index) => write!(f, "TexCoord{}", index),
            Semantics::BlendIndices => f.write_str("BlendIndices"),
            Semantics::BlendWeight => f.write_str("BlendWeight"),
            Semantics::PointSize => f.write_str("PointSize"),
        }
    }
}
