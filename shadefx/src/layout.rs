//! Constant-buffer packing.
//!
//! Constants are packed into 16-byte registers. A constant never straddles
//! two registers unless it is register-sized or an array, in which case it
//! starts on a register boundary. Array elements each occupy whole registers.
//! GLSL `std140` blocks and HLSL constant buffers are both laid out with
//! this one algorithm.

use crate::model::ShaderConstant;

pub const REGISTER_SIZE: u32 = 16;

/// Largest buffer the asset stream and the target languages can address.
pub const MAX_BUFFER_SIZE: u32 = i32::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutedConstant<'a> {
    pub constant: &'a ShaderConstant,
    /// Bytes from the start of the buffer.
    pub offset: u32,
    pub element_size: u32,
    pub element_count: u32,
    /// Unused bytes trailing each element.
    pub padding: u32,
    pub size: u32,
}

impl LayoutedConstant<'_> {
    pub fn register(&self) -> u32 {
        self.offset / REGISTER_SIZE
    }

    /// Component (0 to 3) of the register the constant starts at.
    pub fn component(&self) -> u32 {
        (self.offset % REGISTER_SIZE) / 4
    }

    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.size)
    }
}

fn round_up(value: u32, multiple: u32) -> u32 {
    value.div_ceil(multiple).saturating_mul(multiple)
}

/// Lays out `constants` in declaration order. Sizes saturate at `u32::MAX`,
/// so an oversized buffer shows up as one larger than [`MAX_BUFFER_SIZE`].
pub fn layout(constants: &[ShaderConstant]) -> Vec<LayoutedConstant<'_>> {
    let mut remaining = REGISTER_SIZE;
    let mut offset: u32 = 0;
    let mut out = Vec::with_capacity(constants.len());
    for constant in constants {
        let element_size = constant.data_type.size();
        let element_count = constant.element_count();
        let (size, padding) = if constant.is_array {
            if element_size < REGISTER_SIZE {
                (
                    REGISTER_SIZE.saturating_mul(element_count),
                    REGISTER_SIZE - element_size,
                )
            } else {
                let rounded = round_up(element_size, REGISTER_SIZE);
                (rounded.saturating_mul(element_count), rounded - element_size)
            }
        } else {
            (element_size, 0)
        };

        if constant.is_array || size >= REGISTER_SIZE {
            if remaining != REGISTER_SIZE {
                offset = offset.saturating_add(remaining);
            }
            remaining = size;
        } else if size > remaining {
            offset = offset.saturating_add(remaining);
            remaining = REGISTER_SIZE;
        }

        out.push(LayoutedConstant {
            constant,
            offset,
            element_size,
            element_count,
            padding,
            size,
        });
        offset = offset.saturating_add(size);
        remaining -= size;
    }
    out
}

/// Size of a laid out buffer, rounded up to whole registers.
pub fn buffer_size(layout: &[LayoutedConstant<'_>]) -> u32 {
    layout
        .last()
        .map(|last| round_up(last.end(), REGISTER_SIZE))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::types::DataType;

    fn constant(name: &str, data_type: DataType, array_length: Option<u32>) -> ShaderConstant {
        ShaderConstant {
            name: name.to_owned(),
            data_type,
            is_array: array_length.is_some(),
            array_length,
            modifiers: Vec::new(),
            location: Location::default(),
        }
    }

    #[test]
    fn float_vec3_vec4() {
        let constants = vec![
            constant("a", DataType::Float, None),
            constant("b", DataType::Vector3, None),
            constant("c", DataType::Vector4, None),
        ];
        let layout = layout(&constants);
        let offsets = layout.iter().map(|c| (c.offset, c.size)).collect::<Vec<_>>();
        assert_eq!(offsets, vec![(0, 4), (4, 12), (16, 16)]);
        assert_eq!(buffer_size(&layout), 32);
    }

    #[test]
    fn scalar_then_float_array() {
        let constants = vec![
            constant("x", DataType::Float, None),
            constant("y", DataType::Float, Some(4)),
        ];
        let layout = layout(&constants);
        assert_eq!(layout[1].offset, 16);
        assert_eq!(layout[1].size, 64);
        assert_eq!(layout[1].padding, 12);
        assert_eq!(layout[1].element_count, 4);
        assert_eq!(buffer_size(&layout), 80);
    }

    #[test]
    fn small_constant_after_full_register_moves_on() {
        let constants = vec![
            constant("m", DataType::Matrix, None),
            constant("a", DataType::Vector2, None),
            constant("b", DataType::Vector3, None),
        ];
        let layout = layout(&constants);
        let offsets = layout.iter().map(|c| c.offset).collect::<Vec<_>>();
        assert_eq!(offsets, vec![0, 64, 80]);
        assert_eq!(buffer_size(&layout), 96);
    }

    #[test]
    fn matrix_array_has_no_padding() {
        let constants = vec![constant("bones", DataType::Matrix, Some(3))];
        let layout = layout(&constants);
        assert_eq!(layout[0].padding, 0);
        assert_eq!(layout[0].size, 192);
    }

    #[test]
    fn huge_arrays_saturate() {
        let constants = vec![
            constant("scale", DataType::Float, None),
            constant("weights", DataType::Float, Some(300_000_000)),
            constant("bias", DataType::Vector4, None),
        ];
        let layout = layout(&constants);
        assert_eq!(layout[1].offset, 16);
        assert_eq!(layout[1].size, u32::MAX);
        assert_eq!(layout[2].offset, u32::MAX);
        assert!(buffer_size(&layout) > MAX_BUFFER_SIZE);
    }
}
