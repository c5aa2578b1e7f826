//! Binary asset stream consumed by the runtime.
//!
//! All integers are little-endian. Per shader:
//!
//! ```text
//! u8  has byte code
//! u8  has GLSL
//! i32 length, GLSL text with preamble, NUL    (when GLSL)
//! i32 length, byte code                       (when byte code)
//! ```
//!
//! The signature table follows once, after every shader:
//!
//! ```text
//! i32 count
//!     u8 input count, (u8 format, u8 semantics) per input
//!     i32 length, byte code
//! ```

use std::io::{self, Write};

use crate::backends::glsl::PREAMBLE;
use crate::signature::SignatureTable;

pub struct AssetWriter<W: Write> {
    w: W,
}

fn length(len: usize) -> io::Result<i32> {
    i32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} bytes do not fit in an asset length field", len),
        )
    })
}

impl<W: Write> AssetWriter<W> {
    pub fn new(w: W) -> AssetWriter<W> {
        AssetWriter { w }
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.w.write_all(&[value])
    }

    fn write_i32(&mut self, value: i32) -> io::Result<()> {
        self.w.write_all(&value.to_le_bytes())
    }

    fn write_blob(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_i32(length(bytes.len())?)?;
        self.w.write_all(bytes)
    }

    /// Writes one shader record. `glsl` is the program without the preamble.
    pub fn write_shader(&mut self, glsl: Option<&str>, bytecode: Option<&[u8]>) -> io::Result<()> {
        self.write_u8(bytecode.is_some() as u8)?;
        self.write_u8(glsl.is_some() as u8)?;
        if let Some(glsl) = glsl {
            // Length counts the terminator.
            self.write_i32(length(PREAMBLE.len() + glsl.len() + 1)?)?;
            self.w.write_all(PREAMBLE.as_bytes())?;
            self.w.write_all(glsl.as_bytes())?;
            self.write_u8(0)?;
        }
        if let Some(bytecode) = bytecode {
            self.write_blob(bytecode)?;
        }
        Ok(())
    }

    pub fn write_signatures(&mut self, table: &SignatureTable) -> io::Result<()> {
        self.write_i32(length(table.len())?)?;
        for entry in table.entries() {
            let elements = &entry.signature.elements;
            let count = u8::try_from(elements.len()).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "too many signature inputs")
            })?;
            self.write_u8(count)?;
            for element in elements {
                self.write_u8(element.format.format())?;
                self.write_u8(element.semantics.to_byte())?;
            }
            self.write_blob(&entry.bytecode)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{ShaderSignature, SignatureElement};
    use crate::types::{DataType, Semantics};

    #[test]
    fn shader_records_are_length_prefixed() {
        let mut writer = AssetWriter::new(Vec::new());
        writer.write_shader(Some("void main() {}\n"), Some(&[1, 2, 3])).unwrap();
        let bytes = writer.into_inner();

        assert_eq!(&bytes[..2], &[1, 1]);
        let glsl_len = PREAMBLE.len() + 15 + 1;
        assert_eq!(&bytes[2..6], &(glsl_len as i32).to_le_bytes());
        let glsl = &bytes[6..6 + glsl_len];
        assert!(glsl.starts_with(b"#version 330 core\n"));
        assert_eq!(glsl.last(), Some(&0));
        assert_eq!(&bytes[6 + glsl_len..], &[3, 0, 0, 0, 1, 2, 3]);
    }

    #[test]
    fn glsl_only_records_skip_byte_code() {
        let mut writer = AssetWriter::new(Vec::new());
        writer.write_shader(None, None).unwrap();
        assert_eq!(writer.into_inner(), vec![0, 0]);
    }

    #[test]
    fn signature_table_layout() {
        let mut table = SignatureTable::new();
        table.insert(ShaderSignature {
            elements: vec![
                SignatureElement {
                    format: DataType::Vector3,
                    semantics: Semantics::Position,
                },
                SignatureElement {
                    format: DataType::Vector2,
                    semantics: Semantics::TexCoord(0),
                },
            ],
        });
        let mut writer = AssetWriter::new(Vec::new());
        writer.write_signatures(&table).unwrap();
        assert_eq!(
            writer.into_inner(),
            vec![1, 0, 0, 0, 2, 4, 0, 3, 12, 0, 0, 0, 0]
        );
    }
}
