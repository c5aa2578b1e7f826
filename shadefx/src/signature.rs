//! Vertex input signatures.
//!
//! Every distinct input layout used by a vertex shader in a batch is stored
//! once, together with the byte code of a stand-in shader that consumes
//! exactly that layout. Runtimes create input layouts against it without
//! needing the real shader.

use std::collections::HashMap;

use tracing::debug;

use crate::backends::ShaderBackend;
use crate::bytecode::{ByteCodeCompiler, ByteCodeError, ByteCodeRequest};
use crate::config::CompileOptions;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::model::ShaderMethod;
use crate::types::{DataType, Semantics, ShaderStage};
use crate::writer::SourceWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureElement {
    pub format: DataType,
    pub semantics: Semantics,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderSignature {
    pub elements: Vec<SignatureElement>,
}

impl ShaderSignature {
    /// Input layout of a vertex shader, in parameter order.
    pub fn of(method: &ShaderMethod) -> ShaderSignature {
        let elements = method
            .inputs()
            .filter_map(|input| {
                Some(SignatureElement {
                    format: input.data_type,
                    semantics: input.semantics?,
                })
            })
            .collect();
        ShaderSignature { elements }
    }

    pub fn source(&self, backend: &dyn ShaderBackend) -> String {
        let mut out = SourceWriter::new();
        backend.write_signature_shader(&mut out, self);
        out.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEntry {
    pub signature: ShaderSignature,
    /// Empty until compiled, and when byte-code compilation is disabled.
    pub bytecode: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct SignatureTable {
    entries: Vec<SignatureEntry>,
    index: HashMap<ShaderSignature, usize>,
}

impl SignatureTable {
    pub fn new() -> SignatureTable {
        SignatureTable::default()
    }

    /// Returns the index of `signature`, adding it if it is new.
    pub fn insert(&mut self, signature: ShaderSignature) -> usize {
        if let Some(&index) = self.index.get(&signature) {
            return index;
        }
        let index = self.entries.len();
        self.index.insert(signature.clone(), index);
        self.entries.push(SignatureEntry {
            signature,
            bytecode: Vec::new(),
        });
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SignatureEntry] {
        &self.entries
    }

    /// Compiles the stand-in shader of every entry. Per-signature failures
    /// are returned as diagnostics; an unusable compiler aborts.
    pub fn compile(
        &mut self,
        backend: &dyn ShaderBackend,
        compiler: &dyn ByteCodeCompiler,
        options: &CompileOptions,
    ) -> Result<Vec<Diagnostic>, ByteCodeError> {
        let mut diagnostics = Vec::new();
        for (index, entry) in self.entries.iter_mut().enumerate() {
            let request = ByteCodeRequest {
                name: format!("signature{}", index),
                source: entry.signature.source(backend),
                stage: ShaderStage::Vertex,
                profile: options.profile(ShaderStage::Vertex).to_owned(),
                debug: options.debug_info,
            };
            debug!(signature = index, elements = entry.signature.elements.len(), "compiling input signature");
            match compiler.compile(&request) {
                Ok(bytecode) => entry.bytecode = bytecode,
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => diagnostics.push(Diagnostic::without_location(DiagnosticKind::ByteCode {
                    shader: request.name,
                    message: error.to_string(),
                })),
            }
        }
        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(elements: &[(DataType, Semantics)]) -> ShaderSignature {
        ShaderSignature {
            elements: elements
                .iter()
                .map(|&(format, semantics)| SignatureElement { format, semantics })
                .collect(),
        }
    }

    #[test]
    fn equal_signatures_share_an_entry() {
        let mut table = SignatureTable::new();
        let a = table.insert(signature(&[(DataType::Vector3, Semantics::Position)]));
        let b = table.insert(signature(&[
            (DataType::Vector3, Semantics::Position),
            (DataType::Vector2, Semantics::TexCoord(0)),
        ]));
        let c = table.insert(signature(&[(DataType::Vector3, Semantics::Position)]));
        assert_eq!((a, b, c), (0, 1, 0));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn element_order_matters() {
        let mut table = SignatureTable::new();
        table.insert(signature(&[
            (DataType::Vector3, Semantics::Position),
            (DataType::Vector3, Semantics::Normal),
        ]));
        table.insert(signature(&[
            (DataType::Vector3, Semantics::Normal),
            (DataType::Vector3, Semantics::Position),
        ]));
        assert_eq!(table.len(), 2);
    }
}
