use std::fmt;
use std::path::{Path, PathBuf};

use proc_macro2::Span;
use quote::ToTokens;
use syn::spanned::Spanned;
use thiserror::Error;

use crate::bytecode::ByteCodeError;
use crate::types::{DataType, Direction, Semantics, ShaderStage};

/// Position of a construct in effect source. Lines are 1-based, columns are
/// 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn of(span: Span) -> Location {
        let start = span.start();
        Location {
            line: start.line,
            column: start.column,
        }
    }

    pub fn of_tokens<T: ToTokens>(tokens: &T) -> Location {
        Location::of(tokens.span())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed declarations: modifiers, annotations, duplicate effects.
    Structural,
    /// Vertex and fragment stages disagree on their interface.
    InterfaceMismatch,
    /// Unknown references, unsupported types, syntax or intrinsics.
    Resolution,
    /// A shader failed to compile to byte code.
    ToolInvocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum DiagnosticKind {
    #[error("cannot parse effect source: {message}")]
    Syntax { message: String },
    #[error("no `#[effect]` declaration found")]
    NoEffect,
    #[error("`{name}` is a second effect declaration; a source file may declare only one effect")]
    DuplicateEffect { name: String },
    #[error("`{item}` is declared `{found}`, expected `{expected}`")]
    InvalidModifiers {
        item: String,
        found: String,
        expected: &'static str,
    },
    #[error("invalid attribute: {message}")]
    InvalidAttribute { message: String },
    #[error("array constant `{constant}` requires an explicit length")]
    MissingArrayLength { constant: String },
    #[error("array constant `{constant}` has length {declared} but is annotated with {annotated}")]
    ArrayLengthMismatch {
        constant: String,
        declared: u32,
        annotated: u32,
    },
    #[error("array constant `{constant}` must have a non-zero length")]
    InvalidArrayLength { constant: String },
    #[error("`{name}` cannot be used as a shader identifier")]
    ReservedIdentifier { name: String },
    #[error("`{item}` is bound to slot {slot}; slots range from 0 to 15")]
    InvalidSlot { item: String, slot: u32 },
    #[error("{kind} `{second}` reuses slot {slot} already bound to `{first}`")]
    SlotConflict {
        kind: &'static str,
        slot: u32,
        first: String,
        second: String,
    },
    #[error("constant buffer `{buffer}` is larger than {} bytes", crate::layout::MAX_BUFFER_SIZE)]
    BufferTooLarge { buffer: String },
    #[error("`{name}` names both a {first} and a {second}")]
    DuplicateMember {
        name: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("buffer `{buffer}` is declared with conflicting slots or sharing")]
    BufferConflict { buffer: String },
    #[error("shared buffer `{buffer}` differs from its declaration in `{other}`")]
    SharedBufferMismatch { buffer: String, other: String },
    #[error("texture `{texture}` cannot belong to a constant buffer")]
    TextureInBuffer { texture: String },
    #[error("stage entry point `{method}` must not return a value")]
    EntryPointReturnType { method: String },
    #[error("`{method}` must take `&self` or no receiver")]
    InvalidReceiver { method: String },
    #[error("parameter `{parameter}` of `{method}` has no semantics")]
    MissingSemantics { method: String, parameter: String },
    #[error("`{method}` declares {semantics} on more than one {direction} parameter")]
    DuplicateSemantics {
        method: String,
        semantics: Semantics,
        direction: Direction,
    },
    #[error("fragment output `{parameter}` of `{method}` must carry a color semantics")]
    FragmentOutputNotColor { method: String, parameter: String },
    #[error("vertex shader `{method}` does not produce a Position output")]
    MissingPositionOutput { method: String },
    #[error("technique `{technique}` reads {semantics} in the fragment shader but the vertex shader does not produce it")]
    SemanticsMismatch {
        technique: String,
        semantics: Semantics,
    },
    #[error("technique `{technique}` passes {semantics} as {vertex} but the fragment shader reads {fragment}")]
    InterfaceTypeMismatch {
        technique: String,
        semantics: Semantics,
        vertex: DataType,
        fragment: DataType,
    },
    #[error("technique `{technique}` names {count} {stage} shaders; exactly one is required")]
    StageCount {
        technique: String,
        stage: ShaderStage,
        count: usize,
    },
    #[error("technique `{technique}` references unknown shader `{name}`")]
    UnknownShader { technique: String, name: String },
    #[error("technique `{technique}` uses `{name}` as its {expected} shader, but it is not a {expected} shader")]
    WrongStage {
        technique: String,
        name: String,
        expected: ShaderStage,
    },
    #[error("`{item}` has unsupported type `{ty}`")]
    UnsupportedType { item: String, ty: String },
    #[error("unsupported syntax in shader code: `{construct}`")]
    UnsupportedSyntax { construct: String },
    #[error("`{name}` is not a known intrinsic or helper method")]
    UnknownIntrinsic { name: String },
    #[error("`{name}` takes {expected} arguments, {found} given")]
    ArgumentCount {
        name: String,
        expected: String,
        found: usize,
    },
    #[error("cannot resolve `{name}`")]
    UnresolvedSymbol { name: String },
    #[error("cannot infer the type of `{name}`; add a type annotation")]
    CannotInferType { name: String },
    #[error("`{expression}` is indexed with two arguments but is not a matrix")]
    NonMatrixIndex { expression: String },
    #[error("`{expression}` is a matrix; index it as `m[(row, column)]`")]
    AmbiguousMatrixIndex { expression: String },
    #[error("`{expression}` is not a texture")]
    NotATexture { expression: String },
    #[error("stage entry point `{name}` cannot be called from shader code")]
    EntryPointCall { name: String },
    #[error("`{name}` refers to itself")]
    CyclicReference { name: String },
    #[error("compiling `{shader}` to byte code failed: {message}")]
    ByteCode { shader: String, message: String },
    #[error("generated GLSL for `{shader}` does not validate: {message}")]
    GlslValidation { shader: String, message: String },
}

impl DiagnosticKind {
    pub fn category(&self) -> ErrorCategory {
        use DiagnosticKind::*;
        match self {
            Syntax { .. }
            | NoEffect
            | DuplicateEffect { .. }
            | InvalidModifiers { .. }
            | InvalidAttribute { .. }
            | MissingArrayLength { .. }
            | ArrayLengthMismatch { .. }
            | InvalidArrayLength { .. }
            | ReservedIdentifier { .. }
            | InvalidSlot { .. }
            | SlotConflict { .. }
            | BufferTooLarge { .. }
            | DuplicateMember { .. }
            | BufferConflict { .. }
            | SharedBufferMismatch { .. }
            | TextureInBuffer { .. }
            | EntryPointReturnType { .. }
            | InvalidReceiver { .. }
            | MissingSemantics { .. }
            | DuplicateSemantics { .. }
            | FragmentOutputNotColor { .. }
            | MissingPositionOutput { .. } => ErrorCategory::Structural,
            SemanticsMismatch { .. } | InterfaceTypeMismatch { .. } => {
                ErrorCategory::InterfaceMismatch
            }
            StageCount { .. }
            | UnknownShader { .. }
            | WrongStage { .. }
            | UnsupportedType { .. }
            | UnsupportedSyntax { .. }
            | UnknownIntrinsic { .. }
            | ArgumentCount { .. }
            | UnresolvedSymbol { .. }
            | CannotInferType { .. }
            | NonMatrixIndex { .. }
            | AmbiguousMatrixIndex { .. }
            | NotATexture { .. }
            | EntryPointCall { .. }
            | CyclicReference { .. } => ErrorCategory::Resolution,
            ByteCode { .. } | GlslValidation { .. } => ErrorCategory::ToolInvocation,
        }
    }
}

/// A non-fatal problem found while compiling one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: Option<Location>,
    pub file: Option<PathBuf>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: Location) -> Diagnostic {
        Diagnostic {
            kind,
            location: Some(location),
            file: None,
        }
    }

    pub fn at<T: ToTokens>(kind: DiagnosticKind, tokens: &T) -> Diagnostic {
        Diagnostic::new(kind, Location::of_tokens(tokens))
    }

    pub fn without_location(kind: DiagnosticKind) -> Diagnostic {
        Diagnostic {
            kind,
            location: None,
            file: None,
        }
    }

    pub fn in_file(mut self, path: &Path) -> Diagnostic {
        self.file = Some(path.to_owned());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, &self.location) {
            (Some(file), Some(location)) => write!(f, "{}:{}: ", file.display(), location)?,
            (Some(file), None) => write!(f, "{}: ", file.display())?,
            (None, Some(location)) => write!(f, "{}: ", location)?,
            (None, None) => {}
        }
        write!(f, "error: {}", self.kind)
    }
}

impl std::error::Error for Diagnostic {}

/// Failures that abort a whole compilation run.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("shader byte-code compiler is unusable: {0}")]
    ToolEnvironment(#[source] ByteCodeError),
    #[error("byte-code compilation is enabled but no byte-code compiler was supplied")]
    MissingByteCodeCompiler,
    #[error("cannot write asset stream: {0}")]
    Io(#[from] std::io::Error),
}
