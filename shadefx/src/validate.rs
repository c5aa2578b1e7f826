//! Structural and semantic checks over a discovered effect.
//!
//! Every rule reports independently; a failing rule never hides the others.

use std::collections::HashMap;

use crate::error::{Diagnostic, DiagnosticKind, Location};
use crate::layout::MAX_BUFFER_SIZE;
use crate::model::{
    describe_modifiers, EffectDeclaration, EffectTechnique, Modifier, Receiver, ShaderMethod,
    MAX_SLOT,
};
use crate::names;
use crate::types::{DataType, Direction, Semantics, ShaderStage};

struct Validator<'a> {
    effect: &'a EffectDeclaration,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Validator<'a> {
    fn report(&mut self, kind: DiagnosticKind, location: Location) {
        self.diagnostics.push(Diagnostic::new(kind, location));
    }

    fn expect_public(&mut self, item: &str, modifiers: &[Modifier], location: Location) {
        if modifiers != [Modifier::Public] {
            self.report(
                DiagnosticKind::InvalidModifiers {
                    item: item.to_owned(),
                    found: describe_modifiers(modifiers),
                    expected: "pub",
                },
                location,
            );
        }
    }

    fn expect_private(&mut self, item: &str, modifiers: &[Modifier], location: Location) {
        if !modifiers.is_empty() {
            self.report(
                DiagnosticKind::InvalidModifiers {
                    item: item.to_owned(),
                    found: describe_modifiers(modifiers),
                    expected: "private",
                },
                location,
            );
        }
    }

    fn check_name(&mut self, name: &str, location: Location) {
        if let Err(kind) = names::escape(name) {
            self.report(kind, location);
        }
    }

    fn check_constants(&mut self) {
        let effect = self.effect;
        for constant in effect.constants() {
            self.expect_public(&constant.name, &constant.modifiers, constant.location);
            self.check_name(&constant.name, constant.location);
            if !constant.is_array {
                continue;
            }
            match constant.array_length {
                None => self.report(
                    DiagnosticKind::MissingArrayLength {
                        constant: constant.name.clone(),
                    },
                    constant.location,
                ),
                Some(0) => self.report(
                    DiagnosticKind::InvalidArrayLength {
                        constant: constant.name.clone(),
                    },
                    constant.location,
                ),
                Some(_) => {}
            }
        }
    }

    fn check_slots(&mut self) {
        let effect = self.effect;
        let mut taken: HashMap<u32, &str> = HashMap::new();
        for buffer in &effect.buffers {
            self.check_name(&buffer.name, buffer.location);
            if buffer.size() > MAX_BUFFER_SIZE {
                self.report(
                    DiagnosticKind::BufferTooLarge {
                        buffer: buffer.name.clone(),
                    },
                    buffer.location,
                );
            }
            if buffer.slot > MAX_SLOT {
                self.report(
                    DiagnosticKind::InvalidSlot {
                        item: buffer.name.clone(),
                        slot: buffer.slot,
                    },
                    buffer.location,
                );
            } else if let Some(first) = taken.insert(buffer.slot, &buffer.name) {
                self.report(
                    DiagnosticKind::SlotConflict {
                        kind: "buffer",
                        slot: buffer.slot,
                        first: first.to_owned(),
                        second: buffer.name.clone(),
                    },
                    buffer.location,
                );
            }
        }

        let mut taken: HashMap<u32, &str> = HashMap::new();
        for texture in &effect.textures {
            self.expect_public(&texture.name, &texture.modifiers, texture.location);
            self.check_name(&texture.name, texture.location);
            if texture.slot > MAX_SLOT {
                self.report(
                    DiagnosticKind::InvalidSlot {
                        item: texture.name.clone(),
                        slot: texture.slot,
                    },
                    texture.location,
                );
            } else if let Some(first) = taken.insert(texture.slot, &texture.name) {
                self.report(
                    DiagnosticKind::SlotConflict {
                        kind: "texture",
                        slot: texture.slot,
                        first: first.to_owned(),
                        second: texture.name.clone(),
                    },
                    texture.location,
                );
            }
        }
    }

    /// Fields, literals and methods share one namespace in generated code.
    fn check_members(&mut self) {
        let effect = self.effect;
        let members = effect
            .constants()
            .map(|constant| (constant.name.as_str(), "constant", constant.location))
            .chain(
                effect
                    .textures
                    .iter()
                    .map(|texture| (texture.name.as_str(), "texture", texture.location)),
            )
            .chain(
                effect
                    .techniques
                    .iter()
                    .map(|technique| (technique.name.as_str(), "technique", technique.location)),
            )
            .chain(
                effect
                    .literals
                    .iter()
                    .map(|literal| (literal.name.as_str(), "literal", literal.location)),
            )
            .chain(
                effect
                    .methods
                    .iter()
                    .map(|method| (method.name.as_str(), "method", method.location)),
            );
        let mut seen: HashMap<&str, &'static str> = HashMap::new();
        for (name, kind, location) in members {
            if let Some(first) = seen.insert(name, kind) {
                self.report(
                    DiagnosticKind::DuplicateMember {
                        name: name.to_owned(),
                        first,
                        second: kind,
                    },
                    location,
                );
            }
        }
    }

    fn check_method(&mut self, method: &ShaderMethod) {
        self.check_name(&method.name, method.location);
        for parameter in &method.parameters {
            self.check_name(&parameter.name, parameter.location);
        }
        if method.receiver == Receiver::Other {
            self.report(
                DiagnosticKind::InvalidReceiver {
                    method: method.name.clone(),
                },
                method.location,
            );
        }
        let Some(stage) = method.stage else {
            self.expect_private(&method.name, &method.modifiers, method.location);
            return;
        };

        self.expect_public(&method.name, &method.modifiers, method.location);
        if method.declared_return {
            self.report(
                DiagnosticKind::EntryPointReturnType {
                    method: method.name.clone(),
                },
                method.location,
            );
        }

        let mut seen: HashMap<(Direction, Semantics), &str> = HashMap::new();
        for parameter in &method.parameters {
            if matches!(parameter.data_type, DataType::Bool | DataType::Matrix) {
                self.report(
                    DiagnosticKind::UnsupportedType {
                        item: format!("{}::{}", method.name, parameter.name),
                        ty: parameter.data_type.to_string(),
                    },
                    parameter.location,
                );
            }
            let Some(semantics) = parameter.semantics else {
                self.report(
                    DiagnosticKind::MissingSemantics {
                        method: method.name.clone(),
                        parameter: parameter.name.clone(),
                    },
                    parameter.location,
                );
                continue;
            };
            if seen
                .insert((parameter.direction, semantics), &parameter.name)
                .is_some()
            {
                self.report(
                    DiagnosticKind::DuplicateSemantics {
                        method: method.name.clone(),
                        semantics,
                        direction: parameter.direction,
                    },
                    parameter.location,
                );
            }
            if stage == ShaderStage::Fragment
                && parameter.direction == Direction::Out
                && semantics.color_index().is_none()
            {
                self.report(
                    DiagnosticKind::FragmentOutputNotColor {
                        method: method.name.clone(),
                        parameter: parameter.name.clone(),
                    },
                    parameter.location,
                );
            }
        }

        if stage == ShaderStage::Vertex
            && !method
                .outputs()
                .any(|output| output.semantics == Some(Semantics::Position))
        {
            self.report(
                DiagnosticKind::MissingPositionOutput {
                    method: method.name.clone(),
                },
                method.location,
            );
        }
    }

    /// Returns the single method a technique binds to `stage`, reporting
    /// every reference that does not resolve to a method of that stage.
    fn stage_method(
        &mut self,
        technique: &EffectTechnique,
        stage: ShaderStage,
    ) -> Option<&'a ShaderMethod> {
        let effect = self.effect;
        let references = technique.references(stage);
        if references.len() != 1 {
            self.report(
                DiagnosticKind::StageCount {
                    technique: technique.name.clone(),
                    stage,
                    count: references.len(),
                },
                technique.location,
            );
        }
        let mut found = None;
        for reference in references {
            match effect.method(&reference.name) {
                None => self.report(
                    DiagnosticKind::UnknownShader {
                        technique: technique.name.clone(),
                        name: reference.name.clone(),
                    },
                    reference.location,
                ),
                Some((_, method)) if method.stage != Some(stage) => self.report(
                    DiagnosticKind::WrongStage {
                        technique: technique.name.clone(),
                        name: reference.name.clone(),
                        expected: stage,
                    },
                    reference.location,
                ),
                Some((_, method)) => found = Some(method),
            }
        }
        if references.len() == 1 {
            found
        } else {
            None
        }
    }

    fn check_technique(&mut self, technique: &EffectTechnique) {
        self.expect_public(&technique.name, &technique.modifiers, technique.location);
        let vertex = self.stage_method(technique, ShaderStage::Vertex);
        let fragment = self.stage_method(technique, ShaderStage::Fragment);
        let (Some(vertex), Some(fragment)) = (vertex, fragment) else {
            return;
        };

        let produced: HashMap<Semantics, DataType> = vertex
            .outputs()
            .filter_map(|output| Some((output.semantics?, output.data_type)))
            .collect();
        for input in fragment.inputs() {
            let Some(semantics) = input.semantics else {
                continue;
            };
            match produced.get(&semantics) {
                None => self.report(
                    DiagnosticKind::SemanticsMismatch {
                        technique: technique.name.clone(),
                        semantics,
                    },
                    technique.location,
                ),
                Some(&ty) if ty != input.data_type => self.report(
                    DiagnosticKind::InterfaceTypeMismatch {
                        technique: technique.name.clone(),
                        semantics,
                        vertex: ty,
                        fragment: input.data_type,
                    },
                    technique.location,
                ),
                Some(_) => {}
            }
        }
    }
}

/// Checks `effect`, returning every problem found. An empty result means
/// the effect can be translated.
pub fn validate(effect: &EffectDeclaration) -> Vec<Diagnostic> {
    let mut validator = Validator {
        effect,
        diagnostics: Vec::new(),
    };
    validator.check_constants();
    validator.check_slots();
    validator.check_members();
    for literal in &effect.literals {
        validator.check_name(&literal.name, literal.location);
    }
    for method in &effect.methods {
        validator.check_method(method);
    }
    for technique in &effect.techniques {
        validator.check_technique(technique);
    }
    validator.diagnostics
}
