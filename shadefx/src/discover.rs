//! Classifies the items of a parsed source file into an [`EffectDeclaration`].
//!
//! An effect is a struct carrying `#[effect]`. Its fields become constants,
//! textures and techniques; the associated constants and methods of its
//! inherent `impl` blocks become literals, helpers and stage entry points.
//! Problems are recorded as diagnostics and discovery carries on, so one
//! pass reports as much as possible.

use quote::ToTokens;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, Fields, FnArg, ImplItem, Item, Lit, LitInt, LitStr, Meta, Pat, Type};
use tracing::debug;

use crate::error::{Diagnostic, DiagnosticKind, Location};
use crate::model::{
    ConstantBuffer, EffectDeclaration, EffectTechnique, MethodRef, Modifier, Receiver,
    ShaderConstant, ShaderLiteral, ShaderMethod, ShaderParameter, ShaderTexture,
};
use crate::types::{DataType, Direction, Semantics, ShaderStage, TextureKind};

/// Outcome of scanning one source file.
#[derive(Debug, Default)]
pub struct Discovery {
    pub effect: Option<EffectDeclaration>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn default_buffer_name(effect: &str, slot: u32) -> String {
    format!("{}Buffer{}", effect, slot)
}

enum FieldType {
    Data(DataType),
    Array { element: DataType, length: Option<u32> },
    Texture(TextureKind),
    Technique,
    Unsupported,
}

fn last_ident(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        _ => None,
    }
}

pub(crate) fn data_type(ty: &Type) -> Option<DataType> {
    match ty {
        Type::Paren(inner) => data_type(&inner.elem),
        Type::Group(inner) => data_type(&inner.elem),
        _ => {
            let segment = last_ident(ty)?;
            if !segment.arguments.is_none() {
                return None;
            }
            DataType::from_type_name(&segment.ident.to_string())
        }
    }
}

fn literal_length(expr: &Expr) -> Option<u32> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(int) => int.base10_parse::<u32>().ok(),
            _ => None,
        },
        _ => None,
    }
}

fn classify(ty: &Type) -> FieldType {
    if let Some(data) = data_type(ty) {
        return FieldType::Data(data);
    }
    match ty {
        Type::Paren(inner) => classify(&inner.elem),
        Type::Group(inner) => classify(&inner.elem),
        Type::Array(array) => match data_type(&array.elem) {
            Some(element) => FieldType::Array {
                element,
                length: literal_length(&array.len),
            },
            None => FieldType::Unsupported,
        },
        Type::Slice(slice) => match data_type(&slice.elem) {
            Some(element) => FieldType::Array {
                element,
                length: None,
            },
            None => FieldType::Unsupported,
        },
        _ => {
            let Some(segment) = last_ident(ty) else {
                return FieldType::Unsupported;
            };
            let name = segment.ident.to_string();
            match &segment.arguments {
                syn::PathArguments::None => {
                    if let Some(kind) = TextureKind::from_type_name(&name) {
                        FieldType::Texture(kind)
                    } else if name == "Technique" {
                        FieldType::Technique
                    } else {
                        FieldType::Unsupported
                    }
                }
                syn::PathArguments::AngleBracketed(args) if name == "Vec" && args.args.len() == 1 => {
                    match args.args.first() {
                        Some(syn::GenericArgument::Type(element)) => match data_type(element) {
                            Some(element) => FieldType::Array {
                                element,
                                length: None,
                            },
                            None => FieldType::Unsupported,
                        },
                        _ => FieldType::Unsupported,
                    }
                }
                _ => FieldType::Unsupported,
            }
        }
    }
}

fn find_attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(name))
}

fn has_attr(attrs: &[Attribute], name: &str) -> bool {
    find_attr(attrs, name).is_some()
}

fn attribute_error(error: syn::Error) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::InvalidAttribute {
            message: error.to_string(),
        },
        Location::of(error.span()),
    )
}

fn documentation(attrs: &[Attribute]) -> String {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let Meta::NameValue(name_value) = &attr.meta {
            if let Expr::Lit(syn::ExprLit {
                lit: Lit::Str(doc), ..
            }) = &name_value.value
            {
                let line = doc.value();
                lines.push(line.strip_prefix(' ').unwrap_or(&line).to_owned());
            }
        }
    }
    lines.join("\n")
}

fn visibility_modifiers(vis: &syn::Visibility) -> Vec<Modifier> {
    match vis {
        syn::Visibility::Public(_) => vec![Modifier::Public],
        syn::Visibility::Restricted(_) => vec![Modifier::Restricted],
        syn::Visibility::Inherited => Vec::new(),
    }
}

#[derive(Default)]
struct EffectAttr {
    namespace: Option<String>,
}

fn parse_effect_attr(attr: &Attribute) -> syn::Result<EffectAttr> {
    let mut out = EffectAttr::default();
    if let Meta::List(_) = attr.meta {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("namespace") {
                let value: LitStr = meta.value()?.parse()?;
                out.namespace = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported effect property"))
            }
        })?;
    }
    Ok(out)
}

#[derive(Default)]
struct BufferAttr {
    name: Option<String>,
    slot: Option<u32>,
    shared: bool,
}

fn parse_buffer_attr(attr: &Attribute) -> syn::Result<BufferAttr> {
    let mut out = BufferAttr::default();
    if let Meta::List(_) = attr.meta {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                out.name = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("slot") {
                let value: LitInt = meta.value()?.parse()?;
                out.slot = Some(value.base10_parse()?);
                Ok(())
            } else if meta.path.is_ident("shared") {
                out.shared = true;
                Ok(())
            } else {
                Err(meta.error("unsupported buffer property"))
            }
        })?;
    }
    Ok(out)
}

fn parse_texture_attr(attr: &Attribute) -> syn::Result<Option<u32>> {
    let mut slot = None;
    if let Meta::List(_) = attr.meta {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("slot") {
                let value: LitInt = meta.value()?.parse()?;
                slot = Some(value.base10_parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported texture property"))
            }
        })?;
    }
    Ok(slot)
}

fn parse_technique_attr(attr: &Attribute) -> syn::Result<(Vec<MethodRef>, Vec<MethodRef>)> {
    let mut vertex = Vec::new();
    let mut fragment = Vec::new();
    attr.parse_nested_meta(|meta| {
        let target = if meta.path.is_ident("vertex") {
            &mut vertex
        } else if meta.path.is_ident("fragment") {
            &mut fragment
        } else {
            return Err(meta.error("expected `vertex` or `fragment`"));
        };
        let value = meta.value()?;
        let (name, span) = if value.peek(LitStr) {
            let lit: LitStr = value.parse()?;
            (lit.value(), lit.span())
        } else {
            let ident: syn::Ident = value.parse()?;
            (ident.to_string(), ident.span())
        };
        target.push(MethodRef {
            name,
            location: Location::of(span),
        });
        Ok(())
    })?;
    Ok((vertex, fragment))
}

fn parse_semantics_attr(attr: &Attribute) -> syn::Result<Semantics> {
    let ident: syn::Ident = attr.parse_args()?;
    Semantics::parse(&ident.to_string())
        .ok_or_else(|| syn::Error::new(ident.span(), format!("unknown semantics `{}`", ident)))
}

fn parse_array_len_attr(attr: &Attribute) -> syn::Result<u32> {
    let lit: LitInt = attr.parse_args()?;
    lit.base10_parse()
}

struct Builder {
    effect: EffectDeclaration,
    diagnostics: Vec<Diagnostic>,
}

impl Builder {
    fn report(&mut self, kind: DiagnosticKind, location: Location) {
        self.diagnostics.push(Diagnostic::new(kind, location));
    }

    fn add_field(&mut self, field: &syn::Field) {
        let Some(ident) = &field.ident else {
            return;
        };
        let name = ident.to_string();
        let location = Location::of(ident.span());
        let modifiers = visibility_modifiers(&field.vis);

        let buffer_attr = find_attr(&field.attrs, "buffer");
        let texture_attr = find_attr(&field.attrs, "texture");
        let array_len_attr = find_attr(&field.attrs, "array_len");
        let technique_attr = find_attr(&field.attrs, "technique");

        match classify(&field.ty) {
            FieldType::Technique => {
                for (attr, what) in [
                    (buffer_attr, "buffer"),
                    (texture_attr, "texture"),
                    (array_len_attr, "array_len"),
                ] {
                    if let Some(attr) = attr {
                        self.misplaced_attr(attr, what, &name);
                    }
                }
                let (vertex, fragment) = match technique_attr.map(parse_technique_attr) {
                    Some(Ok(refs)) => refs,
                    Some(Err(error)) => {
                        self.diagnostics.push(attribute_error(error));
                        (Vec::new(), Vec::new())
                    }
                    None => (Vec::new(), Vec::new()),
                };
                self.effect.techniques.push(EffectTechnique {
                    name,
                    vertex,
                    fragment,
                    modifiers,
                    location,
                });
            }
            FieldType::Texture(kind) => {
                if buffer_attr.is_some() {
                    self.report(DiagnosticKind::TextureInBuffer { texture: name.clone() }, location);
                }
                if let Some(attr) = array_len_attr {
                    self.misplaced_attr(attr, "array_len", &name);
                }
                if let Some(attr) = technique_attr {
                    self.misplaced_attr(attr, "technique", &name);
                }
                let default_slot = self.effect.textures.len() as u32;
                let slot = match texture_attr.map(parse_texture_attr) {
                    Some(Ok(slot)) => slot.unwrap_or(default_slot),
                    Some(Err(error)) => {
                        self.diagnostics.push(attribute_error(error));
                        default_slot
                    }
                    None => default_slot,
                };
                self.effect.textures.push(ShaderTexture {
                    name,
                    kind,
                    slot,
                    modifiers,
                    location,
                });
            }
            FieldType::Data(data_type) => {
                if let Some(attr) = array_len_attr {
                    self.misplaced_attr(attr, "array_len", &name);
                }
                self.check_constant_attrs(texture_attr, technique_attr, &name);
                let constant = ShaderConstant {
                    name,
                    data_type,
                    is_array: false,
                    array_length: None,
                    modifiers,
                    location,
                };
                self.add_constant(constant, buffer_attr);
            }
            FieldType::Array { element, length } => {
                self.check_constant_attrs(texture_attr, technique_attr, &name);
                let annotated = match array_len_attr.map(parse_array_len_attr) {
                    Some(Ok(annotated)) => Some(annotated),
                    Some(Err(error)) => {
                        self.diagnostics.push(attribute_error(error));
                        None
                    }
                    None => None,
                };
                if let (Some(declared), Some(annotated)) = (length, annotated) {
                    if declared != annotated {
                        self.report(
                            DiagnosticKind::ArrayLengthMismatch {
                                constant: name.clone(),
                                declared,
                                annotated,
                            },
                            location,
                        );
                    }
                }
                let constant = ShaderConstant {
                    name,
                    data_type: element,
                    is_array: true,
                    array_length: length.or(annotated),
                    modifiers,
                    location,
                };
                self.add_constant(constant, buffer_attr);
            }
            FieldType::Unsupported => {
                self.report(
                    DiagnosticKind::UnsupportedType {
                        item: name,
                        ty: field.ty.to_token_stream().to_string(),
                    },
                    Location::of(field.ty.span()),
                );
            }
        }
    }

    fn misplaced_attr(&mut self, attr: &Attribute, what: &str, item: &str) {
        self.diagnostics.push(Diagnostic::at(
            DiagnosticKind::InvalidAttribute {
                message: format!("`#[{}]` does not apply to `{}`", what, item),
            },
            attr,
        ));
    }

    fn check_constant_attrs(
        &mut self,
        texture_attr: Option<&Attribute>,
        technique_attr: Option<&Attribute>,
        name: &str,
    ) {
        if let Some(attr) = texture_attr {
            self.misplaced_attr(attr, "texture", name);
        }
        if let Some(attr) = technique_attr {
            self.misplaced_attr(attr, "technique", name);
        }
    }

    fn add_constant(&mut self, constant: ShaderConstant, attr: Option<&Attribute>) {
        let parsed = match attr.map(parse_buffer_attr) {
            Some(Ok(parsed)) => Some(parsed),
            Some(Err(error)) => {
                self.diagnostics.push(attribute_error(error));
                None
            }
            None => None,
        };
        let parsed = parsed.unwrap_or_default();
        let name = match parsed.name {
            Some(name) => name,
            None => default_buffer_name(&self.effect.name, parsed.slot.unwrap_or(0)),
        };

        let existing = self
            .effect
            .buffers
            .iter_mut()
            .position(|buffer| buffer.name == name);
        match existing {
            Some(index) => {
                let buffer = &mut self.effect.buffers[index];
                let slot_conflict = parsed.slot.is_some_and(|slot| slot != buffer.slot);
                let shared_conflict = parsed.shared && !buffer.shared;
                let location = constant.location;
                buffer.constants.push(constant);
                if slot_conflict || shared_conflict {
                    self.report(DiagnosticKind::BufferConflict { buffer: name }, location);
                }
            }
            None => {
                debug!(buffer = %name, "declaring constant buffer");
                self.effect.buffers.push(ConstantBuffer {
                    name,
                    slot: parsed.slot.unwrap_or(0),
                    shared: parsed.shared,
                    location: constant.location,
                    constants: vec![constant],
                });
            }
        }
    }

    fn add_literal(&mut self, item: &syn::ImplItemConst) {
        let name = item.ident.to_string();
        let location = Location::of(item.ident.span());
        match data_type(&item.ty) {
            Some(data_type) => self.effect.literals.push(ShaderLiteral {
                name,
                data_type,
                value: item.expr.clone(),
                location,
            }),
            None => self.report(
                DiagnosticKind::UnsupportedType {
                    item: name,
                    ty: item.ty.to_token_stream().to_string(),
                },
                Location::of(item.ty.span()),
            ),
        }
    }

    fn add_method(&mut self, item: &syn::ImplItemFn) {
        let name = item.sig.ident.to_string();
        let location = Location::of(item.sig.ident.span());

        let vertex = has_attr(&item.attrs, "vertex");
        let fragment = has_attr(&item.attrs, "fragment");
        let stage = match (vertex, fragment) {
            (true, false) => Some(ShaderStage::Vertex),
            (false, true) => Some(ShaderStage::Fragment),
            (false, false) => None,
            (true, true) => {
                self.report(
                    DiagnosticKind::InvalidAttribute {
                        message: format!("`{}` is marked both `#[vertex]` and `#[fragment]`", name),
                    },
                    location,
                );
                return;
            }
        };

        let mut modifiers = visibility_modifiers(&item.vis);
        if stage.is_none() && !modifiers.is_empty() {
            debug!(method = %name, "skipping public method without a stage attribute");
            return;
        }
        if item.sig.constness.is_some() {
            modifiers.push(Modifier::Const);
        }
        if item.sig.asyncness.is_some() {
            modifiers.push(Modifier::Async);
        }
        if item.sig.unsafety.is_some() {
            modifiers.push(Modifier::Unsafe);
        }
        if item.sig.abi.is_some() {
            modifiers.push(Modifier::Extern);
        }
        if !item.sig.generics.params.is_empty() {
            modifiers.push(Modifier::Generic);
        }

        let receiver = match item.sig.receiver() {
            None => Receiver::None,
            Some(receiver)
                if receiver.reference.is_some()
                    && receiver.mutability.is_none()
                    && receiver.colon_token.is_none() =>
            {
                Receiver::Ref
            }
            Some(_) => Receiver::Other,
        };

        let mut parameters = Vec::new();
        for input in &item.sig.inputs {
            if let FnArg::Typed(typed) = input {
                if let Some(parameter) = self.parameter(&name, typed) {
                    parameters.push(parameter);
                }
            }
        }

        let (return_type, declared_return) = match &item.sig.output {
            syn::ReturnType::Default => (None, false),
            syn::ReturnType::Type(_, ty) => match ty.as_ref() {
                Type::Tuple(tuple) if tuple.elems.is_empty() => (None, false),
                ty => match data_type(ty) {
                    Some(data_type) => (Some(data_type), true),
                    None => {
                        self.report(
                            DiagnosticKind::UnsupportedType {
                                item: name.clone(),
                                ty: ty.to_token_stream().to_string(),
                            },
                            Location::of(ty.span()),
                        );
                        (None, true)
                    }
                },
            },
        };

        self.effect.methods.push(ShaderMethod {
            name,
            stage,
            parameters,
            return_type,
            declared_return,
            receiver,
            modifiers,
            body: item.block.clone(),
            location,
        });
    }

    fn parameter(&mut self, method: &str, typed: &syn::PatType) -> Option<ShaderParameter> {
        let Pat::Ident(pat) = typed.pat.as_ref() else {
            self.diagnostics.push(Diagnostic::at(
                DiagnosticKind::UnsupportedSyntax {
                    construct: typed.pat.to_token_stream().to_string(),
                },
                &typed.pat,
            ));
            return None;
        };
        let name = pat.ident.to_string();
        let (direction, ty) = match typed.ty.as_ref() {
            Type::Reference(reference) if reference.mutability.is_some() => {
                (Direction::Out, reference.elem.as_ref())
            }
            ty => (Direction::In, ty),
        };
        let Some(data_type) = data_type(ty) else {
            self.report(
                DiagnosticKind::UnsupportedType {
                    item: format!("{}::{}", method, name),
                    ty: ty.to_token_stream().to_string(),
                },
                Location::of(ty.span()),
            );
            return None;
        };
        let semantics = match find_attr(&typed.attrs, "semantics").map(parse_semantics_attr) {
            Some(Ok(semantics)) => Some(semantics),
            Some(Err(error)) => {
                self.diagnostics.push(attribute_error(error));
                None
            }
            None => None,
        };
        Some(ShaderParameter {
            name,
            data_type,
            direction,
            semantics,
            location: Location::of(pat.ident.span()),
        })
    }
}

fn is_impl_of(item: &syn::ItemImpl, name: &str) -> bool {
    if item.trait_.is_some() {
        return false;
    }
    match item.self_ty.as_ref() {
        Type::Path(path) => path.qself.is_none() && path.path.is_ident(name),
        _ => false,
    }
}

/// Finds the effect declared in `file`. `default_namespace` applies when the
/// effect does not name its own.
pub fn discover_effects(file: &syn::File, default_namespace: &str) -> Discovery {
    let mut discovery = Discovery::default();
    let mut structs = file.items.iter().filter_map(|item| match item {
        Item::Struct(item) if has_attr(&item.attrs, "effect") => Some(item),
        _ => None,
    });

    let Some(item) = structs.next() else {
        discovery
            .diagnostics
            .push(Diagnostic::without_location(DiagnosticKind::NoEffect));
        return discovery;
    };
    for duplicate in structs {
        discovery.diagnostics.push(Diagnostic::new(
            DiagnosticKind::DuplicateEffect {
                name: duplicate.ident.to_string(),
            },
            Location::of(duplicate.ident.span()),
        ));
    }

    let name = item.ident.to_string();
    let mut namespace = default_namespace.to_owned();
    if let Some(attr) = find_attr(&item.attrs, "effect") {
        match parse_effect_attr(attr) {
            Ok(EffectAttr {
                namespace: Some(explicit),
            }) => namespace = explicit,
            Ok(_) => {}
            Err(error) => discovery.diagnostics.push(attribute_error(error)),
        }
    }

    let mut builder = Builder {
        effect: EffectDeclaration {
            name: name.clone(),
            namespace,
            documentation: documentation(&item.attrs),
            location: Location::of(item.ident.span()),
            buffers: Vec::new(),
            textures: Vec::new(),
            literals: Vec::new(),
            methods: Vec::new(),
            techniques: Vec::new(),
        },
        diagnostics: std::mem::take(&mut discovery.diagnostics),
    };

    match &item.fields {
        Fields::Named(fields) => {
            for field in &fields.named {
                builder.add_field(field);
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(fields) => builder.report(
            DiagnosticKind::UnsupportedSyntax {
                construct: format!("struct {}{}", name, fields.to_token_stream()),
            },
            Location::of(fields.span()),
        ),
    }

    for item in &file.items {
        let Item::Impl(item) = item else {
            continue;
        };
        if !is_impl_of(item, &name) {
            continue;
        }
        for impl_item in &item.items {
            match impl_item {
                ImplItem::Const(item) => builder.add_literal(item),
                ImplItem::Fn(item) => builder.add_method(item),
                _ => {}
            }
        }
    }

    debug!(
        effect = %name,
        buffers = builder.effect.buffers.len(),
        textures = builder.effect.textures.len(),
        methods = builder.effect.methods.len(),
        techniques = builder.effect.techniques.len(),
        "discovered effect"
    );
    discovery.effect = Some(builder.effect);
    discovery.diagnostics = builder.diagnostics;
    discovery
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discover(source: &str) -> Discovery {
        let file = syn::parse_file(source).unwrap();
        discover_effects(&file, "demo")
    }

    #[test]
    fn constants_land_in_buffers() {
        let discovery = discover(
            r#"
            #[effect]
            pub struct Blur {
                pub texel: Vector2,
                #[buffer(name = "Weights", slot = 1)]
                pub weights: [f32; 5],
                #[buffer(name = "Weights")]
                pub radius: f32,
            }
            "#,
        );
        assert!(discovery.diagnostics.is_empty(), "{:?}", discovery.diagnostics);
        let effect = discovery.effect.unwrap();
        assert_eq!(effect.namespace, "demo");
        let names = effect
            .buffers
            .iter()
            .map(|buffer| (buffer.name.as_str(), buffer.slot, buffer.constants.len()))
            .collect::<Vec<_>>();
        assert_eq!(names, vec![("BlurBuffer0", 0, 1), ("Weights", 1, 2)]);
        assert_eq!(effect.buffers[1].constants[0].array_length, Some(5));
    }

    #[test]
    fn conflicting_buffer_attributes_are_reported() {
        let discovery = discover(
            r#"
            #[effect]
            pub struct Fog {
                #[buffer(name = "Params", slot = 1)]
                pub near: f32,
                #[buffer(name = "Params", slot = 2)]
                pub far: f32,
            }
            "#,
        );
        assert!(matches!(
            discovery.diagnostics[0].kind,
            DiagnosticKind::BufferConflict { .. }
        ));
    }

    #[test]
    fn second_effect_is_rejected() {
        let discovery = discover(
            r#"
            #[effect] pub struct A { pub x: f32 }
            #[effect] pub struct B { pub y: f32 }
            "#,
        );
        assert_eq!(discovery.effect.unwrap().name, "A");
        assert_eq!(
            discovery.diagnostics[0].kind,
            DiagnosticKind::DuplicateEffect {
                name: "B".to_owned()
            }
        );
    }

    #[test]
    fn missing_effect_is_reported() {
        let discovery = discover("pub struct Plain { pub x: f32 }");
        assert!(discovery.effect.is_none());
        assert_eq!(discovery.diagnostics[0].kind, DiagnosticKind::NoEffect);
    }

    #[test]
    fn methods_are_classified() {
        let discovery = discover(
            r#"
            /// Solid color.
            #[effect(namespace = "fx::basic")]
            pub struct Solid {
                pub color: Vector4,
                #[technique(vertex = vs, fragment = fs)]
                pub main: Technique,
            }
            impl Solid {
                const SCALE: f32 = 2.0;
                #[vertex]
                pub fn vs(#[semantics(Position)] p: Vector4, #[semantics(Position)] out: &mut Vector4) {
                    *out = p;
                }
                #[fragment]
                pub fn fs(&self, #[semantics(Color0)] c: &mut Vector4) {
                    *c = self.color;
                }
                fn twice(x: f32) -> f32 { x * Self::SCALE }
                pub fn host_only(&self) {}
            }
            "#,
        );
        assert!(discovery.diagnostics.is_empty(), "{:?}", discovery.diagnostics);
        let effect = discovery.effect.unwrap();
        assert_eq!(effect.full_name(), "fx::basic::Solid");
        assert_eq!(effect.documentation, "Solid color.");
        assert_eq!(effect.literals.len(), 1);
        let methods = effect
            .methods
            .iter()
            .map(|method| (method.name.as_str(), method.stage))
            .collect::<Vec<_>>();
        assert_eq!(
            methods,
            vec![
                ("vs", Some(ShaderStage::Vertex)),
                ("fs", Some(ShaderStage::Fragment)),
                ("twice", None),
            ]
        );
        let vs = &effect.methods[0];
        assert_eq!(vs.receiver, Receiver::None);
        assert_eq!(vs.outputs().count(), 1);
        assert_eq!(effect.methods[2].return_type, Some(DataType::Float));
        assert_eq!(effect.techniques[0].vertex[0].name, "vs");
    }

    #[test]
    fn unsupported_field_type() {
        let discovery = discover(
            r#"
            #[effect]
            pub struct Bad { pub weight: f64 }
            "#,
        );
        assert!(matches!(
            discovery.diagnostics[0].kind,
            DiagnosticKind::UnsupportedType { .. }
        ));
    }
}
