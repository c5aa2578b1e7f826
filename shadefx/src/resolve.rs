//! Name resolution for shader code.
//!
//! Method bodies reach the effect's resources through `self.<field>`,
//! `self.<method>(..)`, `Self::<CONST>` and `Self::<method>(..)`. A
//! [`SymbolResolver`] maps those names to effect entities; [`collect_usage`]
//! walks a stage entry point and everything it calls to find the resources a
//! stage program must declare.

use std::collections::{HashMap, HashSet};

use syn::visit::{self, Visit};
use syn::{Expr, Member};

use crate::error::{Diagnostic, DiagnosticKind, Location};
use crate::model::EffectDeclaration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Constant { buffer: usize, index: usize },
    Texture(usize),
    Literal(usize),
    Method(usize),
}

pub trait SymbolResolver {
    /// Resolves `self.<name>`.
    fn resolve_member(&self, name: &str) -> Option<Symbol>;

    /// Resolves `Self::<name>`.
    fn resolve_associated(&self, name: &str) -> Option<Symbol>;

    fn resolve_expr(&self, expr: &Expr) -> Option<Symbol> {
        match expr {
            Expr::Field(field) if is_self(&field.base) => match &field.member {
                Member::Named(ident) => self.resolve_member(&ident.to_string()),
                Member::Unnamed(_) => None,
            },
            Expr::Path(path) => associated_name(&path.path)
                .and_then(|name| self.resolve_associated(&name)),
            Expr::Paren(inner) => self.resolve_expr(&inner.expr),
            _ => None,
        }
    }
}

pub fn is_self(expr: &Expr) -> bool {
    match expr {
        Expr::Path(path) => path.qself.is_none() && path.path.is_ident("self"),
        Expr::Paren(inner) => is_self(&inner.expr),
        _ => false,
    }
}

/// The `x` of a `Self::x` path.
pub fn associated_name(path: &syn::Path) -> Option<String> {
    if path.segments.len() != 2 || path.leading_colon.is_some() {
        return None;
    }
    let first = &path.segments[0];
    let second = &path.segments[1];
    if first.ident != "Self" || !second.arguments.is_none() {
        return None;
    }
    Some(second.ident.to_string())
}

/// Resolves names against one effect declaration.
pub struct EffectScope<'a> {
    effect: &'a EffectDeclaration,
    members: HashMap<&'a str, Symbol>,
    associated: HashMap<&'a str, Symbol>,
}

impl<'a> EffectScope<'a> {
    pub fn new(effect: &'a EffectDeclaration) -> EffectScope<'a> {
        let mut members = HashMap::new();
        let mut associated = HashMap::new();
        for (buffer_index, buffer) in effect.buffers.iter().enumerate() {
            for (index, constant) in buffer.constants.iter().enumerate() {
                members.insert(
                    constant.name.as_str(),
                    Symbol::Constant {
                        buffer: buffer_index,
                        index,
                    },
                );
            }
        }
        for (index, texture) in effect.textures.iter().enumerate() {
            members.insert(texture.name.as_str(), Symbol::Texture(index));
        }
        for (index, method) in effect.methods.iter().enumerate() {
            members.insert(method.name.as_str(), Symbol::Method(index));
            associated.insert(method.name.as_str(), Symbol::Method(index));
        }
        for (index, literal) in effect.literals.iter().enumerate() {
            associated.insert(literal.name.as_str(), Symbol::Literal(index));
        }
        EffectScope {
            effect,
            members,
            associated,
        }
    }

    pub fn effect(&self) -> &'a EffectDeclaration {
        self.effect
    }
}

impl SymbolResolver for EffectScope<'_> {
    fn resolve_member(&self, name: &str) -> Option<Symbol> {
        self.members.get(name).copied()
    }

    fn resolve_associated(&self, name: &str) -> Option<Symbol> {
        self.associated.get(name).copied()
    }
}

struct ReferenceCollector<'r> {
    resolver: &'r dyn SymbolResolver,
    found: Vec<(Symbol, Location)>,
}

impl<'ast> Visit<'ast> for ReferenceCollector<'_> {
    fn visit_expr_field(&mut self, expr: &'ast syn::ExprField) {
        if is_self(&expr.base) {
            if let Member::Named(ident) = &expr.member {
                if let Some(symbol) = self.resolver.resolve_member(&ident.to_string()) {
                    self.found.push((symbol, Location::of(ident.span())));
                }
            }
        }
        visit::visit_expr_field(self, expr);
    }

    fn visit_expr_method_call(&mut self, expr: &'ast syn::ExprMethodCall) {
        if is_self(&expr.receiver) {
            if let Some(symbol) = self.resolver.resolve_member(&expr.method.to_string()) {
                self.found.push((symbol, Location::of(expr.method.span())));
            }
        }
        visit::visit_expr_method_call(self, expr);
    }

    fn visit_expr_path(&mut self, expr: &'ast syn::ExprPath) {
        if let Some(name) = associated_name(&expr.path) {
            if let Some(symbol) = self.resolver.resolve_associated(&name) {
                self.found.push((symbol, Location::of_tokens(expr)));
            }
        }
        visit::visit_expr_path(self, expr);
    }
}

fn references_in_block(resolver: &dyn SymbolResolver, block: &syn::Block) -> Vec<(Symbol, Location)> {
    let mut collector = ReferenceCollector {
        resolver,
        found: Vec::new(),
    };
    collector.visit_block(block);
    collector.found
}

fn references_in_expr(resolver: &dyn SymbolResolver, expr: &Expr) -> Vec<(Symbol, Location)> {
    let mut collector = ReferenceCollector {
        resolver,
        found: Vec::new(),
    };
    collector.visit_expr(expr);
    collector.found
}

/// Entities a stage program uses, each list in order of first use. Helpers
/// are ordered so that every callee precedes its callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub literals: Vec<usize>,
    pub buffers: Vec<usize>,
    pub textures: Vec<usize>,
    pub helpers: Vec<usize>,
}

struct UsageCollector<'a> {
    effect: &'a EffectDeclaration,
    resolver: &'a dyn SymbolResolver,
    usage: Usage,
    method_stack: Vec<usize>,
    literal_stack: Vec<usize>,
    diagnostics: Vec<Diagnostic>,
}

fn push_unique(list: &mut Vec<usize>, index: usize) {
    if !list.contains(&index) {
        list.push(index);
    }
}

impl UsageCollector<'_> {
    fn visit_method(&mut self, index: usize) {
        self.method_stack.push(index);
        let references = references_in_block(self.resolver, &self.effect.methods[index].body);
        for (symbol, location) in references {
            self.use_symbol(symbol, location);
        }
        self.method_stack.pop();
    }

    fn visit_literal(&mut self, index: usize, location: Location) {
        if self.usage.literals.contains(&index) {
            return;
        }
        let literal = &self.effect.literals[index];
        if self.literal_stack.contains(&index) {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::CyclicReference {
                    name: literal.name.clone(),
                },
                location,
            ));
            return;
        }
        self.literal_stack.push(index);
        for (symbol, location) in references_in_expr(self.resolver, &literal.value) {
            if let Symbol::Literal(dependency) = symbol {
                self.visit_literal(dependency, location);
            }
        }
        self.literal_stack.pop();
        push_unique(&mut self.usage.literals, index);
    }

    fn use_symbol(&mut self, symbol: Symbol, location: Location) {
        match symbol {
            Symbol::Constant { buffer, .. } => push_unique(&mut self.usage.buffers, buffer),
            Symbol::Texture(texture) => push_unique(&mut self.usage.textures, texture),
            Symbol::Literal(literal) => self.visit_literal(literal, location),
            Symbol::Method(method) => {
                let callee = &self.effect.methods[method];
                if callee.stage.is_some() {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::EntryPointCall {
                            name: callee.name.clone(),
                        },
                        location,
                    ));
                } else if self.method_stack.contains(&method) {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::CyclicReference {
                            name: callee.name.clone(),
                        },
                        location,
                    ));
                } else if !self.usage.helpers.contains(&method) {
                    self.visit_method(method);
                    push_unique(&mut self.usage.helpers, method);
                }
            }
        }
    }
}

/// Collects what the method at `method` uses, directly or through helpers.
pub fn collect_usage(
    effect: &EffectDeclaration,
    resolver: &dyn SymbolResolver,
    method: usize,
) -> Result<Usage, Vec<Diagnostic>> {
    let mut collector = UsageCollector {
        effect,
        resolver,
        usage: Usage::default(),
        method_stack: Vec::new(),
        literal_stack: Vec::new(),
        diagnostics: Vec::new(),
    };
    collector.visit_method(method);
    if collector.diagnostics.is_empty() {
        Ok(collector.usage)
    } else {
        let mut seen = HashSet::new();
        collector
            .diagnostics
            .retain(|diagnostic| seen.insert((diagnostic.kind.clone(), diagnostic.location)));
        Err(collector.diagnostics)
    }
}
