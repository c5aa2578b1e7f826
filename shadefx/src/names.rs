//! Identifier escaping.
//!
//! User identifiers are emitted as `fx_<name>`. Names synthesized by the
//! compiler use their own prefixes (`fxin_`, `fxout_`, `fxcb_`, `fxsmp_`,
//! `fxs<N>_`), none of which can be produced by escaping a user identifier.

use crate::error::DiagnosticKind;

pub const PREFIX: &str = "fx_";

fn bare(name: &str) -> &str {
    name.strip_prefix("r#").unwrap_or(name)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Escapes `name`, rejecting names that are not ASCII identifiers and
/// identifiers whose escaped form would be reserved in a target language
/// (GLSL reserves every name containing `__`).
pub fn escape(name: &str) -> Result<String, DiagnosticKind> {
    let bare = bare(name);
    let escaped = escaped(bare);
    if !is_identifier(bare) || escaped.contains("__") {
        return Err(DiagnosticKind::ReservedIdentifier {
            name: name.to_owned(),
        });
    }
    Ok(escaped)
}

/// Escapes a name that already passed validation.
pub fn escaped(name: &str) -> String {
    format!("{}{}", PREFIX, bare(name))
}

pub fn input(name: &str) -> String {
    format!("fxin_{}", bare(name))
}

pub fn output(name: &str) -> String {
    format!("fxout_{}", bare(name))
}

pub fn buffer(name: &str) -> String {
    format!("fxcb_{}", bare(name))
}

pub fn sampler(name: &str) -> String {
    format!("fxsmp_{}", bare(name))
}

/// Name for the `generation`-th local that shadows an earlier binding.
pub fn shadowed(name: &str, generation: usize) -> String {
    format!("fxs{}_{}", generation, bare(name))
}
