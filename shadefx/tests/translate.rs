use pretty_assertions::assert_eq;
use shadefx::backends::{GlslBackend, HlslBackend, ShaderBackend};
use shadefx::discover::discover_effects;
use shadefx::error::{Diagnostic, DiagnosticKind};
use shadefx::resolve::EffectScope;
use shadefx::translate::generate_stage;
use shadefx::validate::validate;

const SPRITE: &str = include_str!("effects/sprite.rs");
const MIXER: &str = include_str!("effects/mixer.rs");

fn generate(source: &str, method: &str, backend: &dyn ShaderBackend) -> Result<String, Vec<Diagnostic>> {
    let file = syn::parse_file(source).unwrap();
    let discovery = discover_effects(&file, "test");
    assert!(discovery.diagnostics.is_empty(), "{:?}", discovery.diagnostics);
    let effect = discovery.effect.unwrap();
    let problems = validate(&effect);
    assert!(problems.is_empty(), "{:?}", problems);
    let scope = EffectScope::new(&effect);
    let (index, _) = effect.method(method).unwrap();
    generate_stage(&effect, &scope, index, backend)
}

fn errors(source: &str, method: &str) -> Vec<DiagnosticKind> {
    generate(source, method, &GlslBackend)
        .unwrap_err()
        .into_iter()
        .map(|diagnostic| diagnostic.kind)
        .collect()
}

/// Wraps a fragment shader body into a minimal effect.
fn fragment(body: &str) -> String {
    format!(
        r#"
        #[effect]
        pub struct Scratch {{
            pub tint: Vector4,
            pub transform: Matrix,
        }}
        impl Scratch {{
            #[fragment]
            pub fn fs(&self, #[semantics(TexCoord0)] uv: Vector2, #[semantics(Color0)] color: &mut Vector4) {{
                {}
            }}
        }}
        "#,
        body
    )
}

#[test]
fn sprite_vertex_glsl() {
    let expected = "\
layout(std140, binding = 1) uniform fxcb_Camera
{
    mat4 fx_view_projection;
};

layout(location = 0) in vec4 fxin_position;
layout(location = 12) in vec2 fxin_uv;
layout(location = 12) out vec2 fxout_uv_out;

void main()
{
    vec4 fx_position = fxin_position;
    vec2 fx_uv = fxin_uv;
    gl_Position = vec4(0.0);
    fxout_uv_out = vec2(0.0);
    gl_Position = (fx_view_projection * fx_position);
    fxout_uv_out = fx_uv;
}
";
    assert_eq!(generate(SPRITE, "vs", &GlslBackend).unwrap(), expected);
}

#[test]
fn sprite_vertex_hlsl() {
    let expected = "\
cbuffer fxcb_Camera : register(b1)
{
    float4x4 fx_view_projection : packoffset(c0);
};

void main(
    float4 fxin_position : POSITION,
    float2 fxin_uv : TEXCOORD0,
    out float4 fxout_clip : SV_Position,
    out float2 fxout_uv_out : TEXCOORD0)
{
    float4 fx_position = fxin_position;
    float2 fx_uv = fxin_uv;
    fxout_clip = (float4)0;
    fxout_uv_out = (float2)0;
    fxout_clip = mul(fx_view_projection, fx_position);
    fxout_uv_out = fx_uv;
}
";
    assert_eq!(generate(SPRITE, "vs", &HlslBackend).unwrap(), expected);
}

#[test]
fn sprite_fragment_glsl() {
    let expected = "\
const float fx_GAMMA = 2.2;

layout(std140, binding = 0) uniform fxcb_SpriteBuffer0
{
    vec4 fx_tint;
};

layout(binding = 0) uniform sampler2D fx_diffuse;

layout(location = 12) in vec2 fxin_uv;
layout(location = 0) out vec4 fxout_color;

vec4 fx_correct(vec4 fx_color)
{
    return pow(fx_color, vec4(1.0 / fx_GAMMA));
}

void main()
{
    vec2 fx_uv = fxin_uv;
    fxout_color = vec4(0.0);
    fxout_color = fx_correct(texture(fx_diffuse, fx_uv) * fx_tint);
}
";
    assert_eq!(generate(SPRITE, "fs", &GlslBackend).unwrap(), expected);
}

#[test]
fn sprite_fragment_hlsl() {
    let expected = "\
static const float fx_GAMMA = 2.2;

cbuffer fxcb_SpriteBuffer0 : register(b0)
{
    float4 fx_tint : packoffset(c0);
};

Texture2D fx_diffuse : register(t0);
SamplerState fxsmp_diffuse : register(s0);

float4 fx_correct(float4 fx_color)
{
    return pow(fx_color, (float4)(1.0 / fx_GAMMA));
}

void main(
    float2 fxin_uv : TEXCOORD0,
    out float4 fxout_color : SV_Target0)
{
    float2 fx_uv = fxin_uv;
    fxout_color = (float4)0;
    fxout_color = fx_correct(fx_diffuse.Sample(fxsmp_diffuse, fx_uv) * fx_tint);
}
";
    assert_eq!(generate(SPRITE, "fs", &HlslBackend).unwrap(), expected);
}

#[test]
fn matrix_products_and_subscripts() {
    let glsl = generate(MIXER, "vs", &GlslBackend).unwrap();
    assert!(glsl.contains("    float fx_scale = fx_transform[3][0];\n"), "{}", glsl);
    assert!(glsl.contains("    vec4 fx_moved = (fx_transform * fx_position);\n"), "{}", glsl);
    assert!(glsl.contains("    mat4 fx_m = fx_transform;\n    fx_m = (fx_m * fx_transform);\n"), "{}", glsl);
    assert!(glsl.contains("    gl_Position = fx_moved * fx_scale;\n"), "{}", glsl);
    assert!(glsl.contains("    fxout_t = fx_position.x;\n"), "{}", glsl);

    let hlsl = generate(MIXER, "vs", &HlslBackend).unwrap();
    assert!(hlsl.contains("    float fx_scale = fx_transform[0][3];\n"), "{}", hlsl);
    assert!(hlsl.contains("    float4 fx_moved = mul(fx_transform, fx_position);\n"), "{}", hlsl);
    assert!(hlsl.contains("    fx_m = mul(fx_m, fx_transform);\n"), "{}", hlsl);
    assert!(hlsl.contains("    float fx_amount : packoffset(c0);\n"), "{}", hlsl);
    assert!(hlsl.contains("    float4x4 fx_transform : packoffset(c1);\n"), "{}", hlsl);
}

#[test]
fn intrinsics_are_renamed_per_language() {
    let glsl = generate(MIXER, "fs", &GlslBackend).unwrap();
    assert!(glsl.contains("float fx_blend = mix(0.25, 0.75, fract(fx_t * fx_amount));"), "{}", glsl);
    assert!(glsl.contains("fxout_color = vec4(clamp(inversesqrt(fx_blend), 0.0, 1.0));"), "{}", glsl);

    let hlsl = generate(MIXER, "fs", &HlslBackend).unwrap();
    assert!(hlsl.contains("float fx_blend = lerp(0.25, 0.75, frac(fx_t * fx_amount));"), "{}", hlsl);
    assert!(hlsl.contains("fxout_color = (float4)(saturate(rsqrt(fx_blend)));"), "{}", hlsl);
}

#[test]
fn control_flow_and_helper_tails() {
    let glsl = generate(MIXER, "fs", &GlslBackend).unwrap();
    let helper = "\
float fx_weight(int fx_i)
{
    if (fx_i == 0)
    {
        return 0.5;
    }
    else
    {
        return 0.25;
    }
}
";
    assert!(glsl.contains(helper), "{}", glsl);
    let body = "    float fx_total = 0.0;
    for (int fx_i = 0; fx_i < 4; ++fx_i)
    {
        fx_total += fx_weight(fx_i);
    }
    if (fx_total > 1.0)
    {
        discard;
    }
";
    assert!(glsl.contains(body), "{}", glsl);
}

#[test]
fn keywords_are_escaped() {
    let source = fragment("let texture = uv.x; let input = texture * 2.0; *color = Vector4::splat(input);");
    let glsl = generate(&source, "fs", &GlslBackend).unwrap();
    assert!(glsl.contains("    float fx_texture = fx_uv.x;\n"), "{}", glsl);
    assert!(glsl.contains("    float fx_input = fx_texture * 2.0;\n"), "{}", glsl);
}

#[test]
fn shadowed_locals_get_fresh_names() {
    let source = fragment("let x = uv.x; let x = x * 2.0; let tint = x; *color = self.tint * tint;");
    let glsl = generate(&source, "fs", &GlslBackend).unwrap();
    assert!(glsl.contains("    float fx_x = fx_uv.x;\n"), "{}", glsl);
    assert!(glsl.contains("    float fxs1_x = fx_x * 2.0;\n"), "{}", glsl);
    // A local must not hide the constant of the same name.
    assert!(glsl.contains("    float fxs1_tint = fxs1_x;\n"), "{}", glsl);
    assert!(glsl.contains("    fxout_color = fx_tint * fxs1_tint;\n"), "{}", glsl);
}

#[test]
fn constructors_and_swizzles() {
    let source = fragment(
        "let v = Vector3 { x: uv.x, y: uv.y, z: 1.0 }; let n = 2 as f32; *color = Vector4::new(v.x, v.y, v.z, n).bgra();",
    );
    let glsl = generate(&source, "fs", &GlslBackend).unwrap();
    assert!(glsl.contains("    vec3 fx_v = vec3(fx_uv.x, fx_uv.y, 1.0);\n"), "{}", glsl);
    assert!(glsl.contains("    float fx_n = float(2);\n"), "{}", glsl);
    assert!(glsl.contains("    fxout_color = vec4(fx_v.x, fx_v.y, fx_v.z, fx_n).bgra;\n"), "{}", glsl);
}

#[test]
fn single_index_on_matrix_is_ambiguous() {
    let source = fragment("*color = self.transform[1];");
    assert!(matches!(
        errors(&source, "fs").as_slice(),
        [DiagnosticKind::AmbiguousMatrixIndex { .. }]
    ));
}

#[test]
fn pair_index_needs_a_matrix() {
    let source = fragment("*color = Vector4::splat(self.tint[(0, 1)]);");
    assert!(matches!(
        errors(&source, "fs").as_slice(),
        [DiagnosticKind::NonMatrixIndex { .. }]
    ));
}

#[test]
fn every_bad_statement_is_reported() {
    let source = fragment("let a = vec![1.0]; let b; *color = self.tint.xyzq;");
    let kinds = errors(&source, "fs");
    assert_eq!(kinds.len(), 3, "{:?}", kinds);
    assert!(matches!(kinds[0], DiagnosticKind::UnsupportedSyntax { .. }));
    assert!(matches!(kinds[1], DiagnosticKind::CannotInferType { ref name } if name == "b"));
    assert!(matches!(kinds[2], DiagnosticKind::UnsupportedSyntax { .. }));
}

#[test]
fn intrinsic_arity_is_checked() {
    let source = fragment("*color = Vector4::splat(pow(uv.x));");
    let kinds = errors(&source, "fs");
    assert_eq!(
        kinds,
        vec![DiagnosticKind::ArgumentCount {
            name: "pow".to_owned(),
            expected: "2".to_owned(),
            found: 1,
        }]
    );
}

#[test]
fn unknown_functions_are_reported() {
    let source = fragment("*color = Vector4::splat(wobble(uv.x));");
    assert_eq!(
        errors(&source, "fs"),
        vec![DiagnosticKind::UnknownIntrinsic {
            name: "wobble".to_owned()
        }]
    );
}

#[test]
fn sampling_a_constant_is_rejected() {
    let source = fragment("*color = sample(self.tint, uv);");
    assert!(matches!(
        errors(&source, "fs").as_slice(),
        [DiagnosticKind::NotATexture { .. }]
    ));
}

#[test]
fn float_remainder_truncates() {
    let source = fragment(
        "let a = uv.x % 0.5; let mut b = uv.y; b %= a + 1.0; let i = 7 % 3; *color = Vector4::new(a, b, i as f32, 1.0);",
    );
    let glsl = generate(&source, "fs", &GlslBackend).unwrap();
    assert!(glsl.contains("    float fx_a = (fx_uv.x - 0.5 * trunc(fx_uv.x / 0.5));\n"), "{}", glsl);
    assert!(
        glsl.contains("    fx_b = (fx_b - (fx_a + 1.0) * trunc(fx_b / (fx_a + 1.0)));\n"),
        "{}",
        glsl
    );
    assert!(glsl.contains("    int fx_i = 7 % 3;\n"), "{}", glsl);

    let hlsl = generate(&source, "fs", &HlslBackend).unwrap();
    assert!(hlsl.contains("    float fx_a = fmod(fx_uv.x, 0.5);\n"), "{}", hlsl);
    assert!(hlsl.contains("    fx_b = fmod(fx_b, fx_a + 1.0);\n"), "{}", hlsl);
    assert!(hlsl.contains("    int fx_i = 7 % 3;\n"), "{}", hlsl);
}

const TERRAIN: &str = r#"
    #[effect]
    pub struct Terrain {
        pub height: Texture2D,
        #[technique(vertex = vs, fragment = fs)]
        pub standard: Technique,
    }
    impl Terrain {
        #[vertex]
        pub fn vs(
            &self,
            #[semantics(Position)] p: Vector4,
            #[semantics(TexCoord0)] uv: Vector2,
            #[semantics(Position)] clip: &mut Vector4,
        ) {
            let near = sample(self.height, uv);
            let far = sample_level(self.height, uv, 2.0);
            *clip = p + near + far;
        }
        #[fragment]
        pub fn fs(&self, #[semantics(Color0)] color: &mut Vector4) {
            *color = sample(self.height, Vector2::splat(0.5));
        }
    }
"#;

#[test]
fn vertex_sampling_uses_an_explicit_level() {
    let hlsl = generate(TERRAIN, "vs", &HlslBackend).unwrap();
    assert!(
        hlsl.contains("    float4 fx_near = fx_height.SampleLevel(fxsmp_height, fx_uv, 0);\n"),
        "{}",
        hlsl
    );
    assert!(
        hlsl.contains("    float4 fx_far = fx_height.SampleLevel(fxsmp_height, fx_uv, 2.0);\n"),
        "{}",
        hlsl
    );
    assert!(!hlsl.contains(".Sample("), "{}", hlsl);

    let fragment = generate(TERRAIN, "fs", &HlslBackend).unwrap();
    assert!(fragment.contains("fx_height.Sample(fxsmp_height, "), "{}", fragment);

    let glsl = generate(TERRAIN, "vs", &GlslBackend).unwrap();
    assert!(glsl.contains("    vec4 fx_near = texture(fx_height, fx_uv);\n"), "{}", glsl);
    assert!(glsl.contains("    vec4 fx_far = textureLod(fx_height, fx_uv, 2.0);\n"), "{}", glsl);
}
