#[effect]
pub struct Mismatch {
    #[technique(vertex = vs, fragment = fs)]
    pub standard: Technique,
}

impl Mismatch {
    #[vertex]
    pub fn vs(
        #[semantics(Position)] position: Vector4,
        #[semantics(Position)] clip: &mut Vector4,
        #[semantics(Color0)] shade: &mut Vector4,
    ) {
        *clip = position;
        *shade = position;
    }

    #[fragment]
    pub fn fs(
        #[semantics(TexCoord0)] uv: Vector2,
        #[semantics(Color0)] shade: Vector3,
        #[semantics(Color0)] color: &mut Vector4,
    ) {
        *color = Vector4::new(uv.x, uv.y, shade.z, 1.0);
    }
}
