/// Textured, tinted quad.
#[effect(namespace = "game::fx")]
pub struct Sprite {
    #[buffer(name = "Camera", slot = 1, shared)]
    pub view_projection: Matrix,
    pub tint: Vector4,
    pub diffuse: Texture2D,
    #[technique(vertex = vs, fragment = fs)]
    pub standard: Technique,
}

impl Sprite {
    const GAMMA: f32 = 2.2;

    #[vertex]
    pub fn vs(
        &self,
        #[semantics(Position)] position: Vector4,
        #[semantics(TexCoord0)] uv: Vector2,
        #[semantics(Position)] clip: &mut Vector4,
        #[semantics(TexCoord0)] uv_out: &mut Vector2,
    ) {
        *clip = self.view_projection * position;
        *uv_out = uv;
    }

    #[fragment]
    pub fn fs(&self, #[semantics(TexCoord0)] uv: Vector2, #[semantics(Color0)] color: &mut Vector4) {
        *color = Self::correct(sample(self.diffuse, uv) * self.tint);
    }

    fn correct(color: Vector4) -> Vector4 {
        pow(color, Vector4::splat(1.0 / Self::GAMMA))
    }
}
