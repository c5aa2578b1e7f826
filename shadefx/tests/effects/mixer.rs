#[effect]
pub struct Mixer {
    pub amount: f32,
    pub transform: Matrix,
    #[technique(vertex = vs, fragment = fs)]
    pub standard: Technique,
}

impl Mixer {
    #[vertex]
    pub fn vs(
        &self,
        #[semantics(Position)] position: Vector4,
        #[semantics(Position)] clip: &mut Vector4,
        #[semantics(TexCoord0)] t: &mut f32,
    ) {
        let scale = self.transform[(0, 3)];
        let moved = self.transform * position;
        let mut m = self.transform;
        m *= self.transform;
        *clip = moved * scale;
        *t = position.x;
    }

    #[fragment]
    pub fn fs(&self, #[semantics(TexCoord0)] t: f32, #[semantics(Color0)] color: &mut Vector4) {
        let blend = lerp(0.25, 0.75, frac(t * self.amount));
        let mut total = 0.0;
        for i in 0..4 {
            total += Self::weight(i);
        }
        if total > 1.0 {
            discard();
        }
        *color = Vector4::splat(saturate(blend.inverse_sqrt()));
    }

    fn weight(i: i32) -> f32 {
        if i == 0 {
            0.5
        } else {
            0.25
        }
    }
}
