use bytemuck::{Pod, Zeroable};
use driver::ShaderParameters;

/// std140 mirror of the `HarmonicParams` block declared in `compile.rs`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct EffectUniforms {
    pub bounds: [f32; 4],
    pub base_color: [f32; 4],
    pub layers: f32,
    pub time: f32,
    pub amplitude: f32,
    pub mix_coeff: f32,
}

impl EffectUniforms {
    pub fn new(base_color: [f32; 4]) -> Self {
        Self {
            bounds: [0.0; 4],
            base_color,
            layers: 0.0,
            time: 0.0,
            amplitude: 0.0,
            mix_coeff: 0.0,
        }
    }

    pub fn apply(&mut self, params: &ShaderParameters) {
        self.bounds = params.bounds.as_array();
        self.layers = params.layers;
        self.time = params.time;
        self.amplitude = params.amplitude;
        self.mix_coeff = params.interaction;
    }
}

#[cfg(test)]
mod tests {
    use driver::SurfaceRect;

    use super::*;

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(std::mem::size_of::<EffectUniforms>(), 48);
        let uniforms = EffectUniforms::new([0.1, 0.2, 0.3, 1.0]);
        let bytes = bytemuck::bytes_of(&uniforms);
        assert_eq!(bytes.len() % 16, 0);
    }

    #[test]
    fn apply_copies_parameters_in_block_order() {
        let mut uniforms = EffectUniforms::new([0.0, 0.0, 0.0, 1.0]);
        uniforms.apply(&ShaderParameters {
            bounds: SurfaceRect::from_size(640, 480),
            layers: 6.0,
            time: 1.25,
            amplitude: 2.0,
            interaction: 1.0,
        });
        let floats: [f32; 12] = bytemuck::cast(uniforms);
        assert_eq!(
            floats,
            [0.0, 0.0, 640.0, 480.0, 0.0, 0.0, 0.0, 1.0, 6.0, 1.25, 2.0, 1.0]
        );
    }
}
