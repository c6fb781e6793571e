/// Drawing-surface rectangle handed to the shader for coordinate normalisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin covering `width` x `height` pixels.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width.max(1) as f32, height.max(1) as f32)
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// The five inputs of the color effect, in invocation order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParameters {
    pub bounds: SurfaceRect,
    pub layers: f32,
    pub time: f32,
    pub amplitude: f32,
    /// 1.0 while a press is active, 0.0 otherwise.
    pub interaction: f32,
}
