use std::borrow::Cow;

use anyhow::{bail, Context, Result};
use wgpu::naga::ShaderStage;

use crate::types::EffectSource;

/// Name of the GLSL function every color effect must define.
pub const EFFECT_ENTRY: &str = "harmonicColorEffect";

/// GLSL source of the bundled harmonic wave effect.
pub const BUNDLED_EFFECT: &str = include_str!("../shaders/harmonic_effect.glsl");

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles an already wrapped color effect as a fragment shader.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device, wrapped: String) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("harmonic color effect"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Reads the effect source and wraps it into a complete fragment shader.
pub fn load_effect(source: &EffectSource) -> Result<String> {
    let code = match source {
        EffectSource::Bundled => Cow::Borrowed(BUNDLED_EFFECT),
        EffectSource::File(path) => Cow::Owned(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read color effect at {}", path.display()))?,
        ),
    };
    wrap_color_effect(&code)
}

/// Produces a self-contained GLSL fragment shader from a color effect.
///
/// Steps performed:
///
/// 1. Strip `#version` directives so the prelude controls the GLSL version.
/// 2. Check that the effect defines [`EFFECT_ENTRY`].
/// 3. Prepend [`HEADER`] which declares the uniform block.
/// 4. Append [`FOOTER`] which calls the effect with the five parameters.
pub fn wrap_color_effect(source: &str) -> Result<String> {
    let mut sanitized = String::new();
    for line in source.lines() {
        if line.trim_start().starts_with("#version") {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    if !declares_entry(&sanitized) {
        bail!("color effect does not define `vec4 {EFFECT_ENTRY}(...)`");
    }

    Ok(format!("{HEADER}\n#line 1\n{sanitized}{FOOTER}"))
}

fn declares_entry(source: &str) -> bool {
    source.match_indices(EFFECT_ENTRY).any(|(index, _)| {
        let before = source[..index].trim_end();
        let after = source[index + EFFECT_ENTRY.len()..].trim_start();
        before.ends_with("vec4") && after.starts_with('(')
    })
}

/// GLSL prologue injected ahead of every color effect.
///
/// The uniform block layout must match `EffectUniforms` in `gpu/uniforms.rs`.
const HEADER: &str = r"#version 450
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform HarmonicParams {
    vec4 bounds;
    vec4 baseColor;
    float layers;
    float time;
    float amplitude;
    float mixCoeff;
} harmonic_params;
";

/// GLSL epilogue that forwards the parameters in their fixed order.
const FOOTER: &str = r"
void main() {
    vec2 position = gl_FragCoord.xy;
    outColor = harmonicColorEffect(
        position,
        harmonic_params.baseColor,
        harmonic_params.bounds,
        harmonic_params.layers,
        harmonic_params.time,
        harmonic_params.amplitude,
        harmonic_params.mixCoeff
    );
}
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use wgpu::naga::front::glsl::{Frontend, Options};
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    use super::*;

    fn validate_glsl(source: &str, stage: ShaderStage) {
        let module = Frontend::default()
            .parse(&Options::from(stage), source)
            .unwrap_or_else(|err| panic!("GLSL failed to parse: {err:?}"));
        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .unwrap_or_else(|err| panic!("GLSL failed to validate: {err:?}"));
    }

    #[test]
    fn wrapped_bundled_effect_compiles() {
        let wrapped = wrap_color_effect(BUNDLED_EFFECT).unwrap();
        validate_glsl(&wrapped, ShaderStage::Fragment);
    }

    #[test]
    fn vertex_shader_compiles() {
        validate_glsl(VERTEX_SHADER_GLSL, ShaderStage::Vertex);
    }

    #[test]
    fn wrapped_passthrough_effect_compiles() {
        let source = "vec4 harmonicColorEffect(vec2 p, vec4 c, vec4 b, float l, float t, float a, float m) { return c * m; }";
        validate_glsl(&wrap_color_effect(source).unwrap(), ShaderStage::Fragment);
    }

    #[test]
    fn wraps_bundled_effect() {
        let wrapped = wrap_color_effect(BUNDLED_EFFECT).expect("bundled effect wraps");
        assert!(wrapped.starts_with("#version 450"));
        assert!(wrapped.contains("uniform HarmonicParams"));
        assert!(wrapped.contains("outColor = harmonicColorEffect("));
        assert_eq!(wrapped.matches("#version").count(), 1);
        assert!(!wrapped.contains("v_uv"));
        assert!(!VERTEX_SHADER_GLSL.contains("v_uv"));
    }

    #[test]
    fn strips_user_version_directive() {
        let source = r#"
            #version 300 es
            vec4 harmonicColorEffect(vec2 p, vec4 c, vec4 b, float l, float t, float a, float m) {
                return c;
            }
        "#;
        let wrapped = wrap_color_effect(source).unwrap();
        assert!(!wrapped.contains("#version 300 es"));
    }

    #[test]
    fn rejects_effect_without_entry_point() {
        let source = "vec4 somethingElse(vec2 p) { return vec4(p, 0.0, 1.0); }";
        assert!(wrap_color_effect(source).is_err());
    }

    #[test]
    fn entry_must_be_a_definition_not_a_mention() {
        let source = "// harmonicColorEffect is defined elsewhere\nvoid helper() {}";
        assert!(wrap_color_effect(source).is_err());
    }

    #[test]
    fn loads_effect_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("effect.glsl");
        std::fs::write(
            &path,
            "vec4 harmonicColorEffect (vec2 p, vec4 c, vec4 b, float l, float t, float a, float m) { return c; }",
        )
        .unwrap();
        let wrapped = load_effect(&EffectSource::File(path)).unwrap();
        assert!(wrapped.contains("return c;"));
    }

    #[test]
    fn missing_effect_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.glsl");
        assert!(load_effect(&EffectSource::File(path)).is_err());
    }
}
