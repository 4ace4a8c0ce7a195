//! GLSL ES 3.00 sources for the scene and the post chain.

/// Unlit lines and size-attenuated points.
pub const SCENE_VERT: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_color;

uniform mat4 u_model;
uniform mat4 u_view;
uniform mat4 u_projection;
uniform float u_point_size;
uniform float u_point_scale;

out vec3 v_color;

void main() {
    vec4 view_pos = u_view * u_model * vec4(a_position, 1.0);
    gl_Position = u_projection * view_pos;
    gl_PointSize = max(1.0, u_point_size * u_point_scale / max(-view_pos.z, 0.001));
    v_color = a_color;
}
"#;

pub const SCENE_FRAG: &str = r#"#version 300 es
precision highp float;

uniform vec3 u_tint;
uniform float u_opacity;

in vec3 v_color;
out vec4 o_color;

void main() {
    o_color = vec4(v_color * u_tint, u_opacity);
}
"#;

/// Single oversized triangle covering the viewport; no vertex buffers.
pub const FULLSCREEN_VERT: &str = r#"#version 300 es
out vec2 v_uv;

void main() {
    vec2 p = vec2(float((gl_VertexID << 1) & 2), float(gl_VertexID & 2));
    v_uv = p;
    gl_Position = vec4(p * 2.0 - 1.0, 0.0, 1.0);
}
"#;

pub const HIGHPASS_FRAG: &str = r#"#version 300 es
precision highp float;

uniform sampler2D u_input;
uniform float u_threshold;
uniform float u_smooth_width;

in vec2 v_uv;
out vec4 o_color;

void main() {
    vec4 texel = texture(u_input, v_uv);
    float luma = dot(texel.rgb, vec3(0.299, 0.587, 0.114));
    float alpha = smoothstep(u_threshold, u_threshold + u_smooth_width, luma);
    o_color = texel * alpha;
}
"#;

/// Upper bound on the blur half-width; level 4 uses 11.
pub const MAX_BLUR_RADIUS: usize = 11;

pub const BLUR_FRAG: &str = r#"#version 300 es
precision highp float;

uniform sampler2D u_input;
uniform vec2 u_texel;
uniform int u_radius;
uniform float u_weights[12];

in vec2 v_uv;
out vec4 o_color;

void main() {
    vec3 sum = texture(u_input, v_uv).rgb * u_weights[0];
    for (int i = 1; i < 12; i++) {
        if (i > u_radius) {
            break;
        }
        vec2 offset = u_texel * float(i);
        sum += (texture(u_input, v_uv + offset).rgb + texture(u_input, v_uv - offset).rgb) * u_weights[i];
    }
    o_color = vec4(sum, 1.0);
}
"#;

pub const COMPOSITE_FRAG: &str = r#"#version 300 es
precision highp float;

uniform sampler2D u_scene;
uniform sampler2D u_mip0;
uniform sampler2D u_mip1;
uniform sampler2D u_mip2;
uniform sampler2D u_mip3;
uniform sampler2D u_mip4;
uniform float u_weights[5];
uniform float u_strength;

in vec2 v_uv;
out vec4 o_color;

void main() {
    vec4 base = texture(u_scene, v_uv);
    vec3 glow = texture(u_mip0, v_uv).rgb * u_weights[0]
        + texture(u_mip1, v_uv).rgb * u_weights[1]
        + texture(u_mip2, v_uv).rgb * u_weights[2]
        + texture(u_mip3, v_uv).rgb * u_weights[3]
        + texture(u_mip4, v_uv).rgb * u_weights[4];
    o_color = vec4(base.rgb + glow * u_strength, base.a);
}
"#;

pub const STREAK_FRAG: &str = r#"#version 300 es
precision highp float;

uniform sampler2D u_input;
uniform float u_intensity;
uniform vec2 u_direction;
uniform float u_spacing;
uniform int u_taps;

in vec2 v_uv;
out vec4 o_color;

void main() {
    vec4 base = texture(u_input, v_uv);
    vec3 col = base.rgb;
    float taps = float(u_taps);
    for (int i = -16; i <= 16; i++) {
        if (i < -u_taps || i > u_taps) {
            continue;
        }
        float f = float(i);
        col += texture(u_input, v_uv + u_direction * f * u_spacing).rgb * (0.06 * (1.0 - abs(f) / taps));
    }
    o_color = vec4(mix(base.rgb, col, u_intensity), base.a);
}
"#;

pub const BARREL_FRAG: &str = r#"#version 300 es
precision highp float;

uniform sampler2D u_input;
uniform float u_amount;

in vec2 v_uv;
out vec4 o_color;

void main() {
    vec2 uv = v_uv * 2.0 - 1.0;
    float r2 = dot(uv, uv);
    vec2 distorted = uv * (1.0 + u_amount * r2);
    o_color = texture(u_input, clamp((distorted + 1.0) * 0.5, 0.0, 1.0));
}
"#;
