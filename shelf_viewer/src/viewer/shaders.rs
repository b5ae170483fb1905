use bytemuck::{Pod, Zeroable};

pub(super) const MESH_SHADER_SOURCE: &str = r#"
struct MeshUniforms {
    view_projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: MeshUniforms;

@group(1) @binding(0)
var cover_texture: texture_2d<f32>;
@group(1) @binding(1)
var cover_sampler: sampler;

struct VertexIn {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
};

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn mesh_vs_main(input: VertexIn) -> VertexOut {
    let model = mat4x4<f32>(input.model_0, input.model_1, input.model_2, input.model_3);
    let world = model * vec4<f32>(input.position, 1.0);
    var out: VertexOut;
    out.position = uniforms.view_projection * world;
    out.normal = normalize((model * vec4<f32>(input.normal, 0.0)).xyz);
    out.uv = input.uv;
    out.color = input.color;
    return out;
}

@fragment
fn mesh_fs_main(input: VertexOut) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(-0.3, 0.5, 1.0));
    let diffuse = max(dot(normalize(input.normal), light_dir), 0.0);
    let shade = 0.45 + 0.55 * diffuse;
    let texel = textureSample(cover_texture, cover_sampler, input.uv);
    let base = texel * input.color;
    return vec4<f32>(base.rgb * shade, base.a);
}
"#;

pub(super) const BACKDROP_SHADER_SOURCE: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(input.position, 0.0, 1.0);
    out.uv = input.uv;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let top = vec3<f32>(0.16, 0.12, 0.09);
    let bottom = vec3<f32>(0.08, 0.06, 0.05);
    let edge = min(min(input.uv.x, 1.0 - input.uv.x), min(input.uv.y, 1.0 - input.uv.y));
    let rim = 1.0 - smoothstep(0.0, 0.02, edge);
    let color = mix(top, bottom, input.uv.y) + vec3<f32>(0.12, 0.1, 0.06) * rim;
    return vec4<f32>(color, 0.92);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Quad corners in clip space for a pixel rectangle (origin top-left).
pub(super) fn quad_for_rect(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    viewport: (f32, f32),
) -> [QuadVertex; 4] {
    let (view_w, view_h) = (viewport.0.max(1.0), viewport.1.max(1.0));
    let to_ndc = |px: f32, py: f32| [px / view_w * 2.0 - 1.0, 1.0 - py / view_h * 2.0];
    [
        QuadVertex {
            position: to_ndc(x, y),
            uv: [0.0, 0.0],
        },
        QuadVertex {
            position: to_ndc(x + width, y),
            uv: [1.0, 0.0],
        },
        QuadVertex {
            position: to_ndc(x, y + height),
            uv: [0.0, 1.0],
        },
        QuadVertex {
            position: to_ndc(x + width, y + height),
            uv: [1.0, 1.0],
        },
    ]
}
