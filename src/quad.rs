//! OpenGL quad renderer: draws the current texture fitted to the viewport
//! with the aspect ratio preserved.

use std::ffi::CString;
use std::ptr;

const VERT_SRC: &str = r#"
#version 330 core
layout(location = 0) in vec2 aPos;
layout(location = 1) in vec2 aUV;
out vec2 vUV;
uniform vec4 uRect; // x, y, w, h in NDC
void main() {
    vec2 pos = uRect.xy + aPos * uRect.zw;
    gl_Position = vec4(pos, 0.0, 1.0);
    vUV = aUV;
}
"#;

const FRAG_SRC: &str = r#"
#version 330 core
in vec2 vUV;
out vec4 fragColor;
uniform sampler2D uTex;
void main() {
    fragColor = texture(uTex, vUV);
}
"#;

pub struct QuadRenderer {
    program: u32,
    vao: u32,
    vbo: u32,
    rect_loc: i32,
    tex_loc: i32,
}

impl QuadRenderer {
    pub fn new() -> Self {
        unsafe {
            let program = create_program(VERT_SRC, FRAG_SRC);

            // Unit quad: position (0..1, 0..1) + UV
            #[rustfmt::skip]
            let vertices: [f32; 24] = [
                // pos      uv
                0.0, 0.0,   0.0, 1.0,
                1.0, 0.0,   1.0, 1.0,
                0.0, 1.0,   0.0, 0.0,
                1.0, 0.0,   1.0, 1.0,
                1.0, 1.0,   1.0, 0.0,
                0.0, 1.0,   0.0, 0.0,
            ];

            let mut vao = 0u32;
            let mut vbo = 0u32;
            gl::GenVertexArrays(1, &mut vao);
            gl::GenBuffers(1, &mut vbo);

            gl::BindVertexArray(vao);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                (vertices.len() * 4) as isize,
                vertices.as_ptr() as *const _,
                gl::STATIC_DRAW,
            );

            // aPos
            gl::EnableVertexAttribArray(0);
            gl::VertexAttribPointer(0, 2, gl::FLOAT, gl::FALSE, 16, ptr::null());
            // aUV
            gl::EnableVertexAttribArray(1);
            gl::VertexAttribPointer(1, 2, gl::FLOAT, gl::FALSE, 16, 8 as *const _);

            gl::BindVertexArray(0);

            let rect_loc =
                gl::GetUniformLocation(program, CString::new("uRect").unwrap().as_ptr());
            let tex_loc = gl::GetUniformLocation(program, CString::new("uTex").unwrap().as_ptr());

            QuadRenderer {
                program,
                vao,
                vbo,
                rect_loc,
                tex_loc,
            }
        }
    }

    /// Draw a texture fitted within the viewport, preserving aspect ratio.
    pub fn draw(&self, texture: u32, img_w: u32, img_h: u32, viewport_w: u32, viewport_h: u32) {
        let (x, y, quad_w, quad_h) = fit_rect(img_w, img_h, viewport_w, viewport_h);

        unsafe {
            gl::UseProgram(self.program);
            gl::Uniform4f(self.rect_loc, x, y, quad_w, quad_h);

            gl::ActiveTexture(gl::TEXTURE0);
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::Uniform1i(self.tex_loc, 0);

            gl::BindVertexArray(self.vao);
            gl::DrawArrays(gl::TRIANGLES, 0, 6);
            gl::BindVertexArray(0);
            gl::UseProgram(0);
        }
    }
}

/// Centered NDC rectangle (x, y, w, h) fitting `img` into `viewport`.
fn fit_rect(img_w: u32, img_h: u32, viewport_w: u32, viewport_h: u32) -> (f32, f32, f32, f32) {
    let img_aspect = img_w as f32 / img_h.max(1) as f32;
    let vp_aspect = viewport_w as f32 / viewport_h.max(1) as f32;

    let (quad_w, quad_h) = if img_aspect > vp_aspect {
        // Image is wider — fit width
        (2.0f32, 2.0 / img_aspect * vp_aspect)
    } else {
        // Image is taller — fit height
        (2.0 * img_aspect / vp_aspect, 2.0f32)
    };

    (-quad_w / 2.0, -quad_h / 2.0, quad_w, quad_h)
}

impl Drop for QuadRenderer {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteProgram(self.program);
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteVertexArrays(1, &self.vao);
        }
    }
}

unsafe fn create_program(vert_src: &str, frag_src: &str) -> u32 {
    let vs = compile_shader(gl::VERTEX_SHADER, vert_src);
    let fs = compile_shader(gl::FRAGMENT_SHADER, frag_src);

    let program = gl::CreateProgram();
    gl::AttachShader(program, vs);
    gl::AttachShader(program, fs);
    gl::LinkProgram(program);

    let mut success = 0i32;
    gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
    if success == 0 {
        let mut len = 0i32;
        gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
        let mut buf = vec![0u8; len as usize];
        gl::GetProgramInfoLog(program, len, ptr::null_mut(), buf.as_mut_ptr() as *mut _);
        panic!("Shader link error: {}", String::from_utf8_lossy(&buf));
    }

    gl::DeleteShader(vs);
    gl::DeleteShader(fs);
    program
}

unsafe fn compile_shader(kind: u32, src: &str) -> u32 {
    let shader = gl::CreateShader(kind);
    let c_src = CString::new(src).unwrap();
    gl::ShaderSource(shader, 1, &c_src.as_ptr(), ptr::null());
    gl::CompileShader(shader);

    let mut success = 0i32;
    gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
    if success == 0 {
        let mut len = 0i32;
        gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        let mut buf = vec![0u8; len as usize];
        gl::GetShaderInfoLog(shader, len, ptr::null_mut(), buf.as_mut_ptr() as *mut _);
        let kind_str = if kind == gl::VERTEX_SHADER {
            "vertex"
        } else {
            "fragment"
        };
        panic!(
            "{} shader compile error: {}",
            kind_str,
            String::from_utf8_lossy(&buf)
        );
    }
    shader
}
