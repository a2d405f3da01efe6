//! Shader modules and program linking.
//!
//! Modules are opaque blobs handed over by the shader-compilation
//! collaborator: either SPIR-V words (consumed through `GL_ARB_gl_spirv`
//! when the driver has it) or GLSL source that was cross-compiled elsewhere.
//! Compilation and linking happen at pipeline-creation time; a module by
//! itself owns no GL object.

use crate::api as gl;
use crate::api::types::*;
use crate::context::ContextGuard;
use prism::pipeline::ShaderStageFlags;
use prism::{Error, Result};
use std::ffi::CString;
use std::mem;
use std::os::raw::c_void;
use std::ptr;

const SPIRV_MAGIC: u32 = 0x0723_0203;

#[derive(Clone, Debug)]
pub(crate) enum ShaderSource {
    SpirV(Vec<u32>),
    Glsl(Vec<u8>),
}

#[derive(Debug)]
pub struct GlShaderModule {
    pub(crate) source: ShaderSource,
    pub(crate) stage: ShaderStageFlags,
}

impl GlShaderModule {
    /// Accepts the collaborator's blob: SPIR-V is detected by its magic
    /// number, anything else is assumed to be GLSL source.
    pub(crate) fn new(data: &[u8], stage: ShaderStageFlags) -> GlShaderModule {
        let is_spirv = data.len() >= 4
            && u32::from_le_bytes([data[0], data[1], data[2], data[3]]) == SPIRV_MAGIC;
        let source = if is_spirv {
            assert!(data.len() % 4 == 0, "SPIR-V blob length must be word-aligned");
            let words = data
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            ShaderSource::SpirV(words)
        } else {
            ShaderSource::Glsl(data.to_vec())
        };
        GlShaderModule { source, stage }
    }

    pub fn stage(&self) -> ShaderStageFlags {
        self.stage
    }
}

//--------------------------------------------------------------------------------------------------

pub(crate) fn shader_stage_flags_to_glenum(stage: ShaderStageFlags) -> GLenum {
    match stage {
        ShaderStageFlags::VERTEX => gl::VERTEX_SHADER,
        ShaderStageFlags::FRAGMENT => gl::FRAGMENT_SHADER,
        ShaderStageFlags::GEOMETRY => gl::GEOMETRY_SHADER,
        ShaderStageFlags::TESS_CONTROL => gl::TESS_CONTROL_SHADER,
        ShaderStageFlags::TESS_EVAL => gl::TESS_EVALUATION_SHADER,
        ShaderStageFlags::COMPUTE => gl::COMPUTE_SHADER,
        _ => panic!("invalid shader stage"),
    }
}

fn get_shader_info_log(gl: &gl::Gl, obj: GLuint) -> String {
    unsafe {
        let mut log_size = 0;
        gl.GetShaderiv(obj, gl::INFO_LOG_LENGTH, &mut log_size);
        let mut log_buf = vec![0u8; log_size as usize];
        gl.GetShaderInfoLog(
            obj,
            log_size,
            &mut log_size,
            log_buf.as_mut_ptr() as *mut i8,
        );
        log_buf.truncate(log_size as usize);
        String::from_utf8_lossy(&log_buf).into_owned()
    }
}

fn get_program_info_log(gl: &gl::Gl, obj: GLuint) -> String {
    unsafe {
        let mut log_size = 0;
        gl.GetProgramiv(obj, gl::INFO_LOG_LENGTH, &mut log_size);
        let mut log_buf = vec![0u8; log_size as usize];
        gl.GetProgramInfoLog(
            obj,
            log_size,
            &mut log_size,
            log_buf.as_mut_ptr() as *mut i8,
        );
        log_buf.truncate(log_size as usize);
        String::from_utf8_lossy(&log_buf).into_owned()
    }
}

fn create_shader_from_glsl(gl: &gl::Gl, stage: ShaderStageFlags, source: &[u8]) -> Result<GLuint> {
    let stage = shader_stage_flags_to_glenum(stage);
    unsafe {
        let obj = gl.CreateShader(stage);
        let sources = [source.as_ptr() as *const i8];
        let lengths = [source.len() as GLint];
        gl.ShaderSource(obj, 1, sources.as_ptr(), lengths.as_ptr());
        gl.CompileShader(obj);
        let mut status = 0;
        gl.GetShaderiv(obj, gl::COMPILE_STATUS, &mut status);
        if status != GLint::from(gl::TRUE) {
            let log = get_shader_info_log(gl, obj);
            gl.DeleteShader(obj);
            error!("shader compilation failed:\n{}", log);
            Err(Error::ShaderCompilation(log))
        } else {
            Ok(obj)
        }
    }
}

fn create_specialized_spirv_shader(
    gl: &gl::Gl,
    stage: ShaderStageFlags,
    entry_point: &str,
    bytecode: &[u32],
) -> Result<GLuint> {
    let stage = shader_stage_flags_to_glenum(stage);
    let entry_point = CString::new(entry_point).unwrap();
    unsafe {
        let shader = gl.CreateShader(stage);
        gl.ShaderBinary(
            1,
            &shader,
            gl::SHADER_BINARY_FORMAT_SPIR_V,
            bytecode.as_ptr() as *const c_void,
            mem::size_of_val(bytecode) as i32,
        );
        gl.SpecializeShader(shader, entry_point.as_ptr(), 0, ptr::null(), ptr::null());
        let mut status = 0;
        gl.GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
        if status != GLint::from(gl::TRUE) {
            let log = get_shader_info_log(gl, shader);
            gl.DeleteShader(shader);
            error!("SPIR-V specialization failed:\n{}", log);
            Err(Error::ShaderCompilation(log))
        } else {
            Ok(shader)
        }
    }
}

fn create_stage(guard: &ContextGuard, module: &GlShaderModule, spirv_ok: bool) -> Result<GLuint> {
    let gl = guard.gl();
    match module.source {
        ShaderSource::SpirV(ref words) => {
            if !spirv_ok {
                return Err(Error::Unsupported(
                    "driver does not accept SPIR-V shader binaries (GL_ARB_gl_spirv)",
                ));
            }
            create_specialized_spirv_shader(gl, module.stage, "main", words)
        }
        ShaderSource::Glsl(ref src) => create_shader_from_glsl(gl, module.stage, src),
    }
}

/// Compiles all the given stages and links them into one program.
///
/// On link failure the program object is deleted, the linker log is both
/// logged and returned, and the caller surfaces a zeroed program name.
pub(crate) fn create_program(
    guard: &ContextGuard,
    modules: &[&GlShaderModule],
    spirv_ok: bool,
) -> Result<GLuint> {
    let gl = guard.gl();
    let mut shaders = Vec::with_capacity(modules.len());
    for m in modules {
        match create_stage(guard, m, spirv_ok) {
            Ok(s) => shaders.push(s),
            Err(e) => {
                for &s in &shaders {
                    unsafe { gl.DeleteShader(s) };
                }
                return Err(e);
            }
        }
    }

    unsafe {
        let program = gl.CreateProgram();
        for &s in &shaders {
            gl.AttachShader(program, s);
        }
        gl.LinkProgram(program);
        let mut status = 0;
        gl.GetProgramiv(program, gl::LINK_STATUS, &mut status);
        for &s in &shaders {
            gl.DetachShader(program, s);
            gl.DeleteShader(s);
        }
        if status != GLint::from(gl::TRUE) {
            let log = get_program_info_log(gl, program);
            gl.DeleteProgram(program);
            error!("program link failed:\n{}", log);
            Err(Error::ProgramLink(log))
        } else {
            Ok(program)
        }
    }
}
