// SPDX-License-Identifier: CEPL-1.0
use rubik_render::{ShaderError, ShaderSource};

const TRIANGLE_VERT: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/triangle.vert.spv"));
const TRIANGLE_FRAG: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/triangle.frag.spv"));

/// SPIR-V compiled by `build.rs`, served under the same names as the on-disk files.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedShaders;

impl ShaderSource for EmbeddedShaders {
    fn load_bytes(&self, name: &str) -> Result<Vec<u8>, ShaderError> {
        match name {
            "triangle.vert.spv" => Ok(TRIANGLE_VERT.to_vec()),
            "triangle.frag.spv" => Ok(TRIANGLE_FRAG.to_vec()),
            _ => Err(ShaderError::FileNotFound {
                name: name.to_owned(),
            }),
        }
    }
}
