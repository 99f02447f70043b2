use std::fs;
use std::path::Path;
use std::rc::Rc;

use log::*;
use vulkanalia::bytecode::Bytecode;
use vulkanalia::vk::{self, HasBuilder};

use super::constants;
use super::driver::Driver;
use super::error::RenderError;
use super::handle::Owned;

/// A SPIR-V blob that passed the header checks the driver would otherwise
/// reject it for.
pub struct ShaderBinary {
    bytecode: Bytecode,
}

impl ShaderBinary {
    pub fn new(bytes: &[u8]) -> Result<Self, RenderError> {
        if bytes.is_empty() {
            return Err(RenderError::ShaderModule("empty shader binary".into()));
        }
        if bytes.len() % 4 != 0 {
            return Err(RenderError::ShaderModule(format!(
                "shader binary length {} is not a multiple of 4",
                bytes.len()
            )));
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != constants::SPIRV_MAGIC {
            return Err(RenderError::ShaderModule(format!(
                "bad SPIR-V magic number {:#010x}",
                magic
            )));
        }

        let bytecode =
            Bytecode::new(bytes).map_err(|e| RenderError::ShaderModule(format!("{:?}", e)))?;
        Ok(Self { bytecode })
    }

    pub fn code_size(&self) -> usize {
        self.bytecode.code_size()
    }

    pub fn code(&self) -> &[u32] {
        self.bytecode.code()
    }
}

/// The vertex and fragment stages of the triangle pipeline.
pub struct ShaderBinaries {
    pub vertex: ShaderBinary,
    pub fragment: ShaderBinary,
}

impl ShaderBinaries {
    pub const VERTEX_FILE: &'static str = "vert.spv";
    pub const FRAGMENT_FILE: &'static str = "frag.spv";

    /// Reads both stages from `dir`.
    pub fn load(dir: &Path) -> Result<Self, RenderError> {
        Ok(Self {
            vertex: read(&dir.join(Self::VERTEX_FILE))?,
            fragment: read(&dir.join(Self::FRAGMENT_FILE))?,
        })
    }
}

fn read(path: &Path) -> Result<ShaderBinary, RenderError> {
    let bytes = fs::read(path).map_err(|source| RenderError::ShaderRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded shader `{}` ({} bytes).", path.display(), bytes.len());
    ShaderBinary::new(&bytes)
}

/// Wraps `binary` in a module that is destroyed when the guard drops.
pub unsafe fn create_shader_module<D: Driver>(
    driver: &Rc<D>,
    binary: &ShaderBinary,
) -> Result<Owned<D, vk::ShaderModule>, RenderError> {
    let info = vk::ShaderModuleCreateInfo::builder()
        .code_size(binary.code_size())
        .code(binary.code());

    let module = driver
        .create_shader_module(&info)
        .map_err(RenderError::ShaderModuleCreation)?;
    Ok(Owned::new(driver, module))
}
