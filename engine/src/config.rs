use std::path::PathBuf;

/// Settings threaded into instance and device creation.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    pub application_name: String,
    /// Enables the Khronos validation layer and the debug messenger.
    pub validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            application_name: "Volcano".into(),
            validation: cfg!(debug_assertions),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Directory holding `vert.spv` and `frag.spv`.
    pub shader_dir: PathBuf,
    pub renderer: RendererConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Volcano".into(),
            width: 900,
            height: 600,
            shader_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../shaders"),
            renderer: RendererConfig::default(),
        }
    }
}
