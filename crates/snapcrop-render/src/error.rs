use thiserror::Error;

/// Errors raised by the preview renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Neither a hardware nor a software adapter is available.
    #[error("No GPU adapter available")]
    NoAdapter,

    #[error("Failed to create GPU device: {0}")]
    DeviceRequest(String),

    /// A built-in shader failed validation. This is a build defect, not a
    /// runtime condition; callers should treat it as fatal.
    #[error("Shader compilation failed: {0}")]
    ShaderCompile(String),

    /// `render_frame` was called before `on_surface_created`.
    #[error("Render surface not created")]
    SurfaceNotReady,

    #[error("Frame readback failed: {0}")]
    Readback(String),

    /// The render thread has exited.
    #[error("Render thread stopped")]
    ThreadStopped,
}
