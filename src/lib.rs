//! Convert ShaderToy-style fragment shaders into ZGameEditor Visualizer
//! projects (`.zgeproj`).
//!
//! The conversion runs one way: the shader source is scanned for custom
//! parameters, metadata comments and `iChannelN` references, the parameter
//! values are normalized and packed into the persisted blob, and everything
//! is spliced into a project template at fixed anchors.

pub mod channels;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod encoder;
pub mod extract;
pub mod pipeline;
pub mod source;
pub mod template;
