// SPDX-License-Identifier: CEPL-1.0
mod error;
mod frame;
mod shader;

pub use error::ErrorKind;
pub use frame::{
    draw_frame, EventPump, FrameBackend, FrameLoop, FrameStage, LoopOptions, LoopSummary,
    WindowSignal,
};
pub use shader::{DirShaderSource, ShaderError, ShaderSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}
