use crate::{
    capture::format::{PixelFormat, convert_into},
    foundation::{core::OutputKind, error::OrrbResult},
    scene::{model::Camera, state::SceneState},
};

/// Size and format of one render surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout of the surface memory.
    pub format: PixelFormat,
}

impl SurfaceDesc {
    /// Bytes backing one surface.
    pub fn byte_len(self) -> usize {
        self.format.byte_len(self.width, self.height)
    }
}

/// A render target owned by a pool. Renderers draw into it; readback copies out of it.
#[derive(Clone, Debug)]
pub struct Surface {
    desc: SurfaceDesc,
    data: Vec<u8>,
}

impl Surface {
    /// Allocate a zeroed surface.
    pub fn new(desc: SurfaceDesc) -> Self {
        Self {
            desc,
            data: vec![0; desc.byte_len()],
        }
    }

    /// Surface description.
    pub fn desc(&self) -> SurfaceDesc {
        self.desc
    }

    /// Raw surface memory, tightly packed, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable surface memory for renderers.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Renderer collaborator driven by the capture pipeline.
///
/// Implementations are owned by the simulation thread. `render` issues one pass of `kind` for one
/// camera into a pooled surface; `readback` copies a previously rendered surface into a CPU
/// buffer in wire format. The capture pipeline decides *when* readbacks happen so a surface is
/// never read while it is being rendered into.
pub trait FrameRenderer: Send {
    /// One-time device initialization. Failure here is fatal for server startup.
    fn init(&mut self) -> OrrbResult<()> {
        Ok(())
    }

    /// Render `kind` for `camera` into `surface`.
    fn render(
        &mut self,
        scene: &SceneState,
        camera: &Camera,
        kind: OutputKind,
        surface: &mut Surface,
    ) -> OrrbResult<()>;

    /// Copy `surface` into `dest`, converting to `format`.
    fn readback(
        &mut self,
        surface: &Surface,
        format: PixelFormat,
        dest: &mut Vec<u8>,
    ) -> OrrbResult<()> {
        convert_into(surface.data(), surface.desc().format, format, dest);
        Ok(())
    }
}
