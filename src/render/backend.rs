use crate::foundation::error::{VizError, VizResult};
use crate::render::composite::unpremul_rgba8;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha** by default; the `premultiplied` flag makes this explicit at
/// API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Straight-alpha copy, as image encoders expect.
    pub fn to_straight(&self) -> Self {
        if !self.premultiplied {
            return self.clone();
        }
        let data = self
            .data
            .chunks_exact(4)
            .flat_map(|p| unpremul_rgba8([p[0], p[1], p[2], p[3]]))
            .collect();
        Self {
            width: self.width,
            height: self.height,
            data,
            premultiplied: false,
        }
    }

    pub fn to_rgba_image(&self) -> VizResult<image::RgbaImage> {
        let straight = self.to_straight();
        image::RgbaImage::from_raw(straight.width, straight.height, straight.data)
            .ok_or_else(|| VizError::resource("frame buffer does not match its dimensions"))
    }
}

/// Available backends.
///
/// - `Cpu` rasterizes with `vello_cpu`.
/// - `Recording` draws nothing and logs every view-node visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Cpu,
    Recording,
    /// A backend registered by the application under this name.
    Custom(&'static str),
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cpu => crate::render::cpu::BACKEND,
            Self::Recording => crate::render::recording::BACKEND,
            Self::Custom(name) => name,
        }
    }

    /// Whether frames from this backend carry pixels.
    pub fn rasterizes(self) -> bool {
        !matches!(self, Self::Recording)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
