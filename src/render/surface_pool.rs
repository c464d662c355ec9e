use std::collections::HashMap;

use crate::foundation::core::Canvas;
use crate::foundation::error::{VizError, VizResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8Premul,
}

/// Size and format of an off-screen target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl SurfaceDesc {
    pub fn for_canvas(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            format: PixelFormat::Rgba8Premul,
        }
    }

    fn byte_len(self) -> usize {
        let px = (self.width as usize).saturating_mul(self.height as usize);
        match self.format {
            PixelFormat::Rgba8Premul => px.saturating_mul(4),
        }
    }
}

/// Pool configuration for cached surfaces.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfacePoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained surfaces per (w,h,format) bucket.
    pub max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 64 * 1024 * 1024,
            max_surfaces_per_bucket: 4,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfacePoolStats {
    pub retained_surfaces: usize,
    pub retained_bytes: usize,
    pub alloc_surfaces: u64,
    pub alloc_bytes: u64,
    pub reused_surfaces: u64,
    pub dropped_on_release: u64,
}

struct Bucket {
    surfaces: Vec<vello_cpu::Pixmap>,
}

/// Bounded pool of CPU pixmaps for frame targets and off-screen accumulation.
///
/// Keyed by `(width, height, format)`. Borrowed surfaces are not cleared.
pub struct SurfacePool {
    opts: SurfacePoolOpts,
    stats: SurfacePoolStats,
    buckets: HashMap<SurfaceDesc, Bucket>,
}

impl SurfacePool {
    pub fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            stats: SurfacePoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    pub fn stats(&self) -> SurfacePoolStats {
        self.stats.clone()
    }

    pub fn borrow(&mut self, desc: SurfaceDesc) -> VizResult<vello_cpu::Pixmap> {
        if let Some(p) = self.buckets.get_mut(&desc).and_then(|b| b.surfaces.pop()) {
            self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(desc.byte_len());
            self.stats.reused_surfaces = self.stats.reused_surfaces.saturating_add(1);
            return Ok(p);
        }

        let w = u16::try_from(desc.width)
            .map_err(|_| VizError::resource(format!("surface width exceeds u16: {}", desc.width)))?;
        let h = u16::try_from(desc.height).map_err(|_| {
            VizError::resource(format!("surface height exceeds u16: {}", desc.height))
        })?;
        self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
        self.stats.alloc_bytes = self.stats.alloc_bytes.saturating_add(desc.byte_len() as u64);
        Ok(vello_cpu::Pixmap::new(w, h))
    }

    /// Borrow and clear to transparent.
    pub fn borrow_cleared(&mut self, desc: SurfaceDesc) -> VizResult<vello_cpu::Pixmap> {
        let mut p = self.borrow(desc)?;
        p.data_as_u8_slice_mut().fill(0);
        Ok(p)
    }

    pub fn release(&mut self, desc: SurfaceDesc, pixmap: vello_cpu::Pixmap) {
        if self.opts.max_pool_bytes == 0 || self.opts.max_surfaces_per_bucket == 0 {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bytes = desc.byte_len();
        if self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(desc).or_insert_with(|| Bucket {
            surfaces: Vec::new(),
        });
        if bucket.surfaces.len() >= self.opts.max_surfaces_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.surfaces.push(pixmap);
        self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }

    /// Drop every retained surface.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.stats.retained_surfaces = 0;
        self.stats.retained_bytes = 0;
    }
}

impl Default for SurfacePool {
    fn default() -> Self {
        Self::new(SurfacePoolOpts::default())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
