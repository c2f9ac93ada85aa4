// mask.rs — decoded hotspot mask and UV sampling

use crate::hotspot::Rgb;
use image::RgbaImage;

/// Decoded mask pixels, immutable once loaded.
#[derive(Debug, Clone)]
pub struct MaskBuffer {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl MaskBuffer {
    pub fn from_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            rgba: img.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texture space v grows upward, image rows grow downward, hence `1 - v`.
    /// `u = 1` and `v = 0` land on the last column/row instead of one past it.
    pub fn pixel_at_uv(&self, u: f32, v: f32) -> Option<(u32, u32)> {
        if self.width == 0 || self.height == 0 || !u.is_finite() || !v.is_finite() {
            return None;
        }
        let col = (u.clamp(0.0, 1.0) * self.width as f32).floor() as u32;
        let row = ((1.0 - v.clamp(0.0, 1.0)) * self.height as f32).floor() as u32;
        Some((col.min(self.width - 1), row.min(self.height - 1)))
    }

    pub fn rgb_at(&self, col: u32, row: u32) -> Option<Rgb> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let off = (row as usize * self.width as usize + col as usize) * 4;
        let px = self.rgba.get(off..off + 3)?;
        Some(Rgb::new(px[0], px[1], px[2]))
    }

    pub fn sample_at(&self, u: f32, v: f32) -> Option<Rgb> {
        let (col, row) = self.pixel_at_uv(u, v)?;
        self.rgb_at(col, row)
    }
}

/// Holds the mask once its background decode finishes. Until then every
/// sample answers `None`, which callers read as "no hotspot data yet".
#[derive(Debug, Default)]
pub struct MaskSampler {
    buffer: Option<MaskBuffer>,
}

impl MaskSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, buffer: MaskBuffer) {
        log::info!("mask ready: {}x{}", buffer.width(), buffer.height());
        self.buffer = Some(buffer);
    }

    pub fn is_loaded(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn sample_at(&self, u: f32, v: f32) -> Option<Rgb> {
        self.buffer.as_ref()?.sample_at(u, v)
    }
}
