use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;
use parking_lot::Mutex;

use crate::look::types::FilterType;
use crate::render::approximation::ApproximationChain;
use crate::render::context::{FaceSurface, FrameBuffer};

/// Face surface backed by a still photo. Approximations are kept per filter type and
/// rendered over the untouched original, in application order.
pub struct ImageSurface {
    base: RgbaImage,
    approximations: Mutex<BTreeMap<FilterType, ApproximationChain>>,
}

impl ImageSurface {
    pub fn new(base: RgbaImage) -> Self {
        ImageSurface {
            base,
            approximations: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).context("failed to decode face image")?;
        Ok(ImageSurface::new(image.to_rgba8()))
    }

    pub fn active_approximations(&self) -> Vec<(FilterType, ApproximationChain)> {
        self.approximations
            .lock()
            .iter()
            .map(|(filter_type, chain)| (*filter_type, *chain))
            .collect()
    }

    pub fn render(&self) -> RgbaImage {
        let chains: Vec<ApproximationChain> =
            self.approximations.lock().values().copied().collect();
        let mut rendered = self.base.clone();
        if chains.is_empty() {
            return rendered;
        }
        for pixel in rendered.pixels_mut() {
            let mut value = pixel.0;
            for chain in &chains {
                value = chain.apply_to_pixel(value);
            }
            pixel.0 = value;
        }
        rendered
    }

    pub fn save_render(&self, path: &Path) -> Result<()> {
        self.render()
            .save(path)
            .with_context(|| format!("failed to write rendered look to {}", path.display()))
    }
}

impl FaceSurface for ImageSurface {
    fn frame(&self) -> Option<FrameBuffer> {
        if !self.has_frame() {
            return None;
        }
        Some(FrameBuffer {
            width: self.base.width(),
            height: self.base.height(),
            pixels: self.base.as_raw().clone(),
        })
    }

    fn has_frame(&self) -> bool {
        self.base.width() > 0 && self.base.height() > 0
    }

    fn apply_approximation(&self, filter_type: FilterType, chain: &ApproximationChain) -> bool {
        if !self.has_frame() {
            return false;
        }
        self.approximations.lock().insert(filter_type, *chain);
        true
    }

    fn clear_approximation(&self, filter_type: FilterType) {
        self.approximations.lock().remove(&filter_type);
    }

    fn clear_approximations(&self) {
        self.approximations.lock().clear();
    }
}
