use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::look::types::{Filter, FilterType};
use crate::render::approximation::ApproximationChain;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectParams {
    pub color_hex: String,
    pub intensity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl From<&Filter> for EffectParams {
    fn from(filter: &Filter) -> Self {
        EffectParams {
            color_hex: filter.color_hex.clone(),
            intensity: filter.intensity,
            style: filter.style.clone(),
        }
    }
}

/// RGBA8 snapshot of the currently displayed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn is_renderable(&self) -> bool {
        let expected = self.width as usize * self.height as usize * 4;
        self.width > 0 && self.height > 0 && self.pixels.len() >= expected
    }
}

/// Rendering engine handle with a per-type apply method.
pub trait FilterEngine: Send + Sync {
    fn supports(&self, _filter_type: FilterType) -> bool {
        true
    }

    fn apply_filter(&self, filter_type: FilterType, params: &EffectParams) -> bool;
}

/// Drives the engine's own UI. `activate` returns true when an element matching the
/// selector existed and was activated.
pub trait UiDriver: Send + Sync {
    fn activate(&self, selector: &str) -> bool;
}

/// The visible face surface: photo, video or canvas.
pub trait FaceSurface: Send + Sync {
    fn frame(&self) -> Option<FrameBuffer>;

    fn has_frame(&self) -> bool {
        self.frame().is_some_and(|frame| frame.is_renderable())
    }

    fn apply_approximation(&self, filter_type: FilterType, chain: &ApproximationChain) -> bool;

    /// Drops the approximation for one filter, e.g. once the engine renders it for real.
    fn clear_approximation(&self, _filter_type: FilterType) {}

    fn clear_approximations(&self) {}
}

/// Capability registry owned by the composition root. Collaborators register whenever
/// they come up; the applicator reads whatever is present at attempt time.
#[derive(Default)]
pub struct RenderingContext {
    engine: RwLock<Option<Arc<dyn FilterEngine>>>,
    ui_driver: RwLock<Option<Arc<dyn UiDriver>>>,
    surface: RwLock<Option<Arc<dyn FaceSurface>>>,
}

impl RenderingContext {
    pub fn new() -> Self {
        RenderingContext::default()
    }

    pub fn register_engine(&self, engine: Arc<dyn FilterEngine>) {
        info!(target: "look.render", "Rendering engine registered");
        *self.engine.write() = Some(engine);
    }

    pub fn register_ui_driver(&self, driver: Arc<dyn UiDriver>) {
        info!(target: "look.render", "UI driver registered");
        *self.ui_driver.write() = Some(driver);
    }

    pub fn register_surface(&self, surface: Arc<dyn FaceSurface>) {
        info!(target: "look.render", "Face surface registered");
        *self.surface.write() = Some(surface);
    }

    pub fn unregister_surface(&self) {
        *self.surface.write() = None;
    }

    pub fn engine(&self) -> Option<Arc<dyn FilterEngine>> {
        self.engine.read().clone()
    }

    pub fn ui_driver(&self) -> Option<Arc<dyn UiDriver>> {
        self.ui_driver.read().clone()
    }

    pub fn surface(&self) -> Option<Arc<dyn FaceSurface>> {
        self.surface.read().clone()
    }

    pub fn surface_available(&self) -> bool {
        self.surface().is_some_and(|surface| surface.has_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BlankSurface(Option<FrameBuffer>);

    impl FaceSurface for BlankSurface {
        fn frame(&self) -> Option<FrameBuffer> {
            self.0.clone()
        }

        fn apply_approximation(&self, _: FilterType, _: &ApproximationChain) -> bool {
            true
        }
    }

    #[test]
    fn frame_must_cover_its_dimensions() {
        let frame = FrameBuffer {
            width: 2,
            height: 1,
            pixels: vec![0; 8],
        };
        assert!(frame.is_renderable());
        let short = FrameBuffer {
            width: 2,
            height: 2,
            pixels: vec![0; 8],
        };
        assert!(!short.is_renderable());
    }

    #[test]
    fn surface_availability_tracks_registration_and_frames() {
        let context = RenderingContext::new();
        assert!(!context.surface_available());

        context.register_surface(Arc::new(BlankSurface(None)));
        assert!(!context.surface_available());

        context.register_surface(Arc::new(BlankSurface(Some(FrameBuffer {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        }))));
        assert!(context.surface_available());

        context.unregister_surface();
        assert!(!context.surface_available());
    }
}
