//! The viewer control surface: canvas registration, document attachment,
//! and redraw-state round trips.

use std::collections::HashMap;
use std::rc::Rc;

use crate::{
    error::PdfResult,
    page::Page,
    store::{ObjectProvider, ObjectStore},
    Resolve,
};

use super::{
    layout::{LayoutParams, PageExtent, PageLayout, Viewport},
    redraw::RedrawScheduler,
};

/// Per-canvas configuration, with the documented defaults
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Zoom multiplier applied per zoom step
    pub zoom_factor: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Scroll lines per wheel notch
    pub scroll_step: f32,
    /// RGB background behind and between pages
    pub background_color: [u8; 3],
    pub max_thumbnail_size: u32,
    /// Left, top, right, bottom
    pub pages_padding: [f32; 4],
    pub minimum_page_gap: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            zoom_factor: 0.1,
            min_zoom: 0.1,
            max_zoom: 5.0,
            scroll_step: 2.0,
            background_color: [211, 211, 211],
            max_thumbnail_size: 400,
            pages_padding: [10.0, 10.0, 10.0, 10.0],
            minimum_page_gap: 10.0,
        }
    }
}

/// The layout inputs and outputs of one redraw round trip. The host sends
/// its viewport and requested offsets; the updated state comes back with
/// extents computed, offsets clamped, and the page bookkeeping refreshed
#[derive(Debug, Clone, PartialEq)]
pub struct RedrawState {
    pub zoom: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub vertical_offset: f32,
    pub horizontal_offset: f32,

    pub extent_width: f32,
    pub extent_height: f32,
    pub current_page: usize,
    pub visible_pages: Vec<usize>,
    pub page_count: usize,
    /// The version token for the frame this state describes
    pub render_version: u64,
}

impl RedrawState {
    pub fn initial(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            zoom: 1.0,
            viewport_width,
            viewport_height,
            vertical_offset: 0.0,
            horizontal_offset: 0.0,
            extent_width: 0.0,
            extent_height: 0.0,
            current_page: 0,
            visible_pages: Vec::new(),
            page_count: 0,
            render_version: 0,
        }
    }
}

/// The host's pixel sink
pub trait HostPresenter {
    fn present_rgba(&mut self, id: &str, width: u32, height: u32, rgba: &[u8]) -> PdfResult<()>;
}

struct RegisteredCanvas {
    config: CanvasConfig,
    store: Option<ObjectStore>,
    pages: Vec<Rc<Page>>,
    scheduler: RedrawScheduler,
}

/// Registry of host canvases. The whole surface is synchronous; redraw
/// scheduling is cooperative through [RedrawScheduler]
#[derive(Default)]
pub struct ViewerRegistry {
    canvases: HashMap<String, RegisteredCanvas>,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canvas under a host-chosen id. Registering an id twice
    /// is the error path hosts observe as a rejected registration
    pub fn register_canvas(&mut self, id: &str, config: CanvasConfig) -> PdfResult<()> {
        if self.canvases.contains_key(id) {
            anyhow::bail!("canvas id {:?} is already registered", id);
        }

        self.canvases.insert(
            id.to_owned(),
            RegisteredCanvas {
                config,
                store: None,
                pages: Vec::new(),
                scheduler: RedrawScheduler::new(),
            },
        );

        Ok(())
    }

    pub fn unregister_canvas(&mut self, id: &str) {
        self.canvases.remove(id);
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.canvases.contains_key(id)
    }

    /// Attach a document: the provider's page list is resolved into page
    /// objects eagerly, everything else stays lazy in the store
    pub fn set_document(&mut self, id: &str, provider: Box<dyn ObjectProvider>) -> PdfResult<()> {
        let canvas = self.canvas_mut(id)?;

        let mut store = ObjectStore::new(provider);

        let mut pages = Vec::new();
        for page_obj in store.pages()? {
            let obj = store.resolve(page_obj)?;
            pages.push(Rc::new(Page::from_obj(obj, &mut store)?));
        }

        canvas.pages = pages;
        canvas.store = Some(store);
        canvas.scheduler.request();

        Ok(())
    }

    /// One redraw round trip: lay the pages out against the incoming
    /// state, clamp it, and stamp it with a fresh render version
    pub fn request_redraw(&mut self, id: &str, state: RedrawState) -> PdfResult<RedrawState> {
        let canvas = self.canvas_mut(id)?;

        let zoom = state
            .zoom
            .clamp(canvas.config.min_zoom, canvas.config.max_zoom);

        let extents = canvas
            .pages
            .iter()
            .map(|page| {
                let (width, height) = page.rotated_size();
                PageExtent { width, height }
            })
            .collect::<Vec<PageExtent>>();

        let layout = PageLayout::update(
            &extents,
            LayoutParams {
                zoom,
                padding: canvas.config.pages_padding,
                gap: canvas.config.minimum_page_gap,
            },
            Viewport {
                width: state.viewport_width,
                height: state.viewport_height,
            },
            state.vertical_offset,
            state.horizontal_offset,
        );

        canvas.scheduler.request();
        let render_version = canvas.scheduler.begin_frame();

        Ok(RedrawState {
            zoom,
            viewport_width: state.viewport_width,
            viewport_height: state.viewport_height,
            vertical_offset: layout.vertical_offset,
            horizontal_offset: layout.horizontal_offset,
            extent_width: layout.extent_width,
            extent_height: layout.extent_height,
            current_page: layout.current_page,
            visible_pages: layout.visible_pages(),
            page_count: canvas.pages.len(),
            render_version,
        })
    }

    /// Mark a frame finished; returns whether another redraw is owed.
    /// A stale version is dropped without presenting
    pub fn complete_frame(&mut self, id: &str, render_version: u64) -> PdfResult<bool> {
        let canvas = self.canvas_mut(id)?;

        if !canvas.scheduler.is_current(render_version) {
            return Ok(false);
        }

        Ok(canvas.scheduler.complete_frame())
    }

    /// Hand finished pixels to the host
    pub fn render_rgba_to_canvas(
        &mut self,
        id: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
        presenter: &mut dyn HostPresenter,
    ) -> PdfResult<()> {
        // the canvas must still be registered; late frames for removed
        // canvases drop here
        self.canvas_mut(id)?;

        presenter.present_rgba(id, width, height, rgba)
    }

    pub fn pages(&self, id: &str) -> &[Rc<Page>] {
        self.canvases
            .get(id)
            .map(|canvas| canvas.pages.as_slice())
            .unwrap_or(&[])
    }

    pub fn config(&self, id: &str) -> Option<&CanvasConfig> {
        self.canvases.get(id).map(|canvas| &canvas.config)
    }

    fn canvas_mut(&mut self, id: &str) -> PdfResult<&mut RegisteredCanvas> {
        self.canvases
            .get_mut(id)
            .ok_or_else(|| anyhow::anyhow!("no canvas registered under id {:?}", id))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        objects::{Dictionary, Object},
        store::MemoryProvider,
    };
    use std::collections::HashMap as Map;

    fn letter_page() -> Object {
        let dict: Map<String, Object> = [(
            "MediaBox".to_owned(),
            Object::Array(
                [0.0, 0.0, 612.0, 792.0]
                    .iter()
                    .map(|&v| Object::Real(v))
                    .collect(),
            ),
        )]
        .into_iter()
        .collect();

        Object::Dictionary(Dictionary::new(dict))
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ViewerRegistry::new();

        registry.register_canvas("main", CanvasConfig::default()).unwrap();
        assert!(registry.register_canvas("main", CanvasConfig::default()).is_err());
    }

    #[test]
    fn redraw_round_trip_computes_extents() {
        let mut registry = ViewerRegistry::new();
        registry.register_canvas("main", CanvasConfig::default()).unwrap();

        let mut provider = MemoryProvider::new();
        provider.push_page(letter_page());
        provider.push_page(letter_page());
        registry.set_document("main", Box::new(provider)).unwrap();

        let state = registry
            .request_redraw("main", RedrawState::initial(800.0, 600.0))
            .unwrap();

        assert_eq!(state.page_count, 2);
        assert_eq!(state.extent_height, 792.0 * 2.0 + 10.0 + 20.0);
        assert_eq!(state.current_page, 0);
        assert!(state.render_version > 0);
    }

    #[test]
    fn zoom_clamps_to_config_range() {
        let mut registry = ViewerRegistry::new();
        registry.register_canvas("main", CanvasConfig::default()).unwrap();

        let mut provider = MemoryProvider::new();
        provider.push_page(letter_page());
        registry.set_document("main", Box::new(provider)).unwrap();

        let mut state = RedrawState::initial(800.0, 600.0);
        state.zoom = 100.0;

        let state = registry.request_redraw("main", state).unwrap();
        assert_eq!(state.zoom, 5.0);
    }

    #[test]
    fn stale_frames_drop_silently() {
        let mut registry = ViewerRegistry::new();
        registry.register_canvas("main", CanvasConfig::default()).unwrap();

        let mut provider = MemoryProvider::new();
        provider.push_page(letter_page());
        registry.set_document("main", Box::new(provider)).unwrap();

        let first = registry
            .request_redraw("main", RedrawState::initial(800.0, 600.0))
            .unwrap();
        let second = registry
            .request_redraw("main", RedrawState::initial(800.0, 600.0))
            .unwrap();

        assert!(!registry.complete_frame("main", first.render_version).unwrap());
        assert!(second.render_version > first.render_version);
    }
}
