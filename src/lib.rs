#![allow(
    dead_code,
    // sometimes we want to model the pdf names better
    clippy::enum_variant_names,
    clippy::large_enum_variant,
    clippy::manual_range_contains,
)]

/*!

The core of a PDF rendering engine: the pipeline that turns PDF bytes into
pixels on a 2D canvas.

The hosting viewer supplies an [ObjectProvider] (the lazy indirect-object
source), a [render::Canvas] to paint onto, and a [render::TextShaper] for
glyph selection; everything between those seams lives here: the
content-stream interpreter, the color pipeline with ICC evaluation, the
image decoders, and the transparency and pattern composition machinery.

*/

#[macro_use]
extern crate pdf_macro;

pub mod color;
pub mod content;
pub mod data_structures;
mod error;
pub mod filter;
pub mod function;
pub mod geometry;
pub mod icc;
pub mod image;
pub mod jpeg;
mod lex;
mod objects;
mod page;
pub mod render;
mod resolve;
pub mod resources;
pub mod shading;
pub mod store;
mod stream;
pub mod viewer;
pub mod xobject;

use std::rc::Rc;

pub(crate) use crate::{objects::FromObj, resolve::Resolve};

pub use crate::{
    error::{ParseError, PdfResult, RenderError},
    objects::{Dictionary, Name, Object, Reference, TypeOrArray},
    page::Page,
    resolve::NoResolve,
    store::{MemoryProvider, ObjectProvider, ObjectStore},
    stream::{Stream, StreamDict},
};

/// Assert that the dictionary has no keys
///
/// Dictionary consumers remove the entries they understand; in debug runs
/// this surfaces keys nothing consumed. Unknown entries are tolerated in
/// release builds
#[track_caller]
pub(crate) fn assert_empty(dict: Dictionary) {
    if !dict.is_empty() {
        log::debug!(
            "unconsumed dictionary keys: {:?}",
            dict.keys().collect::<Vec<_>>()
        );
    }
}

pub(crate) fn assert_len(found: usize, expected: usize) -> PdfResult<()> {
    if found != expected {
        anyhow::bail!(ParseError::ArrayOfInvalidLength { expected });
    }

    Ok(())
}

/// A document: an object store over the external provider plus the
/// resolved page list
pub struct Document {
    store: ObjectStore,
    pages: Vec<Rc<Page>>,
}

impl Document {
    pub fn new(provider: Box<dyn ObjectProvider>) -> PdfResult<Self> {
        let mut store = ObjectStore::new(provider);

        let mut pages = Vec::new();
        for page_obj in store.pages()? {
            let obj = store.resolve(page_obj)?;
            pages.push(Rc::new(Page::from_obj(obj, &mut store)?));
        }

        Ok(Self { store, pages })
    }

    pub fn pages(&self) -> &[Rc<Page>] {
        &self.pages
    }

    pub fn store(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    /// Interpret one page onto a canvas
    pub fn render_page(
        &mut self,
        index: usize,
        canvas: &mut dyn render::Canvas,
        shaper: &dyn render::TextShaper,
        base_matrix: data_structures::Matrix,
    ) -> PdfResult<()> {
        let page = match self.pages.get(index) {
            Some(page) => Rc::clone(page),
            None => anyhow::bail!("no page at index {}", index),
        };

        page.render(canvas, &mut self.store, shaper, base_matrix)
    }
}
