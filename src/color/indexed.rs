use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    error::PdfResult,
    filter::decode_stream,
    function::TransferFunction,
    objects::Object,
    resources::graphics_state_parameters::RenderingIntent,
    FromObj, Resolve,
};

use super::ColorSpace;

#[derive(Debug)]
pub struct IndexedColorSpace {
    pub base: ColorSpace,

    /// The hival parameter shall be an integer that specifies the maximum valid
    /// index value. The colour table shall be indexed by integers in the range 0
    /// to hival. hival shall be no greater than 255, which is the integer
    /// required to index a table with 8-bit index values
    pub hival: u8,

    pub lookup: IndexedLookupTable,

    /// Palettes are cached per rendering intent. Replacing the base
    /// converter means building a new space, which drops the cache with it
    palettes: RefCell<HashMap<RenderingIntent, Rc<Vec<[f32; 4]>>>>,
}

impl IndexedColorSpace {
    pub fn from_parts(
        base: Object,
        hival: Object,
        lookup: Object,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Self> {
        let base = ColorSpace::from_obj(base, resolver)?;
        let hival = u8::try_from(resolver.assert_unsigned_integer(hival)?)?;
        let lookup = IndexedLookupTable::from_obj(lookup, resolver)?;

        Ok(Self {
            base,
            hival,
            lookup,
            palettes: RefCell::new(HashMap::new()),
        })
    }

    /// The resolved palette for an intent: `palette[i]` is the base
    /// converter's sample of `lookup[i*N .. i*N+N]`
    pub fn palette(&self, intent: RenderingIntent) -> Rc<Vec<[f32; 4]>> {
        if let Some(palette) = self.palettes.borrow().get(&intent) {
            return Rc::clone(palette);
        }

        let n = self.base.components();
        let sampler = self.base.sampler(intent, &TransferFunction::Identity);

        let entry_count = self.hival as usize + 1;
        let mut palette = Vec::with_capacity(entry_count);

        for i in 0..entry_count {
            let start = i * n;

            // an empty or short lookup table degrades to a palette of zeros
            let components = (0..n)
                .map(|j| {
                    self.lookup
                        .buffer
                        .get(start + j)
                        .map_or(0.0, |&byte| byte as f32 / 255.0)
                })
                .collect::<Vec<f32>>();

            if self.lookup.buffer.len() < start + n {
                palette.push([0.0, 0.0, 0.0, 1.0]);
            } else {
                palette.push(sampler.sample(&components));
            }
        }

        let palette = Rc::new(palette);
        self.palettes
            .borrow_mut()
            .insert(intent, Rc::clone(&palette));

        palette
    }

    /// The raw lookup entry for an index, used by uncolored fast paths
    pub fn lookup_components(&self, index: usize) -> Vec<f32> {
        let n = self.base.components();

        (0..n)
            .map(|j| {
                self.lookup
                    .buffer
                    .get(index * n + j)
                    .map_or(0.0, |&byte| byte as f32 / 255.0)
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct IndexedLookupTable {
    pub(crate) buffer: Vec<u8>,
}

impl FromObj for IndexedLookupTable {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let buffer = match resolver.resolve(obj)? {
            // strings are byte strings; chars carry one byte each
            Object::String(s) => s.chars().map(|c| c as u32 as u8).collect(),
            Object::Stream(stream) => {
                decode_stream(&stream.stream, &stream.dict, resolver)?.into_owned()
            }
            obj => {
                log::warn!(
                    "expected string or stream for indexed lookup table, got {:?}",
                    obj
                );
                Vec::new()
            }
        };

        Ok(Self { buffer })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn indexed(base: ColorSpace, hival: u8, lookup: Vec<u8>) -> IndexedColorSpace {
        IndexedColorSpace {
            base,
            hival,
            lookup: IndexedLookupTable { buffer: lookup },
            palettes: RefCell::new(HashMap::new()),
        }
    }

    #[test]
    fn palette_samples_base_per_entry() {
        let space = indexed(
            ColorSpace::DeviceRgb,
            1,
            vec![255, 0, 0, 0, 0, 255],
        );

        let palette = space.palette(RenderingIntent::RelativeColorimetric);

        assert_eq!(palette.len(), 2);
        assert_eq!(palette[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(palette[1], [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn empty_lookup_becomes_zero_palette() {
        let space = indexed(ColorSpace::DeviceRgb, 3, Vec::new());

        let palette = space.palette(RenderingIntent::Perceptual);

        assert_eq!(palette.len(), 4);
        assert!(palette.iter().all(|&c| c == [0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn palette_is_cached_per_intent() {
        let space = indexed(ColorSpace::DeviceGray, 0, vec![128]);

        let first = space.palette(RenderingIntent::Perceptual);
        let again = space.palette(RenderingIntent::Perceptual);
        let other = space.palette(RenderingIntent::Saturation);

        assert!(Rc::ptr_eq(&first, &again));
        assert!(!Rc::ptr_eq(&first, &other));
    }
}
