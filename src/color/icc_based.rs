use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    error::PdfResult,
    filter::decode_stream,
    icc::{ColorTransform, IccProfile},
    objects::{FromObj, Object},
    resources::graphics_state_parameters::RenderingIntent,
    Resolve,
};

use super::ColorSpace;

/// An ICCBased color space: an embedded profile stream plus the fallback
/// machinery around it.
///
/// Transform chains are compiled lazily and memoized per rendering intent;
/// the page cache keyed by resource name keeps one of these per page, so
/// the memoization is effectively per (converter identity, intent)
#[derive(Debug)]
pub struct IccBasedColorSpace {
    /// The number of colour components in the colour space described by the ICC
    /// profile data. This number shall match the number of components
    /// actually in the ICC profile
    num_components: usize,

    /// An alternate colour space that shall be used in case the one specified in
    /// the stream data is not supported. The alternate space may
    /// be any valid colour space (except a Pattern colour space) that has
    /// the number of components specified by N. If this entry is omitted,
    /// the colour space used is DeviceGray, DeviceRGB, or DeviceCMYK,
    /// depending on whether the value of N is 1, 3, or 4
    alternate: ColorSpace,

    /// An array of 2 x N numbers [min0 max0 min1 max1 ...] that shall specify the
    /// minimum and maximum valid values of the corresponding colour components.
    ///
    /// Default value: [0.0 1.0 0.0 1.0 ...]
    range: Vec<f32>,

    profile: IccProfile,

    transforms: RefCell<HashMap<RenderingIntent, Rc<ColorTransform>>>,
}

impl IccBasedColorSpace {
    /// Parse the ICCBased parameter stream. A malformed profile falls back
    /// to the declared Alternate, or to the device space of matching
    /// component count
    pub fn resolve(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<ColorSpace> {
        let mut stream = resolver.assert_stream(obj)?;

        let num_components = stream.dict.other.expect_integer("N", resolver)?.max(1) as usize;

        let alternate = match stream.dict.other.get_object("Alternate") {
            Some(obj) => ColorSpace::from_obj(obj, resolver)?,
            None => ColorSpace::device_fallback(num_components),
        };

        let range = stream
            .dict
            .other
            .get::<Vec<f32>>("Range", resolver)?
            .unwrap_or_else(|| {
                [0.0f32, 1.0]
                    .into_iter()
                    .cycle()
                    .take(num_components * 2)
                    .collect()
            });

        let decoded = decode_stream(&stream.stream, &stream.dict, resolver)?;

        let profile = match IccProfile::new(&decoded) {
            Ok(profile) => profile,
            Err(err) => {
                log::warn!("malformed icc profile, using alternate: {}", err);
                return Ok(alternate);
            }
        };

        if profile.channels() != num_components {
            log::warn!(
                "icc profile channel count {} does not match N {}",
                profile.channels(),
                num_components
            );
            return Ok(alternate);
        }

        Ok(ColorSpace::IccBased(Rc::new(Self {
            num_components,
            alternate,
            range,
            profile,
            transforms: RefCell::new(HashMap::new()),
        })))
    }

    pub fn channels(&self) -> usize {
        self.num_components
    }

    /// The embedded profile bytes
    pub fn profile_bytes(&self) -> &[u8] {
        self.profile.raw_data()
    }

    pub fn alternate(&self) -> &ColorSpace {
        &self.alternate
    }

    /// Map raw components through the Range declaration into [0, 1]
    pub fn normalize(&self, raw: &[f32]) -> Vec<f32> {
        raw.iter()
            .enumerate()
            .map(|(i, &value)| {
                let min = self.range.get(i * 2).copied().unwrap_or(0.0);
                let max = self.range.get(i * 2 + 1).copied().unwrap_or(1.0);

                if max == min {
                    0.0
                } else {
                    ((value - min) / (max - min)).clamp(0.0, 1.0)
                }
            })
            .collect()
    }

    /// The compiled transform chain for an intent, built once
    pub fn transform(&self, intent: RenderingIntent) -> PdfResult<Rc<ColorTransform>> {
        if let Some(transform) = self.transforms.borrow().get(&intent) {
            return Ok(Rc::clone(transform));
        }

        let transform = Rc::new(ColorTransform::from_profile(
            &self.profile,
            intent.to_icc(),
        )?);

        self.transforms
            .borrow_mut()
            .insert(intent, Rc::clone(&transform));

        Ok(transform)
    }
}
