use std::rc::Rc;

use crate::{
    assert_len,
    error::PdfResult,
    function::TransferFunction,
    icc::ColorTransform,
    objects::{Name, Object},
    resources::graphics_state_parameters::RenderingIntent,
    FromObj, Resolve,
};

pub use self::{
    cie::{CalGrayParams, CalRgbParams, LabParams},
    icc_based::IccBasedColorSpace,
    indexed::{IndexedColorSpace, IndexedLookupTable},
    tint::{DeviceNColorSpace, SeparationColorSpace},
};

mod cie;
mod icc_based;
mod indexed;
mod tint;

/// A color space converter: the capability of turning color operands or
/// image samples into sRGB
#[derive(Debug, Clone)]
pub enum ColorSpace {
    // Device
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,

    // CIE-based
    CalGray(Rc<CalGrayParams>),
    CalRgb(Rc<CalRgbParams>),
    Lab(Rc<LabParams>),
    IccBased(Rc<IccBasedColorSpace>),

    // Special
    Indexed(Rc<IndexedColorSpace>),
    /// The pattern sentinel. `scn` against this space reads a pattern name
    /// and, for uncolored patterns, tint components in the underlying space
    Pattern(Option<Box<ColorSpace>>),
    Separation(Rc<SeparationColorSpace>),
    DeviceN(Rc<DeviceNColorSpace>),
}

#[pdf_enum]
pub enum ColorSpaceName {
    DeviceGray = "DeviceGray",
    DeviceRGB = "DeviceRGB",
    DeviceCMYK = "DeviceCMYK",
    CalGray = "CalGray",
    CalRGB = "CalRGB",
    Lab = "Lab",
    ICCBased = "ICCBased",
    Indexed = "Indexed",
    Pattern = "Pattern",
    Separation = "Separation",
    DeviceN = "DeviceN",
}

impl ColorSpace {
    /// Device fallback by component count: 1 is gray, 3 is rgb, 4 is cmyk
    pub fn device_fallback(components: usize) -> Self {
        match components {
            1 => ColorSpace::DeviceGray,
            4 => ColorSpace::DeviceCmyk,
            _ => ColorSpace::DeviceRgb,
        }
    }

    pub fn components(&self) -> usize {
        match self {
            ColorSpace::DeviceGray | ColorSpace::CalGray(..) => 1,
            ColorSpace::DeviceRgb | ColorSpace::CalRgb(..) => 3,
            ColorSpace::DeviceCmyk => 4,
            ColorSpace::Lab(..) => 3,
            ColorSpace::IccBased(space) => space.channels(),
            ColorSpace::Indexed(..) => 1,
            ColorSpace::Pattern(underlying) => {
                underlying.as_ref().map_or(0, |space| space.components())
            }
            ColorSpace::Separation(..) => 1,
            ColorSpace::DeviceN(space) => space.names.len(),
        }
    }

    pub fn is_device(&self) -> bool {
        matches!(
            self,
            ColorSpace::DeviceGray | ColorSpace::DeviceRgb | ColorSpace::DeviceCmyk
        )
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, ColorSpace::Pattern(..))
    }

    /// The operands of the initial color in this space: black, or index
    /// zero, or tint zero
    pub fn initial_components(&self) -> Vec<f32> {
        match self {
            ColorSpace::DeviceGray | ColorSpace::CalGray(..) => vec![0.0],
            ColorSpace::DeviceRgb | ColorSpace::CalRgb(..) => vec![0.0; 3],
            ColorSpace::DeviceCmyk => vec![0.0, 0.0, 0.0, 1.0],
            ColorSpace::Lab(..) => vec![0.0, 0.0, 0.0],
            ColorSpace::IccBased(space) => vec![0.0; space.channels()],
            ColorSpace::Indexed(..) => vec![0.0],
            ColorSpace::Pattern(..) => Vec::new(),
            ColorSpace::Separation(..) => vec![1.0],
            ColorSpace::DeviceN(space) => vec![1.0; space.names.len()],
        }
    }

    /// Map raw color operands (in the space's nominal component ranges)
    /// into the normalized [0, 1] inputs the sampler takes. Identity except
    /// for Lab and ICC range declarations
    pub fn normalize(&self, raw: &[f32]) -> Vec<f32> {
        match self {
            ColorSpace::Lab(params) => params.normalize(raw),
            ColorSpace::IccBased(space) => space.normalize(raw),
            _ => raw.to_vec(),
        }
    }

    /// Resolve the sampler for this space under a rendering intent, with a
    /// transfer function applied after conversion
    pub fn sampler(
        &self,
        intent: RenderingIntent,
        transfer: &TransferFunction,
    ) -> RgbaSampler {
        let kernel = match self {
            ColorSpace::DeviceGray => SamplerKernel::Gray,
            ColorSpace::DeviceRgb => SamplerKernel::Rgb,
            ColorSpace::DeviceCmyk => SamplerKernel::Cmyk,
            ColorSpace::CalGray(params) => SamplerKernel::Transform(Rc::new(params.transform())),
            ColorSpace::CalRgb(params) => SamplerKernel::Transform(Rc::new(params.transform())),
            ColorSpace::Lab(params) => SamplerKernel::Transform(Rc::new(params.transform())),
            ColorSpace::IccBased(space) => match space.transform(intent) {
                Ok(transform) => SamplerKernel::Transform(transform),
                Err(err) => {
                    log::warn!("malformed icc profile, using alternate: {}", err);
                    return space.alternate().sampler(intent, transfer);
                }
            },
            ColorSpace::Indexed(space) => SamplerKernel::Palette(space.palette(intent)),
            ColorSpace::Pattern(..) => SamplerKernel::PatternSentinel,
            ColorSpace::Separation(space) => SamplerKernel::Tint {
                transform: Rc::clone(&space.tint_transform),
                alternate: Box::new(space.alternate_space.sampler(intent, transfer)),
            },
            ColorSpace::DeviceN(space) => SamplerKernel::Tint {
                transform: Rc::clone(&space.tint_transform),
                alternate: Box::new(space.alternate_space.sampler(intent, transfer)),
            },
        };

        RgbaSampler {
            kernel,
            transfer: transfer.clone(),
        }
    }
}

impl FromObj for ColorSpace {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let obj = resolver.resolve(obj)?;

        if matches!(obj, Object::Null) {
            return Ok(ColorSpace::device_fallback(3));
        }

        match obj {
            Object::Name(name) => ColorSpace::from_family_name(&name),
            Object::Array(arr) => {
                if arr.is_empty() {
                    return Ok(ColorSpace::device_fallback(3));
                }

                let name = Name(resolver.assert_name(arr[0].clone())?);

                match ColorSpaceName::from_str(name.as_str()) {
                    Ok(ColorSpaceName::DeviceGray) => Ok(ColorSpace::DeviceGray),
                    Ok(ColorSpaceName::DeviceRGB) => Ok(ColorSpace::DeviceRgb),
                    Ok(ColorSpaceName::DeviceCMYK) => Ok(ColorSpace::DeviceCmyk),
                    Ok(ColorSpaceName::CalGray) => {
                        assert_len(arr.len(), 2)?;
                        Ok(ColorSpace::CalGray(Rc::new(CalGrayParams::from_obj(
                            arr[1].clone(),
                            resolver,
                        )?)))
                    }
                    Ok(ColorSpaceName::CalRGB) => {
                        assert_len(arr.len(), 2)?;
                        Ok(ColorSpace::CalRgb(Rc::new(CalRgbParams::from_obj(
                            arr[1].clone(),
                            resolver,
                        )?)))
                    }
                    Ok(ColorSpaceName::Lab) => {
                        assert_len(arr.len(), 2)?;
                        Ok(ColorSpace::Lab(Rc::new(LabParams::from_obj(
                            arr[1].clone(),
                            resolver,
                        )?)))
                    }
                    Ok(ColorSpaceName::ICCBased) => {
                        assert_len(arr.len(), 2)?;
                        IccBasedColorSpace::resolve(arr[1].clone(), resolver)
                    }
                    Ok(ColorSpaceName::Indexed) => {
                        assert_len(arr.len(), 4)?;
                        Ok(ColorSpace::Indexed(Rc::new(IndexedColorSpace::from_parts(
                            arr[1].clone(),
                            arr[2].clone(),
                            arr[3].clone(),
                            resolver,
                        )?)))
                    }
                    Ok(ColorSpaceName::Pattern) => {
                        let underlying = match arr.get(1) {
                            Some(obj) => {
                                Some(Box::new(ColorSpace::from_obj(obj.clone(), resolver)?))
                            }
                            None => None,
                        };

                        Ok(ColorSpace::Pattern(underlying))
                    }
                    Ok(ColorSpaceName::Separation) => {
                        assert_len(arr.len(), 4)?;
                        Ok(ColorSpace::Separation(Rc::new(
                            SeparationColorSpace::from_parts(
                                arr[1].clone(),
                                arr[2].clone(),
                                arr[3].clone(),
                                resolver,
                            )?,
                        )))
                    }
                    Ok(ColorSpaceName::DeviceN) => Ok(ColorSpace::DeviceN(Rc::new(
                        DeviceNColorSpace::from_arr(arr, resolver)?,
                    ))),
                    Err(..) => {
                        log::warn!("unknown color space family {:?}", name);
                        Ok(ColorSpace::DeviceRgb)
                    }
                }
            }
            obj => {
                log::warn!("malformed color space object {:?}", obj);
                Ok(ColorSpace::DeviceRgb)
            }
        }
    }
}

impl ColorSpace {
    fn from_family_name(name: &Name) -> PdfResult<Self> {
        Ok(match ColorSpaceName::from_str(name.as_str()) {
            Ok(ColorSpaceName::DeviceGray) => ColorSpace::DeviceGray,
            Ok(ColorSpaceName::DeviceRGB) => ColorSpace::DeviceRgb,
            Ok(ColorSpaceName::DeviceCMYK) => ColorSpace::DeviceCmyk,
            Ok(ColorSpaceName::Pattern) => ColorSpace::Pattern(None),
            // the CIE and special families require parameter arrays
            Ok(..) | Err(..) => {
                log::warn!("unknown color space name {:?}", name);
                ColorSpace::DeviceRgb
            }
        })
    }
}

/// Maps N normalized components to non-premultiplied RGBA
#[derive(Debug, Clone)]
pub struct RgbaSampler {
    kernel: SamplerKernel,
    transfer: TransferFunction,
}

#[derive(Debug, Clone)]
enum SamplerKernel {
    Gray,
    Rgb,
    Cmyk,
    Transform(Rc<ColorTransform>),
    /// index -> rgba, prebuilt per (indexed space, intent)
    Palette(Rc<Vec<[f32; 4]>>),
    Tint {
        transform: Rc<crate::function::Function>,
        alternate: Box<RgbaSampler>,
    },
    /// Paint carrying a pattern has no intrinsic color; the sentinel
    /// samples solid black
    PatternSentinel,
}

impl RgbaSampler {
    /// N components in [0, 1] to normalized RGBA in [0, 1]
    pub fn sample(&self, components: &[f32]) -> [f32; 4] {
        let at = |i: usize| components.get(i).copied().unwrap_or(0.0);

        let mut rgba = match &self.kernel {
            SamplerKernel::Gray => {
                let gray = at(0);
                [gray, gray, gray, 1.0]
            }
            SamplerKernel::Rgb => [at(0), at(1), at(2), 1.0],
            SamplerKernel::Cmyk => {
                let (c, m, y, k) = (at(0), at(1), at(2), at(3));

                [
                    (1.0 - c) * (1.0 - k),
                    (1.0 - m) * (1.0 - k),
                    (1.0 - y) * (1.0 - k),
                    1.0,
                ]
            }
            SamplerKernel::Transform(transform) => {
                let padded = [at(0), at(1), at(2), at(3)];
                let out = transform.eval(padded);
                [out[0].clamp(0.0, 1.0), out[1].clamp(0.0, 1.0), out[2].clamp(0.0, 1.0), 1.0]
            }
            SamplerKernel::Palette(palette) => {
                let index = (at(0).round() as usize).min(palette.len().saturating_sub(1));
                palette.get(index).copied().unwrap_or([0.0, 0.0, 0.0, 1.0])
            }
            SamplerKernel::Tint {
                transform,
                alternate,
            } => match transform.eval(components) {
                // the alternate sampler carries the transfer already
                Ok(alternate_components) => return alternate.sample(&alternate_components),
                Err(err) => {
                    log::warn!("tint transform failed: {}", err);
                    [0.0, 0.0, 0.0, 1.0]
                }
            },
            SamplerKernel::PatternSentinel => [0.0, 0.0, 0.0, 1.0],
        };

        self.transfer.apply(&mut rgba[..3]);

        rgba
    }

    /// N components in [0, 1] to packed 8-bit RGBA
    pub fn sample_rgba8(&self, components: &[f32]) -> [u8; 4] {
        let rgba = self.sample(components);

        [
            (rgba[0] * 255.0 + 0.5) as u8,
            (rgba[1] * 255.0 + 0.5) as u8,
            (rgba[2] * 255.0 + 0.5) as u8,
            (rgba[3] * 255.0 + 0.5) as u8,
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::resolve::NoResolve;

    fn sampler(space: &ColorSpace) -> RgbaSampler {
        space.sampler(RenderingIntent::RelativeColorimetric, &TransferFunction::Identity)
    }

    #[test]
    fn device_gray_replicates() {
        let space = ColorSpace::DeviceGray;

        assert_eq!(sampler(&space).sample(&[0.5]), [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn device_cmyk_black_channel() {
        let space = ColorSpace::DeviceCmyk;

        assert_eq!(sampler(&space).sample(&[0.0, 0.0, 0.0, 1.0]), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(sampler(&space).sample(&[0.0, 0.0, 0.0, 0.0]), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn resolved_black_is_black() {
        // spaces resolve their initial color to (near) black in sRGB
        for space in [ColorSpace::DeviceGray, ColorSpace::DeviceRgb, ColorSpace::DeviceCmyk] {
            let components = space.initial_components();
            let rgba = sampler(&space).sample(&space.normalize(&components));

            for channel in &rgba[..3] {
                assert!(*channel <= 1.0 / 255.0, "{:?} -> {:?}", space, rgba);
            }
        }
    }

    #[test]
    fn unknown_family_falls_back_to_device_rgb() {
        let space = ColorSpace::from_obj(
            Object::Name(Name("NotAColorSpace".to_owned())),
            &mut NoResolve,
        )
        .unwrap();

        assert!(matches!(space, ColorSpace::DeviceRgb));
    }

    #[test]
    fn null_falls_back_by_component_count() {
        assert!(matches!(ColorSpace::device_fallback(1), ColorSpace::DeviceGray));
        assert!(matches!(ColorSpace::device_fallback(3), ColorSpace::DeviceRgb));
        assert!(matches!(ColorSpace::device_fallback(4), ColorSpace::DeviceCmyk));
    }
}
