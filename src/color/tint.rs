use std::{collections::HashMap, rc::Rc};

use crate::{
    error::PdfResult,
    function::Function,
    objects::{Name, Object},
    FromObj, Resolve,
};

use super::ColorSpace;

/// A single named colorant whose tint maps through a transform function
/// into an alternate space
#[derive(Debug)]
pub struct SeparationColorSpace {
    pub name: Name,
    pub alternate_space: ColorSpace,
    pub tint_transform: Rc<Function>,
}

impl SeparationColorSpace {
    pub fn from_parts(
        name: Object,
        alternate: Object,
        tint: Object,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Self> {
        let name = Name::from_obj(name, resolver)?;
        let alternate_space = ColorSpace::from_obj(alternate, resolver)?;
        let tint_transform = Rc::new(Function::from_obj(tint, resolver)?);

        Ok(Self {
            name,
            alternate_space,
            tint_transform,
        })
    }
}

/// Multiple named colorants with an n-in tint transform
#[derive(Debug)]
pub struct DeviceNColorSpace {
    pub names: Vec<Name>,
    pub alternate_space: ColorSpace,
    pub tint_transform: Rc<Function>,
    pub attributes: Option<DeviceNAttributes>,
}

impl DeviceNColorSpace {
    pub fn from_arr(arr: Vec<Object>, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        if arr.len() < 4 {
            anyhow::bail!(crate::ParseError::ArrayOfInvalidLength { expected: 4 });
        }

        let names = <Vec<Name>>::from_obj(arr[1].clone(), resolver)?;
        let alternate_space = ColorSpace::from_obj(arr[2].clone(), resolver)?;
        let tint_transform = Rc::new(Function::from_obj(arr[3].clone(), resolver)?);

        let attributes = match arr.get(4) {
            Some(obj) => Some(DeviceNAttributes::from_obj(obj.clone(), resolver)?),
            None => None,
        };

        Ok(Self {
            names,
            alternate_space,
            tint_transform,
            attributes,
        })
    }
}

/// Optional attributes describing the individual colorants of a DeviceN
/// space. Informational for rendering; the tint transform is authoritative
#[derive(Debug)]
pub struct DeviceNAttributes {
    /// A name specifying the preferred treatment for the colour space. Values shall
    /// be DeviceN or NChannel
    ///
    /// Default value: DeviceN
    pub subtype: Name,

    /// A dictionary describing the individual colorants that shall be used in the
    /// DeviceN colour space. For each entry in this dictionary, the key shall be
    /// a colorant name and the value shall be an array defining a Separation
    /// colour space for that colorant
    pub colorants: HashMap<String, ColorSpace>,
}

impl FromObj for DeviceNAttributes {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let mut dict = resolver.assert_dict(obj)?;

        let subtype = dict
            .get::<Name>("Subtype", resolver)?
            .unwrap_or(Name("DeviceN".to_owned()));

        let colorants = dict
            .get::<HashMap<String, ColorSpace>>("Colorants", resolver)?
            .unwrap_or_default();

        // Process and MixingHints describe ink behavior for blending
        // calculations this renderer does not perform
        let _ = dict.get_object("Process");
        let _ = dict.get_object("MixingHints");

        Ok(Self { subtype, colorants })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        color::RgbaSampler,
        function::TransferFunction,
        objects::Dictionary,
        resolve::NoResolve,
        resources::graphics_state_parameters::RenderingIntent,
    };

    fn tint_sampler(space: &ColorSpace) -> RgbaSampler {
        space.sampler(
            RenderingIntent::RelativeColorimetric,
            &TransferFunction::Identity,
        )
    }

    #[test]
    fn separation_tints_through_alternate() {
        // tint t maps to rgb (t, 0, 0)
        let tint = Function::from_obj(
            Object::Dictionary(Dictionary::new(
                [
                    ("FunctionType".to_owned(), Object::Integer(2)),
                    (
                        "Domain".to_owned(),
                        Object::Array(vec![Object::Real(0.0), Object::Real(1.0)]),
                    ),
                    (
                        "C0".to_owned(),
                        Object::Array(vec![
                            Object::Real(0.0),
                            Object::Real(0.0),
                            Object::Real(0.0),
                        ]),
                    ),
                    (
                        "C1".to_owned(),
                        Object::Array(vec![
                            Object::Real(1.0),
                            Object::Real(0.0),
                            Object::Real(0.0),
                        ]),
                    ),
                    ("N".to_owned(), Object::Real(1.0)),
                ]
                .into_iter()
                .collect::<HashMap<_, _>>(),
            )),
            &mut NoResolve,
        )
        .unwrap();

        let space = ColorSpace::Separation(Rc::new(SeparationColorSpace {
            name: Name("Spot".to_owned()),
            alternate_space: ColorSpace::DeviceRgb,
            tint_transform: Rc::new(tint),
        }));

        let rgba = tint_sampler(&space).sample(&[0.5]);

        assert_eq!(rgba, [0.5, 0.0, 0.0, 1.0]);
    }
}
