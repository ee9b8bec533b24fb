use crate::{error::PdfResult, objects::Dictionary, Resolve};

use super::ShadingFunction;

/// Type 3 shadings (radial shadings) define a colour blend that varies
/// between two circles. They are commonly used to depict three-dimensional
/// spheres and cones
#[derive(Debug)]
pub struct RadialShading {
    /// An array of six numbers [x0 y0 r0 x1 y1 r1] specifying the centres
    /// and radii of the starting and ending circles, expressed in the
    /// shading's target coordinate space. The radii r0 and r1 shall both be
    /// greater than or equal to 0. If one radius is 0, the corresponding
    /// circle shall be treated as a point; if both are 0, nothing shall be
    /// painted
    pub coords: [f32; 6],

    /// An array of two numbers [t0 t1] specifying the limiting values of a
    /// parametric variable t.
    ///
    /// Default value: [0.0 1.0]
    pub domain: [f32; 2],

    pub function: ShadingFunction,

    /// An array of two boolean values specifying whether to extend the
    /// shading beyond the starting and ending circles.
    ///
    /// Default value: [false false]
    pub extend: [bool; 2],
}

impl RadialShading {
    pub fn from_dict(dict: &mut Dictionary, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let coords = dict.expect::<[f32; 6]>("Coords", resolver)?;
        let domain = dict.get::<[f32; 2]>("Domain", resolver)?.unwrap_or([0.0, 1.0]);
        let function = ShadingFunction::from_dict(dict, resolver)?
            .ok_or_else(|| anyhow::anyhow!("radial shading requires a function"))?;
        let extend = dict
            .get::<Vec<bool>>("Extend", resolver)?
            .map(|arr| [
                arr.first().copied().unwrap_or(false),
                arr.get(1).copied().unwrap_or(false),
            ])
            .unwrap_or([false, false]);

        Ok(Self {
            coords,
            domain,
            function,
            extend,
        })
    }

    /// Color components at radial position s in [0, 1]
    pub fn sample(&self, s: f32) -> PdfResult<Vec<f32>> {
        let t = self.domain[0] + s.clamp(0.0, 1.0) * (self.domain[1] - self.domain[0]);
        self.function.eval(t)
    }
}
