use crate::{error::PdfResult, objects::Dictionary, Resolve};

use super::ShadingFunction;

/// Type 2 shadings (axial shadings) define a colour blend that varies along
/// a linear axis between two endpoints and extends indefinitely
/// perpendicular to that axis
#[derive(Debug)]
pub struct AxialShading {
    /// An array of four numbers [x0 y0 x1 y1] specifying the starting and
    /// ending coordinates of the axis, expressed in the shading's target
    /// coordinate space
    pub coords: [f32; 4],

    /// An array of two numbers [t0 t1] specifying the limiting values of a
    /// parametric variable t. The variable is considered to vary linearly
    /// between these two values as the colour gradient varies between the
    /// starting and ending points of the axis.
    ///
    /// Default value: [0.0 1.0]
    pub domain: [f32; 2],

    pub function: ShadingFunction,

    /// An array of two boolean values specifying whether to extend the
    /// shading beyond the starting and ending points of the axis.
    ///
    /// Default value: [false false]
    pub extend: [bool; 2],
}

impl AxialShading {
    pub fn from_dict(dict: &mut Dictionary, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let coords = dict.expect::<[f32; 4]>("Coords", resolver)?;
        let domain = dict.get::<[f32; 2]>("Domain", resolver)?.unwrap_or([0.0, 1.0]);
        let function = ShadingFunction::from_dict(dict, resolver)?
            .ok_or_else(|| anyhow::anyhow!("axial shading requires a function"))?;
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

    /// Color components at axis position s in [0, 1]
    pub fn sample(&self, s: f32) -> PdfResult<Vec<f32>> {
        let t = self.domain[0] + s.clamp(0.0, 1.0) * (self.domain[1] - self.domain[0]);
        self.function.eval(t)
    }
}
