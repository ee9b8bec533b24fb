use crate::{data_structures::Matrix, error::PdfResult, objects::Dictionary, Resolve};

use super::ShadingFunction;

/// Type 1 shadings (function-based shadings) define the colour of every
/// point in the domain using a mathematical function. The domain is a
/// rectangle in the shading's own coordinate space
#[derive(Debug)]
pub struct FunctionBasedShading {
    /// An array of four numbers [xmin xmax ymin ymax] specifying the
    /// rectangular domain of coordinates over which the colour function(s)
    /// are defined.
    ///
    /// Default value: [0.0 1.0 0.0 1.0]
    pub domain: [f32; 4],

    /// An array of six numbers specifying a transformation matrix mapping
    /// the coordinate space specified by the Domain entry into the
    /// shading's target coordinate space.
    ///
    /// Default value: the identity matrix [1 0 0 1 0 0]
    pub matrix: Matrix,

    /// A 2-in, n-out function or an array of n 2-in, 1-out functions
    pub function: ShadingFunction,
}

impl FunctionBasedShading {
    pub fn from_dict(dict: &mut Dictionary, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let domain = dict
            .get::<[f32; 4]>("Domain", resolver)?
            .unwrap_or([0.0, 1.0, 0.0, 1.0]);
        let matrix = dict
            .get::<Matrix>("Matrix", resolver)?
            .unwrap_or_else(Matrix::identity);
        let function = ShadingFunction::from_dict(dict, resolver)?
            .ok_or_else(|| anyhow::anyhow!("function-based shading requires a function"))?;

        Ok(Self {
            domain,
            matrix,
            function,
        })
    }

    /// Color components at a point in domain space
    pub fn sample(&self, x: f32, y: f32) -> PdfResult<Vec<f32>> {
        match &self.function {
            ShadingFunction::Single(function) => function.eval(&[x, y]),
            ShadingFunction::PerComponent(functions) => functions
                .iter()
                .map(|function| Ok(function.eval(&[x, y])?.first().copied().unwrap_or(0.0)))
                .collect(),
        }
    }
}
