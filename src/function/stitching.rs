use crate::{error::PdfResult, objects::Dictionary, Resolve};

use super::Function;

/// Type 3 functions (PDF 1.3) define a stitching of the subdomains of several 1-input functions to
/// produce a single new 1-input function. Since the resulting stitching function is a 1-input function,
/// the domain is given by a twoelement array, [Domain0 Domain1].
#[derive(Debug, Clone)]
pub struct StitchingFunction {
    /// An array of k 1-input functions that shall make up the stitching function. The output
    /// dimensionality of all functions shall be the same, and compatible with the value of Range if Range
    /// is present
    functions: Vec<Function>,

    /// An array of k - 1 numbers that, in combination with Domain, shall define the intervals to which
    /// each function from the Functions array shall apply. Bounds elements shall be in order of
    /// increasing value, and each value shall be within the domain defined by Domain
    bounds: Vec<f32>,

    /// An array of 2 * k numbers that, taken in pairs, shall map each subset of the domain defined by
    /// Domain and the Bounds array to the domain of the corresponding function
    encode: Vec<f32>,
}

impl StitchingFunction {
    pub fn from_dict(dict: &mut Dictionary, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let functions = dict
            .expect_arr("Functions", resolver)?
            .into_iter()
            .map(|obj| Function::from_obj(obj, resolver))
            .collect::<PdfResult<Vec<Function>>>()?;

        let bounds = dict.expect::<Vec<f32>>("Bounds", resolver)?;
        let encode = dict.expect::<Vec<f32>>("Encode", resolver)?;

        Ok(Self {
            functions,
            bounds,
            encode,
        })
    }

    pub fn output_count(&self) -> Option<usize> {
        self.functions.first().and_then(Function::output_count)
    }

    pub fn eval(&self, inputs: &[f32], domain: &[f32]) -> PdfResult<Vec<f32>> {
        let x = inputs.first().copied().unwrap_or(0.0);

        if self.functions.is_empty() {
            return Ok(Vec::new());
        }

        // subdomain k covers [bounds[k - 1], bounds[k]), with the domain
        // edges closing the first and last intervals
        let k = self
            .bounds
            .iter()
            .position(|&bound| x < bound)
            .unwrap_or(self.bounds.len())
            .min(self.functions.len() - 1);

        let low = if k == 0 {
            domain.first().copied().unwrap_or(0.0)
        } else {
            self.bounds[k - 1]
        };
        let high = if k == self.bounds.len() {
            domain.get(1).copied().unwrap_or(1.0)
        } else {
            self.bounds[k]
        };

        let encode_low = self.encode.get(k * 2).copied().unwrap_or(0.0);
        let encode_high = self.encode.get(k * 2 + 1).copied().unwrap_or(1.0);

        let encoded = if high == low {
            encode_low
        } else {
            encode_low + (x - low) * (encode_high - encode_low) / (high - low)
        };

        self.functions[k].eval(&[encoded])
    }
}
