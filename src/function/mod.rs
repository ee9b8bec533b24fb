use crate::{
    error::PdfResult,
    objects::{Dictionary, Object},
    stream::Stream,
    Resolve,
};

use self::{
    exponential_interpolation::ExponentialInterpolationFunction,
    postscript_calculator::PostScriptCalculatorFunction, sampled::SampledFunction,
    stitching::StitchingFunction,
};

mod exponential_interpolation;
mod postscript_calculator;
mod sampled;
mod stitching;

#[derive(Debug, Clone)]
pub struct Function {
    /// An array of 2 * m numbers, where m shall be the number of input values.
    /// For each i from 0 to m - 1, Domain2i shall be less than or equal to Domain2i+1,
    /// and the ith input value, xi, shall lie in the interval Domain2i <= xi <= Domain2i+1.
    /// Input values outside the declared domain shall be clipped to the nearest boundary
    /// value.
    domain: Vec<f32>,

    /// An array of 2 * n numbers, where n shall be the number of output values. For
    /// each j from 0 to n - 1, Range2j shall be less than or equal to Range2j+1,
    /// and the jth output value, yj, shall lie in the interval Range2j <= yj <= Range2j+1.
    /// Output values outside the declared range shall be clipped to the nearest
    /// boundary value. If this entry is absent, no clipping shall be done.
    range: Option<Vec<f32>>,

    subtype: FunctionSubtype,
}

#[derive(Debug)]
pub(crate) enum StreamOrDict {
    Stream(Stream),
    Dict(Dictionary),
}

impl StreamOrDict {
    pub fn dict(&mut self) -> &mut Dictionary {
        match self {
            Self::Dict(dict) => dict,
            Self::Stream(stream) => &mut stream.dict.other,
        }
    }

    pub fn expect_stream(self) -> PdfResult<Stream> {
        match self {
            Self::Dict(..) => anyhow::bail!("expected stream-based function"),
            Self::Stream(stream) => Ok(stream),
        }
    }
}

impl Function {
    pub fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let obj = resolver.resolve(obj)?;

        let mut stream_or_dict = if let Object::Stream(stream) = obj {
            StreamOrDict::Stream(stream)
        } else {
            StreamOrDict::Dict(resolver.assert_dict(obj)?)
        };

        let dict = stream_or_dict.dict();

        let domain = dict.expect::<Vec<f32>>("Domain", resolver)?;
        let range = dict.get::<Vec<f32>>("Range", resolver)?;

        let subtype = FunctionSubtype::from_stream_or_dict(stream_or_dict, resolver)?;

        Ok(Self {
            domain,
            range,
            subtype,
        })
    }

    pub fn input_count(&self) -> usize {
        self.domain.len() / 2
    }

    pub fn output_count(&self) -> Option<usize> {
        match &self.subtype {
            FunctionSubtype::Sampled(f) => Some(f.output_count()),
            FunctionSubtype::ExponentialInterpolation(f) => Some(f.output_count()),
            FunctionSubtype::Stitching(f) => f.output_count(),
            FunctionSubtype::PostScriptCalculator(..) => {
                self.range.as_ref().map(|range| range.len() / 2)
            }
        }
    }

    /// Evaluate the function. Inputs are clipped to the domain, outputs to
    /// the range when one is declared
    pub fn eval(&self, inputs: &[f32]) -> PdfResult<Vec<f32>> {
        let clipped = inputs
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                if let (Some(&lo), Some(&hi)) =
                    (self.domain.get(i * 2), self.domain.get(i * 2 + 1))
                {
                    x.clamp(lo, hi)
                } else {
                    x
                }
            })
            .collect::<Vec<f32>>();

        let mut outputs = match &self.subtype {
            FunctionSubtype::Sampled(f) => f.eval(&clipped, &self.domain, self.range.as_deref())?,
            FunctionSubtype::ExponentialInterpolation(f) => f.eval(&clipped),
            FunctionSubtype::Stitching(f) => f.eval(&clipped, &self.domain)?,
            FunctionSubtype::PostScriptCalculator(f) => f.eval(&clipped)?,
        };

        if let Some(range) = &self.range {
            for (j, out) in outputs.iter_mut().enumerate() {
                if let (Some(&lo), Some(&hi)) = (range.get(j * 2), range.get(j * 2 + 1)) {
                    *out = out.clamp(lo, hi);
                }
            }
        }

        Ok(outputs)
    }

    /// Evaluate a 1-in, 1-out function
    pub fn eval_single(&self, x: f32) -> PdfResult<f32> {
        Ok(self.eval(&[x])?.first().copied().unwrap_or(0.0))
    }
}

#[derive(Debug, Clone)]
enum FunctionSubtype {
    Sampled(SampledFunction),
    ExponentialInterpolation(ExponentialInterpolationFunction),
    Stitching(StitchingFunction),
    PostScriptCalculator(PostScriptCalculatorFunction),
}

impl FunctionSubtype {
    pub fn from_stream_or_dict(
        mut stream_or_dict: StreamOrDict,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Self> {
        let dict = stream_or_dict.dict();
        let subtype = FunctionType::from_integer(dict.expect_integer("FunctionType", resolver)?)?;

        Ok(match subtype {
            FunctionType::Sampled => FunctionSubtype::Sampled(SampledFunction::from_stream(
                stream_or_dict.expect_stream()?,
                resolver,
            )?),
            FunctionType::ExponentialInterpolation => FunctionSubtype::ExponentialInterpolation(
                ExponentialInterpolationFunction::from_dict(dict, resolver)?,
            ),
            FunctionType::Stitching => {
                FunctionSubtype::Stitching(StitchingFunction::from_dict(dict, resolver)?)
            }
            FunctionType::PostScriptCalculator => {
                FunctionSubtype::PostScriptCalculator(PostScriptCalculatorFunction::from_stream(
                    stream_or_dict.expect_stream()?,
                    resolver,
                )?)
            }
        })
    }
}

#[pdf_enum(Integer)]
enum FunctionType {
    Sampled = 0,
    ExponentialInterpolation = 2,
    Stitching = 3,
    PostScriptCalculator = 4,
}

/// A per-channel adjustment applied after color conversion and before
/// compositing
#[derive(Debug, Clone)]
pub enum TransferFunction {
    Identity,
    /// The device's own transfer, treated as identity here
    Default,
    /// One function applied to every channel
    Single(Box<Function>),
    /// One function per channel
    PerChannel(Box<[Function; 4]>),
    /// An outer transfer (from a surrounding soft mask or transparency
    /// group) chained after an inner one
    Chained(Box<TransferFunction>, Box<TransferFunction>),
}

impl TransferFunction {
    pub fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let obj = resolver.resolve(obj)?;

        if obj.name_is("Identity") {
            return Ok(TransferFunction::Identity);
        }

        if obj.name_is("Default") {
            return Ok(TransferFunction::Default);
        }

        if let Object::Array(arr) = obj {
            let mut functions = arr
                .into_iter()
                .map(|obj| Function::from_obj(obj, resolver))
                .collect::<PdfResult<Vec<Function>>>()?;

            crate::assert_len(functions.len(), 4)?;

            let d = functions.pop().unwrap();
            let c = functions.pop().unwrap();
            let b = functions.pop().unwrap();
            let a = functions.pop().unwrap();

            return Ok(TransferFunction::PerChannel(Box::new([a, b, c, d])));
        }

        Ok(TransferFunction::Single(Box::new(Function::from_obj(
            obj, resolver,
        )?)))
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, TransferFunction::Identity | TransferFunction::Default)
    }

    pub fn then(self, outer: TransferFunction) -> TransferFunction {
        match (&self, &outer) {
            (_, o) if o.is_identity() => self,
            (s, _) if s.is_identity() => outer,
            _ => TransferFunction::Chained(Box::new(self), Box::new(outer)),
        }
    }

    /// Apply to a set of channels in place. A failing function leaves its
    /// channel unchanged
    pub fn apply(&self, channels: &mut [f32]) {
        match self {
            TransferFunction::Identity | TransferFunction::Default => {}
            TransferFunction::Single(function) => {
                for channel in channels.iter_mut() {
                    if let Ok(v) = function.eval_single(*channel) {
                        *channel = v;
                    }
                }
            }
            TransferFunction::PerChannel(functions) => {
                for (channel, function) in channels.iter_mut().zip(functions.iter()) {
                    if let Ok(v) = function.eval_single(*channel) {
                        *channel = v;
                    }
                }
            }
            TransferFunction::Chained(inner, outer) => {
                inner.apply(channels);
                outer.apply(channels);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{objects::Name, resolve::NoResolve};
    use std::collections::HashMap;

    fn dict(entries: Vec<(&str, Object)>) -> Object {
        Object::Dictionary(Dictionary::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<HashMap<_, _>>(),
        ))
    }

    fn arr(values: &[f32]) -> Object {
        Object::Array(values.iter().map(|&v| Object::Real(v)).collect())
    }

    #[test]
    fn exponential_interpolation() {
        let function = Function::from_obj(
            dict(vec![
                ("FunctionType", Object::Integer(2)),
                ("Domain", arr(&[0.0, 1.0])),
                ("C0", arr(&[0.0, 1.0])),
                ("C1", arr(&[1.0, 0.0])),
                ("N", Object::Real(1.0)),
            ]),
            &mut NoResolve,
        )
        .unwrap();

        assert_eq!(function.eval(&[0.25]).unwrap(), vec![0.25, 0.75]);
        // inputs are clipped to the domain
        assert_eq!(function.eval(&[2.0]).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn stitching_selects_subfunction() {
        let half = |c0, c1| {
            dict(vec![
                ("FunctionType", Object::Integer(2)),
                ("Domain", arr(&[0.0, 1.0])),
                ("C0", arr(&[c0])),
                ("C1", arr(&[c1])),
                ("N", Object::Real(1.0)),
            ])
        };

        let function = Function::from_obj(
            dict(vec![
                ("FunctionType", Object::Integer(3)),
                ("Domain", arr(&[0.0, 1.0])),
                ("Functions", Object::Array(vec![half(0.0, 0.5), half(0.5, 1.0)])),
                ("Bounds", arr(&[0.5])),
                ("Encode", arr(&[0.0, 1.0, 0.0, 1.0])),
            ]),
            &mut NoResolve,
        )
        .unwrap();

        assert_eq!(function.eval(&[0.25]).unwrap(), vec![0.25]);
        assert_eq!(function.eval(&[0.75]).unwrap(), vec![0.75]);
    }

    #[test]
    fn transfer_function_chain() {
        let invert = Function::from_obj(
            dict(vec![
                ("FunctionType", Object::Integer(2)),
                ("Domain", arr(&[0.0, 1.0])),
                ("C0", arr(&[1.0])),
                ("C1", arr(&[0.0])),
                ("N", Object::Real(1.0)),
            ]),
            &mut NoResolve,
        )
        .unwrap();

        let transfer = TransferFunction::Single(Box::new(invert));
        let chained = transfer.clone().then(transfer);

        let mut channels = [0.25, 0.5];
        chained.apply(&mut channels);

        // double inversion is the identity
        assert_eq!(channels, [0.25, 0.5]);
    }

    #[test]
    fn identity_transfer_by_name() {
        let transfer =
            TransferFunction::from_obj(Object::Name(Name("Identity".to_owned())), &mut NoResolve)
                .unwrap();

        assert!(transfer.is_identity());
    }
}
