use crate::{error::PdfResult, filter::decode_stream, stream::Stream, Resolve};

/// Type 0 functions use a sequence of sample values (contained in a stream) to provide an
/// approximation for functions whose domains and ranges are bounded. The samples are organized
/// as an m-dimensional table in which each entry has n components
#[derive(Debug, Clone)]
pub struct SampledFunction {
    /// An array of m positive integers that shall specify the number of samples in each
    /// input dimension of the sample table
    size: Vec<u32>,

    /// The number of bits that shall represent each sample. (If the function has multiple
    /// output values, each one shall occupy BitsPerSample bits.)
    bits_per_sample: BitsPerSample,

    /// The order of interpolation between samples. Valid values shall be 1 and 3, specifying
    /// linear and cubic spline interpolation, respectively. Cubic interpolation is
    /// evaluated linearly here
    order: InterpolationOrder,

    /// An array of 2 * m numbers specifying the linear mapping of input values into the domain
    /// of the function's sample table.
    ///
    /// Default value: [0 (Size0 - 1) 0 (Size1 - 1) ...]
    encode: Vec<f32>,

    /// An array of 2 * n numbers specifying the linear mapping of sample values into the range
    /// appropriate for the function's output values
    ///
    /// Default value: same as the value of Range
    decode: Vec<f32>,

    output_count: usize,

    /// Decoded sample data; samples are packed most significant bit first
    /// with no padding, the first input dimension varying fastest
    samples: Vec<u8>,
}

#[pdf_enum(Integer)]
#[derive(Default)]
enum InterpolationOrder {
    #[default]
    Linear = 1,
    Cubic = 3,
}

#[pdf_enum(Integer)]
enum BitsPerSample {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Twelve = 12,
    Sixteen = 16,
    TwentyFour = 24,
    ThirtyTwo = 32,
}

fn interpolate(x: f32, x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> f32 {
    if x_max == x_min {
        return y_min;
    }

    y_min + (x - x_min) * (y_max - y_min) / (x_max - x_min)
}

impl SampledFunction {
    pub fn from_stream(mut stream: Stream, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let samples = decode_stream(&stream.stream, &stream.dict, resolver)?.into_owned();

        let dict = &mut stream.dict.other;

        let size = dict.expect::<Vec<u32>>("Size", resolver)?;
        let bits_per_sample =
            BitsPerSample::from_integer(dict.expect_integer("BitsPerSample", resolver)?)?;
        let order = dict
            .get::<InterpolationOrder>("Order", resolver)?
            .unwrap_or_default();

        let encode = dict.get::<Vec<f32>>("Encode", resolver)?.unwrap_or_else(|| {
            size.iter()
                .flat_map(|&i| [0.0, (i as f32) - 1.0])
                .collect()
        });

        // the Range entry was consumed by the outer function dictionary; a
        // missing Decode array falls back to it at evaluation time
        let decode = dict.get::<Vec<f32>>("Decode", resolver)?.unwrap_or_default();

        if size.is_empty() {
            anyhow::bail!("sampled function with no input dimensions");
        }

        let sample_count: usize = size.iter().map(|&s| s as usize).product();
        let output_count = if decode.is_empty() {
            // infer n from the data when neither Range nor Decode reached us
            let bits_per_entry = bits_per_sample as usize;
            (samples.len() * 8 / bits_per_entry / sample_count.max(1)).max(1)
        } else {
            decode.len() / 2
        };

        Ok(Self {
            size,
            bits_per_sample,
            order,
            encode,
            decode,
            output_count,
            samples,
        })
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// The raw sample at flat index `index`, output component `j`
    fn raw_sample(&self, index: usize, j: usize) -> u32 {
        let bits = self.bits_per_sample as usize;
        let bit_pos = (index * self.output_count + j) * bits;

        let mut value: u32 = 0;
        let mut read = 0;

        while read < bits {
            let byte_idx = (bit_pos + read) / 8;
            let bit_in_byte = (bit_pos + read) % 8;
            let take = (8 - bit_in_byte).min(bits - read);

            let byte = self.samples.get(byte_idx).copied().unwrap_or(0);
            let chunk = (byte >> (8 - bit_in_byte - take)) & ((1u16 << take) - 1) as u8;

            value = (value << take) | chunk as u32;
            read += take;
        }

        value
    }

    pub fn eval(
        &self,
        inputs: &[f32],
        domain: &[f32],
        range: Option<&[f32]>,
    ) -> PdfResult<Vec<f32>> {
        let m = self.size.len();

        // map each input into the sample grid
        let mut grid = Vec::with_capacity(m);

        for i in 0..m {
            let x = inputs.get(i).copied().unwrap_or(0.0);
            let d_min = domain.get(i * 2).copied().unwrap_or(0.0);
            let d_max = domain.get(i * 2 + 1).copied().unwrap_or(1.0);
            let e_min = self.encode.get(i * 2).copied().unwrap_or(0.0);
            let e_max = self
                .encode
                .get(i * 2 + 1)
                .copied()
                .unwrap_or(self.size[i] as f32 - 1.0);

            let e = interpolate(x, d_min, d_max, e_min, e_max)
                .clamp(0.0, (self.size[i] - 1) as f32);

            grid.push(e);
        }

        let _ = self.order;

        let max_raw = if self.bits_per_sample as usize == 32 {
            u32::MAX as f32
        } else {
            ((1u64 << self.bits_per_sample as usize) - 1) as f32
        };

        let mut outputs = Vec::with_capacity(self.output_count);

        for j in 0..self.output_count {
            // multilinear interpolation over the 2^m surrounding corners
            let mut acc = 0.0f32;

            for corner in 0..(1usize << m) {
                let mut weight = 1.0f32;
                let mut flat = 0usize;
                let mut stride = 1usize;

                for i in 0..m {
                    let floor = grid[i].floor() as usize;
                    let frac = grid[i] - floor as f32;

                    let (idx, w) = if corner & (1 << i) == 0 {
                        (floor, 1.0 - frac)
                    } else {
                        ((floor + 1).min(self.size[i] as usize - 1), frac)
                    };

                    weight *= w;
                    flat += idx * stride;
                    stride *= self.size[i] as usize;
                }

                if weight > 0.0 {
                    acc += weight * self.raw_sample(flat, j) as f32;
                }
            }

            let (d_min, d_max) = match (self.decode.get(j * 2), self.decode.get(j * 2 + 1)) {
                (Some(&lo), Some(&hi)) => (lo, hi),
                _ => match range {
                    Some(range) => (
                        range.get(j * 2).copied().unwrap_or(0.0),
                        range.get(j * 2 + 1).copied().unwrap_or(1.0),
                    ),
                    None => (0.0, max_raw),
                },
            };

            outputs.push(interpolate(acc, 0.0, max_raw, d_min, d_max));
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{objects::{Dictionary, Object}, resolve::NoResolve, stream::StreamDict};
    use std::collections::HashMap;

    fn sampled(entries: Vec<(&str, Object)>, data: Vec<u8>) -> SampledFunction {
        let dict = Dictionary::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<HashMap<_, _>>(),
        );

        let stream = Stream {
            dict: StreamDict {
                len: Some(data.len()),
                filter: None,
                decode_parms: None,
                other: dict,
            },
            stream: data,
        };

        SampledFunction::from_stream(stream, &mut NoResolve).unwrap()
    }

    fn arr(values: &[f32]) -> Object {
        Object::Array(values.iter().map(|&v| Object::Real(v)).collect())
    }

    #[test]
    fn linear_ramp_interpolates() {
        // 1-in 1-out, two 8-bit samples: 0 and 255
        let function = sampled(
            vec![
                ("Size", Object::Array(vec![Object::Integer(2)])),
                ("BitsPerSample", Object::Integer(8)),
                ("Decode", arr(&[0.0, 1.0])),
            ],
            vec![0, 255],
        );

        let out = function.eval(&[0.5], &[0.0, 1.0], None).unwrap();
        assert!((out[0] - 0.5).abs() < 1e-3);

        let out = function.eval(&[1.0], &[0.0, 1.0], None).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn two_outputs_interleave() {
        // entries are (out0, out1) pairs: (0, 255) then (255, 0)
        let function = sampled(
            vec![
                ("Size", Object::Array(vec![Object::Integer(2)])),
                ("BitsPerSample", Object::Integer(8)),
                ("Decode", arr(&[0.0, 1.0, 0.0, 1.0])),
            ],
            vec![0, 255, 255, 0],
        );

        let out = function.eval(&[0.0], &[0.0, 1.0], None).unwrap();
        assert_eq!(out, vec![0.0, 1.0]);

        let out = function.eval(&[1.0], &[0.0, 1.0], None).unwrap();
        assert_eq!(out, vec![1.0, 0.0]);
    }

    #[test]
    fn bilinear_grid() {
        // 2-in 1-out over a 2x2 grid: values 0, 100, 200, 255 at the corners
        let function = sampled(
            vec![
                (
                    "Size",
                    Object::Array(vec![Object::Integer(2), Object::Integer(2)]),
                ),
                ("BitsPerSample", Object::Integer(8)),
                ("Decode", arr(&[0.0, 255.0])),
            ],
            vec![0, 100, 200, 255],
        );

        // corners map exactly
        let out = function
            .eval(&[0.0, 0.0], &[0.0, 1.0, 0.0, 1.0], None)
            .unwrap();
        assert!((out[0] - 0.0).abs() < 1e-3);

        let out = function
            .eval(&[1.0, 1.0], &[0.0, 1.0, 0.0, 1.0], None)
            .unwrap();
        assert!((out[0] - 255.0).abs() < 1e-3);

        // center is the mean of all four corners
        let out = function
            .eval(&[0.5, 0.5], &[0.0, 1.0, 0.0, 1.0], None)
            .unwrap();
        assert!((out[0] - 138.75).abs() < 1e-2);
    }

    #[test]
    fn sub_byte_samples() {
        // 4-bit samples 0x0 and 0xF packed into one byte
        let function = sampled(
            vec![
                ("Size", Object::Array(vec![Object::Integer(2)])),
                ("BitsPerSample", Object::Integer(4)),
                ("Decode", arr(&[0.0, 1.0])),
            ],
            vec![0x0F],
        );

        let out = function.eval(&[1.0], &[0.0, 1.0], None).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-6);
    }
}
