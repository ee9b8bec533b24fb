use crate::error::PdfResult;

use super::{
    parse::{LutKind, LutPipeline, TagDataParser},
    sig, IccProfile,
};

pub const D50_WHITE: [f32; 3] = [0.96422, 1.0, 0.82491];
pub const D65_WHITE: [f32; 3] = [0.95047, 1.0, 1.08883];

/// The Bradford cone-response matrix used for chromatic adaptation between
/// white points
const BRADFORD: [[f32; 3]; 3] = [
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
];

const BRADFORD_INVERSE: [[f32; 3]; 3] = [
    [0.9869929, -0.1470543, 0.1599627],
    [0.4323053, 0.5183603, 0.0492912],
    [-0.0085287, 0.0400428, 0.9684867],
];

/// XYZ (D65) to linear sRGB
const XYZ_TO_LINEAR_SRGB: [[f32; 3]; 3] = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

/// A one-dimensional tone-reproduction curve
#[derive(Debug, Clone)]
pub enum Curve {
    Identity,
    Gamma(f32),
    /// Uniformly sampled values in [0, 1], linearly interpolated
    Sampled(Vec<f32>),
    /// ICC 'para' curve types 0 through 4 with parameters
    /// [g, a, b, c, d, e, f]
    Parametric { ty: u16, params: [f32; 7] },
}

impl Curve {
    pub fn eval(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);

        match self {
            Curve::Identity => x,
            Curve::Gamma(g) => x.powf(*g),
            Curve::Sampled(values) => match values.len() {
                0 => x,
                1 => values[0],
                len => {
                    let pos = x * (len - 1) as f32;
                    let idx = (pos.floor() as usize).min(len - 2);
                    let frac = pos - idx as f32;

                    values[idx] * (1.0 - frac) + values[idx + 1] * frac
                }
            },
            Curve::Parametric { ty, params } => {
                let [g, a, b, c, d, e, f] = *params;

                match ty {
                    0 => x.powf(g),
                    1 => {
                        if x >= -b / a {
                            (a * x + b).powf(g)
                        } else {
                            0.0
                        }
                    }
                    2 => {
                        if x >= -b / a {
                            (a * x + b).powf(g) + c
                        } else {
                            c
                        }
                    }
                    3 => {
                        if x >= d {
                            (a * x + b).powf(g)
                        } else {
                            c * x
                        }
                    }
                    4 => {
                        if x >= d {
                            (a * x + b).powf(g) + e
                        } else {
                            c * x + f
                        }
                    }
                    _ => x,
                }
            }
        }
    }
}

/// A multi-dimensional color lookup table with per-dimension grid sizes and
/// interleaved outputs. The first input channel varies least rapidly
#[derive(Debug, Clone)]
pub struct Clut {
    pub inputs: usize,
    pub outputs: usize,
    pub grid: Vec<u8>,
    pub table: Vec<f32>,
}

impl Clut {
    /// N-linear interpolation over the 2^n cell corners surrounding the
    /// input point
    pub fn eval(&self, input: &[f32; 4], output: &mut [f32; 4]) {
        let n = self.inputs.min(4);

        let mut grid_pos = [0.0f32; 4];
        for i in 0..n {
            let points = self.grid[i] as f32 - 1.0;
            grid_pos[i] = input[i].clamp(0.0, 1.0) * points;
        }

        output.fill(0.0);

        for corner in 0..(1usize << n) {
            let mut weight = 1.0f32;
            let mut flat = 0usize;

            for i in 0..n {
                let floor = grid_pos[i].floor() as usize;
                let frac = grid_pos[i] - floor as f32;
                let size = self.grid[i] as usize;

                let (idx, w) = if corner & (1 << i) == 0 {
                    (floor, 1.0 - frac)
                } else {
                    ((floor + 1).min(size - 1), frac)
                };

                weight *= w;
                // first input channel varies least rapidly
                flat = flat * size + idx;
            }

            if weight == 0.0 {
                continue;
            }

            let base = flat * self.outputs;
            for j in 0..self.outputs.min(4) {
                if let Some(&value) = self.table.get(base + j) {
                    output[j] += weight * value;
                }
            }
        }
    }
}

/// One step of a color transform chain
#[derive(Debug, Clone)]
pub enum Stage {
    /// Per-channel tone-reproduction curves
    Curves(Vec<Curve>),
    /// A 3x3 matrix with offset over the first three channels
    Matrix([[f32; 3]; 3], [f32; 3]),
    Clut(Clut),
    /// Decode PCS-normalized Lab and expand to XYZ.
    ///
    /// The conditional linear segment of the CIE transform near zero is
    /// intentionally approximated by the f^3 expansion alone, costing at
    /// most 0.03 in component value
    LabToXyz { white: [f32; 3] },
    /// XYZ (D65) to linear sRGB followed by parametric sRGB companding
    XyzToSrgb,
}

/// A compiled device-to-sRGB transform: a sequence of stages evaluated over
/// a padded float4
#[derive(Debug, Clone)]
pub struct ColorTransform {
    stages: Vec<Stage>,
    input_channels: usize,
}

fn mat_mul_vec(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn mat_mul(a: &[[f32; 3]; 3], b: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut out = [[0.0f32; 3]; 3];

    for (i, row) in out.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }

    out
}

/// The parametric sRGB companding curve:
/// V = 1.055 * L^(1/2.4) - 0.055 above the linear cutoff, 12.92 * L below
fn srgb_encode(linear: f32) -> f32 {
    let linear = linear.clamp(0.0, 1.0);

    if linear > 0.0031308 {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * linear
    }
}

/// Chromatic adaptation from `src` white to `dst` white via the Bradford
/// cone space
pub fn bradford_adaptation(src: [f32; 3], dst: [f32; 3]) -> [[f32; 3]; 3] {
    let src_cone = mat_mul_vec(&BRADFORD, src);
    let dst_cone = mat_mul_vec(&BRADFORD, dst);

    let scale = [
        [dst_cone[0] / src_cone[0], 0.0, 0.0],
        [0.0, dst_cone[1] / src_cone[1], 0.0],
        [0.0, 0.0, dst_cone[2] / src_cone[2]],
    ];

    mat_mul(&BRADFORD_INVERSE, &mat_mul(&scale, &BRADFORD))
}

impl ColorTransform {
    pub fn new(stages: Vec<Stage>, input_channels: usize) -> Self {
        Self {
            stages,
            input_channels,
        }
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    /// Map device components (padded to four) through the chain, producing
    /// companded sRGB in the first three channels
    pub fn eval(&self, input: [f32; 4]) -> [f32; 4] {
        let mut value = input;

        for stage in &self.stages {
            match stage {
                Stage::Curves(curves) => {
                    for (channel, curve) in value.iter_mut().zip(curves.iter()) {
                        *channel = curve.eval(*channel);
                    }
                }
                Stage::Matrix(matrix, offset) => {
                    let v = mat_mul_vec(matrix, [value[0], value[1], value[2]]);
                    value[0] = v[0] + offset[0];
                    value[1] = v[1] + offset[1];
                    value[2] = v[2] + offset[2];
                }
                Stage::Clut(clut) => {
                    let mut out = [0.0f32; 4];
                    clut.eval(&value, &mut out);
                    value = out;
                }
                Stage::LabToXyz { white } => {
                    let [l_norm, a_norm, b_norm] = [value[0], value[1], value[2]];

                    let l = l_norm * 100.0;
                    let a = a_norm * 255.0 - 128.0;
                    let b = b_norm * 255.0 - 128.0;

                    let fy = (l + 16.0) / 116.0;
                    let fx = fy + a / 500.0;
                    let fz = fy - b / 200.0;

                    value[0] = fx * fx * fx * white[0];
                    value[1] = fy * fy * fy * white[1];
                    value[2] = fz * fz * fz * white[2];
                }
                Stage::XyzToSrgb => {
                    let rgb = mat_mul_vec(&XYZ_TO_LINEAR_SRGB, [value[0], value[1], value[2]]);
                    value[0] = srgb_encode(rgb[0]);
                    value[1] = srgb_encode(rgb[1]);
                    value[2] = srgb_encode(rgb[2]);
                }
            }
        }

        value
    }

    /// Compile a device-to-sRGB transform for a profile.
    ///
    /// Matrix/TRC profiles chain curves and colorant matrix into PCS XYZ;
    /// N-channel profiles use the A2B element selected by intent. PCS
    /// values are adapted from the profile white point to D65 and companded
    /// to sRGB
    pub fn from_profile(profile: &IccProfile, intent: IccRenderingIntent) -> PdfResult<Self> {
        let channels = profile.channels();

        let white = profile
            .tag(sig::WHITE_POINT)
            .and_then(|entry| {
                let data = profile.tag_data(entry).ok()?;
                TagDataParser::new(data).parse_xyz().ok()
            })
            .unwrap_or(D50_WHITE);

        let mut stages = Vec::new();

        let pcs_is_lab = &profile.header.profile_connection_space.0 == b"Lab ";

        if let Some(pipeline) = lookup_a_to_b(profile, intent)? {
            push_lut_stages(&mut stages, pipeline);
        } else if channels == 1 {
            let gray_curve = parse_curve_tag(profile, sig::GRAY_TRC)?.unwrap_or(Curve::Identity);

            stages.push(Stage::Curves(vec![gray_curve]));
            // gray expands along the white point axis
            stages.push(Stage::Matrix(
                [
                    [white[0], 0.0, 0.0],
                    [white[1], 0.0, 0.0],
                    [white[2], 0.0, 0.0],
                ],
                [0.0; 3],
            ));
        } else if channels == 3 {
            let r_curve = parse_curve_tag(profile, sig::RED_TRC)?.unwrap_or(Curve::Identity);
            let g_curve = parse_curve_tag(profile, sig::GREEN_TRC)?.unwrap_or(Curve::Identity);
            let b_curve = parse_curve_tag(profile, sig::BLUE_TRC)?.unwrap_or(Curve::Identity);

            let r_col = parse_xyz_tag(profile, sig::RED_COLORANT)?;
            let g_col = parse_xyz_tag(profile, sig::GREEN_COLORANT)?;
            let b_col = parse_xyz_tag(profile, sig::BLUE_COLORANT)?;

            let (r_col, g_col, b_col) = match (r_col, g_col, b_col) {
                (Some(r), Some(g), Some(b)) => (r, g, b),
                _ => anyhow::bail!("rgb profile is missing colorant tags"),
            };

            stages.push(Stage::Curves(vec![r_curve, g_curve, b_curve]));
            stages.push(Stage::Matrix(
                [
                    [r_col[0], g_col[0], b_col[0]],
                    [r_col[1], g_col[1], b_col[1]],
                    [r_col[2], g_col[2], b_col[2]],
                ],
                [0.0; 3],
            ));
        } else {
            anyhow::bail!(
                "no A2B element for {}-channel profile",
                channels
            );
        }

        if pcs_is_lab {
            stages.push(Stage::LabToXyz { white });
        }

        // the PCS is relative to the profile white; absolute colorimetric
        // additionally scales by the white point, which collapses to the
        // same adaptation here
        stages.push(Stage::Matrix(bradford_adaptation(white, D65_WHITE), [0.0; 3]));
        stages.push(Stage::XyzToSrgb);

        Ok(Self::new(stages, channels))
    }
}

/// ICC-side rendering intents, numbered as in the profile header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IccRenderingIntent {
    Perceptual,
    RelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
}

fn lookup_a_to_b(
    profile: &IccProfile,
    intent: IccRenderingIntent,
) -> PdfResult<Option<LutPipeline>> {
    let preference = match intent {
        IccRenderingIntent::Perceptual => [sig::A_TO_B_0, sig::A_TO_B_1, sig::A_TO_B_2],
        IccRenderingIntent::RelativeColorimetric | IccRenderingIntent::AbsoluteColorimetric => {
            [sig::A_TO_B_1, sig::A_TO_B_0, sig::A_TO_B_2]
        }
        IccRenderingIntent::Saturation => [sig::A_TO_B_2, sig::A_TO_B_0, sig::A_TO_B_1],
    };

    for signature in preference {
        if let Some(entry) = profile.tag(signature) {
            let data = profile.tag_data(entry)?;
            let mut parser = TagDataParser::new(data);

            let pipeline = if data.starts_with(b"mAB ") {
                parser.parse_lut_a_to_b(data)?
            } else {
                parser.parse_legacy_lut()?
            };

            return Ok(Some(pipeline));
        }
    }

    Ok(None)
}

fn push_lut_stages(stages: &mut Vec<Stage>, pipeline: LutPipeline) {
    match pipeline.kind {
        LutKind::Legacy => {
            // input curves, matrix, CLUT, output curves
            if !pipeline.a_curves.is_empty() {
                stages.push(Stage::Curves(pipeline.a_curves));
            }
            if let Some((matrix, offset)) = pipeline.matrix {
                if matrix != [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
                    stages.push(Stage::Matrix(matrix, offset));
                }
            }
            if let Some(clut) = pipeline.clut {
                stages.push(Stage::Clut(clut));
            }
            if !pipeline.b_curves.is_empty() {
                stages.push(Stage::Curves(pipeline.b_curves));
            }
        }
        LutKind::MultiProcess => {
            // A-curves, CLUT, M-curves, matrix with offset, B-curves
            if !pipeline.a_curves.is_empty() {
                stages.push(Stage::Curves(pipeline.a_curves));
            }
            if let Some(clut) = pipeline.clut {
                stages.push(Stage::Clut(clut));
            }
            if !pipeline.m_curves.is_empty() {
                stages.push(Stage::Curves(pipeline.m_curves));
            }
            if let Some((matrix, offset)) = pipeline.matrix {
                stages.push(Stage::Matrix(matrix, offset));
            }
            if !pipeline.b_curves.is_empty() {
                stages.push(Stage::Curves(pipeline.b_curves));
            }
        }
    }
}

fn parse_curve_tag(
    profile: &IccProfile,
    signature: super::IccTagSignature,
) -> PdfResult<Option<Curve>> {
    match profile.tag(signature) {
        Some(entry) => {
            let data = profile.tag_data(entry)?;
            Ok(Some(TagDataParser::new(data).parse_curve()?))
        }
        None => Ok(None),
    }
}

fn parse_xyz_tag(
    profile: &IccProfile,
    signature: super::IccTagSignature,
) -> PdfResult<Option<[f32; 3]>> {
    match profile.tag(signature) {
        Some(entry) => {
            let data = profile.tag_data(entry)?;
            Ok(Some(TagDataParser::new(data).parse_xyz()?))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sampled_curve_interpolates() {
        let curve = Curve::Sampled(vec![0.0, 0.5, 1.0]);

        assert!((curve.eval(0.25) - 0.25).abs() < 1e-6);
        assert!((curve.eval(0.75) - 0.75).abs() < 1e-6);
        assert_eq!(curve.eval(1.0), 1.0);
    }

    #[test]
    fn parametric_srgb_curve() {
        // the sRGB EOTF as an ICC type 3 curve
        let curve = Curve::Parametric {
            ty: 3,
            params: [
                2.4,
                1.0 / 1.055,
                0.055 / 1.055,
                1.0 / 12.92,
                0.04045,
                0.0,
                0.0,
            ],
        };

        assert!(curve.eval(0.0).abs() < 1e-6);
        assert!((curve.eval(1.0) - 1.0).abs() < 1e-4);
        // below the cutoff the linear segment applies
        assert!((curve.eval(0.02) - 0.02 / 12.92).abs() < 1e-5);
    }

    #[test]
    fn clut_bilinear() {
        // 2-input, 1-output, 2x2 grid; first input varies least rapidly
        let clut = Clut {
            inputs: 2,
            outputs: 1,
            grid: vec![2, 2],
            table: vec![0.0, 0.25, 0.75, 1.0],
        };

        let mut out = [0.0f32; 4];

        clut.eval(&[0.0, 0.0, 0.0, 0.0], &mut out);
        assert!((out[0] - 0.0).abs() < 1e-6);

        clut.eval(&[1.0, 1.0, 0.0, 0.0], &mut out);
        assert!((out[0] - 1.0).abs() < 1e-6);

        clut.eval(&[0.5, 0.5, 0.0, 0.0], &mut out);
        assert!((out[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn xyz_to_srgb_white_and_black() {
        let transform = ColorTransform::new(vec![Stage::XyzToSrgb], 3);

        let white = transform.eval([D65_WHITE[0], D65_WHITE[1], D65_WHITE[2], 0.0]);
        assert!((white[0] - 1.0).abs() < 0.01);
        assert!((white[1] - 1.0).abs() < 0.01);
        assert!((white[2] - 1.0).abs() < 0.01);

        let black = transform.eval([0.0; 4]);
        assert!(black[0].abs() < 1e-6);
    }

    #[test]
    fn lab_white_maps_to_srgb_white() {
        let transform = ColorTransform::new(
            vec![
                Stage::LabToXyz { white: D50_WHITE },
                Stage::Matrix(bradford_adaptation(D50_WHITE, D65_WHITE), [0.0; 3]),
                Stage::XyzToSrgb,
            ],
            3,
        );

        // L* = 100, a* = b* = 0, PCS-normalized
        let white = transform.eval([1.0, 128.0 / 255.0, 128.0 / 255.0, 0.0]);

        assert!((white[0] - 1.0).abs() < 0.02);
        assert!((white[1] - 1.0).abs() < 0.02);
        assert!((white[2] - 1.0).abs() < 0.02);
    }

    #[test]
    fn bradford_identity_for_same_white() {
        let adaptation = bradford_adaptation(D65_WHITE, D65_WHITE);

        for (i, row) in adaptation.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((value - expected).abs() < 1e-4);
            }
        }
    }
}
