use crate::icc::{bradford_adaptation, ColorTransform, Curve, Stage, D65_WHITE};

/// Chromatic adaptation to D65 followed by sRGB companding, shared by the
/// CIE family builders
fn finish_to_srgb(stages: &mut Vec<Stage>, white: [f32; 3]) {
    stages.push(Stage::Matrix(bradford_adaptation(white, D65_WHITE), [0.0; 3]));
    stages.push(Stage::XyzToSrgb);
}

/// CalGray: a gamma against a reference white
#[derive(Debug, Clone, FromObj)]
pub struct CalGrayParams {
    /// An array of three numbers [XW YW ZW] specifying the tristimulus value,
    /// in the CIE 1931 XYZ space, of the diffuse white point. The numbers XW
    /// and ZW shall be positive, and YW shall be equal to 1.0
    #[field("WhitePoint")]
    white_point: [f32; 3],

    /// An array of three numbers [XB YB ZB] specifying the tristimulus value,
    /// in the CIE 1931 XYZ space, of the diffuse black point.
    ///
    /// Default value: [0.0 0.0 0.0]
    #[field("BlackPoint", default = [0.0; 3])]
    black_point: [f32; 3],

    /// A number defining the gamma for the gray (A) component. Gamma shall be
    /// positive and is generally greater than or equal to 1.
    ///
    /// Default value: 1
    #[field("Gamma", default = 1.0)]
    gamma: f32,
}

impl CalGrayParams {
    pub fn transform(&self) -> ColorTransform {
        let white = self.white_point;

        let mut stages = vec![
            Stage::Curves(vec![Curve::Gamma(self.gamma)]),
            // gray expands along the white point axis
            Stage::Matrix(
                [
                    [white[0], 0.0, 0.0],
                    [white[1], 0.0, 0.0],
                    [white[2], 0.0, 0.0],
                ],
                [0.0; 3],
            ),
        ];

        finish_to_srgb(&mut stages, white);

        ColorTransform::new(stages, 1)
    }
}

/// CalRGB: per-channel gammas and a colorant matrix into XYZ
#[derive(Debug, Clone, FromObj)]
pub struct CalRgbParams {
    #[field("WhitePoint")]
    white_point: [f32; 3],

    #[field("BlackPoint", default = [0.0; 3])]
    black_point: [f32; 3],

    /// An array of three numbers [GR GG GB] specifying the gamma for the red,
    /// green, and blue (A, B, and C) components of the colour space.
    ///
    /// Default value: [1.0 1.0 1.0]
    #[field("Gamma", default = [1.0; 3])]
    gamma: [f32; 3],

    /// An array of nine numbers [XA YA ZA XB YB ZB XC YC ZC] specifying the
    /// linear interpretation of the decoded A, B, and C components of the
    /// colour space with respect to the final XYZ representation.
    ///
    /// Default value: the identity matrix [1 0 0 0 1 0 0 0 1]
    #[field("Matrix", default = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])]
    matrix: [f32; 9],
}

impl CalRgbParams {
    pub fn transform(&self) -> ColorTransform {
        let m = &self.matrix;

        let mut stages = vec![
            Stage::Curves(vec![
                Curve::Gamma(self.gamma[0]),
                Curve::Gamma(self.gamma[1]),
                Curve::Gamma(self.gamma[2]),
            ]),
            // columns are the XYZ of each primary
            Stage::Matrix(
                [
                    [m[0], m[3], m[6]],
                    [m[1], m[4], m[7]],
                    [m[2], m[5], m[8]],
                ],
                [0.0; 3],
            ),
        ];

        finish_to_srgb(&mut stages, self.white_point);

        ColorTransform::new(stages, 3)
    }
}

/// Lab with declared a*/b* ranges
#[derive(Debug, Clone, FromObj)]
pub struct LabParams {
    #[field("WhitePoint")]
    white_point: [f32; 3],

    #[field("BlackPoint", default = [0.0; 3])]
    black_point: [f32; 3],

    /// An array of four numbers [amin amax bmin bmax] that shall specify the
    /// range of valid values for the a* and b* (B and C) components of the
    /// colour space.
    ///
    /// Default value: [-100 100 -100 100]
    #[field("Range", default = [-100.0, 100.0, -100.0, 100.0])]
    range: [f32; 4],
}

impl LabParams {
    /// Map raw (L, a, b) operands into the PCS-normalized encoding the
    /// transform chain expects
    pub fn normalize(&self, raw: &[f32]) -> Vec<f32> {
        let l = raw.first().copied().unwrap_or(0.0).clamp(0.0, 100.0);
        let a = raw
            .get(1)
            .copied()
            .unwrap_or(0.0)
            .clamp(self.range[0], self.range[1]);
        let b = raw
            .get(2)
            .copied()
            .unwrap_or(0.0)
            .clamp(self.range[2], self.range[3]);

        vec![l / 100.0, (a + 128.0) / 255.0, (b + 128.0) / 255.0]
    }

    pub fn transform(&self) -> ColorTransform {
        let mut stages = vec![Stage::LabToXyz {
            white: self.white_point,
        }];

        finish_to_srgb(&mut stages, self.white_point);

        ColorTransform::new(stages, 3)
    }

    /// The default image Decode array for Lab: the full L* range and the
    /// declared a*/b* ranges
    pub fn decode_default(&self) -> Vec<f32> {
        vec![
            0.0,
            100.0,
            self.range[0],
            self.range[1],
            self.range[2],
            self.range[3],
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cal_rgb_identity() -> CalRgbParams {
        CalRgbParams {
            white_point: D65_WHITE,
            black_point: [0.0; 3],
            gamma: [1.0; 3],
            matrix: [
                0.4124564, 0.2126729, 0.0193339, // red primary XYZ
                0.3575761, 0.7151522, 0.1191920, // green
                0.1804375, 0.0721750, 0.9503041, // blue
            ],
        }
    }

    #[test]
    fn cal_rgb_white_is_srgb_white() {
        let transform = cal_rgb_identity().transform();
        let white = transform.eval([1.0, 1.0, 1.0, 0.0]);

        assert!((white[0] - 1.0).abs() < 0.01);
        assert!((white[1] - 1.0).abs() < 0.01);
        assert!((white[2] - 1.0).abs() < 0.01);
    }

    #[test]
    fn cal_gray_black_is_black() {
        let params = CalGrayParams {
            white_point: D65_WHITE,
            black_point: [0.0; 3],
            gamma: 2.2,
        };

        let black = params.transform().eval([0.0; 4]);

        assert!(black[0] < 1.0 / 255.0);
        assert!(black[1] < 1.0 / 255.0);
        assert!(black[2] < 1.0 / 255.0);
    }

    #[test]
    fn lab_normalization_clamps_to_range() {
        let params = LabParams {
            white_point: D65_WHITE,
            black_point: [0.0; 3],
            range: [-100.0, 100.0, -100.0, 100.0],
        };

        let normalized = params.normalize(&[50.0, 0.0, 200.0]);

        assert!((normalized[0] - 0.5).abs() < 1e-6);
        assert!((normalized[1] - 0.5019608).abs() < 1e-6);
        // b* clamped to 100
        assert!((normalized[2] - (100.0 + 128.0) / 255.0).abs() < 1e-6);
    }
}
