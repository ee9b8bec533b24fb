use once_cell::sync::Lazy;

/// `BASIS[u][x] = C(u) * cos((2x + 1) * u * PI / 16)` with
/// `C(0) = 1/sqrt(2)`, `C(u) = 1` otherwise
static BASIS: Lazy<[[f32; 8]; 8]> = Lazy::new(|| {
    let mut basis = [[0.0f32; 8]; 8];

    for (u, row) in basis.iter_mut().enumerate() {
        let scale = if u == 0 {
            1.0 / std::f32::consts::SQRT_2
        } else {
            1.0
        };

        for (x, value) in row.iter_mut().enumerate() {
            *value = scale
                * ((2.0 * x as f32 + 1.0) * u as f32 * std::f32::consts::PI / 16.0).cos();
        }
    }

    basis
});

fn clamp_level(value: f32) -> u8 {
    // +128 level shift per JFIF
    (value + 128.5).clamp(0.0, 255.0) as u8
}

/// Inverse 8x8 DCT over dequantized coefficients in natural (row-major)
/// order, producing level-shifted samples
pub fn inverse_dct(coefficients: &[i32; 64], out: &mut [u8; 64]) {
    // DC-only fast path: a uniform block
    if coefficients[1..].iter().all(|&c| c == 0) {
        let level = clamp_level(coefficients[0] as f32 / 8.0);
        out.fill(level);
        return;
    }

    let basis = &*BASIS;

    // columns first: g[u][y] = sum_v basis[v][y] * F(u, v)
    let mut g = [[0.0f32; 8]; 8];

    for u in 0..8 {
        for y in 0..8 {
            let mut acc = 0.0;
            for v in 0..8 {
                let coefficient = coefficients[v * 8 + u];
                if coefficient != 0 {
                    acc += basis[v][y] * coefficient as f32;
                }
            }
            g[u][y] = acc;
        }
    }

    for y in 0..8 {
        for x in 0..8 {
            let mut acc = 0.0;
            for u in 0..8 {
                acc += basis[u][x] * g[u][y];
            }

            out[y * 8 + x] = clamp_level(acc / 4.0);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Forward DCT reference, used only to validate the inverse
    fn forward_dct(samples: &[f32; 64]) -> [f32; 64] {
        let basis = &*BASIS;
        let mut out = [0.0f32; 64];

        for v in 0..8 {
            for u in 0..8 {
                let mut acc = 0.0;
                for y in 0..8 {
                    for x in 0..8 {
                        acc += samples[y * 8 + x] * basis[u][x] * basis[v][y];
                    }
                }
                out[v * 8 + u] = acc / 4.0;
            }
        }

        out
    }

    #[test]
    fn dc_only_block_is_uniform() {
        let mut coefficients = [0i32; 64];
        coefficients[0] = 32;

        let mut out = [0u8; 64];
        inverse_dct(&coefficients, &mut out);

        assert!(out.iter().all(|&s| s == 132));
    }

    #[test]
    fn zero_block_is_mid_gray() {
        let mut out = [0u8; 64];
        inverse_dct(&[0; 64], &mut out);

        assert!(out.iter().all(|&s| s == 128));
    }

    #[test]
    fn forward_then_inverse_recovers_samples() {
        let mut samples = [0.0f32; 64];
        for (i, s) in samples.iter_mut().enumerate() {
            // a gradient with some texture
            *s = ((i % 8) as f32 * 20.0 + (i / 8) as f32 * 7.0) % 256.0 - 128.0;
        }

        let frequency = forward_dct(&samples);
        let coefficients: Vec<i32> = frequency.iter().map(|&f| f.round() as i32).collect();

        let mut out = [0u8; 64];
        inverse_dct(&coefficients.try_into().unwrap(), &mut out);

        for (i, &recovered) in out.iter().enumerate() {
            let expected = samples[i] + 128.0;
            // coefficient rounding costs at most a couple of levels
            assert!(
                (recovered as f32 - expected).abs() <= 2.0,
                "sample {}: {} vs {}",
                i,
                recovered,
                expected
            );
        }
    }
}
