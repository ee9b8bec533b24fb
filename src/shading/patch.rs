use crate::{error::PdfResult, geometry::Point, objects::Dictionary, Resolve};

use super::{
    mesh::{BitsPerComponent, BitsPerCoordinate, BitsPerFlag, MeshTriangle},
    ShadingFunction,
};

use super::mesh::MeshBitReader;

/// Types 6 and 7 (Coons and tensor-product patch meshes) share one decoder:
/// a tensor patch is a Coons patch with four extra interior control points.
///
/// Patches are tessellated into two corner triangles per patch; the
/// interior control points shape only the surface between corners, which
/// this approximation flattens
#[derive(Debug)]
pub struct PatchMeshShading {
    /// The number of bits used to represent each geometric coordinate
    bits_per_coordinate: BitsPerCoordinate,

    /// The number of bits used to represent each colour component
    bits_per_component: BitsPerComponent,

    /// The number of bits used to represent the edge flag for each patch
    bits_per_flag: BitsPerFlag,

    /// An array of numbers specifying how to map coordinates and colour
    /// components into the appropriate ranges:
    ///
    /// [xmin xmax ymin ymax c1,min c1,max ... cn,min cn,max]
    decode: Vec<f32>,

    function: Option<ShadingFunction>,

    /// Sixteen control points per tensor patch, twelve per Coons patch
    is_tensor: bool,

    data: Vec<u8>,

    color_space_components: usize,
}

#[derive(Debug, Clone)]
struct Patch {
    /// The twelve boundary control points in the standard edge ordering;
    /// corners are points 0, 3, 6, and 9
    points: [Point; 12],
    /// Corner colors, one per corner starting at point 0
    colors: [Vec<f32>; 4],
}

impl PatchMeshShading {
    pub fn from_dict(
        dict: &mut Dictionary,
        data: Vec<u8>,
        color_space_components: usize,
        is_tensor: bool,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Self> {
        let bits_per_coordinate =
            BitsPerCoordinate::from_integer(dict.expect_integer("BitsPerCoordinate", resolver)?)?;
        let bits_per_component =
            BitsPerComponent::from_integer(dict.expect_integer("BitsPerComponent", resolver)?)?;
        let bits_per_flag =
            BitsPerFlag::from_integer(dict.expect_integer("BitsPerFlag", resolver)?)?;
        let decode = dict.expect::<Vec<f32>>("Decode", resolver)?;
        let function = ShadingFunction::from_dict(dict, resolver)?;

        Ok(Self {
            bits_per_coordinate,
            bits_per_component,
            bits_per_flag,
            decode,
            function,
            is_tensor,
            data,
            color_space_components,
        })
    }

    fn color_components(&self) -> usize {
        if self.function.is_some() {
            1
        } else {
            self.color_space_components
        }
    }

    fn decode_point(&self, reader: &mut MeshBitReader) -> Option<Point> {
        let bits = self.bits_per_coordinate as u32;

        let x_raw = reader.read(bits)?;
        let y_raw = reader.read(bits)?;

        let max_raw = if bits >= 32 {
            u32::MAX as f32
        } else {
            ((1u64 << bits) - 1) as f32
        };

        let decode_at = |i: usize| self.decode.get(i).copied().unwrap_or(0.0);

        Some(Point::new(
            decode_at(0) + x_raw as f32 * (decode_at(1) - decode_at(0)) / max_raw,
            decode_at(2) + y_raw as f32 * (decode_at(3) - decode_at(2)) / max_raw,
        ))
    }

    fn decode_color(&self, reader: &mut MeshBitReader) -> Option<Vec<f32>> {
        let bits = self.bits_per_component as u32;
        let max_raw = ((1u64 << bits) - 1) as f32;

        (0..self.color_components())
            .map(|i| {
                let raw = reader.read(bits)?;
                let min = self.decode.get(4 + i * 2).copied().unwrap_or(0.0);
                let max = self.decode.get(5 + i * 2).copied().unwrap_or(1.0);

                Some(min + raw as f32 * (max - min) / max_raw)
            })
            .collect()
    }

    /// Decode the patch stream. A new-patch flag carries every control
    /// point and all four corner colors; flags 1 through 3 inherit one edge
    /// (four control points and two colors) from the previous patch
    fn patches(&self) -> PdfResult<Vec<Patch>> {
        let mut reader = MeshBitReader::new(&self.data);
        let flag_bits = self.bits_per_flag as u32;

        let new_points = |flag_is_new: bool| if self.is_tensor {
            if flag_is_new { 16 } else { 12 }
        } else if flag_is_new {
            12
        } else {
            8
        };

        let mut patches: Vec<Patch> = Vec::new();

        loop {
            reader.byte_align();

            if reader.at_end() {
                break;
            }

            let flag = match reader.read(flag_bits) {
                Some(flag) => flag & 0b11,
                None => break,
            };

            // the inherited edge of the previous patch: four control points
            // and the two colors at its ends
            let inherited = if flag == 0 {
                None
            } else {
                let previous = match patches.last() {
                    Some(previous) => previous,
                    None => anyhow::bail!("patch edge flag with no previous patch"),
                };

                let p = &previous.points;
                let c = &previous.colors;

                Some(match flag {
                    1 => ([p[3], p[4], p[5], p[6]], [c[1].clone(), c[2].clone()]),
                    2 => ([p[6], p[7], p[8], p[9]], [c[2].clone(), c[3].clone()]),
                    _ => ([p[9], p[10], p[11], p[0]], [c[3].clone(), c[0].clone()]),
                })
            };

            let fresh_count = new_points(flag == 0);
            let mut fresh = Vec::with_capacity(fresh_count);

            for _ in 0..fresh_count {
                match self.decode_point(&mut reader) {
                    Some(point) => fresh.push(point),
                    None => return Ok(patches),
                }
            }

            let mut points = [Point::origin(); 12];
            let mut colors: [Vec<f32>; 4] = Default::default();

            match inherited {
                None => {
                    points.copy_from_slice(&fresh[..12]);

                    for slot in colors.iter_mut() {
                        *slot = match self.decode_color(&mut reader) {
                            Some(color) => color,
                            None => return Ok(patches),
                        };
                    }
                }
                Some((edge, [c0, c1])) => {
                    points[..4].copy_from_slice(&edge);
                    points[4..12].copy_from_slice(&fresh[..8]);

                    colors[0] = c0;
                    colors[1] = c1;

                    for slot in colors.iter_mut().skip(2) {
                        *slot = match self.decode_color(&mut reader) {
                            Some(color) => color,
                            None => return Ok(patches),
                        };
                    }
                }
            }

            // tensor interior points beyond the twelve boundary points do
            // not participate in the corner tessellation

            patches.push(Patch { points, colors });
        }

        Ok(patches)
    }

    /// Tessellate into two triangles per patch over the four corners
    pub fn triangles(&self) -> PdfResult<Vec<MeshTriangle>> {
        let mut triangles = Vec::new();

        for patch in self.patches()? {
            let corners = [
                patch.points[0],
                patch.points[3],
                patch.points[6],
                patch.points[9],
            ];

            let colors = match &self.function {
                Some(function) => {
                    let mut mapped: [Vec<f32>; 4] = Default::default();
                    for (slot, color) in mapped.iter_mut().zip(patch.colors.iter()) {
                        *slot = function.eval(color.first().copied().unwrap_or(0.0))?;
                    }
                    mapped
                }
                None => patch.colors.clone(),
            };

            triangles.push(MeshTriangle {
                points: [corners[0], corners[1], corners[2]],
                colors: [colors[0].clone(), colors[1].clone(), colors[2].clone()],
            });
            triangles.push(MeshTriangle {
                points: [corners[0], corners[2], corners[3]],
                colors: [colors[0].clone(), colors[2].clone(), colors[3].clone()],
            });
        }

        Ok(triangles)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{objects::Object, resolve::NoResolve};
    use std::collections::HashMap;

    #[test]
    fn coons_patch_corner_tessellation() {
        let mut dict = Dictionary::new(
            [
                ("BitsPerCoordinate".to_owned(), Object::Integer(8)),
                ("BitsPerComponent".to_owned(), Object::Integer(8)),
                ("BitsPerFlag".to_owned(), Object::Integer(8)),
                (
                    "Decode".to_owned(),
                    Object::Array(
                        [0.0, 255.0, 0.0, 255.0, 0.0, 1.0]
                            .iter()
                            .map(|&v| Object::Real(v))
                            .collect(),
                    ),
                ),
            ]
            .into_iter()
            .collect::<HashMap<_, _>>(),
        );

        // flag 0, twelve control points tracing a unit-ish square with
        // corners at 0, 3, 6, 9, then four gray corner colors
        let mut data = vec![0u8];
        let square: [(u8, u8); 12] = [
            (0, 0),
            (3, 0),
            (7, 0),
            (10, 0),
            (10, 3),
            (10, 7),
            (10, 10),
            (7, 10),
            (3, 10),
            (0, 10),
            (0, 7),
            (0, 3),
        ];
        for (x, y) in square {
            data.push(x);
            data.push(y);
        }
        data.extend([0, 85, 170, 255]);

        let shading =
            PatchMeshShading::from_dict(&mut dict, data, 1, false, &mut NoResolve).unwrap();

        let triangles = shading.triangles().unwrap();

        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[0].points[0], Point::new(0.0, 0.0));
        assert_eq!(triangles[0].points[1], Point::new(10.0, 0.0));
        assert_eq!(triangles[0].points[2], Point::new(10.0, 10.0));
        assert_eq!(triangles[1].points[2], Point::new(0.0, 10.0));
        assert_eq!(triangles[1].colors[2], vec![1.0]);
    }
}
