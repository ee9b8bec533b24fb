use crate::{error::PdfResult, geometry::Point, objects::Dictionary, Resolve};

use super::ShadingFunction;

/// A decoded mesh triangle: device-space-ready vertices with per-vertex
/// color components. Pixel colors inside the triangle are barycentric
/// interpolations of the vertex colors
#[derive(Debug, Clone)]
pub struct MeshTriangle {
    pub points: [Point; 3],
    pub colors: [Vec<f32>; 3],
}

#[pdf_enum(Integer)]
pub enum BitsPerCoordinate {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Twelve = 12,
    Sixteen = 16,
    TwentyFour = 24,
    ThirtyTwo = 32,
}

#[pdf_enum(Integer)]
pub enum BitsPerComponent {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Twelve = 12,
    Sixteen = 16,
}

#[pdf_enum(Integer)]
pub enum BitsPerFlag {
    Two = 2,
    Four = 4,
    Eight = 8,
}

/// Big-endian bit cursor over the mesh vertex stream. Construction is a
/// plain byte-slice borrow; position capture and resume are explicit so
/// decoding can be re-entered without hidden allocation
pub(crate) struct MeshBitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> MeshBitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    pub fn capture(&self) -> usize {
        self.bit_pos
    }

    pub fn resume(&mut self, bit_pos: usize) {
        self.bit_pos = bit_pos;
    }

    pub fn at_end(&self) -> bool {
        self.bit_pos >= self.data.len() * 8
    }

    pub fn read(&mut self, bits: u32) -> Option<u32> {
        if bits == 0 {
            return Some(0);
        }

        if self.bit_pos + bits as usize > self.data.len() * 8 {
            return None;
        }

        let mut value: u64 = 0;
        let mut read = 0u32;

        while read < bits {
            let byte_idx = self.bit_pos / 8;
            let bit_in_byte = self.bit_pos % 8;
            let take = ((8 - bit_in_byte) as u32).min(bits - read);

            let byte = self.data[byte_idx];
            let chunk =
                (u32::from(byte) >> (8 - bit_in_byte as u32 - take)) & ((1u32 << take) - 1);

            value = (value << take) | u64::from(chunk);
            self.bit_pos += take as usize;
            read += take;
        }

        Some(value as u32)
    }

    /// Vertices are byte-aligned: padding after each vertex is skipped
    pub fn byte_align(&mut self) {
        self.bit_pos = (self.bit_pos + 7) / 8 * 8;
    }
}

/// `value = min + raw * (max - min) / (2^bits - 1)`
fn decode_value(raw: u32, bits: u32, min: f32, max: f32) -> f32 {
    let max_raw = if bits >= 32 {
        u32::MAX as f32
    } else {
        ((1u64 << bits) - 1) as f32
    };

    min + raw as f32 * (max - min) / max_raw
}

/// The decode layout shared by both Gouraud mesh types:
/// [xmin xmax ymin ymax c1,min c1,max ... cn,min cn,max]
#[derive(Debug)]
struct VertexReader {
    bits_per_coordinate: BitsPerCoordinate,
    bits_per_component: BitsPerComponent,
    decode: Vec<f32>,
    color_components: usize,
}

#[derive(Debug, Clone)]
struct Vertex {
    point: Point,
    color: Vec<f32>,
}

impl VertexReader {
    /// Read (x, y, c1..cn). Returns `None` at end of data
    fn read_vertex(&self, reader: &mut MeshBitReader) -> Option<Vertex> {
        let coord_bits = self.bits_per_coordinate as u32;
        let component_bits = self.bits_per_component as u32;

        let x_raw = reader.read(coord_bits)?;
        let y_raw = reader.read(coord_bits)?;

        let x = decode_value(
            x_raw,
            coord_bits,
            self.decode.first().copied().unwrap_or(0.0),
            self.decode.get(1).copied().unwrap_or(1.0),
        );
        let y = decode_value(
            y_raw,
            coord_bits,
            self.decode.get(2).copied().unwrap_or(0.0),
            self.decode.get(3).copied().unwrap_or(1.0),
        );

        let mut color = Vec::with_capacity(self.color_components);

        for i in 0..self.color_components {
            let raw = reader.read(component_bits)?;
            color.push(decode_value(
                raw,
                component_bits,
                self.decode.get(4 + i * 2).copied().unwrap_or(0.0),
                self.decode.get(5 + i * 2).copied().unwrap_or(1.0),
            ));
        }

        Some(Vertex { point: Point::new(x, y), color })
    }
}

/// Type 4 shadings (free-form Gouraud-shaded triangle meshes) are commonly used to
/// represent complex coloured and shaded three-dimensional shapes. The area to be
/// shaded is defined by a path composed entirely of triangles. The colour at each
/// vertex of the triangles is specified, and a technique known as Gouraud interpolation
/// is used to colour the interiors
#[derive(Debug)]
pub struct FreeformShading {
    /// The number of bits used to represent each vertex coordinate.
    ///
    /// The value shall be 1, 2, 4, 8, 12, 16, 24, or 32
    bits_per_coordinate: BitsPerCoordinate,

    /// The number of bits used to represent each colour component.
    ///
    /// The value shall be 1, 2, 4, 8, 12, or 16
    bits_per_component: BitsPerComponent,

    /// The number of bits used to represent the edge flag for each vertex.
    /// The value of BitsPerFlag shall be 2, 4, or 8, but only the least
    /// significant 2 bits in each flag value shall be used. The value for
    /// the edge flag shall be 0, 1, or 2
    bits_per_flag: BitsPerFlag,

    /// An array of numbers specifying how to map vertex coordinates and colour
    /// components into the appropriate ranges of values. The ranges shall be
    /// specified as follows:
    ///
    /// [xmin xmax ymin ymax c1,min c1,max ... cn,min cn,max]
    ///
    /// Only one pair of c values shall be specified if a Function entry is present
    decode: Vec<f32>,

    function: Option<ShadingFunction>,

    data: Vec<u8>,

    color_space_components: usize,
}

impl FreeformShading {
    pub fn from_dict(
        dict: &mut Dictionary,
        data: Vec<u8>,
        color_space_components: usize,
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
            data,
            color_space_components,
        })
    }

    fn vertex_reader(&self) -> VertexReader {
        VertexReader {
            bits_per_coordinate: self.bits_per_coordinate,
            bits_per_component: self.bits_per_component,
            decode: self.decode.clone(),
            color_components: if self.function.is_some() {
                1
            } else {
                self.color_space_components
            },
        }
    }

    /// Decode the vertex stream into triangles.
    ///
    /// Flag 0 begins a new triangle and is followed by two more vertices
    /// whose flags are read but ignored. Flag 1 reuses (vb, vc) of the
    /// previous triangle; flag 2 reuses (va, vc)
    pub fn triangles(&self) -> PdfResult<Vec<MeshTriangle>> {
        let vertex_reader = self.vertex_reader();
        let mut reader = MeshBitReader::new(&self.data);
        let flag_bits = self.bits_per_flag as u32;

        let mut triangles = Vec::new();
        let mut previous: Option<[Vertex; 3]> = None;

        loop {
            reader.byte_align();

            if reader.at_end() {
                break;
            }

            let flag = match reader.read(flag_bits) {
                Some(flag) => flag & 0b11,
                None => break,
            };

            let next = match flag {
                0 => {
                    let va = match vertex_reader.read_vertex(&mut reader) {
                        Some(v) => v,
                        None => break,
                    };

                    reader.byte_align();
                    // the flags of the second and third vertices are read
                    // but ignored
                    if reader.read(flag_bits).is_none() {
                        break;
                    }
                    let vb = match vertex_reader.read_vertex(&mut reader) {
                        Some(v) => v,
                        None => break,
                    };

                    reader.byte_align();
                    if reader.read(flag_bits).is_none() {
                        break;
                    }
                    let vc = match vertex_reader.read_vertex(&mut reader) {
                        Some(v) => v,
                        None => break,
                    };

                    [va, vb, vc]
                }
                1 | 2 => {
                    let [va, vb, vc] = match previous {
                        Some(ref prev) => prev.clone(),
                        None => anyhow::bail!("mesh edge flag with no previous triangle"),
                    };

                    let new = match vertex_reader.read_vertex(&mut reader) {
                        Some(v) => v,
                        None => break,
                    };

                    if flag == 1 {
                        [vb, vc, new]
                    } else {
                        [va, vc, new]
                    }
                }
                _ => anyhow::bail!("invalid mesh edge flag {}", flag),
            };

            triangles.push(self.to_triangle(&next)?);
            previous = Some(next);
        }

        Ok(triangles)
    }

    fn to_triangle(&self, vertices: &[Vertex; 3]) -> PdfResult<MeshTriangle> {
        let mut colors: [Vec<f32>; 3] = Default::default();

        for (slot, vertex) in colors.iter_mut().zip(vertices.iter()) {
            *slot = match &self.function {
                Some(function) => function.eval(vertex.color.first().copied().unwrap_or(0.0))?,
                None => vertex.color.clone(),
            };
        }

        Ok(MeshTriangle {
            points: [vertices[0].point, vertices[1].point, vertices[2].point],
            colors,
        })
    }
}

/// Type 5 shadings (lattice-form Gouraud-shaded triangle meshes) are similar to type
/// 4, but instead of using freeform geometry, their vertices are arranged in a
/// pseudorectangular lattice, which is topologically equivalent to a rectangular
/// grid. The vertices are organized into rows, which need not be geometrically linear
#[derive(Debug)]
pub struct LatticeformShading {
    /// The number of bits used to represent each vertex coordinate.
    ///
    /// The value shall be 1, 2, 4, 8, 12, 16, 24, or 32
    bits_per_coordinate: BitsPerCoordinate,

    /// The number of bits used to represent each colour component.
    ///
    /// The value shall be 1, 2, 4, 8, 12, or 16
    bits_per_component: BitsPerComponent,

    /// The number of vertices in each row of the lattice; the value shall be
    /// greater than or equal to 2. The number of rows need not be specified
    vertices_per_row: u32,

    /// An array of numbers specifying how to map vertex coordinates and colour
    /// components into the appropriate ranges of values:
    ///
    /// [xmin xmax ymin ymax c1,min c1,max ... cn,min cn,max]
    ///
    /// Only one pair of c values shall be specified if a Function entry is
    /// present
    decode: Vec<f32>,

    /// A 1-in, n-out function or an array of n 1-in, 1-out functions (where n is
    /// the number of colour components in the shading dictionary's colour space).
    /// If this entry is present, the colour data for each vertex shall be specified
    /// by a single parametric variable rather than by n separate colour components
    function: Option<ShadingFunction>,

    data: Vec<u8>,

    color_space_components: usize,
}

impl LatticeformShading {
    pub fn from_dict(
        dict: &mut Dictionary,
        data: Vec<u8>,
        color_space_components: usize,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Self> {
        let bits_per_coordinate =
            BitsPerCoordinate::from_integer(dict.expect_integer("BitsPerCoordinate", resolver)?)?;
        let bits_per_component =
            BitsPerComponent::from_integer(dict.expect_integer("BitsPerComponent", resolver)?)?;
        let vertices_per_row = dict.expect_unsigned_integer("VerticesPerRow", resolver)?;
        let decode = dict.expect::<Vec<f32>>("Decode", resolver)?;
        let function = ShadingFunction::from_dict(dict, resolver)?;

        anyhow::ensure!(vertices_per_row >= 2, "lattice rows need at least two vertices");

        Ok(Self {
            bits_per_coordinate,
            bits_per_component,
            vertices_per_row,
            decode,
            function,
            data,
            color_space_components,
        })
    }

    /// Decode the lattice into triangles: each cell of the grid emits
    /// (idx0, idx1, idx2) and (idx1, idx3, idx2)
    pub fn triangles(&self) -> PdfResult<Vec<MeshTriangle>> {
        let vertex_reader = VertexReader {
            bits_per_coordinate: self.bits_per_coordinate,
            bits_per_component: self.bits_per_component,
            decode: self.decode.clone(),
            color_components: if self.function.is_some() {
                1
            } else {
                self.color_space_components
            },
        };

        let mut reader = MeshBitReader::new(&self.data);
        let columns = self.vertices_per_row as usize;

        let mut rows: Vec<Vec<Vertex>> = Vec::new();

        'outer: loop {
            let mut row = Vec::with_capacity(columns);

            for _ in 0..columns {
                reader.byte_align();

                match vertex_reader.read_vertex(&mut reader) {
                    Some(vertex) => row.push(vertex),
                    None => break 'outer,
                }
            }

            rows.push(row);
        }

        let mut triangles = Vec::new();

        for pair in rows.windows(2) {
            let (top, bottom) = (&pair[0], &pair[1]);

            for i in 0..columns - 1 {
                let idx0 = &top[i];
                let idx1 = &top[i + 1];
                let idx2 = &bottom[i];
                let idx3 = &bottom[i + 1];

                triangles.push(self.to_triangle([idx0, idx1, idx2])?);
                triangles.push(self.to_triangle([idx1, idx3, idx2])?);
            }
        }

        Ok(triangles)
    }

    fn to_triangle(&self, vertices: [&Vertex; 3]) -> PdfResult<MeshTriangle> {
        let mut colors: [Vec<f32>; 3] = Default::default();

        for (slot, vertex) in colors.iter_mut().zip(vertices.iter()) {
            *slot = match &self.function {
                Some(function) => function.eval(vertex.color.first().copied().unwrap_or(0.0))?,
                None => vertex.color.clone(),
            };
        }

        Ok(MeshTriangle {
            points: [vertices[0].point, vertices[1].point, vertices[2].point],
            colors,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{objects::Object, resolve::NoResolve};
    use std::collections::HashMap;

    fn mesh_dict(entries: Vec<(&str, Object)>) -> Dictionary {
        Dictionary::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn decode_arr() -> Object {
        Object::Array(
            [0.0, 255.0, 0.0, 255.0, 0.0, 1.0]
                .iter()
                .map(|&v| Object::Real(v))
                .collect(),
        )
    }

    /// One vertex is flag(8) + x(8) + y(8) + gray(8) with the decode array
    /// mapping coordinates to themselves
    fn freeform(data: Vec<u8>) -> FreeformShading {
        FreeformShading::from_dict(
            &mut mesh_dict(vec![
                ("BitsPerCoordinate", Object::Integer(8)),
                ("BitsPerComponent", Object::Integer(8)),
                ("BitsPerFlag", Object::Integer(8)),
                ("Decode", decode_arr()),
            ]),
            data,
            1,
            &mut NoResolve,
        )
        .unwrap()
    }

    #[test]
    fn freeform_new_triangle() {
        // flag 0, then three vertices with flags on the trailing two
        let data = vec![
            0, 0, 0, 0, // flag 0, vertex (0, 0) gray 0
            0, 10, 0, 255, // ignored flag, vertex (10, 0) gray 1
            0, 0, 10, 128, // ignored flag, vertex (0, 10) gray ~0.5
        ];

        let triangles = freeform(data).triangles().unwrap();

        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0].points[1], Point::new(10.0, 0.0));
        assert_eq!(triangles[0].colors[1], vec![1.0]);
    }

    #[test]
    fn freeform_edge_reuse() {
        let data = vec![
            0, 0, 0, 0, //
            0, 10, 0, 255, //
            0, 0, 10, 128, //
            // flag 1: reuse (vb, vc)
            1, 10, 10, 255, //
            // flag 2: reuse (va, vc) of the previous triangle
            2, 20, 20, 0, //
        ];

        let triangles = freeform(data).triangles().unwrap();

        assert_eq!(triangles.len(), 3);

        // triangle 2 is (vb, vc, new) of triangle 1
        assert_eq!(triangles[1].points[0], Point::new(10.0, 0.0));
        assert_eq!(triangles[1].points[1], Point::new(0.0, 10.0));
        assert_eq!(triangles[1].points[2], Point::new(10.0, 10.0));

        // triangle 3 is (va, vc, new) of triangle 2
        assert_eq!(triangles[2].points[0], Point::new(10.0, 0.0));
        assert_eq!(triangles[2].points[1], Point::new(10.0, 10.0));
        assert_eq!(triangles[2].points[2], Point::new(20.0, 20.0));
    }

    #[test]
    fn lattice_emits_two_triangles_per_cell() {
        let shading = LatticeformShading::from_dict(
            &mut mesh_dict(vec![
                ("BitsPerCoordinate", Object::Integer(8)),
                ("BitsPerComponent", Object::Integer(8)),
                ("VerticesPerRow", Object::Integer(2)),
                ("Decode", decode_arr()),
            ]),
            vec![
                0, 0, 0, // (0, 0)
                10, 0, 255, // (10, 0)
                0, 10, 0, // (0, 10)
                10, 10, 255, // (10, 10)
            ],
            1,
            &mut NoResolve,
        )
        .unwrap();

        let triangles = shading.triangles().unwrap();

        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[0].points[0], Point::new(0.0, 0.0));
        assert_eq!(triangles[1].points[0], Point::new(10.0, 0.0));
        assert_eq!(triangles[1].points[1], Point::new(10.0, 10.0));
        assert_eq!(triangles[1].points[2], Point::new(0.0, 10.0));
    }

    #[test]
    fn coordinate_decode_maps_range() {
        // raw 128 of 8 bits over [0, 255] is ~128
        assert!((decode_value(128, 8, 0.0, 255.0) - 128.0).abs() < 1e-4);
        // raw max maps to max
        assert_eq!(decode_value(255, 8, -1.0, 1.0), 1.0);
    }
}
