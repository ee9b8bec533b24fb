use crate::error::PdfResult;

use super::{
    data_types::{F15Dot16, F8Dot8, XyzNumber},
    transform::{Clut, Curve},
    IccProfileHeader, IccTagSignature, IccTagTable, TagTableEntry,
};

pub(super) struct IccProfileParser<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> IccProfileParser<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    fn next(&mut self) -> anyhow::Result<u8> {
        self.buffer
            .get(self.cursor)
            .map(|b| {
                self.cursor += 1;
                *b
            })
            .ok_or(anyhow::anyhow!("unexpected eof"))
    }

    fn parse_u16(&mut self) -> anyhow::Result<u16> {
        let b1 = self.next()?;
        let b2 = self.next()?;

        Ok(u16::from_be_bytes([b1, b2]))
    }

    fn parse_u32(&mut self) -> anyhow::Result<u32> {
        let b1 = self.next()?;
        let b2 = self.next()?;
        let b3 = self.next()?;
        let b4 = self.next()?;

        Ok(u32::from_be_bytes([b1, b2, b3, b4]))
    }

    fn parse_i32(&mut self) -> anyhow::Result<i32> {
        Ok(self.parse_u32()? as i32)
    }

    fn parse_u64(&mut self) -> anyhow::Result<u64> {
        let hi = self.parse_u32()?;
        let lo = self.parse_u32()?;

        Ok((u64::from(hi) << 32) | u64::from(lo))
    }

    fn get_byte_range(&mut self, len: usize) -> anyhow::Result<&'a [u8]> {
        let buffer = self
            .buffer
            .get(self.cursor..(self.cursor + len))
            .ok_or(anyhow::anyhow!("unexpected eof"))?;
        self.cursor += len;
        Ok(buffer)
    }

    fn parse_array<const LEN: usize>(&mut self) -> anyhow::Result<[u8; LEN]> {
        let slice = self.get_byte_range(LEN)?;

        Ok(<[u8; LEN]>::try_from(slice)?)
    }

    fn parse_f15dot16(&mut self) -> PdfResult<F15Dot16> {
        Ok(F15Dot16::from_bits(self.parse_i32()?))
    }

    fn parse_xyz_number(&mut self) -> PdfResult<XyzNumber> {
        let cie_x = self.parse_f15dot16()?;
        let cie_y = self.parse_f15dot16()?;
        let cie_z = self.parse_f15dot16()?;

        Ok(XyzNumber {
            cie_x,
            cie_y,
            cie_z,
        })
    }
}

impl<'a> IccProfileParser<'a> {
    pub fn parse(&mut self) -> PdfResult<(IccProfileHeader, IccTagTable)> {
        let header = self.parse_header()?;
        let tag_table = self.parse_tag_table()?;

        Ok((header, tag_table))
    }

    fn parse_header(&mut self) -> PdfResult<IccProfileHeader> {
        let profile_size = self.parse_u32()?;
        let preferred_cmm_type = IccTagSignature(self.parse_array::<4>()?);
        let profile_version_number = self.parse_u32()?;
        let profile_device_class = IccTagSignature(self.parse_array::<4>()?);
        let colour_space = IccTagSignature(self.parse_array::<4>()?);
        let profile_connection_space = IccTagSignature(self.parse_array()?);
        // creation date, 12 bytes of u16 fields
        let _created_at = self.parse_array::<12>()?;
        let acsp = self.parse_u32()?;
        let primary_platform_signature = IccTagSignature(self.parse_array()?);
        let profile_flags = self.parse_u32()?;
        let device_manufacturer = IccTagSignature(self.parse_array()?);
        let device_model = IccTagSignature(self.parse_array()?);
        let device_attributes = self.parse_u64()?;
        let rendering_intent = self.parse_u32()?;
        let _illuminant = self.parse_xyz_number()?;
        let profile_creator_signature = IccTagSignature(self.parse_array()?);
        let profile_id = self.parse_array::<16>()?;
        let reserved = self.parse_array::<28>()?;

        anyhow::ensure!(acsp == 0x61637370, "missing acsp profile signature");
        anyhow::ensure!(reserved.iter().all(|b| *b == 0), "nonzero reserved bytes");

        Ok(IccProfileHeader {
            profile_size,
            preferred_cmm_type,
            profile_version_number,
            profile_device_class,
            colour_space,
            profile_connection_space,
            primary_platform_signature,
            profile_flags,
            device_manufacturer,
            device_model,
            device_attributes,
            rendering_intent,
            profile_creator_signature,
            profile_id,
        })
    }

    fn parse_tag_table(&mut self) -> PdfResult<IccTagTable> {
        let tag_count = self.parse_u32()?;

        anyhow::ensure!(tag_count < 1024, "implausible tag count");

        let mut entries = Vec::with_capacity(tag_count as usize);
        for _ in 0..tag_count {
            entries.push(self.parse_tag_entry()?);
        }

        Ok(IccTagTable { tag_count, entries })
    }

    fn parse_tag_entry(&mut self) -> PdfResult<TagTableEntry> {
        let signature = IccTagSignature(self.parse_array::<4>()?);
        let offset = self.parse_u32()?;
        let len = self.parse_u32()?;

        Ok(TagTableEntry {
            signature,
            offset,
            len,
        })
    }
}

/// Parsers for tag element data, operating on the slice addressed by a tag
/// table entry
pub(super) struct TagDataParser<'a> {
    inner: IccProfileParser<'a>,
}

impl<'a> TagDataParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            inner: IccProfileParser::new(data),
        }
    }

    fn type_signature(&mut self) -> PdfResult<IccTagSignature> {
        let signature = IccTagSignature(self.inner.parse_array::<4>()?);
        let _reserved = self.inner.parse_array::<4>()?;
        Ok(signature)
    }

    pub fn parse_xyz(&mut self) -> PdfResult<[f32; 3]> {
        let signature = self.type_signature()?;
        anyhow::ensure!(signature == IccTagSignature(*b"XYZ "), "expected XYZ tag");

        Ok(self.inner.parse_xyz_number()?.to_floats())
    }

    /// A tone-reproduction curve: either a 'curv' element (empty = identity,
    /// one entry = gamma in u8Fixed8, otherwise a sampled LUT) or a 'para'
    /// parametric element
    pub fn parse_curve(&mut self) -> PdfResult<Curve> {
        let signature = self.type_signature()?;

        match &signature.0 {
            b"curv" => {
                let count = self.inner.parse_u32()?;

                Ok(match count {
                    0 => Curve::Identity,
                    1 => {
                        let gamma = F8Dot8::from_bits(self.inner.parse_u16()?);
                        Curve::Gamma(gamma.to_num::<f32>())
                    }
                    _ => {
                        let mut values = Vec::with_capacity(count as usize);
                        for _ in 0..count {
                            values.push(self.inner.parse_u16()? as f32 / 65535.0);
                        }
                        Curve::Sampled(values)
                    }
                })
            }
            b"para" => {
                let ty = self.inner.parse_u16()?;
                let _reserved = self.inner.parse_u16()?;

                let param_count = match ty {
                    0 => 1,
                    1 => 3,
                    2 => 4,
                    3 => 5,
                    4 => 7,
                    _ => anyhow::bail!("unknown parametric curve type {}", ty),
                };

                let mut params = [0.0f32; 7];
                for param in params.iter_mut().take(param_count) {
                    *param = self.inner.parse_f15dot16()?.to_num::<f32>();
                }

                Ok(Curve::Parametric { ty, params })
            }
            _ => anyhow::bail!("expected curve tag, found {:?}", signature),
        }
    }

    /// The number of bytes consumed so far; used to walk curve sequences
    /// inside 'mAB ' elements, which are padded to 4-byte boundaries
    fn align4(&mut self) {
        let rem = self.inner.cursor % 4;
        if rem != 0 {
            self.inner.cursor += 4 - rem;
        }
    }

    fn parse_curve_sequence(&mut self, count: usize) -> PdfResult<Vec<Curve>> {
        let mut curves = Vec::with_capacity(count);

        for _ in 0..count {
            curves.push(self.parse_curve()?);
            self.align4();
        }

        Ok(curves)
    }

    /// Legacy 'mft1' (lut8) and 'mft2' (lut16) elements: input curves, a
    /// 3x3 matrix, a multi-dimensional CLUT with a uniform grid, and output
    /// curves
    pub fn parse_legacy_lut(&mut self) -> PdfResult<LutPipeline> {
        let signature = self.type_signature()?;

        let wide = match &signature.0 {
            b"mft1" => false,
            b"mft2" => true,
            _ => anyhow::bail!("expected lut tag, found {:?}", signature),
        };

        let input_channels = self.inner.next()? as usize;
        let output_channels = self.inner.next()? as usize;
        let grid_points = self.inner.next()? as usize;
        let _padding = self.inner.next()?;

        anyhow::ensure!(
            input_channels > 0 && input_channels <= 8 && output_channels > 0,
            "invalid lut channel counts"
        );

        let mut matrix = [[0.0f32; 3]; 3];
        for row in matrix.iter_mut() {
            for value in row.iter_mut() {
                *value = self.inner.parse_f15dot16()?.to_num::<f32>();
            }
        }

        let (input_entries, output_entries) = if wide {
            (
                self.inner.parse_u16()? as usize,
                self.inner.parse_u16()? as usize,
            )
        } else {
            (256, 256)
        };

        let mut read_value = |parser: &mut Self| -> PdfResult<f32> {
            Ok(if wide {
                parser.inner.parse_u16()? as f32 / 65535.0
            } else {
                parser.inner.next()? as f32 / 255.0
            })
        };

        let mut input_curves = Vec::with_capacity(input_channels);
        for _ in 0..input_channels {
            let mut values = Vec::with_capacity(input_entries);
            for _ in 0..input_entries {
                values.push(read_value(self)?);
            }
            input_curves.push(Curve::Sampled(values));
        }

        let clut_len = grid_points.pow(input_channels as u32) * output_channels;
        let mut table = Vec::with_capacity(clut_len);
        for _ in 0..clut_len {
            table.push(read_value(self)?);
        }

        let mut output_curves = Vec::with_capacity(output_channels);
        for _ in 0..output_channels {
            let mut values = Vec::with_capacity(output_entries);
            for _ in 0..output_entries {
                values.push(read_value(self)?);
            }
            output_curves.push(Curve::Sampled(values));
        }

        Ok(LutPipeline {
            kind: LutKind::Legacy,
            a_curves: input_curves,
            clut: Some(Clut {
                inputs: input_channels,
                outputs: output_channels,
                grid: vec![grid_points as u8; input_channels],
                table,
            }),
            m_curves: Vec::new(),
            matrix: Some((matrix, [0.0; 3])),
            b_curves: output_curves,
            output_channels,
        })
    }

    /// 'mAB ' (lutAToB) multi-process element. Processing order is
    /// A-curves, CLUT, M-curves, matrix with offset, B-curves; any element
    /// with a zero offset is absent
    pub fn parse_lut_a_to_b(&mut self, data: &'a [u8]) -> PdfResult<LutPipeline> {
        let signature = self.type_signature()?;
        anyhow::ensure!(
            signature == IccTagSignature(*b"mAB "),
            "expected mAB tag, found {:?}",
            signature
        );

        let input_channels = self.inner.next()? as usize;
        let output_channels = self.inner.next()? as usize;
        let _padding = self.inner.parse_u16()?;

        let b_offset = self.inner.parse_u32()? as usize;
        let matrix_offset = self.inner.parse_u32()? as usize;
        let m_offset = self.inner.parse_u32()? as usize;
        let clut_offset = self.inner.parse_u32()? as usize;
        let a_offset = self.inner.parse_u32()? as usize;

        let mut at = |offset: usize| -> TagDataParser<'a> {
            TagDataParser {
                inner: IccProfileParser {
                    buffer: data,
                    cursor: offset,
                },
            }
        };

        let a_curves = if a_offset != 0 {
            at(a_offset).parse_raw_curves(input_channels)?
        } else {
            Vec::new()
        };

        let m_curves = if m_offset != 0 {
            at(m_offset).parse_raw_curves(3)?
        } else {
            Vec::new()
        };

        let b_curves = if b_offset != 0 {
            at(b_offset).parse_raw_curves(output_channels.min(3))?
        } else {
            Vec::new()
        };

        let matrix = if matrix_offset != 0 {
            let mut parser = at(matrix_offset);
            let mut values = [0.0f32; 12];
            for value in values.iter_mut() {
                *value = parser.inner.parse_f15dot16()?.to_num::<f32>();
            }

            Some((
                [
                    [values[0], values[1], values[2]],
                    [values[3], values[4], values[5]],
                    [values[6], values[7], values[8]],
                ],
                [values[9], values[10], values[11]],
            ))
        } else {
            None
        };

        let clut = if clut_offset != 0 {
            let mut parser = at(clut_offset);

            let grid_bytes = parser.inner.parse_array::<16>()?;
            let precision = parser.inner.next()?;
            let _padding = parser.inner.parse_array::<3>()?;

            let grid: Vec<u8> = grid_bytes[..input_channels].to_vec();

            anyhow::ensure!(
                grid.iter().all(|&g| g >= 2),
                "clut grid must have at least two points per dimension"
            );

            let clut_len = grid
                .iter()
                .map(|&g| g as usize)
                .product::<usize>()
                * output_channels;

            let mut table = Vec::with_capacity(clut_len);
            for _ in 0..clut_len {
                table.push(match precision {
                    1 => parser.inner.next()? as f32 / 255.0,
                    2 => parser.inner.parse_u16()? as f32 / 65535.0,
                    p => anyhow::bail!("invalid clut precision {}", p),
                });
            }

            Some(Clut {
                inputs: input_channels,
                outputs: output_channels,
                grid,
                table,
            })
        } else {
            None
        };

        Ok(LutPipeline {
            kind: LutKind::MultiProcess,
            a_curves,
            clut,
            m_curves,
            matrix,
            b_curves,
            output_channels,
        })
    }

    fn parse_raw_curves(&mut self, count: usize) -> PdfResult<Vec<Curve>> {
        self.parse_curve_sequence(count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LutKind {
    /// lut8/lut16: input curves, matrix, CLUT, output curves
    Legacy,
    /// lutAToB: A-curves, CLUT, M-curves, matrix with offset, B-curves
    MultiProcess,
}

/// A parsed LUT element, normalized so the transform builder can emit
/// stages in the right order for either layout
#[derive(Debug, Clone)]
pub(super) struct LutPipeline {
    pub kind: LutKind,
    pub a_curves: Vec<Curve>,
    pub clut: Option<Clut>,
    pub m_curves: Vec<Curve>,
    pub matrix: Option<([[f32; 3]; 3], [f32; 3])>,
    pub b_curves: Vec<Curve>,
    pub output_channels: usize,
}
