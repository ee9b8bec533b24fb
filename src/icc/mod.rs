/*!

ICC file parsing and color conversion

See https://www.color.org/icc1v42.pdf

Additionally:
 - https://en.wikipedia.org/wiki/ICC_profile
 - https://en.wikipedia.org/wiki/CIE_1931_color_space
 - https://en.wikipedia.org/wiki/Color_management

*/

use std::fmt::{self, Write};

use crate::error::PdfResult;

use self::parse::IccProfileParser;

pub use transform::{
    bradford_adaptation, ColorTransform, Curve, IccRenderingIntent, Stage, D50_WHITE, D65_WHITE,
};

mod data_types;
mod parse;
mod transform;

#[derive(Debug)]
pub struct IccProfile {
    pub header: IccProfileHeader,
    pub tag_table: IccTagTable,

    /// The raw profile bytes. Tag data is addressed by (offset, len) out of
    /// this buffer
    data: Vec<u8>,
}

impl IccProfile {
    pub fn new(buffer: &[u8]) -> PdfResult<Self> {
        let (header, tag_table) = IccProfileParser::new(buffer).parse()?;

        Ok(Self {
            header,
            tag_table,
            data: buffer.to_vec(),
        })
    }

    pub fn channels(&self) -> usize {
        match &self.header.colour_space.0 {
            b"GRAY" => 1,
            b"RGB " => 3,
            b"CMYK" => 4,
            b"2CLR" => 2,
            b"5CLR" => 5,
            b"6CLR" => 6,
            b"7CLR" => 7,
            b"8CLR" => 8,
            // Lab/XYZ and everything else are treated as three-channel
            _ => 3,
        }
    }

    /// The raw profile bytes, as embedded (used by the PNG fast path's
    /// iCCP chunk)
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn tag(&self, signature: IccTagSignature) -> Option<TagTableEntry> {
        self.tag_table
            .entries
            .iter()
            .find(|entry| entry.signature == signature)
            .copied()
    }

    pub(crate) fn tag_data(&self, entry: TagTableEntry) -> PdfResult<&[u8]> {
        let start = entry.offset as usize;
        let end = start + entry.len as usize;

        self.data
            .get(start..end)
            .ok_or_else(|| anyhow::anyhow!("icc tag data out of bounds"))
    }
}

#[derive(Debug)]
pub struct IccProfileHeader {
    /// The exact size obtained by combining the profile header, the tag table,
    /// and the tagged element data, including the pad bytes for the last
    /// tag
    pub profile_size: u32,

    /// This field may be used to identify the preferred CMM to be used. If used,
    /// it shall match a CMM type signature registered in the ICC registry.
    /// If no preferred CMM is identified, this field shall be set to zero
    pub preferred_cmm_type: IccTagSignature,
    pub profile_version_number: u32,
    pub profile_device_class: IccTagSignature,
    pub colour_space: IccTagSignature,
    pub profile_connection_space: IccTagSignature,
    pub primary_platform_signature: IccTagSignature,
    pub profile_flags: u32,
    pub device_manufacturer: IccTagSignature,
    pub device_model: IccTagSignature,
    pub device_attributes: u64,

    /// The rendering intent field shall specify the rendering intent which should be
    /// used (or, in the case of a DeviceLink profile, was used) when this
    /// profile is (was) combined with another profile
    pub rendering_intent: u32,
    pub profile_creator_signature: IccTagSignature,
    pub profile_id: [u8; 16],
}

#[derive(Debug, Clone)]
pub struct IccTagTable {
    pub(crate) tag_count: u32,
    pub(crate) entries: Vec<TagTableEntry>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TagTableEntry {
    pub(crate) signature: IccTagSignature,
    pub(crate) offset: u32,
    pub(crate) len: u32,
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct IccTagSignature(pub [u8; 4]);

impl IccTagSignature {
    pub const fn new(tag: [u8; 4]) -> Self {
        Self(tag)
    }
}

impl fmt::Debug for IccTagSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        f.write_char(self.0[0] as char)?;
        f.write_char(self.0[1] as char)?;
        f.write_char(self.0[2] as char)?;
        f.write_char(self.0[3] as char)?;
        f.write_char('"')?;

        Ok(())
    }
}

pub(crate) mod sig {
    use super::IccTagSignature;

    pub const RED_TRC: IccTagSignature = IccTagSignature::new(*b"rTRC");
    pub const GREEN_TRC: IccTagSignature = IccTagSignature::new(*b"gTRC");
    pub const BLUE_TRC: IccTagSignature = IccTagSignature::new(*b"bTRC");
    pub const GRAY_TRC: IccTagSignature = IccTagSignature::new(*b"kTRC");
    pub const RED_COLORANT: IccTagSignature = IccTagSignature::new(*b"rXYZ");
    pub const GREEN_COLORANT: IccTagSignature = IccTagSignature::new(*b"gXYZ");
    pub const BLUE_COLORANT: IccTagSignature = IccTagSignature::new(*b"bXYZ");
    pub const WHITE_POINT: IccTagSignature = IccTagSignature::new(*b"wtpt");
    pub const A_TO_B_0: IccTagSignature = IccTagSignature::new(*b"A2B0");
    pub const A_TO_B_1: IccTagSignature = IccTagSignature::new(*b"A2B1");
    pub const A_TO_B_2: IccTagSignature = IccTagSignature::new(*b"A2B2");
}
