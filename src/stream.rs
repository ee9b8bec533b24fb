use crate::{
    error::PdfResult,
    filter::FilterKind,
    objects::{Dictionary, Name, TypeOrArray},
    Resolve,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: StreamDict,
    pub stream: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamDict {
    pub len: Option<usize>,
    pub filter: Option<Vec<FilterKind>>,
    pub decode_parms: Option<Vec<Dictionary>>,

    /// Entries consumed by the stream's concrete type (image, form, shading,
    /// function), left in place here
    pub other: Dictionary,
}

impl StreamDict {
    pub fn from_dict(mut dict: Dictionary, resolver: &mut dyn Resolve) -> PdfResult<StreamDict> {
        let len = dict.get_integer("Length", resolver)?.map(|i| i as usize);

        let filter = dict
            .get::<TypeOrArray<Name>>("Filter", resolver)?
            .map(|names| {
                names
                    .to_vec()
                    .iter()
                    .map(|name| FilterKind::from_str(name.as_str()))
                    .collect::<PdfResult<Vec<FilterKind>>>()
            })
            .transpose()?;

        let decode_parms = dict
            .get::<TypeOrArray<Dictionary>>("DecodeParms", resolver)?
            .or(dict.get::<TypeOrArray<Dictionary>>("DP", resolver)?)
            .map(TypeOrArray::to_vec);

        Ok(StreamDict {
            len,
            filter,
            decode_parms,
            other: dict,
        })
    }
}

impl Stream {
    pub fn from_dict_and_data(
        dict: Dictionary,
        stream: Vec<u8>,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Self> {
        Ok(Self {
            dict: StreamDict::from_dict(dict, resolver)?,
            stream,
        })
    }
}
