use crate::{error::PdfResult, filter::decode_stream, stream::Stream, Resolve};

/// Type 4 functions are programs in a small PostScript-derived calculator
/// language.
///
/// The calculator interpreter is an external collaborator: this slot parses
/// and retains the program text, and evaluation surfaces an error that
/// callers recover from (solid-black pattern fallback, alternate color
/// space) per the local-failure policy
#[derive(Debug, Clone)]
pub struct PostScriptCalculatorFunction {
    program: String,
}

impl PostScriptCalculatorFunction {
    pub fn from_stream(stream: Stream, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let decoded = decode_stream(&stream.stream, &stream.dict, resolver)?;

        Ok(Self {
            program: String::from_utf8_lossy(&decoded).into_owned(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn eval(&self, _inputs: &[f32]) -> PdfResult<Vec<f32>> {
        anyhow::bail!("postscript calculator functions require an external interpreter")
    }
}
