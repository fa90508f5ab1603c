// ── Reference device variants ──
//
// `GeneratorDevice` wraps a producer closure; `SourceDevice` opens a file on
// every fetch and hands it to an extraction step. `JsonFileDevice` is a
// `SourceDevice` that reads declared properties out of a JSON object.

mod generator;
mod json;
mod source;

pub use generator::GeneratorDevice;
pub use json::{JsonExtractor, JsonFileDevice};
pub use source::{Extract, FnExtract, SourceDevice, extract_with};
