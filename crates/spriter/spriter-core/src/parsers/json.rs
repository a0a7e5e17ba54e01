use crate::data::Document;
use crate::error::SpriterError;
use crate::reader::DocumentParser;

/// Reads the serialized document model (see [`Document::to_json`]).
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonParser;

impl DocumentParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn can_parse(&self, text: &str) -> bool {
        text.starts_with('{')
    }

    fn parse(&self, text: &str) -> Result<Document, SpriterError> {
        Ok(serde_json::from_str(text)?)
    }
}
