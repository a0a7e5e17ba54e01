//! Ingestion pipeline: ordered parsers, then ordered preprocessors.

use crate::data::Document;
use crate::error::SpriterError;
use crate::parsers::{JsonParser, ScmlParser};
use crate::preprocess::{InitPreprocessor, ValidationPreprocessor};

/// Format detection plus parse.
pub trait DocumentParser: Send + Sync {
    fn name(&self) -> &'static str;
    /// Cheap sniff of already-trimmed text.
    fn can_parse(&self, text: &str) -> bool;
    fn parse(&self, text: &str) -> Result<Document, SpriterError>;
}

/// In-place structural pass over a freshly parsed document.
pub trait Preprocessor: Send + Sync {
    fn name(&self) -> &'static str;
    fn preprocess(&self, doc: &mut Document) -> Result<(), SpriterError>;
}

/// Turns raw text into a [`Document`]. Holds nothing but its registries, so
/// independent readers never share state.
pub struct SpriterReader {
    parsers: Vec<Box<dyn DocumentParser>>,
    preprocessors: Vec<Box<dyn Preprocessor>>,
}

impl Default for SpriterReader {
    /// SCML then JSON parsing, followed by init and validation.
    fn default() -> Self {
        Self::new()
            .with_parser(ScmlParser)
            .with_parser(JsonParser)
            .with_preprocessor(InitPreprocessor)
            .with_preprocessor(ValidationPreprocessor)
    }
}

impl std::fmt::Debug for SpriterReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpriterReader")
            .field("parsers", &self.parsers.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field(
                "preprocessors",
                &self.preprocessors.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SpriterReader {
    /// A reader with no parsers or preprocessors.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
            preprocessors: Vec::new(),
        }
    }

    pub fn add_parser(&mut self, parser: impl DocumentParser + 'static) {
        self.parsers.push(Box::new(parser));
    }

    pub fn add_preprocessor(&mut self, preprocessor: impl Preprocessor + 'static) {
        self.preprocessors.push(Box::new(preprocessor));
    }

    pub fn with_parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.add_parser(parser);
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: impl Preprocessor + 'static) -> Self {
        self.add_preprocessor(preprocessor);
        self
    }

    /// Parse and preprocess `text`.
    ///
    /// `None` input is an error. Blank input, or input no parser accepts, yields
    /// `Ok(None)`. The first parser whose `can_parse` succeeds is the only one tried.
    pub fn read<'a>(&self, text: impl Into<Option<&'a str>>) -> Result<Option<Document>, SpriterError> {
        let text = text.into().ok_or(SpriterError::MissingInput)?.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let Some(parser) = self.parsers.iter().find(|p| p.can_parse(text)) else {
            log::warn!("no registered parser accepts the input ({} bytes)", text.len());
            return Ok(None);
        };
        log::debug!("parsing document with '{}'", parser.name());
        let mut doc = parser.parse(text)?;

        for pre in &self.preprocessors {
            log::debug!("running preprocessor '{}'", pre.name());
            pre.preprocess(&mut doc)?;
        }
        Ok(Some(doc))
    }
}

/// Read with a fresh default reader; unrecognized input is an error here.
pub fn read_document(text: &str) -> Result<Document, SpriterError> {
    SpriterReader::default()
        .read(text)?
        .ok_or_else(|| SpriterError::Parse {
            format: "unknown",
            reason: "no parser accepts the input".into(),
        })
}
