//! Driving the parser binding: chunk feeding, script pauses, and the
//! reparse after a late encoding declaration.

use super::HtmlDocument;
use crate::error::ContentError;
use core_types::EncodingSource;
use html::{ParseError, ParseProgress, ParserBinding};

#[derive(Clone, Copy)]
pub(crate) enum ParserInput<'a> {
    Chunk(&'a [u8]),
    Resume,
    Complete,
}

/// Encoding used when a declared label cannot be decoded.
const REPARSE_FALLBACK: &str = "windows-1252";

impl HtmlDocument {
    /// Feed `input` and keep going until the parser needs more data,
    /// finishes, or waits on a sync script.
    pub(crate) fn drive_parser(&mut self, input: ParserInput<'_>) -> Result<(), ContentError> {
        let was_paused = self.binding.as_ref().is_some_and(ParserBinding::is_paused);
        let mut progress = self.parser_call(input)?;
        if was_paused && matches!(input, ParserInput::Chunk(_)) {
            // Buffered behind the blocking script.
            self.drain_mutations();
            return Ok(());
        }
        loop {
            self.drain_mutations();
            match progress {
                ParseProgress::NeedData | ParseProgress::Complete => return Ok(()),
                ParseProgress::Script(node) => {
                    if !self.run_parser_script(node)? {
                        return Ok(());
                    }
                    progress = self.parser_call(ParserInput::Resume)?;
                }
            }
        }
    }

    fn parser_call(&mut self, input: ParserInput<'_>) -> Result<ParseProgress, ContentError> {
        let Some(binding) = self.binding.as_mut() else {
            return Ok(ParseProgress::Complete);
        };
        let result = match input {
            ParserInput::Chunk(bytes) => binding.parse_chunk(&mut self.dom, bytes),
            ParserInput::Resume => binding.resume(&mut self.dom),
            ParserInput::Complete => binding.complete(&mut self.dom),
        };
        match result {
            Ok(progress) => Ok(progress),
            Err(ParseError::EncodingChanged { label }) => self.reparse(label),
            Err(ParseError::Paused) => Ok(ParseProgress::NeedData),
            Err(err) => Err(err.into()),
        }
    }

    /// Start over with `label` as a certain encoding, refeeding everything
    /// received so far.
    fn reparse(&mut self, label: String) -> Result<ParseProgress, ContentError> {
        log::info!(
            target: "content.convert",
            "content {}: encoding changed to {label}; reparsing {} bytes",
            self.id,
            self.source.len()
        );
        self.reset_for_reparse();

        let mut params = self.binding_params.clone();
        params.encoding = Some(label);
        let (binding, dom) = match ParserBinding::with_declared(params.clone()) {
            Ok(created) => created,
            Err(err) => {
                log::warn!(
                    target: "content.convert",
                    "content {}: {err}; reparsing as {REPARSE_FALLBACK}",
                    self.id
                );
                params.encoding = Some(REPARSE_FALLBACK.to_string());
                ParserBinding::with_declared(params.clone())?
            }
        };
        self.encoding = Some(binding.encoding().to_string());
        // The label came from the document itself.
        self.encoding_source = EncodingSource::Detected;
        self.binding_params = params;
        self.dom = dom;
        self.binding = Some(binding);

        let source = std::mem::take(&mut self.source);
        let result = match self.binding.as_mut() {
            Some(binding) => binding.parse_chunk(&mut self.dom, &source),
            None => Ok(ParseProgress::Complete),
        };
        self.source = source;
        match result {
            Ok(progress) => Ok(progress),
            Err(ParseError::EncodingChanged { label }) => Err(ParseError::Invariant(format!(
                "encoding changed again to {label} after reparse"
            ))
            .into()),
            Err(err) => Err(err.into()),
        }
    }

    /// Drop everything derived from the old tree. Refresh and links already
    /// announced stay latched.
    fn reset_for_reparse(&mut self) {
        let cancelled = self.fetches.cancel_all();
        if cancelled > 0 {
            log::debug!(
                target: "content.fetch",
                "content {}: cancelled {cancelled} fetches for reparse",
                self.id
            );
        }
        self.stylesheets.reset_author();
        self.scripts.clear();
        self.blocking_script = None;
        self.objects.clear();
        self.title.reset();
        self.base_url = self.url.clone();
        self.base_target = None;
    }
}
