//! Incremental parser binding: bytes in, DOM out, pausing at scripts.
//!
//! The binding owns the decoder, tokenizer and tree builder for one parse of
//! one document. An `EncodingChanged` error means this parse is void: the
//! caller must drop both the binding and the DOM, build a new binding for the
//! reported label and re-feed the complete source from its first byte.

use crate::dom::{Dom, DomError, NodeId};
use crate::encoding::{self, Confidence, StreamDecoder};
use crate::tokenizer::Tokenizer;
use crate::tree_builder::{BuildEvent, TreeBuilder};
use core_types::EncodingSource;
use std::fmt;

#[derive(Clone, Debug, Default)]
pub struct BindingParams {
    /// Charset label from the transport, if any.
    pub encoding: Option<String>,
    pub enable_scripting: bool,
    /// Label assumed when nothing is declared or sniffed; windows-1252 if unset.
    pub fallback: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A `<meta>` declared an encoding other than the tentative one.
    EncodingChanged { label: String },
    UnsupportedEncoding(String),
    /// Completion was requested while a parser-blocking script is pending.
    Paused,
    Invariant(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EncodingChanged { label } => {
                write!(f, "document declares encoding {label}; reparse required")
            }
            ParseError::UnsupportedEncoding(label) => write!(f, "unsupported encoding {label:?}"),
            ParseError::Paused => f.write_str("parser is paused on a script"),
            ParseError::Invariant(msg) => write!(f, "parser invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<DomError> for ParseError {
    fn from(err: DomError) -> Self {
        ParseError::Invariant(err.to_string())
    }
}

/// How far a feed got.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseProgress {
    /// All available input was consumed.
    NeedData,
    /// A parser-inserted script just closed; parsing stays paused until
    /// `resume` is called.
    Script(NodeId),
    /// End of input reached and the tree is final.
    Complete,
}

pub struct ParserBinding {
    decoder: StreamDecoder,
    tokenizer: Tokenizer,
    builder: TreeBuilder,
    scripting: bool,
    paused_on: Option<NodeId>,
    completed: bool,
}

impl ParserBinding {
    /// Create a binding and the empty DOM it will build into.
    ///
    /// An unknown declared label is retried once with detection; only an
    /// unknown fallback label fails.
    pub fn new(params: BindingParams) -> Result<(Self, Dom), ParseError> {
        let declared = params.encoding.as_deref().and_then(|label| {
            let found = encoding::lookup(label);
            if found.is_none() {
                log::debug!(
                    target: "html.binding",
                    "declared charset {label:?} unsupported; retrying with detection"
                );
            }
            found
        });
        let decoder = match declared {
            Some(enc) => StreamDecoder::declared(enc),
            None => {
                let fallback = encoding::default_encoding(params.fallback.as_deref())
                    .ok_or_else(|| {
                        ParseError::UnsupportedEncoding(params.fallback.clone().unwrap_or_default())
                    })?;
                StreamDecoder::sniffing(fallback)
            }
        };
        Ok(Self::with_decoder(decoder, params.enable_scripting))
    }

    /// Create a binding that commits to the declared label with no
    /// detection. Used after a `<meta>` forced a reparse; a label that cannot
    /// be parsed as is fails instead of being sniffed around.
    pub fn with_declared(params: BindingParams) -> Result<(Self, Dom), ParseError> {
        let label = params.encoding.as_deref().unwrap_or_default();
        let enc = encoding::adoptable(label)
            .ok_or_else(|| ParseError::UnsupportedEncoding(label.to_string()))?;
        Ok(Self::with_decoder(
            StreamDecoder::declared(enc),
            params.enable_scripting,
        ))
    }

    fn with_decoder(decoder: StreamDecoder, scripting: bool) -> (Self, Dom) {
        log::debug!(
            target: "html.binding",
            "parser created: encoding={} source={}",
            decoder.encoding().name(),
            decoder.source().label()
        );
        let binding = Self {
            decoder,
            tokenizer: Tokenizer::new(),
            builder: TreeBuilder::new(),
            scripting,
            paused_on: None,
            completed: false,
        };
        (binding, Dom::new())
    }

    pub fn encoding(&self) -> &'static str {
        self.decoder.encoding().name()
    }

    pub fn encoding_source(&self) -> EncodingSource {
        self.decoder.source()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_on.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Feed a chunk of raw bytes. While paused the bytes are buffered.
    pub fn parse_chunk(&mut self, dom: &mut Dom, bytes: &[u8]) -> Result<ParseProgress, ParseError> {
        if self.completed {
            return Err(ParseError::Invariant("data after end of stream".to_string()));
        }
        let text = self.decoder.decode(bytes, false);
        self.tokenizer.push_str(&text);
        if let Some(node) = self.paused_on {
            return Ok(ParseProgress::Script(node));
        }
        self.pump(dom)
    }

    /// The script the parser paused on has run (or was skipped).
    pub fn resume(&mut self, dom: &mut Dom) -> Result<ParseProgress, ParseError> {
        if self.paused_on.take().is_none() && self.completed {
            return Ok(ParseProgress::Complete);
        }
        self.pump(dom)
    }

    /// No more bytes will arrive; drain everything buffered.
    pub fn complete(&mut self, dom: &mut Dom) -> Result<ParseProgress, ParseError> {
        if self.completed {
            return Ok(ParseProgress::Complete);
        }
        if !self.tokenizer.is_finished() {
            let text = self.decoder.decode(&[], true);
            self.tokenizer.push_str(&text);
            self.tokenizer.finish();
        }
        if self.paused_on.is_some() {
            return Err(ParseError::Paused);
        }
        self.pump(dom)
    }

    fn pump(&mut self, dom: &mut Dom) -> Result<ParseProgress, ParseError> {
        loop {
            let Some(token) = self.tokenizer.next_token() else {
                if self.tokenizer.is_finished() {
                    self.builder.finish(dom)?;
                    self.completed = true;
                    log::info!(target: "html.binding", "parse complete ({} nodes)", dom.len());
                    return Ok(ParseProgress::Complete);
                }
                return Ok(ParseProgress::NeedData);
            };
            let event = self.builder.process(dom, token)?;
            if let Some(label) = self.builder.take_charset_hint() {
                self.check_declared_charset(&label)?;
            }
            if let BuildEvent::ScriptEnd(node) = event {
                if self.scripting {
                    log::trace!(target: "html.binding", "paused on script {node:?}");
                    self.paused_on = Some(node);
                    return Ok(ParseProgress::Script(node));
                }
            }
        }
    }

    fn check_declared_charset(&self, label: &str) -> Result<(), ParseError> {
        if self.decoder.confidence() == Confidence::Certain {
            return Ok(());
        }
        let Some(target) = encoding::meta_target(label) else {
            log::debug!(target: "html.binding", "ignoring unknown meta charset {label:?}");
            return Ok(());
        };
        if target == self.decoder.encoding() {
            return Ok(());
        }
        log::info!(
            target: "html.binding",
            "meta charset {} replaces tentative {}",
            target.name(),
            self.decoder.encoding().name()
        );
        Err(ParseError::EncodingChanged {
            label: target.name().to_string(),
        })
    }
}
