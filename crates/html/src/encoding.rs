//! Byte-to-text decoding for the incremental parser.
//!
//! A declared (transport) label wins; otherwise the first bytes are sniffed
//! for a BOM, and failing that the fallback encoding is assumed tentatively so
//! a later `<meta charset>` can still correct it.

use core_types::EncodingSource;
use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8, WINDOWS_1252};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
    Certain,
    Tentative,
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const UTF16_BOMS: [&[u8]; 2] = [b"\xFE\xFF", b"\xFF\xFE"];

/// Resolve a charset label; `None` when encoding_rs does not know it.
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// A label a parse can commit to. The replacement encoding and UTF-16
/// cannot carry an ASCII-compatible document.
pub fn adoptable(label: &str) -> Option<&'static Encoding> {
    lookup(label).filter(|enc| {
        ![encoding_rs::REPLACEMENT, encoding_rs::UTF_16BE, encoding_rs::UTF_16LE].contains(enc)
    })
}

/// What a `<meta>` declaration may switch to: UTF-16 labels mean UTF-8
/// because the bytes were evidently ASCII-compatible.
pub(crate) fn meta_target(label: &str) -> Option<&'static Encoding> {
    let enc = lookup(label)?;
    if enc == encoding_rs::UTF_16BE || enc == encoding_rs::UTF_16LE {
        return Some(UTF_8);
    }
    Some(enc)
}

pub(crate) struct StreamDecoder {
    encoding: &'static Encoding,
    source: EncodingSource,
    confidence: Confidence,
    decoder: Option<Decoder>,
    sniff: Vec<u8>,
}

impl StreamDecoder {
    pub(crate) fn declared(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            source: EncodingSource::Header,
            confidence: Confidence::Certain,
            decoder: Some(encoding.new_decoder_with_bom_removal()),
            sniff: Vec::new(),
        }
    }

    pub(crate) fn sniffing(fallback: &'static Encoding) -> Self {
        Self {
            encoding: fallback,
            source: EncodingSource::Default,
            confidence: Confidence::Tentative,
            decoder: None,
            sniff: Vec::new(),
        }
    }

    pub(crate) fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub(crate) fn source(&self) -> EncodingSource {
        self.source
    }

    pub(crate) fn confidence(&self) -> Confidence {
        self.confidence
    }

    fn could_be_bom(prefix: &[u8]) -> bool {
        let is_prefix = |bom: &[u8]| prefix.len() < bom.len() && bom.starts_with(prefix);
        is_prefix(UTF8_BOM) || UTF16_BOMS.iter().any(|bom| is_prefix(bom))
    }

    /// Decode `bytes`; `last` flushes any partial sequence.
    pub(crate) fn decode(&mut self, bytes: &[u8], last: bool) -> String {
        if self.decoder.is_none() {
            self.sniff.extend_from_slice(bytes);
            if !last && Self::could_be_bom(&self.sniff) {
                return String::new();
            }
            if let Some((enc, _)) = Encoding::for_bom(&self.sniff) {
                log::debug!(target: "html.binding", "byte order mark selects {}", enc.name());
                self.encoding = enc;
                self.source = EncodingSource::Detected;
                self.confidence = Confidence::Certain;
            }
            let mut decoder = self.encoding.new_decoder_with_bom_removal();
            let held = std::mem::take(&mut self.sniff);
            let out = decode_into(&mut decoder, &held, last);
            self.decoder = Some(decoder);
            return out;
        }
        match self.decoder.as_mut() {
            Some(decoder) => decode_into(decoder, bytes, last),
            None => String::new(),
        }
    }
}

fn decode_into(decoder: &mut Decoder, input: &[u8], last: bool) -> String {
    let capacity = decoder
        .max_utf8_buffer_length(input.len())
        .unwrap_or(input.len().saturating_mul(3));
    let mut out = String::with_capacity(capacity);
    let mut read_total = 0;
    loop {
        let (result, read, _had_errors) =
            decoder.decode_to_string(&input[read_total..], &mut out, last);
        read_total += read;
        match result {
            CoderResult::InputEmpty => return out,
            CoderResult::OutputFull => {
                let rest = input.len() - read_total;
                out.reserve(rest.saturating_mul(3).max(16));
            }
        }
    }
}

/// Fallback when nothing was declared.
pub(crate) fn default_encoding(label: Option<&str>) -> Option<&'static Encoding> {
    match label {
        Some(label) => lookup(label),
        None => Some(WINDOWS_1252),
    }
}
