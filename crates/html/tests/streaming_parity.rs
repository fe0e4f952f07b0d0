//! Chunk-boundary invariance for the incremental parser binding.
//!
//! Extended local mode: set `PAGELOAD_STREAMING_PARITY_SEEDS` to increase
//! the number of random boundary plans per case.

use html::dom_utils::serialize;
use html::{BindingParams, parse_chunked, parse_document};

const DEFAULT_SEEDS: usize = 64;
const SEED_MIX: u64 = 0x9e3779b97f4a7c15;

const CASES: &[&[u8]] = &[
    b"plain ascii",
    "caf\u{e9} <b>bold</b> \u{1F600}".as_bytes(),
    b"<!DOCTYPE html><html><head><title>A &amp; B</title></head><body><p>x<p>y</body></html>",
    b"<script>if (a < b && c > d) { s = '</scr' + 'ipt>'; }</script><p>after",
    b"<!-- c1 --><div class=\"a>b\" id='x'>t</div><!-- unterminated",
    b"<meta charset=\"utf-8\"><p>\xC3\xA9t\xC3\xA9</p>",
    b"\xEF\xBB\xBF<p>bom \xE2\x9C\x93</p>",
    b"<ul><li>one<li>two</ul><textarea>a <b> &lt;</textarea> a < b",
    b"<p>windows \xE9 byte</p>",
];

fn seed_count() -> usize {
    if let Ok(value) = std::env::var("PAGELOAD_STREAMING_PARITY_SEEDS")
        && let Ok(parsed) = value.parse::<usize>()
        && parsed > 0
    {
        return parsed;
    }
    DEFAULT_SEEDS
}

fn split_at<'a>(bytes: &'a [u8], boundaries: &[usize]) -> Vec<&'a [u8]> {
    let mut out = Vec::with_capacity(boundaries.len() + 1);
    let mut last = 0;
    for &idx in boundaries {
        assert!(idx > last && idx <= bytes.len(), "invalid boundary {idx}");
        out.push(&bytes[last..idx]);
        last = idx;
    }
    out.push(&bytes[last..]);
    out
}

fn assert_parity(case_idx: usize, seed: Option<u64>, bytes: &[u8], boundaries: &[usize]) {
    let whole = parse_document(bytes, BindingParams::default()).expect("whole parse");
    let chunks = split_at(bytes, boundaries);
    let chunked =
        parse_chunked(chunks.iter().copied(), BindingParams::default()).expect("chunked parse");
    let expected = serialize(&whole, whole.document());
    let actual = serialize(&chunked, chunked.document());
    let seed_label = seed
        .map(|seed| format!("seed=0x{seed:016x}"))
        .unwrap_or_else(|| "seed=explicit".to_string());
    assert_eq!(
        actual, expected,
        "streaming parity mismatch for case={case_idx} {seed_label} boundaries={boundaries:?}"
    );
}

#[test]
fn fixed_chunk_sizes_match_whole_parse() {
    for (case_idx, bytes) in CASES.iter().enumerate() {
        for size in [1usize, 2, 3, 4, 7, 16] {
            let boundaries: Vec<usize> = (1..)
                .map(|i| i * size)
                .take_while(|&offset| offset < bytes.len())
                .collect();
            assert_parity(case_idx, None, bytes, &boundaries);
        }
    }
}

#[test]
fn random_boundaries_match_whole_parse() {
    let seeds = seed_count();
    for (case_idx, bytes) in CASES.iter().enumerate() {
        let base_seed = 0x4f6f726f6d207574 ^ case_idx as u64;
        for iter in 0..seeds {
            let iter_seed = base_seed ^ (iter as u64).wrapping_mul(SEED_MIX);
            let mut rng = LcgRng::new(iter_seed);
            let boundaries = random_boundaries(&mut rng, bytes.len());
            assert_parity(case_idx, Some(iter_seed), bytes, &boundaries);
        }
    }
}

#[test]
fn meta_charset_reparse_is_split_invariant() {
    let bytes = "<meta charset=utf-8><p>\u{e9}</p>".as_bytes();
    let whole = parse_document(bytes, BindingParams::default()).unwrap();
    let p = whole.elements_named(whole.document(), "p")[0];
    assert_eq!(whole.text_content(p), "\u{e9}");
}

fn random_boundaries(rng: &mut LcgRng, len: usize) -> Vec<usize> {
    if len <= 1 {
        return Vec::new();
    }
    let max_points = (len - 1).min(64);
    let count = rng.gen_range_usize(0, max_points + 1);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(rng.gen_range_usize(1, len));
    }
    out.sort_unstable();
    out.dedup();
    out
}

struct LcgRng {
    state: u64,
}

impl LcgRng {
    fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn gen_range_usize(&mut self, start: usize, end: usize) -> usize {
        assert!(start < end, "invalid range: {start}..{end}");
        let span = (end - start) as u64;
        (self.next_u64() % span) as usize + start
    }
}
