//! A document fed in arbitrary chunks converts to the same tree as one fed
//! whole.
//!
//! Set `PAGELOAD_CHUNK_PARITY_SEEDS` to try more random split plans.

mod common;

use common::Harness;
use content::ContentConfig;
use core_types::ContentStatus;
use html::dom_utils::serialize;

const DEFAULT_SEEDS: usize = 16;
const FIXED_SIZES: [usize; 6] = [1, 2, 3, 4, 7, 16];

const CASES: &[&str] = &[
    "<!DOCTYPE html><html><head><title>Parity</title>\
     <style>p { margin: 4px } .wide { width: 50% }</style></head>\
     <body><h1 id=top>Heading</h1><p class=wide>Some <b>bold</b> and <i>italic</i> text \
     that wraps across a few lines of the default viewport.</p>\
     <ul><li>one<li>two<li>three</ul>\
     <form action=go><input name=q value=\"a &amp; b\"><textarea>t</textarea>\
     <select><option>x<option selected>y</select></form></body></html>",
    "<html><body><table><tr><td>cell</td></tr></table><p>caf\u{e9} \u{2713}</p>\
     <a href=\"next.html\">link</a><!-- comment --><pre>  keep   spaces </pre></body></html>",
    "<html><body><map name=m><area shape=rect coords=0,0,10,10 href=a.html></map>\
     <div style=\"display:none\"><p>hidden</p></div><p id=end>end</p></body></html>",
];

fn seed_count() -> usize {
    std::env::var("PAGELOAD_CHUNK_PARITY_SEEDS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_SEEDS)
}

fn next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state >> 33
}

fn fixed_plan(len: usize, size: usize) -> Vec<usize> {
    (1..=len.div_ceil(size)).map(|i| (i * size).min(len)).collect()
}

fn random_plan(len: usize, seed: u64) -> Vec<usize> {
    let mut state = seed;
    let mut cuts = Vec::new();
    let mut at = 0;
    while at < len {
        let step = 1 + (next(&mut state) % 9) as usize;
        at = (at + step).min(len);
        cuts.push(at);
    }
    cuts
}

fn config() -> ContentConfig {
    ContentConfig {
        foreground_images: false,
        enable_scripting: false,
        ..ContentConfig::default()
    }
}

fn convert_in_chunks(source: &[u8], cuts: &[usize]) -> (String, String) {
    let mut h = Harness::with_config(config(), false);
    let mut start = 0;
    for &end in cuts {
        h.feed(&source[start..end]);
        start = end;
    }
    h.finish();
    assert_eq!(h.doc().status(), ContentStatus::Done);
    let dom = h.doc().document();
    (serialize(dom, dom.document()), h.doc().debug_dump())
}

#[test]
fn chunk_boundaries_do_not_change_the_result() {
    for (index, case) in CASES.iter().enumerate() {
        let bytes = case.as_bytes();
        let whole = convert_in_chunks(bytes, &[bytes.len()]);
        for size in FIXED_SIZES {
            let actual = convert_in_chunks(bytes, &fixed_plan(bytes.len(), size));
            assert_eq!(whole, actual, "case {index}: chunk size {size}");
        }

        for i in 0..seed_count() {
            let seed = ((index as u64) << 32) | i as u64;
            let cuts = random_plan(bytes.len(), seed);
            let actual = convert_in_chunks(bytes, &cuts);
            assert_eq!(whole, actual, "case {index}: seed {seed:#x} cuts {cuts:?}");
        }
    }
}
