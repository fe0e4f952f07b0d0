use criterion::{Criterion, black_box, criterion_group, criterion_main};
use html::{BindingParams, parse_chunked, parse_document, tokenize};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

fn make_blocks(blocks: usize) -> String {
    let mut out = String::with_capacity(blocks * 64 + 64);
    out.push_str("<!doctype html><html><head><title>bench</title></head><body>");
    for _ in 0..blocks {
        out.push_str("<div class=box><span>hello</span><img src=x></div>");
    }
    out.push_str("</body></html>");
    out
}

fn make_rawtext_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 32);
    body.push_str("<script>");
    while body.len() < bytes {
        body.push_str("</scri");
        body.push('<');
        body.push_str("pt");
    }
    body.push_str("</script>");
    body
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| black_box(tokenize(black_box(&input)).len()));
    });
}

fn bench_parse_large_end_to_end(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_parse_large_end_to_end", |b| {
        b.iter(|| {
            let dom = parse_document(black_box(input.as_bytes()), BindingParams::default());
            black_box(dom.map(|d| d.len()).unwrap_or(0))
        });
    });
}

fn bench_streaming_chunked(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let bytes = input.as_bytes();
    let chunk_sizes = [1usize, 2, 3, 7, 64, 128, 256, 1024];
    let mut chunks = Vec::new();
    let mut offset = 0usize;
    let mut size_idx = 0usize;
    while offset < bytes.len() {
        let end = (offset + chunk_sizes[size_idx % chunk_sizes.len()]).min(bytes.len());
        chunks.push(&bytes[offset..end]);
        offset = end;
        size_idx += 1;
    }
    c.bench_function("bench_streaming_chunked", |b| {
        b.iter(|| {
            let dom = parse_chunked(chunks.iter().copied(), BindingParams::default());
            black_box(dom.map(|d| d.len()).unwrap_or(0))
        });
    });
}

fn bench_tokenize_rawtext_adversarial(c: &mut Criterion) {
    let input = make_rawtext_adversarial(512 * 1024);
    c.bench_function("bench_tokenize_rawtext_adversarial", |b| {
        b.iter(|| black_box(tokenize(black_box(&input)).len()));
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_parse_large_end_to_end,
    bench_streaming_chunked,
    bench_tokenize_rawtext_adversarial
);
criterion_main!(benches);
