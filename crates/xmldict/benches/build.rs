use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use xmldict::{build, from_bytes, from_str, Config, Tokenizer};

const SIMPLE_XML: &str = "<root><child>text</child></root>";
const ATTR_XML: &str = "<root id=\"1\" name='test'><item value=\"42\" /></root>";

fn repeated(count: usize) -> String {
    let mut xml = String::from("<list>");
    for i in 0..count {
        xml.push_str(&format!("<item id=\"{i}\"><name>n{i}</name><tag>a</tag><tag>b</tag></item>"));
    }
    xml.push_str("</list>");
    xml
}

fn nested(depth: usize) -> String {
    let mut xml = String::new();
    for _ in 0..depth {
        xml.push_str("<n>");
    }
    xml.push_str("leaf");
    for _ in 0..depth {
        xml.push_str("</n>");
    }
    xml
}

fn bench_simple(c: &mut Criterion) {
    c.bench_function("xmldict_simple", |b| b.iter(|| from_str(black_box(SIMPLE_XML))));
}

fn bench_attr(c: &mut Criterion) {
    c.bench_function("xmldict_attr", |b| b.iter(|| from_str(black_box(ATTR_XML))));
}

fn bench_repeated(c: &mut Criterion) {
    let mut group = c.benchmark_group("xmldict_repeated");
    for count in [10, 100, 1000] {
        let xml = repeated(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &xml, |b, xml| {
            b.iter(|| from_bytes(black_box(xml.as_bytes())))
        });
    }
    group.finish();
}

fn bench_tokenize_only(c: &mut Criterion) {
    let xml = repeated(100);
    c.bench_function("xmldict_tokenize_100", |b| {
        b.iter(|| Tokenizer::new(black_box(xml.as_bytes())).count())
    });
}

fn bench_nested(c: &mut Criterion) {
    let xml = nested(256);
    let config = Config::default();
    c.bench_function("xmldict_nested_256", |b| {
        b.iter(|| build(Tokenizer::new(black_box(xml.as_bytes())), &config))
    });
}

criterion_group!(
    benches,
    bench_simple,
    bench_attr,
    bench_repeated,
    bench_tokenize_only,
    bench_nested
);
criterion_main!(benches);
