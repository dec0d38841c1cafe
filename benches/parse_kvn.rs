use camino::Utf8Path;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use oem::message::EphemerisMessage;

fn read_sample(name: &str) -> String {
    let path = Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name);
    std::fs::read_to_string(path).expect("sample OEM")
}

fn bench_parse(c: &mut Criterion) {
    let kvn = read_sample("circular_v2.oem");
    let xml = read_sample("circular_v2.xml");

    c.bench_function("parse/kvn", |b| {
        b.iter(|| black_box(EphemerisMessage::from_kvn_str(black_box(&kvn)).ok()))
    });
    c.bench_function("parse/xml", |b| {
        b.iter(|| black_box(EphemerisMessage::from_xml_str(black_box(&xml)).ok()))
    });
}

fn bench_write(c: &mut Criterion) {
    let message = EphemerisMessage::from_kvn_str(&read_sample("circular_v2.oem")).expect("sample");

    c.bench_function("write/kvn", |b| b.iter(|| black_box(message.to_kvn_string())));
    c.bench_function("write/xml", |b| b.iter(|| black_box(message.to_xml_string().ok())));
}

criterion_group!(benches, bench_parse, bench_write);
criterion_main!(benches);
