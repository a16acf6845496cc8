use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use masker_rs::redactors::{id_redactor, phone_redactor};
use masker_rs::{Masker, RuleUpdate};
use regex::bytes::Regex;
use std::collections::BTreeMap;

struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

fn build_masker() -> Masker {
    let masker = Masker::new();
    let mut rules = BTreeMap::new();
    rules.insert(
        "phone".to_string(),
        RuleUpdate {
            desc: "mobile phone numbers".into(),
            redactor: Some(phone_redactor),
            window: 30,
            keys: ["cell", "phone", "mobile", "telephone", "driver_phone", "p_prefix_*"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        },
    );
    rules.insert(
        "id".to_string(),
        RuleUpdate {
            desc: "national id numbers".into(),
            redactor: Some(id_redactor),
            window: 30,
            keys: ["idcard", "id_no", "identity"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        },
    );
    masker.merge_rules(rules).expect("bench ruleset");
    masker
}

/// Log-like filler with a keyed record roughly every 256 bytes.
fn synthetic_log(len: usize, seed: u64) -> Vec<u8> {
    const RECORDS: &[&[u8]] = &[
        b"cell:13812345678,",
        b"idcard:110101199003070123,",
        b"phone:+8613812345678,",
        b"status:ok,",
    ];
    let mut rng = XorShift64::new(seed);
    let mut out = Vec::with_capacity(len + 32);
    while out.len() < len {
        let record = RECORDS[(rng.next_u64() % RECORDS.len() as u64) as usize];
        out.extend_from_slice(record);
        for _ in 0..230 {
            let b = match rng.next_u64() % 40 {
                0..=25 => b'a' + (rng.next_u64() % 26) as u8,
                26..=35 => b'0' + (rng.next_u64() % 10) as u8,
                36 | 37 => b' ',
                _ => b'=',
            };
            out.push(b);
            if out.len() >= len {
                break;
            }
        }
    }
    out.truncate(len);
    out
}

fn bench_mask_throughput(c: &mut Criterion) {
    let masker = build_masker();
    let mut group = c.benchmark_group("mask");
    for &size in &[4 * 1024usize, 64 * 1024, 256 * 1024] {
        let payload = synthetic_log(size, 0x5eed_cafe_f00d_0001);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("{}k", size / 1024), |b| {
            b.iter(|| {
                let mut buf = payload.clone();
                masker.mask(black_box(&mut buf), i64::MAX);
                black_box(&buf);
            })
        });
    }
    group.finish();
}

fn bench_redactor_vs_regex(c: &mut Criterion) {
    let phone_re = Regex::new(r"((%22|%3a|%3A)?)((\+?86)?)(\d{3})(\d{4})(\d{4})").unwrap();
    let window: &[u8] = b"order=20240731 +8613812345678 rest-of-line";
    let mut buf = window.to_vec();

    let mut group = c.benchmark_group("phone_redactor");
    group.throughput(Throughput::Bytes(window.len() as u64));
    group.bench_function("table_walk", |b| {
        b.iter(|| {
            buf.copy_from_slice(window);
            phone_redactor(black_box(&mut buf));
        })
    });
    group.bench_function("regex_replace", |b| {
        b.iter(|| {
            buf.copy_from_slice(window);
            let replaced = phone_re.replace_all(black_box(&buf), &b"$1$3$5****$7"[..]);
            black_box(replaced.len());
        })
    });
    group.finish();
}

criterion_group!(benches, bench_mask_throughput, bench_redactor_vs_regex);
criterion_main!(benches);
