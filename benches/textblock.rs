// benches/textblock.rs
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use os_pipeline::{
    classify,
    config::options::DecodePolicy,
    model::ServiceOrder,
    textblock,
};

fn sample(n: usize) -> Vec<ServiceOrder> {
    let entry = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or_default();
    (0..n)
        .map(|i| ServiceOrder {
            order_id: format!("{}", 40_000 + i),
            fleet_id: Some(format!("FR-{:04}", i % 700)),
            model: Some("Mercedes Actros 2651".into()),
            requester: Some(format!("Solicitante {}", i % 13)),
            provider: (i % 5 != 0).then(|| format!("Oficina {}", i % 37)),
            entry_date: entry,
            estimated_exit_date: (i % 4 != 0).then(|| entry + chrono::Days::new((i % 30) as u64)),
            service_description: Some(match i % 3 {
                0 => "Troca de embreagem\nLiberado Sr. Mauricio".into(),
                1 => "Revisão geral - liberado pelo gestor".into(),
                _ => "Aguardando peça".into(),
            }),
        })
        .collect()
}

fn bench_textblock(c: &mut Criterion) {
    let orders = sample(5_000);
    let doc = textblock::serialize(&orders);

    c.bench_function("serialize_5k", |b| {
        b.iter(|| black_box(textblock::serialize(black_box(&orders)).len()))
    });

    c.bench_function("parse_5k", |b| {
        b.iter(|| {
            let (parsed, _) = textblock::parse(black_box(&doc), DecodePolicy::SkipAndCount).unwrap_or_default();
            black_box(parsed.len())
        })
    });

    c.bench_function("parse_classify_5k", |b| {
        b.iter(|| {
            let (parsed, _) = textblock::parse(black_box(&doc), DecodePolicy::SkipAndCount).unwrap_or_default();
            black_box(classify::classify_all(parsed).len())
        })
    });
}

criterion_group!(benches, bench_textblock);
criterion_main!(benches);
