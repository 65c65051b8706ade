use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use lumigram::feed::merge::{append_page, merge_head};
use lumigram::models::FeedItem;
use std::hint::black_box;

fn items(range: std::ops::Range<i64>) -> Vec<FeedItem> {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    range
        .map(|n| {
            let at = base - Duration::seconds(n);
            FeedItem {
                id: format!("p{n}"),
                image_url: format!("https://img/{n}"),
                caption: String::new(),
                author_id: "author".to_string(),
                created_at: at,
                created_at_millis: at.timestamp_millis(),
            }
        })
        .collect()
}

fn benchmark_merge(c: &mut Criterion) {
    // A long scroll session: 200 pages of 5 already held
    let held = items(0..1000);
    let snapshot = items(-3..2);
    let page = items(1000..1005);

    let mut group = c.benchmark_group("feed_merge");

    group.bench_function("live_snapshot_over_long_feed", |b| {
        b.iter(|| merge_head(black_box(&held), black_box(snapshot.clone())))
    });

    group.bench_function("append_page_to_long_feed", |b| {
        b.iter(|| {
            let mut list = held.clone();
            append_page(&mut list, black_box(page.clone()))
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_merge);
criterion_main!(benches);
