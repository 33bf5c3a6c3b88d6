use {
    chrono::{TimeZone, Utc},
    criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main},
    std::{hint::black_box, time::Duration},
    subexport::{
        export::{write_csv, write_rows},
        models::{Author, Comment, Post},
        rows::flatten,
    },
    tempfile::TempDir,
};

fn post() -> Post {
    Post {
        id: "1gq2x7z".to_string(),
        title: "What's everyone working on this week?".to_string(),
        author: Author::Named("AutoModerator".to_string()),
        created: Utc.with_ymd_and_hms(2024, 11, 15, 9, 30, 0).unwrap(),
        score: 42,
        upvote_ratio: 0.93,
        num_comments: 0,
        text: "Tell us what you're building, \"quotes\", commas, and all.\nSecond line.".to_string(),
        url: "https://www.reddit.com/r/rust/comments/1gq2x7z/".to_string(),
    }
}

fn comments(count: usize) -> Vec<Comment> {
    (0..count)
        .map(|i| Comment {
            id: format!("c{}", i),
            parent_id: if i == 0 {
                "t3_1gq2x7z".to_string()
            } else {
                format!("t1_c{}", i / 2)
            },
            author: if i % 7 == 0 {
                Author::Deleted
            } else {
                Author::Named(format!("user_{}", i))
            },
            body: "A comment, with \"quotes\" and a line break\nin it. ✨".repeat(1 + i % 4),
            score: (i as i64 % 50) - 10,
            created: Utc.with_ymd_and_hms(2024, 11, 15, 10, 0, 0).unwrap(),
        })
        .collect()
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");
    let post = post();

    for size in [0, 100, 1000] {
        let comments = comments(size);

        group.bench_with_input(BenchmarkId::new("post_with_comments", size), &comments, |b, comments| {
            b.iter(|| flatten(black_box(&post), black_box(comments)))
        });
    }

    group.finish();
}

fn bench_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv");
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();
    let post = post();

    for size in [100, 1000, 10000] {
        let rows = flatten(&post, &comments(size));

        group.bench_with_input(BenchmarkId::new("write_rows/memory", size), &rows, |b, rows| {
            b.iter(|| {
                let mut out = Vec::with_capacity(rows.len() * 256);
                write_rows(black_box(rows), &mut out, b',').unwrap();
                out
            })
        });

        group.bench_with_input(BenchmarkId::new("write_csv/file", size), &rows, |b, rows| {
            b.iter_batched(
                || temp_path.join(format!("bench_{}.csv", size)),
                |path| write_csv(rows, &path, b',').unwrap(),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_main!(rows_bench, csv_bench);

criterion_group! {
    name = rows_bench;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(300);
    targets = bench_flatten
}

criterion_group! {
    name = csv_bench;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets = bench_csv
}
