//! Benchmarks import throughput across window lengths and formats.

use std::hint::black_box;
use std::io::Write;
use std::time::Duration;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use delimport::{Format, Importer, MemorySinkFactory, Options, Sizing};
use tempfile::NamedTempFile;

/// Writes `rows` records with a header and a quoted column.
fn create_benchmark_file(rows: usize, delimiter: char) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create benchmark file");
    writeln!(file, "id{delimiter}name{delimiter}price{delimiter}note").expect("write header");
    for id in 0..rows {
        writeln!(
            file,
            "{id}{delimiter}name {id}{delimiter}{}.{:02}{delimiter}\"note {delimiter} {id}\"",
            id % 1000,
            id % 100
        )
        .expect("write row");
    }
    file.flush().expect("flush benchmark file");
    file
}

fn standard_criterion_config() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(15)
        .measurement_time(Duration::from_secs(3))
        .warm_up_time(Duration::from_secs(1))
}

fn bench_window_lengths(c: &mut Criterion) {
    let file = create_benchmark_file(20_000, ',');
    let size = file.as_file().metadata().expect("file metadata").len();

    let mut group = c.benchmark_group("window_len");
    group.throughput(Throughput::Bytes(size));
    for window_len in [4 * 1024, 64 * 1024, 1024 * 1024] {
        let sizing = Sizing::from_env().with_window_len(window_len);
        let options = Options::default().with_sizing(sizing);
        group.bench_function(format!("{}kb", window_len / 1024), |b| {
            b.iter(|| {
                let mut factory = MemorySinkFactory::new();
                let summary = Importer::new(options.clone())
                    .import(&mut factory, file.path())
                    .expect("import benchmark file");
                black_box(summary)
            });
        });
    }
    group.finish();
}

fn bench_formats(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");
    for (format, delimiter) in [(Format::Csv, ','), (Format::Pipe, '|'), (Format::Tab, '\t')] {
        let file = create_benchmark_file(10_000, delimiter);
        let options = Options::default().with_format(format).with_header(true);
        group.bench_function(format.to_string(), |b| {
            b.iter(|| {
                let mut factory = MemorySinkFactory::new();
                let summary = Importer::new(options.clone())
                    .import(&mut factory, file.path())
                    .expect("import benchmark file");
                black_box(summary)
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = standard_criterion_config();
    targets = bench_window_lengths, bench_formats
}

criterion_main!(benches);
