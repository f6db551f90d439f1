use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tagspace::address::{translate_block, translate_page};
use tagspace::io::chunks;

fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    group.bench_function("block", |b| {
        b.iter(|| {
            for vaddr in (0..720u32).step_by(16) {
                black_box(translate_block(black_box(vaddr), 1));
            }
        });
    });
    group.bench_function("page", |b| {
        b.iter(|| {
            for vaddr in (0..884u32).step_by(4) {
                black_box(translate_page(black_box(vaddr), 5));
            }
        });
    });
    group.finish();
}

fn bench_chunks(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunks");
    for &len in &[16usize, 144, 720] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| black_box(chunks(0, len, 16).map(|c| c.len).sum::<usize>()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_translate, bench_chunks);
criterion_main!(benches);
