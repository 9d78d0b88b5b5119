use anya_search::BitpackedGrid;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn checkerboard(size: i32) -> BitpackedGrid {
    let mut grid = BitpackedGrid::new(size, size);
    for y in 0..size {
        for x in 0..size {
            grid.set_cell(x, y, (x + y) % 5 != 0);
        }
    }
    grid
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    group.sample_size(50);

    let size = 1024;
    let grid = checkerboard(size);

    group.bench_function("scan_right_across_middle_row", |b| {
        b.iter(|| {
            let r = grid.scan_right(black_box(0.0), black_box(size / 2));
            black_box(r);
        })
    });

    group.bench_function("scan_cells_left_every_column", |b| {
        b.iter(|| {
            for x in 0..size {
                let r = grid.scan_cells_left(black_box(x), black_box(size / 2));
                black_box(r);
            }
        })
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
