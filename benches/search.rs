use anya_search::{AnyaExpander, BitpackedGrid, Point, Search};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn open_grid(size: i32) -> BitpackedGrid {
    let mut grid = BitpackedGrid::new(size, size);
    for y in 0..size {
        for x in 0..size {
            grid.set_cell(x, y, true);
        }
    }
    grid
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(30);

    let size = 256;
    let grid = open_grid(size);
    let start = Point::new(0, 0);
    let target = Point::new(size - 1, size - 1);

    group.bench_function("corner_to_corner_open_grid", |b| {
        b.iter(|| {
            let mut expander = AnyaExpander::new(&grid, black_box(target));
            let mut search = Search::new();
            let cost = search.search_costonly(&mut expander, black_box(start), black_box(target));
            black_box(cost);
        })
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
