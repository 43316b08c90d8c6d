//! Validator benchmarks.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use frankenpict_core::{Generator, ParameterSpace, validate};

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    group.sample_size(20);

    for &(n, t) in &[(8usize, 2usize), (16, 2), (8, 3)] {
        let space = ParameterSpace::new(&vec![3; n]).expect("valid space");
        let array = Generator::new(space.clone(), t)
            .expect("generator")
            .run(0)
            .expect("run");
        let id = BenchmarkId::new(format!("3^{n}"), t);
        group.bench_with_input(id, &array, |b, a| {
            b.iter(|| black_box(validate(a.rows(), &space, t).expect("covered")));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
