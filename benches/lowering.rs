use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use loft::backend::Backend;
use loft::ir::{IRModule, ValueShape};
use loft::lower::concat_along_axis;
use loft::types::DType;

fn bench_static_concat(c: &mut Criterion) {
    let mut group = c.benchmark_group("concat_static");
    for &count in &[2usize, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let gpu = Backend::gpu_reference();
            b.iter(|| {
                let mut ir = IRModule::new();
                let inputs: Vec<_> = (0..count)
                    .map(|_| ir.param(ValueShape::from_static(DType::F32, &[4, 64])))
                    .collect();
                let lowered = concat_along_axis(&mut ir, &gpu, &inputs, 0).unwrap();
                black_box(lowered.value)
            });
        });
    }
    group.finish();
}

fn bench_dynamic_concat(c: &mut Criterion) {
    let mut group = c.benchmark_group("concat_dynamic");
    for &count in &[2usize, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let gpu = Backend::gpu_reference();
            b.iter(|| {
                let mut ir = IRModule::new();
                let inputs: Vec<_> = (0..count)
                    .map(|i| {
                        if i % 2 == 0 {
                            ir.dynamic_param(DType::F32, &[16, 64], 0, Some(16))
                        } else {
                            ir.param(ValueShape::from_static(DType::F32, &[4, 64]))
                        }
                    })
                    .collect();
                let lowered = concat_along_axis(&mut ir, &gpu, &inputs, 0).unwrap();
                black_box(lowered.runtime_extent)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_static_concat, bench_dynamic_concat);
criterion_main!(benches);
