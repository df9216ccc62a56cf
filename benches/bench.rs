use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fault_barrier::{Barrier, catch, run_catching};
use std::panic::{AssertUnwindSafe, catch_unwind};

fn bench_success(c: &mut Criterion) {
    fn rust() {
        let _ = black_box(catch_unwind(|| black_box(42_u32)));
    }

    fn barrier() {
        let _ = black_box(catch(|| black_box(42_u32)));
    }

    fn out_param() {
        let mut error = None;
        let _ = black_box(run_catching(|| Some(black_box(42_u32)), &mut error));
        black_box(error);
    }

    let mut group = c.benchmark_group("success");
    group.bench_function("Rust", |b| b.iter(|| rust()));
    group.bench_function("Barrier", |b| b.iter(|| barrier()));
    group.bench_function("Out-param", |b| b.iter(|| out_param()));
    group.finish();
}

fn bench_fault(c: &mut Criterion) {
    fn rust() {
        let result = catch_unwind(AssertUnwindSafe(|| -> u32 {
            panic!("index out of range");
        }));
        let message = result
            .unwrap_err()
            .downcast::<&'static str>()
            .map(|s| (*s).to_owned());
        let _ = black_box(message);
    }

    fn barrier(barrier: &Barrier) {
        let _ = black_box(barrier.catch(|| -> u32 { panic!("index out of range") }));
    }

    let plain = Barrier::new();
    let with_backtrace = Barrier::new().with_backtrace(true);

    let mut group = c.benchmark_group("fault");
    // The barrier runs first, while its own hook is installed and records captures.
    group.bench_function("Barrier", |b| b.iter(|| barrier(&plain)));
    group.bench_function("Barrier with backtrace", |b| {
        b.iter(|| barrier(&with_backtrace))
    });

    // Silence the default report for the raw `catch_unwind` run only.
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    group.bench_function("Rust", |b| b.iter(|| rust()));
    std::panic::set_hook(previous);

    group.finish();
}

criterion_group!(benches, bench_success, bench_fault);
criterion_main!(benches);
