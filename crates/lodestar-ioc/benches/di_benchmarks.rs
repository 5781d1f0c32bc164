//! Performance benchmarks for registration and chain-walk resolution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lodestar_ioc::*;
use std::sync::Arc;

trait Payload: Send + Sync {
    fn size(&self) -> usize;
}

struct Buffer {
    data: Vec<u8>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self { data: vec![0; 1024] }
    }
}

impl Payload for Buffer {
    fn size(&self) -> usize {
        self.data.len()
    }
}

service_contract!(dyn Payload);
implements!(Buffer => dyn Payload);

fn benchmark_registration(c: &mut Criterion) {
    c.bench_function("register_instance", |b| {
        b.iter(|| {
            let container = Container::new("bench");
            let result = container
                .registrar()
                .register_instance::<dyn Payload>(Arc::new(Buffer::default()));
            black_box(result)
        })
    });

    c.bench_function("register_named_implementation", |b| {
        b.iter(|| {
            let container = Container::new("bench");
            let result = container
                .registrar()
                .register_named_implementation::<dyn Payload, Buffer>(black_box("named"));
            black_box(result)
        })
    });
}

fn benchmark_resolution(c: &mut Criterion) {
    let container = Container::new("bench");
    container
        .registrar()
        .register_instance::<dyn Payload>(Arc::new(Buffer::default()))
        .unwrap();
    container
        .registrar()
        .register_implementation_with::<dyn Payload, Buffer>("transient", ServiceLifetime::Transient)
        .unwrap();
    container
        .registrar()
        .register_implementation_with::<dyn Payload, Buffer>("singleton", ServiceLifetime::Singleton)
        .unwrap();

    c.bench_function("resolve_instance", |b| {
        b.iter(|| black_box(container.resolver().resolve::<dyn Payload>().unwrap().size()))
    });

    c.bench_function("resolve_transient", |b| {
        b.iter(|| {
            black_box(
                container
                    .resolver()
                    .resolve_named::<dyn Payload>("transient")
                    .unwrap()
                    .size(),
            )
        })
    });

    c.bench_function("resolve_singleton", |b| {
        b.iter(|| {
            black_box(
                container
                    .resolver()
                    .resolve_named::<dyn Payload>("singleton")
                    .unwrap()
                    .size(),
            )
        })
    });

    c.bench_function("try_resolve_missing", |b| {
        b.iter(|| black_box(container.resolver().try_resolve_named::<dyn Payload>("missing")))
    });
}

fn benchmark_chain_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_through_chain");
    for depth in [1usize, 4, 16, 64] {
        let root = Container::new("root");
        root.registrar()
            .register_instance::<dyn Payload>(Arc::new(Buffer::default()))
            .unwrap();
        let mut leaf = root.clone();
        for level in 1..depth {
            leaf = leaf.create_child(&format!("level-{}", level)).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(depth), &leaf, |b, leaf| {
            b.iter(|| black_box(leaf.resolver().resolve::<dyn Payload>().unwrap().size()))
        });
    }
    group.finish();
}

fn benchmark_ambient(c: &mut Criterion) {
    c.bench_function("ambient_container_load", |b| b.iter(|| black_box(ambient_container())));

    c.bench_function("isolation_scope_enter_exit", |b| {
        b.iter(|| {
            let scope = isolate("bench").unwrap();
            black_box(scope.container().uid())
        })
    });
}

criterion_group!(
    benches,
    benchmark_registration,
    benchmark_resolution,
    benchmark_chain_depth,
    benchmark_ambient
);
criterion_main!(benches);
