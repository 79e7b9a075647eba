use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use naked_metamodel::reflect::PrimitiveType;
use naked_metamodel::{
    AssemblyInfo, MethodInfo, ParallelReflector, PropertyInfo, Reflect, Reflector,
    ReflectorConfig, TypeInfo, TypeRef,
};

/// A chain of entity types, each holding a reference and a list of the next one
fn generated_model(types: usize) -> AssemblyInfo {
    let mut assembly = AssemblyInfo::new("Bench");
    for i in 0..types {
        let next = TypeRef::named(format!("Bench.Entity{}", (i + 1) % types));
        assembly = assembly.with_type(
            TypeInfo::class(format!("Bench.Entity{}", i))
                .property(PropertyInfo::new("Name", TypeRef::string()).settable())
                .property(PropertyInfo::new("Count", TypeRef::Primitive(PrimitiveType::Int32)))
                .property(PropertyInfo::new("Next", next.clone()).settable())
                .property(PropertyInfo::new("Children", TypeRef::list_of(next.clone())))
                .method(MethodInfo::new("Title", TypeRef::string()))
                .method(MethodInfo::new("ValidateName", TypeRef::string()).param("value", TypeRef::string()))
                .method(MethodInfo::new("Link", TypeRef::Void).param("target", next.clone()))
                .method(MethodInfo::new("Snapshot", TypeRef::list_of(next))),
        );
    }
    assembly
}

fn config() -> ReflectorConfig {
    ReflectorConfig::default().with_namespace("Bench")
}

fn bench_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential");
    for types in [10, 100, 400] {
        let assemblies = vec![generated_model(types)];
        group.throughput(Throughput::Elements(types as u64));
        group.bench_with_input(BenchmarkId::new("types", types), &assemblies, |b, assemblies| {
            let reflector = Reflector::standard(config());
            b.iter(|| reflector.reflect(black_box(assemblies)).unwrap());
        });
    }
    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel");
    let assemblies = vec![generated_model(400)];
    group.throughput(Throughput::Elements(400));
    for workers in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &assemblies, |b, assemblies| {
            let reflector = ParallelReflector::new(Reflector::standard(config())).with_workers(workers);
            b.iter(|| reflector.reflect(black_box(assemblies)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sequential, bench_parallel);
criterion_main!(benches);
