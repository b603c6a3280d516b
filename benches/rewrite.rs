#![allow(unused)]
extern crate dotmutate;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use dotmutate::prelude::*;
use std::{hint::black_box, sync::Arc};

const METHODS: usize = 200;
const ASSERTS_PER_METHOD: u32 = 10;

fn assert_true(platform: &PlatformTypes, assert_type: &TypeReference) -> MethodReference {
    MethodReference::new(
        assert_type.clone(),
        "True",
        platform.system_void(),
        vec![platform.system_boolean()],
    )
}

/// A test assembly with `METHODS` methods of `ASSERTS_PER_METHOD` asserts each,
/// plus matching debug symbols.
fn fixture(platform: &PlatformTypes, assert_type: &TypeReference) -> (UnitRc, SymbolStore) {
    let symbols = MemorySymbols::new();
    let mut program = TypeDefinition::new("Bench", "Tests");

    for m in 0..METHODS {
        let method_name = format!("Bench.Tests::Case{m}");
        let statements = (0..ASSERTS_PER_METHOD)
            .map(|i| {
                let at = Location::new(method_name.as_str(), i * 8);
                symbols.add(
                    at.clone(),
                    PrimarySourceLocation::new(
                        "Tests.cs",
                        SourceSpan::new(i + 1, 9, i + 1, 40),
                        format!("Assert.True(value{i} > {m});"),
                    ),
                );
                let condition = Expression::located(
                    ExpressionKind::Binary {
                        operator: BinaryOperator::GreaterThan,
                        left: Expression::local(format!("value{i}")),
                        right: Expression::constant(Constant::Int(m as i64)),
                    },
                    vec![at],
                );
                Statement::expression(Expression::call(
                    assert_true(platform, assert_type),
                    None,
                    vec![condition],
                ))
            })
            .collect();
        program = program.with_method(MethodDefinition::new(
            format!("Case{m}"),
            Some(MethodBody::new(statements)),
        ));
    }

    let root = NamespaceDeclaration::new("")
        .with_namespace(NamespaceDeclaration::new("Bench").with_type(program));
    let unit: UnitRc = Arc::new(
        AssemblyBuilder::new("Bench.Tests", "/bench/Bench.Tests.dll")
            .part(CompilationPart::new("Tests.cs", Arc::new(root)))
            .build()
            .into(),
    );

    let store = SymbolStore::new();
    store.register("/bench/Bench.Tests.dll", Arc::new(symbols));
    (unit, store)
}

/// Benchmark the AssertMessage mutator over a unit full of assertions, and the
/// traversal alone with a rewriter that never replaces anything.
fn bench_assert_message(c: &mut Criterion) {
    let platform = PlatformTypes::new(AssemblyIdentity::new(
        "mscorlib",
        AssemblyVersion::new(4, 0, 0, 0),
        "",
        vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89],
    ));
    let xunit = AssemblyIdentity::new("xunit.assert", AssemblyVersion::new(2, 4, 2, 0), "", vec![]);
    let assert_type = TypeReference::new(xunit, "Xunit", "Assert");
    let (unit, symbols) = fixture(&platform, &assert_type);

    let mutator = AssertMessageMutator::xunit(Arc::new(InternTable::new()), &assert_type, &platform);
    let config = TraversalConfig::default();
    let calls = (METHODS as u64) * u64::from(ASSERTS_PER_METHOD);

    let mut group = c.benchmark_group("rewrite");
    group.throughput(Throughput::Elements(calls));
    group.bench_function("assert_message", |b| {
        b.iter(|| {
            let diagnostics = Diagnostics::new();
            let ctx = RewriteContext::new(&symbols, &diagnostics);
            let outcome = mutator.mutate(black_box(&unit), &ctx, &config);
            black_box(outcome.mutations.total())
        });
    });

    struct Identity;
    impl Rewriter for Identity {}

    group.bench_function("identity_walk", |b| {
        b.iter(|| {
            let diagnostics = Diagnostics::new();
            let ctx = RewriteContext::new(&symbols, &diagnostics);
            let outcome = rewrite_unit(black_box(&unit), &mut Identity, &ctx, &config);
            black_box(outcome.mutations.total())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_assert_message);
criterion_main!(benches);
