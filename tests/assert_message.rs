//! Integration tests for the AssertMessage mutator.
//!
//! Each test builds a small test assembly whose method bodies call assertion
//! methods, registers debug symbols for it and checks the rewritten unit.

use std::sync::Arc;

use dotmutate::{
    metadata::{references::CallingConvention, unit::NamespaceState},
    prelude::*,
};

const RUN: &str = "Tests.Program::Run";

fn platform() -> PlatformTypes {
    PlatformTypes::new(AssemblyIdentity::new(
        "mscorlib",
        AssemblyVersion::new(4, 0, 0, 0),
        "",
        vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89],
    ))
}

fn assert_type() -> TypeReference {
    let xunit = AssemblyIdentity::new(
        "xunit.assert",
        AssemblyVersion::new(2, 4, 2, 0),
        "",
        vec![0x8d, 0x05, 0xb1, 0xbb, 0x7a, 0x6f, 0xdb, 0x6c],
    );
    TypeReference::new(xunit, "Xunit", "Assert")
}

fn assert_method(name: &str) -> MethodReference {
    let platform = platform();
    MethodReference::new(
        assert_type(),
        name,
        platform.system_void(),
        vec![platform.system_boolean()],
    )
}

fn xunit_mutator() -> AssertMessageMutator {
    AssertMessageMutator::xunit(Arc::new(InternTable::new()), &assert_type(), &platform())
}

/// `x > 0` compiled at `RUN+offset`.
fn greater_than_zero(offset: u32) -> ExpressionRc {
    Expression::located(
        ExpressionKind::Binary {
            operator: BinaryOperator::GreaterThan,
            left: Expression::local("x"),
            right: Expression::constant(Constant::Int(0)),
        },
        vec![Location::new(RUN, offset)],
    )
}

fn tests_assembly(location: &str, statements: Vec<StatementRc>) -> UnitRc {
    let program = TypeDefinition::new("Tests", "Program")
        .with_method(MethodDefinition::new("Run", Some(MethodBody::new(statements))));
    let root = NamespaceDeclaration::new("")
        .with_namespace(NamespaceDeclaration::new("Tests").with_type(program));

    Arc::new(
        AssemblyBuilder::new("Tests", location)
            .part(CompilationPart::new("Tests.cs", Arc::new(root)))
            .build()
            .into(),
    )
}

fn source(line: u32, text: &str) -> PrimarySourceLocation {
    PrimarySourceLocation::new(
        "Tests.cs",
        SourceSpan::new(line, 9, line, 9 + text.len() as u32),
        text,
    )
}

fn run_statements(unit: &UnitRc) -> Vec<StatementRc> {
    let types = unit.root_namespace().types();
    let program = types
        .iter()
        .find(|ty| ty.name == "Program")
        .expect("Program type");
    program.methods[0]
        .body
        .as_ref()
        .expect("Run body")
        .block
        .statements
        .clone()
}

fn statement_call(statement: &StatementRc) -> (ExpressionRc, MethodCall) {
    match &statement.kind {
        StatementKind::Expression(expression) => {
            let call = expression.as_call().expect("call").clone();
            (Arc::clone(expression), call)
        }
        other => panic!("expected expression statement, found {other:?}"),
    }
}

#[test]
fn test_xunit_assert_true_gets_condition_text() {
    let call = Expression::located(
        ExpressionKind::MethodCall(MethodCall {
            method: assert_method("True"),
            this: None,
            arguments: vec![greater_than_zero(0x2)],
        }),
        vec![Location::new(RUN, 0x0)],
    );
    let unit = tests_assembly("/bin/Tests.dll", vec![Statement::expression(call)]);

    let symbols = SymbolStore::new();
    symbols.register(
        "/bin/Tests.dll",
        Arc::new(MemorySymbols::new().with(Location::new(RUN, 0x2), source(12, "Assert.True(x > 0);"))),
    );
    let diagnostics = Diagnostics::new();
    let ctx = RewriteContext::new(&symbols, &diagnostics);

    let outcome = xunit_mutator().mutate(&unit, &ctx, &TraversalConfig::default());

    assert_eq!(outcome.mutations.total(), 1);
    assert!(!outcome.aborted);
    assert!(!diagnostics.has_any());

    let statements = run_statements(&outcome.unit);
    let (expression, call) = statement_call(&statements[0]);
    assert_eq!(call.method, assert_method("True").with_extra_parameter(platform().system_string()));
    assert_eq!(call.arguments.len(), 2);
    assert_eq!(call.arguments[0], greater_than_zero(0x2));
    assert_eq!(
        call.arguments[1].kind,
        ExpressionKind::Constant(Constant::String("x > 0".to_string()))
    );
    assert_eq!(expression.locations, vec![Location::new(RUN, 0x0)]);

    // Everything outside the code subtree is shared with the input
    assert_eq!(outcome.unit.identity(), unit.identity());
    assert_eq!(outcome.unit.location(), unit.location());
    assert_eq!(outcome.unit.kind(), unit.kind());
}

#[test]
fn test_custom_assert_method_entry() {
    let platform = platform();
    let checks = TypeReference::new(
        AssemblyIdentity::new("Tests", AssemblyVersion::new(1, 0, 0, 0), "", vec![]),
        "Tests",
        "Checks",
    );
    let assert = MethodReference::new(
        checks,
        "Assert",
        platform.system_void(),
        vec![platform.system_boolean()],
    );

    let mut table = SignatureTable::new(Arc::new(InternTable::new()));
    table.register(&assert, assert.with_extra_parameter(platform.system_string()));
    let mutator = AssertMessageMutator::new(table);

    let call = Expression::call(assert.clone(), None, vec![greater_than_zero(0x4)]);
    let unit = tests_assembly("/bin/Tests.dll", vec![Statement::expression(call)]);

    let symbols = SymbolStore::new();
    symbols.register(
        "/bin/Tests.dll",
        Arc::new(MemorySymbols::new().with(Location::new(RUN, 0x4), source(20, "Assert(x > 0);"))),
    );
    let diagnostics = Diagnostics::new();
    let outcome = mutator.mutate(
        &unit,
        &RewriteContext::new(&symbols, &diagnostics),
        &TraversalConfig::default(),
    );

    assert_eq!(outcome.mutations.total(), 1);
    let (_, call) = statement_call(&run_statements(&outcome.unit)[0]);
    assert_eq!(call.method.name, "Assert");
    assert_eq!(call.method.parameters.len(), 2);
    assert_eq!(call.arguments[0], greater_than_zero(0x4));
    assert_eq!(
        call.arguments[1].kind,
        ExpressionKind::Constant(Constant::String("x > 0".to_string()))
    );
}

#[test]
fn test_unregistered_call_is_untouched() {
    let platform = platform();
    let equal = MethodReference::new(
        assert_type(),
        "Equal",
        platform.system_void(),
        vec![platform.system_int32(), platform.system_int32()],
    );
    let call = Expression::call(
        equal,
        None,
        vec![Expression::constant(Constant::Int(1)), Expression::local("x")],
    );
    let unit = tests_assembly("/bin/Tests.dll", vec![Statement::expression(call)]);

    let symbols = SymbolStore::new();
    symbols.register("/bin/Tests.dll", Arc::new(MemorySymbols::new()));
    let diagnostics = Diagnostics::new();

    let outcome = xunit_mutator().mutate(
        &unit,
        &RewriteContext::new(&symbols, &diagnostics),
        &TraversalConfig::default(),
    );

    assert_eq!(outcome.mutations.total(), 0);
    assert!(Arc::ptr_eq(&outcome.unit, &unit));
    assert!(!diagnostics.has_any());
}

#[test]
fn test_missing_symbols_aborts_unit() {
    let call = Expression::call(assert_method("True"), None, vec![greater_than_zero(0x2)]);
    let unit = tests_assembly("/bin/NoPdb.dll", vec![Statement::expression(call)]);

    let symbols = SymbolStore::new();
    symbols.register("/bin/Tests.dll", Arc::new(MemorySymbols::new()));
    let diagnostics = Diagnostics::new();

    let outcome = xunit_mutator().mutate(
        &unit,
        &RewriteContext::new(&symbols, &diagnostics),
        &TraversalConfig::default(),
    );

    assert!(outcome.aborted);
    assert_eq!(outcome.mutations.total(), 0);
    assert!(Arc::ptr_eq(&outcome.unit, &unit));

    let errors = diagnostics.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(diagnostics.count(), 1);
    assert_eq!(errors[0].message, "missing symbols for /bin/NoPdb.dll");
    assert_eq!(errors[0].category, DiagnosticCategory::Symbols);
    assert_eq!(errors[0].unit.as_deref(), Some("/bin/NoPdb.dll"));
    assert_eq!(errors[0].mutator, Some("AssertMessage"));
}

#[test]
fn test_nested_and_instance_calls() {
    let platform = platform();
    let condition = greater_than_zero(0x10);

    // if (ready) { checker.True(x > 0); } else { Assert.False(x > 0); }
    let instance_true = MethodReference {
        calling_convention: CallingConvention::HAS_THIS,
        ..assert_method("True")
    };
    let then_call = Expression::call(
        instance_true.clone(),
        Some(Expression::local("checker")),
        vec![Arc::clone(&condition)],
    );
    let else_call = Expression::call(assert_method("False"), None, vec![greater_than_zero(0x20)]);
    let statement = Statement::new(StatementKind::If {
        condition: Expression::local("ready"),
        then: Statement::new(StatementKind::Block(Block::new(vec![Statement::expression(
            then_call,
        )]))),
        otherwise: Some(Statement::expression(else_call)),
    });
    let unit = tests_assembly("/bin/Tests.dll", vec![statement]);

    let mut table = SignatureTable::xunit(Arc::new(InternTable::new()), &assert_type(), &platform);
    table.register(
        &instance_true,
        instance_true.with_extra_parameter(platform.system_string()),
    );
    let mutator = AssertMessageMutator::new(table);

    let symbols = SymbolStore::new();
    symbols.register(
        "/bin/Tests.dll",
        Arc::new(
            MemorySymbols::new()
                .with(Location::new(RUN, 0x10), source(3, "checker.True(x > 0);"))
                .with(Location::new(RUN, 0x20), source(5, "Assert.False(x > 0);")),
        ),
    );
    let diagnostics = Diagnostics::new();
    let outcome = mutator.mutate(
        &unit,
        &RewriteContext::new(&symbols, &diagnostics),
        &TraversalConfig::default(),
    );

    assert_eq!(outcome.mutations.total(), 2);
    assert_eq!(outcome.mutations.of(NodeKind::MethodCall), 2);

    let statements = run_statements(&outcome.unit);
    let StatementKind::If {
        then, otherwise, ..
    } = &statements[0].kind
    else {
        panic!("expected if statement");
    };
    let StatementKind::Block(block) = &then.kind else {
        panic!("expected block");
    };
    let (_, then_call) = statement_call(&block.statements[0]);
    assert_eq!(then_call.this, Some(Expression::local("checker")));
    assert_eq!(
        then_call.arguments[1].kind,
        ExpressionKind::Constant(Constant::String("x > 0".to_string()))
    );

    let (_, else_call) = statement_call(otherwise.as_ref().expect("else branch"));
    assert_eq!(else_call.method.name, "False");
    assert_eq!(
        else_call.arguments[1].kind,
        ExpressionKind::Constant(Constant::String("x > 0".to_string()))
    );
}

#[test]
fn test_shared_call_rewritten_once() {
    let call = Expression::call(assert_method("True"), None, vec![greater_than_zero(0x2)]);
    let unit = tests_assembly(
        "/bin/Tests.dll",
        vec![
            Statement::expression(Arc::clone(&call)),
            Statement::expression(Arc::clone(&call)),
        ],
    );

    let symbols = SymbolStore::new();
    symbols.register(
        "/bin/Tests.dll",
        Arc::new(MemorySymbols::new().with(Location::new(RUN, 0x2), source(1, "Assert.True(x > 0);"))),
    );
    let diagnostics = Diagnostics::new();
    let outcome = xunit_mutator().mutate(
        &unit,
        &RewriteContext::new(&symbols, &diagnostics),
        &TraversalConfig::default(),
    );

    assert_eq!(outcome.mutations.total(), 1);
    let statements = run_statements(&outcome.unit);
    let (first, _) = statement_call(&statements[0]);
    let (second, _) = statement_call(&statements[1]);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_pipeline_over_many_units() {
    let interner = Arc::new(InternTable::new());
    let pipeline = MutationPipeline::new(PipelineConfig::default())
        .with_mutator(Arc::new(AssertMessageMutator::xunit(
            Arc::clone(&interner),
            &assert_type(),
            &platform(),
        )));
    assert_eq!(pipeline.mutator_names(), vec!["AssertMessage"]);

    let symbols = SymbolStore::new();
    let mut units = Vec::new();
    for i in 0..12 {
        let location = format!("/bin/Tests{i}.dll");
        let call = Expression::call(assert_method("True"), None, vec![greater_than_zero(0x2)]);
        units.push(tests_assembly(&location, vec![Statement::expression(call)]));
        if i % 4 != 0 {
            symbols.register(
                location,
                Arc::new(MemorySymbols::new().with(Location::new(RUN, 0x2), source(1, "Assert.True(x > 0);"))),
            );
        }
    }

    let diagnostics = Diagnostics::new();
    let report = pipeline.run_all(&units, &RewriteContext::new(&symbols, &diagnostics));

    assert_eq!(report.units.len(), 12);
    assert_eq!(report.completed_count(), 9);
    assert_eq!(report.aborted_count(), 3);
    assert_eq!(report.total_mutations(), 9);
    assert_eq!(diagnostics.error_count(), 3);

    for (i, unit_report) in report.units.iter().enumerate() {
        assert_eq!(unit_report.unit.location(), format!("/bin/Tests{i}.dll"));
        if i % 4 == 0 {
            assert_eq!(unit_report.status, UnitStatus::Aborted);
            assert!(Arc::ptr_eq(&unit_report.unit, &units[i]));
        } else {
            assert_eq!(unit_report.per_mutator, vec![("AssertMessage", 1)]);
        }
    }
}

#[test]
fn test_rewritten_unit_rebuilds_namespace_lazily() {
    let call = Expression::call(assert_method("True"), None, vec![greater_than_zero(0x2)]);
    let unit = tests_assembly("/bin/Tests.dll", vec![Statement::expression(call)]);
    assert_eq!(unit.all_types().len(), 3);

    let symbols = SymbolStore::new();
    symbols.register("/bin/Tests.dll", Arc::new(MemorySymbols::new()));
    let diagnostics = Diagnostics::new();
    let outcome = xunit_mutator().mutate(
        &unit,
        &RewriteContext::new(&symbols, &diagnostics),
        &TraversalConfig::default(),
    );

    assert_eq!(outcome.unit.module().namespace_state(), NamespaceState::Unbuilt);
    let names: Vec<String> = outcome
        .unit
        .all_types()
        .iter()
        .map(|ty| ty.name.clone())
        .collect();
    assert_eq!(names, vec!["<Module>", "__Globals__", "Program"]);
    assert_eq!(outcome.unit.module().namespace_state(), NamespaceState::Built);
}

#[test]
fn test_deep_sibling_expression_keeps_rewrite() {
    let outcome = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let call = Expression::call(assert_method("True"), None, vec![greater_than_zero(0x2)]);
            let chain = (0..1000).fold(Expression::local("x"), |chain, _| {
                Expression::binary(BinaryOperator::Add, chain, Expression::local("y"))
            });
            let unit = tests_assembly(
                "/bin/Tests.dll",
                vec![Statement::expression(call), Statement::expression(chain)],
            );

            let symbols = SymbolStore::new();
            symbols.register(
                "/bin/Tests.dll",
                Arc::new(MemorySymbols::new().with(Location::new(RUN, 0x2), source(4, "Assert.True(x > 0);"))),
            );
            let diagnostics = Diagnostics::new();
            let outcome = xunit_mutator().mutate(
                &unit,
                &RewriteContext::new(&symbols, &diagnostics),
                &TraversalConfig::default(),
            );

            let (_, call) = statement_call(&run_statements(&outcome.unit)[0]);
            let message = call.arguments.get(1).map(|argument| argument.kind.clone());
            (outcome.mutations.total(), outcome.aborted, diagnostics.count(), message)
        })
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(
        outcome,
        (
            1,
            false,
            0,
            Some(ExpressionKind::Constant(Constant::String("x > 0".to_string())))
        )
    );
}
