//! Factory methods for code model test data.

use crate::metadata::{
    code::{Expression, ExpressionKind, ExpressionRc, Location, MethodCall},
    identity::{AssemblyIdentity, AssemblyVersion},
    references::{MethodReference, PlatformTypes, TypeReference},
};

/// Platform types anchored at a `mscorlib` 4.0 identity with the ECMA token.
pub fn xunit_platform() -> PlatformTypes {
    PlatformTypes::new(AssemblyIdentity::new(
        "mscorlib",
        AssemblyVersion::new(4, 0, 0, 0),
        "",
        vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89],
    ))
}

/// The identity of the `xunit.assert` assembly.
pub fn xunit_identity() -> AssemblyIdentity {
    AssemblyIdentity::new(
        "xunit.assert",
        AssemblyVersion::new(2, 4, 2, 0),
        "",
        vec![0x8d, 0x05, 0xb1, 0xbb, 0x7a, 0x6f, 0xdb, 0x6c],
    )
}

/// `Xunit.Assert`
pub fn xunit_assert_type() -> TypeReference {
    TypeReference::new(xunit_identity(), "Xunit", "Assert")
}

/// `Xunit.Assert::<name>(bool)`
pub fn assert_method(platform: &PlatformTypes, name: &str) -> MethodReference {
    MethodReference::new(
        xunit_assert_type(),
        name,
        platform.system_void(),
        vec![platform.system_boolean()],
    )
}

/// A static `Assert.True(condition)` call.
pub fn assert_true_call(platform: &PlatformTypes, condition: ExpressionRc) -> ExpressionRc {
    Expression::call(assert_method(platform, "True"), None, vec![condition])
}

/// An expression carrying a single IL location.
pub fn located(kind: ExpressionKind, method: &str, offset: u32) -> ExpressionRc {
    Expression::located(kind, vec![Location::new(method, offset)])
}

/// The call held by `expression`; panics if it is not a call.
pub fn expect_call(expression: &ExpressionRc) -> &MethodCall {
    expression
        .as_call()
        .unwrap_or_else(|| panic!("expected a method call, found {:?}", expression.kind))
}
