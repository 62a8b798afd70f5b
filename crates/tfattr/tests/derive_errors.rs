//! Rejected `#[derive(FromValue)]`/`#[derive(ToValue)]` inputs and their error messages

#[test]
fn derive_errors() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/*.rs");
}
