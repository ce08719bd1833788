use dlsim::{Simulator, SimulatorBuilder};
use insta::assert_snapshot;
use miette::Diagnostic;

fn build_error(code: &str) -> String {
    SimulatorBuilder::new(code, "Top")
        .build()
        .unwrap_err()
        .to_string()
}

#[test]
fn test_combinational_loop_error_readability() {
    let code = r#"
        module Top (
            a: input logic,
            y: output logic
        ) {
            assign y = ~y & a;
        }
    "#;
    assert_snapshot!(build_error(code), @"Combinational loop detected: y[0]");
}

#[test]
fn test_multiple_driver_error_readability() {
    let code = r#"
        module Top (
            a: input logic,
            y: output logic
        ) {
            assign y = a;
            assign y = ~a;
        }
    "#;
    assert_snapshot!(build_error(code), @"Multiple driver detected: y[0], y[0]");
}

#[test]
fn test_undriven_error_readability() {
    let code = r#"
        module Top (a: input logic<4>, y: output logic<4>) {
            assign y[1:0] = a[1:0];
        }
    "#;
    assert_snapshot!(build_error(code), @"Undriven net detected: y[3:2] has no driver");
}

#[test]
fn test_front_end_error_readability() {
    assert_snapshot!(
        build_error("module Top (y: output logic) { assign y = q; }"),
        @"unknown variable `q` in module `Top`"
    );
    assert_snapshot!(
        build_error("module Top (a: input logic<4>, y: output logic) { assign y = a[7]; }"),
        @"bit range [7] is out of bounds for `a` (4 bits) in module `Top`"
    );
    assert_snapshot!(
        build_error("module Top (y: output logic) { assign y = 1'b1 }"),
        @"expected `;`, found `}`"
    );
    assert_snapshot!(
        build_error("module Other (y: output logic) { assign y = 1'b1; }"),
        @"top module `Top` is not defined"
    );
}

#[test]
fn test_runtime_error_readability() {
    let mut sim = Simulator::builder(
        "module Top (a: input logic<4>, y: output logic<4>) { assign y = a; }",
        "Top",
    )
    .build()
    .unwrap();
    assert_snapshot!(
        sim.set_pin_unsigned("a", 16).unwrap_err().to_string(),
        @"cannot set pin `a`: value 16 does not fit in 4 bits as an unsigned integer"
    );
    assert_snapshot!(
        sim.set_pin_signed("a", -9).unwrap_err().to_string(),
        @"cannot set pin `a`: value -9 does not fit in 4 bits as a signed integer"
    );
    assert_snapshot!(
        sim.set_pin_unsigned("y", 1).unwrap_err().to_string(),
        @"pin `y` is not an input pin"
    );
    assert_snapshot!(
        sim.read_pin_unsigned("y").unwrap_err().to_string(),
        @"outputs are not available before the first run"
    );
    sim.run().unwrap();
    assert_snapshot!(
        sim.read_pin("y").unwrap_err().to_string(),
        @"pin `y` is 4 bits wide and cannot be accessed with `read_pin`"
    );
}

#[test]
fn test_syntax_errors_point_into_the_source() {
    let code = "module Top (y: output logic) { assign y = 1 # 1; }";
    let err = Simulator::builder(code, "Top").build().unwrap_err();
    assert_snapshot!(err.to_string(), @"unexpected character `#`");

    let labels: Vec<_> = err.labels().into_iter().flatten().collect();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].offset(), code.find('#').unwrap());
    assert!(err.source_code().is_some());
    assert_eq!(err.code().map(|c| c.to_string()).as_deref(), Some("dlsim::syntax"));
}

#[test]
fn test_diagnostic_codes_and_help() {
    let err = Simulator::builder(
        "module Top (a: input logic) { inst u: Top (a: a); }",
        "Top",
    )
    .build()
    .unwrap_err();
    assert_snapshot!(err.to_string(), @"recursive instantiation: Top -> Top");
    assert_eq!(
        err.code().map(|c| c.to_string()).as_deref(),
        Some("dlsim::recursive_instantiation")
    );
    assert!(err.help().is_some());
}
