use dlsim::Simulator;
use test_case::test_case;

/// Builds `y = <expr>` over two 8-bit inputs and evaluates it once.
fn eval8(expr: &str, a: u64, b: u64) -> u64 {
    let code = format!(
        "module Top (a: input logic<8>, b: input logic<8>, y: output logic<8>) {{ assign y = {}; }}",
        expr
    );
    let mut sim = Simulator::builder(&code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", a).unwrap();
    sim.set_pin_unsigned("b", b).unwrap();
    sim.run().unwrap();
    sim.read_pin_unsigned("y").unwrap()
}

#[test_case("a + b", 200, 100 => 44; "add wraps")]
#[test_case("a - b", 5, 10 => 251; "sub wraps")]
#[test_case("a * b", 16, 17 => 16; "mul wraps")]
#[test_case("a & b", 0b1100, 0b1010 => 0b1000; "and")]
#[test_case("a | b", 0b1100, 0b1010 => 0b1110; "or")]
#[test_case("a ^ b", 0b1100, 0b1010 => 0b0110; "xor")]
#[test_case("~a", 0x0F, 0 => 0xF0; "bit not")]
#[test_case("-a", 1, 0 => 0xFF; "negate")]
#[test_case("a << b", 0x81, 1 => 0x02; "shl")]
#[test_case("a << b", 0xFF, 8 => 0; "shl past width")]
#[test_case("a >> b", 0x80, 7 => 1; "shr")]
#[test_case("a >>> b", 0x80, 3 => 0xF0; "sar negative")]
#[test_case("a >>> b", 0x40, 3 => 0x08; "sar positive")]
#[test_case("a >>> b", 0x80, 20 => 0xFF; "sar past width")]
#[test_case("$signed_shr(a, b)", 0x90, 4 => 0xF9; "signed shr function")]
fn arithmetic_and_bitwise(expr: &str, a: u64, b: u64) -> u64 {
    eval8(expr, a, b)
}

#[test_case("a == b", 7, 7 => 1; "eq")]
#[test_case("a != b", 7, 7 => 0; "ne")]
#[test_case("a < b", 0x80, 0x01 => 0; "lt unsigned")]
#[test_case("a <= b", 3, 3 => 1; "le unsigned")]
#[test_case("a > b", 0x80, 0x01 => 1; "gt unsigned")]
#[test_case("a >= b", 2, 3 => 0; "ge unsigned")]
#[test_case("$slt(a, b)", 0x80, 0x01 => 1; "lt signed")]
#[test_case("$sle(a, b)", 0xFF, 0xFF => 1; "le signed")]
#[test_case("$sgt(a, b)", 0x80, 0x01 => 0; "gt signed")]
#[test_case("$sge(a, b)", 0x01, 0xFF => 1; "ge signed")]
#[test_case("a && b", 2, 4 => 1; "logic and")]
#[test_case("a || b", 0, 0 => 0; "logic or")]
#[test_case("!a", 0, 0 => 1; "logic not")]
#[test_case("&a", 0xFF, 0 => 1; "reduce and")]
#[test_case("|a", 0, 0 => 0; "reduce or")]
#[test_case("^a", 0b0111, 0 => 1; "reduce xor")]
fn boolean_results_are_one_bit(expr: &str, a: u64, b: u64) -> u64 {
    eval8(expr, a, b)
}

/// Signed comparisons against number literals, on a 16-bit input.
fn signed_compare16(expr: &str, a: i64) -> bool {
    let code = format!(
        "module Top (a: input logic<16>, y: output logic) {{ assign y = {}; }}",
        expr
    );
    let mut sim = Simulator::builder(&code, "Top").build().unwrap();
    sim.set_pin_signed("a", a).unwrap();
    sim.run().unwrap();
    sim.read_pin("y").unwrap()
}

#[test_case("$slt(a, 1)", 0 => true; "zero below one")]
#[test_case("$slt(a, 1)", 1 => false; "one not below one")]
#[test_case("$slt(a, 1)", -3 => true; "negative below one")]
#[test_case("$sge(a, 1)", 0 => false; "zero not at least one")]
#[test_case("$sge(a, 1)", 7 => true; "seven at least one")]
#[test_case("$sgt(a, 0x7F)", 0x80 => true; "hex literal is positive")]
#[test_case("$sle(a, -1)", -1 => true; "negated literal is negative")]
#[test_case("$sgt(1, a)", -32768 => true; "literal on the left")]
fn signed_compare_with_literal(expr: &str, a: i64) -> bool {
    signed_compare16(expr, a)
}

#[test]
fn test_signed_compare_sign_extends_narrow_operand() {
    let code = r#"
        module Top (a: input logic<4>, b: input logic<8>, lt: output logic, wide: output logic) {
            assign lt = $slt(a, b);
            assign wide = $sgt(a, 15);
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_signed("a", -1).unwrap();
    sim.set_pin_signed("b", 0).unwrap();
    sim.run().unwrap();
    assert!(sim.read_pin("lt").unwrap());
    assert!(!sim.read_pin("wide").unwrap());
}

#[test_case(0, 0xAA; "false selects else")]
#[test_case(1, 0x55; "true selects then")]
fn ternary(sel: u64, expected: u64) {
    let code = r#"
        module Top (sel: input logic, a: input logic<8>, b: input logic<8>, o: output logic<8>) {
            assign o = sel ? a : b;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("sel", sel).unwrap();
    sim.set_pin_unsigned("a", 0x55).unwrap();
    sim.set_pin_unsigned("b", 0xAA).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("o").unwrap(), expected);
}

#[test]
fn test_nested_ternary() {
    let code = r#"
        module Top (s1: input logic, s2: input logic, a: input logic<8>, b: input logic<8>, c: input logic<8>, o: output logic<8>) {
            assign o = s1 ? (s2 ? a : b) : c;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 0xAA).unwrap();
    sim.set_pin_unsigned("b", 0xBB).unwrap();
    sim.set_pin_unsigned("c", 0xCC).unwrap();

    for (s1, s2, expected) in [(1, 1, 0xAA), (1, 0, 0xBB), (0, 1, 0xCC), (0, 0, 0xCC)] {
        sim.set_pin_unsigned("s1", s1).unwrap();
        sim.set_pin_unsigned("s2", s2).unwrap();
        sim.run().unwrap();
        assert_eq!(sim.read_pin_unsigned("o").unwrap(), expected, "s1={s1} s2={s2}");
    }
}

#[test]
fn test_concat_and_replicate() {
    let code = r#"
        module Top (a: input logic<4>, b: input logic<4>, y: output logic<16>, r: output logic<12>) {
            assign y = {a, b, a[0], 3'b101, b[3:0]};
            assign r = {3{a}};
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 0b1011).unwrap();
    sim.set_pin_unsigned("b", 0b0110).unwrap();
    sim.run().unwrap();
    assert_eq!(
        sim.read_pin_unsigned("y").unwrap(),
        0b1011_0110_1_101_0110
    );
    assert_eq!(sim.read_pin_unsigned("r").unwrap(), 0b1011_1011_1011);
}

#[test]
fn test_extension_functions() {
    let code = r#"
        module Top (a: input logic<4>, s: output logic<8>, z: output logic<8>) {
            assign s = $sext(a, 8);
            assign z = $zext(a, 8);
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 0b1010).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("s").unwrap(), 0b1111_1010);
    assert_eq!(sim.read_pin_unsigned("z").unwrap(), 0b0000_1010);
    assert_eq!(sim.read_pin_signed("s").unwrap(), -6);
}

#[test]
fn test_carry_is_kept_in_wider_context() {
    // Operands are extended to the 9-bit target before the addition.
    let code = r#"
        module Top (a: input logic<8>, b: input logic<8>, y: output logic<9>) {
            assign y = a + b;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 200).unwrap();
    sim.set_pin_unsigned("b", 100).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("y").unwrap(), 300);
}

#[test]
fn test_comparison_is_self_determined() {
    // `a + b` inside the comparison is evaluated at 8 bits, not at the 16-bit target.
    let code = r#"
        module Top (a: input logic<8>, b: input logic<8>, y: output logic<16>) {
            assign y = (a + b) < a;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 200).unwrap();
    sim.set_pin_unsigned("b", 100).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("y").unwrap(), 1);
}

#[test]
fn test_single_part_concat_is_self_determined() {
    // `{a + b}` is evaluated at 8 bits, so the carry is lost.
    let code = r#"
        module Top (a: input logic<8>, b: input logic<8>, y: output logic<9>, z: output logic<8>) {
            assign y = {a + b};
            assign z = {{2{a[0]}}, b[5:0]};
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 200).unwrap();
    sim.set_pin_unsigned("b", 100).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("y").unwrap(), 44);
    assert_eq!(sim.read_pin_unsigned("z").unwrap(), 0b00_100100);
}

#[test]
fn test_reduction_of_part_select() {
    let code = r#"
        module Top (a: input logic<8>, hi: output logic, lo: output logic) {
            assign hi = &a[7:4];
            assign lo = |a[3:0];
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 0xF0).unwrap();
    sim.run().unwrap();
    assert!(sim.read_pin("hi").unwrap());
    assert!(!sim.read_pin("lo").unwrap());
}
