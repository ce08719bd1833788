use dlsim::{Simulator, SimulatorBuilder};
use insta::assert_snapshot;

fn scheduled(code: &str, top: &str) -> String {
    SimulatorBuilder::new(code, top)
        .trace_scheduled_comb_blocks()
        .build_with_trace()
        .trace
        .scheduled_comb_blocks
        .unwrap_or_default()
}

#[test]
fn test_simple_assignment() {
    let code = r#"
        module Top (a: input logic<32>, b: output logic<32>) {
            assign b = a;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 0xDEADBEEF).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("b").unwrap(), 0xDEADBEEF);
}

#[test]
fn test_dependency_chain() {
    let code = r#"
        module Top (a: input logic<32>, b: output logic<32>, c: output logic<32>) {
            assign c = b;
            assign b = a;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 0x12345678).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("c").unwrap(), 0x12345678);
}

#[test]
fn test_dependency_chain_is_scheduled_in_order() {
    let code = r#"
        module Top (a: input logic<8>, y: output logic<8>) {
            var t2: logic<8>;
            var t1: logic<8>;
            assign y = t2 + 8'd1;
            assign t2 = t1 + 8'd1;
            assign t1 = a;
        }
    "#;
    assert_snapshot!(scheduled(code, "Top"), @r"
    t1[7:0] = a[7:0]
    t2[7:0] = (t1[7:0] + 8'h1)
    y[7:0] = (t2[7:0] + 8'h1)
    ");
}

#[test]
fn test_mixed_selects_execution() {
    let code = r#"
        module Top (a: input logic<5>, b: output logic<8>) {
            assign b[0]      = 1'b1;
            assign b[2:1]    = 2'b10;
            assign b[7:3]    = a;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 0b10101).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("b").unwrap(), 0xAD);
}

#[test]
fn test_internal_variable_and_probe() {
    let code = r#"
        module Top (a: input logic<8>, b: input logic<8>, y: output logic<8>) {
            var t: logic<9>;
            assign t = a + b;
            assign y = t[8:1];
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 255).unwrap();
    sim.set_pin_unsigned("b", 255).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("y").unwrap(), 255);
    let t = sim.probe("t").unwrap();
    assert_eq!(t.width(), 9);
    assert_eq!(t.to_u64().unwrap(), 510);
}

#[test]
fn test_unset_inputs_default_to_zero() {
    let code = r#"
        module Top (a: input logic<4>, b: input logic<4>, y: output logic<4>) {
            assign y = a | b;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 0b1010).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("y").unwrap(), 0b1010);
}

#[test]
fn test_constant_only_module() {
    let code = r#"
        module Top (y: output logic<12>) {
            assign y = 12'hABC;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("y").unwrap(), 0xABC);
}

#[test]
fn test_rerun_without_changes_is_stable() {
    let code = r#"
        module Top (a: input logic<16>, y: output logic<16>) {
            assign y = a * 16'd3;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", 30000).unwrap();
    sim.run().unwrap();
    let first = sim.read_pin_unsigned("y").unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("y").unwrap(), first);
    assert_eq!(first, (30000 * 3) % 65536);
    assert_eq!(sim.run_count(), 2);
}

#[test]
fn test_comments_and_literal_forms() {
    let code = r#"
        // line comment
        module Top (
            y0: output logic<8>,
            y1: output logic<8>,
            y2: output logic<8>,
            y3: output logic<8>, /* trailing comma */
        ) {
            assign y0 = 8'b1010_0101;
            assign y1 = 8'o17;
            assign y2 = 0x7f;
            assign y3 = 200;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("y0").unwrap(), 0xA5);
    assert_eq!(sim.read_pin_unsigned("y1").unwrap(), 0o17);
    assert_eq!(sim.read_pin_unsigned("y2").unwrap(), 0x7F);
    assert_eq!(sim.read_pin_unsigned("y3").unwrap(), 200);
}
