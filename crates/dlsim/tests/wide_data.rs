use dlsim::{BigInt, BigUint, Simulator, SimulatorError};
use num_traits::{Num, One};

const WIDE: &str = r#"
    module Top (
        a: input logic<128>,
        b: input logic<128>,
        sum: output logic<128>,
        hi: output logic<64>,
        lo: output logic<64>,
        top_bit: output logic,
    ) {
        assign sum = a + b;
        assign hi = sum[127:64];
        assign lo = sum[63:0];
        assign top_bit = sum[127];
    }
"#;

fn hex(s: &str) -> BigUint {
    BigUint::from_str_radix(s, 16).unwrap()
}

#[test]
fn test_wide_addition_carries_across_words() {
    let mut sim = Simulator::builder(WIDE, "Top").build().unwrap();
    sim.set_pin_wide("a", hex("FFFFFFFFFFFFFFFF")).unwrap();
    sim.set_pin_wide("b", BigUint::one()).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_wide("sum").unwrap(), hex("10000000000000000"));
    assert_eq!(sim.read_pin_unsigned("hi").unwrap(), 1);
    assert_eq!(sim.read_pin_unsigned("lo").unwrap(), 0);
}

#[test]
fn test_wide_addition_wraps_at_width() {
    let mut sim = Simulator::builder(WIDE, "Top").build().unwrap();
    let max = (BigUint::one() << 128u32) - 1u32;
    sim.set_pin_wide("a", max.clone()).unwrap();
    sim.set_pin_wide("b", BigUint::from(2u32)).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_wide("sum").unwrap(), BigUint::one());
    assert_eq!(sim.read_pin_signed_wide("sum").unwrap(), BigInt::one());

    assert!(matches!(
        sim.set_pin_wide("a", max + 1u32),
        Err(SimulatorError::Range { .. })
    ));
}

#[test]
fn test_signed_wide_values() {
    let mut sim = Simulator::builder(WIDE, "Top").build().unwrap();
    sim.set_pin_signed_wide("a", &BigInt::from(-10)).unwrap();
    sim.set_pin_signed("b", 3).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_signed_wide("sum").unwrap(), BigInt::from(-7));
    assert!(sim.read_pin("top_bit").unwrap());
    assert_eq!(sim.read_pin_signed("hi").unwrap(), -1);
    assert_eq!(sim.read_pin_unsigned("hi").unwrap(), u64::MAX);

    let min = -(BigInt::one() << 127u32);
    assert!(sim.set_pin_signed_wide("a", &min).is_ok());
    assert!(sim.set_pin_signed_wide("a", &(min - 1)).is_err());
}

#[test]
fn test_narrow_accessors_reject_wide_pins() {
    let mut sim = Simulator::builder(WIDE, "Top").build().unwrap();
    sim.run().unwrap();
    assert!(matches!(
        sim.read_pin_unsigned("sum"),
        Err(SimulatorError::WidthMismatch { width: 128, accessor: "read_pin_unsigned", .. })
    ));
    assert!(matches!(
        sim.read_pin_signed("sum"),
        Err(SimulatorError::WidthMismatch { width: 128, accessor: "read_pin_signed", .. })
    ));
    // 64-bit setters still accept any value that fits.
    sim.set_pin_unsigned("a", u64::MAX).unwrap();
    sim.set_pin_signed("b", i64::MIN).unwrap();
    sim.run().unwrap();
    let expected = BigInt::from(u64::MAX) + BigInt::from(i64::MIN);
    assert_eq!(sim.read_pin_signed_wide("sum").unwrap(), expected);
}

#[test]
fn test_sixty_four_bit_pins_use_the_full_range() {
    let code = r#"
        module Top (a: input logic<64>, y: output logic<64>, n: output logic<64>) {
            assign y = a;
            assign n = -a;
        }
    "#;
    let mut sim = Simulator::builder(code, "Top").build().unwrap();
    sim.set_pin_unsigned("a", u64::MAX).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_unsigned("y").unwrap(), u64::MAX);
    assert_eq!(sim.read_pin_signed("y").unwrap(), -1);
    assert_eq!(sim.read_pin_unsigned("n").unwrap(), 1);

    sim.set_pin_signed("a", i64::MIN).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.read_pin_signed("n").unwrap(), i64::MIN);
}
