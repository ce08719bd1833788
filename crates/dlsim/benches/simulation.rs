use criterion::{Criterion, criterion_group, criterion_main};
use dlsim::Simulator;
use std::hint::black_box;

const ALU: &str = include_str!("../tests/circuits/alu16.dl");

/// A ripple chain of `n` 32-bit adders, each feeding the next.
fn chain(n: usize) -> String {
    let mut code = String::from(
        "module Stage (x: input logic<32>, k: input logic<32>, y: output logic<32>) {\n    assign y = (x + k) ^ (x >> 3);\n}\n",
    );
    code.push_str("module Top (a: input logic<32>, b: input logic<32>, y: output logic<32>) {\n");
    for i in 0..=n {
        code.push_str(&format!("    var t{}: logic<32>;\n", i));
    }
    code.push_str("    assign t0 = a;\n");
    for i in 0..n {
        code.push_str(&format!(
            "    inst s{i}: Stage (x: t{i}, k: b, y: t{next});\n",
            next = i + 1
        ));
    }
    code.push_str(&format!("    assign y = t{};\n}}\n", n));
    code
}

fn benchmark_alu(c: &mut Criterion) {
    c.bench_function("simulation_build_alu16", |b| {
        b.iter(|| {
            let _sim = Simulator::builder(ALU, "Alu16").build().unwrap();
        })
    });

    let mut sim = Simulator::builder(ALU, "Alu16").build().unwrap();
    let a = sim.pin("InputA").unwrap();
    let bb = sim.pin("InputB").unwrap();
    let op = sim.pin("Op").unwrap();
    let out = sim.pin("Output").unwrap();

    c.bench_function("simulation_run_alu16_x1", |b| {
        let mut x = 0u64;
        b.iter(|| {
            x = (x + 7919) & 0xFFFF;
            sim.set_unsigned(a, x).unwrap();
            sim.set_unsigned(bb, x ^ 0x5A5A).unwrap();
            sim.set_unsigned(op, x % 10).unwrap();
            sim.run().unwrap();
            black_box(sim.get_unsigned(out).unwrap())
        })
    });
}

fn benchmark_chain(c: &mut Criterion) {
    let code = chain(256);
    c.bench_function("simulation_build_chain_n256", |b| {
        b.iter(|| {
            let _sim = Simulator::builder(&code, "Top").build().unwrap();
        })
    });

    let mut sim = Simulator::builder(&code, "Top").build().unwrap();
    sim.set_pin_unsigned("b", 0x9E37_79B9).unwrap();
    c.bench_function("simulation_run_chain_n256_x1", |b| {
        let mut x = 0u64;
        b.iter(|| {
            x = x.wrapping_add(1) & 0xFFFF_FFFF;
            sim.set_pin_unsigned("a", x).unwrap();
            sim.run().unwrap();
            black_box(sim.read_pin_unsigned("y").unwrap())
        })
    });
}

criterion_group!(benches, benchmark_alu, benchmark_chain);
criterion_main!(benches);
