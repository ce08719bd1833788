use num_bigint::{BigInt, BigUint};

use crate::{
    HashMap, RuntimeErrorCode,
    backend::{InterpreterBackend, MemoryLayout},
    ir::{PinInfo, PinRef, PortDirection, Program},
    value::{Bits, ValueError},
};

mod builder;
mod error;

pub use builder::{SimulatorBuilder, SimulatorOptions};
pub use error::SimulatorError;

/// A built combinational circuit.
///
/// Inputs are written through `set_*`, [`run`](Simulator::run) recomputes
/// every driven net from the current inputs, and outputs are read through
/// `read_*`/`get_*`. Outputs keep the values of the last successful run until
/// the next one.
pub struct Simulator {
    pub(crate) backend: InterpreterBackend,
    pub(crate) program: Program,
    pub(crate) vcd_writer: Option<crate::vcd::VcdWriter>,
    pub(crate) dirty: bool,
    evaluated: bool,
    run_count: u64,
    pins: Vec<(PinInfo, PinRef)>,
    pin_index: HashMap<String, usize>,
    assigned: Vec<bool>,
    require_all_inputs: bool,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("top", &self.program.top)
            .field("pins", &self.pins.len())
            .field("run_count", &self.run_count)
            .finish()
    }
}

impl Simulator {
    pub fn builder<'a>(code: &'a str, top: &'a str) -> SimulatorBuilder<'a> {
        SimulatorBuilder::new(code, top)
    }

    pub(crate) fn with_backend_and_program(
        backend: InterpreterBackend,
        program: Program,
        require_all_inputs: bool,
    ) -> Result<Self, SimulatorError> {
        let mut pins = Vec::new();
        let mut pin_index = HashMap::default();
        for (index, (addr, info)) in program.top_ports().into_iter().enumerate() {
            let (Some(direction), Some(slot)) = (info.direction(), backend.layout().slot(&addr))
            else {
                return Err(RuntimeErrorCode::InternalError(format!(
                    "top port `{}` has no storage",
                    info.name
                ))
                .into());
            };
            pin_index.insert(info.name.clone(), index);
            pins.push((
                PinInfo {
                    name: info.name.clone(),
                    width: info.width,
                    direction,
                },
                PinRef {
                    index,
                    slot,
                    width: info.width,
                    direction,
                },
            ));
        }
        let assigned = vec![false; pins.len()];
        Ok(Self {
            backend,
            program,
            vcd_writer: None,
            dirty: false,
            evaluated: false,
            run_count: 0,
            pins,
            pin_index,
            assigned,
            require_all_inputs,
        })
    }

    /// Resolves a top-level pin name into a [`PinRef`] handle.
    pub fn pin(&self, name: &str) -> Result<PinRef, SimulatorError> {
        self.pin_index
            .get(name)
            .map(|&index| self.pins[index].1)
            .ok_or_else(|| SimulatorError::UnknownPin(name.to_string()))
    }

    /// Top-level pins in declaration order.
    pub fn pins(&self) -> Vec<PinInfo> {
        self.pins.iter().map(|(info, _)| info.clone()).collect()
    }

    pub fn top(&self) -> &str {
        &self.program.top
    }

    /// True when inputs changed since the last successful run.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of successful runs so far.
    pub fn run_count(&self) -> u64 {
        self.run_count
    }

    pub fn layout(&self) -> &MemoryLayout {
        self.backend.layout()
    }

    /// Recomputes every output from the current inputs.
    ///
    /// Either every net is updated or, on error, none is.
    pub fn run(&mut self) -> Result<(), SimulatorError> {
        if self.require_all_inputs
            && let Some((info, _)) = self
                .pins
                .iter()
                .find(|(info, pin)| info.direction == PortDirection::Input && !self.assigned[pin.index])
        {
            return Err(SimulatorError::UnsetInput(info.name.clone()));
        }

        self.backend.eval_comb()?;
        if let Some(writer) = self.vcd_writer.as_mut() {
            let backend = &self.backend;
            writer.dump(self.run_count + 1, |slot| backend.get_pending(slot))?;
        }

        self.backend.commit();
        self.dirty = false;
        self.evaluated = true;
        self.run_count += 1;
        log::trace!("{}: run #{} complete", self.program.top, self.run_count);
        Ok(())
    }

    // Handle-based accessors.

    pub fn set_unsigned(&mut self, pin: PinRef, value: u64) -> Result<(), SimulatorError> {
        self.write(pin, |width| Bits::from_unsigned(value, width))
    }

    pub fn set_signed(&mut self, pin: PinRef, value: i64) -> Result<(), SimulatorError> {
        self.write(pin, |width| Bits::from_signed(value, width))
    }

    pub fn set_wide(&mut self, pin: PinRef, value: BigUint) -> Result<(), SimulatorError> {
        self.write(pin, |width| Bits::from_biguint(value, width))
    }

    pub fn set_signed_wide(&mut self, pin: PinRef, value: &BigInt) -> Result<(), SimulatorError> {
        self.write(pin, |width| Bits::from_bigint(value, width))
    }

    pub fn get_unsigned(&self, pin: PinRef) -> Result<u64, SimulatorError> {
        let bits = self.output(pin)?;
        bits.to_u64()
            .map_err(|_| self.width_mismatch(pin, "read_pin_unsigned"))
    }

    pub fn get_signed(&self, pin: PinRef) -> Result<i64, SimulatorError> {
        let bits = self.output(pin)?;
        bits.to_i64()
            .map_err(|_| self.width_mismatch(pin, "read_pin_signed"))
    }

    pub fn get_bool(&self, pin: PinRef) -> Result<bool, SimulatorError> {
        let bits = self.output(pin)?;
        if pin.width != 1 {
            return Err(self.width_mismatch(pin, "read_pin"));
        }
        Ok(bits.bit(0))
    }

    pub fn get_wide(&self, pin: PinRef) -> Result<BigUint, SimulatorError> {
        Ok(self.output(pin)?.value().clone())
    }

    pub fn get_signed_wide(&self, pin: PinRef) -> Result<BigInt, SimulatorError> {
        Ok(self.output(pin)?.to_bigint())
    }

    /// The raw bit vector of an output pin.
    pub fn get_bits(&self, pin: PinRef) -> Result<&Bits, SimulatorError> {
        self.output(pin)
    }

    // Name-based accessors.

    pub fn set_pin_unsigned(&mut self, name: &str, value: u64) -> Result<(), SimulatorError> {
        self.set_unsigned(self.pin(name)?, value)
    }

    pub fn set_pin_signed(&mut self, name: &str, value: i64) -> Result<(), SimulatorError> {
        self.set_signed(self.pin(name)?, value)
    }

    pub fn set_pin_wide(&mut self, name: &str, value: BigUint) -> Result<(), SimulatorError> {
        self.set_wide(self.pin(name)?, value)
    }

    pub fn set_pin_signed_wide(&mut self, name: &str, value: &BigInt) -> Result<(), SimulatorError> {
        self.set_signed_wide(self.pin(name)?, value)
    }

    pub fn read_pin_unsigned(&self, name: &str) -> Result<u64, SimulatorError> {
        self.get_unsigned(self.pin(name)?)
    }

    pub fn read_pin_signed(&self, name: &str) -> Result<i64, SimulatorError> {
        self.get_signed(self.pin(name)?)
    }

    pub fn read_pin(&self, name: &str) -> Result<bool, SimulatorError> {
        self.get_bool(self.pin(name)?)
    }

    pub fn read_pin_wide(&self, name: &str) -> Result<BigUint, SimulatorError> {
        self.get_wide(self.pin(name)?)
    }

    pub fn read_pin_signed_wide(&self, name: &str) -> Result<BigInt, SimulatorError> {
        self.get_signed_wide(self.pin(name)?)
    }

    /// Reads any net by hierarchical name, e.g. `adder.carry`.
    ///
    /// Unlike pin reads this also reaches internal variables and inputs.
    pub fn probe(&self, path: &str) -> Result<Bits, SimulatorError> {
        let slot = self
            .program
            .resolve_path(path)
            .and_then(|addr| self.backend.layout().slot(&addr))
            .ok_or_else(|| SimulatorError::UnknownPin(path.to_string()))?;
        if !self.evaluated {
            return Err(SimulatorError::NotEvaluated);
        }
        Ok(self.backend.get(slot).clone())
    }

    fn write(
        &mut self,
        pin: PinRef,
        encode: impl FnOnce(usize) -> Result<Bits, ValueError>,
    ) -> Result<(), SimulatorError> {
        if pin.direction != PortDirection::Input {
            return Err(SimulatorError::DirectionMismatch {
                pin: self.pin_name(pin).to_string(),
                expected: PortDirection::Input,
            });
        }
        let bits = encode(pin.width).map_err(|source| SimulatorError::Range {
            pin: self.pin_name(pin).to_string(),
            source,
        })?;
        self.backend.set(pin.slot, bits);
        self.assigned[pin.index] = true;
        self.dirty = true;
        Ok(())
    }

    fn output(&self, pin: PinRef) -> Result<&Bits, SimulatorError> {
        if pin.direction != PortDirection::Output {
            return Err(SimulatorError::DirectionMismatch {
                pin: self.pin_name(pin).to_string(),
                expected: PortDirection::Output,
            });
        }
        if !self.evaluated {
            return Err(SimulatorError::NotEvaluated);
        }
        Ok(self.backend.get(pin.slot))
    }

    fn width_mismatch(&self, pin: PinRef, accessor: &'static str) -> SimulatorError {
        SimulatorError::WidthMismatch {
            pin: self.pin_name(pin).to_string(),
            width: pin.width,
            accessor,
        }
    }

    fn pin_name(&self, pin: PinRef) -> &str {
        self.pins
            .get(pin.index)
            .map(|(info, _)| info.name.as_str())
            .unwrap_or("?")
    }
}
