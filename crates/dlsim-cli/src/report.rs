use std::fmt;

use dlsim::{PinInfo, PortDirection, Simulator, SimulatorError};
use serde::Serialize;

/// One top-level pin as listed by `dlsim pins`.
#[derive(Debug, Clone, Serialize)]
pub struct PinEntry {
    pub name: String,
    pub direction: String,
    pub width: usize,
}

impl From<&PinInfo> for PinEntry {
    fn from(info: &PinInfo) -> Self {
        Self {
            name: info.name.clone(),
            direction: info.direction.to_string(),
            width: info.width,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PinsReport {
    pub top: String,
    pub pins: Vec<PinEntry>,
}

impl PinsReport {
    pub fn new(sim: &Simulator) -> Self {
        Self {
            top: sim.top().to_string(),
            pins: sim.pins().iter().map(PinEntry::from).collect(),
        }
    }
}

impl fmt::Display for PinsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {}", self.top)?;
        let name_width = self.pins.iter().map(|p| p.name.len()).max().unwrap_or(0);
        for pin in &self.pins {
            writeln!(
                f,
                "  {:<6} {:<name_width$} logic<{}>",
                pin.direction, pin.name, pin.width
            )?;
        }
        Ok(())
    }
}

/// Values are rendered as strings so pins wider than 64 bits survive JSON.
#[derive(Debug, Clone, Serialize)]
pub struct OutputValue {
    pub name: String,
    pub width: usize,
    pub unsigned: String,
    pub signed: String,
    pub hex: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub top: String,
    pub outputs: Vec<OutputValue>,
}

impl RunReport {
    pub fn collect(sim: &Simulator) -> Result<Self, SimulatorError> {
        let mut outputs = Vec::new();
        for pin in sim.pins() {
            if pin.direction != PortDirection::Output {
                continue;
            }
            let unsigned = sim.read_pin_wide(&pin.name)?;
            let signed = sim.read_pin_signed_wide(&pin.name)?;
            outputs.push(OutputValue {
                hex: format!("{unsigned:#x}"),
                unsigned: unsigned.to_string(),
                signed: signed.to_string(),
                name: pin.name,
                width: pin.width,
            });
        }
        Ok(Self {
            top: sim.top().to_string(),
            outputs,
        })
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self.outputs.iter().map(|o| o.name.len()).max().unwrap_or(0);
        for out in &self.outputs {
            writeln!(
                f,
                "{:<name_width$} = {} (signed {}, {})",
                out.name, out.unsigned, out.signed, out.hex
            )?;
        }
        Ok(())
    }
}
