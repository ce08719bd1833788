use crate::backend::MemoryLayout;
use crate::ir::{InstanceId, InstancePath, Program};
use crate::value::Bits;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Streams net values to a VCD file, one timestamp per run.
pub struct VcdWriter<W: Write = BufWriter<File>> {
    writer: W,
    /// `(slot, identifier, width)` in definition order.
    signals: Vec<(usize, String, usize)>,
    last_values: Vec<Option<Bits>>,
    timestamp: Option<u64>,
}

impl VcdWriter {
    pub fn new<P: AsRef<Path>>(
        path: P,
        program: &Program,
        layout: &MemoryLayout,
    ) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Self::with_writer(BufWriter::new(file), program, layout)
    }
}

impl<W: Write> VcdWriter<W> {
    pub fn with_writer(mut writer: W, program: &Program, layout: &MemoryLayout) -> std::io::Result<Self> {
        writeln!(writer, "$date")?;
        writeln!(
            writer,
            "  {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(writer, "$end")?;
        writeln!(writer, "$version")?;
        writeln!(writer, "  dlsim {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(writer, "$end")?;
        writeln!(writer, "$timescale 1ns $end")?;

        // Parents sort before their children, so scopes open in DFS order.
        let instances: BTreeMap<&InstancePath, InstanceId> =
            program.instance_ids.iter().map(|(path, id)| (path, *id)).collect();

        let mut signals = Vec::new();
        let mut open: Vec<&str> = Vec::new();
        writeln!(writer, "$scope module {} $end", program.top)?;
        for (path, instance_id) in instances {
            let common = open
                .iter()
                .zip(&path.0)
                .take_while(|(a, b)| **a == b.as_str())
                .count();
            while open.len() > common {
                open.pop();
                writeln!(writer, "$upscope $end")?;
            }
            for segment in &path.0[common..] {
                writeln!(writer, "$scope module {} $end", segment)?;
                open.push(segment.as_str());
            }

            for (slot, addr) in layout.addrs.iter().enumerate() {
                if addr.instance_id != instance_id {
                    continue;
                }
                let Some(info) = program.get_variable_info(addr) else {
                    continue;
                };
                let id = Self::generate_vcd_id(signals.len());
                writeln!(writer, "$var wire {} {} {} $end", info.width, id, info.name)?;
                signals.push((slot, id, info.width));
            }
        }
        for _ in 0..open.len() {
            writeln!(writer, "$upscope $end")?;
        }
        writeln!(writer, "$upscope $end")?;
        writeln!(writer, "$enddefinitions $end")?;

        let last_values = vec![None; signals.len()];
        Ok(Self {
            writer,
            signals,
            last_values,
            timestamp: None,
        })
    }

    fn generate_vcd_id(num: usize) -> String {
        let mut id = String::new();
        let mut n = num;
        loop {
            let char = ((n % 94) + 33) as u8 as char;
            id.push(char);
            if n < 94 {
                break;
            }
            n = (n / 94) - 1;
        }
        id.chars().rev().collect()
    }

    /// Writes every net whose value changed since the previous dump.
    ///
    /// The change-tracking state only advances once the write has been flushed.
    pub fn dump<'b>(&mut self, timestamp: u64, get: impl Fn(usize) -> &'b Bits) -> std::io::Result<()> {
        let first = self.timestamp.is_none();
        if self.timestamp.is_none_or(|last| timestamp > last) {
            writeln!(self.writer, "#{}", timestamp)?;
        }
        if first {
            writeln!(self.writer, "$dumpvars")?;
        }

        let mut changed = Vec::new();
        for (index, ((slot, id, width), last)) in self.signals.iter().zip(&self.last_values).enumerate() {
            let current = get(*slot);
            if last.as_ref() == Some(current) {
                continue;
            }
            if *width == 1 {
                writeln!(self.writer, "{}{}", u8::from(current.bit(0)), id)?;
            } else {
                writeln!(self.writer, "b{} {}", current.value().to_str_radix(2), id)?;
            }
            changed.push((index, current.clone()));
        }

        if first {
            writeln!(self.writer, "$end")?;
        }
        self.writer.flush()?;

        self.timestamp = Some(self.timestamp.map_or(timestamp, |last| last.max(timestamp)));
        for (index, value) in changed {
            self.last_values[index] = Some(value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_printable_and_unique() {
        let ids: Vec<_> = (0..200).map(VcdWriter::<Vec<u8>>::generate_vcd_id).collect();
        assert_eq!(ids[0], "!");
        assert_eq!(ids[93], "~");
        assert_eq!(ids[94], "!!");
        let unique: crate::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| id.chars().all(|c| c.is_ascii_graphic())));
    }
}
