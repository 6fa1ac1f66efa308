//! Value change dump writer.
//!
//! Produces the textual format understood by common waveform viewers: a
//! header declaring every signal inside its module scope, the initial values
//! under `$dumpvars`, then one `#<time>` section per instant with changes.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{debug, warn};

use super::{Logger, SignalInfo};
use crate::core::error::{SimError, SimResult};
use crate::core::time::{SimTime, Timescale};
use crate::core::values::{Value, ValueKind};

#[derive(Default)]
struct ScopeNode {
    name: String,
    signals: Vec<usize>,
    children: Vec<ScopeNode>,
}

impl ScopeNode {
    fn child(&mut self, name: &str) -> &mut ScopeNode {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(ScopeNode { name: name.to_string(), ..Default::default() });
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }
}

/// Writes a value change dump to any `Write` sink.
pub struct VcdLogger<W: Write> {
    out: W,
    /// Identifier code per signal index.
    codes: Vec<String>,
    last_time: Option<SimTime>,
    /// First write failure; reported by the next flush.
    error: Option<io::Error>,
}

impl VcdLogger<BufWriter<File>> {
    /// Create a dump file at `path`.
    pub fn create(path: impl AsRef<Path>) -> SimResult<Self> {
        let file = File::create(path.as_ref())?;
        debug!("Writing value change dump to {}", path.as_ref().display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> VcdLogger<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            codes: Vec::new(),
            last_time: None,
            error: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self, signals: &[SignalInfo], timescale: Timescale) -> io::Result<()> {
        let unit = timescale
            .unit_string()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        writeln!(self.out, "$version sigsim {} $end", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.out, "$timescale {} $end", unit)?;

        let mut root = ScopeNode::default();
        for (index, info) in signals.iter().enumerate() {
            let mut node = &mut root;
            for part in info.scope.split('.') {
                node = node.child(part);
            }
            node.signals.push(index);
        }
        for child in &root.children {
            self.write_scope(child, signals)?;
        }
        writeln!(self.out, "$enddefinitions $end")?;

        writeln!(self.out, "#0")?;
        writeln!(self.out, "$dumpvars")?;
        for (index, info) in signals.iter().enumerate() {
            let line = format_change(&info.initial, &self.codes[index]);
            writeln!(self.out, "{}", line)?;
        }
        writeln!(self.out, "$end")?;
        self.last_time = Some(SimTime::ZERO);
        Ok(())
    }

    fn write_scope(&mut self, node: &ScopeNode, signals: &[SignalInfo]) -> io::Result<()> {
        writeln!(self.out, "$scope module {} $end", node.name)?;
        for &index in &node.signals {
            let info = &signals[index];
            let (var_type, width) = var_declaration(info.kind);
            writeln!(
                self.out,
                "$var {} {} {} {} $end",
                var_type, width, self.codes[index], info.name
            )?;
        }
        for child in &node.children {
            self.write_scope(child, signals)?;
        }
        writeln!(self.out, "$upscope $end")
    }

    fn write_change(&mut self, index: usize, time: SimTime, value: &Value) -> io::Result<()> {
        if self.last_time != Some(time) {
            writeln!(self.out, "#{}", time.ticks())?;
            self.last_time = Some(time);
        }
        let line = format_change(value, &self.codes[index]);
        writeln!(self.out, "{}", line)
    }
}

impl<W: Write> Logger for VcdLogger<W> {
    fn register(&mut self, signals: &[SignalInfo], timescale: Timescale) -> SimResult<()> {
        self.codes = (0..signals.len()).map(identifier_code).collect();
        self.write_header(signals, timescale)?;
        Ok(())
    }

    fn on_signal_change(&mut self, signal: &SignalInfo, time: SimTime, value: &Value) {
        if self.error.is_some() {
            return;
        }
        let index = signal.id.index();
        if index >= self.codes.len() {
            warn!("Change of unregistered signal {} ignored", signal.path);
            return;
        }
        if let Err(err) = self.write_change(index, time, value) {
            warn!("Value change dump write failed at {}: {}", time, err);
            self.error = Some(err);
        }
    }

    fn flush(&mut self, _time: SimTime) -> SimResult<()> {
        if let Some(err) = self.error.take() {
            return Err(SimError::Logger(err.to_string()));
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Short printable identifier for the signal at `index`: `!`, `"`, ... `~`,
/// then two characters and so on.
fn identifier_code(index: usize) -> String {
    let mut code = String::new();
    let mut n = index;
    loop {
        code.push(char::from(b'!' + (n % 94) as u8));
        n /= 94;
        if n == 0 {
            break;
        }
    }
    code
}

fn var_declaration(kind: ValueKind) -> (&'static str, u32) {
    match kind {
        ValueKind::Bit => ("wire", 1),
        ValueKind::Int => ("integer", 64),
        ValueKind::Real => ("real", 64),
        ValueKind::Vector(width) => ("wire", u32::from(width)),
        ValueKind::Str => ("string", 1),
    }
}

fn format_change(value: &Value, code: &str) -> String {
    match value {
        Value::Bit(bit) => format!("{}{}", u8::from(*bit), code),
        Value::Int(v) => format!("b{:b} {}", *v as u64, code),
        Value::Vector { width, bits } => {
            format!("b{:0w$b} {}", bits, code, w = usize::from(*width))
        }
        Value::Real(v) => format!("r{} {}", v, code),
        Value::Str(text) => {
            let text: String = text
                .chars()
                .map(|c| if c.is_whitespace() { '_' } else { c })
                .collect();
            format!("s{} {}", text, code)
        }
    }
}
