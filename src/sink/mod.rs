mod uinput;

pub use uinput::UinputSink;

use crate::event::DecodedOutput;

/// Consumer of decoded reports, one call per input frame.
pub trait EventSink {
    fn emit(&mut self, output: &DecodedOutput) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Keeps every output in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub outputs: Vec<DecodedOutput>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, output: &DecodedOutput) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.outputs.push(output.clone());
        Ok(())
    }
}
