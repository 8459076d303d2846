//! Print decoded reports for debugging.
//! Run: magic-pad dump [--device /dev/hidrawN]

use std::io::Write;
use std::time::Instant;

use crate::config::Config;
use crate::decoder::Decoder;
use crate::event::DecodedOutput;
use crate::forward::Session;
use crate::hidraw::MAX_REPORT_SIZE;
use crate::sink::EventSink;

/// Writes one line per output frame plus one per touch.
pub struct PrintSink<W> {
    out: W,
    count: u64,
}

impl<W: Write> PrintSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, count: 0 }
    }
}

fn button_label(output: &DecodedOutput) -> String {
    let b = output.buttons;
    let mut label = String::new();
    for (pressed, c) in [(b.left, 'L'), (b.middle, 'M'), (b.right, 'R')] {
        label.push(if pressed { c } else { '-' });
    }
    label
}

impl<W: Write> EventSink for PrintSink<W> {
    fn emit(&mut self, output: &DecodedOutput) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.count += 1;
        write!(
            self.out,
            "{:6}  buttons={} contacts={}",
            self.count,
            button_label(output),
            output.active_touches
        )?;
        if let Some((dx, dy)) = output.motion {
            write!(self.out, " rel=({},{})", dx, dy)?;
        }
        if let Some((h, v)) = output.wheel {
            write!(self.out, " wheel=({},{})", h, v)?;
        }
        if let Some((h, v)) = output.wheel_hr {
            write!(self.out, " wheel_hr=({},{})", h, v)?;
        }
        writeln!(self.out)?;

        for t in &output.touches {
            write!(
                self.out,
                "        id={:2} {} x={:5} y={:5} size={:3} major={:3} minor={:3} orient={:3}",
                t.tracking_id,
                if t.down { "down" } else { "up  " },
                t.x,
                t.y,
                t.size,
                t.touch_major,
                t.touch_minor,
                t.orientation
            )?;
            if let Some(raw) = t.raw_state {
                write!(self.out, " raw=0x{:02x}", raw)?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }
}

pub fn run_dump(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let session = Session::open(config)?;
    eprintln!(
        "Dumping {} reports from {} (Ctrl+C to stop):\n",
        session.class,
        config.device.display()
    );

    let mut decoder = Decoder::new(session.class, config.tunables);
    let mut sink = PrintSink::new(std::io::stdout().lock());
    let mut buf = [0u8; MAX_REPORT_SIZE];

    loop {
        let len = session.device.read_report(&mut buf)?;
        if len == 0 {
            return Err("device closed".into());
        }
        if !decoder.feed(&buf[..len], Instant::now(), &mut sink)? {
            eprintln!("unrecognised report: {:02x?}", &buf[..len.min(16)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Buttons, TouchSync};

    #[test]
    fn test_print_sink_format() {
        let mut sink = PrintSink::new(Vec::new());
        let output = DecodedOutput {
            touches: vec![TouchSync {
                tracking_id: 3,
                down: true,
                x: -120,
                y: 40,
                touch_major: 20,
                touch_minor: 18,
                orientation: 1,
                size: 9,
                raw_state: Some(0x40),
            }],
            motion: Some((2, -1)),
            buttons: Buttons::from_bits(Buttons::MIDDLE),
            wheel: None,
            wheel_hr: Some((0, 12)),
            active_touches: 1,
        };
        sink.emit(&output).unwrap();

        let text = String::from_utf8(sink.out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("     1  buttons=-M- contacts=1 rel=(2,-1) wheel_hr=(0,12)")
        );
        let touch = lines.next().unwrap();
        assert!(touch.contains("id= 3 down x= -120"));
        assert!(touch.ends_with("raw=0x40"));
        assert_eq!(lines.next(), None);
    }
}
