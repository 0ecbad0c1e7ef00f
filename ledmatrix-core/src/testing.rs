//! Host-side doubles for the modem link, delays and sinks

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use ledmatrix_hal::{ByteLink, UartConfig};
use ledmatrix_protocol::{DecompressError, Decompressor};

use crate::traits::{ColorChannel, FrameSink, LinkHooks, SinkError};

enum Rx {
    Byte(u8),
    /// Inter-byte silence longer than any timeout
    Gap,
}

struct Rule {
    prefix: Vec<u8>,
    replies: VecDeque<Vec<u8>>,
}

/// Read past the end of the scripted input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted;

/// Scripted modem
///
/// Every write is recorded. A write starting with a registered prefix
/// queues that rule's next reply; the last reply of a rule repeats.
#[derive(Default)]
pub struct MockLink {
    rx: VecDeque<Rx>,
    rules: Vec<Rule>,
    pub commands: Vec<Vec<u8>>,
    pub baudrate: Option<u32>,
    /// Panic instead of failing when read past the script
    silent: bool,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A modem that never sends anything beyond its script
    ///
    /// A real UART read would block forever there, so reading past the
    /// script panics instead of returning an error.
    pub fn silent_after_script() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().map(|&b| Rx::Byte(b)));
    }

    pub fn gap(&mut self) {
        self.rx.push_back(Rx::Gap);
    }

    pub fn reply(&mut self, prefix: &str, reply: &str) -> &mut Self {
        let prefix = prefix.as_bytes();
        match self.rules.iter_mut().find(|r| r.prefix == prefix) {
            Some(rule) => rule.replies.push_back(reply.as_bytes().to_vec()),
            None => self.rules.push(Rule {
                prefix: prefix.to_vec(),
                replies: VecDeque::from([reply.as_bytes().to_vec()]),
            }),
        }
        self
    }

    /// Number of writes starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands
            .iter()
            .filter(|c| c.starts_with(prefix.as_bytes()))
            .count()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl ByteLink for MockLink {
    type Error = Exhausted;

    fn read_byte(&mut self) -> Result<u8, Exhausted> {
        loop {
            match self.rx.pop_front() {
                Some(Rx::Byte(b)) => return Ok(b),
                Some(Rx::Gap) => continue,
                None if self.silent => panic!("read from a silent modem"),
                None => return Err(Exhausted),
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Exhausted> {
        self.commands.push(data.to_vec());
        let reply = self
            .rules
            .iter_mut()
            .find(|r| data.starts_with(&r.prefix))
            .and_then(|rule| {
                if rule.replies.len() > 1 {
                    rule.replies.pop_front()
                } else {
                    rule.replies.front().cloned()
                }
            });
        if let Some(reply) = reply {
            self.feed(&reply);
        }
        Ok(())
    }

    fn is_readable_within(&mut self, _timeout_us: u32) -> bool {
        match self.rx.front() {
            Some(Rx::Byte(_)) => true,
            Some(Rx::Gap) => {
                self.rx.pop_front();
                false
            }
            None => false,
        }
    }

    fn reconfigure(&mut self, config: &UartConfig) -> Result<(), Exhausted> {
        self.baudrate = Some(config.baudrate);
        Ok(())
    }
}

/// Accumulates requested delays instead of sleeping
#[derive(Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

/// Identity "decompression"
pub struct Stored;

impl Decompressor for Stored {
    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, DecompressError> {
        let out = output
            .get_mut(..input.len())
            .ok_or(DecompressError::Corrupt)?;
        out.copy_from_slice(input);
        Ok(input.len())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub frames: Vec<Vec<u8>>,
    pub clears: usize,
    pub progress: Vec<(usize, ColorChannel)>,
}

impl FrameSink for RecordingSink {
    fn on_frame(&mut self, rgb: &[u8]) -> Result<(), SinkError> {
        self.frames.push(rgb.to_vec());
        Ok(())
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn progress(&mut self, step: usize, channel: ColorChannel) {
        self.progress.push((step, channel));
    }
}

#[derive(Default)]
pub struct RecordingHooks {
    pub frames: Vec<Vec<u8>>,
    pub closed: usize,
    pub wifi_lost: usize,
}

impl LinkHooks for RecordingHooks {
    fn on_frame(&mut self, data: &[u8]) {
        self.frames.push(data.to_vec());
    }

    fn on_link_closed(&mut self) {
        self.closed += 1;
    }

    fn on_wifi_lost(&mut self) {
        self.wifi_lost += 1;
    }
}
