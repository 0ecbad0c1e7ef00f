//! Link supervisor
//!
//! Brings the modem up, keeps the access point association and the TCP
//! connection alive, and pumps the response scanner while idle. Link-loss
//! notifications from the scanner are latched and serviced from the idle
//! loop, so reconnection always runs at the top level and at most one
//! reconnection is in flight.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use ledmatrix_hal::{ByteLink, UartConfig};
use ledmatrix_protocol::command::{
    self, ALREADY_CONNECTED, CLOSE_TCP, ENABLE_DHCP, ECHO_OFF, QUIT_AP, RESTORE, SEND_PROMPT,
    STATION_MODE, VERSION,
};
use ledmatrix_protocol::{encode_frame_to_vec, Decompressor, Response, SCRATCH_CAPACITY};

use super::scanner::{scan_response, Scan};
use super::state::{Outcome, Phase};
use super::ConnectionContext;
use crate::config::{LinkConfig, MAX_CLIENT_ID_LEN};
use crate::traits::{ColorChannel, FrameSink, LinkHooks};

/// Room for the framed client identifier (`S<len>:` plus the id)
const GREETING_CAPACITY: usize = MAX_CLIENT_ID_LEN + 8;

/// Window kept from a `AT+CIPSTART` response
const CONNECT_WINDOW: usize = 128;

/// Window kept from a `AT+GMR` response
const VERSION_WINDOW: usize = 512;

/// Window kept from a TCP send response (`SEND OK\r\n`)
const SEND_WINDOW: usize = 9;

/// Link-loss notifications latched during a scan
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkEvents {
    pub link_closed: bool,
    pub wifi_lost: bool,
}

impl LinkEvents {
    /// Return the pending events and clear them
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    pub fn is_empty(&self) -> bool {
        !self.link_closed && !self.wifi_lost
    }
}

/// Routes scanner callbacks: frames to the sink, link loss to the latch
struct Dispatch<'s, S> {
    sink: &'s mut S,
    events: &'s mut LinkEvents,
}

impl<S: FrameSink> LinkHooks for Dispatch<'_, S> {
    fn on_frame(&mut self, data: &[u8]) {
        if let Err(e) = self.sink.on_frame(data) {
            warn!("frame rejected: {:?}", e);
        }
    }

    fn on_link_closed(&mut self) {
        self.events.link_closed = true;
    }

    fn on_wifi_lost(&mut self) {
        self.events.wifi_lost = true;
    }
}

/// Owns the modem link and everything needed to keep it streaming
pub struct LinkSupervisor<L, T, D, S, const N: usize = SCRATCH_CAPACITY> {
    link: L,
    delay: T,
    ctx: ConnectionContext<D, N>,
    sink: S,
    config: LinkConfig,
    greeting: Vec<u8, GREETING_CAPACITY>,
    events: LinkEvents,
    phase: Phase,
}

impl<L, T, D, S, const N: usize> LinkSupervisor<L, T, D, S, N>
where
    L: ByteLink,
    T: DelayNs,
    D: Decompressor,
    S: FrameSink,
{
    pub fn new(link: L, delay: T, decompressor: D, sink: S, config: LinkConfig) -> Self {
        let greeting = match encode_frame_to_vec(config.client_id.as_bytes()) {
            Ok(frame) => frame,
            Err(e) => {
                error!("client id does not fit a greeting frame: {:?}", e);
                Vec::new()
            }
        };

        Self {
            link,
            delay,
            ctx: ConnectionContext::new(decompressor, config.byte_timeout_us()),
            sink,
            config,
            greeting,
            events: LinkEvents::default(),
            phase: Phase::NeedWifi,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> &ConnectionContext<D, N> {
        &self.ctx
    }

    /// Events latched since the last service
    pub fn pending_events(&self) -> LinkEvents {
        self.events
    }

    /// Scan one response, keeping its last `out.len()` bytes
    ///
    /// Ends early on a dispatched link-loss line; the event is latched for
    /// [`poll`](Self::poll).
    pub fn scan(&mut self, out: &mut [u8]) -> Result<Scan, L::Error> {
        let mut hooks = Dispatch {
            sink: &mut self.sink,
            events: &mut self.events,
        };
        scan_response(&mut self.ctx, &mut self.link, &mut hooks, out)
    }

    /// Write `cmd` and scan its response
    pub fn send_command(&mut self, cmd: &[u8], out: &mut [u8]) -> Result<Scan, L::Error> {
        self.link.write(cmd)?;
        self.scan(out)
    }

    /// Write `cmd` and report whether it ended in `expected`
    ///
    /// `WIFI DISCONNECT` is not dispatched while the command runs; the
    /// previous suppression is restored afterwards.
    pub fn send_command_expect(&mut self, cmd: &[u8], expected: Response) -> bool {
        let held = core::mem::replace(&mut self.ctx.reconnecting_wifi, true);
        let result = self.send_command(cmd, &mut []);
        self.ctx.reconnecting_wifi = held;

        match result {
            Ok(scan) if scan.response == Some(expected) => true,
            Ok(scan) => {
                warn!(
                    "{=[u8]:a}: expected {:?}, got {:?}",
                    trim_crlf(cmd),
                    expected,
                    scan.response
                );
                false
            }
            Err(_) => {
                warn!("{=[u8]:a}: link error", trim_crlf(cmd));
                false
            }
        }
    }

    /// Issue a single `AT+CIPSTART` to the configured server
    pub fn open_tcp(&mut self) -> bool {
        let cmd = match command::start_tcp(&self.config.host, self.config.port) {
            Ok(cmd) => cmd,
            Err(e) => {
                error!("connect command: {:?}", e);
                return false;
            }
        };

        let held = core::mem::replace(&mut self.ctx.reconnecting_tcp, true);
        let mut reply = [0u8; CONNECT_WINDOW];
        let result = self.send_command(cmd.as_bytes(), &mut reply);
        self.ctx.reconnecting_tcp = held;

        match result {
            Ok(scan) => {
                let text = &reply[..scan.len];
                if scan.response == Some(Response::Ok) || contains(text, ALREADY_CONNECTED) {
                    true
                } else {
                    debug!("connect refused: {=[u8]:a}", text);
                    false
                }
            }
            Err(_) => false,
        }
    }

    /// Send `data` over the open TCP connection
    ///
    /// Blocks until the modem's `>` prompt before writing the payload.
    pub fn send_tcp(&mut self, data: &[u8]) -> bool {
        let cmd = match command::send_data(data.len()) {
            Ok(cmd) => cmd,
            Err(e) => {
                error!("send command: {:?}", e);
                return false;
            }
        };
        if self.link.write(cmd.as_bytes()).is_err() {
            return false;
        }

        loop {
            match self.link.read_byte() {
                Ok(SEND_PROMPT) => break,
                Ok(_) => {}
                Err(_) => return false,
            }
        }

        if self.link.write(data).is_err() {
            return false;
        }

        let mut reply = [0u8; SEND_WINDOW];
        match self.scan(&mut reply) {
            Ok(scan) if scan.response == Some(Response::SendOk) => true,
            Ok(scan) => {
                warn!("send: got {:?}", scan.response);
                false
            }
            Err(_) => false,
        }
    }

    /// Modem bring-up
    ///
    /// Each step is logged; a failed step does not stop the sequence.
    pub fn setup(&mut self) {
        info!("modem bring-up");
        if self.link.drain().is_err() {
            warn!("could not drain modem input");
        }

        if !self.send_command_expect(RESTORE.as_bytes(), Response::Ok) {
            warn!("modem restore failed");
        }
        self.delay.delay_ms(self.config.modem_settle_ms);

        let baudrate = self.config.baudrate;
        match command::set_uart(baudrate) {
            Ok(cmd) => {
                // The reply arrives at the new rate, so it is not checked
                if self.send_command(cmd.as_bytes(), &mut []).is_err() {
                    warn!("baud rate command: link error");
                }
                match self.link.reconfigure(&UartConfig::with_baudrate(baudrate)) {
                    Ok(()) => info!("modem uart at {} baud", baudrate),
                    Err(_) => error!("could not switch uart to {} baud", baudrate),
                }
            }
            Err(e) => error!("baud rate command: {:?}", e),
        }
        self.delay.delay_ms(self.config.modem_settle_ms);

        if !self.send_command_expect(ECHO_OFF.as_bytes(), Response::Ok) {
            warn!("could not disable echo");
        }

        let mut version = [0u8; VERSION_WINDOW];
        match self.send_command(VERSION.as_bytes(), &mut version) {
            Ok(scan) => info!("modem firmware: {=[u8]:a}", &version[..scan.len]),
            Err(_) => warn!("modem version query: link error"),
        }

        if !self.send_command_expect(STATION_MODE.as_bytes(), Response::Ok) {
            warn!("could not select station mode");
        }
        if !self.send_command_expect(ENABLE_DHCP.as_bytes(), Response::Ok) {
            warn!("could not enable dhcp");
        }
    }

    /// (Re)associate, then (re)connect TCP and greet
    ///
    /// Returns only once the link is [`Phase::Ready`].
    pub fn connect_wifi(&mut self) {
        self.delay.delay_ms(self.config.wifi_settle_ms);
        self.enter(Phase::NeedWifi);
        self.drive(false);
    }

    /// (Re)connect TCP and greet on the current association
    ///
    /// Returns `false` if the access point dropped along the way, in which
    /// case the link is left in [`Phase::NeedWifi`].
    pub fn connect_tcp(&mut self) -> bool {
        self.enter(Phase::NeedTcp);
        self.drive(true);
        self.phase == Phase::Ready
    }

    /// One idle iteration: scan pending output, then service link loss
    ///
    /// A scan returns as soon as a link-loss line is dispatched, so the
    /// reconnect never waits on further modem output.
    pub fn poll(&mut self) {
        // A drop seen while connecting may leave nothing to read
        if self.events.is_empty() && !self.ctx.wifi_dropped && self.scan(&mut []).is_err() {
            warn!("modem link error while idle");
        }
        self.service_events();
    }

    /// Bring the link up and stream frames forever
    pub fn run(&mut self) -> ! {
        self.setup();
        self.connect_wifi();
        self.delay.delay_ms(self.config.modem_settle_ms);
        info!("link up, streaming frames");

        loop {
            self.poll();
        }
    }

    fn service_events(&mut self) {
        let events = self.events.take();
        if events.wifi_lost || self.ctx.wifi_dropped {
            warn!("wifi lost, reconnecting");
            self.connect_wifi();
        } else if events.link_closed {
            warn!("tcp connection closed, reconnecting");
            if !self.connect_tcp() {
                self.drive(false);
            }
        }
    }

    /// Run connection steps until ready
    ///
    /// With `stop_on_wifi_loss` the loop hands back instead of
    /// re-associating.
    fn drive(&mut self, stop_on_wifi_loss: bool) {
        loop {
            let outcome = match self.phase {
                Phase::Ready => return,
                Phase::NeedWifi if stop_on_wifi_loss => return,
                Phase::NeedWifi => self.associate(),
                Phase::NeedTcp => self.open_with_retry(),
                Phase::NeedGreeting => self.greet(),
            };
            let next = self.phase.transition(outcome);
            self.enter(next);
        }
    }

    fn enter(&mut self, phase: Phase) {
        if phase != self.phase {
            debug!("link {:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
        self.ctx.reconnecting_tcp = phase.suppresses_closed();
        self.ctx.reconnecting_wifi = phase.suppresses_wifi_loss();
        match phase {
            Phase::NeedWifi => self.events.wifi_lost = false,
            Phase::NeedTcp => self.events.link_closed = false,
            Phase::NeedGreeting | Phase::Ready => {}
        }
    }

    fn associate(&mut self) -> Outcome {
        let join = command::join_ap(&self.config.ssid, &self.config.password);
        if let Err(e) = &join {
            error!("join command: {:?}", e);
        }

        let mut attempt = 0;
        loop {
            info!("associating with access point");
            self.send_command_expect(QUIT_AP.as_bytes(), Response::Ok);
            let joined = match &join {
                Ok(cmd) => self.send_command_expect(cmd.as_bytes(), Response::Ok),
                Err(_) => false,
            };
            if joined {
                break;
            }

            warn!("association attempt {} failed", attempt + 1);
            self.sink.progress(attempt, ColorChannel::Red);
            attempt += 1;
            self.delay.delay_ms(self.config.retry_delay_ms);
        }

        self.delay.delay_ms(self.config.associate_settle_ms);
        self.ctx.wifi_dropped = false;
        info!("wifi associated");
        Outcome::Associated
    }

    fn open_with_retry(&mut self) -> Outcome {
        // Fails harmlessly when nothing is open
        self.send_command_expect(CLOSE_TCP.as_bytes(), Response::Ok);

        let mut attempt = 0;
        loop {
            info!("connecting to {=str}:{}", self.config.host.as_str(), self.config.port);
            if self.open_tcp() {
                info!("tcp connected");
                return Outcome::Opened;
            }
            if self.ctx.wifi_dropped {
                warn!("wifi dropped while connecting tcp");
                return Outcome::WifiLost;
            }

            warn!("tcp attempt {} failed", attempt + 1);
            self.sink.progress(attempt, ColorChannel::Green);
            attempt += 1;
            self.delay.delay_ms(self.config.retry_delay_ms);
        }
    }

    fn greet(&mut self) -> Outcome {
        self.sink.clear();
        let greeting = self.greeting.clone();
        if self.send_tcp(&greeting) {
            info!("greeting accepted");
            Outcome::Greeted
        } else if self.ctx.wifi_dropped {
            Outcome::WifiLost
        } else {
            warn!("greeting failed");
            Outcome::GreetingFailed
        }
    }

    #[cfg(test)]
    pub(crate) fn parts(&self) -> (&L, &T, &S) {
        (&self.link, &self.delay, &self.sink)
    }

    #[cfg(test)]
    pub(crate) fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn trim_crlf(cmd: &[u8]) -> &[u8] {
    cmd.strip_suffix(b"\r\n").unwrap_or(cmd)
}
