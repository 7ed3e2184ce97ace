//! Component F: the connection engine. A `Connection` is a cheap, `Clone`
//! handle to a single background task (the "engine") that owns the socket,
//! the in-flight map, and the frame accumulator — the single-logical-task
//! model spec.md §5 requires, exposed externally as a `Send + Clone` handle
//! so callers can hold one `Connection` across tasks (mirrors the teacher's
//! `NetworkServer` accept-loop-owns-the-socket split, `src/network/server.rs`,
//! generalized from one socket per accepted peer to one socket per engine
//! task driven by channel commands instead of a fixed request/response
//! shape).

mod demux;
mod inflight;
mod request;
mod tls;

use crate::api::sasl_authenticate::{SaslAuthenticate, SaslAuthenticateRequest};
use crate::api::sasl_handshake::{SaslHandshake, SaslHandshakeRequest};
use crate::api::ApiDescriptor;
use crate::codec::{Reader, Writer};
use crate::config::ConnectionOptions;
use crate::error::{KafkaClientError, ResponseError, SendError, SendResult};
use crate::logging::LogUtils;
use crate::sasl::SaslOutcome;
use bytes::{Bytes, BytesMut};
use demux::{Frame, FrameAccumulator};
use inflight::InFlightMap;
use request::{Completion, InFlightRequest, RequestContext};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tls::Transport;
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};

/// Status machine from spec.md §4.6. `Copy` so both the handle and the
/// engine can read/store it cheaply behind a `Mutex` without borrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    None,
    Connecting,
    Authenticating,
    Connected,
    Reauthenticating,
    Closing,
    Closed,
    Error,
}

impl ConnectionStatus {
    /// Requests may be submitted in exactly these states (spec.md §4.5 step 1).
    fn accepts_sends(self) -> bool {
        matches!(
            self,
            ConnectionStatus::Connected
                | ConnectionStatus::Authenticating
                | ConnectionStatus::Reauthenticating
        )
    }

    /// host()/port() visibility predicate (SPEC_FULL.md §11 Open Question 1
    /// — the source's buggy truthiness check is not reproduced).
    fn exposes_host_port(self) -> bool {
        matches!(
            self,
            ConnectionStatus::Connecting
                | ConnectionStatus::Authenticating
                | ConnectionStatus::Connected
                | ConnectionStatus::Reauthenticating
        )
    }
}

/// A cheap, cloneable handle to a connection engine running on its own
/// background task. Submitting a request never touches the engine's state
/// directly — everything crosses the `mpsc` channel below.
#[derive(Clone)]
pub struct Connection {
    host: String,
    port: u16,
    status: Arc<Mutex<ConnectionStatus>>,
    command_tx: mpsc::UnboundedSender<Command>,
    admission: Arc<Semaphore>,
    instance_id: u64,
}

enum Command {
    Send {
        api_key: i16,
        api_version: i16,
        api_name: &'static str,
        req_flex: bool,
        resp_flex: bool,
        no_response: bool,
        body: Bytes,
        permit: OwnedSemaphorePermit,
        respond_to: oneshot::Sender<Result<(i32, Bytes), KafkaClientError>>,
    },
    Close {
        ack: oneshot::Sender<()>,
    },
}

impl Connection {
    /// Opens a TCP (or TLS) socket to `host:port`, runs the SASL handshake
    /// inline if configured, and spawns the background engine task. Returns
    /// once the connection is ready to accept `send` calls (spec.md §4.6
    /// "on handshake success ... `connect` completes").
    pub async fn connect(
        host: impl Into<String>,
        port: u16,
        options: ConnectionOptions,
    ) -> Result<Connection, KafkaClientError> {
        let host = host.into();
        let instance_id = next_instance_id();
        let span = LogUtils::connection_span(&host, port, instance_id);
        let _enter = span.enter();

        let connect_fut = async {
            match &options.tls {
                Some(tls) => Transport::connect_tls(&host, port, tls).await,
                None => Transport::connect_plain(&host, port)
                    .await
                    .map_err(|e| KafkaClientError::network(&host, port, e)),
            }
        };
        let transport = tokio::time::timeout(options.connect_timeout, connect_fut)
            .await
            .map_err(|_| KafkaClientError::ConnectTimeout {
                host: host.clone(),
                port,
                after: options.connect_timeout,
            })??;

        let needs_sasl = options.sasl.is_some();
        let status = Arc::new(Mutex::new(if needs_sasl {
            ConnectionStatus::Authenticating
        } else {
            ConnectionStatus::Connected
        }));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let inflight = InFlightMap::new(options.max_inflights);
        let admission = inflight.admission();

        let engine = Engine {
            host: host.clone(),
            port,
            options,
            status: status.clone(),
            transport,
            command_rx,
            inflight,
            accumulator: FrameAccumulator::new(),
            next_correlation_id: 0,
            drain_deferred: VecDeque::new(),
            sasl: None,
            reauth_deadline: None,
            read_buf: BytesMut::with_capacity(8192),
        };

        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(async move {
            let mut engine = engine;
            if needs_sasl {
                engine.begin_sasl(Some(ready_tx)).await;
            } else {
                let _ = ready_tx.send(Ok(()));
            }
            engine.run().await;
        });

        ready_rx
            .await
            .map_err(|_| KafkaClientError::ConnectionClosed {
                host: host.clone(),
                port,
            })??;

        Ok(Connection {
            host,
            port,
            status,
            command_tx,
            admission,
            instance_id,
        })
    }

    /// Submits a request and awaits its typed response (spec.md §4.5/§9 —
    /// the awaitable half of the callback/awaitable duality; there is no
    /// separate callback submission path, just this one channel).
    pub async fn send<D: ApiDescriptor>(&self, request: &D::Request) -> SendResult<D::Response> {
        self.ensure_sendable().map_err(SendError::Client)?;

        let permit = self
            .admission
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SendError::Client(self.closed_error()))?;

        let body = D::encode_body(request).into_bytes();
        let (respond_to, receiver) = oneshot::channel();
        let command = Command::Send {
            api_key: D::API_KEY,
            api_version: D::API_VERSION,
            api_name: D::NAME,
            req_flex: D::REQUEST_HEADER_FLEX,
            resp_flex: D::RESPONSE_HEADER_FLEX,
            no_response: D::NO_RESPONSE,
            body,
            permit,
            respond_to,
        };

        self.command_tx
            .send(command)
            .map_err(|_| SendError::Client(self.closed_error()))?;

        let (correlation_id, raw) = receiver
            .await
            .map_err(|_| SendError::Client(self.closed_error()))?
            .map_err(SendError::Client)?;

        let mut reader = Reader::new(&raw);
        let response = D::parse_body(&mut reader)
            .map_err(|e| SendError::Client(KafkaClientError::Protocol(e)))?;
        let locations = D::error_locations(&response);
        if locations.is_empty() {
            Ok(response)
        } else {
            Err(SendError::Response(ResponseError {
                api_key: D::API_KEY,
                api_name: D::NAME,
                correlation_id,
                locations,
                response,
            }))
        }
    }

    /// Requests a graceful shutdown: every in-flight and drain-deferred
    /// request is failed with a uniform "connection closed" error, then the
    /// engine task exits (spec.md §4.6).
    pub async fn close(&self) -> Result<(), KafkaClientError> {
        let (ack, ack_rx) = oneshot::channel();
        if self.command_tx.send(Command::Close { ack }).is_err() {
            return Ok(());
        }
        let _ = ack_rx.await;
        Ok(())
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.lock().unwrap()
    }

    pub fn host(&self) -> Option<&str> {
        self.status().exposes_host_port().then_some(self.host.as_str())
    }

    pub fn port(&self) -> Option<u16> {
        self.status().exposes_host_port().then_some(self.port)
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    fn ensure_sendable(&self) -> Result<(), KafkaClientError> {
        if self.status().accepts_sends() {
            Ok(())
        } else {
            Err(self.closed_error())
        }
    }

    fn closed_error(&self) -> KafkaClientError {
        KafkaClientError::ConnectionClosed {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

/// What the SASL state machine is waiting on next (spec.md §4.4's
/// client-first/server-first/client-final/server-final round trips,
/// generalized to every mechanism in the catalog).
enum AwaitingKind {
    Handshake,
    Continue,
    Complete,
}

/// Drives one (re)authentication round. Built fresh by `begin_sasl` every
/// time, per spec.md §3.6 "one session per (re)authentication".
struct SaslRunState {
    mechanism: Box<dyn crate::sasl::SaslMechanism>,
    mechanism_name: String,
    awaiting: AwaitingKind,
    /// `Some` only for the initial handshake driven from `connect()`; `None`
    /// for a re-auth round, which has no caller awaiting a result directly.
    ready_tx: Option<oneshot::Sender<Result<(), KafkaClientError>>>,
}

/// The engine proper: owns the socket, in-flight map, and accumulator, and
/// runs as a single `tokio::task` per spec.md §5's scheduling model. Never
/// `Clone`d or shared — `Connection` only ever holds a channel into it.
struct Engine {
    host: String,
    port: u16,
    options: ConnectionOptions,
    status: Arc<Mutex<ConnectionStatus>>,
    transport: Transport,
    command_rx: mpsc::UnboundedReceiver<Command>,
    inflight: InFlightMap,
    accumulator: FrameAccumulator,
    next_correlation_id: i32,
    /// `(frame, bytes already written)`, in write order. Only ever
    /// non-empty when backpressure is enabled and the transport supports
    /// non-blocking writes (spec.md §4.6).
    drain_deferred: VecDeque<(Bytes, usize)>,
    sasl: Option<SaslRunState>,
    reauth_deadline: Option<Instant>,
    read_buf: BytesMut,
}

impl Engine {
    async fn run(mut self) {
        loop {
            let deadline = tokio::time::Instant::from_std(self.next_deadline());
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    self.process_request_timeouts().await;
                    self.maybe_start_reauth().await;
                }
                maybe_cmd = self.command_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd @ Command::Send { .. }) => {
                            if !self.handle_send(cmd).await {
                                break;
                            }
                        }
                        Some(Command::Close { ack }) => {
                            self.handle_close(ack).await;
                            break;
                        }
                        None => break,
                    }
                }
                result = self.transport.read_into(&mut self.read_buf) => {
                    if !self.handle_read_result(result).await {
                        break;
                    }
                }
                _ = self.transport.writable(), if !self.drain_deferred.is_empty() => {
                    if let Err(e) = self.flush_deferred() {
                        let err = KafkaClientError::network(self.host.clone(), self.port, e);
                        self.teardown(err).await;
                        break;
                    }
                }
            }
        }
    }

    fn next_deadline(&self) -> Instant {
        let mut deadline = Instant::now() + Duration::from_secs(3600);
        if let Some(d) = self.inflight.earliest_deadline(self.options.request_timeout) {
            deadline = deadline.min(d);
        }
        if let Some(d) = self.reauth_deadline {
            deadline = deadline.min(d);
        }
        deadline
    }

    async fn process_request_timeouts(&mut self) {
        let now = Instant::now();
        let expired = self
            .inflight
            .expired_correlation_ids(self.options.request_timeout, now);
        for correlation_id in expired {
            let Some(req) = self.inflight.get_mut(correlation_id) else {
                continue;
            };
            let api_name = req.context.api_name;
            let err = KafkaClientError::RequestTimeout {
                api_name,
                correlation_id,
                after: self.options.request_timeout,
            };
            LogUtils::log_request_completed(api_name, correlation_id, 0, false);
            if let Some(sasl_result) = req.fire_timeout(err) {
                self.handle_sasl_response(sasl_result).await;
            }
        }
    }

    async fn maybe_start_reauth(&mut self) {
        let Some(deadline) = self.reauth_deadline else {
            return;
        };
        if Instant::now() < deadline {
            return;
        }
        self.reauth_deadline = None;
        if *self.status.lock().unwrap() != ConnectionStatus::Connected {
            return;
        }
        *self.status.lock().unwrap() = ConnectionStatus::Reauthenticating;
        self.begin_sasl(None).await;
    }

    async fn handle_send(&mut self, cmd: Command) -> bool {
        let Command::Send {
            api_key,
            api_version,
            api_name,
            req_flex,
            resp_flex,
            no_response,
            body,
            permit,
            respond_to,
        } = cmd
        else {
            unreachable!("handle_send called with a non-Send command");
        };

        let correlation_id = self.next_correlation_id;
        self.next_correlation_id = self.next_correlation_id.wrapping_add(1);

        let frame = self.frame_request(api_key, api_version, req_flex, correlation_id, &body);

        if no_response {
            drop(permit);
            let alive = self.write_frame(frame).await;
            let result = if alive {
                Ok((correlation_id, Bytes::new()))
            } else {
                Err(self.closed_error())
            };
            let _ = respond_to.send(result);
            return alive;
        }

        let context = RequestContext {
            api_name,
            api_key,
            submitted_at: Instant::now(),
        };
        self.inflight.insert(
            correlation_id,
            InFlightRequest::new(context, resp_flex, Completion::User(respond_to)),
            Some(permit),
        );
        self.write_frame(frame).await
    }

    fn frame_request(
        &self,
        api_key: i16,
        api_version: i16,
        req_flex: bool,
        correlation_id: i32,
        body: &[u8],
    ) -> Bytes {
        let mut header = Writer::new();
        header.append_int16(api_key);
        header.append_int16(api_version);
        header.append_int32(correlation_id);
        header.append_string(self.options.client_id.as_deref(), false);
        if req_flex {
            header.append_tagged_fields();
        }
        header.append_raw(body);
        header.prepend_length();
        header.into_bytes()
    }

    async fn handle_close(&mut self, ack: oneshot::Sender<()>) {
        *self.status.lock().unwrap() = ConnectionStatus::Closing;
        for req in self.inflight.drain() {
            let _ = req.complete(0, Err(self.closed_error()));
        }
        self.drain_deferred.clear();
        *self.status.lock().unwrap() = ConnectionStatus::Closed;
        let _ = ack.send(());
    }

    async fn teardown(&mut self, reason: KafkaClientError) {
        *self.status.lock().unwrap() = ConnectionStatus::Error;
        LogUtils::log_connection_closed(&self.host, self.port, &reason.to_string());
        for req in self.inflight.drain() {
            let _ = req.complete(0, Err(self.closed_error()));
        }
        self.drain_deferred.clear();
        if let Some(sasl) = self.sasl.take() {
            if let Some(ready_tx) = sasl.ready_tx {
                let _ = ready_tx.send(Err(self.closed_error()));
            }
        }
    }

    fn closed_error(&self) -> KafkaClientError {
        KafkaClientError::ConnectionClosed {
            host: self.host.clone(),
            port: self.port,
        }
    }

    async fn handle_read_result(&mut self, result: io::Result<usize>) -> bool {
        match result {
            Ok(0) => {
                let err = self.closed_error();
                self.teardown(err).await;
                false
            }
            Ok(_) => {
                self.accumulator.append(&self.read_buf);
                self.read_buf.clear();
                loop {
                    match self.accumulator.next_frame() {
                        Ok(Some(frame)) => {
                            if !self.dispatch_frame(frame).await {
                                return false;
                            }
                        }
                        Ok(None) => return true,
                        Err(e) => {
                            self.teardown(KafkaClientError::Protocol(e)).await;
                            return false;
                        }
                    }
                }
            }
            Err(e) => {
                let err = KafkaClientError::network(self.host.clone(), self.port, e);
                self.teardown(err).await;
                false
            }
        }
    }

    /// Demultiplexes a completed frame to its in-flight request (spec.md
    /// §4.6 steps 3–6). Returns `false` if the connection was torn down
    /// (unknown correlation id, decode failure).
    async fn dispatch_frame(&mut self, frame: Frame) -> bool {
        let Frame {
            correlation_id,
            body,
        } = frame;

        let Some(req) = self.inflight.remove(correlation_id) else {
            self.teardown(KafkaClientError::UnexpectedCorrelationId { correlation_id })
                .await;
            return false;
        };

        if req.timed_out {
            return true;
        }

        let api_name = req.context.api_name;
        let submitted_at = req.context.submitted_at;
        let resp_flex = req.resp_flex;

        let mut reader = Reader::new(&body);
        let result = if resp_flex {
            reader
                .read_tagged_fields()
                .map(|_| Bytes::copy_from_slice(reader.remaining_slice()))
                .map_err(KafkaClientError::Protocol)
        } else {
            Ok(Bytes::copy_from_slice(reader.remaining_slice()))
        };

        let success = result.is_ok();
        let duration_ms = submitted_at.elapsed().as_millis() as u64;
        LogUtils::log_request_completed(api_name, correlation_id, duration_ms, success);

        if let Some(sasl_result) = req.complete(correlation_id, result) {
            self.handle_sasl_response(sasl_result).await;
        }
        true
    }

    /// Writes `frame`, honoring the backpressure policy (spec.md §4.6).
    /// Returns `false` if the write failed and the connection was torn
    /// down.
    async fn write_frame(&mut self, frame: Bytes) -> bool {
        if !self.options.backpressure || !self.transport.supports_nonblocking_write() {
            if let Err(e) = self.transport.write_all(&frame).await {
                let err = KafkaClientError::network(self.host.clone(), self.port, e);
                self.teardown(err).await;
                return false;
            }
            return true;
        }

        self.drain_deferred.push_back((frame, 0));
        match self.flush_deferred() {
            Ok(()) => true,
            Err(e) => {
                let err = KafkaClientError::network(self.host.clone(), self.port, e);
                self.teardown(err).await;
                false
            }
        }
    }

    /// Flushes as much of the deferred queue as the socket currently
    /// accepts without blocking, preserving write order: a frame that can
    /// only be partially written stays at the front with its offset
    /// updated, and nothing behind it is attempted until it drains.
    fn flush_deferred(&mut self) -> io::Result<()> {
        while let Some((frame, offset)) = self.drain_deferred.front().cloned() {
            match self.transport.try_write(&frame[offset..]) {
                Ok(0) => break,
                Ok(n) => {
                    let new_offset = offset + n;
                    if new_offset >= frame.len() {
                        self.drain_deferred.pop_front();
                    } else {
                        self.drain_deferred.front_mut().expect("just peeked").1 = new_offset;
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Starts (or restarts, for re-auth) the SASL handshake. `ready_tx` is
    /// `Some` only for the initial round driven from `connect()`.
    async fn begin_sasl(&mut self, ready_tx: Option<oneshot::Sender<Result<(), KafkaClientError>>>) {
        let sasl_options = self
            .options
            .sasl
            .clone()
            .expect("begin_sasl called without sasl configured");
        let mechanism_name = sasl_options.credentials.mechanism_name().to_string();
        let mechanism = sasl_options.credentials.build_mechanism();

        self.sasl = Some(SaslRunState {
            mechanism,
            mechanism_name: mechanism_name.clone(),
            awaiting: AwaitingKind::Handshake,
            ready_tx,
        });

        let body = SaslHandshake::encode_body(&SaslHandshakeRequest {
            mechanism: mechanism_name,
        })
        .into_bytes();
        self.send_internal::<SaslHandshake>(body).await;
    }

    /// Builds and writes an internal (SASL) request frame, bypassing the
    /// user-facing admission gate: SASL traffic is engine-driven, not
    /// caller-submitted, so it never competes with `Connection::send`
    /// callers for an admission permit (see DESIGN.md).
    async fn send_internal<D: ApiDescriptor>(&mut self, body: Bytes) -> bool {
        let correlation_id = self.next_correlation_id;
        self.next_correlation_id = self.next_correlation_id.wrapping_add(1);
        let frame = self.frame_request(D::API_KEY, D::API_VERSION, D::REQUEST_HEADER_FLEX, correlation_id, &body);

        let context = RequestContext {
            api_name: D::NAME,
            api_key: D::API_KEY,
            submitted_at: Instant::now(),
        };
        self.inflight.insert(
            correlation_id,
            InFlightRequest::new(context, D::RESPONSE_HEADER_FLEX, Completion::Sasl),
            None,
        );
        self.write_frame(frame).await
    }

    /// Feeds one SASL response through the state machine. Called whenever
    /// `dispatch_frame`/`process_request_timeouts` resolves a correlation
    /// id that belongs to the active SASL exchange.
    async fn handle_sasl_response(&mut self, result: Result<Bytes, KafkaClientError>) {
        let Some(mut sasl) = self.sasl.take() else {
            return;
        };

        match self.step_sasl(&mut sasl, result).await {
            Ok(None) => {
                self.sasl = Some(sasl);
            }
            Ok(Some(session_lifetime_ms)) => {
                self.finish_sasl(sasl, session_lifetime_ms);
            }
            Err(err) => {
                self.fail_sasl(sasl, err).await;
            }
        }
    }

    /// Advances the SASL state machine by one server round trip. `Ok(None)`
    /// means another round is pending (and `sasl.awaiting` has already been
    /// updated); `Ok(Some(lifetime))` means the exchange finished.
    async fn step_sasl(
        &mut self,
        sasl: &mut SaslRunState,
        result: Result<Bytes, KafkaClientError>,
    ) -> Result<Option<i64>, KafkaClientError> {
        let body = result?;
        let mut reader = Reader::new(&body);

        if matches!(sasl.awaiting, AwaitingKind::Handshake) {
            let response =
                SaslHandshake::parse_body(&mut reader).map_err(KafkaClientError::Protocol)?;
            if response.error_code != 0 {
                return Err(KafkaClientError::Authentication {
                    mechanism: sasl.mechanism_name.clone(),
                    reason: format!(
                        "mechanism not supported, broker offers {:?}",
                        response.mechanisms
                    ),
                });
            }
            let step = sasl.mechanism.step(None)?;
            self.send_sasl_authenticate(sasl, step).await;
            return Ok(None);
        }

        let response =
            SaslAuthenticate::parse_body(&mut reader).map_err(KafkaClientError::Protocol)?;
        if response.error_code != 0 {
            return Err(KafkaClientError::Authentication {
                mechanism: sasl.mechanism_name.clone(),
                reason: response
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "authentication rejected".to_string()),
            });
        }

        match sasl.awaiting {
            AwaitingKind::Continue => {
                let step = sasl.mechanism.step(Some(&response.auth_bytes))?;
                self.send_sasl_authenticate(sasl, step).await;
                Ok(None)
            }
            AwaitingKind::Complete => {
                sasl.mechanism.verify_final(&response.auth_bytes)?;
                Ok(Some(response.session_lifetime_ms))
            }
            AwaitingKind::Handshake => unreachable!("handled above"),
        }
    }

    async fn send_sasl_authenticate(&mut self, sasl: &mut SaslRunState, step: SaslOutcome) {
        let (auth_bytes, awaiting) = match step {
            SaslOutcome::Continue(bytes) => (bytes, AwaitingKind::Continue),
            SaslOutcome::Complete(bytes) => (bytes, AwaitingKind::Complete),
        };
        sasl.awaiting = awaiting;
        let body = SaslAuthenticate::encode_body(&SaslAuthenticateRequest { auth_bytes }).into_bytes();
        self.send_internal::<SaslAuthenticate>(body).await;
    }

    fn finish_sasl(&mut self, sasl: SaslRunState, session_lifetime_ms: i64) {
        *self.status.lock().unwrap() = ConnectionStatus::Connected;
        self.reauth_deadline = (session_lifetime_ms > 0).then(|| {
            Instant::now() + Duration::from_millis((session_lifetime_ms as f64 * 0.8) as u64)
        });
        if let Some(ready_tx) = sasl.ready_tx {
            let _ = ready_tx.send(Ok(()));
        }
    }

    /// A SASL failure -- initial handshake or re-authentication alike -- is
    /// a per-connection failure (spec.md §7 item 2): tear the connection
    /// down, failing every outstanding in-flight request with a network
    /// error, and drive status to `Error`. The initial round additionally
    /// has a `connect()` caller waiting on `ready_tx`; a re-auth round has
    /// none, since `connect()` already returned.
    async fn fail_sasl(&mut self, sasl: SaslRunState, err: KafkaClientError) {
        self.sasl = Some(sasl);
        self.teardown(err).await;
    }
}

static INSTANCE_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

fn next_instance_id() -> u64 {
    INSTANCE_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};

    fn marked_frame(tag: i32, size: usize) -> Bytes {
        let mut buf = BytesMut::with_capacity(size);
        buf.extend_from_slice(&tag.to_be_bytes());
        buf.resize(size, 0xAB);
        buf.freeze()
    }

    async fn engine_over_loopback() -> (Engine, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        client.set_nodelay(true).ok();

        let (_command_tx, command_rx) = mpsc::unbounded_channel();
        let engine = Engine {
            host: addr.ip().to_string(),
            port: addr.port(),
            options: ConnectionOptions::new(),
            status: Arc::new(Mutex::new(ConnectionStatus::Connected)),
            transport: Transport::Plain(client),
            command_rx,
            inflight: InFlightMap::new(5),
            accumulator: FrameAccumulator::new(),
            next_correlation_id: 0,
            drain_deferred: VecDeque::new(),
            sasl: None,
            reauth_deadline: None,
            read_buf: BytesMut::with_capacity(8192),
        };
        (engine, server)
    }

    /// spec.md §8's backpressure scenario: push several large frames without
    /// the peer ever reading. Once the socket's send buffer fills, later
    /// `write_frame` calls fall back to `drain_deferred` rather than
    /// blocking the engine, and whatever stays queued keeps submission
    /// order (the front entry is always the earliest still-incomplete
    /// frame; nothing behind it is ever attempted first).
    #[tokio::test]
    async fn backpressure_preserves_write_order_under_partial_writes() {
        let (mut engine, _server) = engine_over_loopback().await;

        for tag in 0..4i32 {
            let frame = marked_frame(tag, 2 * 1024 * 1024);
            let alive = engine.write_frame(frame).await;
            assert!(alive, "write_frame tore down the connection on frame {tag}");
        }

        assert!(
            !engine.drain_deferred.is_empty(),
            "peer never read; at least one frame should still be queued"
        );

        let queued_tags: Vec<i32> = engine
            .drain_deferred
            .iter()
            .map(|(frame, _)| i32::from_be_bytes(frame[0..4].try_into().unwrap()))
            .collect();
        let mut sorted = queued_tags.clone();
        sorted.sort_unstable();
        assert_eq!(queued_tags, sorted, "queued frames must stay in submission order");
    }
}
