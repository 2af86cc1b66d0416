//! Request/response correlation and event fan-out over mpv's IPC socket

use crate::api::ConnectOptions;
use crate::error::{Error, Result};
use crate::protocol::event::Event;
use crate::protocol::listener::{ChannelListener, EventListener};
use crate::protocol::message::{CommandRequest, CommandResult, Message};
use crate::server::transport::{
    Dialer, IpcSocketDialer, LineTransportReceiver, TransportReceiver, TransportSender,
};
use parking_lot::Mutex as ParkingLotMutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::AbortHandle;

/// One-shot callback completing a pending command.
///
/// Receives the reply's `data` on success, or `Error::ProtocolError` carrying
/// mpv's status otherwise. Runs on the reader task.
pub type Completion = Box<dyn FnOnce(Result<Value>) + Send>;

/// Identifies one registered event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Write half of an open session
#[derive(Clone)]
struct SessionWriter {
    sender: Arc<TokioMutex<Box<dyn TransportSender>>>,
    /// Set to `true` when the session closes; writes in flight give up
    closing: Arc<watch::Sender<bool>>,
}

impl SessionWriter {
    fn new(sender: Box<dyn TransportSender>) -> Self {
        let (closing, _) = watch::channel(false);
        Self {
            sender: Arc::new(TokioMutex::new(sender)),
            closing: Arc::new(closing),
        }
    }
}

/// Everything guarded by the connection lock
#[derive(Default)]
struct State {
    /// Write half of the stream; `Some` iff the connection is open
    sender: Option<SessionWriter>,
    /// Bumped on every successful open
    session: u64,
    reader: Option<AbortHandle>,
    last_request: u64,
    last_listener: u64,
    pending: HashMap<u64, Completion>,
    listeners: BTreeMap<ListenerId, Arc<dyn EventListener>>,
}

type SharedState = Arc<ParkingLotMutex<State>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseOrigin {
    Caller,
    /// The reader loop of the given session hit EOF or a read error
    Reader(u64),
}

/// Connection to a running mpv instance.
///
/// A connection starts closed. [`open`](Self::open) dials the socket and
/// starts a background reader task that routes replies to their callers and
/// broadcasts events to listeners. All methods take `&self`; wrap the
/// connection in an `Arc` to share it between tasks.
///
/// # Example
///
/// ```ignore
/// use mpvipc::{ConnectOptions, Connection};
/// use serde_json::json;
///
/// # async fn example() -> mpvipc::Result<()> {
/// let connection = Connection::new(ConnectOptions::new().socket_path("/tmp/mpvsocket"));
/// connection.open().await?;
///
/// connection.call(&[json!("cycle"), json!("pause")]).await?;
/// let volume = connection.get("volume").await?;
/// connection.set("volume", 50).await?;
///
/// connection.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    dialer: Box<dyn Dialer>,
    call_timeout: Option<Duration>,
    state: SharedState,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Connection")
            .field("open", &state.sender.is_some())
            .field("session", &state.session)
            .field("pending", &state.pending.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl Connection {
    /// Creates a closed connection to the socket named in `options`
    pub fn new(options: ConnectOptions) -> Self {
        let dialer = IpcSocketDialer::new(options.socket_path.clone());
        Self::with_dialer(dialer, options)
    }

    /// Creates a closed connection that obtains its stream from `dialer`
    pub fn with_dialer(dialer: impl Dialer + 'static, options: ConnectOptions) -> Self {
        Self {
            dialer: Box::new(dialer),
            call_timeout: options.call_timeout,
            state: Arc::new(ParkingLotMutex::new(State::default())),
        }
    }

    /// Connects to mpv and starts the reader task.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyOpen` if the connection is open.
    /// Returns `Error::ConnectionFailed` if the socket cannot be dialed.
    pub async fn open(&self) -> Result<()> {
        if self.state.lock().sender.is_some() {
            return Err(Error::AlreadyOpen);
        }

        let (reader, writer) = self.dialer.dial().await?;
        let (receiver, message_rx) = LineTransportReceiver::new(reader);

        let stale = {
            let mut state = self.state.lock();

            // Another open() may have finished while we were dialing
            if state.sender.is_some() {
                tracing::debug!("Connection was opened concurrently, dropping new stream");
                return Err(Error::AlreadyOpen);
            }

            state.session += 1;
            let session = state.session;
            state.sender = Some(SessionWriter::new(Box::new(writer)));

            let task = tokio::spawn(run_reader(
                Arc::clone(&self.state),
                session,
                Box::new(receiver),
                message_rx,
            ));
            state.reader = Some(task.abort_handle());

            tracing::debug!("Connection opened, session={}", session);
            std::mem::take(&mut state.pending)
        };

        if !stale.is_empty() {
            tracing::debug!(
                "Discarded {} pending request(s) from a previous session",
                stale.len()
            );
        }

        Ok(())
    }

    /// Closes the connection.
    ///
    /// Stops the reader task and drops every pending request; callers awaiting
    /// [`call`](Self::call) get `Error::ChannelClosed`. A write still in
    /// progress is abandoned and fails with `Error::TransportError`. Listeners
    /// stay registered. Calling `close` on a closed connection is a no-op.
    pub async fn close(&self) -> Result<()> {
        close_session(&self.state, CloseOrigin::Caller).await
    }

    /// True if never opened, closed explicitly, or closed because the stream ended
    pub fn is_closed(&self) -> bool {
        self.state.lock().sender.is_none()
    }

    /// Low-level send of one command line with a caller-chosen request id.
    ///
    /// No reply is awaited and nothing is registered for the id.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotOpen` without writing when the connection is closed,
    /// `Error::Encode` if the command cannot be serialized and
    /// `Error::TransportError` if the write fails.
    pub async fn send_command(&self, request_id: u64, arguments: &[Value]) -> Result<()> {
        let writer = self.state.lock().sender.clone().ok_or(Error::NotOpen)?;

        let line = CommandRequest::new(request_id, arguments).encode_line()?;

        tracing::debug!(
            "Sending command: request_id={}, command={}",
            request_id,
            command_name(arguments)
        );

        let mut closing = writer.closing.subscribe();
        let write = async {
            let mut sender = writer.sender.lock().await;
            sender.send(&line).await
        };

        tokio::select! {
            result = write => result.inspect_err(|e| {
                tracing::error!("Failed to send request {}: {}", request_id, e);
            }),
            _ = closing.wait_for(|closed| *closed) => {
                tracing::debug!("Abandoned write of request {}, connection closed", request_id);
                Err(Error::TransportError(format!(
                    "Connection closed while sending request {}",
                    request_id
                )))
            }
        }
    }

    /// Sends a command without waiting for the reply.
    ///
    /// When `completion` is given it is invoked once, from the reader task,
    /// when the matching reply arrives. It must not block. Returns the request
    /// id assigned to the command.
    ///
    /// If sending fails the completion is unregistered and will never run.
    pub async fn call_async(
        &self,
        arguments: &[Value],
        completion: Option<Completion>,
    ) -> Result<u64> {
        let request_id = {
            let mut state = self.state.lock();
            state.last_request += 1;
            let request_id = state.last_request;
            if let Some(completion) = completion {
                state.pending.insert(request_id, completion);
            }
            request_id
        };

        // Unregisters the completion if sending fails or this future is dropped
        let guard = PendingGuard::new(&self.state, request_id);
        self.send_command(request_id, arguments).await?;
        guard.disarm();

        Ok(request_id)
    }

    /// Sends a command and waits for mpv's reply.
    ///
    /// Waits indefinitely unless `ConnectOptions::call_timeout` is set.
    /// Dropping the returned future abandons the request.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProtocolError` if mpv reports a failure status,
    /// `Error::ChannelClosed` if the connection closes before the reply and
    /// `Error::Timeout` if the configured timeout elapses.
    pub async fn call(&self, arguments: &[Value]) -> Result<Value> {
        self.request(arguments, self.call_timeout).await
    }

    /// Like [`call`](Self::call) with an explicit deadline
    pub async fn call_with_timeout(&self, arguments: &[Value], timeout: Duration) -> Result<Value> {
        self.request(arguments, Some(timeout)).await
    }

    async fn request(&self, arguments: &[Value], timeout: Option<Duration>) -> Result<Value> {
        let (tx, rx) = oneshot::channel();
        let completion: Completion = Box::new(move |result: Result<Value>| {
            // The caller may have stopped waiting
            let _ = tx.send(result);
        });

        let request_id = self.call_async(arguments, Some(completion)).await?;
        let _guard = PendingGuard::new(&self.state, request_id);

        let reply = match timeout {
            Some(duration) => tokio::time::timeout(duration, rx).await.map_err(|_| {
                Error::Timeout(format!(
                    "No reply to '{}' (request {}) after {:?}",
                    command_name(arguments),
                    request_id,
                    duration
                ))
            })?,
            None => rx.await,
        };

        reply.map_err(|_| Error::ChannelClosed).and_then(|result| result)
    }

    /// Reads a property (`get_property`)
    pub async fn get(&self, property: &str) -> Result<Value> {
        self.call(&[Value::from("get_property"), Value::from(property)])
            .await
    }

    /// Reads a property and decodes it into `T`
    pub async fn get_as<T: DeserializeOwned>(&self, property: &str) -> Result<T> {
        let value = self.get(property).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sets a property (`set_property`) and waits for mpv to acknowledge it
    pub async fn set(&self, property: &str, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value).map_err(Error::Encode)?;
        self.call(&[Value::from("set_property"), Value::from(property), value])
            .await
            .map(|_| ())
    }

    /// Sets a property without waiting.
    ///
    /// The returned result only covers sending. `on_done`, if given, runs on
    /// the reader task once mpv acknowledges.
    pub async fn set_async(
        &self,
        property: &str,
        value: impl Serialize,
        on_done: Option<Box<dyn FnOnce(Result<()>) + Send>>,
    ) -> Result<()> {
        let value = serde_json::to_value(value).map_err(Error::Encode)?;
        let completion = on_done.map(|f| -> Completion {
            Box::new(move |result: Result<Value>| f(result.map(|_| ())))
        });

        self.call_async(
            &[Value::from("set_property"), Value::from(property), value],
            completion,
        )
        .await
        .map(|_| ())
    }

    /// Registers a listener for every event received from now on.
    ///
    /// The listener runs on the reader task and must not block. It stays
    /// registered across close and re-open until the returned
    /// [`Subscription`] is cancelled.
    pub fn listen_for_events(&self, listener: impl EventListener + 'static) -> Subscription {
        let mut state = self.state.lock();
        state.last_listener += 1;
        let id = ListenerId(state.last_listener);
        state.listeners.insert(id, Arc::new(listener));

        tracing::debug!("Registered event listener {:?}", id);

        Subscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Registers a listener that forwards events into a channel
    pub fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<Event>) {
        let (listener, rx) = ChannelListener::new();
        (self.listen_for_events(listener), rx)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(reader) = self.state.lock().reader.take() {
            reader.abort();
        }
    }
}

/// Handle to a registered event listener.
///
/// Dropping the handle does not unregister the listener; call
/// [`cancel`](Self::cancel).
#[derive(Clone)]
pub struct Subscription {
    id: ListenerId,
    state: Weak<ParkingLotMutex<State>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Unregisters the listener. Safe to call more than once, and from inside
    /// the listener itself.
    pub fn cancel(&self) {
        if let Some(state) = self.state.upgrade() {
            if state.lock().listeners.remove(&self.id).is_some() {
                tracing::debug!("Unregistered event listener {:?}", self.id);
            }
        }
    }
}

/// Removes a pending entry when dropped, unless disarmed
struct PendingGuard<'a> {
    state: &'a ParkingLotMutex<State>,
    request_id: u64,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(state: &'a ParkingLotMutex<State>, request_id: u64) -> Self {
        Self {
            state,
            request_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().pending.remove(&self.request_id);
        }
    }
}

fn command_name(arguments: &[Value]) -> &str {
    arguments.first().and_then(Value::as_str).unwrap_or("<none>")
}

/// Reader loop for one session: drives the transport and dispatches each line
async fn run_reader(
    state: SharedState,
    session: u64,
    receiver: Box<dyn TransportReceiver>,
    mut message_rx: mpsc::UnboundedReceiver<String>,
) {
    let transport = async move {
        let mut receiver = receiver;
        if let Err(e) = receiver.run().await {
            tracing::warn!("Transport error: {}", e);
        }
        // Dropping the receiver closes the line channel and ends dispatch
        drop(receiver);
    };

    let dispatch = async {
        while let Some(line) = message_rx.recv().await {
            dispatch_line(&state, &line);
        }
    };

    tokio::join!(transport, dispatch);

    tracing::debug!("Reader loop ended (stream closed), session={}", session);
    if let Err(e) = close_session(&state, CloseOrigin::Reader(session)).await {
        tracing::debug!("Error closing session {} after stream end: {}", session, e);
    }
}

fn dispatch_line(state: &ParkingLotMutex<State>, line: &str) {
    let message = Message::parse(line);

    if message.is_empty() {
        tracing::trace!("Skipping unrecognized line: {}", line);
        return;
    }

    if let Some(event) = message.event {
        dispatch_event(state, &event);
    }

    if let Some(result) = message.result {
        dispatch_result(state, result);
    }
}

fn dispatch_event(state: &ParkingLotMutex<State>, event: &Event) {
    let listeners: Vec<(ListenerId, Arc<dyn EventListener>)> = state
        .lock()
        .listeners
        .iter()
        .map(|(id, listener)| (*id, Arc::clone(listener)))
        .collect();

    tracing::debug!(
        "Dispatching event '{}' to {} listener(s)",
        event.name,
        listeners.len()
    );

    let mut closed = Vec::new();
    for (id, listener) in listeners {
        if listener.is_closed() {
            closed.push(id);
        } else {
            listener.notify(event);
        }
    }

    if !closed.is_empty() {
        let mut state = state.lock();
        for id in &closed {
            state.listeners.remove(id);
        }
        tracing::debug!("Removed {} closed listener(s): {:?}", closed.len(), closed);
    }
}

fn dispatch_result(state: &ParkingLotMutex<State>, result: CommandResult) {
    let completion = state.lock().pending.remove(&result.request_id);

    match completion {
        Some(completion) => {
            tracing::debug!(
                "Completing request {} with status '{}'",
                result.request_id,
                result.status
            );
            completion(result.into_result());
        }
        None => tracing::debug!(
            "No pending request for request_id={}, dropping reply",
            result.request_id
        ),
    }
}

async fn close_session(state: &ParkingLotMutex<State>, origin: CloseOrigin) -> Result<()> {
    let (writer, reader, pending) = {
        let mut state = state.lock();

        if let CloseOrigin::Reader(session) = origin {
            // A re-open replaced the session this reader belonged to
            if state.session != session {
                return Ok(());
            }
        }

        let Some(writer) = state.sender.take() else {
            return Ok(());
        };

        (
            writer,
            state.reader.take(),
            std::mem::take(&mut state.pending),
        )
    };

    tracing::debug!(
        "Closing connection ({:?}), dropping {} pending request(s)",
        origin,
        pending.len()
    );

    if let Some(reader) = reader {
        // The reader task closing its own session must keep running to finish
        if origin == CloseOrigin::Caller {
            reader.abort();
        }
    }
    drop(pending);

    // Wake writers blocked on a peer that stopped reading so the lock frees up
    writer.closing.send_replace(true);

    let mut sender = writer.sender.lock().await;
    sender.close().await
}
