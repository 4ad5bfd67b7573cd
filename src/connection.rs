//! Text connections over an upgraded transport.

use std::{
    borrow::BorrowMut,
    future::Future,
    pin::Pin,
    task::{ready, Context, Poll},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use hyper::{upgrade::Upgraded, Request};
use hyper_util::rt::TokioIo;
use pin_project::pin_project;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::codec::Framed;

use crate::{
    codec::Codec,
    frame::{Frame, OpCode, Role},
    handshake::{self, HttpResponse},
    Options, Result, WebSocketError,
};

/// The result type returned by WebSocket upgrade operations.
///
/// Both components must be handled for a successful upgrade:
/// 1. Send the HTTP response to the client
/// 2. Await the future to obtain the connection
pub type UpgradeResult = Result<(HttpResponse, UpgradeFut)>;

/// A periodic message source owned by a [`Connection`].
///
/// The ticker has no timer of its own. [`Connection::run_with_ticker`] creates the interval
/// and drops it when the connection ends, so nothing keeps firing for a closed socket.
pub struct Ticker {
    period: Duration,
    count: u64,
    message: Box<dyn FnMut(u64) -> String + Send>,
}

impl Ticker {
    /// Sends `message(n)` every `period`, with `n` counting from 1.
    ///
    /// A zero period is raised to one millisecond.
    pub fn new(period: Duration, message: impl FnMut(u64) -> String + Send + 'static) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            count: 0,
            message: Box::new(message),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn next_message(&mut self) -> String {
        self.count += 1;
        (self.message)(self.count)
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("period", &self.period)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

/// A WebSocket connection exchanging text messages.
///
/// Frames are read through the incremental [`Codec`], so the transport may split or coalesce
/// them freely. Outgoing frames follow the masking policy of the connection's [`Role`].
///
/// A `Close` frame from the peer ends the stream like a transport EOF does; no close frame is
/// sent back.
///
/// ```rust
/// use wsframe::{Connection, Options, Role};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> wsframe::Result<()> {
/// let (a, b) = tokio::io::duplex(1024);
/// let mut client = Connection::new(a, Role::Client, Options::default());
/// let mut server = Connection::new(b, Role::Server, Options::default());
///
/// client.send("hello").await?;
/// assert_eq!(server.recv().await.unwrap()?, "hello");
/// # Ok(())
/// # }
/// ```
pub struct Connection<S> {
    stream: Framed<S, Codec>,
    role: Role,
    check_utf8: bool,
    closed: bool,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already upgraded transport.
    pub fn new(io: S, role: Role, options: Options) -> Self {
        Self {
            stream: Framed::new(io, Codec::new(role, &options)),
            role,
            check_utf8: options.check_utf8,
            closed: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Waits for the next text message.
    ///
    /// # Returns
    /// - `Some(Ok(text))` for each text or continuation frame.
    /// - `Some(Err(_))` for protocol errors, I/O errors, and frames that carry no text
    ///   (`UnsupportedFrame`).
    /// - `None` once the peer has closed the transport or sent a `Close` frame.
    pub async fn recv(&mut self) -> Option<Result<String>> {
        if self.closed {
            return None;
        }

        let frame = match self.stream.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => return Some(Err(err)),
            None => {
                self.closed = true;
                return None;
            }
        };

        match frame.opcode {
            OpCode::Close => {
                #[cfg(feature = "logging")]
                log::debug!("Received close frame as {}", self.role);

                self.closed = true;
                None
            }
            opcode if !opcode.is_text() => Some(Err(WebSocketError::UnsupportedFrame(opcode))),
            _ if self.check_utf8 => Some(frame.into_text()),
            _ => Some(Ok(String::from_utf8_lossy(&frame.payload).into_owned())),
        }
    }

    /// Sends `text` as a single text frame and flushes it.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        if self.closed {
            return Err(WebSocketError::ConnectionClosed);
        }

        self.stream.send(Frame::text(text)).await
    }

    /// Flushes pending frames and shuts the transport down.
    pub async fn close(mut self) -> Result<()> {
        self.closed = true;
        SinkExt::<Frame>::close(&mut self.stream).await
    }

    /// Delivers every received message to `on_message` until the peer goes away.
    pub async fn run<F>(mut self, mut on_message: F) -> Result<()>
    where
        F: FnMut(String),
    {
        while let Some(message) = self.recv().await {
            on_message(message?);
        }

        #[cfg(feature = "logging")]
        log::debug!("Connection closed by peer");

        Ok(())
    }

    /// Like [`Connection::run`], but also sends the ticker's message every period.
    ///
    /// The first message goes out one period after the call. The interval lives in this
    /// future: it stops when the connection ends, errors, or the future is dropped.
    pub async fn run_with_ticker<F>(mut self, mut ticker: Ticker, mut on_message: F) -> Result<()>
    where
        F: FnMut(String),
    {
        let mut interval = time::interval_at(Instant::now() + ticker.period, ticker.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let message = ticker.next_message();
                    self.send(&message).await?;
                }
                message = self.recv() => match message {
                    Some(message) => on_message(message?),
                    None => break,
                },
            }
        }

        #[cfg(feature = "logging")]
        log::debug!("Connection closed by peer after {} ticks", ticker.count);

        Ok(())
    }
}

/// Starts a server-side upgrade of `request`.
///
/// Validates the upgrade headers, derives the accept token and returns the
/// `101 Switching Protocols` response together with a future resolving to the connection.
///
/// # Errors
/// Any error from [`handshake::switching_protocols`].
///
/// # Example
/// ```no_run
/// use hyper::{body::Incoming, Request};
/// use wsframe::{upgrade, HttpResponse, Options};
///
/// async fn server_upgrade(mut req: Request<Incoming>) -> wsframe::Result<HttpResponse> {
///     let (response, fut) = upgrade(&mut req, Options::default())?;
///
///     tokio::spawn(async move {
///         if let Ok(mut conn) = fut.await {
///             while let Some(Ok(text)) = conn.recv().await {
///                 let _ = conn.send(&text).await;
///             }
///         }
///     });
///
///     Ok(response)
/// }
/// ```
pub fn upgrade<B>(mut request: impl BorrowMut<Request<B>>, options: Options) -> UpgradeResult {
    let request = request.borrow_mut();
    let response = handshake::switching_protocols(request.headers())?;

    let fut = UpgradeFut {
        inner: hyper::upgrade::on(request),
        options: Some(options),
    };

    Ok((response, fut))
}

/// Future that completes the WebSocket upgrade process on a server, returning a connection.
///
/// # Important
/// The associated HTTP upgrade response must be sent to the client before polling this future.
/// The future will not complete until the response is sent and the HTTP connection is upgraded.
#[pin_project]
#[derive(Debug)]
pub struct UpgradeFut {
    #[pin]
    inner: hyper::upgrade::OnUpgrade,
    options: Option<Options>,
}

impl Future for UpgradeFut {
    type Output = Result<Connection<TokioIo<Upgraded>>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let upgraded = ready!(this.inner.poll(cx))?;
        let options = this.options.take().unwrap_or_default();

        Poll::Ready(Ok(Connection::new(
            TokioIo::new(upgraded),
            Role::Server,
            options,
        )))
    }
}
