use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use clap::Args;
use http_body_util::Full;
use hyper::{
    body::{Bytes, Incoming},
    header,
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::{net::TcpListener, runtime};
use wsframe::{Options, Ticker};

const INDEX_HTML: &str = include_str!("../static/index.html");

type HttpResponse = Response<Full<Bytes>>;

/// Serve the demo page and accept WebSocket connections.
///
/// Every connection receives a timestamped message each `--interval` until it closes.
#[derive(Args)]
#[command(alias = "s")]
pub struct Cmd {
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Request path that is upgraded to a WebSocket.
    #[arg(short, long, default_value = "/ws")]
    path: String,

    /// Time between two server messages on a connection.
    /// Accepts human-readable formats like "5s", "1m", "500ms".
    #[arg(short, long, value_parser = humantime::parse_duration, default_value = "2s")]
    interval: Duration,

    /// Largest frame payload accepted from a page, in bytes.
    #[arg(long, default_value_t = wsframe::MAX_PAYLOAD_READ)]
    max_payload: usize,
}

pub fn run(cmd: Cmd) -> anyhow::Result<()> {
    if !cmd.path.starts_with('/') || cmd.path == "/" {
        anyhow::bail!("websocket path must start with '/' and differ from the page: {}", cmd.path);
    }

    let runtime = runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(serve(Arc::new(cmd)))
}

async fn serve(cmd: Arc<Cmd>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(cmd.addr).await?;
    log::info!(
        "Listening on http://{} (websocket path {}, interval {})",
        listener.local_addr()?,
        cmd.path,
        humantime::format_duration(cmd.interval)
    );

    loop {
        let (stream, peer) = listener.accept().await?;
        let cmd = Arc::clone(&cmd);

        tokio::spawn(async move {
            let service = service_fn(move |req| route(req, Arc::clone(&cmd), peer));
            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .with_upgrades()
                .await
            {
                log::error!("Connection from {peer} failed: {err}");
            }
        });
    }
}

async fn route(
    mut req: Request<Incoming>,
    cmd: Arc<Cmd>,
    peer: SocketAddr,
) -> Result<HttpResponse, Infallible> {
    if req.uri().path() == cmd.path {
        return Ok(accept(&mut req, &cmd, peer));
    }

    if req.uri().path() == "/" && req.method() == Method::GET {
        return Ok(page(&cmd.path));
    }

    log::debug!("{peer} requested {}", req.uri());
    Ok(status(StatusCode::NOT_FOUND))
}

fn accept(req: &mut Request<Incoming>, cmd: &Cmd, peer: SocketAddr) -> HttpResponse {
    let options = Options::default().with_max_payload_read(cmd.max_payload);
    let (response, fut) = match wsframe::upgrade(req, options) {
        Ok(pair) => pair,
        Err(err) => {
            log::warn!("Rejected upgrade from {peer}: {err}");
            return status(StatusCode::BAD_REQUEST);
        }
    };

    let ticker = Ticker::new(cmd.interval, |n| {
        format!(
            "server message #{n} at {}",
            chrono::Local::now().format("%H:%M:%S")
        )
    });

    tokio::spawn(async move {
        let conn = match fut.await {
            Ok(conn) => conn,
            Err(err) => {
                log::error!("Upgrade with {peer} failed: {err}");
                return;
            }
        };
        log::info!("{peer} connected");

        match conn
            .run_with_ticker(ticker, |text| log::info!("{peer} says: {text}"))
            .await
        {
            Ok(()) => log::info!("{peer} disconnected"),
            Err(err) => log::warn!("{peer} dropped: {err}"),
        }
    });

    response.map(|_| Full::new(Bytes::new()))
}

fn page(ws_path: &str) -> HttpResponse {
    let html = INDEX_HTML.replace("{{WS_PATH}}", ws_path);
    let mut response = Response::new(Full::new(Bytes::from(html)));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

fn status(code: StatusCode) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = code;
    response
}
