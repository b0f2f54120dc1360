// src/server/livereload.rs

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Route the client script connects to.
pub const LIVERELOAD_PATH: &str = "/__sitepipe/livereload";

/// Route serving [`CLIENT_SCRIPT`].
pub const CLIENT_SCRIPT_PATH: &str = "/__sitepipe/livereload.js";

/// Reloads the page on a `reload` message and reconnects if the socket
/// drops.
pub const CLIENT_SCRIPT: &str = r#"(function () {
  var proto = location.protocol === "https:" ? "wss:" : "ws:";
  function connect() {
    var socket = new WebSocket(proto + "//" + location.host + "/__sitepipe/livereload");
    socket.onmessage = function (event) {
      if (event.data === "reload") {
        location.reload();
      }
    };
    socket.onclose = function () {
      setTimeout(connect, 1000);
    };
  }
  connect();
})();
"#;

/// Broadcasts reload requests to every connected browser.
#[derive(Debug, Clone)]
pub struct LiveReload {
    tx: broadcast::Sender<()>,
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Ask all connected clients to reload. Returns how many were reached.
    pub fn notify(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub async fn websocket_handler(ws: WebSocketUpgrade, State(reload): State<LiveReload>) -> Response {
    let rx = reload.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, rx))
}

async fn handle_socket(mut socket: WebSocket, mut rx: broadcast::Receiver<()>) {
    info!("live reload client connected");

    loop {
        tokio::select! {
            notice = rx.recv() => match notice {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if socket.send(Message::Text("reload".into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("live reload client disconnected");
}

pub async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_SCRIPT,
    )
}
