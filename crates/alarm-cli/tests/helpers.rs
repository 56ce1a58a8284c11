//! Test helpers: in-process cluster endpoints.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use alarm_proto::messages::error_codes;
use alarm_proto::{
    AlarmAction, AlarmMember, AlarmRequest, AlarmResponse, ClientMessage, ResponseHeader,
    ServerMessage,
};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::accept_async;

/// Member ID the mock cluster does not know about.
pub const UNKNOWN_MEMBER: u64 = 0xdead;

/// Member ID whose requests are never answered.
pub const STALLED_MEMBER: u64 = 0x5a11;

/// Header attached to every mock response.
pub const HEADER: ResponseHeader = ResponseHeader {
    cluster_id: 0x1000,
    member_id: 0x2000,
    revision: 7,
    raft_term: 3,
};

#[derive(Default)]
struct State {
    active: Vec<AlarmMember>,
    requests: Vec<AlarmRequest>,
}

/// A cluster endpoint that keeps alarms in memory.
pub struct MockCluster {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
    task: JoinHandle<()>,
}

impl MockCluster {
    /// Bind to an available port and start serving.
    pub async fn start() -> Self {
        Self::start_with(Vec::new()).await
    }

    /// Start serving with `active` alarms already raised.
    pub async fn start_with(active: Vec<AlarmMember>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let state = Arc::new(Mutex::new(State {
            active,
            requests: Vec::new(),
        }));

        let shared = Arc::clone(&state);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&shared)));
            }
        });

        Self { addr, state, task }
    }

    /// WebSocket URL of this endpoint.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Alarms currently raised.
    pub fn active(&self) -> Vec<AlarmMember> {
        self.state.lock().expect("state lock").active.clone()
    }

    /// Every alarm request received, in order.
    pub fn requests(&self) -> Vec<AlarmRequest> {
        self.state.lock().expect("state lock").requests.clone()
    }

    /// Stop accepting connections.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, state: Arc<Mutex<State>>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else {
            continue;
        };
        let reply = match ClientMessage::from_json(&text) {
            Ok(ClientMessage::Hello { .. }) => ServerMessage::welcome("mock-3.6.0"),
            Ok(ClientMessage::Alarm(request)) if request.member_id == STALLED_MEMBER => {
                record(&state, request);
                std::future::pending().await
            }
            Ok(ClientMessage::Alarm(request)) => handle(&state, request),
            Err(e) => ServerMessage::error(error_codes::INVALID_REQUEST, e.to_string()),
        };
        let json = reply.to_json().expect("encode reply");
        if ws.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }
}

fn record(state: &Mutex<State>, request: AlarmRequest) {
    state.lock().expect("state lock").requests.push(request);
}

fn handle(state: &Mutex<State>, request: AlarmRequest) -> ServerMessage {
    let mut state = state.lock().expect("state lock");
    state.requests.push(request);

    if request.member_id == UNKNOWN_MEMBER {
        return ServerMessage::error(error_codes::MEMBER_NOT_FOUND, "member not found");
    }

    let member = request.member();
    let alarms = match request.action {
        AlarmAction::Get => state.active.clone(),
        AlarmAction::Activate => {
            if !state.active.contains(&member) {
                state.active.push(member);
            }
            vec![member]
        }
        AlarmAction::Deactivate => {
            let before = state.active.len();
            state.active.retain(|active| *active != member);
            if state.active.len() < before {
                vec![member]
            } else {
                Vec::new()
            }
        }
    };
    ServerMessage::Alarm(AlarmResponse::new(HEADER, alarms))
}

/// An endpoint that accepts TCP connections and never answers.
pub struct SilentCluster {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl SilentCluster {
    /// Bind to an available port and start swallowing connections.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        Self { addr, task }
    }

    /// WebSocket URL of this endpoint.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Stop accepting connections.
    pub fn shutdown(self) {
        self.task.abort();
    }
}
