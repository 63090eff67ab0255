use std::{
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use http::{StatusCode, Uri};
use reqwest::{Client, ClientBuilder, Url, header::AUTHORIZATION};
use serde_json::Value;
use tokio::{
    sync::{mpsc, oneshot},
    time,
};
use tokio_tungstenite::tungstenite::Message;

use crate::{
    adapter::{Adapter, Caller, Connector, dispatch, error::ConnectError, extract_match_unions},
    chain::{Context, MatchUnion, Prefix},
    error::ApiError,
    plugin::Plugin,
    schema::*,
};

const API_BASE: &str = "https://discord.com/api/v10";
const MAX_RATE_LIMIT_RETRIES: usize = 3;

#[derive(Debug)]
pub struct GatewayAdapter {
    token: String,
    intents: u64,
    http: Client,
    // 0 表示尚未收到任何 dispatch，Discord 的序号从 1 开始
    sequence: Arc<AtomicU64>,
}

impl GatewayAdapter {
    pub fn new(token: impl Into<String>, intents: u64) -> Result<Box<Self>> {
        Ok(Box::new(GatewayAdapter {
            token: token.into(),
            intents,
            http: ClientBuilder::new().timeout(Duration::from_secs(20)).build()?,
            sequence: Arc::new(AtomicU64::new(0)),
        }))
    }

    fn last_sequence(&self) -> Option<u64> {
        match self.sequence.load(Ordering::Relaxed) {
            0 => None,
            s => Some(s),
        }
    }

    /// 运行一次完整的 gateway 会话，返回 `Ok` 表示需要重连
    async fn run_session(
        self: Arc<Self>,
        match_unions: Arc<Vec<Arc<MatchUnion>>>,
        plugins: Arc<Vec<Plugin>>,
        prefix: Prefix,
    ) -> Result<()> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(Uri::from_str(GATEWAY_URL)?).await?;
        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        // 第一帧必须是 Hello，从中取得心跳间隔
        let hello = match ws_stream.next().await {
            Some(Ok(Message::Text(text))) => serde_json::from_str::<GatewayPayload>(&text)?,
            other => return Err(ConnectError::Handshake(format!("{other:?}")).into()),
        };
        if hello.op != opcode::HELLO {
            return Err(ConnectError::Handshake(format!("op {}", hello.op)).into());
        }
        let hello: Hello = serde_json::from_value(hello.d)?;
        ws_sink
            .send(Message::text(serde_json::to_string(&GatewayPayload::identify(
                &self.token,
                self.intents,
            ))?))
            .await?;
        info!("Gateway session identified, heartbeat every {}ms", hello.heartbeat_interval);
        self.sequence.store(0, Ordering::Relaxed);

        let (frame_tx, mut frame_rx) = mpsc::channel::<GatewayPayload>(32);
        // 启动发送任务
        let (sender_res_tx, sender_res_rx) = oneshot::channel::<Result<()>>();
        let sender = tokio::spawn(async move {
            let e = async {
                while let Some(frame) = frame_rx.recv().await {
                    ws_sink.send(Message::text(serde_json::to_string(&frame)?)).await?;
                }
                Ok::<_, anyhow::Error>(())
            }
            .await;
            let _ = sender_res_tx.send(e);
        });
        // 启动心跳任务
        let heartbeat = tokio::spawn(heartbeat(
            self.clone(),
            frame_tx.clone(),
            Duration::from_millis(hello.heartbeat_interval),
        ));
        // 启动接收任务
        let (receiver_res_tx, receiver_res_rx) = oneshot::channel::<Result<()>>();
        let this = self.clone();
        let receiver = tokio::spawn(async move {
            let e = async {
                while let Some(msg) = ws_stream.next().await {
                    let text = match msg {
                        Ok(Message::Text(text)) => text,
                        Ok(Message::Close(frame)) => {
                            let code = frame.map(|frame| u16::from(frame.code));
                            warn!("Gateway closed the connection: {code:?}");
                            return match code {
                                Some(code) if FATAL_CLOSE_CODES.contains(&code) => Err(ConnectError::Fatal(code).into()),
                                _ => Ok(()),
                            };
                        }
                        Ok(_) => continue,
                        Err(e) => {
                            warn!("Gateway read error, reconnecting: {e:?}");
                            return Ok(());
                        }
                    };
                    let payload = match serde_json::from_str::<GatewayPayload>(&text) {
                        Ok(payload) => payload,
                        Err(_) => {
                            warn!("Receive unknown frame: {}", text.as_str());
                            continue;
                        }
                    };
                    match payload.op {
                        opcode::DISPATCH => {
                            if let Some(s) = payload.s {
                                this.sequence.store(s, Ordering::Relaxed);
                            }
                            let Some(kind) = payload.t else {
                                continue;
                            };
                            let event = match Event::from_dispatch(&kind, payload.d) {
                                Ok(Some(event)) => event,
                                Ok(None) => continue,
                                Err(e) => {
                                    warn!("Failed to decode {kind}: {e:?}");
                                    continue;
                                }
                            };
                            if let Event::Ready(ready) = &event {
                                info!("Logged in as {} ({})", ready.user.username, ready.user.id);
                            }
                            debug!("Receive event: {event:?}");
                            let context = Context {
                                caller: this.clone(),
                                event: Arc::new(event),
                                plugins: plugins.clone(),
                                prefix: prefix.clone(),
                            };
                            let match_unions = match_unions.clone();
                            tokio::spawn(async move {
                                dispatch(&match_unions, context).await;
                            });
                        }
                        opcode::HEARTBEAT => {
                            frame_tx.send(GatewayPayload::heartbeat(this.last_sequence())).await?;
                        }
                        opcode::HEARTBEAT_ACK => trace!("Heartbeat acknowledged"),
                        opcode::RECONNECT => {
                            info!("Gateway requested a reconnect");
                            return Ok(());
                        }
                        opcode::INVALID_SESSION => {
                            warn!("Gateway invalidated the session");
                            time::sleep(Duration::from_millis(rand::random_range(1000..5000))).await;
                            return Ok(());
                        }
                        op => warn!("Receive unexpected op {op}"),
                    }
                }
                Ok::<_, anyhow::Error>(())
            }
            .await;
            let _ = receiver_res_tx.send(e);
        });
        let res = tokio::select! {
            res = sender_res_rx => {
                let res = res?;
                error!("Send frame task exited: {res:?}");
                res
            },
            res = receiver_res_rx => res?,
        };
        heartbeat.abort();
        sender.abort();
        receiver.abort();
        res
    }
}

async fn heartbeat(adapter: Arc<GatewayAdapter>, frame_tx: mpsc::Sender<GatewayPayload>, interval: Duration) {
    // 第一次心跳需要随机延迟，避免大量客户端同时心跳
    time::sleep(interval.mul_f64(rand::random::<f64>())).await;
    let mut ticker = time::interval(interval);
    loop {
        ticker.tick().await;
        if frame_tx
            .send(GatewayPayload::heartbeat(adapter.last_sequence()))
            .await
            .is_err()
        {
            break;
        }
    }
}

#[async_trait]
impl Connector for GatewayAdapter {
    async fn spawn(self: Box<Self>, plugins: Vec<Plugin>, prefix: Prefix) -> Result<()> {
        info!("Bot started");
        let this = Arc::new(*self);
        let match_unions = Arc::new(extract_match_unions(&plugins));
        let plugins = Arc::new(plugins);
        let mut failures = 0u32;
        loop {
            match this
                .clone()
                .run_session(match_unions.clone(), plugins.clone(), prefix.clone())
                .await
            {
                Ok(()) => failures = 0,
                Err(e) if matches!(e.downcast_ref::<ConnectError>(), Some(ConnectError::Fatal(_))) => return Err(e),
                Err(e) => {
                    failures = (failures + 1).min(6);
                    error!("Gateway session failed: {e:?}");
                }
            }
            // 连续失败时退避，最长约一分钟
            let delay = Duration::from_secs(1 << failures);
            info!("Reconnecting to gateway in {}s", delay.as_secs());
            time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Caller for GatewayAdapter {
    async fn call(&self, request: ApiRequest) -> Result<Value> {
        let mut url = Url::parse(API_BASE)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("{API_BASE} cannot be a base url"))?
            .extend(&request.route);
        for _ in 0..=MAX_RATE_LIMIT_RETRIES {
            let mut builder = self
                .http
                .request(request.method.clone(), url.clone())
                .header(AUTHORIZATION, format!("Bot {}", self.token))
                .query(&request.query);
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
            let resp = builder.send().await?;
            let status = resp.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = resp
                    .json::<Value>()
                    .await
                    .ok()
                    .and_then(|body| body["retry_after"].as_f64())
                    .unwrap_or(1.0);
                warn!("{} {} rate limited, retry after {retry_after}s", request.method, request.path());
                time::sleep(Duration::from_secs_f64(retry_after)).await;
                continue;
            }
            if !status.is_success() {
                return Err(ApiError::Status {
                    method: request.method.clone(),
                    path: request.path(),
                    status,
                    body: resp.text().await.unwrap_or_default(),
                }
                .into());
            }
            if status == StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            return Ok(resp.json().await?);
        }
        Err(ApiError::RateLimited(request.path()).into())
    }
}

#[async_trait]
impl Adapter for GatewayAdapter {}
