//! One relay worker: a single control channel and a single HTTP client.
//!
//! The worker drives an unbounded receive -> decode -> execute -> encode
//! -> send loop. Exactly one instruction is in flight at a time: the
//! reply for cycle k is written before the frame for cycle k+1 is read.
//! Only channel-level failures end the loop; a failed HTTP request or an
//! unparseable frame produces an error reply and the loop continues.

use crate::error::{Error, Result};
use crate::protocol::{Instruction, Method, Reply};
use futures_util::{SinkExt, StreamExt};
use reqwest::header::{CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::redirect;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

pub struct Worker {
    id: usize,
    relay_url: String,
    http: reqwest::Client,
    idle_timeout: Option<Duration>,
}

impl Worker {
    /// Creates a worker with ordinal `id`. The ordinal tags log lines
    /// only; it is never sent on the wire. The HTTP client is built once
    /// and reused across cycles for connection keep-alive, but carries
    /// no per-cycle state. Redirects are never followed: the relay gets
    /// the first response, 3xx included.
    pub fn new(
        id: usize,
        relay_url: String,
        request_timeout: Duration,
        idle_timeout: Option<Duration>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(request_timeout)
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Worker {
            id,
            relay_url,
            http,
            idle_timeout,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Connects to the relay and serves instruction/reply cycles until
    /// the channel fails or the relay closes it. Returns `Ok(())` on a
    /// clean close, [`Error::Connect`] when the handshake never
    /// completed, and other errors for failures after the session was
    /// established; the caller owns the reconnect policy.
    pub async fn run(&self) -> Result<()> {
        let (ws_stream, _) = connect_async(&self.relay_url)
            .await
            .map_err(Error::Connect)?;
        info!("#{:03} connected to {}", self.id, self.relay_url);

        let (mut write, mut read) = ws_stream.split();

        loop {
            let frame = match self.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, read.next()).await {
                    Ok(frame) => frame,
                    Err(_) => return Err(Error::IdleTimeout(limit.as_secs())),
                },
                None => read.next().await,
            };

            let raw = match frame {
                Some(Ok(Message::Text(text))) => text.into_bytes(),
                Some(Ok(Message::Binary(data))) => data,
                Some(Ok(Message::Ping(payload))) => {
                    write.send(Message::Pong(payload)).await?;
                    continue;
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("#{:03} channel closed by relay", self.id);
                    return Ok(());
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            };

            debug!("#{:03} <<< {}B", self.id, raw.len());

            let reply = match serde_json::from_slice::<Instruction>(&raw) {
                Ok(instr) => self.dispatch(&instr).await,
                Err(e) => {
                    warn!("#{:03} unparseable instruction frame: {}", self.id, e);
                    Reply::malformed()
                }
            };

            let encoded = serde_json::to_string(&reply).map_err(Error::Encode)?;
            debug!("#{:03} >>> {}B", self.id, encoded.len());
            write.send(Message::Text(encoded)).await?;
        }
    }

    /// Runs one instruction to completion, always producing a reply.
    async fn dispatch(&self, instr: &Instruction) -> Reply {
        match self.execute(instr).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    "#{:03} {} {} failed: {}",
                    self.id,
                    instr.method.as_str(),
                    instr.target_url,
                    e
                );
                Reply::request_error(&e)
            }
        }
    }

    async fn execute(&self, instr: &Instruction) -> std::result::Result<Reply, reqwest::Error> {
        let method = match instr.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut request = self
            .http
            .request(method, &instr.target_url)
            .header(USER_AGENT, &instr.user_agent);
        if !instr.content_type.is_empty() {
            request = request.header(CONTENT_TYPE, &instr.content_type);
        }

        let response = request.body(instr.body.clone()).send().await?;

        let status = response.status().as_u16();
        // Lossy so an odd-byte Location still reaches the relay instead
        // of reading as "header absent".
        let redirect_location = response
            .headers()
            .get(LOCATION)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default();
        let body = response.bytes().await?.to_vec();

        Ok(Reply {
            status,
            body,
            redirect_location,
        })
    }
}
