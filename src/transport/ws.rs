use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::notification::model::NotifyError;
use crate::notification::store::LiveEvent;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Open the live subscription channel.
///
/// The server authenticates the connection from the token query parameter.
/// Parsed events are forwarded into the returned channel; when the stream
/// ends (server close, network error) the channel closes with it, which the
/// listener observes as `SubscriptionDropped`. Reconnection is the embedding
/// transport owner's concern, not this module's.
pub async fn connect(config: &ClientConfig) -> Result<mpsc::Receiver<LiveEvent>, NotifyError> {
    let mut url = config.ws_url.clone();
    url.query_pairs_mut().append_pair("token", &config.token);

    let (stream, _) = connect_async(url.as_str())
        .await
        .map_err(|err| NotifyError::SubscriptionDropped(err.to_string()))?;
    info!("subscribed to live notification events");

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(pump(stream, tx));
    Ok(rx)
}

async fn pump(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    tx: mpsc::Sender<LiveEvent>,
) {
    let (mut sink, mut source) = stream.split();

    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Text(payload)) => match serde_json::from_str::<LiveEvent>(&payload) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        // Listener is gone; nobody left to notify.
                        break;
                    }
                }
                Err(err) => {
                    debug!("ignoring unrecognized live payload: {}", err);
                }
            },
            Ok(Message::Ping(payload)) => {
                if let Err(err) = sink.send(Message::Pong(payload)).await {
                    warn!("failed to answer server ping: {}", err);
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("live event stream closed by server");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(
                    "{}",
                    NotifyError::SubscriptionDropped(err.to_string())
                );
                break;
            }
        }
    }
    // Dropping tx closes the listener's event channel.
}
