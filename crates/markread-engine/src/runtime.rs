use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use markread_core::{HostError, Message, Response, RuntimeMessenger};

/// A message in flight to the coordinator, with its reply slot.
pub struct Envelope {
    pub message: Message,
    reply: oneshot::Sender<Result<Response, HostError>>,
}

impl Envelope {
    /// Answer the sender. A sender that stopped waiting is not an error.
    pub fn respond(self, result: Result<Response, HostError>) {
        let _ = self.reply.send(result);
    }
}

/// Sending half of the in-process runtime channel. Cheap to clone.
#[derive(Clone)]
pub struct RuntimeSender {
    tx: mpsc::Sender<Envelope>,
}

/// Receiving half, consumed by [`Coordinator::serve`](crate::Coordinator::serve).
pub struct RuntimeReceiver {
    rx: mpsc::Receiver<Envelope>,
}

impl RuntimeReceiver {
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

pub fn runtime_channel(buffer: usize) -> (RuntimeSender, RuntimeReceiver) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (RuntimeSender { tx }, RuntimeReceiver { rx })
}

#[async_trait]
impl RuntimeMessenger for RuntimeSender {
    async fn send(&self, message: Message) -> Result<Response, HostError> {
        let (reply, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope { message, reply })
            .await
            .map_err(|_| HostError::Disconnected)?;
        reply_rx.await.map_err(|_| HostError::Disconnected)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markread_core::Status;

    #[tokio::test]
    async fn request_reply_round_trip() {
        let (tx, mut rx) = runtime_channel(4);
        let server = tokio::spawn(async move {
            while let Some(env) = rx.recv().await {
                let status = match env.message {
                    Message::RunPruning => Status::PruningComplete,
                    _ => Status::Ignored,
                };
                env.respond(Ok(Response::new(status)));
            }
        });

        let resp = tx.send(Message::RunPruning).await.unwrap();
        assert_eq!(resp.status, Status::PruningComplete);
        let resp = tx.send(Message::MarkAllLinks).await.unwrap();
        assert!(resp.is_ignored());

        drop(tx);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn closed_receiver_is_disconnected() {
        let (tx, rx) = runtime_channel(1);
        drop(rx);
        let err = tx.send(Message::RunPruning).await.unwrap_err();
        assert!(matches!(err, HostError::Disconnected));
    }

    #[tokio::test]
    async fn dropped_reply_is_disconnected() {
        let (tx, mut rx) = runtime_channel(1);
        tokio::spawn(async move {
            if let Some(env) = rx.recv().await {
                drop(env);
            }
        });
        let err = tx.send(Message::RunPruning).await.unwrap_err();
        assert!(matches!(err, HostError::Disconnected));
    }

    #[tokio::test]
    async fn errors_are_forwarded() {
        let (tx, mut rx) = runtime_channel(1);
        tokio::spawn(async move {
            if let Some(env) = rx.recv().await {
                env.respond(Err(HostError::Host("quota".into())));
            }
        });
        let err = tx.send(Message::SaveUrls { urls: vec![] }).await.unwrap_err();
        assert!(matches!(err, HostError::Host(msg) if msg == "quota"));
    }
}
