//! Single-shot stub resolution over UDP.
//!
//! One query, one datagram out, one datagram back. Retries, TCP fallback
//! for truncated responses and referral following are left to the caller.

use std::io::Cursor;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::{DnsError, Message, Name, Networkable, Question, RecordType};

pub const DEFAULT_SERVER: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
// Largest response without EDNS
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 512;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("failed to open socket to server: {0}")]
    DialFailed(#[source] std::io::Error),

    #[error("failed to send query: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("failed to receive response: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("no response within {0:?}")]
    TimedOut(Duration),

    #[error("query cancelled")]
    Cancelled,

    #[error("response id {received:#06x} does not match query id {expected:#06x}")]
    TransactionIdMismatch { expected: u16, received: u16 },

    #[error("failed to encode query: {0}")]
    Encode(#[source] DnsError),

    #[error("malformed response: {0}")]
    Decode(#[from] DnsError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub server: SocketAddr,
    pub timeout: Duration,
    pub recv_buffer_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER,
            timeout: DEFAULT_TIMEOUT,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

impl ResolverConfig {
    pub fn with_server(mut self, server: SocketAddr) -> Self {
        self.server = server;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }
}

/// Source of transaction ids for outgoing queries.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> u16;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> u16 {
        rand::random()
    }
}

#[derive(Debug, Clone)]
pub struct Resolver<G = RandomIds> {
    config: ResolverConfig,
    ids: G,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_id_generator(config, RandomIds)
    }
}

impl<G: IdGenerator> Resolver<G> {
    pub fn with_id_generator(config: ResolverConfig, ids: G) -> Self {
        Self { config, ids }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub async fn query(&self, name: Name, record_type: RecordType) -> Result<Message, ResolveError> {
        self.query_with_cancellation(name, record_type, &CancellationToken::new())
            .await
    }

    /// Sends one query and waits for the matching response.
    ///
    /// The socket lives only for this call and is released on every path,
    /// including timeout and cancellation.
    #[instrument(level = "debug", skip(self, cancel), fields(server = %self.config.server))]
    pub async fn query_with_cancellation(
        &self,
        name: Name,
        record_type: RecordType,
        cancel: &CancellationToken,
    ) -> Result<Message, ResolveError> {
        let id = self.ids.next_id();
        let request = Message::query(id, Question::new(name, record_type))
            .to_bytes()
            .map_err(ResolveError::Encode)?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(id, "query cancelled");
                return Err(ResolveError::Cancelled);
            }
            response = self.exchange(&request) => response?,
        };

        let message = Message::from_bytes(&mut Cursor::new(&response[..]))?;

        if message.header.id != id {
            warn!(
                expected = id,
                received = message.header.id,
                "discarding response with mismatched id"
            );
            return Err(ResolveError::TransactionIdMismatch {
                expected: id,
                received: message.header.id,
            });
        }

        if message.header.flags.tc() {
            warn!(id, "response truncated, returning partial answer");
        }

        debug!(id, answers = message.answers.len(), "response received");

        Ok(message)
    }

    async fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, ResolveError> {
        let server = self.config.server;
        let bind_addr = if server.is_ipv4() {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(ResolveError::DialFailed)?;
        socket
            .connect(server)
            .await
            .map_err(ResolveError::DialFailed)?;

        let sent = socket
            .send(request)
            .await
            .map_err(ResolveError::WriteFailed)?;
        debug!(bytes_sent = sent, "query sent");

        let mut buf = vec![0u8; self.config.recv_buffer_size];
        let len = tokio::time::timeout(self.config.timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| ResolveError::TimedOut(self.config.timeout))?
            .map_err(ResolveError::ReadFailed)?;

        buf.truncate(len);

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Header, ResourceRecord};

    struct FixedId(u16);

    impl IdGenerator for FixedId {
        fn next_id(&self) -> u16 {
            self.0
        }
    }

    /// Binds a loopback server that answers one query with whatever `reply`
    /// builds, or stays silent when it returns `None`.
    async fn fake_server<F>(reply: F) -> SocketAddr
    where
        F: FnOnce(Message) -> Option<Vec<u8>> + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            let query = Message::from_bytes(&mut Cursor::new(&buf[..len])).unwrap();

            match reply(query) {
                Some(response) => {
                    socket.send_to(&response, peer).await.unwrap();
                }
                None => tokio::time::sleep(Duration::from_secs(10)).await,
            }
        });

        addr
    }

    fn answer(query: Message, id: u16) -> Vec<u8> {
        let mut header = Header::new(id, query.header.flags);
        header.flags.set_qr(true);
        header.flags.set_ra(true);

        let mut response = Message::new(header);
        let question = query.questions[0].clone();
        response.add_answer(ResourceRecord::new(
            question.name.clone(),
            question.qtype,
            300,
            vec![192u8, 0, 2, 7],
        ))
        .unwrap();
        response.add_question(question).unwrap();

        response.to_bytes().unwrap().to_vec()
    }

    fn resolver(server: SocketAddr, timeout: Duration) -> Resolver<FixedId> {
        let config = ResolverConfig::default()
            .with_server(server)
            .with_timeout(timeout);
        Resolver::with_id_generator(config, FixedId(0x1314))
    }

    fn name() -> Name {
        Name::new("www.example.com").unwrap()
    }

    #[test]
    fn default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.server, "8.8.8.8:53".parse().unwrap());
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.recv_buffer_size, 512);
    }

    #[test]
    fn random_ids_vary() {
        let ids = RandomIds;
        let distinct: std::collections::HashSet<u16> = (0..64).map(|_| ids.next_id()).collect();
        assert!(distinct.len() > 1);
    }

    #[tokio::test]
    async fn returns_matching_response() {
        let server = fake_server(|query| {
            assert_eq!(query.header.id, 0x1314);
            assert!(query.header.flags.rd());
            let id = query.header.id;
            Some(answer(query, id))
        })
        .await;

        let message = resolver(server, DEFAULT_TIMEOUT)
            .query(name(), RecordType::A)
            .await
            .unwrap();

        assert_eq!(message.header.id, 0x1314);
        assert!(message.header.flags.qr());
        assert_eq!(message.questions[0].name, name());
        assert_eq!(
            message.answers[0].ipv4(),
            Some(Ipv4Addr::new(192, 0, 2, 7))
        );
    }

    #[tokio::test]
    async fn rejects_mismatched_transaction_id() {
        let server = fake_server(|query| Some(answer(query, 0x4242))).await;

        let result = resolver(server, DEFAULT_TIMEOUT)
            .query(name(), RecordType::A)
            .await;

        assert!(matches!(
            result,
            Err(ResolveError::TransactionIdMismatch {
                expected: 0x1314,
                received: 0x4242
            })
        ));
    }

    #[tokio::test]
    async fn returns_truncated_response_as_is() {
        let server = fake_server(|query| {
            let mut flags = query.header.flags;
            flags.set_qr(true);
            flags.set_tc(true);
            let mut response = Message::new(Header::new(query.header.id, flags));
            response.add_question(query.questions[0].clone()).unwrap();
            Some(response.to_bytes().unwrap().to_vec())
        })
        .await;

        let message = resolver(server, DEFAULT_TIMEOUT)
            .query(name(), RecordType::A)
            .await
            .unwrap();

        assert!(message.header.flags.tc());
        assert!(message.answers.is_empty());
    }

    #[tokio::test]
    async fn malformed_response_fails_to_decode() {
        let server = fake_server(|_| Some(vec![0x13, 0x14, 0x81])).await;

        let result = resolver(server, DEFAULT_TIMEOUT)
            .query(name(), RecordType::A)
            .await;

        assert!(matches!(
            result,
            Err(ResolveError::Decode(DnsError::TruncatedMessage))
        ));
    }

    #[tokio::test]
    async fn times_out_without_response() {
        let server = fake_server(|_| None).await;
        let timeout = Duration::from_millis(50);

        let result = resolver(server, timeout).query(name(), RecordType::A).await;

        assert!(matches!(result, Err(ResolveError::TimedOut(t)) if t == timeout));
    }

    #[tokio::test]
    async fn cancellation_aborts_pending_receive() {
        let server = fake_server(|_| None).await;
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = resolver(server, DEFAULT_TIMEOUT)
            .query_with_cancellation(name(), RecordType::A, &cancel)
            .await;

        assert!(matches!(result, Err(ResolveError::Cancelled)));
    }

    #[tokio::test]
    async fn unencodable_name_is_an_encode_error() {
        let name = Name {
            labels: vec![bytes::Bytes::from(vec![b'a'; 64])],
        };

        let result = resolver(DEFAULT_SERVER, DEFAULT_TIMEOUT)
            .query(name, RecordType::A)
            .await;

        assert!(matches!(
            result,
            Err(ResolveError::Encode(DnsError::LabelTooLong(64)))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_fails_to_dial() {
        // connecting a UDP socket to the broadcast address without
        // SO_BROADCAST is refused
        let server: SocketAddr = "255.255.255.255:53".parse().unwrap();

        let result = resolver(server, DEFAULT_TIMEOUT)
            .query(name(), RecordType::A)
            .await;

        assert!(matches!(result, Err(ResolveError::DialFailed(_))));
    }

    #[tokio::test]
    async fn oversized_datagram_fails_to_send() {
        let server = fake_server(|_| None).await;
        let request = vec![0u8; 70_000];

        let result = resolver(server, DEFAULT_TIMEOUT).exchange(&request).await;

        assert!(matches!(result, Err(ResolveError::WriteFailed(_))));
    }
}
