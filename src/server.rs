use crate::backend::Backend;
use crate::dns_parser::{self, Builder, Header, Packet, ResponseCode};
use log::{debug, error, trace, warn};
use std::collections::VecDeque;
use std::io;
use std::io::ErrorKind::WouldBlock;
use std::net::SocketAddr;
use std::sync::Arc;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::{net::UdpSocket, sync::mpsc};

#[derive(Clone, Debug)]
pub enum Command {
    Shutdown,
}

/// Replies waiting for the socket, the oldest are dropped beyond this
pub const MAX_OUTGOING: usize = 64;

/// Answers one request datagram
///
/// Returns `None` when the datagram is dropped without reply: it is too
/// short for a header or it is itself a response.
pub fn respond(backend: &dyn Backend, buffer: &[u8], strict: bool) -> Option<Vec<u8>> {
    let parsed = if strict {
        dns_parser::decode_strict(buffer)
    } else {
        dns_parser::decode(buffer)
    };
    let request = match parsed {
        Ok(request) => request,
        Err(err) => {
            // anything without a readable header can't be answered
            let header = Header::parse(buffer).ok()?;
            if !header.query {
                debug!("dropping malformed response {:#06x}: {}", header.id, err);
                return None;
            }
            warn!("couldn't parse request {:#06x}: {}", header.id, err);
            return error_response(&header, ResponseCode::FormatError);
        }
    };

    // answering responses lets two servers bounce packets forever
    if !request.header.query {
        debug!("dropping response {:#06x}", request.header.id);
        return None;
    }

    let mut builder = Builder::new_response(&request);
    builder.set_recursion_available(backend.recursion_available());
    answer(backend, &request, &mut builder);

    match builder.build() {
        Ok(response) => Some(response),
        Err(err) => {
            error!("couldn't build response to {:#06x}: {}", request.header.id, err);
            error_response(&request.header, ResponseCode::ServerFailure)
        }
    }
}

fn answer(backend: &dyn Backend, request: &Packet, builder: &mut Builder) {
    for question in &request.questions {
        debug!(
            "received question: {} {} {}",
            question.qclass, question.qtype, question.qname
        );
        if let Err(err) = backend.query(request, question, builder) {
            warn!("no answer for {} {}: {}", question.qtype, question.qname, err);
            builder.set_response_code(ResponseCode::NotImplemented);
        }
    }
}

fn error_response(request: &Header, code: ResponseCode) -> Option<Vec<u8>> {
    match Builder::error_response(request, code).build() {
        Ok(response) => Some(response),
        Err(err) => {
            error!("couldn't build error response: {}", err);
            None
        }
    }
}

/// The receive, answer, send loop of one socket
pub struct ServerTask {
    socket: UdpSocket,
    backend: Arc<dyn Backend>,
    commands: mpsc::UnboundedReceiver<Command>,
    outgoing: VecDeque<(Vec<u8>, SocketAddr)>,
    recv_buf: Vec<u8>,
    strict: bool,
}

impl ServerTask {
    // Will panic if called from outside the context of a runtime
    pub fn new(
        std_socket: std::net::UdpSocket,
        backend: Arc<dyn Backend>,
        commands: mpsc::UnboundedReceiver<Command>,
        recv_buffer_size: usize,
        strict: bool,
    ) -> io::Result<ServerTask> {
        let socket = UdpSocket::from_std(std_socket)?;

        Ok(ServerTask {
            socket,
            backend,
            commands,
            outgoing: VecDeque::new(),
            recv_buf: vec![0u8; recv_buffer_size],
            strict,
        })
    }

    fn recv_packets(&mut self, cx: &mut Context) {
        loop {
            let mut buf = tokio::io::ReadBuf::new(&mut self.recv_buf);
            let addr = match self.socket.poll_recv_from(cx, &mut buf) {
                Poll::Ready(Ok(addr)) => addr,
                Poll::Ready(Err(err)) => {
                    // e.g. a reset from a client port that went away; no read
                    // interest is registered after an error, so poll again
                    warn!("error receiving packet {:?}", err);
                    cx.waker().wake_by_ref();
                    break;
                }
                Poll::Pending => break,
            };
            let len = buf.filled().len();
            self.handle_packet(len, addr);
        }
    }

    fn handle_packet(&mut self, len: usize, addr: SocketAddr) {
        trace!("received packet from {:?}", addr);

        match respond(&*self.backend, &self.recv_buf[..len], self.strict) {
            Some(response) => enqueue(&mut self.outgoing, response, addr),
            None => debug!("no reply to packet from {:?}", addr),
        }
    }
}

fn enqueue(outgoing: &mut VecDeque<(Vec<u8>, SocketAddr)>, response: Vec<u8>, addr: SocketAddr) {
    while outgoing.len() >= MAX_OUTGOING {
        if let Some((_, dropped)) = outgoing.pop_front() {
            warn!("send queue full, dropping reply to {:?}", dropped);
        }
    }
    outgoing.push_back((response, addr));
}

impl Future for ServerTask {
    type Output = ();
    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<()> {
        let pinned = Pin::get_mut(self);
        while let Poll::Ready(cmd) = Pin::new(&mut pinned.commands).poll_recv(cx) {
            match cmd {
                Some(Command::Shutdown) => return Poll::Ready(()),
                None => {
                    warn!("server handle dropped without shutdown");
                    return Poll::Ready(());
                }
            }
        }

        pinned.recv_packets(cx);

        while let Some((response, addr)) = pinned.outgoing.pop_front() {
            trace!("sending packet to {:?}", addr);

            match pinned.socket.poll_send_to(cx, &response, addr) {
                Poll::Ready(Ok(bytes_sent)) if bytes_sent == response.len() => (),
                Poll::Ready(Ok(_)) => warn!("failed to send entire packet"),
                Poll::Ready(Err(ref ioerr)) if ioerr.kind() == WouldBlock => (),
                Poll::Ready(Err(err)) => warn!("error sending packet {:?}", err),
                Poll::Pending => {
                    pinned.outgoing.push_front((response, addr));
                    break;
                }
            }
        }

        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::dns_parser::{Class, Question, RRData, Type};
    use std::net::Ipv4Addr;

    struct Fixed;

    impl Backend for Fixed {
        fn query(
            &self,
            _request: &Packet,
            question: &Question,
            builder: &mut Builder,
        ) -> Result<(), BackendError> {
            if question.qtype != Type::A {
                return Err(BackendError::Unsupported(question.qtype));
            }
            builder.add_answer(
                question.qname.clone(),
                question.qclass,
                600,
                RRData::A(Ipv4Addr::new(8, 8, 8, 8)),
            );
            Ok(())
        }

        fn recursion_available(&self) -> bool {
            true
        }
    }

    fn query(questions: &[(&str, Type)]) -> Vec<u8> {
        let mut builder = Builder::new_query(0x1234, true);
        for &(name, qtype) in questions {
            builder.add_question(name.parse().unwrap(), qtype, Class::IN);
        }
        builder.build().unwrap()
    }

    #[test]
    fn answers_every_question() {
        let request = query(&[("www.ruotian.vip", Type::A), ("ruotian.vip", Type::A)]);
        let response = respond(&Fixed, &request, true).unwrap();
        let response = Packet::parse_strict(&response).unwrap();

        assert_eq!(response.header.id, 0x1234);
        assert!(!response.header.query);
        assert!(response.header.recursion_desired);
        assert!(response.header.recursion_available);
        assert_eq!(response.header.response_code, ResponseCode::NoError);
        assert_eq!(response.questions.len(), 2);
        assert_eq!(response.answers.len(), 2);
        assert_eq!(response.answers[1].name.as_str(), "ruotian.vip");
        assert_eq!(response.answers[1].data.to_string(), "8.8.8.8");
    }

    #[test]
    fn backend_failure_is_not_implemented() {
        let request = query(&[("a.vip", Type::MX), ("b.vip", Type::A)]);
        let response = respond(&Fixed, &request, false).unwrap();
        let response = Packet::parse(&response).unwrap();

        assert_eq!(response.header.response_code, ResponseCode::NotImplemented);
        assert_eq!(response.questions.len(), 2);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].name.as_str(), "b.vip");
    }

    #[test]
    fn responses_are_not_answered() {
        let mut request = query(&[("a.vip", Type::A)]);
        request[2] |= 0x80;
        assert_eq!(respond(&Fixed, &request, false), None);

        // a reply must never trigger another reply
        let reply = respond(&Fixed, &query(&[("a.vip", Type::A)]), false).unwrap();
        assert_eq!(respond(&Fixed, &reply, false), None);

        // malformed, but the header says it is a response
        request.truncate(request.len() - 1);
        assert_eq!(respond(&Fixed, &request, false), None);
    }

    #[test]
    fn send_queue_is_bounded() {
        let mut outgoing = VecDeque::new();
        for port in 0..MAX_OUTGOING as u16 + 10 {
            enqueue(&mut outgoing, vec![0], SocketAddr::from(([127, 0, 0, 1], port)));
        }
        assert_eq!(outgoing.len(), MAX_OUTGOING);
        assert_eq!(outgoing.front().unwrap().1.port(), 10);
        assert_eq!(
            outgoing.back().unwrap().1.port(),
            MAX_OUTGOING as u16 + 9
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn keeps_serving_after_receive_error() {
        use std::time::Duration;

        // a port nobody listens on
        let dead = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);

        // the port unreachable reply leaves an error pending on the socket
        let socket = crate::net::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let server_addr = socket.local_addr().unwrap();
        socket.connect(dead_addr).unwrap();
        socket.send(b"ping").unwrap();
        std::thread::sleep(Duration::from_millis(50));

        let (tx, rx) = mpsc::unbounded_channel();
        let server = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_io()
                .build()
                .unwrap();
            rt.block_on(async move {
                ServerTask::new(socket, Arc::new(Fixed), rx, 512, false)
                    .unwrap()
                    .await
            });
        });

        // the only peer a connected socket hears from
        let client = std::net::UdpSocket::bind(dead_addr).unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        std::thread::sleep(Duration::from_millis(50));
        client
            .send_to(&query(&[("a.vip", Type::A)]), server_addr)
            .unwrap();

        let mut buf = [0u8; 512];
        let (len, _) = client.recv_from(&mut buf).unwrap();
        let response = Packet::parse(&buf[..len]).unwrap();
        assert_eq!(response.answers.len(), 1);

        tx.send(Command::Shutdown).unwrap();
        server.join().unwrap();
    }

    #[test]
    fn malformed_request() {
        let mut request = query(&[("a.vip", Type::A)]);
        request.truncate(request.len() - 1);
        let response = Packet::parse(&respond(&Fixed, &request, false).unwrap()).unwrap();
        assert_eq!(response.header.id, 0x1234);
        assert_eq!(response.header.response_code, ResponseCode::FormatError);

        assert_eq!(respond(&Fixed, &request[..5], false), None);
    }

    #[test]
    fn strict_mode_rejects_trailing_bytes() {
        let mut request = query(&[("a.vip", Type::A)]);
        request.push(0);

        let lenient = Packet::parse(&respond(&Fixed, &request, false).unwrap()).unwrap();
        assert_eq!(lenient.header.response_code, ResponseCode::NoError);

        let strict = Packet::parse(&respond(&Fixed, &request, true).unwrap()).unwrap();
        assert_eq!(strict.header.response_code, ResponseCode::FormatError);
    }
}
