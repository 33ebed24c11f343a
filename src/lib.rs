use log::{error, warn};

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::thread;
use tokio::{runtime::Handle, sync::mpsc};

mod dns_parser;
pub use crate::dns_parser::{
    decode, decode_strict, encode, Builder, Class, Error, Header, Name, Opcode, Packet, Question,
    RRData, ResourceRecord, ResponseCode, Section, Type,
};

mod backend;
pub use crate::backend::{Backend, BackendError, Status};

mod server;
pub use crate::server::respond;
use crate::server::{Command, ServerTask};

mod net;

pub const DEFAULT_PORT: u16 = 53;
/// Largest datagram read from the socket by default
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 4096;

/// Settings of a [`Server`]
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Reject requests with bytes after their last record
    pub strict: bool,
    pub recv_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: SocketAddr::new(Ipv4Addr::LOCALHOST.into(), DEFAULT_PORT),
            strict: false,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

/// A running DNS server
///
/// The server stops when this handle is dropped.
pub struct Server {
    handle: Option<thread::JoinHandle<()>>,
    commands: mpsc::UnboundedSender<Command>,
    backend: Arc<dyn Backend>,
    local_addr: SocketAddr,
}

impl Server {
    /// Spawn a `Server` with the given backend on a new thread
    pub fn spawn<B: Backend + 'static>(config: ServerConfig, backend: B) -> io::Result<Server> {
        let (mut server, task) = Server::prepare(config, Arc::new(backend))?;

        let handle = thread::Builder::new()
            .name("dns-server".to_owned())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_io()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(err) => {
                        error!("couldn't start runtime: {}", err);
                        return;
                    }
                };
                rt.block_on(task);
            })?;

        server.handle = Some(handle);
        Ok(server)
    }

    /// Spawn a `Server` on the default tokio handle
    ///
    /// Will panic if called from outside the context of a runtime
    pub fn with_default_handle<B: Backend + 'static>(
        config: ServerConfig,
        backend: B,
    ) -> io::Result<Server> {
        let (server, task) = Server::prepare(config, Arc::new(backend))?;
        Handle::current().spawn(task);
        Ok(server)
    }

    /// Like [`Server::with_default_handle`] but leaves running the task to
    /// the caller
    pub fn with_task<B: Backend + 'static>(
        config: ServerConfig,
        backend: B,
    ) -> io::Result<(Server, impl Future<Output = ()>)> {
        Server::prepare(config, Arc::new(backend))
    }

    fn prepare(
        config: ServerConfig,
        backend: Arc<dyn Backend>,
    ) -> io::Result<(Server, impl Future<Output = ()>)> {
        let std_socket = net::bind(config.listen)?;
        let local_addr = std_socket.local_addr()?;
        let (tx, rx) = mpsc::unbounded_channel();

        let task_backend = backend.clone();
        let task = async move {
            match ServerTask::new(
                std_socket,
                task_backend,
                rx,
                config.recv_buffer_size,
                config.strict,
            ) {
                Ok(task) => task.await,
                Err(err) => error!("couldn't register socket: {}", err),
            }
        };

        let server = Server {
            handle: None,
            commands: tx,
            backend,
            local_addr,
        };
        Ok((server, task))
    }

    /// The address the server actually listens on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn status(&self) -> Status {
        self.backend.status()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.commands.send(Command::Shutdown).is_err() {
            warn!("server task already stopped");
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("server thread panicked");
            }
        }
    }
}
