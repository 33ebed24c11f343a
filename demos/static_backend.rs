use minidns::{
    Backend, BackendError, Builder, Packet, Question, RRData, Server, ServerConfig, Type,
};

/// Answers every A question with the same address
struct StaticBackend;

impl Backend for StaticBackend {
    fn query(
        &self,
        _request: &Packet,
        question: &Question,
        builder: &mut Builder,
    ) -> Result<(), BackendError> {
        log::info!("question {} {}", question.qtype, question.qname);
        if question.qtype != Type::A {
            return Err(BackendError::Unsupported(question.qtype));
        }
        let data = RRData::from_text(Type::A, "8.8.8.8")
            .map_err(|err| BackendError::Failed(err.to_string()))?;
        builder.add_answer(question.qname.clone(), question.qclass, 600, data);
        Ok(())
    }

    fn recursion_available(&self) -> bool {
        true
    }
}

pub fn main() {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters("minidns=debug,static_backend=info");
    builder.init();

    let config = ServerConfig {
        listen: "127.0.0.1:5353".parse().unwrap(),
        ..ServerConfig::default()
    };
    let server = Server::spawn(config, StaticBackend).unwrap();
    log::info!("listening on {}", server.local_addr());

    loop {
        ::std::thread::sleep(::std::time::Duration::from_secs(10));
    }
}
