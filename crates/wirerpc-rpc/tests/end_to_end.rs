//! Client and server talking over real sockets.

use std::sync::Arc;
use std::thread;

use wirerpc_codec::{BasicCodec, Codec, MessageHeader, MessageType};
use wirerpc_frame::{FrameConfig, FrameFormat, FramedTransport, Transport};
use wirerpc_rpc::{
    start_reply, ClientManager, RequestError, RpcError, Server, ServerConfig, Service,
    SimpleServer,
};
use wirerpc_transport::TcpChannel;

const SERVICE: u8 = 2;
const DOUBLE: u8 = 5;

fn doubling_server() -> Arc<Server> {
    let service = Service::new(SERVICE).with_method(DOUBLE, |sequence, codec| {
        let value = codec.read_int32()?;
        start_reply(codec, SERVICE, DOUBLE, sequence);
        codec.write_int32(value * 2);
        Ok(())
    });
    Arc::new(Server::new().with_service(service).expect("service should register"))
}

fn spawn_server(config: ServerConfig) -> (std::net::SocketAddr, thread::JoinHandle<()>) {
    let listener = TcpChannel::bind("127.0.0.1:0").expect("listener should bind");
    let addr = listener.local_addr();
    let server = doubling_server();

    let handle = thread::spawn(move || {
        let stream = listener.accept().expect("listener should accept");
        let simple = SimpleServer::from_stream(server, stream, config)
            .expect("stream should be framed");
        simple.run().expect("server should end cleanly");
    });
    (addr, handle)
}

#[test]
fn invocation_42_returns_84_over_tcp() {
    let (addr, server) = spawn_server(ServerConfig::default());

    let stream = TcpChannel::connect(addr).expect("client should connect");
    let transport =
        FramedTransport::from_stream(stream, FrameConfig::default()).expect("stream should frame");
    let mut client = ClientManager::new(transport);

    let mut request = client.create_request(false);
    assert_eq!(request.sequence(), 1);
    request.start_invocation(SERVICE, DOUBLE);
    request.codec().write_int32(42);

    client
        .perform_request(&mut request)
        .expect("request should succeed");
    assert_eq!(request.codec().read_int32().expect("result should decode"), 84);

    client.transport().close().expect("close should succeed");
    server.join().expect("server thread should finish");
}

#[test]
fn basic_framing_end_to_end() {
    let config = ServerConfig {
        frame: FrameConfig::with_format(FrameFormat::Basic),
        ..ServerConfig::default()
    };
    let (addr, server) = spawn_server(config.clone());

    let stream = TcpChannel::connect(addr).expect("client should connect");
    let transport = FramedTransport::from_stream(stream, config.frame).expect("stream should frame");
    let mut client = ClientManager::new(transport);

    for value in [-3, 0, 1_000_000] {
        let mut request = client.create_request(false);
        request.start_invocation(SERVICE, DOUBLE);
        request.codec().write_int32(value);
        client
            .perform_request(&mut request)
            .expect("request should succeed");
        assert_eq!(request.codec().read_int32().unwrap(), value * 2);
    }
    assert_eq!(client.sequence(), 3);

    client.transport().close().expect("close should succeed");
    server.join().expect("server thread should finish");
}

#[test]
fn server_keeps_serving_after_unknown_method() {
    let (addr, server) = spawn_server(ServerConfig::default());

    let stream = TcpChannel::connect(addr).expect("client should connect");
    let transport = FramedTransport::from_stream(stream, FrameConfig::default()).unwrap();

    // Unknown method: the server logs it and sends nothing back.
    let mut bogus = BasicCodec::new();
    bogus.start_write_message(&MessageHeader::new(MessageType::Invocation, SERVICE, 99, 1));
    transport.send(bogus.array()).expect("send should succeed");

    let mut client = ClientManager::new(transport);
    client.create_request(false);
    let mut request = client.create_request(false);
    request.start_invocation(SERVICE, DOUBLE);
    request.codec().write_int32(5);
    client.perform_request(&mut request).unwrap();
    assert_eq!(request.codec().read_int32().unwrap(), 10);

    client.transport().close().unwrap();
    server.join().unwrap();
}

#[test]
fn stale_reply_is_rejected_by_sequence() {
    let (addr, server) = spawn_server(ServerConfig::default());

    let stream = TcpChannel::connect(addr).expect("client should connect");
    let transport = FramedTransport::from_stream(stream, FrameConfig::default()).unwrap();
    let mut client = ClientManager::new(transport);

    // A one-way invocation of a two-way method: the server discards the reply.
    let mut oneway = client.create_request(true);
    oneway.start_invocation(SERVICE, DOUBLE);
    oneway.codec().write_int32(1);
    client.perform_request(&mut oneway).unwrap();

    // Answer for sequence 2 arrives while the client waits on sequence 3.
    let mut raw = BasicCodec::new();
    raw.start_write_message(&MessageHeader::new(MessageType::Invocation, SERVICE, DOUBLE, 2));
    raw.write_int32(7);
    client.transport().send(raw.array()).unwrap();
    client.create_request(false);

    let mut request = client.create_request(false);
    assert_eq!(request.sequence(), 3);
    request.start_invocation(SERVICE, DOUBLE);
    request.codec().write_int32(8);

    let err = client.perform_request(&mut request).unwrap_err();
    assert!(matches!(
        err,
        RpcError::Request(RequestError::UnexpectedSequence {
            expected: 3,
            actual: 2
        })
    ));

    // The real answer still follows on the wire.
    let late = client.transport().receive().unwrap();
    let mut late = BasicCodec::from_slice(&late);
    assert_eq!(late.start_read_message().unwrap().sequence, 3);
    assert_eq!(late.read_int32().unwrap(), 16);

    client.transport().close().unwrap();
    server.join().unwrap();
}
