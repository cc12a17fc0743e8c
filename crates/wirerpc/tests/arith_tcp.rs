//! The `arith` service behind a TCP listener, several clients at once.

use std::sync::Arc;
use std::thread;

use wirerpc::demo::{arith_server, ArithClient};
use wirerpc::frame::{FrameConfig, FrameFormat, FramedTransport, Transport};
use wirerpc::rpc::{ServerConfig, SimpleServer};
use wirerpc::transport::TcpChannel;

fn spawn_listener(connections: usize, format: FrameFormat) -> (String, thread::JoinHandle<()>) {
    let listener = TcpChannel::bind("127.0.0.1:0").expect("listener should bind");
    let addr = listener.local_addr().to_string();
    let server = Arc::new(arith_server().expect("arith should register"));
    let config = ServerConfig {
        frame: FrameConfig::with_format(format),
        ..ServerConfig::default()
    };

    let handle = thread::spawn(move || {
        let workers: Vec<_> = (0..connections)
            .map(|_| {
                let stream = listener.accept().expect("listener should accept");
                let simple = SimpleServer::from_stream(Arc::clone(&server), stream, config.clone())
                    .expect("stream should be framed");
                thread::spawn(move || simple.run().expect("connection should end cleanly"))
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker should join");
        }
    });
    (addr, handle)
}

fn client(addr: &str, format: FrameFormat) -> ArithClient<FramedTransport<wirerpc::transport::RpcStream>> {
    let stream = TcpChannel::connect(addr).expect("client should connect");
    let transport = FramedTransport::from_stream(stream, FrameConfig::with_format(format))
        .expect("stream should frame");
    ArithClient::new(transport)
}

#[test]
fn double_42_is_84() {
    let (addr, server) = spawn_listener(1, FrameFormat::Guarded);

    let mut arith = client(&addr, FrameFormat::Guarded);
    assert_eq!(arith.double(42).expect("double should succeed"), 84);

    arith.manager().transport().close().expect("close should succeed");
    server.join().expect("server should finish");
}

#[test]
fn concurrent_clients_keep_their_own_sequences() {
    const CLIENTS: usize = 4;
    const CALLS: i32 = 25;

    let (addr, server) = spawn_listener(CLIENTS, FrameFormat::Basic);

    let callers: Vec<_> = (0..CLIENTS)
        .map(|n| {
            let addr = addr.clone();
            thread::spawn(move || {
                let mut arith = client(&addr, FrameFormat::Basic);
                let base = i32::try_from(n).expect("client index fits") * 1000;
                for i in 0..CALLS {
                    assert_eq!(arith.double(base + i).expect("double should succeed"), (base + i) * 2);
                }
                let tag = format!("client-{n}");
                assert_eq!(arith.echo(&tag).expect("echo should succeed"), tag);
                assert_eq!(arith.manager().sequence(), u32::try_from(CALLS).unwrap() + 1);
                arith.manager().transport().close().expect("close should succeed");
            })
        })
        .collect();

    for caller in callers {
        caller.join().expect("caller should finish");
    }
    server.join().expect("server should finish");
}

#[test]
fn oneway_log_between_calls_does_not_shift_replies() {
    let (addr, server) = spawn_listener(1, FrameFormat::Guarded);

    let mut arith = client(&addr, FrameFormat::Guarded);
    assert_eq!(arith.double(1).expect("double should succeed"), 2);
    arith.log("between calls").expect("log should send");
    arith.log("and again").expect("log should send");
    assert_eq!(arith.echo("after").expect("echo should succeed"), "after");
    assert_eq!(arith.manager().sequence(), 4);

    arith.manager().transport().close().expect("close should succeed");
    server.join().expect("server should finish");
}
