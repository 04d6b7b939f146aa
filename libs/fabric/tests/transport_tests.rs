use presence_core::{Envelope, NodeId, User, Users};
use presence_fabric::{
    channel::Channel,
    error::{ConfigError, Error},
    frame,
    transport::{TcpTransport, TcpTransportListener, Transport, TransportListener},
};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Helper to get a free port
async fn get_listener() -> (TcpTransportListener, std::net::SocketAddr) {
    let listener = TcpTransportListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

fn three_users() -> Users {
    Users {
        users: vec![
            User::new(NodeId::new("n3").unwrap(), "Carol"),
            User::new(NodeId::new("n1").unwrap(), "Ada"),
            User::new(NodeId::new("n2").unwrap(), "Grace Hopper 🐛"),
        ],
    }
}

#[tokio::test]
async fn tcp_send_receive_single_message() {
    init_tracing();
    let (listener, addr) = get_listener().await;

    // Spawn server
    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        let received = transport.receive().await.unwrap();
        transport.send(&received).await.unwrap(); // Echo back
    });

    // Client
    let mut client = TcpTransport::connect(addr.to_string()).await.unwrap();
    let msg = b"hello world";
    client.send(msg).await.unwrap();
    let response = client.receive().await.unwrap();

    assert_eq!(response, &msg[..]);
}

#[tokio::test]
async fn tcp_multiple_messages_preserve_boundaries() {
    let (listener, addr) = get_listener().await;

    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        for _ in 0..3 {
            let msg = transport.receive().await.unwrap();
            transport.send(&msg).await.unwrap();
        }
    });

    let mut client = TcpTransport::connect(addr.to_string()).await.unwrap();
    let messages = vec![b"first".to_vec(), b"second".to_vec(), b"".to_vec()];

    for msg in &messages {
        client.send(msg).await.unwrap();
        let response = client.receive().await.unwrap();
        assert_eq!(&response[..], &msg[..]);
    }
}

#[tokio::test]
async fn frame_split_into_single_bytes_decodes_identically() {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let envelope_bytes = Envelope::new(&three_users()).unwrap().to_bytes().unwrap();
    let wire = frame::encode(&envelope_bytes, frame::DEFAULT_MAX_FRAME_SIZE).unwrap();

    // Server trickles the frame out one byte per write
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.set_nodelay(true).unwrap();
        for byte in wire.iter() {
            stream.write_all(&[*byte]).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    });

    let transport = TcpTransport::connect(addr.to_string()).await.unwrap();
    let mut channel = Channel::from_transport(transport);

    let envelope = channel.receive_envelope().await.unwrap();
    assert_eq!(envelope, Envelope::from_bytes(&envelope_bytes).unwrap());
    let users: Users = envelope.open().unwrap();
    assert_eq!(users, three_users());
}

#[tokio::test]
async fn two_frames_in_one_segment_are_both_delivered() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut both = frame::encode(b"alpha", 64).unwrap().to_vec();
        both.extend_from_slice(&frame::encode(b"beta", 64).unwrap());
        stream.write_all(&both).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
    });

    let mut client = TcpTransport::connect(addr.to_string()).await.unwrap();
    assert_eq!(client.receive().await.unwrap(), &b"alpha"[..]);
    assert_eq!(client.receive().await.unwrap(), &b"beta"[..]);
}

#[tokio::test]
async fn tcp_receive_timeout_fires_and_breaks_connection() {
    let (listener, addr) = get_listener().await;

    // Spawn server that never responds
    tokio::spawn(async move {
        let (_transport, _addr) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let mut client = TcpTransport::builder()
        .address(addr.to_string())
        .receive_timeout(Duration::from_millis(100))
        .connect()
        .await
        .unwrap();

    client.send(b"hello").await.unwrap();

    match client.receive().await {
        Err(err @ Error::ReadTimeout(_)) => {
            assert!(err.is_timeout());
            assert!(!err.connection_usable());
        }
        other => panic!("Expected ReadTimeout, got {:?}", other),
    }

    // A late reply would land out of step with the next request.
    assert!(!client.is_usable());
    assert!(matches!(client.send(b"again").await, Err(Error::Broken)));
}

#[tokio::test]
async fn tcp_rejects_oversized_frame() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Server claims a frame far over the client's limit
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_u32(200 * 1024 * 1024).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let mut client = TcpTransport::builder()
        .address(addr.to_string())
        .receive_timeout(Duration::from_secs(5))
        .connect()
        .await
        .unwrap();

    let err = client.receive().await.unwrap_err();
    assert!(matches!(
        err,
        Error::FrameTooLarge { size, max, outbound: false }
            if size == 200 * 1024 * 1024 && max == frame::DEFAULT_MAX_FRAME_SIZE
    ));
    assert!(!err.connection_usable());
    assert!(!client.is_usable());
}

#[tokio::test]
async fn oversized_send_is_refused_without_breaking_connection() {
    let (listener, addr) = get_listener().await;

    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        let msg = transport.receive().await.unwrap();
        transport.send(&msg).await.unwrap();
    });

    let mut client = TcpTransport::builder()
        .address(addr.to_string())
        .max_frame_size(16)
        .connect()
        .await
        .unwrap();

    let err = client.send(&[0u8; 17]).await.unwrap_err();
    assert!(matches!(
        err,
        Error::FrameTooLarge { size: 17, max: 16, outbound: true }
    ));
    assert!(err.connection_usable());
    assert!(client.is_usable());

    client.send(b"small").await.unwrap();
    assert_eq!(client.receive().await.unwrap(), &b"small"[..]);
}

#[tokio::test]
async fn partial_write_timeout_breaks_connection() {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Server accepts and never reads, so the socket buffers fill up
    tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let mut client = TcpTransport::builder()
        .address(addr.to_string())
        .send_timeout(Duration::from_millis(100))
        .max_frame_size(64 * 1024 * 1024)
        .connect()
        .await
        .unwrap();

    let payload = vec![0u8; 40 * 1024 * 1024];
    let err = client.send(&payload).await.unwrap_err();
    match err {
        Error::WriteTimeout { timeout, written } => {
            assert_eq!(timeout, Duration::from_millis(100));
            assert!(written > 0);
            assert!(written < payload.len() + frame::HEADER_LEN);
        }
        ref other => panic!("Expected WriteTimeout, got {:?}", other),
    }
    assert!(err.is_timeout());
    assert!(!err.connection_usable());

    // Half a frame is on the wire; nothing after it can be trusted.
    assert!(!client.is_usable());
    assert!(matches!(client.send(b"again").await, Err(Error::Broken)));
}

#[tokio::test]
async fn builder_rejects_bad_frame_cap_before_dialing() {
    // Nothing listens here; a dial attempt would fail with Connect instead.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let zero = TcpTransport::builder()
        .address(addr.to_string())
        .max_frame_size(0)
        .connect()
        .await;
    assert!(matches!(zero, Err(Error::Config(ConfigError::ZeroFrameSize))));

    let huge = TcpTransport::builder()
        .address(addr.to_string())
        .max_frame_size(frame::MAX_FRAME_SIZE_LIMIT + 1)
        .connect()
        .await;
    match huge {
        Err(err @ Error::Config(ConfigError::FrameSizeTooLarge(_))) => {
            assert!(!err.connection_usable());
        }
        Err(other) => panic!("Expected Config error, got {:?}", other),
        Ok(_) => panic!("connected with an out-of-range frame cap"),
    }
}

#[tokio::test]
async fn peer_closed_error() {
    let (listener, addr) = get_listener().await;

    // Spawn server that immediately closes
    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        transport.close().await.unwrap();
    });

    let mut client = TcpTransport::connect(addr.to_string()).await.unwrap();

    // Give server time to close
    tokio::time::sleep(Duration::from_millis(50)).await;

    match client.receive().await {
        Err(Error::PeerClosed) => {}
        other => panic!("Expected PeerClosed, got {:?}", other),
    }
}

#[tokio::test]
async fn close_is_idempotent_and_final() {
    let (listener, addr) = get_listener().await;

    tokio::spawn(async move {
        let (_transport, _addr) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let mut client = TcpTransport::connect(addr.to_string()).await.unwrap();
    client.close().await.unwrap();
    client.close().await.unwrap();

    assert!(!client.is_usable());
    assert!(matches!(
        client.send(b"late").await,
        Err(Error::ConnectionClosed)
    ));
    assert!(matches!(
        client.receive().await,
        Err(Error::ConnectionClosed)
    ));
}

#[tokio::test]
async fn connect_to_unbound_port_returns_error() {
    // Grab a free port, then release it so nothing is listening there.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    match TcpTransport::connect(addr.to_string()).await {
        Err(Error::Connect { addr: failed, .. }) => assert_eq!(failed, addr.to_string()),
        Err(other) => panic!("Expected Connect error, got {:?}", other),
        Ok(_) => panic!("connected to a port nobody listens on"),
    }
}

#[tokio::test]
async fn connect_to_malformed_address_returns_error() {
    let result = TcpTransport::connect("definitely not an address").await;
    assert!(matches!(result, Err(Error::Connect { .. })));
}

#[tokio::test]
async fn transport_listener_trait_usage() {
    let (mut listener, addr) = get_listener().await;

    async fn accept_generic<L: TransportListener>(listener: &L) -> Result<L::Transport, Error> {
        listener.accept().await
    }

    tokio::spawn(async move {
        let mut client = TcpTransport::connect(addr.to_string()).await.unwrap();
        client.send(b"test").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
    });

    let mut transport = accept_generic(&listener).await.unwrap();
    let msg = transport.receive().await.unwrap();
    assert_eq!(msg, &b"test"[..]);

    TransportListener::close(&mut listener).await.unwrap();
}

#[tokio::test]
async fn channel_envelope_roundtrip() {
    let (listener, addr) = get_listener().await;

    tokio::spawn(async move {
        let (transport, _addr) = listener.accept().await.unwrap();
        let mut channel = Channel::from_transport(transport);

        let envelope = channel.receive_envelope().await.unwrap();
        channel.send_envelope(&envelope).await.unwrap(); // Echo back
    });

    let mut channel = Channel::tcp(addr.to_string()).await.unwrap();
    channel.send(&three_users()).await.unwrap();
    let response: Users = channel.receive().await.unwrap();

    assert_eq!(response, three_users());
    channel.close().await.unwrap();
}

#[tokio::test]
async fn channel_reports_garbage_as_decode_error() {
    let (listener, addr) = get_listener().await;

    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        transport.send(b"{not json").await.unwrap();
        transport
            .send(&Envelope::raw("Users", r#"{"users":[]}"#).to_bytes().unwrap())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let mut channel = Channel::tcp(addr.to_string()).await.unwrap();
    match channel.receive_envelope().await {
        Err(Error::Protocol(presence_core::Error::Decode(_))) => {}
        other => panic!("Expected Decode error, got {:?}", other),
    }

    // Framing is intact, so the next envelope still arrives.
    assert!(channel.is_usable());
    let users: Users = channel.receive().await.unwrap();
    assert!(users.users.is_empty());
}
