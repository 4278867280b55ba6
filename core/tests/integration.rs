//! Full provisioning lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP through `UreqTransport`.

use std::net::SocketAddr;

use cobbler_core::{ApiError, CobblerClient, KickstartFile, NetworkConfig, Snippet, System};

fn start_mock_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn endpoint(addr: SocketAddr) -> String {
    format!("http://{addr}{}", mock_server::ENDPOINT)
}

#[test]
fn provisioning_lifecycle() {
    let client = CobblerClient::new(&endpoint(start_mock_server()));

    // Step 1: bad credentials are a fault, not a transport error.
    let err = client.login("cobbler", "wrong").unwrap_err();
    assert!(matches!(err, ApiError::Fault { .. }), "got {err:?}");

    // Step 2: log in.
    let session = client.login("cobbler", "cobbler").unwrap();

    // Step 3: kickstart file and snippet.
    let kickstart = KickstartFile {
        name: "web".to_string(),
        body: "install\nurl --url=http://mirror/centos?arch=x86_64&v=7\n".to_string(),
    };
    assert!(client.create_kickstart_file(&kickstart, &session).unwrap());
    assert_eq!(client.read_kickstart_file("web", &session).unwrap(), kickstart.body);

    let snippet = Snippet {
        name: "post_install_network".to_string(),
        body: "# <network> & friends\n".to_string(),
    };
    assert!(client.create_snippet(&snippet, &session).unwrap());
    assert_eq!(client.read_snippet(&snippet.name, &session).unwrap(), snippet.body);

    // Step 4: create a system through the workflow.
    let system = System {
        name: "web1".to_string(),
        profile: "centos7-x86_64".to_string(),
        hostname: "web1.example.com".to_string(),
        name_servers: "10.0.0.2".to_string(),
        network: Some(NetworkConfig {
            mac: "52:54:00:12:34:56".to_string(),
            ip: "10.0.0.10".to_string(),
            dns_name: "web1.example.com".to_string(),
            netmask: "255.255.255.0".to_string(),
            gateway: "10.0.0.1".to_string(),
        }),
    };
    let id = client.create_system(&system, &session).unwrap();
    assert!(!id.is_empty());

    // Step 5: the handle is consumed by save_system.
    let err = client.set_system_hostname(&id, "other", &session).unwrap_err();
    assert!(matches!(err, ApiError::Fault { .. }));

    // Step 6: sync.
    assert!(client.sync(&session).unwrap());

    // Step 7: remove the system, twice.
    assert!(client.remove_system("web1", &session).unwrap());
    let err = client.remove_system("web1", &session).unwrap_err();
    assert!(matches!(err, ApiError::Fault { .. }));

    // Step 8: delete templates; reading afterwards is a fault.
    assert!(client.delete_kickstart_file("web", &session).unwrap());
    assert!(client.delete_snippet(&snippet.name, &session).unwrap());
    let err = client.read_kickstart_file("web", &session).unwrap_err();
    assert!(matches!(err, ApiError::Fault { .. }));
}

#[test]
fn forged_session_is_rejected() {
    let client = CobblerClient::new(&endpoint(start_mock_server()));
    let forged = cobbler_core::Session::new("not-a-token");
    let err = client.new_system(&forged).unwrap_err();
    assert!(matches!(err, ApiError::Fault { code: 1, .. }));
}

#[test]
fn wrong_path_is_http_error() {
    let addr = start_mock_server();
    let client = CobblerClient::new(&format!("http://{addr}/nope"));
    let err = client.login("cobbler", "cobbler").unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 404, .. }), "got {err:?}");
}

#[test]
fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nobody is listening on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let client = CobblerClient::new(&endpoint(addr));
    let err = client.login("cobbler", "cobbler").unwrap_err();
    match err {
        ApiError::Transport(inner) => assert!(inner.downcast_ref::<ureq::Error>().is_some()),
        other => panic!("expected transport error, got {other:?}"),
    }
}
