use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use presence_core::{Command, Envelope, NodeIdReply, ServiceError, User, Users};
use presence_fabric::{Channel, TcpTransportListener};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    commands: Vec<Command>,
}

impl State {
    fn apply(&mut self, command: Command) -> Option<Envelope> {
        let reply = match &command {
            Command::AddUser(add) => {
                let user = User::new(add.node_id.clone(), add.display_name.clone());
                match self.users.iter_mut().find(|u| u.node_id == user.node_id) {
                    Some(existing) => *existing = user,
                    None => self.users.push(user),
                }
                None
            }
            Command::UpdateStatus(_) | Command::SendMessage(_) => None,
            Command::GetUsers(_) => Some(Envelope::new(&Users {
                users: self.users.clone(),
            })),
            Command::GetNodeId(get) => Some(
                match self.users.iter().find(|u| u.display_name == get.display_name) {
                    Some(user) => Envelope::new(&NodeIdReply {
                        node_id: user.node_id.clone(),
                    }),
                    None => Envelope::new(&ServiceError {
                        message: format!("no user named {}", get.display_name),
                    }),
                },
            ),
        };
        self.commands.push(command);
        reply.map(|r| r.expect("catalog payloads always encode"))
    }
}

/// In-process stand-in for the presence service.
///
/// Keeps a user table, records every command it decodes, and waits `delay`
/// before each reply.
pub struct MockService {
    pub addr: SocketAddr,
    state: Arc<Mutex<State>>,
}

impl MockService {
    pub async fn spawn() -> Self {
        Self::spawn_with_delay(Duration::ZERO).await
    }

    pub async fn spawn_with_delay(delay: Duration) -> Self {
        let listener = TcpTransportListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State::default()));

        let shared = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((transport, _)) = listener.accept().await {
                let state = Arc::clone(&shared);
                tokio::spawn(async move {
                    let mut channel = Channel::from_transport(transport);
                    while let Ok(envelope) = channel.receive_envelope().await {
                        let reply = match Command::from_envelope(&envelope) {
                            Ok(command) => state.lock().unwrap().apply(command),
                            Err(e) => Some(
                                Envelope::new(&ServiceError {
                                    message: e.to_string(),
                                })
                                .unwrap(),
                            ),
                        };
                        if let Some(reply) = reply {
                            tokio::time::sleep(delay).await;
                            if channel.send_envelope(&reply).await.is_err() {
                                break;
                            }
                        }
                    }
                });
            }
        });

        Self { addr, state }
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.lock().unwrap().commands.clone()
    }
}
