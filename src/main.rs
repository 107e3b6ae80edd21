use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatapp::config::SessionConfig;
use chatapp::identity::{IdentityStore, JsonIdentityStore};
use chatapp::session::Session;
use chatapp::state::Roster;
use chatapp::types::{MessageKind, User};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatapp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let identity_path =
        std::env::var("CHAT_IDENTITY_FILE").unwrap_or_else(|_| "chat_user.json".to_string());
    let store = JsonIdentityStore::new(identity_path);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let local_user = match store.load() {
        Some(user) => {
            tracing::info!("welcome back, {}", user.username);
            user
        }
        None => {
            let Some(username) = prompt_username(&mut lines).await else {
                eprintln!("No username given, exiting.");
                return;
            };
            let user = User::new(ulid::Ulid::new().to_string(), username, true);
            if let Err(e) = store.save(&user) {
                tracing::warn!("could not persist identity: {e}");
            }
            user
        }
    };

    let config = SessionConfig::from_env();
    let session = Session::start(local_user, Roster::default_peers(), config)
        .await
        .unwrap();

    for msg in session.messages().await {
        print_message(&msg);
    }
    session
        .hub()
        .subscribe(Box::new(|msg| print_message(msg)))
        .await;

    println!("Type a message and press enter (/quit to log out).");

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let text = line.trim();
                    if text == "/quit" {
                        if let Err(e) = store.clear() {
                            tracing::warn!("could not remove saved identity: {e}");
                        }
                        break;
                    }
                    if text.is_empty() {
                        continue;
                    }
                    if let Err(e) = session.send_local_message(text).await {
                        tracing::error!("message not sent: {e}");
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("failed to read stdin: {e}");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.stop().await;
    println!("Bye!");
}

fn print_message(msg: &chatapp::types::Message) {
    match msg.kind {
        MessageKind::System => println!("*** {}", msg.content),
        MessageKind::Text => println!(
            "[{}] {}: {}",
            msg.timestamp.format("%H:%M"),
            msg.sender_name,
            msg.content
        ),
    }
}

async fn prompt_username(lines: &mut Lines<BufReader<Stdin>>) -> Option<String> {
    loop {
        println!("Pick a username:");
        match lines.next_line().await {
            Ok(Some(line)) => {
                let name = line.trim();
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
            Ok(None) => return None,
            Err(e) => {
                tracing::error!("failed to read stdin: {e}");
                return None;
            }
        }
    }
}
