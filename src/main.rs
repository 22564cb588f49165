use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use listing_assist::config::SyncConfig;
use listing_assist::conversation::Role;
use listing_assist::document::{FieldKey, Mode};
use listing_assist::error::DocumentError;
use listing_assist::publish::LogPublisher;
use listing_assist::store::{FileStore, KeyValueStore, LibSqlStore, MemoryStore};
use listing_assist::{DocumentSync, SyncDeps, SyncEvent};

const HELP: &str = "\
Commands:
  /set <field> <value>     set a text or choice field (empty value clears)
  /toggle <field> <item>   add or remove an item of a list field
  /next, /prev             move between steps
  /show                    print the document
  /submit                  publish from the last step
  /quit                    exit
Anything else is sent to the assistant.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = SyncConfig::from_env()?;

    let mode_name = std::env::var("LISTING_ASSIST_MODE").unwrap_or_else(|_| "listing".to_string());
    let Some(mode) = Mode::from_wire(&mode_name) else {
        bail!("LISTING_ASSIST_MODE must be `rfp` or `listing`, got `{mode_name}`");
    };

    let store = open_store().await?;

    eprintln!("📝 Listing Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Mode: {}", mode);
    eprintln!("   Type /help for commands.\n");

    let sync = DocumentSync::open(
        mode,
        SyncDeps::new(store, Arc::new(LogPublisher)).with_config(config),
    )
    .await;

    for message in sync.messages().await {
        println!("{}\n", message.text);
    }
    print_step(&sync).await;

    tokio::spawn(print_events(sync.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        if line == "/quit" {
            break;
        }
        if let Err(e) = handle_line(&sync, line).await {
            eprintln!("❌ {e}");
        }
        eprint!("> ");
    }

    sync.shutdown().await;
    Ok(())
}

/// Pick the storage backend from `LISTING_ASSIST_STORE`.
async fn open_store() -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let kind = std::env::var("LISTING_ASSIST_STORE").unwrap_or_else(|_| "libsql".to_string());
    let path = std::env::var("LISTING_ASSIST_DB_PATH").ok().map(PathBuf::from);

    let store: Arc<dyn KeyValueStore> = match kind.as_str() {
        "libsql" => {
            let path = path.unwrap_or_else(|| PathBuf::from("./data/listing-assist.db"));
            let db = LibSqlStore::new_local(&path)
                .await
                .with_context(|| format!("failed to open database at {}", path.display()))?;
            Arc::new(db)
        }
        "file" => Arc::new(FileStore::new(
            path.unwrap_or_else(|| PathBuf::from("./data/drafts")),
        )),
        "memory" => Arc::new(MemoryStore::new()),
        other => bail!("LISTING_ASSIST_STORE must be `libsql`, `file` or `memory`, got `{other}`"),
    };
    Ok(store)
}

async fn handle_line(sync: &DocumentSync, line: &str) -> listing_assist::error::Result<()> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "/help" => eprintln!("{HELP}"),
        "/set" => {
            let (name, value) = rest.split_once(' ').unwrap_or((rest, ""));
            match FieldKey::parse(name.trim())? {
                FieldKey::Scalar(field) => {
                    sync.set_field(field, value.trim()).await?;
                    eprintln!("✅ {} updated", field.as_str());
                }
                FieldKey::Set(field) => {
                    return Err(DocumentError::WrongFieldKind {
                        field: field.as_str().to_string(),
                        expected: "list",
                    }
                    .into());
                }
            }
        }
        "/toggle" => {
            let (name, item) = rest.split_once(' ').unwrap_or((rest, ""));
            match FieldKey::parse(name.trim())? {
                FieldKey::Set(field) => {
                    let member = sync.toggle_set_member(field, item.trim()).await;
                    let verb = if member { "added to" } else { "not in" };
                    eprintln!("✅ {} {} {}", item.trim(), verb, field.as_str());
                }
                FieldKey::Scalar(field) => {
                    return Err(DocumentError::WrongFieldKind {
                        field: field.as_str().to_string(),
                        expected: "text",
                    }
                    .into());
                }
            }
        }
        "/next" => {
            sync.next().await;
            print_step(sync).await;
        }
        "/prev" => {
            sync.prev().await;
            print_step(sync).await;
        }
        "/show" => {
            let document = sync.document().await;
            println!("{}", serde_json::to_string_pretty(&document)?);
            print_step(sync).await;
            let missing = sync.missing_required().await;
            if !missing.is_empty() {
                let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
                eprintln!("   Missing: {}", names.join(", "));
            }
        }
        "/submit" => {
            let receipt = sync.submit().await?;
            eprintln!("🚀 Published {} ({})", receipt.id, receipt.mode);
        }
        _ if command.starts_with('/') => eprintln!("Unknown command. Type /help."),
        _ => {
            sync.submit_utterance(line).await?;
            eprintln!("⏳ thinking...");
        }
    }
    Ok(())
}

async fn print_step(sync: &DocumentSync) {
    let step = sync.step().await;
    let (filled, total) = sync.document().await.section_completion(step.number());
    eprintln!(
        "   Paso {}/4: {} ({}%), {filled}/{total} campos",
        step.number(),
        step.label(),
        sync.progress_percent().await
    );
}

/// Print assistant replies as they arrive.
async fn print_events(mut events: tokio::sync::broadcast::Receiver<SyncEvent>) {
    loop {
        match events.recv().await {
            Ok(SyncEvent::MessageAppended { message }) if message.role == Role::Assistant => {
                println!("\n{}\n", message.text);
                eprint!("> ");
            }
            Ok(SyncEvent::ConversationReset) => {
                eprintln!("   Draft cleared, starting over.");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
