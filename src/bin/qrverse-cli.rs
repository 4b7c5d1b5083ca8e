use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use qrverse::auth::build_provider;
use qrverse::client::{search, QrSession, SearchMode};
use qrverse::config::Config;
use qrverse::editor::LinkField;
use qrverse::encoding::ExportFormat;
use qrverse::landing::ResolutionView;
use qrverse::models::{LinkEntry, QrRecord, QrType};
use qrverse::store::{HttpQrStore, QrStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrverse-cli")]
#[command(about = "Create and manage QR codes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List your QR codes
    List {
        /// Only show static or dynamic codes
        #[arg(long = "type")]
        kind: Option<QrType>,
    },
    /// Search your QR codes by name or link URL
    Search {
        query: String,
        #[arg(long = "by", default_value = "name")]
        mode: SearchMode,
    },
    /// Create a QR code that encodes a fixed URL
    CreateStatic { name: String, url: String },
    /// Create a QR code whose links can be changed later
    CreateDynamic {
        name: String,
        /// Link as TITLE=URL, repeatable
        #[arg(long = "link", required = true)]
        links: Vec<String>,
    },
    /// Change the links of a dynamic QR code
    EditLinks {
        id: String,
        /// Append a link as TITLE=URL
        #[arg(long)]
        add: Vec<String>,
        /// Remove the link at this position (1-based)
        #[arg(long)]
        remove: Vec<usize>,
        /// Replace one field as POSITION:FIELD=VALUE, e.g. 2:url=https://b.example
        #[arg(long)]
        update: Vec<String>,
    },
    /// Delete a QR code
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show what a short id currently resolves to
    Resolve { short_id: String },
    /// Save a QR code image to disk
    Download {
        id: String,
        #[arg(long, default_value = "png")]
        format: ExportFormat,
        /// Output path; defaults to "{name}-qr-code.{ext}"
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show the signed-in user
    Whoami,
    /// Forget the current credential
    SignOut,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let credentials = build_provider(&config.auth).await?;
    let store: Arc<dyn QrStore> = Arc::new(HttpQrStore::new(&config.store, Arc::clone(&credentials))?);
    let mut session = QrSession::new(Arc::clone(&store), credentials, config.store.clone());

    match cli.command {
        Commands::List { kind } => {
            session.list_for_user().await?;
            let partition = session.partition();
            let kinds = match kind {
                Some(kind) => vec![kind],
                None => vec![QrType::Dynamic, QrType::Static],
            };
            for kind in kinds {
                let records = partition.get(kind);
                println!("{} QR codes ({}):", capitalize(&kind.to_string()), records.len());
                print_records(records);
                println!();
            }
        }
        Commands::Search { query, mode } => {
            let records = session.list_for_user().await?;
            let found = search(records, &query, mode);
            if found.is_empty() {
                println!("No QR codes match '{}'.", query);
            } else {
                print_records(&found);
            }
        }
        Commands::CreateStatic { name, url } => {
            let record = session.create_static(&name, &url).await?;
            println!("✓ Created static QR code '{}' ({})", record.name, record.id);
            println!("  Encodes: {}", record.original_url.as_deref().unwrap_or_default());
        }
        Commands::CreateDynamic { name, links } => {
            let links = links
                .iter()
                .map(|raw| parse_link(raw))
                .collect::<Result<Vec<_>>>()?;
            let record = session.create_dynamic(&name, &links).await?;
            println!("✓ Created dynamic QR code '{}' ({})", record.name, record.id);
            println!("  Encodes: {}", record.url.as_deref().unwrap_or_default());
        }
        Commands::EditLinks {
            id,
            add,
            remove,
            update,
        } => {
            session.list_for_user().await?;
            let mut editor = session.edit_links(&id)?;

            for raw in &update {
                let (position, field, value) = parse_update(raw)?;
                if !editor.update_entry(position - 1, field, value) {
                    bail!("there is no link at position {}", position);
                }
            }

            let mut remove = remove;
            remove.sort_unstable_by(|a, b| b.cmp(a));
            for position in remove {
                if position == 0 || !editor.remove_entry(position - 1) {
                    bail!("cannot remove link at position {}", position);
                }
            }

            for raw in &add {
                let link = parse_link(raw)?;
                editor.add_entry();
                let last = editor.len() - 1;
                editor.update_entry(last, LinkField::Title, link.title);
                editor.update_entry(last, LinkField::Url, link.url);
            }

            let record = session.save_links(&id, &editor).await?;
            println!("✓ Updated links of '{}'", record.name);
            print_links(record.links());
        }
        Commands::Delete { id, yes } => {
            session.list_for_user().await?;
            let pending = session.request_delete(&id)?;
            if !yes && !confirm(&format!("Delete QR code '{}'?", pending.name()))? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = session.confirm_delete(pending).await?;
            println!("✓ Deleted QR code '{}'", removed.name);
        }
        Commands::Resolve { short_id } => {
            let mut view = ResolutionView::new();
            view.load(store.as_ref(), &short_id).await;
            let page = view.page()?;
            println!("{}", page.name);
            print_links(&page.links);
        }
        Commands::Download { id, format, out } => {
            session.list_for_user().await?;
            let (file_name, bytes) = session.export_image(&id, format)?;
            let path = out.unwrap_or_else(|| PathBuf::from(file_name));
            tokio::fs::write(&path, bytes)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("✓ Saved {}", path.display());
        }
        Commands::Whoami => {
            let user = session.current_user().await?;
            println!("{} ({})", user.display_name, user.id);
        }
        Commands::SignOut => {
            session.sign_out().await?;
            println!("✓ Signed out");
        }
    }

    Ok(())
}

fn print_records(records: &[&QrRecord]) {
    if records.is_empty() {
        println!("  (none)");
        return;
    }
    println!("{:<26} {:<24} {:<8} {:>6}  {}", "ID", "Name", "Type", "Scans", "Created");
    println!("{}", "-".repeat(80));
    for record in records {
        println!(
            "{:<26} {:<24} {:<8} {:>6}  {}",
            record.id,
            record.name,
            record.kind,
            record.scans,
            record.created_at.format("%Y-%m-%d")
        );
    }
}

fn print_links(links: &[LinkEntry]) {
    for (i, link) in links.iter().enumerate() {
        println!("  {}. {} -> {}", i + 1, link.title, link.url);
    }
}

/// `TITLE=URL`
fn parse_link(raw: &str) -> Result<LinkEntry> {
    let (title, url) = raw
        .split_once('=')
        .with_context(|| format!("link '{raw}' must look like TITLE=URL"))?;
    Ok(LinkEntry::new(title, url))
}

/// `POSITION:FIELD=VALUE`
fn parse_update(raw: &str) -> Result<(usize, LinkField, String)> {
    let (position, rest) = raw
        .split_once(':')
        .with_context(|| format!("update '{raw}' must look like POSITION:FIELD=VALUE"))?;
    let (field, value) = rest
        .split_once('=')
        .with_context(|| format!("update '{raw}' must look like POSITION:FIELD=VALUE"))?;

    let position: usize = position
        .parse()
        .with_context(|| format!("invalid link position '{position}'"))?;
    if position == 0 {
        bail!("link positions start at 1");
    }
    let field = field.parse::<LinkField>().map_err(anyhow::Error::msg)?;
    Ok((position, field, value.to_string()))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
