use clap::Parser;
use harvest_page::records::{EmailRecord, LinkRecord};
use harvest_page::store::ResultStore;
use harvest_page::{Harvester, export, scan, snapshot, utils};

mod args;
use args::{Args, ExtractTarget, OutputFormat, build_filter};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    ::log::info!("Starting harvest for: {}", args.target);

    let mut store = ResultStore::new();
    store.set_filter(build_filter(&args));

    if args.from_file {
        if let Err(e) = harvest_offline(&args, &mut store) {
            ::log::error!("Offline harvest failed: {}", e);
            std::process::exit(1);
        }
    } else {
        println!("Note: live scanning requires a WebDriver server (e.g. ChromeDriver).");
        println!(
            "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
        );

        if let Err(e) = harvest_live(&args, &mut store).await {
            ::log::error!("Harvest failed: {}", e);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    if let Err(e) = emit_results(&args, &store) {
        ::log::error!("Failed to write output: {}", e);
        std::process::exit(1);
    }
}

/// Scans a local HTML file through the same discovery engines
fn harvest_offline(args: &Args, store: &mut ResultStore) -> Result<(), Box<dyn std::error::Error>> {
    let html = std::fs::read_to_string(&args.target)?;
    let page_url = format!("file:///{}", args.target.trim_start_matches('/'));
    let snapshot = snapshot::from_html(&html, &page_url);

    if wants_links(args) {
        store.set_links(scan::links::discover(&snapshot));
    }
    if wants_emails(args) {
        store.set_emails(scan::emails::EmailScanner::new().discover(&snapshot));
    }
    Ok(())
}

/// Drives a live browser page and runs the requested scans
async fn harvest_live(args: &Args, store: &mut ResultStore) -> harvest_page::Result<()> {
    let mut session = Harvester::new()
        .with_webdriver_url(&args.webdriver_url)
        .connect()
        .await?;

    session.goto(&args.target).await?;

    if wants_links(args) {
        let result = session.extract_links().await?;
        ::log::info!("Link scan complete: {} records", result.counts.total);
    }
    if wants_emails(args) {
        let result = session.extract_emails().await?;
        ::log::info!("Email scan complete: {} records", result.counts.total);
    }

    if let Some(id) = args.highlight {
        session.highlight_link(id).await?;
        println!("Highlighted link {id} on the page");
        // Leave the styling on screen for its full duration before closing.
        tokio::time::sleep(std::time::Duration::from_millis(4000)).await;
    }

    // Carry the session's results over to the caller-owned store.
    if let Some(links) = session.store().links() {
        store.set_links(links.clone());
    }
    if let Some(emails) = session.store().emails() {
        store.set_emails(emails.clone());
    }

    session.close().await
}

fn wants_links(args: &Args) -> bool {
    matches!(args.extract, ExtractTarget::Links | ExtractTarget::All)
}

fn wants_emails(args: &Args) -> bool {
    matches!(args.extract, ExtractTarget::Emails | ExtractTarget::All)
}

/// Renders the filtered views in the requested format and destination
fn emit_results(args: &Args, store: &ResultStore) -> Result<(), Box<dyn std::error::Error>> {
    let mut sections = Vec::new();

    if wants_links(args) {
        let records = store.filtered_links();
        sections.push(match args.output {
            OutputFormat::Text => render_links_text(store, &records),
            OutputFormat::Json => export::links_to_json(&records)?,
            OutputFormat::Csv => export::links_to_csv(&records),
        });
    }
    if wants_emails(args) {
        let records = store.filtered_emails();
        sections.push(match args.output {
            OutputFormat::Text => render_emails_text(&records),
            OutputFormat::Json => export::emails_to_json(&records)?,
            OutputFormat::Csv => export::emails_to_csv(&records),
        });
    }

    let body = sections.join("\n");

    match output_path(args) {
        Some(path) => {
            std::fs::write(&path, body)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn output_path(args: &Args) -> Option<std::path::PathBuf> {
    if let Some(path) = &args.out_file {
        return Some(path.clone());
    }
    if args.save {
        let extension = match args.output {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        };
        let prefix = format!("harvest-{}", utils::sanitize_filename(&args.target));
        return Some(export::export_filename(&prefix, extension).into());
    }
    None
}

fn render_links_text(store: &ResultStore, records: &[&LinkRecord]) -> String {
    let mut out = String::new();
    out.push_str(&store.link_summary());
    out.push('\n');

    for record in records {
        out.push_str(&format!(
            "[{}] {} {} ({}) {}\n",
            record.id,
            if record.is_external { "external" } else { "internal" },
            record.url,
            record.text,
            if record.is_visible { "" } else { "[hidden]" },
        ));
    }
    out
}

fn render_emails_text(records: &[&EmailRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} emails found\n", records.len()));

    for record in records {
        out.push_str(&format!(
            "[{}] {} (from {}) {}\n",
            record.id,
            record.email,
            record.source,
            if record.is_visible { "" } else { "[hidden]" },
        ));
    }
    out
}
