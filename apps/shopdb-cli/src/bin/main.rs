use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopdb_chat::{PageRequest, SearchParams, ShopService};
use shopdb_core::catalog::{normalize_column, CsvDirSource};
use shopdb_core::config::Config;
use shopdb_core::types::RetrievalHit;
use shopdb_responder::get_default_responder;

const USAGE: &str = "Usage: shopdb [--data <dir>] [--json] <command> [args...]

Commands:
  search <query> [--category C] [--min N] [--max N] [--top-k K] [--page P] [--per-page N] [--fields a,b]
  chat [message]            one message, or an interactive session when omitted
  browse <category> [--min N] [--max N] [field=value ...]
  recommend <title> [--top-n N]
  rebuild                   reload the catalog and rebuild the index";

/// Positional arguments plus `--flag value` options; `--json` takes no value.
struct Args {
    cmd: String,
    positional: Vec<String>,
    options: BTreeMap<String, String>,
    json: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut raw = env::args().skip(1);
        let mut positional = Vec::new();
        let mut options = BTreeMap::new();
        let mut json = false;
        while let Some(arg) = raw.next() {
            match arg.strip_prefix("--") {
                Some("json") => json = true,
                Some("help") => {
                    println!("{USAGE}");
                    std::process::exit(0);
                }
                Some(name) => {
                    let value = raw.next().with_context(|| format!("--{name} needs a value"))?;
                    options.insert(name.to_string(), value);
                }
                None => positional.push(arg),
            }
        }
        if positional.is_empty() {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
        let cmd = positional.remove(0);
        Ok(Self { cmd, positional, options, json })
    }

    fn text(&self) -> Option<String> {
        (!self.positional.is_empty()).then(|| self.positional.join(" "))
    }

    fn number<T: std::str::FromStr>(&self, name: &str) -> anyhow::Result<Option<T>>
    where
        T::Err: std::fmt::Display,
    {
        self.options
            .get(name)
            .map(|v| v.replace(',', "").parse::<T>().map_err(|e| anyhow::anyhow!("--{name} '{v}': {e}")))
            .transpose()
    }
}

fn print_hits(hits: &[RetrievalHit], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("No matching products.");
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!("{:>2}. [{:.3}] {}", rank + 1, hit.score, hit.record.summary());
    }
    Ok(())
}

fn chat_once(service: &ShopService, message: &str, json: bool) -> anyhow::Result<()> {
    let reply = service.chat(message);
    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }
    println!("[{}] {}", reply.intent, reply.reply);
    for hit in &reply.results {
        println!("  - {}", hit.record.summary());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = config.settings()?;
    let args = Args::parse()?;

    let data_dir = match args.options.get("data") {
        Some(dir) => shopdb_core::config::expand_path(dir),
        None => settings.catalog_dir(&env::current_dir()?),
    };
    info!(dir = %data_dir.display(), "loading catalog");
    let source = CsvDirSource::new(data_dir.clone());
    let service = ShopService::load(&settings, &source, get_default_responder(&settings.responder))
        .with_context(|| format!("failed to load catalog from {}", data_dir.display()))?;

    match args.cmd.as_str() {
        "search" => {
            let Some(query) = args.text() else { bail!("search needs a query") };
            let params = SearchParams {
                category: args.options.get("category").cloned(),
                min_price: args.number("min")?,
                max_price: args.number("max")?,
                top_k: args.number("top-k")?,
            };
            if let Some(page) = args.number::<usize>("page")? {
                let fields =
                    args.options.get("fields").map(|f| f.split(',').map(|s| s.trim().to_string()).collect::<Vec<_>>());
                let request = PageRequest { page, per_page: args.number("per-page")?, fields };
                println!("{}", serde_json::to_string_pretty(&service.search_page(&query, &params, &request))?);
            } else {
                print_hits(&service.search(&query, &params), args.json)?;
            }
        }
        "chat" => match args.text() {
            Some(message) => chat_once(&service, &message, args.json)?,
            None => {
                let stdin = io::stdin();
                print!("> ");
                io::stdout().flush()?;
                for line in stdin.lock().lines() {
                    let line = line?;
                    let message = line.trim();
                    if matches!(message, "exit" | "quit") {
                        break;
                    }
                    if !message.is_empty() {
                        chat_once(&service, message, args.json)?;
                    }
                    print!("> ");
                    io::stdout().flush()?;
                }
            }
        },
        "browse" => {
            let Some(category) = args.positional.first() else { bail!("browse needs a category") };
            let filters: BTreeMap<String, String> = args.positional[1..]
                .iter()
                .map(|f| {
                    f.split_once('=')
                        .map(|(k, v)| (normalize_column(k), v.to_string()))
                        .with_context(|| format!("filter '{f}' is not field=value"))
                })
                .collect::<anyhow::Result<_>>()?;
            let records = service.browse(category, &filters, args.number("min")?, args.number("max")?)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in &records {
                    println!("{}", record.summary());
                }
                println!("{} record(s)", records.len());
            }
        }
        "recommend" => {
            let Some(title) = args.text() else { bail!("recommend needs a product title") };
            let top_n = args.number("top-n")?.unwrap_or(5);
            print_hits(&service.recommend(&title, top_n), args.json)?;
        }
        "rebuild" => {
            let before = service.snapshot().len();
            let after = service.rebuild(&source)?;
            println!("Rebuilt index from {}: {before} -> {after} documents", source.dir().display());
        }
        other => {
            eprintln!("Unknown command: {other}\n{USAGE}");
            std::process::exit(1);
        }
    }
    Ok(())
}
