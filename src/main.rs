use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

use media_resolver_lib::{clean_file_name, init_logging, LinkResolver, MediaKind, ResolutionResult, ResolverConfig};

#[derive(Parser, Debug)]
#[command(name = "media-resolver", version, about = "Resolve a media URL into a verified direct download link")]
struct Args {
    /// Proxy for every outgoing request (overrides RESOLVER_PROXY)
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Cache file (overrides RESOLVER_CACHE_PATH)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a media URL
    Resolve {
        locator: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Find the top video for a text query
    Search {
        query: Vec<String>,
        /// Resolve the match right away
        #[arg(long)]
        resolve: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Ask for video instead of audio
    #[arg(long)]
    video: bool,
    /// Fetch the file once resolved
    #[arg(long)]
    download: bool,
    /// Where downloads are written (defaults to the user's download dir)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl OutputArgs {
    fn kind(&self) -> MediaKind {
        if self.video {
            MediaKind::Video
        } else {
            MediaKind::Audio
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();

    let mut config = ResolverConfig::from_env();
    if args.proxy.is_some() {
        config = config.with_proxy(args.proxy);
    }
    if let Some(cache) = args.cache {
        config = config.with_cache_path(cache);
    }

    let resolver = match LinkResolver::from_config(config) {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            process::exit(1);
        }
    };

    let ok = match args.command {
        Commands::Resolve { locator, output } => resolve_and_report(&resolver, &locator, &output).await,
        Commands::Search { query, resolve, output } => {
            let query = query.join(" ");
            match resolver.search_top_match(&query).await {
                Some(found) => {
                    println!("{}", found.title);
                    println!("{}", found.url);
                    if let Some(author) = &found.author {
                        println!("by {} {}", author, found.duration.as_deref().unwrap_or(""));
                    }
                    !resolve || resolve_and_report(&resolver, &found.url, &output).await
                }
                None => {
                    error!("No results for '{}'", query);
                    false
                }
            }
        }
    };

    if !ok {
        process::exit(1);
    }
}

async fn resolve_and_report(resolver: &LinkResolver, locator: &str, output: &OutputArgs) -> bool {
    let kind = output.kind();
    let Some(result) = resolver.resolve(locator, kind).await else {
        error!("No backend could resolve {}", locator);
        return false;
    };

    println!("{}", result.title);
    println!("{}", result.download_url);
    println!("via {}", result.source_label);

    if output.download {
        return save(resolver, &result, kind, output.output.clone()).await;
    }
    true
}

async fn save(resolver: &LinkResolver, result: &ResolutionResult, kind: MediaKind, dir: Option<PathBuf>) -> bool {
    let bytes = resolver.fetch(result).await;
    if bytes.is_empty() {
        error!("Download of {} failed", result.download_url);
        return false;
    }

    let dir = dir
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut stem = clean_file_name(&result.title);
    if stem.trim().is_empty() {
        stem = "download".to_string();
    }
    let path = dir.join(format!("{}.{}", stem, kind.extension()));

    match tokio::fs::write(&path, &bytes).await {
        Ok(()) => {
            info!("Saved {} bytes to {}", bytes.len(), path.display());
            true
        }
        Err(e) => {
            error!("Could not write {}: {}", path.display(), e);
            false
        }
    }
}
