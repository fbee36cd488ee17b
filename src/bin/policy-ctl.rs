use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use rpc_config_zookeeper::config::load_settings;
use rpc_config_zookeeper::policy::{Category, ConfigParser, JsonParser, TomlParser, ZeroLimit};
use rpc_config_zookeeper::store::{CoordinationClient, FsStore};
use rpc_config_zookeeper::template::{ConfigParam, ConfigParamConfig, PathTemplate};

#[derive(Parser)]
#[command(name = "policy-ctl")]
#[command(about = "Render, validate and publish RPC policy documents", long_about = None)]
struct Cli {
    /// Settings file supplying prefix and templates.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Toml,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node path for a suite category
    Render {
        #[arg(long)]
        service: String,
        /// Client identity; omit for server-side paths
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        category: Category,
    },
    /// Check that a document parses for a category
    Validate {
        #[arg(long)]
        category: Category,
        #[arg(long, value_enum, default_value = "json")]
        format: Format,
        file: PathBuf,
    },
    /// Validate a document and write it to a file-backed store
    Publish {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        path: String,
        #[arg(long)]
        category: Category,
        #[arg(long, value_enum, default_value = "json")]
        format: Format,
        file: PathBuf,
    },
    /// Print the raw content of a node in a file-backed store
    Show {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (paths, zero) = match &cli.config {
        Some(path) => {
            let settings = load_settings(path)?;
            (settings.paths, settings.limiter.zero)
        }
        None => (ConfigParamConfig::default(), ZeroLimit::default()),
    };

    match cli.command {
        Commands::Render {
            service,
            client,
            category,
        } => {
            let (template, client) = match &client {
                Some(client) => (&paths.client_template, client.as_str()),
                None => (&paths.server_template, ""),
            };
            let template = PathTemplate::parse(template)?;
            let param = ConfigParam::render(client, &service, category, &paths.prefix, &template, None)?;
            println!("{}", param.path());
        }
        Commands::Validate { category, format, file } => {
            let raw = std::fs::read(&file)?;
            let document = parser(format, zero).parse(category, &raw)?;
            println!("{document:#?}");
        }
        Commands::Publish {
            root,
            path,
            category,
            format,
            file,
        } => {
            let raw = std::fs::read(&file)?;
            parser(format, zero).parse(category, &raw)?;
            let store = FsStore::open(&root)?;
            store.put(&path, &raw).await?;
            println!("published {} bytes to {path}", raw.len());
        }
        Commands::Show { root, path } => {
            let store = FsStore::open(&root)?;
            match store.read(&path).await? {
                Some(raw) => println!("{}", String::from_utf8_lossy(&raw)),
                None => {
                    eprintln!("Error: node {path} does not exist");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn parser(format: Format, zero: ZeroLimit) -> Box<dyn ConfigParser> {
    match format {
        Format::Json => Box::new(JsonParser::new(zero)),
        Format::Toml => Box::new(TomlParser::new(zero)),
    }
}
