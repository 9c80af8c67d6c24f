use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::CONTENT_TYPE;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Management CLI for the swc-relay message relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080", env = "SWC_RELAY_URL")]
    url: String,

    /// Channel key. Omitted keys are sent as absent.
    #[arg(short, long, env = "SWC_RELAY_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Public,
    Private,
}

impl CategoryArg {
    fn as_str(self) -> &'static str {
        match self {
            CategoryArg::Public => "public",
            CategoryArg::Private => "private",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a channel, or verify the key of an existing one
    Create { channel: String },
    /// Remove a channel and everything queued on it
    Remove { channel: String },
    /// Register a prefix pattern (":name" captures, trailing "*" wildcard)
    CreatePrefix {
        channel: String,
        category: CategoryArg,
        prefix: String,
    },
    /// Remove a prefix and drop its queue
    RemovePrefix {
        channel: String,
        category: CategoryArg,
        prefix: String,
    },
    /// Post a message body to a concrete path
    Post {
        channel: String,
        path: String,
        body: String,
        #[arg(long, default_value = "application/json")]
        content_type: String,
    },
    /// Retrieve the next message for a concrete path
    Get {
        channel: String,
        path: String,
        /// Explicit pattern; overrides the routed prefix
        #[arg(long)]
        prefix: Option<String>,
    },
    /// List queued messages without consuming them
    List {
        channel: String,
        category: CategoryArg,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(key) = &cli.key {
        query.push(("key", key.clone()));
    }

    let request = match cli.command {
        Commands::Create { channel } => client.get(format!("{base}/create/{channel}")),
        Commands::Remove { channel } => client.get(format!("{base}/remove/{channel}")),
        Commands::CreatePrefix {
            channel,
            category,
            prefix,
        } => {
            query.push(("prefix", prefix));
            client.get(format!("{base}/create/{channel}/{}", category.as_str()))
        }
        Commands::RemovePrefix {
            channel,
            category,
            prefix,
        } => {
            query.push(("prefix", prefix));
            client.get(format!("{base}/remove/{channel}/{}", category.as_str()))
        }
        Commands::Post {
            channel,
            path,
            body,
            content_type,
        } => client
            .post(format!("{base}/channel/{channel}/{path}"))
            .header(CONTENT_TYPE, content_type)
            .body(body),
        Commands::Get {
            channel,
            path,
            prefix,
        } => {
            if let Some(prefix) = prefix {
                query.push(("prefix", prefix));
            }
            client.get(format!("{base}/channel/{channel}/{path}"))
        }
        Commands::List { channel, category } => {
            client.get(format!("{base}/list/{channel}/{}", category.as_str()))
        }
    };

    let res = request.query(&query).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        return Ok(());
    }

    for name in ["channel", "prefix", "request-ip", "params"] {
        if let Some(value) = res.headers().get(name) {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
    }

    let body = res.bytes().await?;
    if !body.is_empty() {
        println!();
        println!("{}", String::from_utf8_lossy(&body));
    }
    Ok(())
}
