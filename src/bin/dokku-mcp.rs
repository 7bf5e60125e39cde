use clap::{Parser, Subcommand, ValueEnum};
use dokku_mcp::config::{DokkuMcpConfig, LogConfig, LogFormat, TransportKind};
use dokku_mcp::lifecycle::LifecycleCoordinator;

#[derive(Parser)]
#[command(name = "dokku-mcp")]
#[command(about = "Model Context Protocol (MCP) server for a Dokku PaaS host")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (YAML)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server
    Serve {
        /// Transport type to use, overriding the config file
        #[arg(short, long)]
        transport: Option<TransportChoice>,

        /// Bind host for the SSE transport, overriding the config file
        #[arg(long)]
        host: Option<String>,

        /// Bind port for the SSE transport, overriding the config file
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the tools the server would advertise against the configured host
    Tools,

    /// Test SSH connectivity and plugin discovery against the configured host
    Test,

    /// Validate a configuration file without starting the server
    ValidateConfig,
}

#[derive(Clone, ValueEnum)]
enum TransportChoice {
    /// Standard input/output (for direct LLM-client integration)
    Stdio,
    /// Server-sent events over HTTP
    Sse,
}

impl From<TransportChoice> for TransportKind {
    fn from(choice: TransportChoice) -> Self {
        match choice {
            TransportChoice::Stdio => TransportKind::Stdio,
            TransportChoice::Sse => TransportKind::Sse,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `validate-config` may be pointed at a broken file; don't let log
    // config loaded from that same file gate whether we can report the
    // error, so it always logs with the default text formatter.
    let log_config = match &cli.command {
        Commands::ValidateConfig => LogConfig::default(),
        _ => load_config(cli.config.as_deref()).await?.log,
    };
    init_tracing(&log_config, cli.verbose);

    match cli.command {
        Commands::Serve { transport, host, port } => {
            serve_command(cli.config.as_deref(), transport, host, port).await
        }
        Commands::Tools => tools_command(cli.config.as_deref()).await,
        Commands::Test => test_command(cli.config.as_deref()).await,
        Commands::ValidateConfig => validate_config_command(cli.config.as_deref()).await,
    }
}

/// `log.format = json` selects `tracing-subscriber`'s JSON formatter;
/// `text` (the default) keeps the human-readable one. `log.level` sets the
/// default `EnvFilter` directive, further overridable by `RUST_LOG`; `-v`
/// forces `debug` regardless of what the config file says.
fn init_tracing(log: &LogConfig, verbose: bool) {
    let default_directive = if verbose { "debug" } else { log.level.as_filter() };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);
    match log.format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}

async fn load_config(config_path: Option<&str>) -> anyhow::Result<DokkuMcpConfig> {
    match config_path {
        Some(path) => Ok(DokkuMcpConfig::from_file(path).await?),
        None => Ok(DokkuMcpConfig::default().with_env_overrides()),
    }
}

async fn serve_command(
    config_path: Option<&str>,
    transport: Option<TransportChoice>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path).await?;
    if let Some(transport) = transport {
        config.transport.kind = transport.into();
    }
    if let Some(host) = host {
        config.transport.host = host;
    }
    if let Some(port) = port {
        config.transport.port = port;
    }

    tracing::info!(transport = ?config.transport.kind, "starting dokku-mcp");

    let mut coordinator = LifecycleCoordinator::bootstrap(config).await?;
    let result = coordinator.run().await;
    coordinator.shutdown().await;
    result.map_err(Into::into)
}

async fn tools_command(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path).await?;
    let coordinator = LifecycleCoordinator::bootstrap(config).await?;

    for tool in coordinator.list_tools().await {
        println!("  {} - {}", tool.name, tool.description);
    }
    Ok(())
}

async fn test_command(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path).await?;
    tracing::info!(host = %config.dokku.host, user = %config.dokku.user, "testing connection to Dokku host");

    let executor = dokku_mcp::ssh::SshExecutor::new(&config.dokku);
    let cancel = tokio_util::sync::CancellationToken::new();
    let plugins = dokku_mcp::discovery::get_enabled_plugins(&executor, &cancel).await;

    if plugins.is_empty() {
        tracing::warn!("no enabled plugins discovered; the host may be unreachable or bare");
    } else {
        tracing::info!(count = plugins.len(), "discovered enabled plugins");
        for plugin in &plugins {
            println!("  {plugin}");
        }
    }
    Ok(())
}

async fn validate_config_command(config_path: Option<&str>) -> anyhow::Result<()> {
    let config_path = config_path.ok_or_else(|| anyhow::anyhow!("a configuration file path is required for validation"))?;

    match DokkuMcpConfig::from_file(config_path).await {
        Ok(config) => {
            println!("Configuration is valid.");
            println!("  Transport: {:?}", config.transport.kind);
            println!("  Dokku host: {}:{}", config.dokku.host, config.dokku.port);
            println!("  Multi-tenant: {}", config.multi_tenant.enabled);
            Ok(())
        }
        Err(e) => {
            tracing::error!("configuration invalid: {e}");
            Err(e.into())
        }
    }
}
