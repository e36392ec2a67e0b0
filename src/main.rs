use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dockhand::cli::compose::{self, ComposeCommand};
use dockhand::cli::resources::{
    self, ContainerCommand, ImageCommand, NetworkCommand, SystemCommand, VolumeCommand,
};
use dockhand::infra::config::{self, AppConfig};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dockhand",
    about = "Painel de estado do runtime de containers e de projetos compose"
)]
struct Cli {
    /// Diretório de configuração (default: ~/.config/dockhand)
    #[arg(long, env = "DOCKHAND_CONFIG_DIR", default_value_os_t = config::default_config_dir())]
    config_dir: std::path::PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Projetos compose: descoberta, serviços, containers e ciclo de vida
    Compose(ComposeCommand),
    /// Operações sobre containers
    Container(ContainerCommand),
    /// Operações sobre imagens
    Image(ImageCommand),
    /// Operações sobre volumes
    Volume(VolumeCommand),
    /// Operações sobre redes
    Network(NetworkCommand),
    /// Manutenção do runtime (prune)
    System(SystemCommand),
    /// Grava a configuração padrão em disco
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let app_config = AppConfig::load(&cli.config_dir)?;
    init_tracing(&app_config)?;

    match cli.command {
        Commands::Compose(cmd) => compose::run(cmd, &app_config),
        Commands::Container(cmd) => resources::run_container(cmd, &app_config),
        Commands::Image(cmd) => resources::run_image(cmd),
        Commands::Volume(cmd) => resources::run_volume(cmd),
        Commands::Network(cmd) => resources::run_network(cmd),
        Commands::System(cmd) => resources::run_system(cmd),
        Commands::Init => {
            config::install_default_config(&cli.config_dir)?;
            println!("✅ Configuração padrão gravada em {:?}", cli.config_dir);
            Ok(())
        }
    }
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("abrindo arquivo de log {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}
