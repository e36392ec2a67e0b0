use crate::cli::compose::truncate;
use crate::domain::Container;
use crate::infra::config::AppConfig;
use crate::infra::docker_adapter::DockerAdapter;
use crate::services::{PruneOptions, ResourceService};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::sync::Arc;
use std::thread;

#[derive(Args)]
pub struct ContainerCommand {
    #[command(subcommand)]
    pub command: ContainerAction,
}

#[derive(Subcommand)]
pub enum ContainerAction {
    /// Lista containers
    List {
        /// Inclui containers parados
        #[arg(long)]
        all: bool,
        /// Atualiza continuamente no intervalo configurado
        #[arg(long)]
        watch: bool,
    },
    /// Inicia um container
    Start { id: String },
    /// Para um container
    Stop { id: String },
    /// Reinicia um container
    Restart { id: String },
    /// Pausa um container
    Pause { id: String },
    /// Retoma um container pausado
    Unpause { id: String },
    /// Mata um container
    Kill { id: String },
    /// Remove um container
    Rm { id: String },
    /// Mostra detalhes de um container
    Inspect { id: String },
    /// Mostra os logs recentes de um container
    Logs { id: String },
    /// Mostra uma amostra de consumo de um container
    Stats { id: String },
}

#[derive(Args)]
pub struct ImageCommand {
    #[command(subcommand)]
    pub command: ImageAction,
}

#[derive(Subcommand)]
pub enum ImageAction {
    /// Lista imagens
    List,
    /// Remove uma imagem
    Rm {
        id: String,
        /// Força a remoção
        #[arg(long)]
        force: bool,
    },
    /// Mostra detalhes de uma imagem
    Inspect { id: String },
}

#[derive(Args)]
pub struct VolumeCommand {
    #[command(subcommand)]
    pub command: VolumeAction,
}

#[derive(Subcommand)]
pub enum VolumeAction {
    /// Lista volumes
    List,
    /// Remove um volume
    Rm {
        name: String,
        /// Força a remoção
        #[arg(long)]
        force: bool,
    },
    /// Mostra detalhes de um volume
    Inspect { name: String },
}

#[derive(Args)]
pub struct NetworkCommand {
    #[command(subcommand)]
    pub command: NetworkAction,
}

#[derive(Subcommand)]
pub enum NetworkAction {
    /// Lista redes
    List,
    /// Remove uma rede
    Rm { id: String },
    /// Mostra detalhes de uma rede
    Inspect { id: String },
}

#[derive(Args)]
pub struct SystemCommand {
    #[command(subcommand)]
    pub command: SystemAction,
}

#[derive(Subcommand)]
pub enum SystemAction {
    /// Limpa recursos não utilizados do runtime
    Prune {
        /// Limpar apenas containers parados
        #[arg(long)]
        containers: bool,
        /// Limpar apenas imagens não utilizadas
        #[arg(long)]
        images: bool,
        /// Limpar apenas volumes órfãos
        #[arg(long)]
        volumes: bool,
        /// Limpar tudo (padrão se nenhuma flag especificada)
        #[arg(long)]
        all: bool,
    },
}

fn service() -> ResourceService {
    ResourceService::new(Arc::new(DockerAdapter::new()))
}

pub fn run_container(cmd: ContainerCommand, config: &AppConfig) -> Result<()> {
    let service = service();

    match cmd.command {
        ContainerAction::List { all, watch } => loop {
            let containers = service.containers(all)?;
            print_containers(&containers);
            if !watch {
                break;
            }
            thread::sleep(config.refresh_interval());
            println!();
        },
        ContainerAction::Start { id } => {
            service.start(&id)?;
            println!("✅ Container {id} iniciado");
        }
        ContainerAction::Stop { id } => {
            service.stop(&id)?;
            println!("✅ Container {id} parado");
        }
        ContainerAction::Restart { id } => {
            service.restart(&id)?;
            println!("✅ Container {id} reiniciado");
        }
        ContainerAction::Pause { id } => {
            service.pause(&id)?;
            println!("✅ Container {id} pausado");
        }
        ContainerAction::Unpause { id } => {
            service.unpause(&id)?;
            println!("✅ Container {id} retomado");
        }
        ContainerAction::Kill { id } => {
            service.kill(&id)?;
            println!("✅ Container {id} encerrado");
        }
        ContainerAction::Rm { id } => {
            service.remove_container(&id)?;
            println!("✅ Container {id} removido");
        }
        ContainerAction::Inspect { id } => print!("{}", service.inspect_container(&id)?),
        ContainerAction::Logs { id } => print!("{}", service.container_logs(&id)?),
        ContainerAction::Stats { id } => {
            let sample = service.container_stats(&id)?;
            println!("cpu: {:.2}%", sample.cpu_percent);
            println!(
                "memória: {} / {} bytes ({:.2}%)",
                sample.memory_usage, sample.memory_limit, sample.memory_percent
            );
            println!("rede: {} rx / {} tx bytes", sample.net_rx, sample.net_tx);
            println!(
                "disco: {} leitura / {} escrita bytes",
                sample.block_read, sample.block_write
            );
            if sample.partial {
                println!("⚠️  amostra parcial: alguns campos não puderam ser lidos");
            }
        }
    }

    Ok(())
}

pub fn run_image(cmd: ImageCommand) -> Result<()> {
    let service = service();

    match cmd.command {
        ImageAction::List => {
            let images = service.images()?;
            if images.is_empty() {
                println!("Nenhuma imagem encontrada.");
                return Ok(());
            }
            println!("{:<12} {:<45} TAMANHO", "ID", "TAGS");
            for image in images {
                println!(
                    "{:<12} {:<45} {}",
                    image.id,
                    truncate(&image.repo_tags.join(", "), 45),
                    image.size
                );
            }
        }
        ImageAction::Rm { id, force } => {
            service.remove_image(&id, force)?;
            println!("✅ Imagem {id} removida");
        }
        ImageAction::Inspect { id } => print!("{}", service.inspect_image(&id)?),
    }

    Ok(())
}

pub fn run_volume(cmd: VolumeCommand) -> Result<()> {
    let service = service();

    match cmd.command {
        VolumeAction::List => {
            let volumes = service.volumes()?;
            if volumes.is_empty() {
                println!("Nenhum volume encontrado.");
                return Ok(());
            }
            println!("{:<30} {:<10} MONTAGEM", "NOME", "DRIVER");
            for volume in volumes {
                println!(
                    "{:<30} {:<10} {}",
                    truncate(&volume.name, 30),
                    volume.driver,
                    volume.mountpoint
                );
            }
        }
        VolumeAction::Rm { name, force } => {
            service.remove_volume(&name, force)?;
            println!("✅ Volume {name} removido");
        }
        VolumeAction::Inspect { name } => print!("{}", service.inspect_volume(&name)?),
    }

    Ok(())
}

pub fn run_network(cmd: NetworkCommand) -> Result<()> {
    let service = service();

    match cmd.command {
        NetworkAction::List => {
            let networks = service.networks()?;
            if networks.is_empty() {
                println!("Nenhuma rede encontrada.");
                return Ok(());
            }
            println!("{:<12} {:<25} {:<10} ESCOPO", "ID", "NOME", "DRIVER");
            for network in networks {
                println!(
                    "{:<12} {:<25} {:<10} {}",
                    network.id,
                    truncate(&network.name, 25),
                    network.driver,
                    network.scope
                );
            }
        }
        NetworkAction::Rm { id } => {
            service.remove_network(&id)?;
            println!("✅ Rede {id} removida");
        }
        NetworkAction::Inspect { id } => print!("{}", service.inspect_network(&id)?),
    }

    Ok(())
}

pub fn run_system(cmd: SystemCommand) -> Result<()> {
    let service = service();

    match cmd.command {
        SystemAction::Prune {
            containers,
            images,
            volumes,
            all,
        } => {
            let mut options = PruneOptions {
                containers,
                images,
                volumes,
            };
            if all || options.is_empty() {
                options = PruneOptions::all();
            }
            service.prune(&options)?;
        }
    }

    Ok(())
}

fn print_containers(containers: &[Container]) {
    if containers.is_empty() {
        println!("Nenhum container encontrado.");
        return;
    }

    println!(
        "{:<12} {:<30} {:<25} {:<12} STATUS",
        "ID", "NOME", "IMAGEM", "ESTADO"
    );
    for container in containers {
        println!(
            "{:<12} {:<30} {:<25} {:<12} {}",
            container.id,
            truncate(&container.name, 30),
            truncate(&container.image, 25),
            container.state.to_string(),
            container.status
        );
    }
}
