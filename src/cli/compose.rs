use crate::domain::{Container, Project, Service};
use crate::infra::compose_cli::{ComposeCli, Deadline};
use crate::infra::compose_file::DeclarationError;
use crate::infra::config::AppConfig;
use crate::infra::docker_adapter::DockerAdapter;
use crate::services::ComposeService;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Bound for compose lifecycle actions (up/down/pull), which legitimately
/// outlive the discovery timeout.
const LIFECYCLE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Args)]
pub struct ComposeCommand {
    #[command(subcommand)]
    pub command: ComposeAction,
}

#[derive(Subcommand)]
pub enum ComposeAction {
    /// Lista os projetos compose descobertos
    Projects {
        /// Atualiza continuamente no intervalo configurado
        #[arg(long)]
        watch: bool,
    },
    /// Lista os serviços declarados de um projeto
    Services {
        /// Diretório do projeto ou caminho do arquivo compose
        #[arg(long)]
        path: PathBuf,
        /// Nome do projeto, para associar containers e consumo observados
        #[arg(long)]
        project: Option<String>,
    },
    /// Lista os containers pertencentes a um projeto
    Ps {
        /// Nome do projeto
        #[arg(long)]
        project: String,
    },
    /// Sobe o projeto em modo detached
    Up {
        #[arg(long)]
        path: PathBuf,
    },
    /// Derruba o projeto
    Down {
        #[arg(long)]
        path: PathBuf,
    },
    /// Baixa as imagens do projeto
    Pull {
        #[arg(long)]
        path: PathBuf,
    },
    /// Mostra os logs do projeto
    Logs {
        #[arg(long)]
        path: PathBuf,
    },
    /// Mostra a configuração renderizada do projeto
    Config {
        #[arg(long)]
        path: PathBuf,
    },
}

pub fn run(cmd: ComposeCommand, config: &AppConfig) -> Result<()> {
    let runtime = Arc::new(DockerAdapter::new());
    let tool = Arc::new(ComposeCli::new(config.compose_timeout()));
    let service = ComposeService::new(runtime, tool, config.resolved_scan_root());

    let discovery = || Deadline::within(config.compose_timeout());
    let lifecycle = || Deadline::within(LIFECYCLE_TIMEOUT);

    match cmd.command {
        ComposeAction::Projects { watch } => loop {
            let projects = service.list_projects(discovery());
            print_projects(&projects);
            if !watch {
                break;
            }
            thread::sleep(config.refresh_interval());
            println!();
        },
        ComposeAction::Services { path, project } => {
            match service.list_services(&path, discovery()) {
                Ok(mut services) => {
                    if let Some(project) = project {
                        service.annotate_services(&mut services, &project, discovery());
                    }
                    print_services(&services);
                }
                Err(err) => print_declaration_hint(&err),
            }
        }
        ComposeAction::Ps { project } => {
            let containers = service.containers_for_project(&project, discovery());
            print_project_containers(&project, &containers);
        }
        ComposeAction::Up { path } => {
            service.up(&path, lifecycle())?;
            println!("✅ Projeto iniciado");
        }
        ComposeAction::Down { path } => {
            service.down(&path, lifecycle())?;
            println!("✅ Projeto encerrado");
        }
        ComposeAction::Pull { path } => {
            service.pull(&path, lifecycle())?;
            println!("✅ Imagens atualizadas");
        }
        ComposeAction::Logs { path } => {
            print!("{}", service.logs(&path, lifecycle())?);
        }
        ComposeAction::Config { path } => {
            print!("{}", service.config_text(&path, discovery())?);
        }
    }

    Ok(())
}

fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("Nenhum projeto compose encontrado.");
        println!();
        println!("Dicas:");
        println!("- Verifique se a ferramenta compose está instalada ('docker compose version')");
        println!("- Rode o comando a partir de uma árvore com arquivos docker-compose.yml");
        println!("- Ajuste 'scan_root' na configuração para apontar para seus projetos");
        return;
    }

    println!("{:<25} {:<15} CAMINHO", "PROJETO", "STATUS");
    for project in projects {
        println!(
            "{:<25} {:<15} {}",
            truncate(&project.name, 25),
            truncate(&project.status, 15),
            project.path.display()
        );
    }
}

fn print_services(services: &[Service]) {
    if services.is_empty() {
        println!("Nenhum serviço declarado.");
        return;
    }

    println!("{:<20} {:<30} PORTAS", "SERVIÇO", "IMAGEM");
    for service in services {
        println!(
            "{:<20} {:<30} {}",
            truncate(&service.name, 20),
            truncate(service.image.as_deref().unwrap_or("-"), 30),
            if service.ports.is_empty() {
                "-".to_string()
            } else {
                service.ports.join(", ")
            }
        );
        if let Some(containers) = &service.containers {
            println!("  containers: {}", containers.join(", "));
        }
        if let (Some(cpu), Some(memory)) = (service.cpu_percent, service.memory_usage) {
            println!("  consumo: {:.2}% cpu, {} bytes", cpu, memory);
        }
    }
}

fn print_project_containers(project: &str, containers: &[Container]) {
    if containers.is_empty() {
        println!("Nenhum container encontrado para o projeto {project}.");
        println!();
        println!("Dicas:");
        println!("- Verifique se há containers rodando com 'docker ps'");
        println!("- Use 'dockhand compose up --path <dir>' para subir o projeto");
        println!("- Confira se os nomes dos containers seguem o padrão do projeto");
        return;
    }

    println!("{:<12} {:<35} {:<12} STATUS", "ID", "NOME", "ESTADO");
    for container in containers {
        println!(
            "{:<12} {:<35} {:<12} {}",
            container.id,
            truncate(&container.display_name(), 35),
            container.state.to_string(),
            container.status
        );
    }
}

fn print_declaration_hint(err: &DeclarationError) {
    match err {
        DeclarationError::NotFound(path) => {
            println!("Nenhum arquivo compose encontrado em {:?}.", path);
            println!("Procurados: docker-compose.yml, docker-compose.yaml, compose.yml, compose.yaml");
        }
        DeclarationError::EmptyDeclaration(path) => {
            println!("O arquivo compose em {:?} está vazio.", path);
        }
        DeclarationError::ReadFailure { path, source } => {
            println!("Não foi possível ler {:?}: {}", path, source);
        }
        DeclarationError::InvalidFormat => {
            println!("A declaração não tem uma seção 'services' reconhecível.");
        }
    }
}

pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
