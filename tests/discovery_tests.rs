use dockhand::infra::compose_cli::Deadline;
use dockhand::infra::compose_file::DeclarationError;
use dockhand::services::ComposeService;
use dockhand::test_support::{MockComposeTool, MockRuntime};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn engine(scan_root: PathBuf) -> (ComposeService, Arc<MockRuntime>, Arc<MockComposeTool>) {
    let runtime = Arc::new(MockRuntime::new());
    let tool = Arc::new(MockComposeTool::new());
    let service = ComposeService::new(runtime.clone(), tool.clone(), scan_root);
    (service, runtime, tool)
}

fn deadline() -> Deadline {
    Deadline::within(std::time::Duration::from_secs(5))
}

#[test]
fn test_empty_world_yields_empty_inventory_without_error() {
    // No declaration files, no compose tool: a valid terminal state.
    let temp = TempDir::new().unwrap();
    let (service, _runtime, _tool) = engine(temp.path().to_path_buf());

    let projects = service.list_projects(deadline());
    assert!(projects.is_empty());
}

#[test]
fn test_projects_from_tool_listing() {
    let temp = TempDir::new().unwrap();
    let (service, _runtime, tool) = engine(temp.path().to_path_buf());

    tool.set_success(
        &["ls", "--format", "json"],
        r#"[{"Name":"shop","Status":"running(2)","ConfigFiles":"/srv/shop/docker-compose.yml","Path":"/srv/shop"}]"#,
    );

    let projects = service.list_projects(deadline());
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "shop");
    assert_eq!(projects[0].path, PathBuf::from("/srv/shop"));
    assert_eq!(projects[0].status, "running(2)");
}

#[test]
fn test_missing_path_resolved_via_config_lookup() {
    let temp = TempDir::new().unwrap();
    let (service, _runtime, tool) = engine(temp.path().to_path_buf());

    tool.set_success(&["ls", "--format", "json"], r#"[{"Name":"shop"}]"#);
    tool.set_success(
        &["--project-name", "shop", "config", "--format", "json"],
        r#"{"name":"shop","working_dir":"/srv/shop"}"#,
    );

    let projects = service.list_projects(deadline());
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].path, PathBuf::from("/srv/shop"));
}

#[test]
fn test_missing_path_resolved_via_verbose_listing() {
    let temp = TempDir::new().unwrap();
    let (service, _runtime, tool) = engine(temp.path().to_path_buf());

    tool.set_success(&["ls", "--format", "json"], r#"[{"Name":"shop"}]"#);
    // Per-project config lookup stays unscripted (tool failure); the verbose
    // listing carries the path in the third column.
    tool.set_success(
        &["ls", "-a"],
        "NAME   STATUS      CONFIG FILES\nshop   running(2)  /srv/shop\n",
    );

    let projects = service.list_projects(deadline());
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].path, PathBuf::from("/srv/shop"));
}

#[test]
fn test_missing_path_falls_back_to_current_directory() {
    let temp = TempDir::new().unwrap();
    let (service, _runtime, tool) = engine(temp.path().to_path_buf());

    tool.set_success(&["ls", "--format", "json"], r#"[{"Name":"shop"}]"#);

    let projects = service.list_projects(deadline());
    assert_eq!(projects.len(), 1);
    // Unverified fallback, but never an empty path.
    assert_eq!(projects[0].path, PathBuf::from("."));
}

#[test]
fn test_filesystem_scan_finds_declarations() {
    let temp = TempDir::new().unwrap();
    let project_dir = temp.path().join("storefront");
    fs::create_dir(&project_dir).unwrap();
    fs::write(
        project_dir.join("docker-compose.yml"),
        "services:\n  web:\n    image: nginx:latest\n",
    )
    .unwrap();

    // Hidden directories are not scanned.
    let hidden = temp.path().join(".cache");
    fs::create_dir(&hidden).unwrap();
    fs::write(hidden.join("compose.yml"), "services:\n  x:\n").unwrap();

    let (service, _runtime, _tool) = engine(temp.path().to_path_buf());
    let projects = service.list_projects(deadline());

    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "storefront");
    assert_eq!(projects[0].path, project_dir);
    assert_eq!(projects[0].status, "unknown");
}

#[test]
fn test_scan_prefers_declared_name_over_directory() {
    let temp = TempDir::new().unwrap();
    let project_dir = temp.path().join("some-dir");
    fs::create_dir(&project_dir).unwrap();
    fs::write(
        project_dir.join("compose.yaml"),
        "name: storefront\nservices:\n  web:\n    image: nginx:latest\n",
    )
    .unwrap();

    let (service, _runtime, _tool) = engine(temp.path().to_path_buf());
    let projects = service.list_projects(deadline());

    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "storefront");
}

#[test]
fn test_tool_and_scan_results_are_merged_without_duplicates() {
    let temp = TempDir::new().unwrap();
    let project_dir = temp.path().join("blog");
    fs::create_dir(&project_dir).unwrap();
    fs::write(project_dir.join("compose.yml"), "services:\n  app:\n").unwrap();

    let (service, _runtime, tool) = engine(temp.path().to_path_buf());
    tool.set_success(
        &["ls", "--format", "json"],
        r#"[{"Name":"shop","Path":"/srv/shop","Status":"running(1)"},{"Name":"blog","Path":"/ignored","Status":"exited(1)"}]"#,
    );

    let projects = service.list_projects(deadline());

    // "blog" is already known to the tool; the scanned candidate is not
    // re-added under a second path.
    assert_eq!(projects.len(), 2);
    let blog = projects.iter().find(|p| p.name == "blog").unwrap();
    assert_eq!(blog.path, PathBuf::from("/ignored"));
}

#[test]
fn test_listing_tolerates_tool_failure() {
    let temp = TempDir::new().unwrap();
    let project_dir = temp.path().join("local");
    fs::create_dir(&project_dir).unwrap();
    fs::write(project_dir.join("docker-compose.yaml"), "services:\n  a:\n").unwrap();

    let (service, _runtime, tool) = engine(temp.path().to_path_buf());
    tool.set_response(
        &["ls", "--format", "json"],
        dockhand::ToolOutcome::ToolFailure {
            output: b"unknown flag".to_vec(),
            code: Some(125),
        },
    );

    let projects = service.list_projects(deadline());
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "local");
}

#[test]
fn test_parser_returns_declared_services() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("docker-compose.yml"),
        r#"services:
  web:
    image: nginx:latest
    ports:
      - "8080:80"
  db:
    image: postgres:14
"#,
    )
    .unwrap();

    let (service, _runtime, _tool) = engine(temp.path().to_path_buf());
    let services = service.list_services(temp.path(), deadline()).unwrap();

    assert_eq!(services.len(), 2);
    assert_eq!(services[0].name, "web");
    assert_eq!(services[0].image.as_deref(), Some("nginx:latest"));
    assert_eq!(services[0].ports, vec!["8080:80"]);
    assert_eq!(services[1].name, "db");
    assert_eq!(services[1].image.as_deref(), Some("postgres:14"));
    assert!(services[1].ports.is_empty());
}

#[test]
fn test_services_fall_back_to_tool_listing() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("docker-compose.yml");
    // Scanner finds nothing here; the tool still knows the services.
    fs::write(&file, "x-templates:\n  base:\n    image: ignored\n").unwrap();

    let (service, _runtime, tool) = engine(temp.path().to_path_buf());
    let file_arg = file.to_string_lossy().into_owned();
    tool.set_success(
        &["--file", &file_arg, "config", "--services"],
        "web\ndb\n",
    );

    let services = service.list_services(temp.path(), deadline()).unwrap();
    assert_eq!(services.len(), 2);
    assert_eq!(services[0].name, "web");
    assert!(services[0].image.is_none());
}

#[test]
fn test_services_surface_not_found() {
    let temp = TempDir::new().unwrap();
    let (service, _runtime, _tool) = engine(temp.path().to_path_buf());

    let err = service
        .list_services(&temp.path().join("missing"), deadline())
        .unwrap_err();
    assert!(matches!(err, DeclarationError::NotFound(_)));
}

#[test]
fn test_services_surface_invalid_format_when_tool_absent() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("compose.yml"), "volumes:\n  data:\n").unwrap();

    let (service, _runtime, _tool) = engine(temp.path().to_path_buf());
    let err = service.list_services(temp.path(), deadline()).unwrap_err();
    assert!(matches!(err, DeclarationError::InvalidFormat));
}

#[test]
fn test_services_surface_empty_declaration() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("compose.yml"), "").unwrap();

    let (service, _runtime, _tool) = engine(temp.path().to_path_buf());
    let err = service.list_services(temp.path(), deadline()).unwrap_err();
    assert!(matches!(err, DeclarationError::EmptyDeclaration(_)));
}
