use dockhand::domain::ContainerState;
use dockhand::infra::compose_cli::Deadline;
use dockhand::services::ComposeService;
use dockhand::test_support::{MockComposeTool, MockRuntime};
use dockhand::ToolOutcome;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn engine() -> (ComposeService, Arc<MockRuntime>, Arc<MockComposeTool>, TempDir) {
    let temp = TempDir::new().unwrap();
    let runtime = Arc::new(MockRuntime::new());
    let tool = Arc::new(MockComposeTool::new());
    let service = ComposeService::new(runtime.clone(), tool.clone(), temp.path().to_path_buf());
    (service, runtime, tool, temp)
}

fn deadline() -> Deadline {
    Deadline::within(Duration::from_secs(5))
}

#[test]
fn test_label_pass_finds_labelled_containers() {
    let (service, runtime, tool, _temp) = engine();
    runtime.add_compose_container("myapp_web_1", ContainerState::Running, "myapp", "web");
    runtime.add_compose_container("myapp_db_1", ContainerState::Running, "myapp", "db");
    runtime.add_compose_container("other_api_1", ContainerState::Running, "other", "api");

    let containers = service.containers_for_project("myapp", deadline());
    assert_eq!(containers.len(), 2);
    assert!(containers.iter().all(|c| c.name.starts_with("myapp_")));

    // Label hit means no fallback invocations reached the tool.
    assert!(tool.invocations().is_empty());
}

#[test]
fn test_dash_variant_pass_selects_dashed_container() {
    // Container named with dashes, no labels at all; project supplied plain.
    let (service, runtime, _tool, _temp) = engine();
    runtime.add_container("myapp-web-1", ContainerState::Running);

    let containers = service.containers_for_project("myapp", deadline());
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].name, "myapp-web-1");
}

#[test]
fn test_variant_matching_is_symmetric() {
    // Underscored project name against dashed container and vice versa.
    let (service, runtime, _tool, _temp) = engine();
    runtime.add_container("my-app-web-1", ContainerState::Running);

    let containers = service.containers_for_project("my_app", deadline());
    assert_eq!(containers.len(), 1);

    let (service, runtime, _tool, _temp) = engine();
    runtime.add_container("my_app_web_1", ContainerState::Exited);

    let containers = service.containers_for_project("my-app", deadline());
    assert_eq!(containers.len(), 1);
}

#[test]
fn test_variant_pass_checks_respelled_labels() {
    let (service, runtime, _tool, _temp) = engine();
    runtime.add_compose_container("api-1", ContainerState::Running, "my-app", "api");

    let containers = service.containers_for_project("my_app", deadline());
    assert_eq!(containers.len(), 1);
}

#[test]
fn test_lowercase_pass_matches_folded_label() {
    // Name gives no pattern hit; only the lowercased label query matches.
    let (service, runtime, _tool, _temp) = engine();
    runtime.add_compose_container("api-1", ContainerState::Running, "myapp", "api");

    let containers = service.containers_for_project("MyApp", deadline());
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].name, "api-1");
}

#[test]
fn test_tool_pass_cross_references_by_id_prefix() {
    let (service, runtime, tool, _temp) = engine();
    // Runtime knows the container under its short id only; nothing matches
    // the project by label or name.
    runtime.push(dockhand::Container {
        id: "abcdef123456".into(),
        name: "standalone".into(),
        image: "app:1".into(),
        command: String::new(),
        status: "Up 1 hour".into(),
        state: ContainerState::Running,
        created: None,
        ports: vec![],
        labels: Default::default(),
    });

    // Tool reports a longer id for the same container.
    tool.set_success(
        &["--project-name", "shop", "ps", "--format", "json"],
        r#"[{"ID":"abcdef1234567890aabbcc","Name":"standalone","Service":"web"}]"#,
    );

    let containers = service.containers_for_project("shop", deadline());
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].id, "abcdef123456");
}

#[test]
fn test_tool_pass_falls_back_to_legacy_binary() {
    let (service, runtime, tool, _temp) = engine();
    runtime.add_container("xyz1", ContainerState::Running);

    tool.set_legacy_response(
        &["--project-name", "shop", "ps"],
        ToolOutcome::Success(
            b"NAME   STATUS\nxyz1   shop_web_1   Up 2 hours\n".to_vec(),
        ),
    );

    let containers = service.containers_for_project("shop", deadline());
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].id, "xyz1");

    let invocations = tool.invocations();
    assert!(invocations.contains(&"--project-name shop ps --format json".to_string()));
    assert!(invocations.contains(&"legacy:--project-name shop ps".to_string()));
}

#[test]
fn test_token_scan_is_last_resort() {
    // Neither labels, nor the naming pattern, nor the tool know the project;
    // only an embedded name token ties the container to it.
    let (service, runtime, _tool, _temp) = engine();
    runtime.add_container("legacy_myapp_1", ContainerState::Exited);

    let containers = service.containers_for_project("myapp", deadline());
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].name, "legacy_myapp_1");
}

#[test]
fn test_token_scan_matches_variants() {
    let (service, runtime, _tool, _temp) = engine();
    runtime.add_container("old_my-app_2", ContainerState::Exited);

    let containers = service.containers_for_project("my_app", deadline());
    assert_eq!(containers.len(), 1);
}

#[test]
fn test_no_match_returns_empty_not_error() {
    let (service, runtime, _tool, _temp) = engine();
    runtime.add_container("unrelated", ContainerState::Running);

    let containers = service.containers_for_project("ghost", deadline());
    assert!(containers.is_empty());
}

#[test]
fn test_runtime_errors_degrade_to_empty() {
    let (service, runtime, _tool, _temp) = engine();
    runtime.add_compose_container("myapp_web_1", ContainerState::Running, "myapp", "web");
    runtime.set_fail_on("containers_with_label");
    runtime.set_fail_on("list_containers");

    // Every pass degrades; nothing panics, nothing errors.
    let containers = service.containers_for_project("myapp", deadline());
    assert!(containers.is_empty());
}

#[test]
fn test_empty_project_name_yields_nothing() {
    let (service, runtime, _tool, _temp) = engine();
    runtime.add_container("anything", ContainerState::Running);

    assert!(service.containers_for_project("", deadline()).is_empty());
}

#[test]
fn test_annotation_fills_observed_containers_and_usage() {
    let (service, runtime, _tool, _temp) = engine();
    runtime.add_compose_container("shop_web_1", ContainerState::Running, "shop", "web");
    runtime.add_compose_container("shop_db_1", ContainerState::Exited, "shop", "db");
    runtime.set_stats(
        "shop_web_1",
        dockhand::StatsSample {
            cpu_percent: 1.5,
            memory_usage: 2048,
            memory_limit: 4096,
            memory_percent: 50.0,
            ..Default::default()
        },
    );

    let mut services = vec![
        dockhand::Service::named("web"),
        dockhand::Service::named("db"),
        dockhand::Service::named("cache"),
    ];
    service.annotate_services(&mut services, "shop", deadline());

    let web = &services[0];
    assert_eq!(web.containers.as_deref(), Some(&["shop_web_1".to_string()][..]));
    assert_eq!(web.cpu_percent, Some(1.5));
    assert_eq!(web.memory_usage, Some(2048));

    // Stopped container: observed, but no live reading is fabricated.
    let db = &services[1];
    assert_eq!(db.containers.as_deref(), Some(&["shop_db_1".to_string()][..]));
    assert!(db.cpu_percent.is_none());

    // Unrealized service: nothing observed, nothing defaulted.
    let cache = &services[2];
    assert!(cache.containers.is_none());
    assert!(cache.memory_usage.is_none());
}
