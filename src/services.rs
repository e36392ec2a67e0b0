mod compose_service;
mod container_matcher;
mod project_lister;
mod resource_service;

pub use compose_service::ComposeService;
pub use container_matcher::ContainerMatcher;
pub use project_lister::{ProjectLister, merge_candidates};
pub use resource_service::{PruneOptions, ResourceService};
