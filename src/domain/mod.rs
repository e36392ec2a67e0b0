mod compose;
mod container;
mod resource;
pub mod traits;

pub use compose::{MatchKey, Project, Service};
pub use container::{
    Container, ContainerState, PROJECT_LABEL, SERVICE_LABEL, SHORT_ID_LEN, StatsSample, short_id,
};
pub use resource::{ImageSummary, NetworkSummary, VolumeSummary};
pub use traits::ContainerRuntime;
