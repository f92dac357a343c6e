//! Container image definition from resolved workflow dependencies.

pub mod dockerfile;
pub mod installer;

pub use dockerfile::{DockerfileBuilder, DEFAULT_BASE_IMAGE};
pub use installer::{validate_repository_url, InstallPlanError, InstallPlanner};
