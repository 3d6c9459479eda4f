pub mod classifier;
pub mod config;
pub mod error;
pub mod fading;
pub mod floor;
pub mod geometry;
pub mod ground;
pub mod math;
pub mod obstacle;
pub mod offset;
pub mod scene;
pub mod stats;
pub mod triangulation;
pub mod tunnel;

pub use classifier::{Attenuation, EnvironmentClassifier, LinkContext, RoadContext};
pub use error::{PropagisError, Result};
pub use scene::Scene;
