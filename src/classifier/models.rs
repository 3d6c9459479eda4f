use std::fmt::Debug;

use crate::fading::RiceRayleighFading;
use crate::ground::{FreeSpacePathLoss, NRayGroundInterference, TwoRayInterference};
use crate::math::Point3;

/// Extra loss from vehicles and terrain edges on the direct path.
///
/// Diffraction is computed outside this crate; hosts plug their model in
/// here.
pub trait Diffraction: Debug {
    /// Linear factor between the two positions. `in_garage` selects the
    /// variant for links inside a parking garage.
    fn attenuation(&self, sender: &Point3, receiver: &Point3, in_garage: bool) -> f64;
}

/// Diffraction that never attenuates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiffraction;

impl Diffraction for NoDiffraction {
    fn attenuation(&self, _sender: &Point3, _receiver: &Point3, _in_garage: bool) -> f64 {
        1.0
    }
}

/// Contribution of a single phenomenon to a link's attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    FreeSpace,
    TwoRay,
    NRay,
    Fading,
    Diffraction,
    ObstacleShadowing,
    InnerWallShadowing,
    Floor,
    Tunnel,
}

/// A propagation model handed to the classifier.
#[derive(Debug)]
pub enum Model {
    FreeSpace(FreeSpacePathLoss),
    TwoRay(TwoRayInterference),
    NRay(NRayGroundInterference),
    Fading(RiceRayleighFading),
    Diffraction(Box<dyn Diffraction>),
}

impl Model {
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::FreeSpace(_) => ModelKind::FreeSpace,
            Self::TwoRay(_) => ModelKind::TwoRay,
            Self::NRay(_) => ModelKind::NRay,
            Self::Fading(_) => ModelKind::Fading,
            Self::Diffraction(_) => ModelKind::Diffraction,
        }
    }
}
