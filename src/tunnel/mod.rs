//! Tunnels block every link that leaves them through a wall, the floor or
//! the ceiling.

mod data;

pub use data::{road_width, SpreadType, Tunnel, CEILING_HEIGHT, DEFAULT_LANE_WIDTH, TUNNEL_TYPE};

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, SceneError};
use crate::math::Point3;

/// Tunnels keyed by their id.
#[derive(Debug, Default)]
pub struct TunnelRegistry {
    tunnels: HashMap<String, Tunnel>,
}

impl TunnelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and registers a tunnel.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateId`] if `id` is already registered and
    /// a configuration error if the centerline is degenerate.
    pub fn add(
        &mut self,
        id: &str,
        centerline: &[Point3],
        width: f64,
        spread: SpreadType,
    ) -> Result<()> {
        if self.tunnels.contains_key(id) {
            return Err(SceneError::DuplicateId(id.to_owned()).into());
        }
        let tunnel = Tunnel::new(id, centerline, width, spread)?;
        debug!(tunnel = id, walls = tunnel.walls().len(), "tunnel added");
        self.tunnels.insert(id.to_owned(), tunnel);
        Ok(())
    }

    /// Removes a tunnel.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`] for an unknown id.
    pub fn remove(&mut self, id: &str) -> std::result::Result<Tunnel, SceneError> {
        self.tunnels
            .remove(id)
            .ok_or_else(|| SceneError::EntityNotFound(format!("tunnel {id}")))
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Tunnel> {
        self.tunnels.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tunnels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tunnels.is_empty()
    }

    /// Linear factor of a link with an endpoint in a tunnel: `0.0` if the
    /// path leaves the sender's or the receiver's tunnel, `1.0` otherwise.
    ///
    /// Unknown tunnel ids do not block.
    #[must_use]
    pub fn calculate_attenuation(
        &self,
        sender: &Point3,
        receiver: &Point3,
        sender_tunnel: Option<&str>,
        receiver_tunnel: Option<&str>,
    ) -> f64 {
        let blocks = |tunnel: Option<&str>| {
            let Some(id) = tunnel.filter(|id| !id.is_empty()) else {
                return false;
            };
            match self.tunnels.get(id) {
                Some(t) => t.intersects_with(sender, receiver),
                None => {
                    debug!(tunnel = id, "unknown tunnel ignored");
                    false
                }
            }
        };
        if blocks(sender_tunnel) || blocks(receiver_tunnel) {
            0.0
        } else {
            1.0
        }
    }
}
