use crate::math::Vector3;

/// What the host knows about the road an endpoint is on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadContext {
    pub road_id: String,
    /// Garage the road belongs to, if any.
    pub garage: Option<String>,
    /// Tunnel the road runs through, if any.
    pub tunnel: Option<String>,
    /// Known street width in meters.
    pub street_width: Option<f64>,
}

impl RoadContext {
    /// An open road without special environment.
    #[must_use]
    pub fn road(road_id: impl Into<String>) -> Self {
        Self {
            road_id: road_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_garage(mut self, garage: impl Into<String>) -> Self {
        self.garage = Some(garage.into());
        self
    }

    #[must_use]
    pub fn in_tunnel(mut self, tunnel: impl Into<String>) -> Self {
        self.tunnel = Some(tunnel.into());
        self
    }

    #[must_use]
    pub fn with_street_width(mut self, width: f64) -> Self {
        self.street_width = Some(width);
        self
    }

    pub(crate) fn garage_id(&self) -> Option<&str> {
        self.garage.as_deref().filter(|g| !g.is_empty())
    }

    pub(crate) fn tunnel_id(&self) -> Option<&str> {
        self.tunnel.as_deref().filter(|t| !t.is_empty())
    }
}

/// Everything about a transmission besides the endpoint positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkContext {
    pub sender: RoadContext,
    pub receiver: RoadContext,
    pub sender_velocity: Vector3,
    pub receiver_velocity: Vector3,
    /// Time at which fading is evaluated, in seconds.
    pub time: f64,
}

impl LinkContext {
    #[must_use]
    pub fn new(sender: RoadContext, receiver: RoadContext) -> Self {
        Self {
            sender,
            receiver,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_velocities(mut self, sender: Vector3, receiver: Vector3) -> Self {
        self.sender_velocity = sender;
        self.receiver_velocity = receiver;
        self
    }

    #[must_use]
    pub fn at(mut self, time: f64) -> Self {
        self.time = time;
        self
    }
}

/// Propagation environment of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Both endpoints inside the same garage.
    Garage,
    /// At least one endpoint inside a tunnel.
    Tunnel,
    Outdoor,
}

impl Environment {
    /// Classifies a link by the tags of its roads.
    ///
    /// A shared garage wins over tunnels; any tunnel tag wins over outdoor.
    #[must_use]
    pub fn of(link: &LinkContext) -> Self {
        match (link.sender.garage_id(), link.receiver.garage_id()) {
            (Some(a), Some(b)) if a == b => return Self::Garage,
            _ => {}
        }
        if link.sender.tunnel_id().is_some() || link.receiver.tunnel_id().is_some() {
            Self::Tunnel
        } else {
            Self::Outdoor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_garage() {
        let link = LinkContext::new(
            RoadContext::road("a").in_garage("g1").in_tunnel("t"),
            RoadContext::road("b").in_garage("g1"),
        );
        assert_eq!(Environment::of(&link), Environment::Garage);
    }

    #[test]
    fn different_garages_are_outdoor() {
        let link = LinkContext::new(
            RoadContext::road("a").in_garage("g1"),
            RoadContext::road("b").in_garage("g2"),
        );
        assert_eq!(Environment::of(&link), Environment::Outdoor);
    }

    #[test]
    fn one_tunnel_endpoint() {
        let link = LinkContext::new(RoadContext::road("a"), RoadContext::road("b").in_tunnel("t"));
        assert_eq!(Environment::of(&link), Environment::Tunnel);
    }

    #[test]
    fn empty_tags_are_ignored() {
        let link = LinkContext::new(
            RoadContext::road("a").in_garage("").in_tunnel(""),
            RoadContext::road("b").in_garage(""),
        );
        assert_eq!(Environment::of(&link), Environment::Outdoor);
    }
}
