//! The planar projection seam used by [`LocalFrame`](crate::LocalFrame).

use crate::error::ProjectionError;
use std::fmt;
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A map projection from latitude/longitude onto a plane that is split into zones.
///
/// Planar coordinates are only comparable within a single zone. Implementations report the zone
/// alongside each projected position and accept it back when unprojecting.
pub trait Projection {
    /// Identifies the part of the plane a [`PlanarPosition`] is relative to.
    type Zone: Copy + PartialEq + fmt::Debug + fmt::Display;

    /// Projects latitude and longitude into the plane.
    ///
    /// # Errors
    ///
    /// Fails if the position is outside the region the projection covers.
    fn project(
        &self,
        latitude: Angle,
        longitude: Angle,
    ) -> Result<PlanarPosition<Self::Zone>, ProjectionError>;

    /// Recovers latitude and longitude from a position in the plane.
    ///
    /// # Errors
    ///
    /// Fails if the planar position is not representable in its zone.
    fn unproject(
        &self,
        planar: &PlanarPosition<Self::Zone>,
    ) -> Result<(Angle, Angle), ProjectionError>;
}

/// A position in a projected plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanarPosition<Zone> {
    /// Distance east within the zone, including any false easting.
    pub easting: Length,
    /// Distance north within the zone, including any false northing.
    pub northing: Length,
    pub zone: Zone,
}

impl<Zone: fmt::Display> fmt::Display for PlanarPosition<Zone> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}mE {}mN",
            self.zone,
            self.easting.get::<meter>(),
            self.northing.get::<meter>()
        )
    }
}
