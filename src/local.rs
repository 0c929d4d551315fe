//! Conversion between geodetic positions and offsets from a home position.
//!
//! Positions are projected onto a plane (by default [UTM](crate::Utm)), where the offset from
//! home is a plain difference of easting and northing. Altitude is carried along separately, with
//! the local z axis pointing down:
//!
//! ```text
//! x = easting(pos) - easting(home)
//! y = northing(pos) - northing(home)
//! z = -(altitude(pos) - altitude(home))
//! ```
//!
//! The projection is only meaningful within one of its zones. Positions are assumed to share a
//! zone with home; this is not checked beyond a logged warning, so offsets across a zone
//! boundary are numerically well-defined but not geometrically meaningful.
//!
//! ```
//! use navframe::{to_geodetic, to_local, GeodeticPosition, LocalPosition};
//!
//! let home = GeodeticPosition::from_degrees(37.400154, -122.108432, 20.).expect("valid");
//! let position = GeodeticPosition::from_degrees(37.393037, -122.079465, 30.).expect("valid");
//!
//! let local = to_local(&position, &home)?;
//! let (x, y, z) = local.to_meters();
//! assert_eq!((x.round(), y.round(), z.round()), (2572., -765., -10.));
//!
//! let back = to_geodetic(&local, &home)?;
//! approx::assert_abs_diff_eq!(back, position);
//! # Ok::<(), navframe::ProjectionError>(())
//! ```

use crate::error::ProjectionError;
use crate::geodetic::GeodeticPosition;
use crate::projection::{PlanarPosition, Projection};
use crate::utm::Utm;
use std::fmt;
use std::fmt::{Display, Formatter};
use uom::si::f64::Length;
use uom::si::length::meter;
use uom::ConstZero;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An offset from a home position: x east, y north, z down.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalPosition {
    pub x: Length,
    pub y: Length,
    /// Down-positive, so a position above home has negative z.
    pub z: Length,
}

impl LocalPosition {
    #[must_use]
    pub fn new(x: impl Into<Length>, y: impl Into<Length>, z: impl Into<Length>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }

    #[must_use]
    pub fn from_meters(x: f64, y: f64, z: f64) -> Self {
        Self::new(
            Length::new::<meter>(x),
            Length::new::<meter>(y),
            Length::new::<meter>(z),
        )
    }

    /// The position of home itself.
    #[must_use]
    pub fn origin() -> Self {
        Self::new(Length::ZERO, Length::ZERO, Length::ZERO)
    }

    /// Returns `(x, y, z)` in meters.
    #[must_use]
    pub fn to_meters(&self) -> (f64, f64, f64) {
        (
            self.x.get::<meter>(),
            self.y.get::<meter>(),
            self.z.get::<meter>(),
        )
    }
}

impl Display for LocalPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.to_meters();
        match f.precision() {
            Some(p) => write!(f, "x = {x:.p$}m, y = {y:.p$}m, z = {z:.p$}m"),
            None => write!(f, "x = {x}m, y = {y}m, z = {z}m"),
        }
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for LocalPosition {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        Length::new::<meter>(f64::default_epsilon())
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        let epsilon = epsilon.get::<meter>();
        let (x, y, z) = self.to_meters();
        let (ox, oy, oz) = other.to_meters();
        x.abs_diff_eq(&ox, epsilon) && y.abs_diff_eq(&oy, epsilon) && z.abs_diff_eq(&oz, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for LocalPosition {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(f64::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let epsilon = epsilon.get::<meter>();
        let max_relative = max_relative.get::<meter>();
        let (x, y, z) = self.to_meters();
        let (ox, oy, oz) = other.to_meters();
        x.relative_eq(&ox, epsilon, max_relative)
            && y.relative_eq(&oy, epsilon, max_relative)
            && z.relative_eq(&oz, epsilon, max_relative)
    }
}

/// A local tangent-plane frame anchored at a home position.
///
/// Both operations call the projection exactly twice: once for home and once for the other
/// position. Errors from the projection are returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalFrame<P = Utm> {
    home: GeodeticPosition,
    projection: P,
}

impl LocalFrame<Utm> {
    /// Constructs a frame at `home` using the [UTM](Utm) projection.
    #[must_use]
    pub fn new(home: GeodeticPosition) -> Self {
        Self::with_projection(home, Utm)
    }
}

impl<P> LocalFrame<P>
where
    P: Projection,
{
    #[must_use]
    pub fn with_projection(home: GeodeticPosition, projection: P) -> Self {
        Self { home, projection }
    }

    #[must_use]
    pub fn home(&self) -> &GeodeticPosition {
        &self.home
    }

    #[must_use]
    pub fn projection(&self) -> &P {
        &self.projection
    }

    fn project(
        &self,
        position: &GeodeticPosition,
    ) -> Result<PlanarPosition<P::Zone>, ProjectionError> {
        self.projection.project(position.latitude(), position.longitude())
    }

    /// Returns the offset of `position` from home.
    ///
    /// # Errors
    ///
    /// Fails if the projection rejects either position.
    pub fn to_local(&self, position: &GeodeticPosition) -> Result<LocalPosition, ProjectionError> {
        let planar = self.project(position)?;
        let home = self.project(&self.home)?;

        if planar.zone != home.zone {
            log::warn!(
                "{position} is in zone {} but home {} is in zone {}; \
                 offsets across zones are not meaningful",
                planar.zone,
                self.home,
                home.zone
            );
        }

        Ok(LocalPosition {
            x: planar.easting - home.easting,
            y: planar.northing - home.northing,
            z: -(position.altitude() - self.home.altitude()),
        })
    }

    /// Returns the absolute position at offset `local` from home.
    ///
    /// The offset is interpreted in home's projection zone.
    ///
    /// # Errors
    ///
    /// Fails if the projection rejects home, if the offset leaves the part of the plane that home's
    /// zone can represent, or if the projection yields a latitude beyond the poles.
    pub fn to_geodetic(&self, local: &LocalPosition) -> Result<GeodeticPosition, ProjectionError> {
        let home = self.project(&self.home)?;
        let planar = PlanarPosition {
            easting: home.easting + local.x,
            northing: home.northing + local.y,
            zone: home.zone,
        };
        let (latitude, longitude) = self.projection.unproject(&planar)?;

        Ok(GeodeticPosition::builder()
            .latitude(latitude)?
            .longitude(longitude)
            .altitude(self.home.altitude() - local.z)
            .build())
    }
}

/// Returns the offset of `position` from `home`, using the [UTM](Utm) projection.
///
/// # Errors
///
/// Fails if either position is outside the UTM grid (latitude beyond [-80°, 84°]).
pub fn to_local(
    position: &GeodeticPosition,
    home: &GeodeticPosition,
) -> Result<LocalPosition, ProjectionError> {
    LocalFrame::new(*home).to_local(position)
}

/// Returns the absolute position at offset `local` from `home`, using the [UTM](Utm) projection.
///
/// # Errors
///
/// Fails if home is outside the UTM grid, or if the offset leaves home's zone.
pub fn to_geodetic(
    local: &LocalPosition,
    home: &GeodeticPosition,
) -> Result<GeodeticPosition, ProjectionError> {
    LocalFrame::new(*home).to_geodetic(local)
}
