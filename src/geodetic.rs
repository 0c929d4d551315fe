use crate::error::ProjectionError;
use crate::util::BoundedAngle;
use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use uom::si::f64::{Angle, Length};
use uom::si::{
    angle::{degree, radian},
    length::meter,
};
use uom::ConstZero;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Parameters of the WGS84 ellipsoid
// https://nsgreg.nga.mil/doc/view?i=4085 table 3.1
#[doc(alias = "equatorial radius")]
#[doc(alias = "a")]
pub(crate) const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
#[doc(alias = "1/f")]
const FLATTENING_FACTOR: f64 = 298.257_223_563;
#[doc(alias = "f")]
const FLATTENING: f64 = 1.0 / FLATTENING_FACTOR;
#[doc(alias = "e^2")]
// e^2 = 1 - b^2/a^2 = 2f - f^2
pub(crate) const ECCENTRICITY_SQ: f64 = 2.0 * FLATTENING - FLATTENING * FLATTENING;

/// An absolute position on the WGS84 ellipsoid: latitude, longitude, and altitude.
///
/// Altitude increases upwards. Local offsets produced from it by [`LocalFrame`] use the opposite,
/// down-positive, convention for their z component.
///
/// [`LocalFrame`]: crate::LocalFrame
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeodeticPosition {
    // NOTE: uom does not guarantee how these angles are normalized; the accessors normalize.
    latitude: Angle,
    longitude: Angle,
    altitude: Length,
}

impl GeodeticPosition {
    /// Constructs a position from latitude, longitude, and altitude.
    ///
    /// The latitude must be in [-90°,90°] % 360°. If it is not, this function returns `None`.
    #[must_use]
    pub fn build(
        Components {
            latitude,
            longitude,
            altitude,
        }: Components,
    ) -> Option<Self> {
        let position = Self::builder()
            .latitude(latitude)
            .ok()?
            .longitude(longitude)
            .altitude(altitude)
            .build();
        Some(position)
    }

    pub fn builder() -> Builder<NeedsLatitude> {
        Builder {
            under_construction: GeodeticPosition {
                latitude: Angle::ZERO,
                longitude: Angle::ZERO,
                altitude: Length::ZERO,
            },
            state: PhantomData,
        }
    }

    /// Constructs a position from decimal degrees and an altitude in meters.
    ///
    /// Returns `None` under the same conditions as [`GeodeticPosition::build`].
    #[must_use]
    pub fn from_degrees(latitude: f64, longitude: f64, altitude_m: f64) -> Option<Self> {
        let position = Self::builder()
            .latitude(Angle::new::<degree>(latitude))
            .ok()?
            .longitude(Angle::new::<degree>(longitude))
            .altitude(Length::new::<meter>(altitude_m))
            .build();
        Some(position)
    }

    /// Returns the angle north of the equator, in [-90°, 90°].
    #[must_use]
    pub fn latitude(&self) -> Angle {
        Angle::new::<radian>(BoundedAngle::new(self.latitude).to_signed_range())
    }

    /// Returns the angle east of the reference meridian, in [-180°, 180°).
    #[must_use]
    pub fn longitude(&self) -> Angle {
        Angle::new::<radian>(BoundedAngle::new(self.longitude).to_signed_range())
    }

    /// Returns the height above the WGS84 ellipsoid.
    ///
    /// The ellipsoid approximates mean sea level, so this is close to, but not the same as,
    /// altitude above sea level.
    #[must_use]
    pub fn altitude(&self) -> Length {
        self.altitude
    }

    /// Returns `(latitude°, longitude°, altitude m)`.
    #[must_use]
    pub fn to_degrees(&self) -> (f64, f64, f64) {
        (
            self.latitude().get::<degree>(),
            self.longitude().get::<degree>(),
            self.altitude.get::<meter>(),
        )
    }

    /// Computes the [great-circle distance] between the two positions on the surface of the
    /// earth, ignoring altitude.
    ///
    /// This treats the earth as a sphere with the equatorial radius, so it is an approximation.
    ///
    /// [great-circle distance]: https://en.wikipedia.org/wiki/Great-circle_distance
    #[doc(alias = "great_circle_distance")]
    #[must_use]
    pub fn haversine_distance_on_surface(&self, other: &GeodeticPosition) -> Length {
        let lat_a = self.latitude.get::<radian>(); // φ1
        let lat_b = other.latitude.get::<radian>(); // φ2
        let delta_lat = lat_b - lat_a;
        let delta_lon = other.longitude.get::<radian>() - self.longitude.get::<radian>();

        let inner = 1. - delta_lat.cos() + lat_a.cos() * lat_b.cos() * (1. - delta_lon.cos());
        let central_angle = 2. * (inner / 2.).sqrt().asin();
        Length::new::<meter>(central_angle * SEMI_MAJOR_AXIS)
    }
}

impl Display for GeodeticPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let lat = self.latitude();
        let ns = if lat.is_sign_negative() { 'S' } else { 'N' };
        let lat = lat.abs().get::<degree>();
        let lon = self.longitude();
        let ew = if lon.is_sign_negative() { 'W' } else { 'E' };
        let lon = lon.abs().get::<degree>();
        let alt = self.altitude.get::<meter>();
        match f.precision() {
            Some(p) => write!(f, "{lat:.p$}°{ns}, {lon:.p$}°{ew}, {alt:.p$}m"),
            None => write!(f, "{lat}°{ns}, {lon}°{ew}, {alt}m"),
        }
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for GeodeticPosition {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        // sub-centimeter; projections round-trip well below this
        Length::new::<meter>(0.005)
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.haversine_distance_on_surface(other) <= epsilon
            && self
                .altitude
                .get::<meter>()
                .abs_diff_eq(&other.altitude.get::<meter>(), epsilon.get::<meter>())
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for GeodeticPosition {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(f64::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.haversine_distance_on_surface(other)
            .get::<meter>()
            .abs_diff_eq(&0., epsilon.get::<meter>())
            && self.altitude.get::<meter>().relative_eq(
                &other.altitude.get::<meter>(),
                epsilon.get::<meter>(),
                max_relative.get::<meter>(),
            )
    }
}

/// Argument type for [`GeodeticPosition::build`].
#[derive(Debug, Default)]
#[must_use]
pub struct Components {
    /// The latitude must be in [-90°,90°] % 360°.
    pub latitude: Angle,

    pub longitude: Angle,

    /// Height above the WGS84 ellipsoid, positive upwards.
    pub altitude: Length,
}

/// Marks that a partially-constructed [`GeodeticPosition`] needs its latitude next.
pub struct NeedsLatitude;
/// Marks that a partially-constructed [`GeodeticPosition`] needs its longitude next.
pub struct NeedsLongitude;
/// Marks that a partially-constructed [`GeodeticPosition`] needs its altitude next.
pub struct NeedsAltitude;
/// Marks that every component of a partially-constructed [`GeodeticPosition`] is set.
pub struct Complete;

/// [Builder] for a [`GeodeticPosition`], taking latitude, longitude and altitude in that order.
///
/// Only the latitude can be invalid, so it is the one fallible step.
///
/// [Builder]: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
#[must_use]
pub struct Builder<State> {
    under_construction: GeodeticPosition,
    state: PhantomData<State>,
}

impl<State> Clone for Builder<State> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<State> Copy for Builder<State> {}

impl<State> fmt::Debug for Builder<State> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Builder")
            .field(&self.under_construction)
            .finish()
    }
}

impl<State> Builder<State> {
    fn advance<Next>(self) -> Builder<Next> {
        Builder {
            under_construction: self.under_construction,
            state: PhantomData,
        }
    }
}

impl Builder<NeedsLatitude> {
    /// Sets the latitude, which must be in [-90°, 90°] once wrapped into [-180°, 180°).
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::LatitudeOutOfRange`] for latitudes beyond the poles, and for NaN.
    pub fn latitude(
        mut self,
        latitude: impl Into<Angle>,
    ) -> Result<Builder<NeedsLongitude>, ProjectionError> {
        let latitude = latitude.into();
        let signed = BoundedAngle::new(latitude).to_signed_range();
        if !(-FRAC_PI_2..=FRAC_PI_2).contains(&signed) {
            return Err(ProjectionError::LatitudeOutOfRange {
                latitude: latitude.get::<degree>(),
                min: -90.,
                max: 90.,
            });
        }
        self.under_construction.latitude = latitude;
        Ok(self.advance())
    }
}

impl Builder<NeedsLongitude> {
    pub fn longitude(mut self, longitude: impl Into<Angle>) -> Builder<NeedsAltitude> {
        self.under_construction.longitude = longitude.into();
        self.advance()
    }
}

impl Builder<NeedsAltitude> {
    pub fn altitude(mut self, altitude: impl Into<Length>) -> Builder<Complete> {
        self.under_construction.altitude = altitude.into();
        self.advance()
    }
}

impl Builder<Complete> {
    #[must_use]
    pub fn build(self) -> GeodeticPosition {
        self.under_construction
    }
}
