use thiserror::Error;

/// Errors raised by a [`Projection`](crate::Projection) primitive.
///
/// [`LocalFrame`](crate::LocalFrame) does not catch or translate these; they surface to the
/// caller exactly as the projection reported them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// The latitude (in degrees) is outside the band the projection covers.
    #[error("latitude {latitude}° out of range (must be between {min}° and {max}°)")]
    LatitudeOutOfRange { latitude: f64, min: f64, max: f64 },

    /// The longitude (in degrees) is outside [-180°, 180°].
    #[error("longitude {longitude}° out of range (must be between -180° and 180°)")]
    LongitudeOutOfRange { longitude: f64 },

    /// The easting (in meters) is outside the band a single zone can represent.
    #[error("easting {easting} m out of range (must be between 100,000 m and 999,999 m)")]
    EastingOutOfRange { easting: f64 },

    /// The northing (in meters) is outside [0, 10,000,000].
    #[error("northing {northing} m out of range (must be between 0 m and 10,000,000 m)")]
    NorthingOutOfRange { northing: f64 },

    #[error("zone number {0} out of range (must be between 1 and 60)")]
    InvalidZoneNumber(u8),

    #[error("zone letter {0:?} out of range (must be between C and X, excluding I and O)")]
    InvalidZoneLetter(char),
}
