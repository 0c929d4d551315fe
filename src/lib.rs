//! This library provides the frame transformations a vehicle's navigation stack needs for moving
//! between attitude representations and between global and local positions.
//!
//! There are three groups of primitives:
//!
//! - [Rotation sequences](RotationSequence) of elementary rotations about the body axes, which
//!   [`compose`] into a single [`RotationMatrix`].
//! - Attitude as [Euler angles](EulerAttitude) (roll, pitch, yaw) or as a unit [`Quaternion`], with
//!   [`quaternion_to_euler`] and [`euler_to_quaternion`] to move between them.
//! - [Geodetic positions](GeodeticPosition) and [offsets](LocalPosition) from a home position, with
//!   [`to_local`] and [`to_geodetic`] to move between them through a planar
//!   [`Projection`] (by default [`Utm`]).
//!
//! All quantities at the API boundary are typed with [`uom`], so degrees cannot be mistaken for
//! radians and meters are always meters.
//!
//! # Conventions
//!
//! Euler angles apply roll about x first, then pitch about y, then yaw about z, all in the body
//! frame. Local positions have x pointing east, y pointing north and z pointing down.
//!
//! # Examples
//!
//! A vehicle is pitched up by 10° and heading due east. Where does its nose point, and where does
//! it end up after flying a kilometer in that direction?
//!
//! ```
//! use navframe::{EulerAttitude, GeodeticPosition, LocalFrame, LocalPosition};
//! use uom::si::f64::{Angle, Length};
//! use uom::si::{angle::degree, length::meter};
//!
//! let attitude = EulerAttitude::builder()
//!     .roll(Angle::new::<degree>(0.))
//!     .pitch(Angle::new::<degree>(10.))
//!     .yaw(Angle::new::<degree>(90.))
//!     .build();
//!
//! // the rotation maps body-frame vectors into the world frame
//! let [x, y, z] = attitude.to_rotation_matrix().rotate([1000., 0., 0.]);
//! approx::assert_abs_diff_eq!(x, 0., epsilon = 1e-9);
//! approx::assert_relative_eq!(y, 1000. * 10_f64.to_radians().cos());
//!
//! let home = GeodeticPosition::builder()
//!     .latitude(Angle::new::<degree>(37.400154))
//!     .expect("latitude is in [-90, 90]")
//!     .longitude(Angle::new::<degree>(-122.108432))
//!     .altitude(Length::new::<meter>(20.))
//!     .build();
//! let frame = LocalFrame::new(home);
//!
//! // local frames are east-north-down, so swap the first two axes
//! let destination = frame.to_geodetic(&LocalPosition::from_meters(y, x, z))?;
//! assert!(destination.longitude() > home.longitude());
//! # Ok::<(), navframe::ProjectionError>(())
//! ```

mod error;
mod local;
mod projection;
mod rotation;
mod util;
mod utm;

pub mod attitude;
pub mod geodetic;

pub(crate) type UnitQuaternion = nalgebra::UnitQuaternion<f64>;

pub use attitude::{euler_to_quaternion, quaternion_to_euler, EulerAttitude, Quaternion};
pub use error::ProjectionError;
pub use geodetic::GeodeticPosition;
pub use local::{to_geodetic, to_local, LocalFrame, LocalPosition};
pub use projection::{PlanarPosition, Projection};
pub use rotation::{compose, Axis, RotationMatrix, RotationSequence};
pub use utm::{Utm, UtmZone};
