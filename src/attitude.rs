//! Conversion between Euler-angle and quaternion attitude.
//!
//! An [`EulerAttitude`] is a roll-pitch-yaw triple in the aerospace convention: starting from the
//! reference frame, the body is rolled about x, then pitched about y, then yawed about z, all
//! about the fixed reference axes (or, equivalently, yaw-pitch-roll about the body's axes). The
//! same rotation as a matrix is `Rz(yaw) · Ry(pitch) · Rx(roll)`, which is exactly what
//! [`compose`](crate::compose) produces for `[Roll, Pitch, Yaw]`.
//!
//! A [`Quaternion`] is the `(w, x, y, z)` unit quaternion for the same rotation. Conversions in
//! both directions are closed-form and total:
//!
//! ```
//! use navframe::{EulerAttitude, Quaternion};
//! use approx::assert_abs_diff_eq;
//! use uom::si::{angle::degree, f64::Angle};
//!
//! let attitude = EulerAttitude::builder()
//!     .roll(Angle::new::<degree>(90.))
//!     .pitch(Angle::new::<degree>(30.))
//!     .yaw(Angle::new::<degree>(0.))
//!     .build();
//!
//! let q = attitude.to_quaternion();
//! assert_abs_diff_eq!(q, Quaternion::new(0.683, 0.683, 0.183, -0.183), epsilon = 1e-3);
//! assert_abs_diff_eq!(q.to_euler(), attitude, epsilon = 1e-9);
//! ```
//!
//! Near pitch = ±90° (gimbal lock) roll and yaw become coupled and the quaternion-to-Euler
//! direction loses information. The conversion still produces finite angles there; see
//! [`quaternion_to_euler`].

use crate::rotation::{RotationMatrix, RotationSequence};
use crate::UnitQuaternion;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::ops::Neg;
use uom::si::angle::{degree, radian};
use uom::si::f64::Angle;
use uom::ConstZero;

#[cfg(any(test, feature = "approx"))]
use crate::util::BoundedAngle;
#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How close `|sin(pitch)|` may get to 1 before we report gimbal lock.
const GIMBAL_LOCK_MARGIN: f64 = 1e-9;

/// Attitude as roll (φ), pitch (θ), and yaw (ψ) angles.
///
/// Any angles are accepted. Conventionally roll and yaw are in (-180°, 180°] and pitch is in
/// [-90°, 90°], which is also the range [`Quaternion::to_euler`] produces.
///
/// To construct one, use [`EulerAttitude::builder`], [`EulerAttitude::build`], or
/// [`EulerAttitude::from_radians`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EulerAttitude {
    roll: Angle,
    pitch: Angle,
    yaw: Angle,
}

/// Argument type for [`EulerAttitude::build`].
#[derive(Debug, Default, Clone, Copy)]
#[must_use]
pub struct Components {
    /// Rotation about the x axis.
    pub roll: Angle,
    /// Rotation about the y axis.
    pub pitch: Angle,
    /// Rotation about the z axis.
    pub yaw: Angle,
}

impl EulerAttitude {
    #[must_use]
    pub fn build(Components { roll, pitch, yaw }: Components) -> Self {
        Self::builder().roll(roll).pitch(pitch).yaw(yaw).build()
    }

    /// Provides a builder that takes the angles in roll, pitch, yaw order.
    pub fn builder() -> Builder<NeedsRoll> {
        Builder {
            under_construction: Self {
                roll: Angle::ZERO,
                pitch: Angle::ZERO,
                yaw: Angle::ZERO,
            },
            state: PhantomData,
        }
    }

    /// Constructs an attitude from roll, pitch, and yaw given in radians.
    #[must_use]
    pub fn from_radians(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            roll: Angle::new::<radian>(roll),
            pitch: Angle::new::<radian>(pitch),
            yaw: Angle::new::<radian>(yaw),
        }
    }

    #[must_use]
    pub fn roll(&self) -> Angle {
        self.roll
    }

    #[must_use]
    pub fn pitch(&self) -> Angle {
        self.pitch
    }

    #[must_use]
    pub fn yaw(&self) -> Angle {
        self.yaw
    }

    /// Returns `(roll, pitch, yaw)` in radians.
    #[must_use]
    pub fn to_radians(&self) -> (f64, f64, f64) {
        (
            self.roll.get::<radian>(),
            self.pitch.get::<radian>(),
            self.yaw.get::<radian>(),
        )
    }

    /// Equivalent to [`euler_to_quaternion`].
    #[must_use]
    pub fn to_quaternion(&self) -> Quaternion {
        euler_to_quaternion(self)
    }

    /// Returns the rotation matrix `Rz(yaw) · Ry(pitch) · Rx(roll)`.
    #[must_use]
    pub fn to_rotation_matrix(&self) -> RotationMatrix {
        RotationSequence::new()
            .roll(self.roll)
            .pitch(self.pitch)
            .yaw(self.yaw)
            .compose()
    }
}

impl Display for EulerAttitude {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let roll = self.roll.get::<degree>();
        let pitch = self.pitch.get::<degree>();
        let yaw = self.yaw.get::<degree>();
        match f.precision() {
            Some(p) => write!(f, "roll {roll:.p$}°, pitch {pitch:.p$}°, yaw {yaw:.p$}°"),
            None => write!(f, "roll {roll}°, pitch {pitch}°, yaw {yaw}°"),
        }
    }
}

/// A quaternion `w + xi + yj + zk`.
///
/// Quaternions produced by this crate are unit quaternions (up to floating point error). Note
/// that `q` and `-q` describe the same rotation; the approximate comparisons treat them as equal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quaternion {
    w: f64,
    x: f64,
    y: f64,
    z: f64,
}

impl Quaternion {
    /// Constructs a quaternion from its scalar part `w` and vector part `(x, y, z)`.
    ///
    /// The components are taken as-is; nothing is normalized.
    #[must_use]
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    #[must_use]
    pub fn identity() -> Self {
        Self::new(1., 0., 0., 0.)
    }

    #[must_use]
    pub fn w(&self) -> f64 {
        self.w
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Returns `(w, x, y, z)`.
    #[must_use]
    pub fn to_components(&self) -> (f64, f64, f64, f64) {
        (self.w, self.x, self.y, self.z)
    }

    #[must_use]
    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Returns true if the norm is within `tolerance` of 1.
    #[must_use]
    pub fn is_unit(&self, tolerance: f64) -> bool {
        (self.norm() - 1.).abs() <= tolerance
    }

    /// Returns the quaternion for the opposite rotation (for unit quaternions).
    #[must_use]
    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Equivalent to [`quaternion_to_euler`].
    #[must_use]
    pub fn to_euler(&self) -> EulerAttitude {
        quaternion_to_euler(self)
    }

    /// Returns the rotation matrix for this quaternion.
    ///
    /// Unlike the Euler conversion, this normalizes first. The quaternion must be non-zero.
    #[must_use]
    pub fn to_rotation_matrix(&self) -> RotationMatrix {
        debug_assert_ne!(
            [self.w, self.x, self.y, self.z],
            [0.0, 0.0, 0.0, 0.0],
            "Quaternion must be non-zero"
        );
        let unit = UnitQuaternion::new_normalize((*self).into());
        RotationMatrix {
            inner: unit.to_rotation_matrix().into_inner(),
        }
    }
}

impl Neg for Quaternion {
    type Output = Quaternion;

    fn neg(self) -> Self::Output {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }
}

impl From<Quaternion> for nalgebra::Quaternion<f64> {
    fn from(q: Quaternion) -> Self {
        nalgebra::Quaternion::new(q.w, q.x, q.y, q.z)
    }
}

impl From<nalgebra::Quaternion<f64>> for Quaternion {
    fn from(q: nalgebra::Quaternion<f64>) -> Self {
        Self::new(q.w, q.i, q.j, q.k)
    }
}

impl Display for Quaternion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self { w, x, y, z } = *self;
        match f.precision() {
            Some(p) => write!(f, "({w:.p$}, {x:.p$}, {y:.p$}, {z:.p$})"),
            None => write!(f, "({w}, {x}, {y}, {z})"),
        }
    }
}

/// Converts a quaternion into roll, pitch, and yaw.
///
/// ```text
/// roll  = atan2(2(wx + yz), 1 - 2(x² + y²))
/// pitch = asin(2(wy - zx))
/// yaw   = atan2(2(wz + xy), 1 - 2(y² + z²))
/// ```
///
/// The quaternion is not renormalized: a non-unit input gives angles that are well-defined but
/// do not describe the rotation one might expect.
///
/// At gimbal lock the `asin` argument can land just outside [-1, 1] through rounding alone. It is
/// clamped, so pitch comes out as exactly ±90° rather than NaN.
#[must_use]
pub fn quaternion_to_euler(q: &Quaternion) -> EulerAttitude {
    let Quaternion { w, x, y, z } = *q;

    let roll = (2. * (w * x + y * z)).atan2(1. - 2. * (x * x + y * y));

    let sin_pitch = 2. * (w * y - z * x);
    if sin_pitch.abs() >= 1. - GIMBAL_LOCK_MARGIN {
        log::debug!("quaternion {q} is at gimbal lock (sin(pitch) = {sin_pitch})");
    }
    let pitch = sin_pitch.clamp(-1., 1.).asin();

    let yaw = (2. * (w * z + x * y)).atan2(1. - 2. * (y * y + z * z));

    EulerAttitude::from_radians(roll, pitch, yaw)
}

/// Converts roll, pitch, and yaw into a unit quaternion.
///
/// With `c` and `s` the cosine and sine of the half angles:
///
/// ```text
/// w = cφ cθ cψ + sφ sθ sψ
/// x = sφ cθ cψ - cφ sθ sψ
/// y = cφ sθ cψ + sφ cθ sψ
/// z = cφ cθ sψ - sφ sθ cψ
/// ```
#[must_use]
pub fn euler_to_quaternion(attitude: &EulerAttitude) -> Quaternion {
    let (roll, pitch, yaw) = attitude.to_radians();
    let (sr, cr) = (roll / 2.).sin_cos();
    let (sp, cp) = (pitch / 2.).sin_cos();
    let (sy, cy) = (yaw / 2.).sin_cos();

    Quaternion {
        w: cr * cp * cy + sr * sp * sy,
        x: sr * cp * cy - cr * sp * sy,
        y: cr * sp * cy + sr * cp * sy,
        z: cr * cp * sy - sr * sp * cy,
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Quaternion {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        let same = |a: &Self, b: &Self| {
            a.w.abs_diff_eq(&b.w, epsilon)
                && a.x.abs_diff_eq(&b.x, epsilon)
                && a.y.abs_diff_eq(&b.y, epsilon)
                && a.z.abs_diff_eq(&b.z, epsilon)
        };
        same(self, other) || same(self, &-*other)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Quaternion {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let same = |a: &Self, b: &Self| {
            a.w.relative_eq(&b.w, epsilon, max_relative)
                && a.x.relative_eq(&b.x, epsilon, max_relative)
                && a.y.relative_eq(&b.y, epsilon, max_relative)
                && a.z.relative_eq(&b.z, epsilon, max_relative)
        };
        same(self, other) || same(self, &-*other)
    }
}

// angles are compared modulo a full turn, so a roll of 180° equals a roll of -180°
#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for EulerAttitude {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        BoundedAngle::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        BoundedAngle::new(self.roll).abs_diff_eq(&BoundedAngle::new(other.roll), epsilon)
            && BoundedAngle::new(self.pitch).abs_diff_eq(&BoundedAngle::new(other.pitch), epsilon)
            && BoundedAngle::new(self.yaw).abs_diff_eq(&BoundedAngle::new(other.yaw), epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for EulerAttitude {
    fn default_max_relative() -> Self::Epsilon {
        BoundedAngle::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let eq = |a: Angle, b: Angle| {
            BoundedAngle::new(a).relative_eq(&BoundedAngle::new(b), epsilon, max_relative)
        };
        eq(self.roll, other.roll) && eq(self.pitch, other.pitch) && eq(self.yaw, other.yaw)
    }
}

/// Marks that a partially-constructed [`EulerAttitude`] needs its roll angle next.
pub struct NeedsRoll;
/// Marks that a partially-constructed [`EulerAttitude`] needs its pitch angle next.
pub struct NeedsPitch;
/// Marks that a partially-constructed [`EulerAttitude`] needs its yaw angle next.
pub struct NeedsYaw;
/// Marks that all angles of a partially-constructed [`EulerAttitude`] are set.
pub struct Complete;

/// [Builder] for an [`EulerAttitude`] that takes the angles in the order they are applied.
///
/// Construct one through [`EulerAttitude::builder`], and finalize with [`Builder::build`].
/// Calling the setters out of order does not compile:
///
/// ```compile_fail
/// # use navframe::EulerAttitude;
/// # use uom::si::{f64::Angle, angle::degree};
/// let attitude = EulerAttitude::builder()
///     .pitch(Angle::new::<degree>(30.0))
///     .roll(Angle::new::<degree>(90.0))
///     .yaw(Angle::new::<degree>(0.0))
///     .build();
/// ```
///
/// [Builder]: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
#[must_use]
pub struct Builder<State> {
    under_construction: EulerAttitude,
    state: PhantomData<State>,
}

// manual impls of Clone and Copy to avoid requiring State: Copy + Clone
impl<State> Clone for Builder<State> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<State> Copy for Builder<State> {}

impl<State> fmt::Debug for Builder<State> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("under_construction", &self.under_construction)
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

impl Builder<NeedsRoll> {
    pub fn roll(mut self, angle: impl Into<Angle>) -> Builder<NeedsPitch> {
        self.under_construction.roll = angle.into();
        self.advance()
    }
}

impl Builder<NeedsPitch> {
    pub fn pitch(mut self, angle: impl Into<Angle>) -> Builder<NeedsYaw> {
        self.under_construction.pitch = angle.into();
        self.advance()
    }
}

impl Builder<NeedsYaw> {
    pub fn yaw(mut self, angle: impl Into<Angle>) -> Builder<Complete> {
        self.under_construction.yaw = angle.into();
        self.advance()
    }
}

impl Builder<Complete> {
    #[must_use]
    pub fn build(self) -> EulerAttitude {
        self.under_construction
    }
}
