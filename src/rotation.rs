//! Composition of sequential axis rotations into a single rotation matrix.
//!
//! A [`RotationSequence`] is an ordered list of elementary rotations, each an [`Axis`] and an
//! angle. [`compose`] turns it into one [`RotationMatrix`] by premultiplying each elementary
//! matrix onto a running product that starts at the identity. For a sequence `[R1, R2, ..., Rn]`
//! the result is therefore `Rn · ... · R2 · R1`, which is to say the rotations are applied to a
//! vector in the order they were listed.
//!
//! Rotations in 3D do not commute, so the order of the sequence matters:
//!
//! ```
//! use navframe::{Axis, RotationSequence};
//! use approx::assert_relative_ne;
//!
//! let a = RotationSequence::from_degrees([(Axis::Roll, 25.), (Axis::Pitch, 75.), (Axis::Yaw, 90.)]);
//! let b = RotationSequence::from_degrees([(Axis::Pitch, 75.), (Axis::Roll, 25.), (Axis::Yaw, 90.)]);
//! assert_relative_ne!(a.compose(), b.compose(), epsilon = 1e-6);
//! ```

use nalgebra::Matrix3;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::Mul;
use uom::si::angle::{degree, radian};
use uom::si::f64::Angle;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The body axis an elementary rotation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Rotation about the x axis.
    Roll,
    /// Rotation about the y axis.
    Pitch,
    /// Rotation about the z axis.
    Yaw,
}

impl Axis {
    /// Returns the matrix rotating by `angle` about this axis.
    ///
    /// Positive angles follow the [right-hand rule][rhrot].
    ///
    /// [rhrot]: https://en.wikipedia.org/wiki/Right-hand_rule#Rotations
    #[must_use]
    pub fn elementary(self, angle: impl Into<Angle>) -> RotationMatrix {
        let (s, c) = angle.into().get::<radian>().sin_cos();
        #[rustfmt::skip]
        let inner = match self {
            Axis::Roll => Matrix3::new(
                1., 0., 0.,
                0., c, -s,
                0., s, c,
            ),
            Axis::Pitch => Matrix3::new(
                c, 0., s,
                0., 1., 0.,
                -s, 0., c,
            ),
            Axis::Yaw => Matrix3::new(
                c, -s, 0.,
                s, c, 0.,
                0., 0., 1.,
            ),
        };
        RotationMatrix { inner }
    }
}

/// An ordered sequence of elementary rotations.
///
/// The sequence is applied front to back; see the [module docs](self).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RotationSequence {
    steps: Vec<(Axis, Angle)>,
}

impl RotationSequence {
    /// Constructs an empty sequence, which composes to the identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a sequence from `(axis, angle in degrees)` pairs.
    #[must_use]
    pub fn from_degrees(steps: impl IntoIterator<Item = (Axis, f64)>) -> Self {
        steps
            .into_iter()
            .map(|(axis, degrees)| (axis, Angle::new::<degree>(degrees)))
            .collect()
    }

    /// Appends a rotation of `angle` about `axis`.
    #[must_use]
    pub fn then(mut self, axis: Axis, angle: impl Into<Angle>) -> Self {
        self.steps.push((axis, angle.into()));
        self
    }

    #[must_use]
    pub fn roll(self, angle: impl Into<Angle>) -> Self {
        self.then(Axis::Roll, angle)
    }

    #[must_use]
    pub fn pitch(self, angle: impl Into<Angle>) -> Self {
        self.then(Axis::Pitch, angle)
    }

    #[must_use]
    pub fn yaw(self, angle: impl Into<Angle>) -> Self {
        self.then(Axis::Yaw, angle)
    }

    /// Iterates over the rotations in the order they are applied.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (Axis, Angle)> + '_ {
        self.steps.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Composes the sequence into a single rotation matrix.
    ///
    /// See [`compose`].
    #[must_use]
    pub fn compose(&self) -> RotationMatrix {
        compose(self)
    }
}

impl FromIterator<(Axis, Angle)> for RotationSequence {
    fn from_iter<T: IntoIterator<Item = (Axis, Angle)>>(iter: T) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Axis, Angle)> for RotationSequence {
    fn extend<T: IntoIterator<Item = (Axis, Angle)>>(&mut self, iter: T) {
        self.steps.extend(iter);
    }
}

/// Composes `sequence` into a single rotation matrix.
///
/// Starting from the identity, each elementary rotation is premultiplied onto the running
/// product, so the result for `[R1, ..., Rn]` is `Rn · ... · R1`. An empty sequence yields the
/// identity exactly.
#[must_use]
pub fn compose(sequence: &RotationSequence) -> RotationMatrix {
    sequence
        .iter()
        .fold(RotationMatrix::identity(), |product, (axis, angle)| {
            axis.elementary(angle) * product
        })
}

/// A 3x3 orthonormal rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RotationMatrix {
    pub(crate) inner: Matrix3<f64>,
}

impl RotationMatrix {
    #[must_use]
    pub fn identity() -> Self {
        Self {
            inner: Matrix3::identity(),
        }
    }

    /// Equivalent to [`compose`].
    #[must_use]
    pub fn compose(sequence: &RotationSequence) -> Self {
        compose(sequence)
    }

    /// Returns the matrix as rows, ie `rows()[r][c]` is the element at row `r`, column `c`.
    #[must_use]
    pub fn rows(&self) -> [[f64; 3]; 3] {
        let m = &self.inner;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Returns the determinant, which is 1 up to floating point error for a rotation.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.inner.determinant()
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        Self {
            inner: self.inner.transpose(),
        }
    }

    /// Returns the rotation undoing this one.
    ///
    /// For an orthonormal matrix this is the transpose, so no actual inversion is performed.
    #[must_use]
    pub fn inverse(&self) -> Self {
        self.transpose()
    }

    /// Returns true if `M · Mᵀ` is the identity and `det(M)` is 1, both within `tolerance`.
    #[must_use]
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let should_be_identity = self.inner * self.inner.transpose();
        (should_be_identity - Matrix3::identity()).amax() <= tolerance
            && (self.determinant() - 1.).abs() <= tolerance
    }

    /// Rotates the vector `v`.
    #[must_use]
    pub fn rotate(&self, v: [f64; 3]) -> [f64; 3] {
        let rotated = self.inner * nalgebra::Vector3::from(v);
        [rotated.x, rotated.y, rotated.z]
    }

    /// Returns the underlying [`nalgebra`] matrix.
    #[must_use]
    pub fn to_nalgebra(&self) -> Matrix3<f64> {
        self.inner
    }
}

impl From<RotationMatrix> for Matrix3<f64> {
    fn from(rotation: RotationMatrix) -> Self {
        rotation.inner
    }
}

impl Display for RotationMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Rotation matrix: {}", self.inner)
    }
}

// `a * b` applies `b` first, then `a`.
impl Mul for RotationMatrix {
    type Output = RotationMatrix;

    fn mul(self, rhs: RotationMatrix) -> Self::Output {
        Self {
            inner: self.inner * rhs.inner,
        }
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for RotationMatrix {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        Matrix3::<f64>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for RotationMatrix {
    fn default_max_relative() -> Self::Epsilon {
        Matrix3::<f64>::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.inner.relative_eq(&other.inner, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::{compose, Axis, RotationMatrix, RotationSequence};
    use approx::{assert_abs_diff_eq, assert_relative_eq, assert_relative_ne};
    use quickcheck::{quickcheck, Arbitrary};
    use rstest::rstest;
    use uom::si::angle::degree;
    use uom::si::f64::Angle;

    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    fn matrix(rows: [[f64; 3]; 3]) -> RotationMatrix {
        #[rustfmt::skip]
        let inner = nalgebra::Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2],
            rows[1][0], rows[1][1], rows[1][2],
            rows[2][0], rows[2][1], rows[2][2],
        );
        RotationMatrix { inner }
    }

    impl Arbitrary for Axis {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            *g.choose(&[Axis::Roll, Axis::Pitch, Axis::Yaw])
                .expect("choices are non-empty")
        }
    }

    impl Arbitrary for RotationSequence {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            Vec::<(Axis, f64)>::arbitrary(g)
                .into_iter()
                .map(|(axis, degrees)| {
                    // quickcheck will give us awkward f64 values -- we map those to zero
                    let degrees = if degrees.is_normal() {
                        degrees.rem_euclid(720.) - 360.
                    } else {
                        0.
                    };
                    (axis, d(degrees))
                })
                .collect()
        }

        fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
            let steps: Vec<_> = self.iter().collect();
            Box::new((0..steps.len()).rev().map(move |n| {
                steps[..n].iter().copied().collect::<RotationSequence>()
            }))
        }
    }

    #[test]
    fn empty_sequence_is_exactly_identity() {
        assert_eq!(compose(&RotationSequence::new()), RotationMatrix::identity());
        assert!(RotationSequence::new().is_empty());
    }

    #[test]
    fn roll_pitch_yaw_matches_known_matrix() {
        let sequence = RotationSequence::from_degrees([
            (Axis::Roll, 25.),
            (Axis::Pitch, 75.),
            (Axis::Yaw, 90.),
        ]);
        let expected = matrix([
            [0., -0.906, 0.423],
            [0.259, 0.408, 0.875],
            [-0.966, 0.109, 0.235],
        ]);
        assert_abs_diff_eq!(sequence.compose(), expected, epsilon = 5e-4);
    }

    #[test]
    fn composition_is_order_sensitive() {
        let roll_first = RotationSequence::new().roll(d(25.)).pitch(d(75.)).yaw(d(90.));
        let pitch_first = RotationSequence::new().pitch(d(75.)).roll(d(25.)).yaw(d(90.));
        assert_relative_ne!(roll_first.compose(), pitch_first.compose(), epsilon = 1e-6);
    }

    #[test]
    fn later_rotations_are_premultiplied() {
        let sequence = RotationSequence::new().roll(d(10.)).pitch(d(20.)).yaw(d(30.));
        let expected = Axis::Yaw.elementary(d(30.))
            * Axis::Pitch.elementary(d(20.))
            * Axis::Roll.elementary(d(10.));
        assert_relative_eq!(sequence.compose(), expected);
        assert_relative_eq!(RotationMatrix::compose(&sequence), expected);
    }

    #[rstest]
    // Given as axis, angle, vector before, vector after
    #[case(Axis::Roll, 90., [0., 1., 0.], [0., 0., 1.])]
    #[case(Axis::Roll, 90., [0., 0., 1.], [0., -1., 0.])]
    #[case(Axis::Pitch, 90., [0., 0., 1.], [1., 0., 0.])]
    #[case(Axis::Pitch, 90., [1., 0., 0.], [0., 0., -1.])]
    #[case(Axis::Yaw, 90., [1., 0., 0.], [0., 1., 0.])]
    #[case(Axis::Yaw, -90., [1., 0., 0.], [0., -1., 0.])]
    #[case(Axis::Yaw, 360., [1., 0., 0.], [1., 0., 0.])]
    #[case(Axis::Roll, 180., [1., 2., 3.], [1., -2., -3.])]
    fn elementary_rotations_follow_right_hand_rule(
        #[case] axis: Axis,
        #[case] angle: f64,
        #[case] before: [f64; 3],
        #[case] after: [f64; 3],
    ) {
        let rotated = axis.elementary(d(angle)).rotate(before);
        for (got, want) in rotated.iter().zip(after) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn inverse_undoes_rotation() {
        let rotation = RotationSequence::new().yaw(d(90.)).roll(d(25.)).pitch(d(75.)).compose();
        assert_relative_eq!(
            rotation * rotation.inverse(),
            RotationMatrix::identity(),
            epsilon = 1e-12
        );

        let v = [0.3, -1.2, 4.];
        let round_tripped = rotation.inverse().rotate(rotation.rotate(v));
        for (got, want) in round_tripped.iter().zip(v) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn rows_are_row_major() {
        let rows = Axis::Yaw.elementary(d(30.)).rows();
        assert_relative_eq!(rows[0][1], -0.5, epsilon = 1e-12);
        assert_relative_eq!(rows[1][0], 0.5, epsilon = 1e-12);
        assert_eq!(rows[2], [0., 0., 1.]);
    }

    #[test]
    fn sequence_collects_and_extends_in_order() {
        let mut sequence: RotationSequence = [(Axis::Roll, d(1.)), (Axis::Pitch, d(2.))]
            .into_iter()
            .collect();
        sequence.extend([(Axis::Yaw, d(3.))]);
        let axes: Vec<_> = sequence.iter().map(|(axis, _)| axis).collect();
        assert_eq!(axes, [Axis::Roll, Axis::Pitch, Axis::Yaw]);
        assert_eq!(sequence.len(), 3);
    }

    #[test]
    #[cfg(feature = "serde")]
    fn sequence_serde() {
        let sequence = RotationSequence::from_degrees([(Axis::Pitch, 75.), (Axis::Roll, 25.)]);
        let ser = serde_yaml::to_string(&sequence).unwrap();
        let de: RotationSequence = serde_yaml::from_str(&ser).unwrap();
        assert_relative_eq!(de.compose(), sequence.compose());
    }

    quickcheck! {
        fn composed_matrices_are_orthonormal(sequence: RotationSequence) -> bool {
            sequence.compose().is_orthonormal(1e-6)
        }
    }
}
