use std::ops::{ Add, Sub, Neg, Mul, Div };

use serde::{ Serialize, Deserialize };

use crate::feq;

/// A point or direction in 3D space.
///
/// Values are immutable in practice; every operation returns a new tuple.
/// Equality is approximate, using the crate-wide epsilon.
#[derive(Debug, Default, Copy, Clone, PartialOrd, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Tuple3D {
    pub x: f64,
    pub y: f64,
    pub z: f64
}

impl PartialEq for Tuple3D {
    fn eq(&self, other: &Tuple3D) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z)
    }
}

impl From<[f64; 3]> for Tuple3D {
    fn from(v: [f64; 3]) -> Tuple3D {
        Tuple3D { x: v[0], y: v[1], z: v[2] }
    }
}

impl From<Tuple3D> for [f64; 3] {
    fn from(t: Tuple3D) -> [f64; 3] {
        [t.x, t.y, t.z]
    }
}

impl Tuple3D {
    pub fn new(x: f64, y: f64, z: f64) -> Tuple3D {
        Tuple3D { x, y, z }
    }

    pub fn zero() -> Tuple3D {
        Tuple3D { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Scales the tuple to unit length.
    ///
    /// The result is meaningless (all NaN) for a zero-length tuple. Callers
    /// that cannot rule that out should use `try_normalize`.
    pub fn normalize(&self) -> Tuple3D {
        let mag = self.magnitude();

        Tuple3D {
            x: self.x * (1.0 / mag),
            y: self.y * (1.0 / mag),
            z: self.z * (1.0 / mag),
        }
    }

    /// Scales the tuple to unit length, or returns `None` when it has no
    /// usable direction (zero or non-finite magnitude).
    ///
    /// ```
    /// # use ellipsoid_raycaster::tuple::Tuple3D;
    /// assert!(Tuple3D::zero().try_normalize().is_none());
    /// assert_eq!(Tuple3D::new(0.0, 3.0, 0.0).try_normalize(),
    ///     Some(Tuple3D::new(0.0, 1.0, 0.0)));
    /// ```
    pub fn try_normalize(&self) -> Option<Tuple3D> {
        let mag = self.magnitude();
        if mag == 0.0 || !mag.is_finite() {
            return None;
        }

        Some(self.normalize())
    }

    pub fn dot(&self, other: &Tuple3D) -> f64 {
        self.x * other.x
            + self.y * other.y
            + self.z * other.z
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Tuple3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Tuple3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Tuple3D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Mul<f64> for Tuple3D {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other,
        }
    }
}

impl Mul<Tuple3D> for f64 {
    type Output = Tuple3D;

    fn mul(self, other: Tuple3D) -> Tuple3D {
        other * self
    }
}

/// Divides two tuples component by component.
///
/// This is how a point is carried into an ellipsoid's unit-sphere space:
/// dividing by the radii `(a, b, c)` squashes each axis independently.
///
/// ```
/// # use ellipsoid_raycaster::tuple::Tuple3D;
/// let p = Tuple3D::new(2.0, 3.0, 8.0);
/// let radii = Tuple3D::new(2.0, 1.5, 4.0);
/// assert_eq!(p / radii, Tuple3D::new(1.0, 2.0, 2.0));
/// ```
impl Div<Tuple3D> for Tuple3D {
    type Output = Self;

    fn div(self, other: Tuple3D) -> Self {
        Self {
            x: self.x / other.x,
            y: self.y / other.y,
            z: self.z / other.z,
        }
    }
}

/* Tests */

#[test]
fn add_tuples() {
    let a1 = Tuple3D::new(3.0, -2.0, 5.0);
    let a2 = Tuple3D::new(-2.0, 3.0, 1.0);

    assert_eq!(a1 + a2, Tuple3D::new(1.0, 1.0, 6.0));
}

#[test]
fn sub_tuples() {
    let p1 = Tuple3D::new(3.0, 2.0, 1.0);
    let p2 = Tuple3D::new(5.0, 6.0, 7.0);

    assert_eq!(p1 - p2, Tuple3D::new(-2.0, -4.0, -6.0));
}

#[test]
fn neg_tuple() {
    let a = Tuple3D::new(1.0, -2.0, 3.0);

    assert_eq!(-a, Tuple3D::new(-1.0, 2.0, -3.0));
}

#[test]
fn mul_scalar_both_sides() {
    let a = Tuple3D::new(1.0, -2.0, 3.0);

    assert_eq!(a * 3.5, Tuple3D::new(3.5, -7.0, 10.5));
    assert_eq!(0.5 * a, Tuple3D::new(0.5, -1.0, 1.5));
}

#[test]
fn div_componentwise() {
    let a = Tuple3D::new(1.0, -2.0, 3.0);
    let radii = Tuple3D::new(0.5, 2.0, 3.0);

    assert_eq!(a / radii, Tuple3D::new(2.0, -1.0, 1.0));
}

#[test]
fn magnitude_neg() {
    let v = Tuple3D::new(-1.0, -2.0, -3.0);

    assert_eq!(v.magnitude(), f64::sqrt(14.0));
}

#[test]
fn normalize_dirty() {
    let v = Tuple3D::new(1.0, 2.0, 3.0);
    let e = Tuple3D::new(
        1.0 / f64::sqrt(14.0),
        2.0 / f64::sqrt(14.0),
        3.0 / f64::sqrt(14.0)
    );

    assert_eq!(v.normalize(), e);
    assert!(feq(v.normalize().magnitude(), 1.0));
}

#[test]
fn normalize_is_idempotent() {
    let vs = [
        Tuple3D::new(1.0, 2.0, 3.0),
        Tuple3D::new(-0.001, 0.0, 0.002),
        Tuple3D::new(1e6, -3e5, 42.0),
        Tuple3D::new(0.0, 0.0, -7.0),
    ];

    for v in vs.iter() {
        let once = v.normalize();
        assert_eq!(once.normalize(), once);
    }
}

#[test]
fn zero_vector_has_no_direction() {
    assert!(Tuple3D::zero().try_normalize().is_none());
    assert!(Tuple3D::new(f64::NAN, 0.0, 1.0).try_normalize().is_none());
}

#[test]
fn dot_tuples() {
    let a = Tuple3D::new(1.0, 2.0, 3.0);
    let b = Tuple3D::new(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
}

#[test]
fn json_array_form() {
    let t: Tuple3D = serde_json::from_str("[0.5, -1.0, 2.0]").unwrap();

    assert_eq!(t, Tuple3D::new(0.5, -1.0, 2.0));
    assert_eq!(serde_json::to_string(&t).unwrap(), "[0.5,-1.0,2.0]");
}
