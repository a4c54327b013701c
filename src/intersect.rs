use log::trace;

use crate::tuple::Tuple3D;
use crate::ray::Ray3D;
use crate::ellipsoid::Ellipsoid;

/// The real roots of a quadratic `a·t² + b·t + c = 0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Roots {
    None,
    One(f64),
    /// Two distinct roots, smaller first.
    Two(f64, f64),
}

/// Solves `a·t² + b·t + c = 0` over the reals.
///
/// A zero or non-finite leading coefficient has no usable solution here and
/// yields `Roots::None`, as does a negative discriminant.
///
/// ```
/// # use ellipsoid_raycaster::intersect::{ Roots, solve_quadratic };
/// assert_eq!(solve_quadratic(1.0, -3.0, 2.0), Roots::Two(1.0, 2.0));
/// assert_eq!(solve_quadratic(1.0, -2.0, 1.0), Roots::One(1.0));
/// assert_eq!(solve_quadratic(1.0, 0.0, 1.0), Roots::None);
/// assert_eq!(solve_quadratic(0.0, 1.0, 1.0), Roots::None);
/// ```
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    if a == 0.0 || !a.is_finite() {
        return Roots::None;
    }

    let discriminant = b.powi(2) - (4.0 * a * c);

    if discriminant.is_nan() || discriminant < 0.0 {
        Roots::None
    } else if discriminant == 0.0 {
        Roots::One(-b / (2.0 * a))
    } else {
        let t1 = (-b - discriminant.sqrt()) / (2.0 * a);
        let t2 = (-b + discriminant.sqrt()) / (2.0 * a);

        // `a` is positive for every ray/ellipsoid pair, but keep the order
        // honest for callers passing arbitrary coefficients.
        if t1 <= t2 { Roots::Two(t1, t2) } else { Roots::Two(t2, t1) }
    }
}

impl Roots {
    /// The nearest root strictly in front of the ray origin.
    ///
    /// Roots at or behind the origin (`t <= 0`) are never selected.
    pub fn nearest_positive(&self) -> Option<f64> {
        match *self {
            Roots::None => None,
            Roots::One(t) => Some(t).filter(|t| *t > 0.0),
            Roots::Two(t1, t2) => {
                if t1 > 0.0 {
                    Some(t1)
                } else if t2 > 0.0 {
                    Some(t2)
                } else {
                    None
                }
            },
        }
    }
}

/// A ray striking an ellipsoid.
///
/// `t` is the ray parameter of the hit; it is only meaningful for comparing
/// hits along the same ray.
#[derive(Copy, Clone, Debug)]
pub struct Hit<'a> {
    pub t: f64,
    pub point: Tuple3D,
    pub what: &'a Ellipsoid,
}

/// Two hits are equal if they have the same `t` and refer to the very same
/// ellipsoid (pointer equality, not value equality).
impl<'a> PartialEq for Hit<'a> {
    fn eq(&self, other: &Hit<'a>) -> bool {
        self.t == other.t && std::ptr::eq(self.what, other.what)
    }
}

/// Intersects a ray with an ellipsoid.
///
/// The ray is carried into the ellipsoid's unit-sphere space by dividing
/// everything by the radii, which turns the implicit surface equation into a
/// quadratic in `t`:
///
/// ```text
/// A = (D/r)·(D/r)
/// B = 2 (D/r)·((E-C)/r)
/// C = ((E-C)/r)·((E-C)/r) - 1
/// ```
///
/// Returns the nearest hit with `t > 0`, or `None` if the ray misses, the
/// surface is entirely behind the origin, or the ray direction is degenerate.
pub fn intersect<'a>(e: &'a Ellipsoid, r: &Ray3D) -> Option<Hit<'a>> {
    let radii = e.radii();
    let d = r.direction / radii;
    let to_origin = (r.origin - e.center()) / radii;

    let a = d.dot(&d);
    let b = 2.0 * d.dot(&to_origin);
    let c = to_origin.dot(&to_origin) - 1.0;

    if a == 0.0 {
        trace!("degenerate ray direction {:?}, treating as a miss", r.direction);
        return None;
    }

    let t = solve_quadratic(a, b, c).nearest_positive()?;
    Some(Hit { t, point: r.position(t), what: e })
}

/// Finds the nearest hit of a ray over a list of ellipsoids.
///
/// Ellipsoids are tested in list order. On an exact tie in `t` the earlier
/// ellipsoid wins.
pub fn select_nearest<'a>(ellipsoids: &'a [Ellipsoid], r: &Ray3D)
    -> Option<Hit<'a>> {
    let mut nearest: Option<Hit<'a>> = None;

    for e in ellipsoids.iter() {
        if let Some(hit) = intersect(e, r) {
            if nearest.map_or(true, |best| hit.t < best.t) {
                nearest = Some(hit);
            }
        }
    }

    nearest
}

#[cfg(test)]
fn unit_sphere_at(center: Tuple3D) -> Ellipsoid {
    Ellipsoid::sphere(center, 1.0, Default::default()).unwrap()
}

#[test]
fn ray_through_sphere_center() {
    let s = unit_sphere_at(Tuple3D::zero());
    let r = Ray3D::new(
        Tuple3D::new(0.0, 0.0, -5.0),
        Tuple3D::new(0.0, 0.0, 1.0)
    );

    // roots are 4 and 6, symmetric about the center distance of 5
    assert_eq!(solve_quadratic(1.0, -10.0, 24.0), Roots::Two(4.0, 6.0));

    let hit = intersect(&s, &r).unwrap();
    assert_eq!(hit.t, 4.0);
    assert_eq!(hit.point, Tuple3D::new(0.0, 0.0, -1.0));
}

#[test]
fn ray_is_tangent_to_sphere() {
    let s = unit_sphere_at(Tuple3D::zero());
    let r = Ray3D::new(
        Tuple3D::new(0.0, 1.0, -5.0),
        Tuple3D::new(0.0, 0.0, 1.0)
    );

    let hit = intersect(&s, &r).unwrap();
    assert_eq!(hit.t, 5.0);
    assert_eq!(hit.point, Tuple3D::new(0.0, 1.0, 0.0));
}

#[test]
fn ray_misses_sphere() {
    let s = unit_sphere_at(Tuple3D::zero());
    let r = Ray3D::new(
        Tuple3D::new(0.0, 2.0, -5.0),
        Tuple3D::new(0.0, 0.0, 1.0)
    );

    assert_eq!(intersect(&s, &r), None);
    assert_eq!(select_nearest(&[s], &r), None);
}

#[test]
fn ray_is_inside_sphere() {
    let s = unit_sphere_at(Tuple3D::zero());
    let r = Ray3D::new(
        Tuple3D::new(0.0, 0.0, 0.0),
        Tuple3D::new(0.0, 0.0, 1.0)
    );

    // roots are -1 and 1; only the one in front counts
    let hit = intersect(&s, &r).unwrap();
    assert_eq!(hit.t, 1.0);
    assert_eq!(hit.point, Tuple3D::new(0.0, 0.0, 1.0));
}

#[test]
fn sphere_is_behind_ray() {
    let s = unit_sphere_at(Tuple3D::zero());
    let r = Ray3D::new(
        Tuple3D::new(0.0, 0.0, 5.0),
        Tuple3D::new(0.0, 0.0, 1.0)
    );

    assert_eq!(intersect(&s, &r), None);
}

#[test]
fn origin_on_surface_is_not_a_hit() {
    let s = unit_sphere_at(Tuple3D::zero());
    let r = Ray3D::new(
        Tuple3D::new(0.0, 0.0, 1.0),
        Tuple3D::new(0.0, 0.0, 1.0)
    );

    // roots are -2 and 0
    assert_eq!(intersect(&s, &r), None);
}

#[test]
fn zero_direction_is_a_miss() {
    let s = unit_sphere_at(Tuple3D::zero());
    let r = Ray3D::new(Tuple3D::new(0.0, 0.0, -5.0), Tuple3D::zero());

    assert_eq!(intersect(&s, &r), None);
}

#[test]
fn unnormalized_direction_scales_t() {
    let s = unit_sphere_at(Tuple3D::zero());
    let r = Ray3D::new(
        Tuple3D::new(0.0, 0.0, -5.0),
        Tuple3D::new(0.0, 0.0, 2.0)
    );

    let hit = intersect(&s, &r).unwrap();
    assert_eq!(hit.t, 2.0);
    assert_eq!(hit.point, Tuple3D::new(0.0, 0.0, -1.0));
}

#[test]
fn ray_hits_stretched_ellipsoid() {
    let e = Ellipsoid::new(Tuple3D::new(1.0, 0.0, 0.0),
        Tuple3D::new(3.0, 0.5, 1.0), Default::default()).unwrap();
    let r = Ray3D::new(
        Tuple3D::new(-5.0, 0.0, 0.0),
        Tuple3D::new(1.0, 0.0, 0.0)
    );

    let hit = intersect(&e, &r).unwrap();
    assert!(crate::feq(hit.t, 3.0));
    assert_eq!(hit.point, Tuple3D::new(-2.0, 0.0, 0.0));

    // thin along y, so a ray offset by 0.6 in y passes above it
    let above = Ray3D::new(
        Tuple3D::new(-5.0, 0.6, 0.0),
        Tuple3D::new(1.0, 0.0, 0.0)
    );
    assert_eq!(intersect(&e, &above), None);
}

#[test]
fn nearest_of_several() {
    let far = unit_sphere_at(Tuple3D::new(0.0, 0.0, 10.0));
    let near = unit_sphere_at(Tuple3D::new(0.0, 0.0, 3.0));
    let behind = unit_sphere_at(Tuple3D::new(0.0, 0.0, -10.0));
    let scene = [far, behind, near];

    let r = Ray3D::new(Tuple3D::zero(), Tuple3D::new(0.0, 0.0, 1.0));
    let hit = select_nearest(&scene, &r).unwrap();

    assert!(std::ptr::eq(hit.what, &scene[2]));
    assert_eq!(hit.t, 2.0);
}

#[test]
fn nearest_tie_keeps_first() {
    let first = Ellipsoid::sphere(Tuple3D::new(0.0, 0.0, 5.0), 1.0,
        Default::default()).unwrap();
    let second = first;
    let scene = [first, second];

    let r = Ray3D::new(Tuple3D::zero(), Tuple3D::new(0.0, 0.0, 1.0));
    let hit = select_nearest(&scene, &r).unwrap();

    assert_eq!(hit, Hit { t: 4.0, point: hit.point, what: &scene[0] });
    assert!(!std::ptr::eq(hit.what, &scene[1]));
}

#[test]
fn nearest_in_empty_scene() {
    let r = Ray3D::new(Tuple3D::zero(), Tuple3D::new(0.0, 0.0, 1.0));

    assert_eq!(select_nearest(&[], &r), None);
}
