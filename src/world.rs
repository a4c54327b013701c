use crate::ray::Ray3D;
use crate::color::Color;
use crate::ellipsoid::Ellipsoid;
use crate::intersect::{ Hit, select_nearest };
use crate::light::{ PointLight, DotProductPolicy, lighting };

/// A world with ellipsoids and a light.
///
/// The ellipsoid list is read-only while rendering. Its order matters: when
/// two ellipsoids are hit at exactly the same distance, the earlier one is
/// the one seen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct World {
    pub ellipsoids: Vec<Ellipsoid>,
    pub light_source: PointLight,
    pub policy: DotProductPolicy,
}

impl World {
    /// Creates a world with the default shading policy.
    pub fn new(ellipsoids: Vec<Ellipsoid>, light_source: PointLight) -> World {
        World { ellipsoids, light_source, policy: Default::default() }
    }

    /// Creates an empty world with no objects and the default light source.
    pub fn empty() -> World {
        Default::default()
    }

    /// The nearest ellipsoid in front of the ray origin, if any.
    pub fn hit(&self, r: &Ray3D) -> Option<Hit<'_>> {
        select_nearest(&self.ellipsoids, r)
    }

    /// Calculates the color for a hit, seen from `eye`.
    pub fn shade_hit(&self, hit: &Hit<'_>, r: &Ray3D) -> Color {
        lighting(hit.what, hit.point, r.origin, &self.light_source, self.policy)
    }

    /// The shaded color seen along a ray, or `None` if it hits nothing.
    ///
    /// The ray origin is taken as the eye position.
    pub fn color_at(&self, r: &Ray3D) -> Option<Color> {
        self.hit(r).map(|hit| self.shade_hit(&hit, r))
    }
}

#[cfg(test)]
fn two_ball_world() -> World {
    use crate::tuple::Tuple3D;
    use crate::ellipsoid::Material;

    let green = Material {
        ambient: Color::rgb(0.0, 0.2, 0.0),
        diffuse: Color::rgb(0.0, 0.5, 0.0),
        specular: Color::black(),
        shininess: 1.0,
    };
    let blue = Material {
        ambient: Color::rgb(0.0, 0.0, 0.2),
        diffuse: Color::rgb(0.0, 0.0, 0.5),
        specular: Color::black(),
        shininess: 1.0,
    };

    let near = Ellipsoid::sphere(Tuple3D::new(0.0, 0.0, 0.0), 1.0, green)
        .unwrap();
    let far = Ellipsoid::new(Tuple3D::new(0.0, 0.0, 5.0),
        Tuple3D::new(3.0, 3.0, 1.0), blue).unwrap();

    World::new(vec![far, near],
        PointLight::new(Tuple3D::new(0.0, 0.0, -10.0)))
}

#[test]
fn color_ray_miss() {
    use crate::tuple::Tuple3D;

    let w = two_ball_world();
    let r = Ray3D::new(
        Tuple3D::new(0.0, 0.0, -5.0),
        Tuple3D::new(0.0, 1.0, 0.0),
    );

    assert_eq!(w.color_at(&r), None);
}

#[test]
fn color_ray_hit_nearest() {
    use crate::tuple::Tuple3D;

    let w = two_ball_world();
    let r = Ray3D::new(
        Tuple3D::new(0.0, 0.0, -5.0),
        Tuple3D::new(0.0, 0.0, 1.0),
    );

    let hit = w.hit(&r).unwrap();
    assert!(std::ptr::eq(hit.what, &w.ellipsoids[1]));

    // Facing both eye and light head-on: ambient + full diffuse
    assert_eq!(w.color_at(&r), Some(Color::rgb(0.0, 0.7, 0.0)));
}

#[test]
fn color_ray_hit_behind_near_ball() {
    use crate::tuple::Tuple3D;

    let w = two_ball_world();
    let r = Ray3D::new(
        Tuple3D::new(2.0, 0.0, -5.0),
        Tuple3D::new(0.0, 0.0, 1.0),
    );

    let hit = w.hit(&r).unwrap();
    assert!(std::ptr::eq(hit.what, &w.ellipsoids[0]));
    assert!(w.color_at(&r).unwrap().b > 0.2);
}

#[test]
fn empty_world_sees_nothing() {
    use crate::tuple::Tuple3D;

    let w = World::empty();
    let r = Ray3D::new(Tuple3D::zero(), Tuple3D::new(0.0, 0.0, 1.0));

    assert_eq!(w.color_at(&r), None);
}
