use crate::color::Color;
use crate::tuple::Tuple3D;
use crate::ellipsoid::Ellipsoid;

/// A point light.
///
/// A single position radiating light, with separate scalar intensities for
/// the ambient, diffuse and specular terms.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: Tuple3D,
    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
}

impl Default for PointLight {
    fn default() -> PointLight {
        PointLight::new(crate::consts::DEFAULT_LIGHT)
    }
}

impl PointLight {
    /// Creates a point light with all three intensities at 1.
    pub fn new(position: Tuple3D) -> PointLight {
        PointLight { position, ambient: 1.0, diffuse: 1.0, specular: 1.0 }
    }
}

/// How the diffuse and specular dot products are treated before use.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DotProductPolicy {
    /// `N·L` and `N·H` are floored at 0, so surfaces facing away from the
    /// light receive ambient light only.
    Floored,

    /// The dot products are used as computed. A surface facing away from the
    /// light subtracts its diffuse term, and a negative `N·H` under a
    /// fractional exponent produces NaN, which clamps to 0.
    Raw,
}

impl Default for DotProductPolicy {
    fn default() -> DotProductPolicy {
        DotProductPolicy::Floored
    }
}

impl DotProductPolicy {
    fn apply(&self, dot: f64) -> f64 {
        match self {
            DotProductPolicy::Floored => dot.max(0.0),
            DotProductPolicy::Raw => dot,
        }
    }
}

/// Computes the Blinn-Phong color of a point on an ellipsoid.
///
/// For each channel:
///
/// ```text
/// ambient·Ia + diffuse·Id·(N·L) + specular·Is·(N·H)^n
/// ```
///
/// where `N` is the surface normal, `L` points at the light, `V` points at
/// the eye and `H` is the half vector `normalize(L + V)`. The sum is clamped
/// to `[0, 1]` per channel.
///
/// Any vector that cannot be normalized (the point sits on the light, the
/// eye, or the light and eye are exactly opposite) drops the terms that need
/// it rather than producing NaN.
pub fn lighting(e: &Ellipsoid, point: Tuple3D, eye: Tuple3D,
    light: &PointLight, policy: DotProductPolicy) -> Color {
    let m = e.material();

    // Ambient light reaches every point regardless of orientation
    let mut color = m.ambient * light.ambient;

    let normalv = match e.normal_at(point) {
        Some(n) => n,
        None => return color.clamp(),
    };

    let lightv = (light.position - point).try_normalize();
    let eyev = (eye - point).try_normalize();

    if let Some(lightv) = lightv {
        let light_dot_normal = policy.apply(normalv.dot(&lightv));
        color = color + m.diffuse * (light.diffuse * light_dot_normal);

        // The half vector vanishes when the eye looks straight back along
        // the light direction from the far side
        let halfv = eyev.and_then(|eyev| (lightv + eyev).try_normalize());
        if let Some(halfv) = halfv {
            let half_dot_normal = policy.apply(normalv.dot(&halfv));
            let factor = half_dot_normal.powf(m.shininess);
            color = color + m.specular * (light.specular * factor);
        }
    }

    color.clamp()
}

#[cfg(test)]
fn test_sphere(ambient: Color, diffuse: Color, specular: Color, shininess: f64)
    -> Ellipsoid {
    use crate::ellipsoid::Material;

    let m = Material { ambient, diffuse, specular, shininess };
    Ellipsoid::sphere(Tuple3D::zero(), 1.0, m).unwrap()
}

#[test]
fn eye_and_light_straight_ahead() {
    let s = test_sphere(
        Color::rgb(0.1, 0.0, 0.0),
        Color::rgb(0.5, 0.2, 0.0),
        Color::rgb(0.2, 0.2, 0.2),
        20.0,
    );
    let point = Tuple3D::new(0.0, 0.0, -1.0);
    let eye = Tuple3D::new(0.0, 0.0, -5.0);
    let light = PointLight::new(Tuple3D::new(0.0, 0.0, -5.0));

    let res = lighting(&s, point, eye, &light, DotProductPolicy::Floored);
    assert_eq!(res, Color::rgb(0.8, 0.4, 0.2));
}

#[test]
fn light_above_at_45_degrees() {
    let s = test_sphere(
        Color::black(),
        Color::rgb(1.0, 0.0, 0.0),
        Color::rgb(0.0, 0.0, 1.0),
        2.0,
    );
    let point = Tuple3D::new(0.0, 0.0, -1.0);
    let eye = Tuple3D::new(0.0, 0.0, -5.0);
    let light = PointLight::new(Tuple3D::new(0.0, 4.0, -5.0));

    // N·L = cos 45°, N·H = cos 22.5°
    let res = lighting(&s, point, eye, &light, DotProductPolicy::Floored);
    assert_eq!(res, Color::rgb(0.70711, 0.0, 0.85355));
}

#[test]
fn light_intensities_scale_terms() {
    let s = test_sphere(
        Color::rgb(0.2, 0.0, 0.0),
        Color::rgb(0.0, 0.4, 0.0),
        Color::rgb(0.0, 0.0, 0.4),
        1.0,
    );
    let point = Tuple3D::new(0.0, 0.0, -1.0);
    let eye = Tuple3D::new(0.0, 0.0, -5.0);
    let light = PointLight {
        position: Tuple3D::new(0.0, 0.0, -5.0),
        ambient: 0.5,
        diffuse: 2.0,
        specular: 0.0,
    };

    let res = lighting(&s, point, eye, &light, DotProductPolicy::Floored);
    assert_eq!(res, Color::rgb(0.1, 0.8, 0.0));
}

#[test]
fn light_behind_surface_floored() {
    let s = test_sphere(
        Color::rgb(0.5, 0.5, 0.5),
        Color::rgb(0.2, 0.2, 0.2),
        Color::rgb(1.0, 1.0, 1.0),
        10.0,
    );
    let point = Tuple3D::new(0.0, 0.0, -1.0);
    let eye = Tuple3D::new(0.0, 0.0, -5.0);
    let light = PointLight::new(Tuple3D::new(0.0, 0.0, 5.0));

    let res = lighting(&s, point, eye, &light, DotProductPolicy::Floored);
    assert_eq!(res, Color::rgb(0.5, 0.5, 0.5));
}

#[test]
fn light_behind_surface_raw() {
    let s = test_sphere(
        Color::rgb(0.5, 0.5, 0.5),
        Color::rgb(0.2, 0.2, 0.2),
        Color::rgb(1.0, 1.0, 1.0),
        10.0,
    );
    let point = Tuple3D::new(0.0, 0.0, -1.0);
    let eye = Tuple3D::new(0.0, 0.0, -5.0);
    let light = PointLight::new(Tuple3D::new(0.0, 0.0, 5.0));

    // The unfloored diffuse term darkens the surface below its ambient level
    let res = lighting(&s, point, eye, &light, DotProductPolicy::Raw);
    assert_eq!(res, Color::rgb(0.3, 0.3, 0.3));
}

#[test]
fn fractional_exponent_with_negative_half_dot() {
    let s = test_sphere(
        Color::rgb(0.2, 0.2, 0.2),
        Color::black(),
        Color::rgb(1.0, 1.0, 1.0),
        2.5,
    );
    // Viewed and lit from inside, through the back of the surface
    let point = Tuple3D::new(0.0, 0.0, -1.0);
    let eye = Tuple3D::new(0.0, 0.0, 5.0);
    let light = PointLight::new(Tuple3D::new(0.0, 0.0, 5.0));

    let floored = lighting(&s, point, eye, &light, DotProductPolicy::Floored);
    let raw = lighting(&s, point, eye, &light, DotProductPolicy::Raw);

    assert_eq!(floored, Color::rgb(0.2, 0.2, 0.2));
    assert_eq!(raw, Color::black());
}

#[test]
fn shading_always_clamped() {
    let s = test_sphere(
        Color::white(),
        Color::white(),
        Color::white(),
        0.5,
    );
    let positions = [
        Tuple3D::new(0.0, 0.0, -5.0),
        Tuple3D::new(0.0, 0.0, 5.0),
        Tuple3D::new(3.0, -2.0, 1.0),
        Tuple3D::new(0.0, 0.0, -1.0),
    ];

    for &eye in positions.iter() {
        for &light_pos in positions.iter() {
            for &intensity in [-10.0, 0.0, 1.0, 1e6].iter() {
                let light = PointLight {
                    position: light_pos,
                    ambient: intensity,
                    diffuse: intensity,
                    specular: intensity,
                };

                for &policy in [DotProductPolicy::Floored,
                    DotProductPolicy::Raw].iter() {
                    let c = lighting(&s, Tuple3D::new(0.0, 0.0, -1.0), eye,
                        &light, policy);
                    assert!(c.is_unit(), "{:?} escaped [0, 1]", c);
                }
            }
        }
    }
}
