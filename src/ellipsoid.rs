use crate::color::Color;
use crate::tuple::Tuple3D;
use crate::error::{ RenderError, Result };

/// Blinn-Phong reflectance of a surface.
///
/// Each coefficient is a per-channel reflectance in `[0, 1]`; `shininess` is
/// the specular exponent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub shininess: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            ambient: Color::rgb(0.1, 0.1, 0.1),
            diffuse: Color::rgb(0.6, 0.6, 0.6),
            specular: Color::rgb(0.3, 0.3, 0.3),
            shininess: 5.0,
        }
    }
}

impl Material {
    fn validate(&self) -> Result<()> {
        let channels = [
            ("ambient", &self.ambient),
            ("diffuse", &self.diffuse),
            ("specular", &self.specular),
        ];

        for (name, c) in channels.iter() {
            if !c.is_unit() {
                return Err(RenderError::DegenerateEllipsoid {
                    reason: format!("{} reflectance {:?} is outside [0, 1]",
                        name, [c.r, c.g, c.b]),
                });
            }
        }

        if !(self.shininess.is_finite() && self.shininess > 0.0) {
            return Err(RenderError::DegenerateEllipsoid {
                reason: format!("shininess {} is not a positive number",
                    self.shininess),
            });
        }

        Ok(())
    }
}

/// An axis-aligned ellipsoid.
///
/// The surface is every point `p` with
/// `((p.x-cx)/a)² + ((p.y-cy)/b)² + ((p.z-cz)/c)² = 1`. Fields are private so
/// that an `Ellipsoid` can only exist with strictly positive radii; use
/// `Ellipsoid::new` to build one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ellipsoid {
    center: Tuple3D,
    radii: Tuple3D,
    material: Material,
}

impl Ellipsoid {
    /// Creates an ellipsoid, rejecting zero, negative or non-finite radii and
    /// out-of-range material coefficients.
    ///
    /// ```
    /// # use ellipsoid_raycaster::tuple::Tuple3D;
    /// # use ellipsoid_raycaster::ellipsoid::{ Ellipsoid, Material };
    /// let ok = Ellipsoid::new(Tuple3D::zero(), Tuple3D::new(1.0, 2.0, 0.5),
    ///     Material::default());
    /// assert!(ok.is_ok());
    ///
    /// let flat = Ellipsoid::new(Tuple3D::zero(), Tuple3D::new(1.0, 0.0, 1.0),
    ///     Material::default());
    /// assert!(flat.is_err());
    /// ```
    pub fn new(center: Tuple3D, radii: Tuple3D, material: Material)
        -> Result<Ellipsoid> {
        if !center.is_finite() {
            return Err(RenderError::DegenerateEllipsoid {
                reason: format!("center {:?} is not finite", center),
            });
        }

        let positive = |r: f64| r.is_finite() && r > 0.0;
        if !(positive(radii.x) && positive(radii.y) && positive(radii.z)) {
            return Err(RenderError::DegenerateEllipsoid {
                reason: format!("radii ({}, {}, {}) must all be positive",
                    radii.x, radii.y, radii.z),
            });
        }

        material.validate()?;

        Ok(Ellipsoid { center, radii, material })
    }

    /// A sphere of radius `r` with the given material.
    pub fn sphere(center: Tuple3D, r: f64, material: Material)
        -> Result<Ellipsoid> {
        Ellipsoid::new(center, Tuple3D::new(r, r, r), material)
    }

    pub fn center(&self) -> Tuple3D {
        self.center
    }

    /// The semi-axis lengths `(a, b, c)` along x, y and z.
    pub fn radii(&self) -> Tuple3D {
        self.radii
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// The unit outward normal at a point on the surface.
    ///
    /// This is the normalized gradient of the implicit function,
    /// `(2(x-cx)/a², 2(y-cy)/b², 2(z-cz)/c²)`. Returns `None` at the center,
    /// where the gradient vanishes.
    pub fn normal_at(&self, point: Tuple3D) -> Option<Tuple3D> {
        let offset = point - self.center;
        let r = self.radii;
        let radii_sq = Tuple3D::new(r.x * r.x, r.y * r.y, r.z * r.z);

        (2.0 * (offset / radii_sq)).try_normalize()
    }
}

#[test]
fn rejects_non_positive_radii() {
    let m = Material::default();
    let center = Tuple3D::zero();

    assert!(Ellipsoid::new(center, Tuple3D::new(0.0, 1.0, 1.0), m).is_err());
    assert!(Ellipsoid::new(center, Tuple3D::new(1.0, -1.0, 1.0), m).is_err());
    assert!(Ellipsoid::new(center, Tuple3D::new(1.0, 1.0, f64::NAN), m).is_err());
    assert!(Ellipsoid::new(center, Tuple3D::new(1.0, 1.0, 1.0), m).is_ok());
}

#[test]
fn rejects_bad_material() {
    let radii = Tuple3D::new(1.0, 1.0, 1.0);
    let bright = Material { diffuse: Color::rgb(1.2, 0.0, 0.0), ..Default::default() };
    let dull = Material { shininess: 0.0, ..Default::default() };

    assert!(Ellipsoid::new(Tuple3D::zero(), radii, bright).is_err());
    assert!(Ellipsoid::new(Tuple3D::zero(), radii, dull).is_err());
}

#[test]
fn normal_on_sphere_axes() {
    let s = Ellipsoid::sphere(Tuple3D::new(1.0, 1.0, 1.0), 2.0,
        Material::default()).unwrap();

    assert_eq!(s.normal_at(Tuple3D::new(3.0, 1.0, 1.0)),
        Some(Tuple3D::new(1.0, 0.0, 0.0)));
    assert_eq!(s.normal_at(Tuple3D::new(1.0, -1.0, 1.0)),
        Some(Tuple3D::new(0.0, -1.0, 0.0)));
}

#[test]
fn normal_on_stretched_ellipsoid() {
    // x²/4 + y² = 1 at (√2, √2/2): gradient (√2/2, √2) normalizes to (1, 2)/√5
    let e = Ellipsoid::new(Tuple3D::zero(), Tuple3D::new(2.0, 1.0, 1.0),
        Material::default()).unwrap();
    let p = Tuple3D::new(2.0f64.sqrt(), 2.0f64.sqrt() / 2.0, 0.0);
    let expected = Tuple3D::new(1.0, 2.0, 0.0).normalize();

    assert_eq!(e.normal_at(p), Some(expected));
}

#[test]
fn normal_at_center_is_undefined() {
    let s = Ellipsoid::sphere(Tuple3D::zero(), 1.0, Material::default()).unwrap();

    assert_eq!(s.normal_at(Tuple3D::zero()), None);
}
