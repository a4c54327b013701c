use std::sync::Arc;
use std::sync::atomic::{ AtomicBool, Ordering };

use log::{ debug, warn };
use serde::{ Serialize, Deserialize };

use crate::ray::Ray3D;
use crate::tuple::Tuple3D;
use crate::color::Rgba;
use crate::world::World;
use crate::light::PointLight;
use crate::canvas::{ Canvas, PixelSink };
use crate::error::{ RenderError, Result };
use crate::consts::{ DEFAULT_EYE, DEFAULT_LIGHT };

/// Eye and light placement, as read from a view configuration file.
///
/// Every field is optional in JSON; missing ones take their defaults. The
/// light intensities are also accepted in camelCase (`lightAmbient` and so
/// on). Unknown fields are rejected.
///
/// ```
/// # use ellipsoid_raycaster::camera::ViewConfig;
/// # use ellipsoid_raycaster::tuple::Tuple3D;
/// let view: ViewConfig = serde_json::from_str(r#"{ "eye": [0, 0, -2] }"#)
///     .unwrap();
/// assert_eq!(view.eye, Tuple3D::new(0.0, 0.0, -2.0));
/// assert_eq!(view.light_diffuse, 1.0);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub eye: Tuple3D,
    pub light: Tuple3D,

    #[serde(alias = "lightAmbient")]
    pub light_ambient: f64,

    #[serde(alias = "lightDiffuse")]
    pub light_diffuse: f64,

    #[serde(alias = "lightSpecular")]
    pub light_specular: f64,
}

impl Default for ViewConfig {
    fn default() -> ViewConfig {
        ViewConfig {
            eye: DEFAULT_EYE,
            light: DEFAULT_LIGHT,
            light_ambient: 1.0,
            light_diffuse: 1.0,
            light_specular: 1.0,
        }
    }
}

impl ViewConfig {
    pub fn point_light(&self) -> PointLight {
        PointLight {
            position: self.light,
            ambient: self.light_ambient,
            diffuse: self.light_diffuse,
            specular: self.light_specular,
        }
    }
}

/// A shared flag for stopping a render between rows.
///
/// Clones share the same flag, so one can be handed to the renderer while
/// another is kept to call `cancel`.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        Default::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened during one render pass.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Rows traversed before the pass ended.
    pub rows_rendered: usize,

    /// Pixels successfully handed to the sink.
    pub pixels_written: usize,

    /// Pixels that could not be produced or written, with the reason.
    pub skipped: Vec<RenderError>,

    /// Whether the pass was stopped before covering the whole raster.
    pub cancelled: bool,
}

impl FrameReport {
    /// True when every row was traversed and every pixel written.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.skipped.is_empty()
    }
}

/// A fixed-eye camera looking through the unit square on the `z = 0` plane.
///
/// Pixel `(x, y)` maps to the plane point `(x/width, 1 - y/height, 0)`; the
/// vertical flip puts raster row 0 at the top of the view.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// The horizontal size of the resultant canvas.
    pub hsize: usize,

    /// The vertical size of the resultant canvas.
    pub vsize: usize,

    pub eye: Tuple3D,
}

impl Camera {
    pub fn new(hsize: usize, vsize: usize, eye: Tuple3D) -> Camera {
        Camera { hsize, vsize, eye }
    }

    /// The primary ray from the eye through pixel `(px, py)`.
    ///
    /// The direction runs from the eye to the image plane point and is not
    /// normalized.
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Ray3D {
        let u = px as f64 / self.hsize as f64;
        let v = 1.0 - py as f64 / self.vsize as f64;

        Ray3D::new(self.eye, Tuple3D::new(u, v, 0.0) - self.eye)
    }

    /// Computes the display color of a single pixel.
    pub fn pixel_color(&self, world: &World, px: usize, py: usize)
        -> Result<Rgba> {
        let ray = self.ray_for_pixel(px, py);

        match world.color_at(&ray) {
            None => Ok(Rgba::BACKGROUND),
            Some(color) => Rgba::from_color(&color),
        }
    }

    /// Renders one row into `sink`, returning the number of pixels written
    /// and any per-pixel failures.
    pub fn render_row(&self, world: &World, py: usize,
        sink: &mut dyn PixelSink) -> (usize, Vec<RenderError>) {
        let mut written = 0;
        let mut skipped = Vec::new();

        for px in 0..self.hsize {
            let res = self.pixel_color(world, px, py)
                .and_then(|pixel| sink.put_pixel(px, py, pixel));

            match res {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!("skipping pixel ({}, {}): {}", px, py, e);
                    skipped.push(e);
                },
            }
        }

        (written, skipped)
    }

    /// Renders a full frame into `sink`, row by row from the top.
    ///
    /// Failed pixels are skipped and listed in the report; they never stop
    /// the frame. `cancel` is checked before each row. The sink's `finish`
    /// is signalled once, only if every row was traversed.
    pub fn render_frame(&self, world: &World, sink: &mut dyn PixelSink,
        cancel: &CancelToken) -> FrameReport {
        let mut report = FrameReport::default();
        debug!("rendering {}x{} frame over {} ellipsoids",
            self.hsize, self.vsize, world.ellipsoids.len());

        for py in 0..self.vsize {
            if cancel.is_cancelled() {
                debug!("render cancelled after {} rows", py);
                report.cancelled = true;
                break;
            }

            let (written, mut skipped) = self.render_row(world, py, sink);
            report.pixels_written += written;
            report.skipped.append(&mut skipped);
            report.rows_rendered += 1;
        }

        if !report.cancelled {
            sink.finish();
        }

        report
    }

    /// Renders a full frame into a new `Canvas`, along with the report of
    /// any skipped pixels.
    pub fn render(&self, world: &World) -> (Canvas, FrameReport) {
        let mut image = Canvas::new(self.hsize, self.vsize);
        let report = self.render_frame(world, &mut image, &CancelToken::new());

        (image, report)
    }
}

#[cfg(test)]
fn red_ball_world(center: Tuple3D) -> World {
    use crate::color::Color;
    use crate::ellipsoid::{ Ellipsoid, Material };

    let m = Material {
        ambient: Color::black(),
        diffuse: Color::rgb(1.0, 0.0, 0.0),
        specular: Color::black(),
        shininess: 5.0,
    };
    let ball = Ellipsoid::sphere(center, 0.2, m).unwrap();

    World::new(vec![ball], PointLight::new(DEFAULT_LIGHT))
}

#[cfg(test)]
fn is_reddish(px: Rgba) -> bool {
    px.r > 0 && px.g == 0 && px.b == 0 && px.a == 255
}

#[test]
fn ray_through_top_left_corner() {
    let c = Camera::new(4, 4, DEFAULT_EYE);
    let r = c.ray_for_pixel(0, 0);

    assert_eq!(r.origin, Tuple3D::new(0.5, 0.5, -0.5));
    assert_eq!(r.direction, Tuple3D::new(-0.5, 0.5, 0.5));
}

#[test]
fn ray_y_axis_is_flipped() {
    let c = Camera::new(4, 4, DEFAULT_EYE);
    let r = c.ray_for_pixel(2, 3);

    // u = 0.5, v = 1 - 3/4
    assert_eq!(r.position(1.0), Tuple3D::new(0.5, 0.25, 0.0));
}

#[test]
fn render_small_ball() {
    let w = red_ball_world(Tuple3D::new(0.0, 0.0, 0.6));
    let c = Camera::new(4, 4, DEFAULT_EYE);

    let mut image = Canvas::new(4, 4);
    let report = c.render_frame(&w, &mut image, &CancelToken::new());

    assert!(report.is_complete());
    assert_eq!(report.pixels_written, 16);
    assert!(image.is_finished());

    // Only the ray through (0.25, 0.25) on the image plane reaches the ball
    assert!(is_reddish(image.read_pixel(1, 3).unwrap()));

    for &(x, y) in [(0, 0), (3, 0), (0, 3), (3, 3)].iter() {
        assert_eq!(image.read_pixel(x, y), Some(Rgba::BACKGROUND));
    }
}

#[test]
fn render_centered_ball() {
    let w = red_ball_world(Tuple3D::new(0.5, 0.5, 0.6));
    let c = Camera::new(4, 4, DEFAULT_EYE);
    let (image, report) = c.render(&w);

    assert!(report.is_complete());
    assert!(is_reddish(image.read_pixel(2, 2).unwrap()));
    for &(x, y) in [(0, 0), (3, 0), (0, 3), (3, 3)].iter() {
        assert_eq!(image.read_pixel(x, y), Some(Rgba::BACKGROUND));
    }
}

#[test]
fn render_empty_scene() {
    let w = World::empty();

    for &(width, height) in [(1, 1), (4, 4), (7, 3)].iter() {
        let c = Camera::new(width, height, DEFAULT_EYE);
        let (image, report) = c.render(&w);
        assert!(report.is_complete());

        for y in 0..height {
            for x in 0..width {
                assert_eq!(image.read_pixel(x, y), Some(Rgba::BACKGROUND));
            }
        }
    }
}

#[test]
fn cancelled_render_does_not_finish() {
    let w = red_ball_world(Tuple3D::new(0.5, 0.5, 0.6));
    let c = Camera::new(4, 4, DEFAULT_EYE);
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut image = Canvas::new(4, 4);
    let report = c.render_frame(&w, &mut image, &cancel);

    assert!(report.cancelled);
    assert_eq!(report.rows_rendered, 0);
    assert!(!image.is_finished());
}

#[cfg(test)]
struct CancelOnRow {
    canvas: Canvas,
    row: usize,
    cancel: CancelToken,
    finished: bool,
}

#[cfg(test)]
impl PixelSink for CancelOnRow {
    fn put_pixel(&mut self, x: usize, y: usize, pixel: Rgba) -> Result<()> {
        if y == self.row {
            self.cancel.cancel();
        }

        self.canvas.write_pixel(x, y, pixel)
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

#[test]
fn cancel_during_row_stops_before_next() {
    let w = red_ball_world(Tuple3D::new(0.5, 0.5, 0.6));
    let c = Camera::new(4, 4, DEFAULT_EYE);

    // Uncancelled, row 2 reaches the ball
    let (full, _) = c.render(&w);
    assert!(is_reddish(full.read_pixel(2, 2).unwrap()));

    let cancel = CancelToken::new();
    let mut sink = CancelOnRow {
        canvas: Canvas::new(4, 4),
        row: 1,
        cancel: cancel.clone(),
        finished: false,
    };
    let report = c.render_frame(&w, &mut sink, &cancel);

    // The row in progress completes; the next one never starts
    assert!(report.cancelled);
    assert_eq!(report.rows_rendered, 2);
    assert_eq!(report.pixels_written, 8);
    assert!(!sink.finished);

    for y in 2..4 {
        for x in 0..4 {
            assert_eq!(sink.canvas.read_pixel(x, y), Some(Rgba::BACKGROUND));
        }
    }
}

#[test]
fn view_accepts_camel_case_intensities() {
    let view: ViewConfig = serde_json::from_str(r#"{
        "eye": [0, 0, -2],
        "light": [1, 1, 1],
        "lightAmbient": 0.2,
        "lightDiffuse": 0.3,
        "lightSpecular": 0.0
    }"#).unwrap();

    assert_eq!(view.eye, Tuple3D::new(0.0, 0.0, -2.0));
    assert_eq!(view.light, Tuple3D::new(1.0, 1.0, 1.0));
    assert_eq!(view.light_ambient, 0.2);
    assert_eq!(view.light_diffuse, 0.3);
    assert_eq!(view.light_specular, 0.0);

    let light = view.point_light();
    assert_eq!(light.ambient, 0.2);
    assert_eq!(light.specular, 0.0);
}

#[test]
fn view_rejects_unknown_fields() {
    let res = serde_json::from_str::<ViewConfig>(
        r#"{ "eye": [0, 0, -2], "lightIntensity": 0.5 }"#);

    assert!(res.is_err());
}

#[test]
fn undersized_sink_skips_pixels() {
    let w = World::empty();
    let c = Camera::new(4, 4, DEFAULT_EYE);

    let mut image = Canvas::new(2, 4);
    let report = c.render_frame(&w, &mut image, &CancelToken::new());

    assert!(!report.cancelled);
    assert_eq!(report.pixels_written, 8);
    assert_eq!(report.skipped.len(), 8);
    assert!(report.skipped.iter().all(|e| matches!(e,
        RenderError::OutOfBoundsPixel { .. })));
    assert!(image.is_finished());
}
