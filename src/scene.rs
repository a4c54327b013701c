use std::convert::TryFrom;
use std::fs::File;
use std::io::{ BufReader, Read };
use std::path::{ Path, PathBuf };
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{ debug, warn };
use serde::{ Serialize, Deserialize };

use crate::color::Color;
use crate::tuple::Tuple3D;
use crate::camera::ViewConfig;
use crate::world::World;
use crate::light::DotProductPolicy;
use crate::ellipsoid::{ Ellipsoid, Material };
use crate::error::{ RenderError, Result };

/// A loaded scene: the ellipsoids to render and where they are viewed from.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub ellipsoids: Vec<Ellipsoid>,
    pub view: ViewConfig,
}

/// One ellipsoid record as it appears in a scene file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EllipsoidJson {
    pub x: f64,
    pub y: f64,
    pub z: f64,

    pub a: f64,
    pub b: f64,
    pub c: f64,

    pub ambient: [f64; 3],
    pub diffuse: [f64; 3],
    pub specular: [f64; 3],
    pub n: f64,
}

/// A scene file is either a bare list of ellipsoids or an object carrying
/// the list plus an optional view.
#[derive(Deserialize)]
#[serde(untagged)]
enum SceneJson {
    List(Vec<EllipsoidJson>),
    Full {
        ellipsoids: Vec<EllipsoidJson>,
        #[serde(default)]
        view: ViewConfig,
    },
}

impl TryFrom<EllipsoidJson> for Ellipsoid {
    type Error = RenderError;

    fn try_from(e: EllipsoidJson) -> Result<Ellipsoid> {
        let material = Material {
            ambient: Color::from(e.ambient),
            diffuse: Color::from(e.diffuse),
            specular: Color::from(e.specular),
            shininess: e.n,
        };

        Ellipsoid::new(
            Tuple3D::new(e.x, e.y, e.z),
            Tuple3D::new(e.a, e.b, e.c),
            material,
        )
    }
}

impl From<&Ellipsoid> for EllipsoidJson {
    fn from(e: &Ellipsoid) -> EllipsoidJson {
        let (center, radii, m) = (e.center(), e.radii(), e.material());

        EllipsoidJson {
            x: center.x, y: center.y, z: center.z,
            a: radii.x, b: radii.y, c: radii.z,
            ambient: m.ambient.into(),
            diffuse: m.diffuse.into(),
            specular: m.specular.into(),
            n: m.shininess,
        }
    }
}

impl Scene {
    /// Validates a list of records. One bad record rejects the whole scene,
    /// naming the record's position in the list.
    pub fn from_records(records: Vec<EllipsoidJson>, view: ViewConfig)
        -> Result<Scene> {
        let ellipsoids = records.into_iter()
            .enumerate()
            .map(|(index, record)| {
                Ellipsoid::try_from(record).map_err(|e| {
                    warn!("rejecting ellipsoid #{}: {}", index, e);
                    RenderError::InvalidEllipsoid { index, source: Box::new(e) }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("loaded {} ellipsoids", ellipsoids.len());
        Ok(Scene { ellipsoids, view })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Scene> {
        let parsed: SceneJson = serde_json::from_reader(reader)?;

        match parsed {
            SceneJson::List(records) => {
                Scene::from_records(records, Default::default())
            },
            SceneJson::Full { ellipsoids, view } => {
                Scene::from_records(ellipsoids, view)
            },
        }
    }

    pub fn from_json_str(s: &str) -> Result<Scene> {
        Scene::from_reader(s.as_bytes())
    }

    /// Loads a scene file from disk.
    pub fn load(path: &Path) -> Result<Scene> {
        let file = File::open(path)?;
        Scene::from_reader(BufReader::new(file))
    }

    /// Loads a scene file on a helper thread, giving up after `timeout`.
    ///
    /// Either a complete scene comes back or an error does; there is no
    /// partially loaded result. On timeout the helper thread is abandoned and
    /// its result discarded.
    pub fn load_with_timeout(path: PathBuf, timeout: Duration) -> Result<Scene> {
        load_from_with_timeout(move || Scene::load(&path), timeout)
    }

    /// Serializes the scene back to its object form.
    pub fn to_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Out<'a> {
            ellipsoids: Vec<EllipsoidJson>,
            view: &'a ViewConfig,
        }

        let out = Out {
            ellipsoids: self.ellipsoids.iter().map(EllipsoidJson::from).collect(),
            view: &self.view,
        };

        Ok(serde_json::to_string_pretty(&out)?)
    }

    /// Builds the world this scene describes.
    pub fn world(&self, policy: DotProductPolicy) -> World {
        World {
            ellipsoids: self.ellipsoids.clone(),
            light_source: self.view.point_light(),
            policy,
        }
    }
}

/// Runs `load` on a helper thread and waits at most `timeout` for it.
fn load_from_with_timeout<F>(load: F, timeout: Duration) -> Result<Scene>
    where F: FnOnce() -> Result<Scene> + Send + 'static {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let _ = tx.send(load());
    });

    match rx.recv_timeout(timeout) {
        Ok(res) => res,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            Err(RenderError::LoadTimeout(timeout))
        },
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(RenderError::WorkerPanicked)
        },
    }
}

#[cfg(test)]
const TWO_ELLIPSOIDS: &str = r#"[
    {"x": 0.75, "y": 0.75, "z": 0.5, "a": 0.2, "b": 0.15, "c": 0.1,
     "ambient": [0.1, 0.1, 0.1], "diffuse": [0.0, 0.0, 0.6],
     "specular": [0.3, 0.3, 0.3], "n": 5},
    {"x": 0.25, "y": 0.25, "z": 0.5, "a": 0.15, "b": 0.2, "c": 0.1,
     "ambient": [0.1, 0.1, 0.1], "diffuse": [0.6, 0.0, 0.6],
     "specular": [0.3, 0.3, 0.3], "n": 7}
]"#;

#[test]
fn parse_bare_list() {
    let scene = Scene::from_json_str(TWO_ELLIPSOIDS).unwrap();

    assert_eq!(scene.ellipsoids.len(), 2);
    assert_eq!(scene.view, ViewConfig::default());

    let first = &scene.ellipsoids[0];
    assert_eq!(first.center(), Tuple3D::new(0.75, 0.75, 0.5));
    assert_eq!(first.radii(), Tuple3D::new(0.2, 0.15, 0.1));
    assert_eq!(first.material().diffuse, Color::rgb(0.0, 0.0, 0.6));
    assert_eq!(scene.ellipsoids[1].material().shininess, 7.0);
}

#[test]
fn parse_object_with_view() {
    let json = format!(r#"{{
        "ellipsoids": {},
        "view": {{ "light": [2, 4, -1], "light_specular": 0.5 }}
    }}"#, TWO_ELLIPSOIDS);
    let scene = Scene::from_json_str(&json).unwrap();

    assert_eq!(scene.ellipsoids.len(), 2);
    assert_eq!(scene.view.light, Tuple3D::new(2.0, 4.0, -1.0));
    assert_eq!(scene.view.light_specular, 0.5);
    assert_eq!(scene.view.eye, crate::consts::DEFAULT_EYE);

    let world = scene.world(DotProductPolicy::Raw);
    assert_eq!(world.light_source.specular, 0.5);
    assert_eq!(world.policy, DotProductPolicy::Raw);
}

#[test]
fn zero_radius_rejects_scene() {
    let json = r#"[
        {"x": 0, "y": 0, "z": 0, "a": 1, "b": 1, "c": 1,
         "ambient": [0, 0, 0], "diffuse": [1, 0, 0], "specular": [0, 0, 0], "n": 1},
        {"x": 0, "y": 0, "z": 0, "a": 1, "b": 0, "c": 1,
         "ambient": [0, 0, 0], "diffuse": [1, 0, 0], "specular": [0, 0, 0], "n": 1}
    ]"#;

    match Scene::from_json_str(json) {
        Err(RenderError::InvalidEllipsoid { index, source }) => {
            assert_eq!(index, 1);
            assert!(matches!(*source, RenderError::DegenerateEllipsoid { .. }));
        },
        other => panic!("expected InvalidEllipsoid, got {:?}", other),
    }
}

#[test]
fn missing_field_is_malformed() {
    let json = r#"[{"x": 0, "y": 0, "z": 0, "a": 1, "b": 1, "c": 1}]"#;

    assert!(matches!(Scene::from_json_str(json), Err(RenderError::Json(_))));
}

#[test]
fn empty_list_is_a_scene() {
    let scene = Scene::from_json_str("[]").unwrap();

    assert!(scene.ellipsoids.is_empty());
}

#[test]
fn json_survives_reload() {
    let scene = Scene::from_json_str(TWO_ELLIPSOIDS).unwrap();
    let again = Scene::from_json_str(&scene.to_json().unwrap()).unwrap();

    assert_eq!(again, scene);
}

#[test]
fn load_missing_file_with_timeout() {
    let path = std::env::temp_dir().join("ellipsoid-raycaster-no-such-scene.json");
    let res = Scene::load_with_timeout(path, Duration::from_secs(5));

    assert!(matches!(res, Err(RenderError::Io(_))));
}

#[test]
fn load_file_with_timeout() {
    let path = std::env::temp_dir()
        .join(format!("ellipsoid-raycaster-{}.json", std::process::id()));
    std::fs::write(&path, TWO_ELLIPSOIDS).unwrap();

    let res = Scene::load_with_timeout(path.clone(), Duration::from_secs(5));
    let _ = std::fs::remove_file(&path);

    assert_eq!(res.unwrap().ellipsoids.len(), 2);
}

#[test]
fn slow_load_times_out() {
    let res = load_from_with_timeout(|| {
        thread::sleep(Duration::from_millis(500));
        Scene::from_json_str(TWO_ELLIPSOIDS)
    }, Duration::from_millis(20));

    match res {
        Err(RenderError::LoadTimeout(waited)) => {
            assert_eq!(waited, Duration::from_millis(20));
        },
        other => panic!("expected LoadTimeout, got {:?}", other),
    }
}

#[test]
fn panicking_load_is_reported() {
    let res = load_from_with_timeout(|| panic!("loader failed"),
        Duration::from_secs(5));

    assert!(matches!(res, Err(RenderError::WorkerPanicked)));
}

#[test]
fn camel_case_view_in_scene() {
    let json = format!(r#"{{
        "ellipsoids": {},
        "view": {{ "eye": [0, 0, -2], "lightAmbient": 0.2, "lightDiffuse": 0.3 }}
    }}"#, TWO_ELLIPSOIDS);
    let scene = Scene::from_json_str(&json).unwrap();

    assert_eq!(scene.view.light_ambient, 0.2);
    assert_eq!(scene.view.light_diffuse, 0.3);
    assert_eq!(scene.view.light_specular, 1.0);
}

#[test]
fn unknown_view_field_is_malformed() {
    let json = format!(r#"{{
        "ellipsoids": {},
        "view": {{ "lightAmbeint": 0.2 }}
    }}"#, TWO_ELLIPSOIDS);

    assert!(matches!(Scene::from_json_str(&json), Err(RenderError::Json(_))));
}
