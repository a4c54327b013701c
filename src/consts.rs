use crate::tuple::Tuple3D;

// Runtime parameters
pub const NUM_THREADS: usize = 3;
pub const CANVAS_WIDTH: usize = 512;
pub const CANVAS_HEIGHT: usize = 512;
pub const OUT_FILE: &'static str = "./out.ppm";
pub const SCENE_LOAD_TIMEOUT_MS: u64 = 3000;

// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// Default viewing setup
pub const DEFAULT_EYE: Tuple3D = Tuple3D { x: 0.5, y: 0.5, z: -0.5 };
pub const DEFAULT_LIGHT: Tuple3D = Tuple3D { x: -0.5, y: 1.5, z: -0.5 };
