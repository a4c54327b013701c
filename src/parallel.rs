use std::thread;
use std::sync::mpsc;
use std::sync::{ Arc, Mutex };

use log::{ debug, info };

use crate::world::World;
use crate::camera::{ Camera, CancelToken, FrameReport };
use crate::canvas::{ Canvas, PixelSink };
use crate::color::Rgba;
use crate::error::{ RenderError, Result };

enum Message {
    Row(usize),
    Terminate,
}

/// The outcome of one row, sent back from a worker.
enum RowOutcome {
    Done { written: usize, skipped: Vec<RenderError> },
    Cancelled,
}

/// Collects one row in memory so it can be copied into the shared canvas
/// under a single lock.
struct RowBuffer {
    y: usize,
    pixels: Vec<Rgba>,
}

impl PixelSink for RowBuffer {
    fn put_pixel(&mut self, x: usize, y: usize, pixel: Rgba) -> Result<()> {
        if y != self.y || x >= self.pixels.len() {
            return Err(RenderError::OutOfBoundsPixel {
                x, y,
                width: self.pixels.len(),
                height: self.y + 1,
            });
        }

        self.pixels[x] = pixel;
        Ok(())
    }
}

struct Worker {
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(world: Arc<World>, camera: Arc<Camera>, canvas: Arc<Mutex<Canvas>>,
        receiver: Arc<Mutex<mpsc::Receiver<Message>>>,
        results: mpsc::Sender<RowOutcome>, cancel: CancelToken) -> Worker {

        let thread = thread::spawn(move || loop {
            // Obtain the message being executed. A poisoned or closed queue
            // means there is no more work.
            let message = match receiver.lock() {
                Ok(rx) => rx.recv().unwrap_or(Message::Terminate),
                Err(_) => Message::Terminate,
            };

            match message {
                Message::Row(y) => {
                    if cancel.is_cancelled() {
                        let _ = results.send(RowOutcome::Cancelled);
                        continue;
                    }

                    let mut row = RowBuffer {
                        y,
                        pixels: vec![Rgba::BACKGROUND; camera.hsize],
                    };
                    let (written, mut skipped) =
                        camera.render_row(&world, y, &mut row);

                    match canvas.lock() {
                        Ok(mut c) => {
                            if let Err(e) = c.write_row(y, &row.pixels) {
                                skipped.push(e);
                            }
                        },
                        Err(_) => skipped.push(RenderError::WorkerPanicked),
                    }

                    let _ = results.send(RowOutcome::Done { written, skipped });
                },

                Message::Terminate => {
                    // Exit the worker thread loop, terminating the thread.
                    break;
                }
            }
        });

        Worker { thread: Some(thread) }
    }
}

struct ThreadPool {
    workers: Vec<Worker>,
    sender: mpsc::Sender<Message>,
}

impl ThreadPool {
    /// Starts `size` workers (at least one) sharing the world, camera and
    /// canvas. Each finished row is reported on `results`.
    fn new(size: usize, world: Arc<World>, camera: Arc<Camera>,
        canvas: Arc<Mutex<Canvas>>, results: mpsc::Sender<RowOutcome>,
        cancel: CancelToken) -> ThreadPool {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);

        for _ in 0..size {
            workers.push(Worker::new(
                Arc::clone(&world),
                Arc::clone(&camera),
                Arc::clone(&canvas),
                Arc::clone(&receiver),
                results.clone(),
                cancel.clone(),
            ));
        }

        ThreadPool { workers, sender }
    }

    fn execute(&mut self, message: Message) -> Result<()> {
        self.sender.send(message).map_err(|_| RenderError::WorkerPanicked)
    }

    /// Stops every worker once the queue drains, reporting whether any of
    /// them panicked.
    fn join(mut self) -> Result<()> {
        for _ in &self.workers {
            let _ = self.sender.send(Message::Terminate);
        }

        let mut panicked = false;
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                panicked |= thread.join().is_err();
            }
        }

        if panicked { Err(RenderError::WorkerPanicked) } else { Ok(()) }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let running = self.workers.iter()
            .filter(|w| w.thread.is_some())
            .count();

        for _ in 0..running {
            let _ = self.sender.send(Message::Terminate);
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

/// Renders a frame with `threads` workers, one row per job.
///
/// Produces the same pixels as `Camera::render_frame`. Workers check
/// `cancel` before starting each row; rows not started when it fires are
/// left as background and the report is marked cancelled.
pub fn parallel_render(world: World, camera: Camera, threads: usize,
    cancel: &CancelToken) -> Result<(Canvas, FrameReport)> {
    let vsize = camera.vsize;
    let hsize = camera.hsize;
    let canvas = Arc::new(Mutex::new(Canvas::new(hsize, vsize)));
    let (results_tx, results_rx) = mpsc::channel();

    info!("Rendering {}x{} using {} threads...", hsize, vsize, threads.max(1));
    {
        let mut thread_pool = ThreadPool::new(
            threads,
            Arc::new(world),
            Arc::new(camera),
            Arc::clone(&canvas),
            results_tx,
            cancel.clone(),
        );

        for y in 0..vsize {
            thread_pool.execute(Message::Row(y))?;
        }

        thread_pool.join()?;
    }

    let mut report = FrameReport::default();
    for outcome in results_rx.try_iter() {
        match outcome {
            RowOutcome::Done { written, mut skipped } => {
                report.rows_rendered += 1;
                report.pixels_written += written;
                report.skipped.append(&mut skipped);
            },
            RowOutcome::Cancelled => report.cancelled = true,
        }
    }

    let mut canvas = Arc::try_unwrap(canvas)
        .map_err(|_| RenderError::WorkerPanicked)?
        .into_inner()
        .map_err(|_| RenderError::WorkerPanicked)?;

    if report.cancelled {
        debug!("render cancelled after {} of {} rows",
            report.rows_rendered, vsize);
    } else {
        canvas.finish();
    }

    info!("...done.");
    Ok((canvas, report))
}

#[cfg(test)]
fn ball_world() -> World {
    use crate::color::Color;
    use crate::tuple::Tuple3D;
    use crate::light::PointLight;
    use crate::ellipsoid::{ Ellipsoid, Material };
    use crate::consts::DEFAULT_LIGHT;

    let m = Material {
        ambient: Color::rgb(0.1, 0.0, 0.0),
        diffuse: Color::rgb(0.8, 0.2, 0.0),
        specular: Color::rgb(0.3, 0.3, 0.3),
        shininess: 8.0,
    };
    let ball = Ellipsoid::new(Tuple3D::new(0.5, 0.5, 0.6),
        Tuple3D::new(0.3, 0.2, 0.25), m).unwrap();

    World::new(vec![ball], PointLight::new(DEFAULT_LIGHT))
}

#[test]
fn parallel_matches_sequential() {
    use crate::consts::DEFAULT_EYE;

    let world = ball_world();
    let camera = Camera::new(16, 12, DEFAULT_EYE);
    let (expected, _) = camera.render(&world);

    for &threads in [1, 3, 8].iter() {
        let (image, report) = parallel_render(world.clone(), camera, threads,
            &CancelToken::new()).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.rows_rendered, 12);
        assert_eq!(report.pixels_written, 16 * 12);
        assert_eq!(image.to_rgba_bytes(), expected.to_rgba_bytes());
        assert!(image.is_finished());
    }
}

#[test]
fn parallel_cancelled_before_start() {
    use crate::consts::DEFAULT_EYE;

    let camera = Camera::new(8, 8, DEFAULT_EYE);
    let cancel = CancelToken::new();
    cancel.cancel();

    let (image, report) = parallel_render(ball_world(), camera, 2, &cancel)
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.rows_rendered, 0);
    assert!(!image.is_finished());
    assert_eq!(image.read_pixel(4, 4), Some(Rgba::BACKGROUND));
}

#[test]
fn parallel_empty_scene() {
    use crate::consts::DEFAULT_EYE;

    let camera = Camera::new(5, 5, DEFAULT_EYE);
    let (image, report) = parallel_render(World::empty(), camera, 4,
        &CancelToken::new()).unwrap();

    assert!(report.is_complete());
    assert!(image.to_rgba_bytes().chunks(4).all(|p| p == [0, 0, 0, 255]));
}
