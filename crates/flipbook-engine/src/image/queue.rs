use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;
use std::rc::{Rc, Weak};

use super::{DecodeCallback, ImageDimensions, ImageResource};
use crate::error::Error;

/// Turns a source identifier into decoded dimensions or a failure message.
pub type Decoder = Rc<dyn Fn(&str) -> Result<ImageDimensions, String>>;

/// Decodes an image file with the `image` crate.
///
/// The whole image is decoded, not only its header, so truncated or corrupt
/// files fail here rather than at draw time.
pub fn decode_file(path: impl AsRef<Path>) -> Result<ImageDimensions, String> {
    let path = path.as_ref();
    let image = ::image::ImageReader::open(path)
        .map_err(|e| format!("cannot open {}: {e}", path.display()))?
        .with_guessed_format()
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?
        .decode()
        .map_err(|e| e.to_string())?;

    Ok(ImageDimensions::new(image.width(), image.height()))
}

#[derive(Default)]
struct ImageState {
    generation: Cell<u64>,
    dimensions: Cell<Option<ImageDimensions>>,
}

struct Job {
    image: Weak<ImageState>,
    generation: u64,
    src: String,
    on_settled: DecodeCallback,
}

struct QueueInner {
    jobs: VecDeque<Job>,
    decoder: Decoder,
}

/// Cooperative decode queue.
///
/// Images created by [`DecodeQueue::image`] enqueue their decode attempts
/// here. Nothing is decoded until the host calls [`DecodeQueue::process`],
/// which keeps completions on the host's own loop, between frames.
#[derive(Clone)]
pub struct DecodeQueue {
    inner: Rc<RefCell<QueueInner>>,
}

impl DecodeQueue {
    pub fn new(decoder: impl Fn(&str) -> Result<ImageDimensions, String> + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(QueueInner {
                jobs: VecDeque::new(),
                decoder: Rc::new(decoder),
            })),
        }
    }

    /// Queue whose sources are file paths.
    pub fn from_files() -> Self {
        Self::new(|src| decode_file(src))
    }

    /// Creates an image handle bound to this queue.
    pub fn image(&self) -> QueuedImage {
        QueuedImage {
            queue: self.clone(),
            state: Rc::new(ImageState::default()),
        }
    }

    /// Jobs waiting to be processed, stale ones included.
    pub fn pending(&self) -> usize {
        self.inner.borrow().jobs.len()
    }

    /// Runs every queued decode. Returns the number of completions delivered.
    ///
    /// Jobs queued by completion callbacks run in the same call.
    pub fn process(&self) -> usize {
        let mut delivered = 0;

        loop {
            let (job, decoder) = {
                let mut inner = self.inner.borrow_mut();
                match inner.jobs.pop_front() {
                    Some(job) => (job, inner.decoder.clone()),
                    None => break,
                }
            };

            let Some(image) = job.image.upgrade() else {
                log::trace!("dropping decode of '{}': image released", job.src);
                continue;
            };
            if image.generation.get() != job.generation {
                log::trace!("dropping decode of '{}': superseded", job.src);
                continue;
            }

            let outcome = match decoder(&job.src) {
                Ok(dimensions) => {
                    image.dimensions.set(Some(dimensions));
                    Ok(dimensions)
                }
                Err(message) => Err(Error::ImageDecode {
                    src: job.src.clone(),
                    message,
                }),
            };

            (job.on_settled)(outcome);
            delivered += 1;
        }

        delivered
    }

    fn push(&self, job: Job) {
        self.inner.borrow_mut().jobs.push_back(job);
    }
}

/// [`ImageResource`] whose decodes run on a [`DecodeQueue`].
pub struct QueuedImage {
    queue: DecodeQueue,
    state: Rc<ImageState>,
}

impl QueuedImage {
    fn invalidate(&self) -> u64 {
        let generation = self.state.generation.get() + 1;
        self.state.generation.set(generation);
        self.state.dimensions.set(None);
        generation
    }
}

impl ImageResource for QueuedImage {
    fn set_src(&mut self, src: &str, on_settled: DecodeCallback) {
        let generation = self.invalidate();
        self.queue.push(Job {
            image: Rc::downgrade(&self.state),
            generation,
            src: src.to_string(),
            on_settled,
        });
    }

    fn dimensions(&self) -> Option<ImageDimensions> {
        self.state.dimensions.get()
    }

    fn abort(&mut self) {
        self.invalidate();
    }
}
