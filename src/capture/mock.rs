//! In-memory capture platform for tests

use image::RgbaImage;
use std::io::Cursor;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::platform::{
    CameraPosition, CapturePlatform, OutputCapabilities, PhotoCompletion, PhotoOutput,
    PhotoResult, PhotoSettings, RawPhoto,
};

/// How the mock output answers a capture request
#[derive(Clone, Debug)]
pub enum PhotoBehaviour {
    Respond(RawPhoto),
    Fail(String),
    /// Keep the completion until `complete_pending` is called
    Hang,
    /// Drop the completion without answering
    DropRequest,
}

#[derive(Clone, Debug, Default)]
pub struct MockStats {
    pub opened: usize,
    pub released: usize,
    pub open_configurations: i32,
    pub inputs: usize,
    pub outputs: usize,
    pub detach_calls: usize,
    pub running: bool,
    pub previews_bound: usize,
    pub previews_unbound: usize,
    pub captures_issued: usize,
    pub settings_seen: Vec<PhotoSettings>,
    pub last_position: Option<CameraPosition>,
}

struct Shared {
    stats: MockStats,
    no_device: bool,
    reject_input: bool,
    reject_output: bool,
    behaviour: PhotoBehaviour,
    pending: Vec<PhotoCompletion>,
    open_gate: Option<mpsc::Receiver<()>>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            stats: MockStats::default(),
            no_device: false,
            reject_input: false,
            reject_output: false,
            behaviour: PhotoBehaviour::Respond(png_photo(4, 4)),
            pending: Vec::new(),
            open_gate: None,
        }
    }
}

#[derive(Default)]
pub struct MockPlatform {
    shared: Arc<Mutex<Shared>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockPlatform {
    pub fn stats(&self) -> MockStats {
        lock(&self.shared).stats.clone()
    }

    pub fn fail_with_no_device(&self) {
        lock(&self.shared).no_device = true;
    }

    pub fn reject_input(&self) {
        lock(&self.shared).reject_input = true;
    }

    pub fn reject_output(&self) {
        lock(&self.shared).reject_output = true;
    }

    pub fn accept_output(&self) {
        lock(&self.shared).reject_output = false;
    }

    pub fn set_photo_behaviour(&self, behaviour: PhotoBehaviour) {
        lock(&self.shared).behaviour = behaviour;
    }

    /// Block the next `open_device` until the returned sender fires or is dropped
    pub fn hold_device_open(&self) -> mpsc::Sender<()> {
        let (resume, gate) = mpsc::channel();
        lock(&self.shared).open_gate = Some(gate);
        resume
    }

    /// Answer every held request; returns how many reached a waiting caller.
    pub fn complete_pending(&self, result: PhotoResult) -> usize {
        let pending = std::mem::take(&mut lock(&self.shared).pending);
        pending
            .into_iter()
            .filter(|completion| completion.complete(result.clone()))
            .count()
    }
}

pub struct MockDevice;

pub struct MockPreview;

pub struct MockOutput {
    shared: Arc<Mutex<Shared>>,
}

impl PhotoOutput for MockOutput {
    fn capabilities(&self) -> OutputCapabilities {
        OutputCapabilities {
            high_resolution: true,
            jpeg_thumbnail: true,
        }
    }

    fn capture_photo(&self, settings: &PhotoSettings, completion: PhotoCompletion) {
        let behaviour = {
            let mut shared = lock(&self.shared);
            shared.stats.captures_issued += 1;
            shared.stats.settings_seen.push(*settings);
            shared.behaviour.clone()
        };
        match behaviour {
            PhotoBehaviour::Respond(photo) => {
                completion.complete(Ok(photo));
            }
            PhotoBehaviour::Fail(message) => {
                completion.complete(Err(message));
            }
            PhotoBehaviour::Hang => lock(&self.shared).pending.push(completion),
            PhotoBehaviour::DropRequest => drop(completion),
        }
    }
}

impl CapturePlatform for MockPlatform {
    type Device = MockDevice;
    type Output = MockOutput;
    type Preview = MockPreview;

    fn open_device(&self, position: CameraPosition) -> Option<MockDevice> {
        let gate = lock(&self.shared).open_gate.take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        let mut shared = lock(&self.shared);
        if shared.no_device {
            return None;
        }
        shared.stats.opened += 1;
        shared.stats.last_position = Some(position);
        Some(MockDevice)
    }

    fn release_device(&self, _device: MockDevice) {
        lock(&self.shared).stats.released += 1;
    }

    fn begin_configuration(&self) {
        lock(&self.shared).stats.open_configurations += 1;
    }

    fn commit_configuration(&self) {
        lock(&self.shared).stats.open_configurations -= 1;
    }

    fn add_input(&self, _device: &MockDevice) -> bool {
        let mut shared = lock(&self.shared);
        if shared.reject_input {
            return false;
        }
        shared.stats.inputs += 1;
        true
    }

    fn create_output(&self) -> Option<MockOutput> {
        Some(MockOutput {
            shared: Arc::clone(&self.shared),
        })
    }

    fn add_output(&self, _output: &MockOutput) -> bool {
        let mut shared = lock(&self.shared);
        if shared.reject_output {
            return false;
        }
        shared.stats.outputs += 1;
        true
    }

    fn detach_all(&self) {
        let mut shared = lock(&self.shared);
        shared.stats.detach_calls += 1;
        shared.stats.inputs = 0;
        shared.stats.outputs = 0;
    }

    fn start_running(&self) {
        lock(&self.shared).stats.running = true;
    }

    fn stop_running(&self) {
        lock(&self.shared).stats.running = false;
    }

    fn is_running(&self) -> bool {
        lock(&self.shared).stats.running
    }

    fn bind_preview(&self) -> Option<MockPreview> {
        lock(&self.shared).stats.previews_bound += 1;
        Some(MockPreview)
    }

    fn unbind_preview(&self, _preview: MockPreview) {
        lock(&self.shared).stats.previews_unbound += 1;
    }
}

/// PNG-encoded solid image of the given size
pub fn png_photo(width: u32, height: u32) -> RawPhoto {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(width, height, image::Rgba([240, 240, 230, 255]))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode test png");
    RawPhoto::Encoded(bytes)
}
