//! Host camera abstraction
//!
//! The session manager drives the camera only through these traits. A host
//! implements them on top of its native capture stack; the calls mirror a
//! configure-then-run camera session with a single-shot photo output.

use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Which physical camera to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    #[default]
    Back,
    Front,
}

/// What a photo output reports it can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputCapabilities {
    pub high_resolution: bool,
    pub jpeg_thumbnail: bool,
}

/// Per-shot settings, built once per configured session and reused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoSettings {
    /// Fire the flash for the shot
    pub flash: bool,
    pub high_resolution: bool,
    pub embedded_thumbnail: bool,
    pub depth_data: bool,
    pub portrait_matte: bool,
}

impl PhotoSettings {
    /// Settings for a receipt still: flash off, no depth or matte, highest
    /// resolution the output offers.
    pub fn for_output(caps: OutputCapabilities) -> Self {
        Self {
            flash: false,
            high_resolution: caps.high_resolution,
            embedded_thumbnail: caps.jpeg_thumbnail,
            depth_data: false,
            portrait_matte: false,
        }
    }
}

/// Photo data handed back by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPhoto {
    /// Encoded file bytes (JPEG, PNG, ...)
    Encoded(Vec<u8>),
    /// Tightly packed RGBA8 pixels
    Rgba {
        width: u32,
        height: u32,
        data: Vec<u8>,
    },
}

pub type PhotoResult = Result<RawPhoto, String>;

/// One-shot completion slot for a single photo request.
///
/// The platform calls [`PhotoCompletion::complete`] from whatever context its
/// delegate runs on. Only the first call is delivered.
pub struct PhotoCompletion {
    sender: Mutex<Option<oneshot::Sender<PhotoResult>>>,
}

impl PhotoCompletion {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<PhotoResult>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(sender)),
            },
            receiver,
        )
    }

    /// Deliver the result. Returns false if a result was already delivered
    /// or nobody is waiting any more.
    pub fn complete(&self, result: PhotoResult) -> bool {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(sender) => sender.send(result).is_ok(),
            None => false,
        }
    }
}

impl std::fmt::Debug for PhotoCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoCompletion").finish_non_exhaustive()
    }
}

/// Single-frame still output attached to a session
pub trait PhotoOutput: Send + Sync + 'static {
    fn capabilities(&self) -> OutputCapabilities;

    /// Issue one capture. The result must be reported through `completion`,
    /// at any later point and from any thread.
    fn capture_photo(&self, settings: &PhotoSettings, completion: PhotoCompletion);
}

/// Host camera stack.
///
/// Methods are blocking. The session manager calls them from a blocking
/// worker while it holds its transition lock, so calls never overlap. The one
/// exception is dropping the manager, which releases a live session inline on
/// the dropping thread.
pub trait CapturePlatform: Send + Sync + 'static {
    type Device: Send + 'static;
    type Output: PhotoOutput;
    type Preview: Send + 'static;

    /// Open the default camera at `position` for exclusive use.
    fn open_device(&self, position: CameraPosition) -> Option<Self::Device>;

    /// Give a device back to the platform.
    fn release_device(&self, device: Self::Device);

    fn begin_configuration(&self);
    fn commit_configuration(&self);

    /// Attach the device as the session input. False if rejected.
    fn add_input(&self, device: &Self::Device) -> bool;

    fn create_output(&self) -> Option<Self::Output>;

    /// Attach the still output to the session. False if rejected.
    fn add_output(&self, output: &Self::Output) -> bool;

    /// Detach every input and output from the session.
    fn detach_all(&self);

    fn start_running(&self);
    fn stop_running(&self);
    fn is_running(&self) -> bool;

    fn bind_preview(&self) -> Option<Self::Preview>;
    fn unbind_preview(&self, preview: Self::Preview);
}
