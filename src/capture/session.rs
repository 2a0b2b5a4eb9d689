//! Camera session lifecycle
//!
//! `Idle → Configuring → Running ⇄ Capturing`, and `Stopping → Idle` from
//! anywhere. Configuration and teardown run on a blocking worker; their
//! results are applied to the session state by the task that spawned them.
//! A transition lock keeps `Configuring` and `Stopping` exclusive.

use futures::channel::oneshot;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

use super::image::CapturedImage;
use super::platform::{
    CameraPosition, CapturePlatform, PhotoCompletion, PhotoOutput, PhotoSettings,
};
use crate::error::CaptureError;

pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Configuring,
    Running,
    Capturing,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub camera_position: CameraPosition,
    /// How long a single photo request may stay unanswered
    pub capture_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            camera_position: CameraPosition::Back,
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }
}

/// Device and output owned by a configured session
struct Resources<P: CapturePlatform> {
    device: P::Device,
    output: Arc<P::Output>,
    photo_settings: PhotoSettings,
}

struct InFlight {
    id: u64,
    cancel: oneshot::Sender<()>,
}

struct Inner<P: CapturePlatform> {
    state: SessionState,
    resources: Option<Resources<P>>,
    preview: Option<P::Preview>,
    active_capture: Option<InFlight>,
    next_capture_id: u64,
    /// Set once the manager is dropped; detached tasks must not store resources after this
    closed: bool,
}

impl<P: CapturePlatform> Default for Inner<P> {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            resources: None,
            preview: None,
            active_capture: None,
            next_capture_id: 0,
            closed: false,
        }
    }
}

fn lock<P: CapturePlatform>(inner: &Mutex<Inner<P>>) -> MutexGuard<'_, Inner<P>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns one camera session at a time and drives it through its lifecycle
pub struct CaptureSessionManager<P: CapturePlatform> {
    platform: Arc<P>,
    config: SessionConfig,
    inner: Arc<Mutex<Inner<P>>>,
    transition: Arc<tokio::sync::Mutex<()>>,
}

impl<P: CapturePlatform> CaptureSessionManager<P> {
    pub fn new(platform: Arc<P>, config: SessionConfig) -> Self {
        Self {
            platform,
            config,
            inner: Arc::new(Mutex::new(Inner::default())),
            transition: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner).state
    }

    /// True once a preview is bound to a running session
    pub fn is_camera_ready(&self) -> bool {
        let inner = lock(&self.inner);
        is_live(inner.state) && inner.preview.is_some()
    }

    /// Acquire and configure the camera, then start it running.
    ///
    /// An already running session is torn down first. Fails with
    /// [`CaptureError::Busy`] while another transition is in progress.
    pub async fn start_session(&self) -> Result<(), CaptureError> {
        let transition = Arc::clone(&self.transition)
            .try_lock_owned()
            .map_err(|_| CaptureError::Busy)?;

        // Runs to completion even if the caller stops waiting.
        let task = tokio::spawn(run_start(
            Arc::clone(&self.platform),
            Arc::clone(&self.inner),
            self.config.camera_position,
            transition,
        ));
        task.await
            .map_err(|e| CaptureError::Platform(format!("session start task failed: {}", e)))?
    }

    /// Capture a single still from the running session.
    pub async fn capture_once(&self) -> Result<CapturedImage, CaptureError> {
        let (output, settings, id, cancelled) = {
            let mut inner = lock(&self.inner);
            match inner.state {
                SessionState::Running => {}
                SessionState::Capturing => return Err(CaptureError::AlreadyCapturing),
                _ => return Err(CaptureError::NotReady),
            }
            let Some(resources) = inner.resources.as_ref() else {
                return Err(CaptureError::NotReady);
            };
            let output = Arc::clone(&resources.output);
            let settings = resources.photo_settings;

            inner.next_capture_id += 1;
            let id = inner.next_capture_id;
            let (cancel, cancelled) = oneshot::channel();
            inner.active_capture = Some(InFlight { id, cancel });
            inner.state = SessionState::Capturing;
            (output, settings, id, cancelled)
        };
        let _guard = CaptureGuard {
            inner: &self.inner,
            id,
        };

        let (completion, completed) = PhotoCompletion::channel();
        log::debug!("Issuing photo capture request {}", id);
        output.capture_photo(&settings, completion);
        drop(output);

        let result = tokio::select! {
            photo = completed => match photo {
                Ok(Ok(raw)) => CapturedImage::from_raw_photo(raw),
                Ok(Err(message)) => Err(CaptureError::Platform(message)),
                Err(oneshot::Canceled) => Err(CaptureError::Platform(
                    "photo output dropped the capture request".to_string(),
                )),
            },
            _ = cancelled => Err(CaptureError::Cancelled),
            () = tokio::time::sleep(self.config.capture_timeout) => Err(CaptureError::CaptureTimeout),
        };

        match &result {
            Ok(image) => log::info!(
                "Capture {} complete: {}x{}",
                id,
                image.width(),
                image.height()
            ),
            Err(err) => log::warn!("Capture {} failed: {}", id, err),
        }
        result
    }

    /// Tear the session down and release the camera.
    ///
    /// Safe to call in any state and more than once. A configuration in
    /// progress is allowed to commit first; an in-flight capture resolves
    /// with [`CaptureError::Cancelled`].
    pub async fn stop_session(&self) {
        let transition = Arc::clone(&self.transition).lock_owned().await;
        let platform = Arc::clone(&self.platform);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            teardown(platform, inner).await;
            drop(transition);
        });
        if let Err(e) = task.await {
            log::error!("Session stop task failed: {}", e);
        }
    }

    /// Attach a live preview to the running session, replacing any previous one.
    ///
    /// Waits for a start or stop in progress to finish first.
    pub async fn bind_preview(&self) -> Result<(), CaptureError> {
        let transition = Arc::clone(&self.transition).lock_owned().await;
        if !is_live(lock(&self.inner).state) {
            return Err(CaptureError::NotReady);
        }

        let platform = Arc::clone(&self.platform);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = attach_preview(platform, inner).await;
            drop(transition);
            result
        });
        task.await
            .map_err(|e| CaptureError::Platform(format!("preview task failed: {}", e)))?
    }
}

fn is_live(state: SessionState) -> bool {
    matches!(state, SessionState::Running | SessionState::Capturing)
}

async fn attach_preview<P: CapturePlatform>(
    platform: Arc<P>,
    inner: Arc<Mutex<Inner<P>>>,
) -> Result<(), CaptureError> {
    let worker = Arc::clone(&platform);
    let preview = tokio::task::spawn_blocking(move || worker.bind_preview())
        .await
        .map_err(|e| CaptureError::Platform(format!("preview worker failed: {}", e)))?
        .ok_or(CaptureError::OutputUnavailable)?;

    let (stale, result) = {
        let mut guard = lock(&inner);
        if guard.closed || !is_live(guard.state) {
            // Session went away while binding.
            (Some(preview), Err(CaptureError::NotReady))
        } else {
            (guard.preview.replace(preview), Ok(()))
        }
    };
    if let Some(stale) = stale {
        let worker = tokio::task::spawn_blocking(move || platform.unbind_preview(stale));
        if let Err(e) = worker.await {
            log::error!("Preview unbind worker failed: {}", e);
        }
    }
    result
}

impl<P: CapturePlatform> Drop for CaptureSessionManager<P> {
    fn drop(&mut self) {
        let (resources, preview) = {
            let mut inner = lock(&self.inner);
            inner.closed = true;
            inner.active_capture = None;
            inner.state = SessionState::Idle;
            (inner.resources.take(), inner.preview.take())
        };
        if resources.is_some() || preview.is_some() {
            log::debug!("Releasing capture session on drop");
            release(self.platform.as_ref(), resources, preview);
        }
    }
}

/// Releases the in-flight slot however the capture future ends, including
/// being dropped by its caller.
struct CaptureGuard<'a, P: CapturePlatform> {
    inner: &'a Mutex<Inner<P>>,
    id: u64,
}

impl<P: CapturePlatform> Drop for CaptureGuard<'_, P> {
    fn drop(&mut self) {
        let mut inner = lock(self.inner);
        let ours = inner
            .active_capture
            .as_ref()
            .is_some_and(|flight| flight.id == self.id);
        if ours {
            inner.active_capture = None;
            if inner.state == SessionState::Capturing {
                inner.state = SessionState::Running;
            }
        }
    }
}

async fn run_start<P: CapturePlatform>(
    platform: Arc<P>,
    inner: Arc<Mutex<Inner<P>>>,
    position: CameraPosition,
    _transition: OwnedMutexGuard<()>,
) -> Result<(), CaptureError> {
    let (closed, replacing) = {
        let guard = lock(&inner);
        (guard.closed, guard.state != SessionState::Idle)
    };
    if closed {
        return Err(CaptureError::Cancelled);
    }
    if replacing {
        log::info!("Replacing the active capture session");
        teardown(Arc::clone(&platform), Arc::clone(&inner)).await;
    }

    lock(&inner).state = SessionState::Configuring;
    log::debug!("Configuring capture session ({:?} camera)", position);

    let worker = Arc::clone(&platform);
    let configured =
        match tokio::task::spawn_blocking(move || configure(worker.as_ref(), position)).await {
            Ok(result) => result,
            Err(e) => Err(CaptureError::Platform(format!(
                "configuration worker failed: {}",
                e
            ))),
        };
    let resources = match configured {
        Ok(resources) => resources,
        Err(err) => {
            lock(&inner).state = SessionState::Idle;
            log::warn!("Capture session failed to start: {}", err);
            return Err(err);
        }
    };

    let orphaned = {
        let mut guard = lock(&inner);
        if guard.closed {
            Some(resources)
        } else {
            guard.resources = Some(resources);
            guard.state = SessionState::Running;
            None
        }
    };
    let Some(resources) = orphaned else {
        log::info!("Capture session running");
        return Ok(());
    };

    // The manager was dropped mid-configuration; nobody else will release this.
    log::info!("Capture session closed while configuring, releasing camera");
    let worker =
        tokio::task::spawn_blocking(move || release(platform.as_ref(), Some(resources), None));
    if let Err(e) = worker.await {
        log::error!("Capture release worker failed: {}", e);
    }
    Err(CaptureError::Cancelled)
}

async fn teardown<P: CapturePlatform>(platform: Arc<P>, inner: Arc<Mutex<Inner<P>>>) {
    let (resources, preview, capture) = {
        let mut guard = lock(&inner);
        if guard.resources.is_none() && guard.preview.is_none() && guard.active_capture.is_none()
        {
            guard.state = SessionState::Idle;
            return;
        }
        guard.state = SessionState::Stopping;
        (
            guard.resources.take(),
            guard.preview.take(),
            guard.active_capture.take(),
        )
    };

    if let Some(capture) = capture {
        log::debug!("Cancelling in-flight capture {}", capture.id);
        let _ = capture.cancel.send(());
    }

    let worker = tokio::task::spawn_blocking(move || release(platform.as_ref(), resources, preview));
    if let Err(e) = worker.await {
        log::error!("Capture teardown worker failed: {}", e);
    }

    lock(&inner).state = SessionState::Idle;
    log::info!("Capture session stopped");
}

/// Blocking part of session start. Leaves nothing attached on failure.
fn configure<P: CapturePlatform>(
    platform: &P,
    position: CameraPosition,
) -> Result<Resources<P>, CaptureError> {
    platform.begin_configuration();

    let Some(device) = platform.open_device(position) else {
        platform.commit_configuration();
        return Err(CaptureError::DeviceUnavailable);
    };
    if !platform.add_input(&device) {
        abandon(platform, device);
        return Err(CaptureError::DeviceUnavailable);
    }

    let Some(output) = platform.create_output() else {
        abandon(platform, device);
        return Err(CaptureError::OutputUnavailable);
    };
    if !platform.add_output(&output) {
        abandon(platform, device);
        return Err(CaptureError::OutputUnavailable);
    }

    let photo_settings = PhotoSettings::for_output(output.capabilities());
    platform.commit_configuration();
    platform.start_running();

    Ok(Resources {
        device,
        output: Arc::new(output),
        photo_settings,
    })
}

fn abandon<P: CapturePlatform>(platform: &P, device: P::Device) {
    platform.detach_all();
    platform.commit_configuration();
    platform.release_device(device);
}

fn release<P: CapturePlatform>(
    platform: &P,
    resources: Option<Resources<P>>,
    preview: Option<P::Preview>,
) {
    if let Some(preview) = preview {
        platform.unbind_preview(preview);
    }
    if platform.is_running() {
        platform.stop_running();
    }
    if let Some(resources) = resources {
        platform.begin_configuration();
        platform.detach_all();
        platform.commit_configuration();
        drop(resources.output);
        platform.release_device(resources.device);
    }
}
