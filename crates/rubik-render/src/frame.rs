// SPDX-License-Identifier: CEPL-1.0
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace, warn};

use crate::RenderSize;

/// One iteration walks these in order, then loops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStage {
    WaitPrevious,
    AcquireImage,
    RecordAndSubmit,
    Present,
}

/// GPU side of the frame loop. Exactly one frame is ever in flight.
pub trait FrameBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Block until the previous submission retired, then unsignal the in-flight fence.
    fn wait_previous(&mut self) -> Result<(), Self::Error>;
    /// Ask the chain for the next image; completion is signaled GPU-side only.
    fn acquire_image(&mut self) -> Result<u32, Self::Error>;
    /// Re-record the single command buffer for `image_index` and submit it.
    fn record_and_submit(&mut self, image_index: u32) -> Result<(), Self::Error>;
    fn present(&mut self, image_index: u32) -> Result<(), Self::Error>;
    /// Block until the device has no outstanding work.
    fn wait_idle(&mut self) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowSignal {
    QuitRequested,
    Resized(RenderSize),
}

/// Window/event side of the loop.
pub trait EventPump {
    fn poll_events(&mut self) -> Vec<WindowSignal>;
}

#[derive(Clone, Copy, Debug)]
pub struct LoopOptions {
    pub max_frames: Option<u64>,
    pub log_fps: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_frames: None,
            log_fps: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub elapsed: Duration,
}

/// Runs one full `WaitPrevious -> AcquireImage -> RecordAndSubmit -> Present` pass.
/// `stage` is left at the step that was running when an error came back.
pub fn draw_frame<B: FrameBackend>(backend: &mut B, stage: &mut FrameStage) -> Result<u32, B::Error> {
    *stage = FrameStage::WaitPrevious;
    backend.wait_previous()?;

    *stage = FrameStage::AcquireImage;
    let image_index = backend.acquire_image()?;

    *stage = FrameStage::RecordAndSubmit;
    backend.record_and_submit(image_index)?;

    *stage = FrameStage::Present;
    backend.present(image_index)?;

    trace!(image_index, "frame presented");
    Ok(image_index)
}

pub struct FrameLoop {
    options: LoopOptions,
    stage: FrameStage,
    frames: u64,
}

impl FrameLoop {
    pub fn new(options: LoopOptions) -> Self {
        Self {
            options,
            stage: FrameStage::WaitPrevious,
            frames: 0,
        }
    }

    /// Stage the last frame reached; after a failure this is where it failed.
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Draws frames until the pump reports a quit (or `max_frames` is hit), then
    /// waits for the device to go idle so teardown can start.
    ///
    /// The stop signal is checked once per iteration; a frame that has started
    /// always runs to completion.
    pub fn run<B, P>(&mut self, backend: &mut B, pump: &mut P) -> Result<LoopSummary, B::Error>
    where
        B: FrameBackend,
        P: EventPump,
    {
        let started = Instant::now();
        let mut last_fps_instant = started;
        let mut fps_frames = 0u32;
        let mut running = true;

        while running {
            for signal in pump.poll_events() {
                match signal {
                    WindowSignal::QuitRequested => {
                        info!("quit requested");
                        running = false;
                    }
                    WindowSignal::Resized(size) => {
                        warn!(
                            "window resized to {}x{}; swapchain recreation is not supported",
                            size.width, size.height
                        );
                    }
                }
            }
            if !running {
                break;
            }
            if self.options.max_frames.is_some_and(|max| self.frames >= max) {
                info!("frame budget of {} reached", self.frames);
                break;
            }

            if let Err(e) = draw_frame(backend, &mut self.stage) {
                error!(stage = ?self.stage, frame = self.frames, "frame failed: {e}");
                return Err(e);
            }
            self.frames += 1;

            if self.options.log_fps {
                fps_frames = fps_frames.saturating_add(1);
                let now = Instant::now();
                if now.duration_since(last_fps_instant).as_secs_f32() >= 1.0 {
                    debug!("fps ~ {}", fps_frames);
                    fps_frames = 0;
                    last_fps_instant = now;
                }
            }
        }

        backend.wait_idle()?;

        let summary = LoopSummary {
            frames: self.frames,
            elapsed: started.elapsed(),
        };
        info!(
            "frame loop stopped after {} frames in {:.2?}",
            summary.frames, summary.elapsed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, thiserror::Error)]
    #[error("mock failure at {0:?}")]
    struct MockError(FrameStage);

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Call {
        WaitPrevious,
        Acquire,
        Submit(u32),
        Present(u32),
        WaitIdle,
    }

    #[derive(Default)]
    struct MockBackend {
        calls: Vec<Call>,
        image_count: u32,
        next_image: u32,
        fail_at: Option<(u64, FrameStage)>,
        started_frames: u64,
    }

    impl MockBackend {
        fn with_images(image_count: u32) -> Self {
            Self {
                image_count,
                ..Default::default()
            }
        }

        fn count(&self, call: fn(&Call) -> bool) -> usize {
            self.calls.iter().filter(|c| call(c)).count()
        }

        fn check(&self, stage: FrameStage) -> Result<(), MockError> {
            match self.fail_at {
                Some((frame, at)) if frame + 1 == self.started_frames && at == stage => {
                    Err(MockError(stage))
                }
                _ => Ok(()),
            }
        }
    }

    impl FrameBackend for MockBackend {
        type Error = MockError;

        fn wait_previous(&mut self) -> Result<(), MockError> {
            self.started_frames += 1;
            self.check(FrameStage::WaitPrevious)?;
            self.calls.push(Call::WaitPrevious);
            Ok(())
        }

        fn acquire_image(&mut self) -> Result<u32, MockError> {
            self.check(FrameStage::AcquireImage)?;
            self.calls.push(Call::Acquire);
            let idx = self.next_image;
            self.next_image = (self.next_image + 1) % self.image_count.max(1);
            Ok(idx)
        }

        fn record_and_submit(&mut self, image_index: u32) -> Result<(), MockError> {
            self.check(FrameStage::RecordAndSubmit)?;
            self.calls.push(Call::Submit(image_index));
            Ok(())
        }

        fn present(&mut self, image_index: u32) -> Result<(), MockError> {
            self.check(FrameStage::Present)?;
            self.calls.push(Call::Present(image_index));
            Ok(())
        }

        fn wait_idle(&mut self) -> Result<(), MockError> {
            self.calls.push(Call::WaitIdle);
            Ok(())
        }
    }

    /// Reports nothing for `quiet_polls` polls, then a quit.
    struct ScriptedPump {
        script: VecDeque<Vec<WindowSignal>>,
        polls: usize,
    }

    impl ScriptedPump {
        fn quit_after(quiet_polls: usize) -> Self {
            let mut script: VecDeque<_> = (0..quiet_polls).map(|_| Vec::new()).collect();
            script.push_back(vec![WindowSignal::QuitRequested]);
            Self { script, polls: 0 }
        }

        fn never_quits() -> Self {
            Self {
                script: VecDeque::new(),
                polls: 0,
            }
        }
    }

    impl EventPump for ScriptedPump {
        fn poll_events(&mut self) -> Vec<WindowSignal> {
            self.polls += 1;
            self.script.pop_front().unwrap_or_default()
        }
    }

    fn quiet() -> LoopOptions {
        LoopOptions {
            max_frames: None,
            log_fps: false,
        }
    }

    #[test]
    fn n_iterations_do_n_waits_records_and_triples() {
        let n = 7;
        let mut backend = MockBackend::with_images(3);
        let mut pump = ScriptedPump::quit_after(n);

        let summary = FrameLoop::new(quiet()).run(&mut backend, &mut pump).unwrap();

        assert_eq!(summary.frames, n as u64);
        assert_eq!(backend.count(|c| matches!(c, Call::WaitPrevious)), n);
        assert_eq!(backend.count(|c| matches!(c, Call::Acquire)), n);
        assert_eq!(backend.count(|c| matches!(c, Call::Submit(_))), n);
        assert_eq!(backend.count(|c| matches!(c, Call::Present(_))), n);
        assert_eq!(backend.count(|c| matches!(c, Call::WaitIdle)), 1);
    }

    #[test]
    fn every_iteration_is_strictly_ordered() {
        let mut backend = MockBackend::with_images(2);
        let mut pump = ScriptedPump::quit_after(5);
        FrameLoop::new(quiet()).run(&mut backend, &mut pump).unwrap();

        let (frames, tail) = backend.calls.split_at(backend.calls.len() - 1);
        assert_eq!(tail, [Call::WaitIdle]);
        for (i, frame) in frames.chunks(4).enumerate() {
            let image = (i % 2) as u32;
            assert_eq!(
                frame,
                [
                    Call::WaitPrevious,
                    Call::Acquire,
                    Call::Submit(image),
                    Call::Present(image)
                ]
            );
        }
    }

    #[test]
    fn quit_before_first_frame_only_idles() {
        let mut backend = MockBackend::with_images(3);
        let mut pump = ScriptedPump::quit_after(0);

        let summary = FrameLoop::new(quiet()).run(&mut backend, &mut pump).unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(backend.calls, [Call::WaitIdle]);
    }

    #[test]
    fn max_frames_stops_the_loop() {
        let mut backend = MockBackend::with_images(3);
        let mut pump = ScriptedPump::never_quits();
        let opts = LoopOptions {
            max_frames: Some(4),
            log_fps: true,
        };

        let summary = FrameLoop::new(opts).run(&mut backend, &mut pump).unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(backend.calls.last(), Some(&Call::WaitIdle));
        assert_eq!(pump.polls, 5);
    }

    #[test]
    fn resize_signal_does_not_stop_the_loop() {
        let mut backend = MockBackend::with_images(3);
        let mut pump = ScriptedPump {
            script: VecDeque::from(vec![
                vec![WindowSignal::Resized(RenderSize {
                    width: 640,
                    height: 480,
                })],
                vec![],
                vec![WindowSignal::QuitRequested],
            ]),
            polls: 0,
        };

        let summary = FrameLoop::new(quiet()).run(&mut backend, &mut pump).unwrap();
        assert_eq!(summary.frames, 2);
    }

    #[test]
    fn failure_surfaces_with_the_failing_stage() {
        let mut backend = MockBackend::with_images(3);
        backend.fail_at = Some((2, FrameStage::RecordAndSubmit));
        let mut pump = ScriptedPump::never_quits();
        let mut frame_loop = FrameLoop::new(quiet());

        let err = frame_loop.run(&mut backend, &mut pump).unwrap_err();
        assert_eq!(err.0, FrameStage::RecordAndSubmit);
        assert_eq!(frame_loop.stage(), FrameStage::RecordAndSubmit);
        assert_eq!(frame_loop.frames(), 2);
        assert_eq!(backend.count(|c| matches!(c, Call::Present(_))), 2);
        assert_eq!(backend.count(|c| matches!(c, Call::WaitIdle)), 0);
    }

    #[test]
    fn draw_frame_returns_the_acquired_index() {
        let mut backend = MockBackend::with_images(3);
        backend.next_image = 2;
        let mut stage = FrameStage::Present;
        assert_eq!(draw_frame(&mut backend, &mut stage).unwrap(), 2);
        assert_eq!(stage, FrameStage::Present);
        assert_eq!(
            backend.calls,
            [
                Call::WaitPrevious,
                Call::Acquire,
                Call::Submit(2),
                Call::Present(2)
            ]
        );
    }

    #[test]
    fn draw_frame_leaves_stage_at_the_failing_step() {
        let mut backend = MockBackend::with_images(2);
        backend.fail_at = Some((0, FrameStage::AcquireImage));
        let mut stage = FrameStage::Present;
        let err = draw_frame(&mut backend, &mut stage).unwrap_err();
        assert_eq!(err.0, FrameStage::AcquireImage);
        assert_eq!(stage, FrameStage::AcquireImage);
        assert_eq!(backend.calls, [Call::WaitPrevious]);
    }
}
