// ============================================================================
// pertitle-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// This module provides abstractions for spawning ffmpeg processes, draining
// their log output and bounding their runtime with a deadline.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner/SidecarProcess: Implementation using ffmpeg-sidecar
// - run_ffmpeg: spawn, capture log lines, wait with deadline, check status
//
// ARCHITECTURE:
// Log lines are drained on a background thread while the calling thread polls
// the process for completion, so a chatty process can never stall on a full
// pipe while the deadline is being enforced.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error};
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::process::ExitStatus;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Interval between completion checks while a deadline is active.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Number of trailing log lines kept in a `CommandFailed` error.
const ERROR_TAIL_LINES: usize = 5;

// --- FFmpeg Execution Abstraction ---

/// Log lines of a running process, collected on a background thread.
pub struct LogCapture(JoinHandle<Vec<String>>);

impl LogCapture {
    /// Drains `lines` on a new thread.
    pub fn spawn<I>(lines: I) -> Self
    where
        I: Iterator<Item = String> + Send + 'static,
    {
        Self(std::thread::spawn(move || lines.collect()))
    }

    /// Waits for the output to be fully drained.
    pub fn join(self) -> Vec<String> {
        self.0.join().unwrap_or_default()
    }
}

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Starts draining the process log output. Must be called once, before waiting.
    fn capture_log(&mut self) -> CoreResult<LogCapture>;

    /// Returns the exit status if the process has finished.
    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;

    /// Terminates the process.
    fn kill(&mut self) -> CoreResult<()>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner: Send + Sync {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn capture_log(&mut self) -> CoreResult<LogCapture> {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {}", e);
            command_failed_error(
                "ffmpeg (sidecar - get iter)",
                ExitStatus::default(),
                e.to_string(),
            )
        })?;

        Ok(LogCapture::spawn(iterator.filter_map(|event| match event {
            FfmpegEvent::Log(_, line) | FfmpegEvent::Error(line) => Some(line),
            _ => None,
        })))
    }

    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
        self.0
            .as_inner_mut()
            .try_wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }

    fn kill(&mut self) -> CoreResult<()> {
        self.0
            .kill()
            .map_err(|e| command_wait_error("ffmpeg (sidecar kill)", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))
    }
}

// --- Deadline Handling ---

/// Waits for `process`, killing it once `timeout` has elapsed.
pub fn wait_with_deadline<P: FfmpegProcess>(
    process: &mut P,
    operation: &str,
    timeout: Option<Duration>,
) -> CoreResult<ExitStatus> {
    let Some(timeout) = timeout else {
        return process.wait();
    };

    let start = Instant::now();
    loop {
        if let Some(status) = process.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() >= timeout {
            log::warn!("{} exceeded {:.1}s, killing process", operation, timeout.as_secs_f64());
            if let Err(e) = process.kill() {
                log::warn!("Failed to kill {}: {}", operation, e);
            }
            // Reap the child so it does not linger as a zombie.
            let _ = process.wait();
            return Err(CoreError::Timeout {
                operation: operation.to_string(),
                timeout,
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Runs an ffmpeg command to completion and returns its log lines.
///
/// A non-zero exit status becomes a `CommandFailed` error carrying the last
/// few log lines; an expired deadline becomes a `Timeout` error.
pub fn run_ffmpeg<S: FfmpegSpawner>(
    spawner: &S,
    mut cmd: FfmpegCommand,
    operation: &str,
    timeout: Option<Duration>,
) -> CoreResult<Vec<String>> {
    log::debug!(
        "Running {}: ffmpeg {}",
        operation,
        cmd.as_inner()
            .get_args()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut process = spawner.spawn(cmd)?;
    let capture = process.capture_log()?;
    let status = wait_with_deadline(&mut process, operation, timeout);
    let lines = capture.join();
    let status = status?;

    if !status.success() {
        let tail_start = lines.len().saturating_sub(ERROR_TAIL_LINES);
        let tail = lines[tail_start..].join("\n");
        log::error!("{} failed with {}", operation, status);
        return Err(command_failed_error(operation, status, tail));
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Process that reports completion after a fixed number of polls.
    struct FakeProcess {
        polls_until_exit: Option<usize>,
        polls: usize,
        killed: bool,
    }

    impl FakeProcess {
        fn new(polls_until_exit: Option<usize>) -> Self {
            Self { polls_until_exit, polls: 0, killed: false }
        }
    }

    impl FfmpegProcess for FakeProcess {
        fn capture_log(&mut self) -> CoreResult<LogCapture> {
            Ok(LogCapture::spawn(std::iter::empty()))
        }

        fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
            self.polls += 1;
            match self.polls_until_exit {
                Some(limit) if self.polls >= limit => Ok(Some(ExitStatus::default())),
                _ => Ok(None),
            }
        }

        fn wait(&mut self) -> CoreResult<ExitStatus> {
            Ok(ExitStatus::default())
        }

        fn kill(&mut self) -> CoreResult<()> {
            self.killed = true;
            Ok(())
        }
    }

    #[test]
    fn test_deadline_kills_hung_process() {
        let mut process = FakeProcess::new(None);
        let err = wait_with_deadline(&mut process, "cbr encode", Some(Duration::from_millis(50)))
            .unwrap_err();
        assert!(process.killed);
        assert!(matches!(err, CoreError::Timeout { ref operation, .. } if operation == "cbr encode"));
    }

    #[test]
    fn test_process_finishing_in_time() {
        let mut process = FakeProcess::new(Some(2));
        let status = wait_with_deadline(&mut process, "crf encode", Some(Duration::from_secs(10))).unwrap();
        assert!(status.success());
        assert!(!process.killed);

        let mut unbounded = FakeProcess::new(None);
        assert!(wait_with_deadline(&mut unbounded, "crf encode", None).unwrap().success());
        assert_eq!(unbounded.polls, 0);
    }

    #[test]
    fn test_log_capture_collects_lines() {
        let capture = LogCapture::spawn(vec!["a".to_string(), "b".to_string()].into_iter());
        assert_eq!(capture.join(), vec!["a", "b"]);
    }
}
