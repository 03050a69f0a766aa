use std::ffi::OsString;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::RenderConfig;
use crate::error::RenderError;

pub const SCENE_FILE: &str = "scene.py";
pub const BASE_IMPORT: &str = "from manim import *\n";
pub const BASE_SCENE: &str = "Scene";
pub const DEFAULT_SCENE_CLASS: &str = "GeneratedScene";
pub const PRIMARY_QUALITY_DIR: &str = "480p15";

const ENGINE_NAME: &str = "manim";
const KNOWN_ENGINE_LOCATIONS: &[&str] = &[
    "/usr/local/bin/manim",
    "/opt/conda/bin/manim",
    "/home/manimuser/.local/bin/manim",
];
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const PIPE_GRACE: Duration = Duration::from_secs(2);

/// Anything that can turn scene source into a video file inside `work_dir`.
pub trait SceneRenderer {
    fn render(&self, code: &str, work_dir: &Path) -> Result<PathBuf, RenderError>;
}

/// Runs the manim CLI as a subprocess.
pub struct ManimRunner {
    config: RenderConfig,
}

struct RunOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl RunOutput {
    /// stderr, or stdout when the engine printed its traceback there.
    fn diagnostics(self) -> String {
        if self.stderr.trim().is_empty() {
            self.stdout
        } else {
            self.stderr
        }
    }
}

impl ManimRunner {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    fn run(&self, engine: &Path, args: &[OsString], work_dir: &Path) -> Result<RunOutput, RenderError> {
        let mut child = Command::new(engine)
            .args(args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RenderError::Launch(format!("failed to launch {}: {e}", engine.display())))?;

        let (pipe_tx, pipe_rx) = mpsc::channel();
        if let Some(out) = child.stdout.take() {
            spawn_reader(Pipe::Stdout, out, pipe_tx.clone());
        }
        if let Some(err) = child.stderr.take() {
            spawn_reader(Pipe::Stderr, err, pipe_tx.clone());
        }
        drop(pipe_tx);

        // An absurd timeout from settings means no deadline rather than an overflow.
        let deadline = Instant::now().checked_add(Duration::from_secs(self.config.timeout_secs));

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if deadline.is_some_and(|d| Instant::now() >= d) => {
                    tracing::warn!(secs = self.config.timeout_secs, "render timed out, killing engine");
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RenderError::Timeout {
                        secs: self.config.timeout_secs,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RenderError::Launch(format!("failed waiting for engine: {e}")));
                }
            }
        };

        let (stdout, stderr) = collect_pipes(&pipe_rx, deadline);
        Ok(RunOutput {
            status,
            stdout,
            stderr,
        })
    }
}

impl SceneRenderer for ManimRunner {
    fn render(&self, code: &str, work_dir: &Path) -> Result<PathBuf, RenderError> {
        write_scene(code, work_dir)
            .map_err(|e| RenderError::Launch(format!("failed to write {SCENE_FILE}: {e}")))?;

        let class_name = scene_class_name(code);
        let engine = self
            .config
            .engine_path
            .clone()
            .unwrap_or_else(|| locate_engine(std::env::var_os("PATH"), KNOWN_ENGINE_LOCATIONS));

        tracing::info!(engine = %engine.display(), class = %class_name, "rendering scene");

        let output = self.run(&engine, &primary_args(&class_name, work_dir), work_dir)?;
        if !output.status.success() {
            tracing::warn!(status = %output.status, "render failed");
            let diagnostics = output.diagnostics();

            if !self.config.retry_low_fidelity {
                return Err(RenderError::Failed { stderr: diagnostics });
            }

            tracing::info!("retrying with low-fidelity settings");
            let retry = self.run(&engine, &fallback_args(&class_name, work_dir), work_dir)?;
            if !retry.status.success() {
                tracing::warn!(status = %retry.status, "low-fidelity retry failed");
                return Err(RenderError::Failed { stderr: diagnostics });
            }
        }

        let video = find_video(work_dir, &class_name).ok_or(RenderError::VideoNotFound)?;
        tracing::info!(video = %video.display(), "render finished");
        Ok(video)
    }
}

/// Writes the snippet with the base import prepended so it runs standalone.
pub fn write_scene(code: &str, work_dir: &Path) -> io::Result<PathBuf> {
    let path = work_dir.join(SCENE_FILE);
    let mut contents = String::with_capacity(BASE_IMPORT.len() + code.len());
    contents.push_str(BASE_IMPORT);
    contents.push_str(code);
    fs::write(&path, contents)?;
    Ok(path)
}

/// Name of the first top-level `class Name(..., Scene, ...):` declaration.
///
/// Only that one shape is recognised. Generated code that declares its scene
/// some other way is not repaired; it renders under the default name and fails.
pub fn detect_scene_class(code: &str) -> Option<String> {
    code.lines().find_map(parse_scene_declaration)
}

pub fn scene_class_name(code: &str) -> String {
    detect_scene_class(code).unwrap_or_else(|| DEFAULT_SCENE_CLASS.to_string())
}

fn parse_scene_declaration(line: &str) -> Option<String> {
    let rest = line.strip_prefix("class")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();

    let name_len = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let name = &rest[..name_len];
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let bases = rest[name_len..].trim_start().strip_prefix('(')?;
    let (bases, tail) = bases.split_once(')')?;
    if !tail.trim_start().starts_with(':') {
        return None;
    }

    bases
        .split(',')
        .any(|b| b.trim() == BASE_SCENE)
        .then(|| name.to_string())
}

/// PATH entries first, then the usual install locations, then the bare name.
pub fn locate_engine(path_var: Option<OsString>, known: &[&str]) -> PathBuf {
    if let Some(paths) = path_var {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(ENGINE_NAME);
            if candidate.is_file() {
                return candidate;
            }
        }
    }

    known
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .unwrap_or_else(|| PathBuf::from(ENGINE_NAME))
}

fn primary_args(class_name: &str, work_dir: &Path) -> Vec<OsString> {
    let mut args = vec![OsString::from("-ql")];
    args.extend(scene_args(class_name, work_dir));
    args
}

fn fallback_args(class_name: &str, work_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["--resolution", "480,320", "--fps", "15"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.extend(scene_args(class_name, work_dir));
    args
}

/// The media dir goes through as an `OsString` so non-UTF-8 temp paths survive.
fn scene_args(class_name: &str, work_dir: &Path) -> Vec<OsString> {
    vec![
        SCENE_FILE.into(),
        class_name.into(),
        "--media_dir".into(),
        work_dir.as_os_str().to_owned(),
        "--output_file".into(),
        class_name.into(),
    ]
}

/// Looks for `<work_dir>/videos/scene/<quality>/*<class>*.mp4`, primary quality first.
pub fn find_video(work_dir: &Path, class_name: &str) -> Option<PathBuf> {
    let videos = work_dir.join("videos").join("scene");

    let mut dirs = vec![videos.join(PRIMARY_QUALITY_DIR)];
    if let Ok(entries) = fs::read_dir(&videos) {
        let mut others: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir() && !p.ends_with(PRIMARY_QUALITY_DIR))
            .collect();
        others.sort();
        dirs.extend(others);
    }

    dirs.iter().find_map(|dir| {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .ok()?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension().is_some_and(|ext| ext == "mp4")
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.contains(class_name))
            })
            .collect();
        files.sort();
        files.into_iter().next()
    })
}

#[derive(Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

fn spawn_reader(pipe: Pipe, mut stream: impl Read + Send + 'static, tx: mpsc::Sender<(Pipe, String)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stream.read_to_end(&mut buf);
        let _ = tx.send((pipe, String::from_utf8_lossy(&buf).into_owned()));
    });
}

/// Gathers both pipes, waiting no later than the deadline (or a short grace
/// once it has passed or when there is none). A background process left
/// behind by the engine can keep a pipe open forever; whatever has not
/// arrived by then is dropped.
fn collect_pipes(rx: &mpsc::Receiver<(Pipe, String)>, deadline: Option<Instant>) -> (String, String) {
    let (mut stdout, mut stderr) = (String::new(), String::new());

    loop {
        let wait = deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
            .unwrap_or_default()
            .max(PIPE_GRACE);

        match rx.recv_timeout(wait) {
            Ok((Pipe::Stdout, text)) => stdout = text,
            Ok((Pipe::Stderr, text)) => stderr = text,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!("engine output still open after exit, not waiting for it");
                break;
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    (stdout, stderr)
}
