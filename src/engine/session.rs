use std::fs;
use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::engine::code_extractor::extract_code;
use crate::engine::llm_client::CodeGenerator;
use crate::engine::prompt_builder::PromptBuilder;
use crate::engine::render_runner::SceneRenderer;
use crate::error::{PipelineError, PipelineResult};
use crate::model::history_entry::{HistoryEntry, Outcome};
use crate::model::message::GenerationPrompt;
use crate::model::session_state::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generating,
    Rendering,
}

impl Stage {
    pub fn describe(self) -> &'static str {
        match self {
            Stage::Generating => "Generating code…",
            Stage::Rendering => "Rendering animation (may take 1-2 minutes)…",
        }
    }
}

/// Runs the create and edit flows and owns the session they mutate.
///
/// Each call runs the whole pipeline before returning; the caller never
/// has two in flight.
pub struct SessionController<G, R> {
    generator: G,
    renderer: R,
    config: GenerationConfig,
    state: SessionState,
}

impl<G: CodeGenerator, R: SceneRenderer> SessionController<G, R> {
    pub fn new(generator: G, renderer: R, config: GenerationConfig) -> Self {
        Self {
            generator,
            renderer,
            config,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Swap the backends after a settings change. The session itself is kept.
    pub fn reconfigure(&mut self, generator: G, renderer: R, config: GenerationConfig) {
        self.generator = generator;
        self.renderer = renderer;
        self.config = config;
    }

    /// New animation from a free-text description.
    ///
    /// Credential, API and extraction failures record nothing. Once code
    /// exists the run is recorded, with the render or read failure as the
    /// entry's error.
    pub fn create(
        &mut self,
        description: &str,
        api_key: &str,
        progress: &mut dyn FnMut(Stage),
    ) -> PipelineResult<&HistoryEntry> {
        let description = description.trim();
        if api_key.trim().is_empty() {
            return Err(PipelineError::MissingCredential);
        }
        if description.is_empty() {
            return Err(PipelineError::EmptyPrompt);
        }

        self.leave_edit_mode();

        let code = self.generate_code(&PromptBuilder::create(&self.config, description), api_key, progress)?;

        progress(Stage::Rendering);
        let outcome = match self.render_to_memory(&code) {
            Ok(video) => Outcome::Video(video),
            Err(e) => {
                tracing::warn!(error = %e, "create run failed after code generation");
                Outcome::Error(recorded_error(&e))
            }
        };

        tracing::info!(entries = self.state.history.len() + 1, "recording history entry");
        Ok(self.state.record(HistoryEntry::created(description, code, outcome)))
    }

    /// Modify the current entry. Only a successful render is recorded;
    /// every failure is returned and history is left alone.
    pub fn apply_edit(
        &mut self,
        changes: &str,
        api_key: &str,
        progress: &mut dyn FnMut(Stage),
    ) -> PipelineResult<&HistoryEntry> {
        let base = self.state.editing().cloned().ok_or(PipelineError::NotEditing)?;
        let changes = changes.trim();
        if api_key.trim().is_empty() {
            return Err(PipelineError::MissingCredential);
        }
        if changes.is_empty() {
            return Err(PipelineError::EmptyChanges);
        }

        let prompt = PromptBuilder::edit(&self.config, &base.code, changes);
        let code = self.generate_code(&prompt, api_key, progress)?;

        progress(Stage::Rendering);
        let video = self.render_to_memory(&code)?;

        tracing::info!(entries = self.state.history.len() + 1, "recording edit");
        Ok(self.state.record(HistoryEntry::edited(&base, changes, code, video)))
    }

    /// Enter edit mode on any recorded entry.
    pub fn begin_edit(&mut self, index: usize) -> PipelineResult<()> {
        let entry = self
            .state
            .history
            .get(index)
            .cloned()
            .ok_or(PipelineError::NotEditing)?;

        tracing::debug!(index, "entering edit mode");
        self.state.current = Some(entry);
        self.state.edit_mode = true;
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.leave_edit_mode();
    }

    pub fn start_new(&mut self) {
        self.leave_edit_mode();
    }

    fn leave_edit_mode(&mut self) {
        self.state.current = None;
        self.state.edit_mode = false;
    }

    fn generate_code(
        &self,
        prompt: &GenerationPrompt,
        api_key: &str,
        progress: &mut dyn FnMut(Stage),
    ) -> PipelineResult<String> {
        progress(Stage::Generating);
        let raw = self.generator.generate(prompt, api_key)?;

        let code = extract_code(&raw);
        if code.trim().is_empty() {
            tracing::warn!(raw_chars = raw.len(), "no code in model output");
            return Err(PipelineError::NoCode);
        }
        Ok(code)
    }

    /// Render inside a fresh temp dir and read the video back. The dir is
    /// removed when this returns, whatever the outcome.
    fn render_to_memory(&self, code: &str) -> PipelineResult<Arc<[u8]>> {
        let work_dir = tempfile::Builder::new()
            .prefix("manim-studio-")
            .tempdir()
            .map_err(|e| PipelineError::Workspace(e.to_string()))?;

        let video_path = self.renderer.render(code, work_dir.path())?;
        let bytes = fs::read(&video_path).map_err(|e| PipelineError::VideoRead(e.to_string()))?;

        Ok(Arc::from(bytes))
    }
}

/// Render failures are stored as the engine's own text; everything else
/// keeps its user-facing label.
fn recorded_error(err: &PipelineError) -> String {
    match err {
        PipelineError::Render(e) => e.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    const DEMO_REPLY: &str =
        "```python\nfrom manim import *\n\nclass DemoScene(Scene):\n    def construct(self):\n        self.play(Rotate(Square(color=RED)))\n```";

    struct FakeGenerator {
        replies: RefCell<Vec<PipelineResult<String>>>,
        prompts: RefCell<Vec<GenerationPrompt>>,
    }

    impl FakeGenerator {
        fn replying(replies: Vec<PipelineResult<String>>) -> Self {
            Self {
                replies: RefCell::new(replies.into_iter().rev().collect()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl CodeGenerator for &FakeGenerator {
        fn generate(&self, prompt: &GenerationPrompt, _api_key: &str) -> PipelineResult<String> {
            self.prompts.borrow_mut().push(prompt.clone());
            self.replies
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Ok(DEMO_REPLY.to_string()))
        }
    }

    enum FakeRender {
        Video(&'static [u8]),
        Fail(RenderError),
        PhantomFile,
    }

    struct FakeRenderer {
        plan: RefCell<Vec<FakeRender>>,
        work_dirs: RefCell<Vec<PathBuf>>,
    }

    impl FakeRenderer {
        fn planned(plan: Vec<FakeRender>) -> Self {
            Self {
                plan: RefCell::new(plan.into_iter().rev().collect()),
                work_dirs: RefCell::new(Vec::new()),
            }
        }
    }

    impl SceneRenderer for &FakeRenderer {
        fn render(&self, _code: &str, work_dir: &Path) -> Result<PathBuf, RenderError> {
            self.work_dirs.borrow_mut().push(work_dir.to_path_buf());
            let step = self.plan.borrow_mut().pop().unwrap_or(FakeRender::Video(b"video"));
            match step {
                FakeRender::Video(bytes) => {
                    let path = work_dir.join("DemoScene.mp4");
                    fs::write(&path, bytes).unwrap();
                    Ok(path)
                }
                FakeRender::Fail(e) => Err(e),
                FakeRender::PhantomFile => Ok(work_dir.join("never-written.mp4")),
            }
        }
    }

    fn controller<'a>(
        generator: &'a FakeGenerator,
        renderer: &'a FakeRenderer,
    ) -> SessionController<&'a FakeGenerator, &'a FakeRenderer> {
        SessionController::new(generator, renderer, GenerationConfig::default())
    }

    fn no_progress() -> impl FnMut(Stage) {
        |_| {}
    }

    #[test]
    fn create_success_records_single_video_entry() {
        let generator = FakeGenerator::replying(vec![Ok(DEMO_REPLY.into())]);
        let renderer = FakeRenderer::planned(vec![FakeRender::Video(b"mp4-bytes")]);
        let mut session = controller(&generator, &renderer);

        let mut stages = Vec::new();
        let entry = session
            .create("rotating red square", "sk", &mut |s| stages.push(s))
            .unwrap()
            .clone();

        assert_eq!(entry.video(), Some(&b"mp4-bytes"[..]));
        assert!(entry.error().is_none());
        assert!(entry.code.contains("class DemoScene(Scene):"));
        assert_eq!(entry.original_prompt, "rotating red square");
        assert_eq!(stages, [Stage::Generating, Stage::Rendering]);

        let state = session.state();
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.current.as_ref(), Some(&entry));
        assert!(!state.edit_mode);
    }

    #[test]
    fn work_dir_is_removed_after_each_run() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![
            FakeRender::Video(b"ok"),
            FakeRender::Fail(RenderError::VideoNotFound),
        ]);
        let mut session = controller(&generator, &renderer);

        session.create("a", "sk", &mut no_progress()).unwrap();
        session.create("b", "sk", &mut no_progress()).unwrap();

        let dirs = renderer.work_dirs.borrow();
        assert_eq!(dirs.len(), 2);
        assert_ne!(dirs[0], dirs[1]);
        assert!(dirs.iter().all(|d| !d.exists()));
    }

    #[test]
    fn api_error_aborts_without_history() {
        let generator = FakeGenerator::replying(vec![Err(PipelineError::api(
            "HTTP status server error (500 Internal Server Error)",
        ))]);
        let renderer = FakeRenderer::planned(vec![]);
        let mut session = controller(&generator, &renderer);

        let err = session.create("rotating red square", "sk", &mut no_progress()).unwrap_err();
        assert!(err.to_string().starts_with("API Error:"));
        assert!(session.state().history.is_empty());
        assert!(renderer.work_dirs.borrow().is_empty());
    }

    #[test]
    fn missing_credential_is_caught_before_calling_out() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![]);
        let mut session = controller(&generator, &renderer);

        assert_eq!(
            session.create("square", "  ", &mut no_progress()).unwrap_err(),
            PipelineError::MissingCredential
        );
        assert!(generator.prompts.borrow().is_empty());
    }

    #[test]
    fn prose_reply_is_no_code_and_skips_rendering() {
        let generator = FakeGenerator::replying(vec![Ok("Sorry, I can't do that.".into())]);
        let renderer = FakeRenderer::planned(vec![]);
        let mut session = controller(&generator, &renderer);

        assert_eq!(
            session.create("square", "sk", &mut no_progress()).unwrap_err(),
            PipelineError::NoCode
        );
        assert!(session.state().history.is_empty());
        assert!(renderer.work_dirs.borrow().is_empty());
    }

    #[test]
    fn render_failure_is_recorded_with_code_kept() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![FakeRender::Fail(RenderError::Failed {
            stderr: "NameError: Sqare".into(),
        })]);
        let mut session = controller(&generator, &renderer);

        let entry = session.create("square", "sk", &mut no_progress()).unwrap().clone();
        assert!(entry.video().is_none());
        let error = entry.error().unwrap();
        assert!(error.contains("NameError: Sqare"));
        assert!(error.contains("Possible solutions"));
        assert!(entry.code.contains("DemoScene"));
        assert_eq!(session.state().history.len(), 1);
    }

    #[test]
    fn exit_zero_without_video_is_recorded_as_not_found() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![FakeRender::Fail(RenderError::VideoNotFound)]);
        let mut session = controller(&generator, &renderer);

        let entry = session.create("square", "sk", &mut no_progress()).unwrap();
        assert_eq!(entry.error(), Some("Video file not found"));
    }

    #[test]
    fn unreadable_artifact_is_recorded_as_read_error() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![FakeRender::PhantomFile]);
        let mut session = controller(&generator, &renderer);

        let entry = session.create("square", "sk", &mut no_progress()).unwrap();
        assert!(entry.error().unwrap().starts_with("Video read error:"));
    }

    #[test]
    fn successful_edit_appends_and_carries_original_prompt() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![FakeRender::Video(b"v1"), FakeRender::Video(b"v2")]);
        let mut session = controller(&generator, &renderer);

        session.create("rotating red square", "sk", &mut no_progress()).unwrap();
        session.begin_edit(0).unwrap();
        let edited = session.apply_edit("make it blue", "sk", &mut no_progress()).unwrap().clone();

        assert_eq!(edited.prompt, "EDITED: make it blue");
        assert_eq!(edited.original_prompt, "rotating red square");
        assert_eq!(edited.video(), Some(&b"v2"[..]));

        let state = session.state();
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.current.as_ref(), Some(&edited));
        assert!(state.edit_mode);

        let prompts = generator.prompts.borrow();
        assert!(prompts[1].messages[1].content.contains("class DemoScene(Scene):"));
        assert!(prompts[1].messages[1].content.contains("make it blue"));
    }

    #[test]
    fn failed_edit_leaves_history_untouched() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![
            FakeRender::Video(b"v1"),
            FakeRender::Fail(RenderError::Timeout { secs: 120 }),
        ]);
        let mut session = controller(&generator, &renderer);

        session.create("square", "sk", &mut no_progress()).unwrap();
        session.begin_edit(0).unwrap();
        let before = session.state().clone();

        let err = session.apply_edit("spin faster", "sk", &mut no_progress()).unwrap_err();
        assert!(matches!(err, PipelineError::Render(RenderError::Timeout { .. })));
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn edit_requires_edit_mode_and_a_description() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![]);
        let mut session = controller(&generator, &renderer);

        assert_eq!(
            session.apply_edit("blue", "sk", &mut no_progress()).unwrap_err(),
            PipelineError::NotEditing
        );

        session.create("square", "sk", &mut no_progress()).unwrap();
        assert_eq!(
            session.apply_edit("blue", "sk", &mut no_progress()).unwrap_err(),
            PipelineError::NotEditing
        );

        session.begin_edit(0).unwrap();
        assert_eq!(
            session.apply_edit("   ", "sk", &mut no_progress()).unwrap_err(),
            PipelineError::EmptyChanges
        );
        assert_eq!(session.begin_edit(7).unwrap_err(), PipelineError::NotEditing);
    }

    #[test]
    fn starting_new_after_edit_clears_current_but_keeps_history() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![]);
        let mut session = controller(&generator, &renderer);

        session.create("square", "sk", &mut no_progress()).unwrap();
        session.begin_edit(0).unwrap();
        session.apply_edit("blue", "sk", &mut no_progress()).unwrap();
        assert_eq!(session.state().history.len(), 2);

        session.start_new();
        let state = session.state();
        assert_eq!(state.history.len(), 2);
        assert!(state.current.is_none());
        assert!(!state.edit_mode);
    }

    #[test]
    fn failed_create_from_edit_mode_lands_in_create_mode() {
        let generator = FakeGenerator::replying(vec![
            Ok(DEMO_REPLY.into()),
            Err(PipelineError::api("HTTP status server error (502 Bad Gateway)")),
        ]);
        let renderer = FakeRenderer::planned(vec![]);
        let mut session = controller(&generator, &renderer);

        session.create("square", "sk", &mut no_progress()).unwrap();
        session.begin_edit(0).unwrap();

        session.create("circle", "sk", &mut no_progress()).unwrap_err();
        let state = session.state();
        assert!(!state.edit_mode);
        assert!(state.current.is_none());
        assert!(state.editing().is_none());
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn cancel_edit_returns_to_create_mode() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![FakeRender::Fail(RenderError::VideoNotFound)]);
        let mut session = controller(&generator, &renderer);

        session.create("square", "sk", &mut no_progress()).unwrap();
        // Failed entries are editable too, so broken code can be repaired.
        session.begin_edit(0).unwrap();
        assert!(session.state().editing().is_some());

        session.cancel_edit();
        assert!(session.state().editing().is_none());
        assert!(session.state().current.is_none());
        assert_eq!(session.state().history.len(), 1);
    }

    #[test]
    fn every_entry_has_exactly_one_outcome() {
        let generator = FakeGenerator::replying(vec![]);
        let renderer = FakeRenderer::planned(vec![
            FakeRender::Video(b"a"),
            FakeRender::Fail(RenderError::VideoNotFound),
            FakeRender::PhantomFile,
        ]);
        let mut session = controller(&generator, &renderer);

        for prompt in ["one", "two", "three"] {
            session.create(prompt, "sk", &mut no_progress()).unwrap();
        }

        for entry in &session.state().history {
            assert!(entry.video().is_some() != entry.error().is_some());
        }
    }
}
