use std::sync::mpsc::{Receiver, Sender};

use crate::engine::llm_client::LlmClient;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::render_runner::ManimRunner;
use crate::engine::session::{SessionController, Stage};
use crate::error::PipelineResult;
use crate::ui::settings::Settings;

type Notify = Box<dyn Fn() + Send>;

/// Worker that owns the session. Commands are handled strictly one at a
/// time, so pipeline runs never overlap.
pub struct Engine {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    session: SessionController<LlmClient, ManimRunner>,
    notify: Notify,
}

impl Engine {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        settings: &Settings,
        notify: Notify,
    ) -> PipelineResult<Self> {
        let session = SessionController::new(
            LlmClient::new(settings.generation.clone())?,
            ManimRunner::new(settings.render.clone()),
            settings.generation.clone(),
        );

        Ok(Self {
            rx,
            tx,
            session,
            notify,
        })
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            self.handle(cmd);
        }
        tracing::debug!("command channel closed, engine stopping");
    }

    fn handle(&mut self, cmd: EngineCommand) {
        let tx = self.tx.clone();
        let notify = &self.notify;
        let mut progress = |stage: Stage| {
            let _ = tx.send(EngineResponse::Progress(stage.describe().to_string()));
            notify();
        };

        let result = match cmd {
            EngineCommand::Generate { prompt, api_key } => self
                .session
                .create(&prompt, &api_key, &mut progress)
                .map(|_| ()),

            EngineCommand::ApplyEdit { changes, api_key } => self
                .session
                .apply_edit(&changes, &api_key, &mut progress)
                .map(|_| ()),

            EngineCommand::BeginEdit { index } => self.session.begin_edit(index),

            EngineCommand::CancelEdit => {
                self.session.cancel_edit();
                Ok(())
            }

            EngineCommand::StartNew => {
                self.session.start_new();
                Ok(())
            }

            EngineCommand::UpdateSettings(settings) => LlmClient::new(settings.generation.clone())
                .map(|client| {
                    tracing::info!("engine reconfigured");
                    self.session.reconfigure(
                        client,
                        ManimRunner::new(settings.render.clone()),
                        settings.generation,
                    );
                }),
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "command failed");
            let _ = self.tx.send(EngineResponse::Failed(e.to_string()));
        }

        let _ = self
            .tx
            .send(EngineResponse::SessionUpdated(self.session.state().clone()));
        (self.notify)();
    }
}
