use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use crate::{
    notices::Notice,
    operators::{OperatorCommand, OperatorMessage, OperatorRequest},
};

use super::ui_types::*;

impl App {
    pub fn start_operators(&mut self) {
        self.operators_started = true;

        debug!("starting operator thread ({})", self.settings.server_url);

        match crate::operators::start_operator_thread(&self.settings, self.inbox.sender()) {
            Ok((tx, status)) => {
                self.operator_tx = Some(tx);
                self.operator_status = Some(status);
            }
            Err(e) => {
                error!("Failed to start operator thread: {:#}", e);
                self.notices
                    .push(Notice::error(format!("Failed to start operators: {:#}", e)));
            }
        }
    }

    /// Drops the current worker, which exits once its calls finish, and
    /// starts a new one with the current settings on the next frame.
    pub fn restart_operators(&mut self) {
        self.operator_tx = None;
        self.operator_status = None;
        self.operators_started = false;
    }

    fn send_operator(&mut self, cmd: OperatorCommand) -> Result<()> {
        let Some(tx) = &self.operator_tx else {
            bail!("Operator worker is not running");
        };
        tx.try_send(cmd)
            .map_err(|e| anyhow!("Failed to queue operator call: {}", e))
    }

    /// Hands a validated call to the worker, or resolves it as failed.
    fn submit(&mut self, cmd: OperatorCommand) -> bool {
        let failed = cmd.clone();
        if let Err(e) = self.send_operator(cmd) {
            error!("{}", e);
            let notice = self.session.complete(&failed.outcome(Err(e.to_string())));
            self.notices.push(notice);
            return false;
        }
        true
    }

    pub fn save_as_keypoints(&mut self) {
        match self.session.save_as_keypoints(self.active_sample.as_ref()) {
            Ok(req) => {
                debug!(
                    "Saving {} keypoints to {} on {}",
                    req.keypoints.len(),
                    req.field_name,
                    req.sample_id
                );
                let cmd = OperatorCommand::new(
                    self.session.generation(),
                    OperatorRequest::SaveKeypoints(req),
                );
                self.submit(cmd);
            }
            Err(e) => {
                warn!("Save rejected: {}", e);
                self.notices.push(e.into());
            }
        }
    }

    pub fn segment_with_keypoints(&mut self) {
        match self.session.segment_with_keypoints(self.active_sample.as_ref()) {
            Ok(req) => {
                debug!(
                    "Segmenting {} from {} with {}",
                    req.sample_id, req.keypoints_field, req.model_name
                );
                let cmd = OperatorCommand::new(
                    self.session.generation(),
                    OperatorRequest::SegmentWithKeypoints(req),
                );
                if self.submit(cmd) {
                    self.notices.push(Notice::info("Segmentation started ..."));
                }
            }
            Err(e) => {
                warn!("Segmentation rejected: {}", e);
                self.notices.push(e.into());
            }
        }
    }

    pub fn handle_operator_messages(&mut self, ctx: &egui::Context) {
        self.inbox.set_ctx(ctx);
        let messages: Vec<_> = self.inbox.read_without_ctx().collect();
        for msg in messages {
            match msg {
                OperatorMessage::Completed(outcome) => {
                    debug!("{} completed: {:?}", outcome.kind, outcome.result);
                    let notice = self.session.complete(&outcome);
                    self.notices.push(notice);
                }
            }
        }
    }
}
