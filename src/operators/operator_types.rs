use std::{future::Future, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Local};
use egui_inbox::UiInboxSender;
use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SubmissionKind {
    SaveKeypoints,
    SegmentWithKeypoints,
}

impl SubmissionKind {
    pub fn operator_name(&self) -> &'static str {
        match self {
            SubmissionKind::SaveKeypoints => "save_keypoints",
            SubmissionKind::SegmentWithKeypoints => "segment_with_keypoints",
        }
    }
}

impl std::fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionKind::SaveKeypoints => write!(f, "Save"),
            SubmissionKind::SegmentWithKeypoints => write!(f, "Segmentation"),
        }
    }
}

/// Params of the `save_keypoints` operator.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SaveKeypointsRequest {
    pub sample_id: String,
    pub keypoints: Vec<[f64; 2]>,
    pub field_name: String,
    pub label_name: String,
}

/// Params of the `segment_with_keypoints` operator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SegmentRequest {
    pub sample_id: String,
    /// Saved field holding the prompt keypoints
    pub keypoints_field: String,
    pub model_name: String,
}

#[derive(Debug, Clone)]
pub enum OperatorRequest {
    SaveKeypoints(SaveKeypointsRequest),
    SegmentWithKeypoints(SegmentRequest),
}

/// A request tagged with the session generation that issued it.
#[derive(Debug, Clone)]
pub struct OperatorCommand {
    pub generation: u64,
    pub request: OperatorRequest,
}

impl OperatorCommand {
    pub fn new(generation: u64, request: OperatorRequest) -> Self {
        OperatorCommand {
            generation,
            request,
        }
    }

    pub fn kind(&self) -> SubmissionKind {
        match &self.request {
            OperatorRequest::SaveKeypoints(_) => SubmissionKind::SaveKeypoints,
            OperatorRequest::SegmentWithKeypoints(_) => SubmissionKind::SegmentWithKeypoints,
        }
    }

    pub fn sample_id(&self) -> &str {
        match &self.request {
            OperatorRequest::SaveKeypoints(req) => &req.sample_id,
            OperatorRequest::SegmentWithKeypoints(req) => &req.sample_id,
        }
    }

    /// Field written by the save, or read by the segmentation.
    pub fn field(&self) -> &str {
        match &self.request {
            OperatorRequest::SaveKeypoints(req) => &req.field_name,
            OperatorRequest::SegmentWithKeypoints(req) => &req.keypoints_field,
        }
    }

    pub fn params(&self) -> Result<serde_json::Value> {
        let params = match &self.request {
            OperatorRequest::SaveKeypoints(req) => serde_json::to_value(req)?,
            OperatorRequest::SegmentWithKeypoints(req) => serde_json::to_value(req)?,
        };
        Ok(params)
    }

    pub fn outcome(&self, result: Result<(), String>) -> OperatorOutcome {
        OperatorOutcome {
            kind: self.kind(),
            generation: self.generation,
            sample_id: self.sample_id().to_string(),
            field: self.field().to_string(),
            result,
        }
    }
}

/// Result of one external call, as reported back to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorOutcome {
    pub kind: SubmissionKind,
    /// Session generation the call was issued in
    pub generation: u64,
    pub sample_id: String,
    pub field: String,
    /// `Err` holds a message suitable for direct display
    pub result: Result<(), String>,
}

#[derive(Debug, Clone)]
pub enum OperatorMessage {
    Completed(OperatorOutcome),
}

#[derive(Debug, Clone, Default)]
pub struct OperatorStatus {
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
    pub last_error: Option<String>,
    pub last_completed: Option<DateTime<Local>>,
}

impl OperatorStatus {
    pub(super) fn record(&mut self, outcome: &OperatorOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.last_completed = Some(Local::now());
        match &outcome.result {
            Ok(()) => self.completed += 1,
            Err(e) => {
                self.failed += 1;
                self.last_error = Some(e.clone());
            }
        }
    }
}

/// Executes an operator by URI.
pub trait OperatorTransport: Send + Sync + 'static {
    fn execute(
        &self,
        operator_uri: String,
        params: serde_json::Value,
    ) -> impl Future<Output = Result<()>> + Send;
}

pub struct OperatorConn<T> {
    pub(super) transport: Arc<T>,
    pub(super) plugin_uri: String,
    pub(super) inbox: UiInboxSender<OperatorMessage>,
    pub(super) channel_from_ui: tokio::sync::mpsc::Receiver<OperatorCommand>,
    pub(super) status: Arc<RwLock<OperatorStatus>>,
}
