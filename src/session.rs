//! Point accumulation and submission state for one active sample.
//!
//! The session is `Empty` until the first click and `Accumulating` after it.
//! Saving is only possible while accumulating, segmenting only while empty:
//! segmentation runs against keypoints that were already saved to
//! `field_name`, never against the unsaved clicks.

use std::collections::HashSet;

use tracing::{debug, error, info, trace, warn};

use crate::{
    geometry::ClickPoint,
    notices::Notice,
    operators::{OperatorOutcome, SaveKeypointsRequest, SegmentRequest, SubmissionKind},
    sample::ActiveSample,
};

pub const DEFAULT_FIELD_NAME: &str = "user_clicks";
pub const DEFAULT_LABEL_NAME: &str = "label";
pub const DEFAULT_MODEL_NAME: &str = "segment-anything-2-hiera-small-image-torch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Accumulating,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("No clicks to save")]
    NoClicks,
    #[error("No sample selected")]
    NoSample,
    #[error("Please enter a field name")]
    BlankFieldName,
    #[error("Please enter a model name")]
    BlankModelName,
    #[error("Save the current clicks before segmenting")]
    UnsavedClicks,
    #[error("{0} already in progress")]
    InFlight(SubmissionKind),
}

#[derive(Debug, Clone)]
pub struct ClickSession {
    points: Vec<ClickPoint>,
    field_name: String,
    label_name: String,
    model_name: String,

    /// Sample the current points belong to
    sample_id: Option<String>,

    /// Bumped on every sample switch. Outcomes carry the generation they
    /// were issued in, earlier ones leave the session alone.
    generation: u64,

    /// Kinds in flight for the current generation
    pending: HashSet<SubmissionKind>,
}

impl Default for ClickSession {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_FIELD_NAME, DEFAULT_LABEL_NAME, DEFAULT_MODEL_NAME)
    }
}

impl ClickSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(
        field_name: impl Into<String>,
        label_name: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        ClickSession {
            points: Vec::new(),
            field_name: field_name.into(),
            label_name: label_name.into(),
            model_name: model_name.into(),
            sample_id: None,
            generation: 0,
            pending: HashSet::new(),
        }
    }

    pub fn points(&self) -> &[ClickPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn state(&self) -> SessionState {
        if self.points.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Accumulating
        }
    }

    /// Normalized `[x, y]` pairs in click order.
    pub fn keypoints(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| p.keypoint()).collect()
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn set_field_name(&mut self, s: impl Into<String>) {
        self.field_name = s.into();
    }

    pub fn set_label_name(&mut self, s: impl Into<String>) {
        self.label_name = s.into();
    }

    pub fn set_model_name(&mut self, s: impl Into<String>) {
        self.model_name = s.into();
    }

    pub fn add_point(&mut self, point: ClickPoint) {
        self.points.push(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self, kind: SubmissionKind) -> bool {
        self.pending.contains(&kind)
    }

    pub fn can_save(&self) -> bool {
        !self.points.is_empty() && !self.is_pending(SubmissionKind::SaveKeypoints)
    }

    /// Only with no unsaved points, the segmentation reads saved keypoints.
    pub fn can_segment(&self) -> bool {
        self.points.is_empty() && !self.is_pending(SubmissionKind::SegmentWithKeypoints)
    }

    /// Starts a fresh session when the host switches to another sample.
    /// Metadata strings are kept, calls still in flight stop counting as
    /// pending.
    pub fn reset_for_sample(&mut self, sample: Option<&ActiveSample>) {
        let sample_id = sample.map(|s| s.id.clone());
        if sample_id == self.sample_id {
            return;
        }
        debug!(
            "Session moved from {:?} to {:?}, dropping {} points",
            self.sample_id,
            sample_id,
            self.points.len()
        );
        self.points.clear();
        self.pending.clear();
        self.generation += 1;
        self.sample_id = sample_id;
    }

    fn begin(&mut self, kind: SubmissionKind) -> Result<(), SessionError> {
        if !self.pending.insert(kind) {
            return Err(SessionError::InFlight(kind));
        }
        Ok(())
    }

    /// Validates the session and builds the `save_keypoints` call.
    ///
    /// Points stay in place until [`ClickSession::complete`] reports success.
    pub fn save_as_keypoints(
        &mut self,
        sample: Option<&ActiveSample>,
    ) -> Result<SaveKeypointsRequest, SessionError> {
        if self.points.is_empty() {
            return Err(SessionError::NoClicks);
        }
        let Some(sample) = sample else {
            return Err(SessionError::NoSample);
        };
        let field_name = self.field_name.trim();
        if field_name.is_empty() {
            return Err(SessionError::BlankFieldName);
        }

        let req = SaveKeypointsRequest {
            sample_id: sample.id.clone(),
            keypoints: self.keypoints(),
            field_name: field_name.to_string(),
            label_name: self.label_name.trim().to_string(),
        };

        self.begin(SubmissionKind::SaveKeypoints)?;

        Ok(req)
    }

    /// Validates the session and builds the `segment_with_keypoints` call.
    pub fn segment_with_keypoints(
        &mut self,
        sample: Option<&ActiveSample>,
    ) -> Result<SegmentRequest, SessionError> {
        if !self.points.is_empty() {
            return Err(SessionError::UnsavedClicks);
        }
        let Some(sample) = sample else {
            return Err(SessionError::NoSample);
        };
        let model_name = self.model_name.trim();
        if model_name.is_empty() {
            return Err(SessionError::BlankModelName);
        }

        let req = SegmentRequest {
            sample_id: sample.id.clone(),
            keypoints_field: self.field_name.trim().to_string(),
            model_name: model_name.to_string(),
        };

        self.begin(SubmissionKind::SegmentWithKeypoints)?;

        Ok(req)
    }

    /// Applies the result of an external call and returns the notice to show.
    ///
    /// Results issued before the last sample switch only produce the notice.
    pub fn complete(&mut self, outcome: &OperatorOutcome) -> Notice {
        let current = outcome.generation == self.generation;
        if !current {
            debug!(
                "{} finished for {} in an earlier session, keeping state",
                outcome.kind, outcome.sample_id
            );
        } else if !self.pending.remove(&outcome.kind) {
            warn!("Got {} result with nothing pending", outcome.kind);
        }

        match (&outcome.kind, &outcome.result) {
            (SubmissionKind::SaveKeypoints, Ok(())) => {
                if current {
                    self.points.clear();
                }
                Notice::success(format!("Keypoints saved to {}", outcome.field))
            }
            (SubmissionKind::SegmentWithKeypoints, Ok(())) => {
                Notice::success(format!("Segmentation saved to {}_seg", outcome.field))
            }
            (_, Err(e)) => Notice::error(format!("Failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use egui::{pos2, vec2, Rect};

    use crate::{geometry, notices::NoticeLevel};

    fn sample() -> ActiveSample {
        ActiveSample::new("s1", "/data/a.jpg")
    }

    fn click(x: f32, y: f32) -> ClickPoint {
        let container = Rect::from_min_size(pos2(0., 0.), vec2(1000., 800.));
        let image = Rect::from_min_size(pos2(250., 0.), vec2(500., 800.));
        geometry::map_event(pos2(x, y), Some(image), Some(container)).unwrap()
    }

    fn session_with_points(sample: &ActiveSample) -> ClickSession {
        let mut session = ClickSession::new();
        session.reset_for_sample(Some(sample));
        session.add_point(click(300., 100.));
        session.add_point(click(500., 400.));
        session.add_point(click(750., 0.));
        session
    }

    fn outcome(
        kind: SubmissionKind,
        generation: u64,
        sample_id: &str,
        result: Result<(), String>,
    ) -> OperatorOutcome {
        OperatorOutcome {
            kind,
            generation,
            sample_id: sample_id.to_string(),
            field: "user_clicks".to_string(),
            result,
        }
    }

    #[test]
    fn defaults() {
        let session = ClickSession::new();
        assert_eq!(session.field_name(), "user_clicks");
        assert_eq!(session.label_name(), "label");
        assert_eq!(session.model_name(), "segment-anything-2-hiera-small-image-torch");
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn state_follows_points() {
        let s = sample();
        let mut session = ClickSession::new();
        session.reset_for_sample(Some(&s));

        session.add_point(click(300., 100.));
        session.add_point(click(300., 100.));
        assert_eq!(session.state(), SessionState::Accumulating);
        assert_eq!(session.len(), 2);
        assert!(session.can_save());
        assert!(!session.can_segment());

        session.clear();
        assert!(session.points().is_empty());
        assert_eq!(session.state(), SessionState::Empty);
        assert!(!session.can_save());
        assert!(session.can_segment());
    }

    #[test]
    fn save_without_points_does_nothing() {
        let s = sample();
        let mut session = ClickSession::new();

        assert_eq!(session.save_as_keypoints(Some(&s)), Err(SessionError::NoClicks));
        assert!(!session.is_pending(SubmissionKind::SaveKeypoints));
        assert!(session.is_empty());
    }

    #[test]
    fn save_requires_a_sample() {
        let s = sample();
        let mut session = session_with_points(&s);

        assert_eq!(session.save_as_keypoints(None), Err(SessionError::NoSample));
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn whitespace_field_name_aborts_save() {
        let s = sample();
        let mut session = session_with_points(&s);
        session.set_field_name("   ");

        assert_eq!(
            session.save_as_keypoints(Some(&s)),
            Err(SessionError::BlankFieldName)
        );
        assert!(!session.is_pending(SubmissionKind::SaveKeypoints));
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn save_sends_click_order_and_trimmed_names() {
        let s = sample();
        let mut session = session_with_points(&s);
        session.set_field_name("  my_clicks ");
        session.set_label_name(" dog ");

        let req = session.save_as_keypoints(Some(&s)).unwrap();

        assert_eq!(
            req,
            SaveKeypointsRequest {
                sample_id: "s1".to_string(),
                keypoints: vec![[0.1, 0.125], [0.5, 0.5], [1.0, 0.0]],
                field_name: "my_clicks".to_string(),
                label_name: "dog".to_string(),
            }
        );
        // cleared only once the call succeeds
        assert_eq!(session.len(), 3);
        assert!(session.is_pending(SubmissionKind::SaveKeypoints));
        assert!(!session.can_save());
    }

    #[test]
    fn successful_save_clears_points() {
        let s = sample();
        let mut session = session_with_points(&s);
        session.save_as_keypoints(Some(&s)).unwrap();

        let notice = session.complete(&outcome(
            SubmissionKind::SaveKeypoints,
            session.generation(),
            "s1",
            Ok(()),
        ));

        assert_eq!(notice.level, NoticeLevel::Success);
        assert!(session.is_empty());
        assert!(!session.is_pending(SubmissionKind::SaveKeypoints));
        assert!(session.can_segment());
    }

    #[test]
    fn failed_save_keeps_points_for_retry() {
        let s = sample();
        let mut session = session_with_points(&s);
        session.save_as_keypoints(Some(&s)).unwrap();

        let notice = session.complete(&outcome(
            SubmissionKind::SaveKeypoints,
            session.generation(),
            "s1",
            Err("connection refused".to_string()),
        ));

        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Failed: connection refused");
        assert_eq!(session.len(), 3);
        assert!(session.can_save());
    }

    #[test]
    fn second_save_while_pending_is_rejected() {
        let s = sample();
        let mut session = session_with_points(&s);
        session.save_as_keypoints(Some(&s)).unwrap();

        assert_eq!(
            session.save_as_keypoints(Some(&s)),
            Err(SessionError::InFlight(SubmissionKind::SaveKeypoints))
        );
        assert_eq!(
            SessionError::InFlight(SubmissionKind::SaveKeypoints).to_string(),
            "Save already in progress"
        );

        // capture keeps working meanwhile
        session.add_point(click(260., 8.));
        assert_eq!(session.len(), 4);
    }

    #[test]
    fn segment_is_rejected_with_unsaved_points() {
        let s = sample();
        let mut session = session_with_points(&s);

        assert_eq!(
            session.segment_with_keypoints(Some(&s)),
            Err(SessionError::UnsavedClicks)
        );
        assert!(!session.is_pending(SubmissionKind::SegmentWithKeypoints));
    }

    #[test]
    fn segment_references_the_saved_field() {
        let s = sample();
        let mut session = ClickSession::new();
        session.reset_for_sample(Some(&s));
        session.set_field_name(" user_clicks ");
        session.set_model_name(" sam2 ");

        let req = session.segment_with_keypoints(Some(&s)).unwrap();

        assert_eq!(
            req,
            SegmentRequest {
                sample_id: "s1".to_string(),
                keypoints_field: "user_clicks".to_string(),
                model_name: "sam2".to_string(),
            }
        );
        assert!(!session.can_segment());

        assert_eq!(
            session.segment_with_keypoints(Some(&s)),
            Err(SessionError::InFlight(SubmissionKind::SegmentWithKeypoints))
        );

        let notice = session.complete(&outcome(
            SubmissionKind::SegmentWithKeypoints,
            session.generation(),
            "s1",
            Ok(()),
        ));
        assert_eq!(notice.message, "Segmentation saved to user_clicks_seg");
        assert!(session.can_segment());
    }

    #[test]
    fn segment_preconditions() {
        let s = sample();
        let mut session = ClickSession::new();

        assert_eq!(session.segment_with_keypoints(None), Err(SessionError::NoSample));

        session.set_model_name("  ");
        assert_eq!(
            session.segment_with_keypoints(Some(&s)),
            Err(SessionError::BlankModelName)
        );
        assert!(!session.is_pending(SubmissionKind::SegmentWithKeypoints));
    }

    #[test]
    fn changing_sample_starts_an_empty_session() {
        let a = sample();
        let b = ActiveSample::new("s2", "/data/b.jpg");
        let mut session = session_with_points(&a);
        session.set_field_name("kp");

        session.reset_for_sample(Some(&a));
        assert_eq!(session.len(), 3);

        session.reset_for_sample(Some(&b));
        assert!(session.is_empty());
        assert_eq!(session.field_name(), "kp");
    }

    #[test]
    fn late_save_for_previous_sample_keeps_new_points() {
        let a = sample();
        let b = ActiveSample::new("s2", "/data/b.jpg");
        let mut session = session_with_points(&a);
        session.save_as_keypoints(Some(&a)).unwrap();
        let issued = session.generation();

        session.reset_for_sample(Some(&b));
        session.add_point(click(300., 100.));

        let notice = session.complete(&outcome(SubmissionKind::SaveKeypoints, issued, "s1", Ok(())));

        assert_eq!(notice.message, "Keypoints saved to user_clicks");
        assert_eq!(session.len(), 1);
        assert!(session.can_save());
    }

    #[test]
    fn late_save_after_returning_to_the_same_sample_keeps_new_points() {
        let a = sample();
        let b = ActiveSample::new("s2", "/data/b.jpg");
        let mut session = session_with_points(&a);
        session.save_as_keypoints(Some(&a)).unwrap();
        let issued = session.generation();

        session.reset_for_sample(Some(&b));
        session.reset_for_sample(Some(&a));
        session.add_point(click(300., 100.));
        session.add_point(click(500., 400.));

        session.complete(&outcome(SubmissionKind::SaveKeypoints, issued, "s1", Ok(())));

        assert_eq!(session.len(), 2);
        assert!(session.can_save());
    }

    #[test]
    fn call_in_flight_for_previous_sample_does_not_block_the_new_one() {
        let a = sample();
        let b = ActiveSample::new("s2", "/data/b.jpg");
        let mut session = session_with_points(&a);
        session.save_as_keypoints(Some(&a)).unwrap();
        let issued = session.generation();

        session.reset_for_sample(Some(&b));
        assert!(!session.is_pending(SubmissionKind::SaveKeypoints));
        assert!(session.can_segment());

        session.add_point(click(300., 100.));
        assert!(session.can_save());
        let req = session.save_as_keypoints(Some(&b)).unwrap();
        assert_eq!(req.sample_id, "s2");

        // the old call finishing does not release the new one
        session.complete(&outcome(
            SubmissionKind::SaveKeypoints,
            issued,
            "s1",
            Err("timed out".to_string()),
        ));
        assert!(session.is_pending(SubmissionKind::SaveKeypoints));
        assert_eq!(session.len(), 1);
    }
}
