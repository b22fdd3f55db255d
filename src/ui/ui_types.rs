use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    appconfig::AppSettings,
    notices::Notices,
    operators::{OperatorCommand, OperatorMessage, OperatorStatus},
    sample::ActiveSample,
    session::ClickSession,
};

#[derive(serde::Serialize, serde::Deserialize, Default)]
#[serde(default)]
pub struct App {
    #[serde(skip)]
    pub settings: AppSettings,

    #[serde(skip)]
    pub notices: Notices,

    #[serde(skip)]
    pub session: ClickSession,

    #[serde(skip)]
    pub active_sample: Option<ActiveSample>,

    /// Options tab inputs for opening a sample
    pub sample_id_input: String,
    pub sample_filepath_input: String,

    pub current_tab: Tab,

    #[serde(skip)]
    pub operators_started: bool,

    #[serde(skip)]
    pub operator_tx: Option<tokio::sync::mpsc::Sender<OperatorCommand>>,

    #[serde(skip)]
    pub operator_status: Option<Arc<RwLock<OperatorStatus>>>,

    #[serde(skip)]
    pub inbox: egui_inbox::UiInbox<OperatorMessage>,

    /// last image URL whose load state was logged, and whether it loaded
    #[serde(skip)]
    pub image_status: Option<(String, bool)>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum Tab {
    Annotate,
    Options,
}

impl Default for Tab {
    fn default() -> Self {
        Tab::Annotate
    }
}
