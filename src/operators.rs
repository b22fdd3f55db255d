pub mod operator_types;

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use egui_inbox::UiInboxSender;
use parking_lot::RwLock;
use tokio::task::JoinSet;
use url::Url;

pub use self::operator_types::*;
use crate::appconfig::{server_endpoint, AppSettings};

/// Executes operators through the server's `/operators/execute` endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    execute_url: Url,
    dataset_name: String,
}

impl HttpTransport {
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let execute_url = server_endpoint(&settings.server_url, "operators/execute")?;

        Ok(HttpTransport {
            client,
            execute_url,
            dataset_name: settings.dataset_name.clone(),
        })
    }
}

impl OperatorTransport for HttpTransport {
    fn execute(
        &self,
        operator_uri: String,
        params: serde_json::Value,
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        let client = self.client.clone();
        let url = self.execute_url.clone();
        let dataset_name = self.dataset_name.clone();

        async move {
            let current_sample = params.get("sample_id").cloned();
            let body = serde_json::json!({
                "operator_uri": operator_uri,
                "current_sample": current_sample,
                "dataset_name": dataset_name,
                "params": params,
            });

            debug!("POST {} ({})", url, operator_uri);

            let res = client
                .post(url)
                .json(&body)
                .send()
                .await
                .context("Failed to send request")?;

            let status = res.status();
            let text = res.text().await.context("Failed to read response")?;

            parse_execute_response(status, &text)
        }
    }
}

/// Turns an `/operators/execute` response into success or a failure whose
/// message can be shown to the user as is.
pub fn parse_execute_response(status: reqwest::StatusCode, body: &str) -> Result<()> {
    let json: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let message = json.as_ref().and_then(|json| {
        ["error_message", "error"]
            .iter()
            .find_map(|key| match json.get(*key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(serde_json::Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            })
    });

    if !status.is_success() {
        match message {
            Some(msg) => bail!("{}", msg),
            None => bail!("Server returned {}", status),
        }
    }

    if let Some(msg) = message {
        bail!("{}", msg);
    }

    Ok(())
}

pub async fn execute_command<T: OperatorTransport>(
    transport: &T,
    plugin_uri: &str,
    cmd: &OperatorCommand,
) -> OperatorOutcome {
    let uri = format!(
        "{}/{}",
        plugin_uri.trim_end_matches('/'),
        cmd.kind().operator_name()
    );

    let result = match cmd.params() {
        Ok(params) => transport.execute(uri.clone(), params).await,
        Err(e) => Err(e.context("Failed to encode operator params")),
    };

    match &result {
        Ok(()) => info!("{} finished for sample {}", uri, cmd.sample_id()),
        Err(e) => error!("{} failed for sample {}: {:#}", uri, cmd.sample_id(), e),
    }

    cmd.outcome(result.map_err(|e| format!("{:#}", e)))
}

impl<T: OperatorTransport> OperatorConn<T> {
    pub fn new(
        transport: T,
        plugin_uri: String,
        inbox: UiInboxSender<OperatorMessage>,
        rx: tokio::sync::mpsc::Receiver<OperatorCommand>,
    ) -> Self {
        OperatorConn {
            transport: Arc::new(transport),
            plugin_uri,
            inbox,
            channel_from_ui: rx,
            status: Arc::new(RwLock::new(OperatorStatus::default())),
        }
    }

    pub fn status(&self) -> Arc<RwLock<OperatorStatus>> {
        self.status.clone()
    }

    fn dispatch(&self, tasks: &mut JoinSet<()>, cmd: OperatorCommand) {
        debug!("Dispatching {} for sample {}", cmd.kind(), cmd.sample_id());

        self.status.write().in_flight += 1;

        let transport = self.transport.clone();
        let plugin_uri = self.plugin_uri.clone();
        let inbox = self.inbox.clone();
        let status = self.status.clone();

        tasks.spawn(async move {
            let outcome = execute_command(transport.as_ref(), &plugin_uri, &cmd).await;

            status.write().record(&outcome);

            if let Err(e) = inbox.send(OperatorMessage::Completed(outcome)) {
                error!("Failed to send operator result: {:?}", e);
            }
        });
    }
}

/// main loop
impl<T: OperatorTransport> OperatorConn<T> {
    /// Runs until the UI side of the channel is dropped, then waits for calls
    /// still in flight.
    pub async fn run(&mut self) -> Result<()> {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                cmd = self.channel_from_ui.recv() => {
                    match cmd {
                        None => {
                            debug!("Channel closed");
                            break;
                        }
                        Some(cmd) => self.dispatch(&mut tasks, cmd),
                    }
                }
                Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = res {
                        error!("Operator task failed: {}", e);
                    }
                }
            }
        }

        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                error!("Operator task failed: {}", e);
            }
        }

        Ok(())
    }
}

/// Spawns the worker thread with its own runtime.
pub fn start_operator_thread(
    settings: &AppSettings,
    inbox: UiInboxSender<OperatorMessage>,
) -> Result<(
    tokio::sync::mpsc::Sender<OperatorCommand>,
    Arc<RwLock<OperatorStatus>>,
)> {
    ensure!(
        !settings.plugin_uri.trim().is_empty(),
        "No operator plugin URI configured"
    );

    let transport = HttpTransport::new(settings)?;

    let (tx, rx) = tokio::sync::mpsc::channel(16);

    let mut conn = OperatorConn::new(transport, settings.plugin_uri.trim().to_string(), inbox, rx);
    let status = conn.status();

    std::thread::Builder::new()
        .name("operators".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to build operator runtime: {}", e);
                    return;
                }
            };

            rt.block_on(async move {
                if let Err(e) = conn.run().await {
                    error!("Operator worker stopped: {}", e);
                }
            });

            debug!("Operator worker exited");
        })
        .context("Failed to spawn operator thread")?;

    Ok((tx, status))
}
