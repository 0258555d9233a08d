//! Headline watcher — binary entrypoint.
//! One run per invocation; the caller schedules repeats. Stdout carries one JSON
//! status line per step, the last line being the run result.

use std::process::ExitCode;
use std::sync::Arc;

use stream_headline_watcher::events::StdoutSink;
use stream_headline_watcher::pipeline::emit_result;
use stream_headline_watcher::{logging, Pipeline, RunResult, Settings, SharedSink, StatusEvent};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let sink: SharedSink = Arc::new(StdoutSink);

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("startup: {e}");
            emit_result(&sink, &RunResult::failure(e.to_string()));
            return ExitCode::FAILURE;
        }
    };

    sink.emit(StatusEvent::Startup {
        token_present: true,
        token_len: settings.diffbot_token.len(),
    });

    match Pipeline::from_settings(&settings, sink.clone()) {
        Ok(pipeline) => {
            pipeline.run_guarded().await;
        }
        Err(e) => {
            tracing::error!("pipeline setup: {e:#}");
            emit_result(&sink, &RunResult::failure(format!("{e:#}")));
        }
    }

    ExitCode::SUCCESS
}
