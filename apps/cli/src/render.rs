use std::{
    io::{self, Write},
    time::{Duration, Instant},
};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use searchstream_core::{
    MetricsSnapshot, Phase, SearchRequest, SessionState, SessionUpdate, format_duration,
    format_videos_readable,
};
use serde_json::json;
use tracing::warn;

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Streams one session to the terminal: answer text as it arrives, the
/// video cards once the session is over.
///
/// The first failed write stops all further output; `finish` returns it.
pub struct TerminalRenderer<W: Write = io::Stdout> {
    out: W,
    json: bool,
    spinner: Option<ProgressBar>,
    started: Instant,
    wrote_answer: bool,
    write_error: Option<io::Error>,
}

impl TerminalRenderer {
    pub fn start(json: bool) -> Self {
        Self::with_writer(json, io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn with_writer(json: bool, out: W) -> Self {
        let spinner = (!json).then(|| create_spinner("Waiting for server response..."));
        Self {
            out,
            json,
            spinner,
            started: Instant::now(),
            wrote_answer: false,
            write_error: None,
        }
    }

    pub fn on_update(&mut self, update: &SessionUpdate, state: &SessionState) {
        if self.json {
            return;
        }

        match update {
            SessionUpdate::AnswerAppended(text) => {
                self.clear_spinner();
                self.write(text);
            }
            SessionUpdate::Finished { marker, .. } => {
                self.clear_spinner();
                self.write(marker);
            }
            SessionUpdate::VideosReplaced(count) => {
                if let Some(spinner) = &self.spinner {
                    spinner.set_message(format!("{count} videos found, waiting for the answer..."));
                }
            }
            SessionUpdate::SummaryAppended { .. } => {
                if let Some(spinner) = &self.spinner {
                    spinner.set_message(format!(
                        "Summaries streaming for {} videos...",
                        state.summaries.len()
                    ));
                }
            }
            SessionUpdate::Dropped { .. } | SessionUpdate::Unrouted { .. } | SessionUpdate::Ignored => {}
        }
    }

    pub fn finish(
        mut self,
        request: &SearchRequest,
        state: &SessionState,
        metrics: Option<MetricsSnapshot>,
    ) -> anyhow::Result<()> {
        self.clear_spinner();
        if let Some(e) = self.write_error.take() {
            return Err(anyhow::Error::new(e).context("failed to write the answer"));
        }
        let elapsed = self.started.elapsed();
        let out = &mut self.out;

        if self.json {
            let report = json!({
                "query": request.query,
                "endpoint": request.endpoint,
                "phase": state.phase,
                "answer": state.display_text(),
                "final_text": state.final_text,
                "videos": state.videos,
                "summaries": state.summaries,
                "elapsed_ms": elapsed.as_millis() as u64,
                "metrics": metrics,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            out.flush()?;
            return Ok(());
        }

        if self.wrote_answer {
            writeln!(out)?;
        } else {
            writeln!(out, "{}", style("(no answer text received)").dim())?;
        }
        writeln!(out, "{}", style("─".repeat(60)).dim())?;

        let mark = match state.phase {
            Phase::Completed => style("✓").green().bold(),
            Phase::NoResults | Phase::TimedOut => style("!").yellow().bold(),
            Phase::Errored => style("✗").red().bold(),
            Phase::Idle | Phase::Streaming => style("·").dim(),
        };
        writeln!(
            out,
            "{} Stream {} {}",
            mark,
            state.phase.label(),
            style(format!("[{}]", format_duration(elapsed))).dim()
        )?;

        writeln!(out, "\n{}\n", style("Recommended Videos").bold())?;
        write!(out, "{}", format_videos_readable(state))?;

        if let Some(metrics) = metrics {
            writeln!(
                out,
                "\n{} {} events, {} unrouted, {} malformed",
                style("Stats:").dim(),
                metrics.events_total,
                metrics.unrouted_total,
                metrics.malformed_total
            )?;
        }
        writeln!(out)?;
        out.flush()?;

        Ok(())
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() || self.write_error.is_some() {
            return;
        }
        let written = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        match written {
            Ok(()) => self.wrote_answer = true,
            Err(e) => {
                warn!(error = %e, "answer output failed, suppressing the rest of the stream");
                self.write_error = Some(e);
            }
        }
    }
}
