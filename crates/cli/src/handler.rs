use std::io::{self, Write};
use std::process::ExitCode;

use chat_core::{ChatPipeline, ConversationContext, Locale, ModelRuntime};
use tracing::{error, info, warn};

use crate::protocol::{self, ChatResponse};

/// Everything one invocation writes, decided before anything is written.
#[derive(Debug)]
pub struct Outcome {
    pub stdout: Option<ChatResponse>,
    pub stderr: Vec<ChatResponse>,
    pub success: bool,
}

impl Outcome {
    pub fn failed(diagnostic: ChatResponse) -> Self {
        Self {
            stdout: None,
            stderr: vec![diagnostic],
            success: false,
        }
    }

    /// Writes the outcome to the process streams. A reply that cannot be
    /// written turns into a diagnostic and a failed invocation.
    pub fn emit(self, locale: Locale) -> ExitCode {
        let ok = self.write_to(&mut io::stdout().lock(), &mut io::stderr().lock(), locale);
        if ok {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    fn write_to<O: Write, E: Write>(self, out: &mut O, err: &mut E, locale: Locale) -> bool {
        let Outcome {
            stdout,
            mut stderr,
            mut success,
        } = self;
        if let Some(resp) = &stdout {
            if let Err(e) = write_json(out, resp) {
                error!(target: "cli", "stdout write failed: {}", e);
                stderr.push(ChatResponse::error(locale.unexpected(&e.to_string())));
                success = false;
            }
        }
        for diag in &stderr {
            if let Err(e) = write_json(err, diag) {
                error!(target: "cli", "stderr write failed: {}", e);
            }
        }
        success
    }
}

fn write_json<W: Write>(w: &mut W, resp: &ChatResponse) -> io::Result<()> {
    let line = serde_json::to_string(resp)?;
    writeln!(w, "{}", line)?;
    w.flush()
}

/// Parses one request, runs the pipeline and maps the result onto the
/// stdout/stderr/exit-status convention.
///
/// Only a request that cannot be decoded fails the invocation. Model
/// faults still produce a reply on stdout, with a diagnostic on stderr.
pub async fn handle<R: ModelRuntime>(
    input: &str,
    pipeline: &ChatPipeline,
    runtime: &R,
) -> Outcome {
    let locale = pipeline.locale();
    let request = match protocol::parse_request(input) {
        Ok(r) => r,
        Err(e) => {
            warn!(target: "cli", "malformed request: {:#}", e);
            return Outcome::failed(ChatResponse::error(format!(
                "{}: {:#}",
                locale.invalid_json(),
                e
            )));
        }
    };

    let message = request.message.unwrap_or_default();
    if message.is_empty() {
        info!(target: "cli", "rejecting empty message");
        return Outcome {
            stdout: Some(ChatResponse::error(locale.empty_message())),
            stderr: Vec::new(),
            success: true,
        };
    }

    let ctx = ConversationContext::new(message, request.history.unwrap_or_default());
    info!(target: "cli", "request: message_chars={} history={}", ctx.message.chars().count(), ctx.history.len());

    let reply = pipeline.respond(runtime, &ctx).await;
    let mut stderr = Vec::new();
    if let Some(fault) = &reply.fault {
        let detail = fault.to_string();
        let diag = if fault.is_load() {
            locale.model_load_failed(&detail)
        } else {
            locale.generation_failed(&detail)
        };
        stderr.push(ChatResponse::error(diag));
    }
    Outcome {
        stdout: Some(ChatResponse::reply(reply.text)),
        stderr,
        success: true,
    }
}
