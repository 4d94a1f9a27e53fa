use crate::batch::{BatchRunner, CompressionJob};
use crate::cli::{Args, BatchArgs, DownloadArgs};
use crate::client::{CompressionClient, TinifyClient, WebClient};
use crate::config::{build_http_client, resolve_api_key, ClientSettings};
use crate::constants::API_KEY_ENV;
use crate::download::{DownloadOptions, DownloadPolicy};
use crate::error::CompressionError;
use crate::formats::SaveTarget;
use crate::resolver::{resolve_input, ResolvedInput};
use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument, Span};

/// Settings that apply to every command of one invocation.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub settings: ClientSettings,
    pub api_key: Option<String>,
    pub quiet: bool,
}

/// `compress`: developer API, optional post-processing on download.
pub async fn run_compress(ctx: &RunContext, batch: BatchArgs, download: DownloadArgs) -> Result<()> {
    if download.save_to != SaveTarget::Local {
        return Err(CompressionError::UnsupportedSaveTarget(download.save_to.to_string()).into());
    }

    let api_key = resolve_api_key(ctx.api_key.as_deref(), std::env::var(API_KEY_ENV).ok())?;
    let http = build_http_client(&ctx.settings)?;

    let client = TinifyClient::new(http.clone(), api_key.clone()).with_base_url(&ctx.settings.api_base);
    let policy = DownloadPolicy::new(http, Some(api_key), download.to_options());
    run_batch(ctx, Arc::new(client), policy, batch).await
}

/// `web-compress`: anonymous two-step web backend, plain downloads.
pub async fn run_web_compress(ctx: &RunContext, batch: BatchArgs) -> Result<()> {
    let http = build_http_client(&ctx.settings)?;

    let client = WebClient::new(http.clone()).with_base_url(&ctx.settings.web_base);
    let policy = DownloadPolicy::new(http, None, DownloadOptions::default());
    run_batch(ctx, Arc::new(client), policy, batch).await
}

/// `completion`: writes the completion script for `shell`.
pub fn write_completion(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, out);
}

async fn run_batch(
    ctx: &RunContext,
    client: Arc<dyn CompressionClient>,
    policy: DownloadPolicy,
    batch: BatchArgs,
) -> Result<()> {
    let resolved = resolve_input(&batch.path, batch.recursive, &batch.extensions)
        .with_context(|| format!("cannot read input '{}'", batch.path))?;

    if let Some(dir) = &batch.output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
    }

    let is_directory = resolved.is_directory();
    if let ResolvedInput::Directory { root, files } = &resolved {
        if files.is_empty() {
            info!(root = %root.display(), "no matching files found");
            return Ok(());
        }
        if !ctx.quiet {
            println!("🚀 Compressing {} files from {}", files.len(), root.display());
        }
    }

    let jobs: Vec<CompressionJob> = resolved
        .into_sources()
        .into_iter()
        .map(|source| CompressionJob::new(source, batch.output.clone()))
        .collect();
    debug!(jobs = jobs.len(), options = ?policy.options(), "dispatching");

    let mut runner = BatchRunner::new(client, policy, batch.workers());
    let span = if is_directory && !ctx.quiet {
        let span = info_span!("compress", files = jobs.len());
        runner = runner.with_progress(span.clone());
        span
    } else {
        Span::none()
    };
    let report = runner.run(jobs).instrument(span).await;

    if is_directory {
        if !ctx.quiet {
            report.print_summary();
        }
        return Ok(());
    }

    // A single named file or URL fails the command when its one job fails.
    match report.into_first_error() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
