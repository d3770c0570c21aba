//! region-restrict
//!
//! Runs one restriction pass for a custom-resource request or an
//! `AmazonIpSpaceChanged` notification read as JSON from a file or stdin.

use anyhow::Context;
use aws_config::BehaviorVersion;
use clap::Parser;
use region_restrict::{
    with_lifecycle_reporting, Collaborators, DispatchReport, InvocationContext, LifecycleCallback,
    LifecycleDispatcher, RestrictConfig, RestrictConfigBuilder, TriggerEvent,
};
use region_restrict_aws::{collaborators, CfnResponder};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "region-restrict")]
#[command(about = "Restrict S3 object downloads to the address ranges of one AWS region")]
struct Args {
    /// Event JSON file (reads stdin when omitted or "-")
    event: Option<PathBuf>,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Region whose address ranges may download objects
    #[arg(short = 'r', long)]
    region: Option<String>,

    /// Fixed target bucket
    #[arg(short = 'b', long)]
    bucket: Option<String>,

    /// Tag key marking managed buckets
    #[arg(long)]
    tag_key: Option<String>,

    /// Sid of the managed policy statement
    #[arg(long)]
    statement_id: Option<String>,

    /// Service name filter for ip-ranges.json
    #[arg(long)]
    service: Option<String>,

    /// ARN partition
    #[arg(long)]
    partition: Option<String>,

    /// Location of ip-ranges.json
    #[arg(long)]
    ip_ranges_url: Option<String>,

    /// Log stream named in custom-resource responses
    #[arg(long, env = "AWS_LAMBDA_LOG_STREAM_NAME", default_value = "local")]
    log_stream: String,
}

impl Args {
    /// File or environment configuration with command-line overrides applied
    fn restrict_config(&self) -> region_restrict::Result<RestrictConfig> {
        let base = match &self.config {
            Some(path) => RestrictConfig::from_toml_file(path)?,
            None => RestrictConfig::from_env()?,
        };

        let mut builder = RestrictConfigBuilder::from_config(base);
        if let Some(region) = &self.region {
            builder = builder.region(region);
        }
        if let Some(bucket) = &self.bucket {
            builder = builder.bucket(bucket);
        }
        if let Some(tag_key) = &self.tag_key {
            builder = builder.tag_key(tag_key);
        }
        if let Some(statement_id) = &self.statement_id {
            builder = builder.statement_id(statement_id);
        }
        if let Some(service) = &self.service {
            builder = builder.service(service);
        }
        if let Some(partition) = &self.partition {
            builder = builder.partition(partition);
        }
        if let Some(url) = &self.ip_ranges_url {
            builder = builder.ip_ranges_url(url);
        }

        builder.build()
    }

    async fn read_event(&self) -> anyhow::Result<TriggerEvent> {
        let json = match &self.event {
            Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading event file {:?}", path))?,
            _ => {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("reading event from stdin")?;
                buf
            }
        };

        Ok(TriggerEvent::from_json(&json)?)
    }
}

/// Load configuration and dispatch `event`, reporting the outcome of lifecycle requests
///
/// Configuration is loaded inside the reported operation, so a bad setting
/// still answers a custom-resource request with FAILED.
async fn run(
    args: &Args,
    event: &TriggerEvent,
    context: &InvocationContext,
    http: &reqwest::Client,
    callback: Arc<dyn LifecycleCallback>,
) -> region_restrict::Result<DispatchReport> {
    with_lifecycle_reporting(event, context, callback.as_ref(), async {
        let config = args.restrict_config()?;
        info!(
            "Restricting downloads to region {:?} (tag key {}, statement {})",
            config.region, config.tag_key, config.statement_id
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let aws = Collaborators {
            callback: callback.clone(),
            ..collaborators(&sdk_config, &config, http)
        };

        LifecycleDispatcher::new(config, aws)
            .dispatch(event)
            .await
    })
    .await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let event = args.read_event().await?;
    let context = InvocationContext::new(args.log_stream.clone());

    let http = reqwest::Client::builder()
        .build()
        .context("building HTTP client")?;
    let callback: Arc<dyn LifecycleCallback> = Arc::new(CfnResponder::new(http.clone()));

    let report = run(&args, &event, &context, &http, callback).await?;

    for target in &report.targets {
        info!(
            "{}: {:?} (removed {}, appended {})",
            target.bucket, target.action, target.removed, target.appended
        );
    }

    Ok(())
}
