//! The verification session
//!
//! Drives one end-to-end pass against the tool server: handshake, tool
//! enumeration, then the gcloud calls. Setup steps are fatal; every
//! `run_gcloud_command` call is independent and a failure there is reported
//! and skipped.

use std::io::Write;

use chrono::Utc;
use rust_mcp_sdk::schema::CallToolResult;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::domain::gcloud::{
    command_arguments, compute_instances_list, cpu_utilization_query, monitoring_read,
    projects_list, storage_buckets_list, MetricWindow, RUN_GCLOUD_COMMAND,
};
use crate::domain::payload::{read_cpu_utilization, text_blocks, CpuReading, Payload, VmRecord};
use crate::domain::utils::{format_percent, preview};
use crate::errors::ClientError;
use crate::mcp::session::ToolSession;

pub const TOOL_DESCRIPTION_CHARS: usize = 50;
pub const PROJECTS_PREVIEW_CHARS: usize = 2_000;
pub const BUCKETS_PREVIEW_CHARS: usize = 200;
const RAW_METRIC_LOG_CHARS: usize = 500;

pub struct Probe<'a, S, W> {
    session: &'a mut S,
    out: &'a mut W,
}

impl<'a, S, W> Probe<'a, S, W>
where
    S: ToolSession,
    W: Write,
{
    pub fn new(session: &'a mut S, out: &'a mut W) -> Self {
        Self { session, out }
    }

    /// Runs every step in order. Returns an error only for setup failures
    /// (handshake, tool enumeration) or when the console cannot be written.
    pub async fn run<R>(&mut self, input: &mut R) -> Result<(), ClientError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.session.initialize().await?;
        self.list_tools().await?;
        self.list_projects().await?;
        self.list_buckets().await?;
        self.verify_vms(input).await
    }

    async fn list_tools(&mut self) -> Result<(), ClientError> {
        writeln!(self.out, "\n[1] Listing Available Tools:")?;
        let tools = self.session.list_tools().await?;
        for tool in &tools {
            let description = tool.description.as_deref().unwrap_or_default();
            writeln!(
                self.out,
                "  - {}: {}",
                tool.name,
                preview(description, TOOL_DESCRIPTION_CHARS)
            )?;
        }
        Ok(())
    }

    async fn list_projects(&mut self) -> Result<(), ClientError> {
        writeln!(
            self.out,
            "\n[2] Testing Tool: run_gcloud_command (gcloud projects list)"
        )?;
        match self.run_gcloud(projects_list()).await {
            Ok(result) => {
                writeln!(self.out, "Result:")?;
                self.print_text(&result, Some(PROJECTS_PREVIEW_CHARS))?;
            }
            Err(err) => self.report_failure("projects", "Error calling run_gcloud_command", &err)?,
        }
        Ok(())
    }

    async fn list_buckets(&mut self) -> Result<(), ClientError> {
        writeln!(
            self.out,
            "\n[3] Testing Tool: run_gcloud_command (gcloud storage buckets list)"
        )?;
        match self.run_gcloud(storage_buckets_list()).await {
            Ok(result) => {
                writeln!(self.out, "Result (first {BUCKETS_PREVIEW_CHARS} chars):")?;
                self.print_text(&result, Some(BUCKETS_PREVIEW_CHARS))?;
            }
            Err(err) => self.report_failure(
                "buckets",
                "Error calling run_gcloud_command for buckets",
                &err,
            )?,
        }
        Ok(())
    }

    async fn verify_vms<R>(&mut self, input: &mut R) -> Result<(), ClientError>
    where
        R: AsyncBufRead + Unpin,
    {
        writeln!(self.out, "\n[4] VM Verification Step")?;
        write!(self.out, "Enter Project ID to list VMs: ")?;
        self.out.flush()?;

        let mut line = String::new();
        input.read_line(&mut line).await?;
        let project_id = line.trim();

        if project_id.is_empty() {
            writeln!(
                self.out,
                "Skipping VM verification (no Project ID provided)."
            )?;
            return Ok(());
        }

        writeln!(self.out, "\nListing VMs for project: {project_id}...")?;
        let result = match self.run_gcloud(compute_instances_list(project_id)).await {
            Ok(result) => result,
            Err(err) => return self.report_failure("vms", "Error listing VMs", &err),
        };

        let payload = Payload::from_content(&result.content);
        let Some(records) = payload.records() else {
            writeln!(self.out, "No VMs found or failed to parse output.")?;
            writeln!(self.out, "Raw Output:")?;
            return self.print_text(&result, None);
        };

        let vms: Vec<VmRecord> = records.iter().map(VmRecord::from_value).collect();
        writeln!(self.out, "Found {} VMs.", vms.len())?;

        // One window for every machine so the readings are comparable.
        let window = MetricWindow::last_minutes(Utc::now());

        for vm in &vms {
            writeln!(
                self.out,
                "\nVM: {} (Zone: {}, Status: {})",
                vm.name, vm.zone, vm.status
            )?;

            if vm.is_running() {
                self.report_cpu(vm, &window, project_id).await?;
            } else {
                writeln!(self.out, "  Skipping CPU check (VM is not RUNNING)")?;
            }
        }

        Ok(())
    }

    async fn report_cpu(
        &mut self,
        vm: &VmRecord,
        window: &MetricWindow,
        project_id: &str,
    ) -> Result<(), ClientError> {
        writeln!(self.out, "  Fetching CPU Utilization...")?;

        let Some(instance_id) = vm.id.as_deref() else {
            return self.report_failure(
                "cpu",
                "  Error fetching CPU metrics",
                &ClientError::protocol(format!("instance `{}` has no id", vm.name)),
            );
        };

        let args = monitoring_read(&cpu_utilization_query(instance_id), window, project_id);
        let result = match self.run_gcloud(args).await {
            Ok(result) => result,
            Err(err) => return self.report_failure("cpu", "  Error fetching CPU metrics", &err),
        };

        for text in text_blocks(&result.content) {
            debug!(
                instance = %vm.name,
                raw = %preview(text, RAW_METRIC_LOG_CHARS),
                "raw cpu response"
            );
        }

        let line = match read_cpu_utilization(&Payload::from_content(&result.content)) {
            CpuReading::Utilization(ratio) => format!("CPU Utilization: {}", format_percent(ratio)),
            CpuReading::UnreadablePoint => {
                "CPU Utilization: Latest point has no numeric value".to_string()
            }
            CpuReading::NoPoints => "CPU Utilization: No data points in response".to_string(),
            CpuReading::NoData => "CPU Utilization: No data available (VM might be newly created or monitoring disabled)".to_string(),
        };
        writeln!(self.out, "  {line}")?;
        Ok(())
    }

    async fn run_gcloud(&mut self, args: Vec<String>) -> Result<CallToolResult, ClientError> {
        debug!(tool = RUN_GCLOUD_COMMAND, args = ?args, "calling tool");
        self.session
            .call_tool(RUN_GCLOUD_COMMAND, command_arguments(&args))
            .await
    }

    fn print_text(&mut self, result: &CallToolResult, limit: Option<usize>) -> Result<(), ClientError> {
        for text in text_blocks(&result.content) {
            match limit {
                Some(limit) => writeln!(self.out, "{}", preview(text, limit))?,
                None => writeln!(self.out, "{text}")?,
            }
        }
        Ok(())
    }

    /// Every recoverable failure goes through here: one console line plus a
    /// structured warning.
    fn report_failure(
        &mut self,
        step: &'static str,
        message: &str,
        err: &ClientError,
    ) -> Result<(), ClientError> {
        warn!(step, error = %err, "step failed");
        writeln!(self.out, "{message}: {err}")?;
        Ok(())
    }
}
