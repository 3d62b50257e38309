//! The `pay`, `status`, and `watch` commands.
//!
//! User-facing output goes to stdout; diagnostics go through `tracing`.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use sablepay_core::{
    FlowListener, FlowOutcome, FlowSettings, PaymentFlow, PollEnd, PollingEngine,
};
use sablepay_sdk::client::{ErrorKind, PaymentClient};
use sablepay_sdk::objects::{
    PaymentItem, PaymentRecord, PaymentRequest, PaymentStatus, StatusSnapshot, format_amount,
};
use time::format_description::well_known::Rfc3339;
use tokio_stream::StreamExt;

use crate::shutdown::shutdown_signal;

/// Exit code used when the user interrupts a command, as shells do for SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

// ---------------------------------------------------------------------------
// pay
// ---------------------------------------------------------------------------

/// Create a payment and follow it until it settles.
pub async fn pay(
    client: PaymentClient,
    amount: Option<Decimal>,
    items: Vec<PaymentItem>,
    metadata: Vec<(String, String)>,
) -> anyhow::Result<ExitCode> {
    let request = build_request(amount, items, metadata)?;
    let settings = FlowSettings::from(client.config());
    let flow = PaymentFlow::new(Arc::new(client), settings);
    let events = flow.start_request(request)?;
    let mut listener = TerminalListener;

    tokio::select! {
        outcome = events.drive(&mut listener) => {
            Ok(match outcome {
                Some(outcome) if outcome.is_success() => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            })
        }
        _ = shutdown_signal() => {
            flow.cancel();
            if let Some(payment_id) = flow.current_payment_id() {
                println!("Stopped watching payment {payment_id}; it may still settle on the server.");
            }
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
    }
}

fn build_request(
    amount: Option<Decimal>,
    items: Vec<PaymentItem>,
    metadata: Vec<(String, String)>,
) -> anyhow::Result<PaymentRequest> {
    let mut request = match (amount, items.is_empty()) {
        (None, true) => anyhow::bail!("either --amount or at least one --item is required"),
        (Some(amount), true) => PaymentRequest::new(amount),
        (amount, false) => {
            let mut request = PaymentRequest::from_items(items)?;
            // An explicit amount is checked against the item total below.
            if let Some(amount) = amount {
                request.amount = amount;
            }
            request
        }
    };

    let timestamp = time::OffsetDateTime::now_utc().format(&Rfc3339)?;
    request = request
        .with_metadata("source", "sablepay-cli")
        .with_metadata("timestamp", timestamp);
    for (key, value) in metadata {
        request = request.with_metadata(key, value);
    }
    request.validate()?;
    Ok(request)
}

/// Prints flow events as they arrive.
struct TerminalListener;

impl FlowListener for TerminalListener {
    fn on_created(&mut self, record: &PaymentRecord, qr_payload: Option<&str>) {
        println!(
            "Payment {} created for {} ({})",
            record.payment_id,
            format_amount(record.amount),
            record.business_name
        );
        match qr_payload {
            Some(link) => println!("Scan to pay: {link}"),
            None => println!("The server returned no payment link."),
        }
    }

    fn on_status_update(&mut self, snapshot: &StatusSnapshot) {
        println!("  {}", snapshot.status);
    }

    fn on_transient_error(&mut self, attempt: u32, kind: ErrorKind, message: &str) {
        println!("  check #{attempt} failed ({kind}): {message}");
    }

    fn on_terminal(&mut self, outcome: &FlowOutcome) {
        match outcome {
            FlowOutcome::Completed(snapshot) => {
                println!("Payment completed.");
                print_snapshot(snapshot);
            }
            FlowOutcome::CreationFailed {
                message,
                retry_after,
                ..
            } => {
                println!("Could not create the payment: {message}");
                if let Some(wait) = retry_after {
                    println!("Retry in {}s.", wait.as_secs());
                }
            }
            other => println!("{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

/// Fetch and print one status snapshot.
pub async fn status(client: PaymentClient, payment_id: String) -> anyhow::Result<ExitCode> {
    match client.get_payment_status(&payment_id).await {
        Ok(snapshot) => {
            print_snapshot(&snapshot);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Status lookup failed");
            println!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_snapshot(snapshot: &StatusSnapshot) {
    for line in snapshot_lines(snapshot) {
        println!("{line}");
    }
}

fn snapshot_lines(snapshot: &StatusSnapshot) -> Vec<String> {
    let mut lines = vec![
        format!("Payment:     {}", snapshot.payment_id),
        format!("Status:      {}", snapshot.status),
        format!("Amount:      {}", format_amount(snapshot.amount)),
    ];
    if let Some(at) = snapshot.created_at {
        lines.push(format!("Created:     {at}"));
    }
    if let Some(tx) = &snapshot.transaction_id {
        lines.push(format!("Transaction: {tx}"));
    }
    if let Some(paid) = snapshot.paid_amount {
        let token = snapshot.paid_token.as_deref().unwrap_or("?");
        let network = snapshot.paid_network.as_deref().unwrap_or("?");
        lines.push(format!("Paid:        {paid} {token} on {network}"));
    }
    if let Some(at) = snapshot.completed_at {
        lines.push(format!("Completed:   {at}"));
    }
    if let Some(at) = snapshot.expires_at.filter(|_| !snapshot.is_terminal()) {
        lines.push(format!("Expires:     {at}"));
    }
    lines
}

// ---------------------------------------------------------------------------
// watch
// ---------------------------------------------------------------------------

/// Poll an existing payment until it settles.
pub async fn watch(
    client: PaymentClient,
    payment_id: String,
    interval: Duration,
    max_attempts: u32,
) -> anyhow::Result<ExitCode> {
    let engine = PollingEngine::new(Arc::new(client));
    let mut stream = engine.poll_status(&payment_id, interval, max_attempts)?;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let item = tokio::select! {
            item = stream.next() => item,
            _ = &mut shutdown => {
                stream.cancel();
                println!("Stopped watching payment {payment_id}.");
                return Ok(ExitCode::from(EXIT_INTERRUPTED));
            }
        };
        match item {
            Some(Ok(snapshot)) => {
                println!("  {} ({})", snapshot.status, format_amount(snapshot.amount));
            }
            Some(Err(e)) if e.kind() == ErrorKind::Auth => {
                stream.cancel();
                println!("{}", e.user_message());
                return Ok(ExitCode::FAILURE);
            }
            Some(Err(e)) => println!("  check failed ({}): {}", e.kind(), e.user_message()),
            None => break,
        }
    }

    Ok(match stream.end() {
        Some(PollEnd::Terminal(PaymentStatus::Completed)) => {
            println!("Payment completed.");
            ExitCode::SUCCESS
        }
        Some(PollEnd::Terminal(status)) => {
            println!("Payment {status}.");
            ExitCode::FAILURE
        }
        Some(PollEnd::Exhausted { attempts }) => {
            println!("Payment still pending after {attempts} status checks.");
            ExitCode::FAILURE
        }
        Some(PollEnd::Cancelled) | None => ExitCode::FAILURE,
    })
}
