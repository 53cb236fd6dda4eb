use crate::infra::opening_time;
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use folder_custody::custody::{
    ApprovalOutcome, CustodyError, CustodyPolicy, CustodyService, DrawerId, EmployeeIdentity,
    EnvelopeCategory, FolderId, InMemoryStore, ManualClock, NewFolder, NewRequest, UserId,
    WithdrawalId,
};
use folder_custody::error::AppError;
use std::sync::Arc;

const DEMO_OPERATOR: UserId = UserId(1);

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// First day of the simulation (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Days the first withdrawal stays out before it is returned.
    #[arg(long, default_value_t = 8)]
    pub(crate) days_out: i64,
    /// Print the final dashboard and audit log as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

type DemoService = CustodyService<InMemoryStore, ManualClock>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        start,
        days_out,
        json,
    } = args;

    let start = start.unwrap_or_else(|| Local::now().date_naive());
    let clock = Arc::new(ManualClock::new(opening_time(start)));
    let service = CustodyService::new(
        Arc::new(InMemoryStore::new()),
        clock.clone(),
        CustodyPolicy::default(),
    );

    println!("Folder custody demo starting {start}");

    let cabinet_id = service.register_cabinet("Cabinet A", "Records room, ground floor")?;
    let drawer_id = service.register_drawer(cabinet_id, "A-01", 3)?;
    println!("- Registered drawer A-01 (capacity 3) in cabinet {cabinet_id}");

    let ana = service.create_folder(demo_folder(drawer_id, "Ana Souza", "hr-1001", "Finance"))?;
    let bruno =
        service.create_folder(demo_folder(drawer_id, "Bruno Lima", "hr-1002", "Logistics"))?;
    let drawer = service.drawer(drawer_id)?;
    println!(
        "- Filed folders for Ana Souza and Bruno Lima ({}/{} slots used)",
        drawer.occupancy, drawer.capacity
    );

    let withdrawal_id = withdraw(
        &service,
        ana,
        &[EnvelopeCategory::Personal, EnvelopeCategory::Medicine],
        "benefits review",
    )?;
    let withdrawal = service.withdrawal(withdrawal_id)?;
    println!(
        "- Withdrawal {withdrawal_id} opened for {} (due {})",
        withdrawal.categories,
        withdrawal.due_at.date_naive()
    );

    match service.create_request(NewRequest {
        folder_id: ana,
        categories: [EnvelopeCategory::Medicine].into_iter().collect(),
        user_id: UserId(2),
        reason: "second opinion".to_string(),
        is_dismissal: false,
    }) {
        Ok(request_id) => println!("  Unexpectedly accepted request {request_id}"),
        Err(err) => println!("  Second request refused: {err}"),
    }

    println!("\nDaily alert scans");
    for day in 1..=days_out.max(0) {
        clock.advance(Duration::days(1));
        let report = service.scan_alerts()?;
        if report.warnings_raised + report.criticals_raised > 0 {
            println!(
                "  day {day}: {} warning(s), {} critical(s), {} marked overdue",
                report.warnings_raised, report.criticals_raised, report.marked_overdue
            );
        }
    }
    for alert in service.unresolved_alerts()? {
        println!(
            "  [{:?}] {}: {}",
            alert.severity, alert.employee_name, alert.detail
        );
    }

    let receipt = service.finalize_withdrawal(withdrawal_id, DEMO_OPERATOR)?;
    println!(
        "\n- Returned {} and resolved {} alert(s)",
        receipt.restored, receipt.alerts_resolved
    );

    let request_id = service.create_request(NewRequest {
        folder_id: bruno,
        categories: [EnvelopeCategory::Personal].into_iter().collect(),
        user_id: DEMO_OPERATOR,
        reason: "end of contract".to_string(),
        is_dismissal: true,
    })?;
    if let ApprovalOutcome::Dismissal { slot_released, .. } =
        service.approve_request(request_id, DEMO_OPERATOR)?
    {
        println!("- Bruno Lima dismissed, folder archived (slot released: {slot_released})");
    }

    let stats = service.dashboard()?;
    println!(
        "\nDashboard: {} drawer(s), {} active folder(s), {} outstanding withdrawal(s), {} critical alert(s)",
        stats.total_drawers,
        stats.active_folders,
        stats.outstanding_withdrawals,
        stats.critical_alerts
    );

    if json {
        let audit = service.audit_log(20)?;
        match serde_json::to_string_pretty(&serde_json::json!({
            "dashboard": stats,
            "audit_log": audit,
        })) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("JSON output unavailable: {err}"),
        }
    }

    Ok(())
}

fn demo_folder(
    drawer_id: DrawerId,
    name: &str,
    badge: &str,
    department: &str,
) -> NewFolder {
    NewFolder {
        drawer_id,
        employee: EmployeeIdentity {
            name: name.to_string(),
            badge_id: Some(badge.to_string()),
            department: Some(department.to_string()),
            hire_date: None,
        },
        label: None,
        order: 0,
    }
}

fn withdraw(
    service: &DemoService,
    folder_id: FolderId,
    categories: &[EnvelopeCategory],
    reason: &str,
) -> Result<WithdrawalId, AppError> {
    let request_id = service.create_request(NewRequest {
        folder_id,
        categories: categories.iter().copied().collect(),
        user_id: DEMO_OPERATOR,
        reason: reason.to_string(),
        is_dismissal: false,
    })?;
    match service.approve_request(request_id, DEMO_OPERATOR)? {
        ApprovalOutcome::Withdrawal { withdrawal_id, .. } => Ok(withdrawal_id),
        ApprovalOutcome::Dismissal { .. } => {
            Err(CustodyError::validation("demo request was approved as a dismissal").into())
        }
    }
}
