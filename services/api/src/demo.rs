use crate::infra::{
    InMemoryDirectory, InMemoryEventLog, InMemoryResponseStore, JsonLinesResponseStore,
};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use psyrisk::config::DashboardConfig;
use psyrisk::error::AppError;
use psyrisk::workflows::assessment::questionnaire::{
    AgeInput, AnswerItem, AnswerPayload, CommitRequest, IdentityForm, RecoveryPayload,
    ResponseStore, SubmissionError, SubmissionService,
};
use psyrisk::workflows::assessment::report::{
    import_action_plan, ActionLookup, ActionPlanTable, NoActions, ReportService,
};
use psyrisk::workflows::assessment::{
    AnswerLabel, BlockKey, Campaign, CampaignStatus, CampaignToken, GroupDirectory, GroupId,
    GroupingMode, QuestionCatalog, TenantContext, TenantId,
};
use psyrisk::workflows::dashboard::{
    CaseStatus, ComplaintRecord, DashboardFilter, DashboardService, HelpRequestRecord, MoodRecord,
    RecordedEvents, Sentiment,
};
use serde_json::json;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

const DEMO_TENANT: TenantId = TenantId(1);

/// Action plan shipped with the demo tenant.
const DEMO_ACTION_PLAN: &str = "\
question_number,question_text,actions,trigger_below,active
1,Different groups at work demand things from me that are hard to combine,Map conflicting requests | Agree one priority owner per team,,true
3,I have unachievable deadlines,Review delivery dates with planning | Add buffer to recurring deadlines,3.80,true
9,I can decide when to take a break,Publish a break rota agreed with staff,,true
15,I am given supportive feedback on the work I do,Train leads on structured feedback,,true
";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Respondents per campaign.
    #[arg(long, default_value_t = 18)]
    pub(crate) respondents: u64,
    /// Override the reporting date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the full report payloads as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// JSON-lines export with one stored response per line
    #[arg(long)]
    pub(crate) responses: PathBuf,
    /// Campaign token to report on
    #[arg(long, value_parser = parse_token)]
    pub(crate) campaign: CampaignToken,
    /// Baseline campaign token in the same export to compare against
    #[arg(long, value_parser = parse_token)]
    pub(crate) compare_with: Option<CampaignToken>,
    /// Tenant the export belongs to
    #[arg(long, default_value_t = 1)]
    pub(crate) tenant: u64,
    /// Tenant assessment type; `sector` groups by department, anything else by GHE
    #[arg(long, default_value = "ghe")]
    pub(crate) assessment_type: String,
    /// Headcount used for the response rate
    #[arg(long)]
    pub(crate) employees: Option<u32>,
    /// Action plan CSV (question_number,question_text,actions,trigger_below,active)
    #[arg(long)]
    pub(crate) actions: Option<PathBuf>,
    /// Campaign title shown in the report header
    #[arg(long, default_value = "Psychosocial risk assessment")]
    pub(crate) title: String,
    /// Campaign start date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Campaign end date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end: Option<NaiveDate>,
}

fn parse_token(raw: &str) -> Result<CampaignToken, String> {
    CampaignToken::parse(raw).ok_or_else(|| format!("'{raw}' is not a campaign token"))
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        responses,
        campaign,
        compare_with,
        tenant,
        assessment_type,
        employees,
        actions,
        title,
        start,
        end,
    } = args;

    let tenant = TenantId(tenant);
    let context = TenantContext {
        tenant_id: tenant,
        grouping_mode: GroupingMode::from_assessment_type(&assessment_type),
        employee_count: employees,
    };
    let lookup: Arc<dyn ActionLookup> = match actions {
        Some(path) => Arc::new(ActionPlanTable::from_entries(import_action_plan(
            tenant,
            File::open(path)?,
        )?)),
        None => Arc::new(NoActions),
    };
    let directory: Arc<dyn GroupDirectory> = Arc::new(InMemoryDirectory::default());
    let service = ReportService::new(
        Arc::new(JsonLinesResponseStore::new(responses)),
        Arc::new(QuestionCatalog::standard()),
        lookup,
        directory,
    );

    let today = Local::now().date_naive();
    let finished = |token: CampaignToken| Campaign {
        token,
        tenant_id: tenant,
        title: title.clone(),
        start_date: start.unwrap_or(today),
        end_date: end.unwrap_or(today),
        status: CampaignStatus::Finished,
        created_by: None,
    };
    let current = finished(campaign);
    let report = service.campaign_report(&current, &context)?;

    let payload = match compare_with {
        Some(baseline) => {
            let comparison = service.compare_campaigns(&finished(baseline), &current, &context)?;
            json!({ "report": report, "comparison": comparison })
        }
        None => json!({ "report": report }),
    };
    print_json(&payload);
    Ok(())
}

/// Seeded tenant with a finished baseline campaign, an active follow-up
/// campaign and sixty days of kiosk events.
pub(crate) struct DemoWorld {
    pub(crate) context: TenantContext,
    pub(crate) directory: Arc<InMemoryDirectory>,
    pub(crate) store: Arc<InMemoryResponseStore>,
    pub(crate) events: Arc<InMemoryEventLog>,
    pub(crate) actions: Arc<ActionPlanTable>,
    pub(crate) catalog: Arc<QuestionCatalog>,
    pub(crate) baseline: Campaign,
    pub(crate) current: Campaign,
}

pub(crate) fn seed_demo(today: NaiveDate, respondents: u64) -> Result<DemoWorld, AppError> {
    let context = TenantContext {
        tenant_id: DEMO_TENANT,
        grouping_mode: GroupingMode::BroadUnit,
        employee_count: Some(40),
    };
    let catalog = Arc::new(QuestionCatalog::standard());
    let store = Arc::new(InMemoryResponseStore::default());
    let submissions = SubmissionService::new(store.clone(), catalog.clone());

    let baseline = demo_campaign(0xB45E, "Baseline assessment", today - Duration::days(120));
    let current = demo_campaign(0xC0DE, "Follow-up assessment", today - Duration::days(20));

    for (campaign, shift) in [(&baseline, 0), (&current, 1)] {
        for respondent in 0..respondents {
            let outcome =
                submit_demo_response(&submissions, campaign, &context, respondent, shift);
            if let Err(err) = outcome {
                warn!(error = %err, respondent, "demo response rejected");
            }
        }
    }

    let mut directory = InMemoryDirectory::default()
        .with_tenant(context)
        .with_campaign(Campaign {
            status: CampaignStatus::Finished,
            ..baseline.clone()
        })
        .with_campaign(current.clone());
    for (id, name) in [(1, "Operations"), (2, "Administration"), (3, "Maintenance")] {
        directory = directory.with_group(DEMO_TENANT, GroupingMode::BroadUnit, GroupId(id), name);
    }

    let actions = Arc::new(ActionPlanTable::from_entries(import_action_plan(
        DEMO_TENANT,
        DEMO_ACTION_PLAN.as_bytes(),
    )?));

    let events = Arc::new(InMemoryEventLog::default());
    events.record(DEMO_TENANT, demo_events(today));

    Ok(DemoWorld {
        context,
        directory: Arc::new(directory),
        store,
        events,
        actions,
        catalog,
        baseline: Campaign {
            status: CampaignStatus::Finished,
            ..baseline
        },
        current,
    })
}

fn demo_campaign(seed: u128, title: &str, start: NaiveDate) -> Campaign {
    Campaign {
        token: CampaignToken(Uuid::from_u128(seed)),
        tenant_id: DEMO_TENANT,
        title: title.to_string(),
        start_date: start,
        end_date: start + Duration::days(29),
        status: CampaignStatus::Active,
        created_by: Some("demo".to_string()),
    }
}

fn demo_form(respondent: u64) -> IdentityForm {
    IdentityForm {
        external_id: format!("{:011}", 10_000_000_000 + respondent),
        age: Some(AgeInput::Whole(22 + (respondent % 35) as i64)),
        display_name: None,
        sex: None,
        ghe_id: Some(GroupId(respondent % 3 + 1)),
        department_id: Some(GroupId(100 + respondent % 4)),
        job_function_id: None,
    }
}

fn demo_answers(
    catalog: &QuestionCatalog,
    block: BlockKey,
    respondent: u64,
    shift: u64,
) -> Vec<String> {
    let options = AnswerLabel::ordered();
    let count = catalog
        .domain(block)
        .map(|domain| domain.question_count())
        .unwrap_or(0);
    (0..count as u64)
        .map(|index| {
            let base = (respondent * 7 + index * 3 + u64::from(block.step())) % 4;
            let position = (base + shift).min(4) as usize;
            options[position].label().to_string()
        })
        .collect()
}

fn submit_demo_response<R: ResponseStore + 'static>(
    service: &SubmissionService<R>,
    campaign: &Campaign,
    context: &TenantContext,
    respondent: u64,
    shift: u64,
) -> Result<(), SubmissionError> {
    let form = demo_form(respondent);
    let mut state = service.begin(campaign, context, &form)?;
    for block in BlockKey::ordered() {
        let answers = demo_answers(service.catalog(), block, respondent, shift);
        service.answer_block(&mut state, block, &answers)?;
    }
    let request = CommitRequest {
        comment: (respondent % 5 == 0)
            .then(|| "More predictable schedules would help.".to_string()),
        recovery: None,
    };
    service
        .commit(campaign, context, Some(state), request)
        .map(|_| ())
        .map_err(|failure| failure.error)
}

fn demo_events(today: NaiveDate) -> RecordedEvents {
    let sentiments = Sentiment::ordered();
    let categories = ["Workload", "workload ", "Harassment", "Equipment"];
    let mut events = RecordedEvents::default();

    for offset in 0..60i64 {
        let date = today - Duration::days(offset);
        for slot in 0..(offset % 3 + 1) {
            let sentiment = sentiments[((offset + slot) % 5) as usize];
            events.moods.push(MoodRecord {
                date,
                sentiment,
                mood_score: sentiment.score(),
                department: Some(GroupId(100 + (slot as u64 % 4))),
                department_name: Some(format!("Department {}", 100 + slot % 4)),
                ghe: Some(GroupId(slot as u64 % 3 + 1)),
                kiosk: Some(if slot % 2 == 0 { "lobby" } else { "canteen" }.to_string()),
            });
        }
        if offset % 6 == 0 {
            events.complaints.push(ComplaintRecord {
                date,
                category: categories[(offset / 6 % 4) as usize].to_string(),
                status: CaseStatus::ordered()[(offset % 3) as usize],
                kiosk: Some("lobby".to_string()),
            });
        }
        if offset % 15 == 0 {
            events.help_requests.push(HelpRequestRecord {
                date,
                status: CaseStatus::Open,
                kiosk: None,
            });
        }
    }
    events
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let world = seed_demo(today, args.respondents.max(1))?;

    println!("Psychosocial risk demo (tenant {})", world.context.tenant_id);
    let submissions = SubmissionService::new(world.store.clone(), world.catalog.clone());

    println!("\nWizard guarantees");
    match submissions.begin(&world.current, &world.context, &demo_form(0)) {
        Err(SubmissionError::DuplicateIdentity) => {
            println!("- Repeat identity rejected at the identity step")
        }
        Err(err) => println!("- Repeat identity rejected: {err}"),
        Ok(_) => println!("- Repeat identity unexpectedly accepted"),
    }
    match submissions.begin(&world.baseline, &world.context, &demo_form(999)) {
        Err(SubmissionError::CampaignClosed(status)) => {
            println!("- Closed campaign: {}", status.respondent_notice())
        }
        Err(err) => println!("- Closed campaign rejected: {err}"),
        Ok(_) => println!("- Closed campaign unexpectedly opened"),
    }
    let recovery = RecoveryPayload {
        meta: demo_form(args.respondents + 1),
        responses: recovered_answers(&world.catalog, args.respondents + 1),
        comments: Some("Submitted after a lost session.".to_string()),
    };
    let recovered = submissions.commit(
        &world.current,
        &world.context,
        None,
        CommitRequest {
            comment: None,
            recovery: Some(recovery),
        },
    );
    match recovered {
        Ok(receipt) => println!("- Lost session recovered as response {}", receipt.response_id),
        Err(failure) => println!("- Recovery failed: {}", failure.error),
    }

    let reports = ReportService::new(
        world.store.clone(),
        world.catalog.clone(),
        world.actions.clone(),
        world.directory.clone(),
    );
    let report = reports.campaign_report(&world.baseline, &world.context)?;
    let results = &report.results;

    println!("\n{} ({} responses)", report.campaign.title, results.responses);
    println!(
        "Response rate {:.1}% ({}) | overall {:.1} / {:.1}% ({})",
        report.response_rate.rate,
        report.response_rate.label.label(),
        results.overall.avg,
        results.overall.percent,
        results.overall.rating_label
    );
    println!("\nDomains");
    for domain in &results.domains {
        println!(
            "- {}: avg {:.1} | {:.1}% | {}",
            domain.label, domain.avg, domain.percent, domain.rating_label
        );
    }
    println!("\n{}", results.group_label_plural);
    for group in &results.groups {
        println!("- {}: {:.1}% ({})", group.name, group.percent, group.zone_label);
    }

    let mut weakest: Vec<_> = results.questions.iter().collect();
    weakest.sort_by(|a, b| a.percent.total_cmp(&b.percent).then(a.number.cmp(&b.number)));
    println!("\nLowest scoring questions");
    for question in weakest.into_iter().take(3) {
        println!(
            "- Q{} {} | {:.1}% ({})",
            question.number, question.text, question.percent, question.zone_label
        );
        for action in &question.actions {
            println!("    action: {action}");
        }
    }

    let comments = reports.comments(&world.baseline, &world.context)?;
    println!(
        "\nComments ({} of {} responses)",
        comments.comments.len(),
        comments.responses
    );
    for comment in &comments.comments {
        println!("- {comment}");
    }

    let finished_current = Campaign {
        status: CampaignStatus::Finished,
        ..world.current.clone()
    };
    let comparison =
        reports.compare_campaigns(&world.baseline, &finished_current, &world.context)?;
    println!("\nFollow-up vs baseline");
    println!(
        "- Responses {} -> {} ({:+})",
        comparison.responses.a, comparison.responses.b, comparison.responses.delta
    );
    for row in &comparison.domains {
        println!(
            "- {}: {:.1}% -> {:.1}% ({:+.1} pts)",
            row.label, row.scores.a.percent, row.scores.b.percent, row.scores.delta
        );
    }

    let dashboard = DashboardService::new(world.events.clone(), DashboardConfig::default());
    let period = dashboard.resolve_period(None, None, today);
    let overview = dashboard.report(DEMO_TENANT, period, &DashboardFilter::default())?;
    println!(
        "\nDashboard {} -> {}: {} check-ins, {} complaints, {} help requests",
        period.start,
        period.end,
        overview.current.mood_count,
        overview.current.complaint_count,
        overview.current.help_count
    );
    println!(
        "- Mood {:.1}% | top sentiment {} | complaint risk {}",
        overview.current.mood_score.percent,
        overview.current.top_sentiment_label,
        overview.current.risk_label
    );

    let alerts = dashboard.alerts(DEMO_TENANT, today)?;
    println!("\nAlerts {} -> {}", alerts.period.start, alerts.period.end);
    if alerts.alerts.is_empty() {
        println!("- none");
    }
    for alert in &alerts.alerts {
        println!("- {:?} {:?}: {}", alert.level, alert.kind, alert.message);
    }

    if args.json {
        print_json(&json!({
            "report": report,
            "comments": comments,
            "comparison": comparison,
            "dashboard": overview,
            "alerts": alerts,
        }));
    }

    Ok(())
}

fn recovered_answers(catalog: &QuestionCatalog, respondent: u64) -> AnswerPayload {
    let mut payload = AnswerPayload::new();
    for block in BlockKey::ordered() {
        let domain = catalog.domain(block);
        let items = demo_answers(catalog, block, respondent, 1)
            .into_iter()
            .enumerate()
            .map(|(index, answer)| AnswerItem {
                question: domain
                    .and_then(|domain| domain.questions.get(index))
                    .map(|text| text.to_string())
                    .unwrap_or_default(),
                answer,
            })
            .collect();
        payload.insert(block, items);
    }
    payload
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(body) => println!("{body}"),
        Err(err) => println!("report payload unavailable: {err}"),
    }
}
