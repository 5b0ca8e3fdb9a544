mod config;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use floor_client::{
    dialog::format_date_time, validation::NewCardForm, CardFlow, FinishFaultDialog, FloorContext,
    FloorEvent, HttpActionGateway, JsonFileStorage, OvenFlow, OvenState,
    ReportFaultDialog, SessionStore,
};
use floor_shared::{
    domain::{CardNumber, OvenId, ProgramId},
    locale::Locale,
};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "floor-kiosk",
    about = "Shop-floor kiosk for oven tracking and inventory cards"
)]
struct Args {
    #[arg(long, default_value = "floor.toml")]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    locale: Option<String>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in up to three operators by personal number.
    Login {
        #[arg(required = true, num_args = 1..=3)]
        identifiers: Vec<String>,
    },
    Logout,
    /// Follow the oven screens until interrupted.
    Oven {
        #[arg(long)]
        oven: String,
        #[arg(long)]
        program: Option<String>,
    },
    ReportFault {
        #[arg(long)]
        oven: String,
        #[arg(long)]
        fault: String,
    },
    FinishFault {
        #[arg(long)]
        oven: String,
    },
    /// List the cards of the logged-in operators.
    Cards,
    Positions {
        #[arg(long)]
        card: i64,
    },
    NewCard {
        #[arg(long)]
        warehouse: String,
        #[arg(long)]
        sector: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings(&args.config)?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(locale) = args.locale.as_deref() {
        settings.locale = Locale::resolve(locale);
    }
    if let Some(data_dir) = args.data_dir {
        settings.data_dir = data_dir;
    }
    info!(server_url = %settings.server_url, locale = %settings.locale, "starting kiosk");

    let gateway = HttpActionGateway::new(&settings.server_url).context("invalid server url")?;
    let storage = Arc::new(JsonFileStorage::new(&settings.data_dir));
    let session = SessionStore::rehydrate(storage);
    let ctx = FloorContext::new(
        Arc::new(gateway),
        session,
        settings.locale,
        settings.refresh_policy(),
    )
    .context("failed to load locale dictionary")?;

    let notifier = tokio::spawn(print_notifications(ctx.subscribe_events()));
    let outcome = run(args.command, &ctx).await;
    // Let queued toasts reach the terminal before exiting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    notifier.abort();
    outcome
}

async fn run(command: Command, ctx: &Arc<FloorContext>) -> Result<()> {
    match command {
        Command::Login { identifiers } => {
            ctx.login(&identifiers).await.context("login failed")?;
            for operator in ctx.session().snapshot().operators() {
                println!("{}\t{}", operator.identifier, operator.display_name);
            }
        }
        Command::Logout => {
            ctx.logout().context("failed to persist logout")?;
            println!("logged out");
        }
        Command::Oven { oven, program } => {
            watch_oven(ctx, OvenId::new(oven), program.map(ProgramId::new)).await?
        }
        Command::ReportFault { oven, fault } => report_fault(ctx, OvenId::new(oven), &fault).await?,
        Command::FinishFault { oven } => finish_fault(ctx, OvenId::new(oven)).await?,
        Command::Cards => list_cards(ctx).await?,
        Command::Positions { card } => list_positions(ctx, CardNumber(card)).await?,
        Command::NewCard { warehouse, sector } => {
            let mut flow = CardFlow::new(Arc::clone(ctx));
            require_login(ctx)?;
            flow.load_options().await.context("failed to load card options")?;
            let card = flow
                .create_card(&NewCardForm::new(warehouse, sector))
                .await
                .context("card was not created")?;
            println!("created card {card}");
        }
    }
    Ok(())
}

fn require_login(ctx: &FloorContext) -> Result<()> {
    if !ctx.session().is_logged_in() {
        bail!("no operator logged in; run `floor-kiosk login <personal number>` first");
    }
    Ok(())
}

async fn print_notifications(mut events: broadcast::Receiver<FloorEvent>) {
    loop {
        match events.recv().await {
            Ok(FloorEvent::ErrorToast(message)) => eprintln!("! {message}"),
            Ok(event) => info!(?event, "floor event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "notification stream lagged")
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn watch_oven(ctx: &Arc<FloorContext>, oven: OvenId, program: Option<ProgramId>) -> Result<()> {
    require_login(ctx)?;
    let mut flow = OvenFlow::new(Arc::clone(ctx));
    flow.select_oven(oven);
    if let Some(program) = program {
        flow.select_program(program);
    }

    let mut selection = ctx.selection().subscribe();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut last_state: Option<OvenState> = None;
    let mut last_summary = String::new();
    loop {
        let state = flow.evaluate();
        if last_state != Some(state) {
            println!("screen: {:?} ({state:?})", state.screen());
            last_state = Some(state);
        }

        let summary = oven_summary(&flow);
        if summary != last_summary {
            println!("{summary}");
            last_summary = summary;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = flow.changed() => {}
            _ = selection.changed() => {}
            _ = ticker.tick() => {}
        }
    }
    Ok(())
}

fn oven_summary(flow: &OvenFlow) -> String {
    let processes = flow.processes();
    let active = processes
        .data
        .as_deref()
        .map(|processes| processes.iter().filter(|p| p.status.is_active()).count());
    let fault = match flow.active_fault() {
        Some(fault) => fault.fault_label.unwrap_or(fault.fault_key),
        None => "-".to_string(),
    };
    let summary = match active {
        Some(active) => format!("active processes: {active}, fault: {fault}"),
        None if processes.is_fetching => "processes loading".to_string(),
        None => "processes unavailable".to_string(),
    };
    match flow.fetch_error_message() {
        Some(message) => format!("{summary} ! {message}"),
        None => summary,
    }
}

async fn report_fault(ctx: &Arc<FloorContext>, oven: OvenId, fault: &str) -> Result<()> {
    require_login(ctx)?;
    let mut flow = OvenFlow::new(Arc::clone(ctx));
    flow.select_oven(oven);
    flow.evaluate();
    let catalog = flow
        .load_fault_types()
        .await
        .context("failed to load fault types")?;

    let mut dialog = ReportFaultDialog::new();
    dialog.open();
    dialog.select_fault(fault, &catalog)?;
    if !flow.confirm_report_fault(&mut dialog).await? {
        bail!("fault was not reported");
    }
    println!("fault '{fault}' reported");
    Ok(())
}

async fn finish_fault(ctx: &Arc<FloorContext>, oven: OvenId) -> Result<()> {
    require_login(ctx)?;
    let mut flow = OvenFlow::new(Arc::clone(ctx));
    flow.select_oven(oven);
    flow.evaluate();
    let state = flow.refetch_active_fault().await;
    if let Some(err) = state.error {
        return Err(err).context("failed to fetch active fault");
    }
    let Some(fault) = flow.active_fault() else {
        bail!("{}", ctx.dictionary().oven.no_active_fault);
    };

    let mut dialog = FinishFaultDialog::new();
    dialog.open_for(fault);
    if let Some(details) = dialog.details(ctx.session()) {
        let text = &ctx.dictionary().finish_fault_dialog;
        println!("{}: {}", text.start_time, details.start_time);
        println!("{}: {}", text.reported_by, details.reported_by);
    }
    if !flow.confirm_finish_fault(&mut dialog).await {
        bail!("fault was not finished");
    }
    println!("fault finished");
    Ok(())
}

async fn list_cards(ctx: &Arc<FloorContext>) -> Result<()> {
    require_login(ctx)?;
    let mut flow = CardFlow::new(Arc::clone(ctx));
    flow.evaluate();
    let state = flow.refetch_cards().await;
    if let Some(message) = flow.fetch_error_message() {
        eprintln!("! {message}");
    }
    if let Some(err) = state.error {
        return Err(err).context("failed to fetch cards");
    }
    let cards = state.data.unwrap_or_default();
    if cards.is_empty() {
        println!("{}", ctx.dictionary().inventory.no_cards);
    }
    for card in cards.iter() {
        println!(
            "{}\t{}/{}\t{} positions\t{}",
            card.number,
            card.warehouse,
            card.sector,
            card.positions_len(),
            format_date_time(card.time)
        );
    }
    Ok(())
}

async fn list_positions(ctx: &Arc<FloorContext>, number: CardNumber) -> Result<()> {
    require_login(ctx)?;
    let mut flow = CardFlow::new(Arc::clone(ctx));
    flow.evaluate();
    let cards = flow.refetch_cards().await;
    let Some(card) = cards
        .data
        .as_deref()
        .and_then(|cards| cards.iter().find(|card| card.number == number))
    else {
        bail!("card {number} not found for the logged-in operators");
    };
    flow.choose_card(card);
    flow.evaluate();

    let state = flow.refetch_positions().await;
    if let Some(err) = state.error {
        return Err(err).context("failed to fetch card positions");
    }
    for position in state.data.as_deref().map(Vec::as_slice).unwrap_or_default() {
        println!(
            "{}\t{}\t{}\t{} {}",
            position.position,
            position.article_number,
            position.article_name,
            position.quantity,
            position.unit
        );
    }
    println!("screen: {:?}", flow.evaluate().screen());
    Ok(())
}
