use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use medidiagnose_api::ApiClient;
use medidiagnose_core::helpers::{format_date, relative_time, truncate_text};
use medidiagnose_core::intake::SubmissionRequest;
use medidiagnose_core::models::{AnalysisSummary, DiagnosisHistoryEntry, ImageUpload, Outcome, UserProfile};
use medidiagnose_core::{
    submit_delayed, ClientConfig, Database, HistoryStore, IntakeFlow, ReportGenerator,
    SessionContext,
};

#[derive(Parser)]
#[command(name = "medidiagnose")]
#[command(about = "MediDiagnose symptom checker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session
    Signin {
        /// Name shown on reports
        #[arg(long)]
        full_name: String,
        /// Bearer token for the API layer
        #[arg(long)]
        token: Option<String>,
    },
    /// End the current session
    Signout,
    /// Show the current session
    Whoami,
    /// Submit an image and symptoms for analysis
    Check {
        /// Photo of the affected area
        #[arg(long)]
        image: PathBuf,
        /// Checklist symptom (repeatable)
        #[arg(long = "symptom", required = true)]
        symptoms: Vec<String>,
        /// Description in your own words
        #[arg(long)]
        description: String,
        /// Use the diagnosis backend instead of the offline engine
        #[arg(long)]
        online: bool,
        /// Also write a PDF report into this directory
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Inspect saved diagnoses
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Write a PDF report for a saved diagnosis
    Report {
        /// History entry id
        id: String,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Check that the API layer is reachable
    Health,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List saved diagnoses, newest first
    List,
    /// Show one saved diagnosis
    Show { id: String },
    /// Delete all saved diagnoses
    Clear,
}

/// Shared state for one invocation.
struct App {
    config: ClientConfig,
    db: Arc<Mutex<Database>>,
    session: Arc<Mutex<SessionContext>>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medidiagnose=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let app = App::open(ClientConfig::from_env()?)?;

    match cli.command {
        Commands::Signin { full_name, token } => {
            app.session()?
                .sign_in(UserProfile::with_full_name(full_name), token)?;
            println!("Signed in.");
        }
        Commands::Signout => {
            app.session()?.teardown()?;
            println!("Signed out.");
        }
        Commands::Whoami => {
            let session = app.session()?.session();
            match session.display_name {
                Some(name) if session.is_signed_in => println!("Signed in as {}", name),
                _ if session.is_signed_in => println!("Signed in"),
                _ => println!("Not signed in"),
            }
        }
        Commands::Check {
            image,
            symptoms,
            description,
            online,
            report,
        } => app.check(&image, &symptoms, description, online, report.as_deref())?,
        Commands::History { action } => match action {
            HistoryAction::List => app.list_history()?,
            HistoryAction::Show { id } => {
                let store = app.history()?;
                let entry = store
                    .get_by_id(&id)
                    .ok_or_else(|| anyhow!("No saved diagnosis with id {}", id))?;
                print_entry(entry);
            }
            HistoryAction::Clear => {
                app.history()?.clear()?;
                println!("History cleared.");
            }
        },
        Commands::Report { id, out } => {
            let path = app.export_report(&id, &out)?;
            println!("Report written to {}", path.display());
        }
        Commands::Health => {
            ApiClient::new(&app.config, app.session.clone())?.health_check()?;
            println!("API is reachable at {}", app.config.api_base_url);
        }
    }

    Ok(())
}

impl App {
    fn open(config: ClientConfig) -> anyhow::Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }
        }
        let db = Database::open(&config.database_path).with_context(|| {
            format!("Failed to open database at {}", config.database_path.display())
        })?;
        let db = Arc::new(Mutex::new(db));
        let session = SessionContext::init(db.clone()).context("Failed to restore session")?;

        Ok(Self {
            config,
            db,
            session: Arc::new(Mutex::new(session)),
        })
    }

    fn session(&self) -> anyhow::Result<std::sync::MutexGuard<'_, SessionContext>> {
        self.session
            .lock()
            .map_err(|_| anyhow!("Session lock poisoned"))
    }

    fn history(&self) -> anyhow::Result<HistoryStore> {
        Ok(HistoryStore::open(
            self.db.clone(),
            self.config.history_capacity,
        )?)
    }

    fn check(
        &self,
        image: &Path,
        symptoms: &[String],
        description: String,
        online: bool,
        report_dir: Option<&Path>,
    ) -> anyhow::Result<()> {
        let mut flow = IntakeFlow::new(self.config.max_upload_bytes);

        let bytes = std::fs::read(image)
            .with_context(|| format!("Failed to read image {}", image.display()))?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(image).first_or_octet_stream();
        flow.attach_image(ImageUpload::new(file_name, mime.essence_str(), bytes))?;
        if let Some(quality) = flow.image_quality() {
            eprintln!("Image quality: {}", quality.as_str());
        }
        flow.advance()?;

        for label in symptoms {
            flow.toggle_symptom(label)?;
        }
        flow.set_description(description);

        let request = flow.begin_submission()?;
        let ticket = request.ticket;
        let outcome = if online {
            self.check_online(&request)
        } else {
            self.check_offline(&request)?
        };
        flow.complete_submission(ticket, outcome);

        if let Some(notice) = flow.take_notice() {
            eprintln!("{}", notice.message);
        }
        let summary = match flow.summary() {
            Some(summary) => summary.clone(),
            None => return Err(anyhow!("Analysis failed")),
        };
        print_summary(&summary);

        if let Some(dir) = report_dir {
            let generator = ReportGenerator::from_config(&self.config);
            let session = self.session()?.session();
            let result = flow.generate_report(&generator, &session);
            if let Some(notice) = flow.take_notice() {
                eprintln!("{}", notice.message);
            }
            let path = result?.export_to(dir)?;
            println!("Report written to {}", path.display());
        }
        Ok(())
    }

    fn check_online(&self, request: &SubmissionRequest) -> Outcome<AnalysisSummary> {
        let response = ApiClient::new(&self.config, self.session.clone()).and_then(|api| {
            api.symptom_check(
                &request.image,
                &request.input.selected_symptoms,
                &request.input.description,
            )
        });
        match response {
            Ok(summary) => Outcome::success(summary),
            Err(e) => {
                tracing::error!(error = %e, "Symptom check failed");
                Outcome::failure(e.to_string())
            }
        }
    }

    /// Score with the offline engine after the simulated latency.
    fn check_offline(&self, request: &SubmissionRequest) -> anyhow::Result<Outcome<AnalysisSummary>> {
        let store = Arc::new(Mutex::new(self.history()?));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start runtime")?;

        let input = request.input.clone();
        let delay = self.config.simulated_delay;
        let result = runtime.block_on(async move { submit_delayed(store, true, input, delay).wait().await });

        Ok(match result {
            Ok(result) => Outcome::success(AnalysisSummary::from_diagnosis(&result, &request.input)),
            Err(e) => Outcome::failure(e.to_string()),
        })
    }

    fn list_history(&self) -> anyhow::Result<()> {
        let store = self.history()?;
        if store.is_empty() {
            println!("No saved diagnoses.");
            return Ok(());
        }
        let now = chrono::Utc::now();
        for entry in store.entries() {
            let top = entry
                .result
                .top_condition()
                .map(|c| format!("{} ({}%)", c.name, c.confidence))
                .unwrap_or_default();
            println!(
                "{}  {:<16}  {}  {}",
                entry.id,
                relative_time(entry.timestamp, now),
                top,
                truncate_text(&entry.symptoms.description, 40)
            );
        }
        Ok(())
    }

    fn export_report(&self, id: &str, out: &Path) -> anyhow::Result<PathBuf> {
        let entry = self
            .history()?
            .get_by_id(id)
            .cloned()
            .ok_or_else(|| anyhow!("No saved diagnosis with id {}", id))?;
        let session = self.session()?.session();

        let summary = AnalysisSummary::from_diagnosis(&entry.result, &entry.symptoms);
        let report = ReportGenerator::from_config(&self.config).generate(
            Some(&summary),
            &session,
            &entry.symptoms.selected_symptoms,
            &entry.symptoms.description,
        )?;
        Ok(report.export_to(out)?)
    }
}

fn print_summary(summary: &AnalysisSummary) {
    println!("Diagnosis: {}", summary.diagnosis);
    if let Some(confidence) = summary.confidence {
        println!("Confidence: {}%", confidence);
    }
    if let Some(urgency) = summary.urgency {
        println!("Urgency: {}", urgency.as_str());
    }
    if !summary.description.is_empty() {
        println!("\n{}", summary.description);
    }
    if !summary.causes.is_empty() {
        println!("\nPossible causes:");
        for cause in &summary.causes {
            println!("  - {}", cause);
        }
    }
    if !summary.recommendations.is_empty() {
        println!("\nRecommendations:");
        for (i, rec) in summary.recommendations.iter().enumerate() {
            println!("  {}. {}", i + 1, rec);
        }
    }
}

fn print_entry(entry: &DiagnosisHistoryEntry) {
    println!("Id: {}", entry.id);
    println!("Date: {}", format_date(&entry.timestamp.with_timezone(&Local)));
    println!("Image: {}", if entry.has_image { "yes" } else { "no" });
    println!("Symptoms: {}", entry.symptoms.selected_symptoms.join(", "));
    println!("Description: {}", entry.symptoms.description);
    println!(
        "Confidence: {}  Urgency: {}",
        entry.result.confidence_level.as_str(),
        entry.result.urgency_level.as_str()
    );
    println!("\nPossible conditions:");
    for condition in &entry.result.possible_conditions {
        println!("  {} ({}%)", condition.name, condition.confidence);
        for treatment in &condition.treatments {
            println!("    - {}", treatment);
        }
    }
    println!("\nRecommendations:");
    for rec in &entry.result.recommendations {
        println!("  - {}", rec);
    }
}
