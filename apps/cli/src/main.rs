use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use lectern_core::{
    LecternError, Settings,
    events::BusConfig,
    format::format_clock,
    jobs::JobStore,
    materialize::{chapter_at, chapters_in_range},
    output::{get_job_dir, load_chapters},
    provider::Provider,
    quiz::{Quiz, QuizClient},
    segmenter::{LlmBoundaryInference, MergePolicy, Segmenter},
    transcript::{LineParser, parse_timestamp},
    types::Chapter,
};
use tokio::fs;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::{
    pipeline::start_pipeline,
    workers::events::{JobSpec, TranscriptSubmitted},
};

mod pipeline;
mod workers;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliProvider {
    Anthropic,
    Grok,
    Openai,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Anthropic => Provider::Anthropic,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliMerge {
    None,
    Overlap,
}

impl From<CliMerge> for MergePolicy {
    fn from(cli: CliMerge) -> Self {
        match cli {
            CliMerge::None => MergePolicy::None,
            CliMerge::Overlap => MergePolicy::Overlap,
        }
    }
}

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Split lecture transcripts into chapters and quiz yourself on them")]
struct Cli {
    /// Settings file (TOML). Falls back to $LECTERN_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug). RUST_LOG wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean a transcript, detect chapters and write chapters.md / chapters.json
    Chapters(ChaptersArgs),

    /// Show the chapter playing at a timestamp
    At {
        /// chapters.json written by `lectern chapters`
        chapters: PathBuf,
        /// Seconds (`125.5`) or a timestamp (`00:02:05.500`)
        time: String,
    },

    /// List chapters by number, optionally limited to a range
    Segments {
        chapters: PathBuf,
        /// First chapter number to show
        #[arg(long)]
        start: Option<u32>,
        /// Last chapter number to show
        #[arg(long)]
        end: Option<u32>,
    },

    /// Generate quiz questions for one chapter
    Quiz {
        chapters: PathBuf,
        segment: u32,
        #[arg(short, long)]
        questions: Option<u32>,
        /// Where to write the quiz JSON. Defaults next to the chapters file.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check an answer to a quiz question
    Answer {
        quiz: PathBuf,
        question: u32,
        answer: String,
        /// chapters.json providing transcript context for grading
        #[arg(long, requires = "segment")]
        chapters: Option<PathBuf>,
        #[arg(long, requires = "chapters")]
        segment: Option<u32>,
    },
}

#[derive(Args)]
struct ChaptersArgs {
    /// Transcript file with `[HH:MM:SS.mmm -> HH:MM:SS.mmm] text` lines
    transcript: PathBuf,

    /// Output directory. Defaults to a per-transcript directory under the data dir.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Boundary inference provider
    #[arg(short, long)]
    provider: Option<CliProvider>,

    /// Lines per inference chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Chunks in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Retries per failed chunk
    #[arg(long)]
    retries: Option<u32>,

    #[arg(long)]
    merge: Option<CliMerge>,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Chapters(args) => run_chapters(settings, args).await,
        Command::At { chapters, time } => run_at(&chapters, &time).await,
        Command::Segments {
            chapters,
            start,
            end,
        } => run_segments(&chapters, start, end).await,
        Command::Quiz {
            chapters,
            segment,
            questions,
            out,
        } => run_quiz(&settings, &chapters, segment, questions, out).await,
        Command::Answer {
            quiz,
            question,
            answer,
            chapters,
            segment,
        } => run_answer(&settings, &quiz, question, &answer, chapters, segment).await,
    }
}

async fn run_chapters(mut settings: Settings, args: ChaptersArgs) -> Result<()> {
    if let Some(provider) = args.provider {
        settings.provider = provider.into();
    }
    if let Some(chunk_size) = args.chunk_size {
        settings.segmenter.chunk_size = chunk_size;
    }
    if let Some(concurrency) = args.concurrency {
        settings.segmenter.max_concurrent_chunks = concurrency;
    }
    if let Some(retries) = args.retries {
        settings.segmenter.max_retries = retries;
    }
    if let Some(merge) = args.merge {
        settings.segmenter.merge_policy = merge.into();
    }

    let provider = settings.provider;

    // Validate API key early
    if let Err(e) = provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    let output_dir = args
        .out
        .unwrap_or_else(|| get_job_dir(&settings.output_dir(), &args.transcript));

    println!(
        "\n{}  {}\n",
        style("lectern").cyan().bold(),
        style("Lecture Chapters").dim()
    );

    let inference = LlmBoundaryInference::new(provider, &settings.segmenter)?;
    let segmenter = Arc::new(Segmenter::with_settings(Arc::new(inference), &settings.segmenter));
    let parser = Arc::new(LineParser::new(settings.noise.clone()));
    let jobs = JobStore::new();

    let handle = start_pipeline(BusConfig::default(), parser, segmenter, jobs.clone()).await?;

    let job = jobs.create(args.transcript.display().to_string());
    let total_start = Instant::now();
    let spinner = create_spinner(&format!(
        "Detecting chapters with {}...",
        provider.name()
    ));

    handle.bus.publish(Arc::new(TranscriptSubmitted::new(JobSpec {
        job_id: job.id,
        transcript_path: args.transcript.clone(),
        output_dir,
    })));

    let outcome = handle
        .done_rx
        .await
        .context("pipeline stopped before the job finished")?;
    let _ = handle.shutdown_tx.send(());

    let record = jobs.get(job.id);
    let done = match outcome {
        Ok(done) => done,
        Err(failed) => {
            let error = record
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("{}: {}", failed.stage, failed.message));
            spinner.finish_with_message(format!(
                "{} Job {} failed in {}",
                style("✗").red().bold(),
                job.id,
                error
            ));
            std::process::exit(1);
        }
    };

    let document = &done.document;
    spinner.finish_with_message(format!(
        "{} {} chapters from {} lines {}",
        style("✓").green().bold(),
        document.chapters.len(),
        document.line_count,
        style(format!("[{}]", format_duration(total_start.elapsed()))).dim()
    ));

    if !document.failed_chunks.is_empty() {
        let parts: Vec<String> = document
            .failed_chunks
            .iter()
            .map(|i| (i + 1).to_string())
            .collect();
        println!(
            "{} skipped part(s) {} after inference errors",
            style("!").yellow().bold(),
            parts.join(", ")
        );
    }

    println!("{}", style("─".repeat(60)).dim());
    for chapter in &document.chapters {
        print_chapter_row(chapter);
    }
    println!("{}", style("─".repeat(60)).dim());

    println!(
        "\n{} {}\n{} {}",
        style("Saved:").dim(),
        style(done.outputs.markdown.display()).cyan(),
        style("      ").dim(),
        style(done.outputs.chapters.display()).cyan()
    );
    if let Some(record) = record {
        println!(
            "{} {} {:?}\n",
            style("Job:  ").dim(),
            style(record.id).dim(),
            record.status
        );
    }

    Ok(())
}

fn print_chapter_row(chapter: &Chapter) {
    println!(
        "{:>3}  {} - {}  {} {}",
        chapter.segment_number,
        style(format_clock(chapter.segment_start_timestamp)).yellow(),
        style(format_clock(chapter.segment_end_timestamp)).yellow(),
        chapter.segment_title,
        style(format!("({} lines)", chapter.transcript.len())).dim()
    );
}

fn parse_time(input: &str) -> Result<f64> {
    if input.contains(':') {
        return Ok(parse_timestamp(input));
    }
    input
        .trim()
        .parse::<f64>()
        .with_context(|| format!("not a time: {input}"))
}

async fn run_at(chapters_path: &Path, time: &str) -> Result<()> {
    let seconds = parse_time(time)?;
    let chapters = load_chapters(chapters_path).await?;

    match chapter_at(&chapters, seconds) {
        Some(chapter) => print_chapter_row(chapter),
        None => println!(
            "{} no chapter covers {}",
            style("!").yellow().bold(),
            format_clock(seconds)
        ),
    }
    Ok(())
}

async fn run_segments(chapters_path: &Path, start: Option<u32>, end: Option<u32>) -> Result<()> {
    let chapters = load_chapters(chapters_path).await?;
    let first = start.unwrap_or(1);
    let last = end.unwrap_or(u32::MAX);

    let selected = chapters_in_range(&chapters, first, last);
    if selected.is_empty() {
        println!("{} no chapters in that range", style("!").yellow().bold());
        return Ok(());
    }
    for chapter in &selected {
        print_chapter_row(chapter);
    }
    println!(
        "{}",
        style(format!("{} of {} chapters", selected.len(), chapters.len())).dim()
    );
    Ok(())
}

fn find_chapter(chapters: Vec<Chapter>, segment_number: u32) -> Result<Chapter, LecternError> {
    chapters
        .into_iter()
        .find(|c| c.segment_number == segment_number)
        .ok_or(LecternError::ChapterNotFound { segment_number })
}

async fn run_quiz(
    settings: &Settings,
    chapters_path: &Path,
    segment: u32,
    questions: Option<u32>,
    out: Option<PathBuf>,
) -> Result<()> {
    let chapter = find_chapter(load_chapters(chapters_path).await?, segment)?;
    let questions = questions.unwrap_or(settings.quiz.questions_per_chapter);

    let client = QuizClient::new(&settings.quiz)?;
    let spinner = create_spinner(&format!(
        "Generating {questions} questions for \"{}\"...",
        chapter.segment_title
    ));
    let quiz = client.generate(&chapter, questions).await?;
    spinner.finish_with_message(format!(
        "{} Quiz {} ready",
        style("✓").green().bold(),
        style(&quiz.quiz_id).dim()
    ));

    let out = out.unwrap_or_else(|| {
        chapters_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("quiz_{segment}_{}.json", Uuid::new_v4().simple()))
    });
    fs::write(&out, serde_json::to_string_pretty(&quiz)?).await?;

    for q in &quiz.questions {
        println!(
            "\n{} {}",
            style(format!("Q{}.", q.question_number.unwrap_or_default())).cyan().bold(),
            q.question
        );
        for option in q.options.iter().flatten() {
            println!("    {}) {}", option.id, option.text);
        }
    }
    println!("\n{} {}\n", style("Saved:").dim(), style(out.display()).cyan());

    Ok(())
}

async fn run_answer(
    settings: &Settings,
    quiz_path: &Path,
    question_number: u32,
    answer: &str,
    chapters: Option<PathBuf>,
    segment: Option<u32>,
) -> Result<()> {
    let quiz: Quiz = serde_json::from_str(&fs::read_to_string(quiz_path).await?)?;
    let question = quiz.question(question_number)?;

    let transcript = match (chapters, segment) {
        (Some(path), Some(segment)) => {
            find_chapter(load_chapters(&path).await?, segment)?.transcript_text()
        }
        _ => String::new(),
    };

    let client = QuizClient::new(&settings.quiz)?;
    let verdict = client.validate(question, &transcript, answer).await?;

    let mark = if verdict.is_correct {
        style("✓ Correct").green().bold()
    } else {
        style("✗ Incorrect").red().bold()
    };
    println!("\n{mark}  {}", verdict.feedback);
    if !verdict.explanation.is_empty() {
        println!("{}", style(&verdict.explanation).dim());
    }
    if verdict.graded_locally {
        println!("{}", style("(graded locally, validation service unavailable)").dim());
    }
    println!();

    Ok(())
}
