use facegate::{
    evaluate, AnalyzerClient, ApiClient, AttendanceStatus, CancelToken, CaptureSession, Config,
    FaceAnalyzer, Mode, SessionOutcome, TickFeedback,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{cursor, terminal};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "facegate")]
#[command(about = "Face capture and check-in for classroom attendance")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "configs/facegate.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a face and store its embedding for a student
    Register {
        #[arg(short, long)]
        student_id: String,
    },
    /// Identify a student within a group and record attendance
    Verify {
        #[arg(short, long)]
        group_id: String,
    },
    /// Remove a student's stored face embedding
    DeleteFace {
        #[arg(short, long)]
        student_id: String,
    },
    /// Probe the analyzer and report detection quality
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = Config::load_from_path(&cli.config)?;

    match cli.command {
        Commands::Register { student_id } => {
            println!("Registering face for student {}", student_id);
            run_session(&config, Mode::Register { student_id })?;
        }
        Commands::Verify { group_id } => {
            println!("Verifying attendance for group {}", group_id);
            run_session(&config, Mode::Verify { group_id })?;
        }
        Commands::DeleteFace { student_id } => {
            let api = ApiClient::from_config(&config.api)?;
            api.delete_face(&student_id)?;
            println!("✅ Face record removed for student {}", student_id);
        }
        Commands::Check => {
            check_analyzer(&config)?;
        }
    }

    Ok(())
}

fn run_session(config: &Config, mode: Mode) -> Result<()> {
    let api = ApiClient::from_config(&config.api)?;
    let mut analyzer = AnalyzerClient::new(&config.analyzer)?;
    let mut session = CaptureSession::new(&api, mode, config);
    let token = CancelToken::new();

    println!("Look at the camera...");
    let outcome = session.run(&mut analyzer, &token, draw_status_line)?;
    println!();

    match outcome {
        SessionOutcome::Registered => {
            println!("✅ Face registered. The student can now check in by camera.");
        }
        SessionOutcome::Recognized {
            student,
            attendance,
        } => {
            println!(
                "✅ Recognized: {} (grade {}, group {})",
                student.full_name(),
                student.grade,
                student.group
            );
            match attendance {
                AttendanceStatus::Registered => println!("   Attendance recorded."),
                AttendanceStatus::Rejected => {
                    println!("⚠️  The server did not record attendance for this student.");
                }
                AttendanceStatus::Failed => {
                    println!("⚠️  Attendance registration failed; record it manually.");
                }
            }
        }
        SessionOutcome::NotRecognized => {
            println!("✗ No matching student in this group. Run the command again to retry.");
        }
        SessionOutcome::Failed(reason) => {
            println!("❌ Submission failed: {}", reason);
        }
        SessionOutcome::Cancelled => {
            println!("Capture cancelled.");
        }
        SessionOutcome::TimedOut => {
            println!("✗ No acceptable detection before the timeout. Check lighting and distance, then retry.");
        }
    }

    Ok(())
}

// Redraws one status line in place while the session scans.
fn draw_status_line(feedback: &TickFeedback) {
    let mut out = io::stdout();
    crossterm::execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(terminal::ClearType::CurrentLine)
    )
    .ok();

    if feedback.score > 0.0 {
        print!(
            "Score: {:>5.1}%  Face: {:.0}x{:.0}px  {}",
            feedback.score * 100.0,
            feedback.face_width,
            feedback.face_height,
            feedback.verdict
        );
    } else {
        print!("{}", feedback.verdict);
    }
    out.flush().ok();
}

fn check_analyzer(config: &Config) -> Result<()> {
    println!("Probing analyzer at {}...", config.analyzer.base_url);

    let mut analyzer = AnalyzerClient::new(&config.analyzer)?;
    analyzer.start()?;
    let detection = analyzer.detect();
    analyzer.stop();

    let detection = detection?;
    match &detection {
        Some(d) => println!(
            "Detection: score {:.3}, face {:.0}x{:.0}px",
            d.score, d.bounding_box.width, d.bounding_box.height
        ),
        None => println!("No face in the current frame."),
    }

    let verdict = evaluate(detection.as_ref(), &config.quality);
    println!("Verdict: {}", verdict);
    for hint in verdict.hints() {
        println!("  - {}", hint);
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }
}
