//! Command line interface and the interactive study loop.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use vocab_core::session::{FeedbackKind, SessionEvent, SessionMode};
use vocab_core::types::{QuizType, SessionType};

use crate::ai::{GradingOracle, QuizOracle};
use crate::db::{ProfileRepository, ProgressRepository, Transactional};
use crate::session::SessionController;

#[derive(Debug, Parser)]
#[command(name = "vocab-tutor", version, about = "Spaced repetition vocabulary tutor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add one term
    Add {
        term: String,
        definition: String,
        /// Example sentence using the term
        #[arg(long)]
        context: Option<String>,
    },
    /// Import terms from a word list (T:/D:/C: blocks)
    Import { file: PathBuf },
    /// Review due terms
    Study {
        #[arg(long, value_enum, default_value_t = ModeArg::Standard)]
        mode: ModeArg,
        /// Preferred question type for AI sessions
        #[arg(long, value_enum)]
        quiz_type: Option<QuizTypeArg>,
    },
    /// Show XP and due terms, optionally changing profile settings
    Profile {
        /// Language for AI questions and feedback
        #[arg(long)]
        language: Option<String>,
        /// Default question type for AI sessions
        #[arg(long, value_enum)]
        quiz_type: Option<QuizTypeArg>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Standard,
    Ai,
}

impl From<ModeArg> for SessionType {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Standard => Self::Standard,
            ModeArg::Ai => Self::Ai,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QuizTypeArg {
    OpenEnded,
    MultipleChoice,
    FillInBlank,
}

impl From<QuizTypeArg> for QuizType {
    fn from(arg: QuizTypeArg) -> Self {
        match arg {
            QuizTypeArg::OpenEnded => Self::OpenEnded,
            QuizTypeArg::MultipleChoice => Self::MultipleChoice,
            QuizTypeArg::FillInBlank => Self::FillInBlank,
        }
    }
}

/// Line typed to leave a session early.
const QUIT: &str = ":q";
/// Line typed to abandon the session and pick another mode.
const CHANGE_MODE: &str = ":m";

/// Run one session, reading answers from `input` and printing to `output`.
///
/// Ends when the session finishes, the learner quits, or input runs out.
pub async fn run_study<S, A, R, W>(
    controller: &mut SessionController<S, A>,
    session_type: SessionType,
    preferred_quiz_type: Option<QuizType>,
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<()>
where
    S: ProgressRepository + ProfileRepository + Transactional,
    A: QuizOracle + GradingOracle,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    controller
        .dispatch(SessionEvent::Start {
            session_type,
            preferred_quiz_type,
        })
        .await?;
    writeln!(output, "({QUIT} quits, {CHANGE_MODE} changes mode)")?;

    loop {
        let state = controller.state();
        let event = match state.mode().clone() {
            SessionMode::Question => {
                let Some(item) = state.current_item() else {
                    break;
                };
                writeln!(output, "\n== {} ({} left)", item.content, state.remaining())?;
                if let Some(note) = state.note() {
                    writeln!(output, "({note})")?;
                }
                match state.pending_quiz() {
                    Some(quiz) => {
                        writeln!(output, "{}", quiz.question)?;
                        for (i, option) in quiz.options.iter().flatten().enumerate() {
                            writeln!(output, "  {}) {option}", i + 1)?;
                        }
                        write!(output, "> ")?;
                    }
                    None => write!(output, "Recall the meaning, then press Enter. ")?,
                }
                output.flush()?;

                let Some(line) = read_line(input).await? else {
                    break;
                };
                if line == QUIT {
                    break;
                }
                if line == CHANGE_MODE {
                    SessionEvent::ChangeMode
                } else {
                    let options = state.pending_quiz().and_then(|q| q.options.as_deref());
                    SessionEvent::SubmitAnswer(resolve_option(&line, options))
                }
            }

            SessionMode::Feedback(FeedbackKind::ManualGrade) => {
                if let Some(item) = state.current_item() {
                    writeln!(output, "Definition: {}", item.definition)?;
                    if let Some(context) = &item.context {
                        writeln!(output, "Example: {context}")?;
                    }
                }
                if let Some(note) = state.note() {
                    writeln!(output, "({note})")?;
                }
                let options = state.manual_grade_options();
                for (i, option) in options.iter().enumerate() {
                    write!(output, "{}) {}  ", i + 1, option.label)?;
                }
                write!(output, "\nHow well did you know it? ")?;
                output.flush()?;

                let Some(line) = read_line(input).await? else {
                    break;
                };
                if line == QUIT {
                    break;
                }
                if line == CHANGE_MODE {
                    SessionEvent::ChangeMode
                } else {
                    let choice = line
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| options.get(i))
                        .or_else(|| options.find(&line));
                    match choice {
                        Some(option) => SessionEvent::SelectGrade(option.grade),
                        None => {
                            writeln!(output, "Pick one of the numbers above.")?;
                            continue;
                        }
                    }
                }
            }

            SessionMode::Feedback(FeedbackKind::Graded) => {
                match (state.evaluation(), state.current_item()) {
                    (Some(evaluation), _) => {
                        writeln!(output, "{}", evaluation.feedback)?;
                        writeln!(output, "Ideal answer: {}", evaluation.ideal_answer)?;
                    }
                    (None, Some(item)) if state.answer().is_none() => {
                        writeln!(output, "Definition: {}", item.definition)?;
                    }
                    _ => {}
                }
                if let (Some(grade), Some(xp)) = (state.last_grade(), state.last_xp_awarded()) {
                    writeln!(output, "Grade {} / 5, +{xp} XP", grade.value())?;
                }
                write!(output, "Press Enter to continue. ")?;
                output.flush()?;

                match read_line(input).await? {
                    Some(line) if line == CHANGE_MODE => SessionEvent::ChangeMode,
                    Some(line) if line != QUIT => SessionEvent::Continue,
                    _ => break,
                }
            }

            SessionMode::Finished => {
                writeln!(
                    output,
                    "\nSession finished: {} reviewed, +{} XP.",
                    state.reviewed(),
                    state.xp_earned()
                )?;
                break;
            }

            SessionMode::Error(message) => {
                writeln!(output, "\n{message}")?;
                write!(output, "Type r to retry, {CHANGE_MODE} to change mode, or press Enter to quit. ")?;
                output.flush()?;

                match read_line(input).await? {
                    Some(line) if line.eq_ignore_ascii_case("r") => SessionEvent::Retry,
                    Some(line) if line == CHANGE_MODE => SessionEvent::ChangeMode,
                    _ => break,
                }
            }

            SessionMode::Selection => {
                write!(output, "\nMode (standard / ai): ")?;
                output.flush()?;

                let Some(line) = read_line(input).await? else {
                    break;
                };
                if line == QUIT {
                    break;
                }
                match SessionType::from_str(&line.to_ascii_lowercase()) {
                    Some(session_type) => SessionEvent::Start {
                        session_type,
                        preferred_quiz_type,
                    },
                    None => {
                        writeln!(output, "Type standard or ai.")?;
                        continue;
                    }
                }
            }

            SessionMode::Loading | SessionMode::Evaluating(_) => break,
        };

        if let Err(err) = controller.dispatch(event).await {
            tracing::debug!(error = %err, "input ignored");
        }
    }

    Ok(())
}

async fn read_line<R: AsyncBufRead + Unpin>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// A number typed for a multiple choice question selects that option's text.
fn resolve_option(line: &str, options: Option<&[String]>) -> String {
    options
        .and_then(|options| {
            line.parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i))
        })
        .cloned()
        .unwrap_or_else(|| line.to_string())
}
