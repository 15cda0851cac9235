//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::agent::client::create_provider;
use crate::agent::config::AgentConfig;
use crate::agent::history::SessionHistory;
use crate::agent::orchestrator::Orchestrator;
use crate::agent::prompt::PromptSet;
use crate::agent::registry::ToolRegistry;
use crate::agent::tool::{Source, Tool};
use crate::cli::output::{OutputFormat, format_answer, format_course_list};
use crate::cli::parser::{Cli, Commands};
use crate::error::{CommandError, Result};
use crate::retrieval::{CourseCatalog, DEFAULT_MAX_RESULTS, RetrievalService};
use crate::tools::{CourseOutlineTool, CourseSearchTool, course_registry};

/// Lines that end a chat session.
const CHAT_EXIT_WORDS: &[&str] = &["exit", "quit"];

// ==================== Parameter Structs ====================

/// LLM overrides shared by `ask` and `chat`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LlmParams<'a> {
    /// Provider name override.
    pub provider: Option<&'a str>,
    /// Model override.
    pub model: Option<&'a str>,
    /// Tool-round limit override.
    pub max_rounds: Option<usize>,
}

/// An answer with the sources the tools recorded for it.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Final answer text.
    pub answer: String,
    /// Citations, possibly empty.
    pub sources: Vec<Source>,
}

/// Executes the parsed CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Ask {
            query,
            provider,
            model,
            max_rounds,
            no_tools,
        } => {
            let params = LlmParams {
                provider: provider.as_deref(),
                model: model.as_deref(),
                max_rounds: *max_rounds,
            };
            cmd_ask(cli, query, params, !*no_tools, format)
        }
        Commands::Chat {
            provider,
            model,
            max_rounds,
        } => {
            let params = LlmParams {
                provider: provider.as_deref(),
                model: model.as_deref(),
                max_rounds: *max_rounds,
            };
            cmd_chat(cli, params, format)
        }
        Commands::Search {
            query,
            course,
            lesson,
        } => cmd_search(
            &cli.catalog,
            cli.max_results,
            query,
            course.as_deref(),
            *lesson,
            format,
        ),
        Commands::Outline { course } => cmd_outline(&cli.catalog, course, format),
        Commands::Courses => cmd_courses(&cli.catalog, format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

fn open_catalog(path: &Path, max_results: usize) -> Result<CourseCatalog> {
    let catalog = CourseCatalog::load(path)?.with_max_results(max_results);
    debug!(
        path = %path.display(),
        courses = catalog.courses().len(),
        chunks = catalog.chunk_count(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Whether debug tracing is on: `--verbose`, else `COURSE_RAG_DEBUG` /
/// `DEBUG`, resolved by the same builder as the agent configuration.
#[must_use]
pub fn debug_enabled(cli: &Cli) -> bool {
    let builder = if cli.verbose {
        AgentConfig::builder().debug(true)
    } else {
        AgentConfig::builder()
    };
    builder.from_env().debug_requested()
}

/// Builds agent configuration from env + CLI overrides.
fn agent_config(cli: &Cli, params: LlmParams<'_>) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder().max_results(cli.max_results);
    if let Some(provider) = params.provider {
        builder = builder.provider(provider.to_lowercase());
    }
    if let Some(model) = params.model {
        builder = builder.model(model);
    }
    if let Some(rounds) = params.max_rounds {
        builder = builder.max_tool_rounds(rounds);
    }
    builder.from_env().build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}")).into()
    })
}

/// Everything an LLM-backed command needs.
struct Session {
    orchestrator: Orchestrator,
    registry: ToolRegistry,
    config: AgentConfig,
    runtime: Runtime,
}

fn open_session(cli: &Cli, params: LlmParams<'_>) -> Result<Session> {
    let config = agent_config(cli, params)?;
    let catalog = open_catalog(&cli.catalog, config.max_results)?;
    let registry = course_registry(Arc::new(catalog))?;

    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;
    let orchestrator = Orchestrator::new(Arc::from(provider), &config);

    // Create tokio runtime as sync/async bridge
    let runtime = Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    info!(
        provider = %config.provider,
        model = %config.model,
        max_tool_rounds = config.max_tool_rounds,
        "session ready"
    );
    Ok(Session {
        orchestrator,
        registry,
        config,
        runtime,
    })
}

/// Answers one question and collects its sources, leaving the registry's
/// source slots empty for the next question.
pub fn answer_question(
    runtime: &Runtime,
    orchestrator: &Orchestrator,
    registry: &ToolRegistry,
    query: &str,
    history: Option<&str>,
    use_tools: bool,
) -> Result<Answer> {
    let definitions = registry.definitions();
    let tools = use_tools.then_some(definitions.as_slice());

    let answer = runtime
        .block_on(orchestrator.generate(query, history, tools, Some(registry)))
        .map_err(|e| CommandError::ExecutionFailed(format!("Query failed: {e}")))?;

    let sources = registry.last_sources();
    registry.reset_sources();
    Ok(Answer { answer, sources })
}

fn render_answer(answer: &Answer, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_answer(&answer.answer, &answer.sources),
        OutputFormat::Json => format.to_json(answer),
    }
}

fn cmd_ask(
    cli: &Cli,
    query: &str,
    params: LlmParams<'_>,
    use_tools: bool,
    format: OutputFormat,
) -> Result<String> {
    let session = open_session(cli, params)?;
    let answer = answer_question(
        &session.runtime,
        &session.orchestrator,
        &session.registry,
        query,
        None,
        use_tools,
    )?;

    let mut output = render_answer(&answer, format);
    if cli.verbose && format == OutputFormat::Text {
        output.push_str(&format!(
            "\n---\nProvider: {} | Model: {} | Max tool rounds: {} | Tools: {}\n",
            session.config.provider,
            session.config.model,
            session.orchestrator.max_tool_rounds(),
            if use_tools { "on" } else { "off" }
        ));
    }
    Ok(output)
}

fn cmd_chat(cli: &Cli, params: LlmParams<'_>, format: OutputFormat) -> Result<String> {
    let session = open_session(cli, params)?;
    let mut history = SessionHistory::new(session.config.max_history);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_chat(
        &session.runtime,
        &session.orchestrator,
        &session.registry,
        &mut history,
        stdin.lock(),
        &mut stdout,
        format,
    )?;
    Ok(String::new())
}

/// Reads one question per line and writes each answer as it arrives.
///
/// Blank lines are skipped; `exit` or `quit` ends the session. A failed
/// question is reported and left out of the history.
pub fn run_chat<R: BufRead, W: Write>(
    runtime: &Runtime,
    orchestrator: &Orchestrator,
    registry: &ToolRegistry,
    history: &mut SessionHistory,
    input: R,
    output: &mut W,
    format: OutputFormat,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if CHAT_EXIT_WORDS.iter().any(|w| query.eq_ignore_ascii_case(w)) {
            break;
        }

        let context = history.format();
        match answer_question(runtime, orchestrator, registry, query, context.as_deref(), true) {
            Ok(answer) => {
                match format {
                    OutputFormat::Text => writeln!(output, "{}", render_answer(&answer, format))?,
                    OutputFormat::Json => writeln!(
                        output,
                        "{}",
                        serde_json::to_string(&answer).map_err(|e| {
                            CommandError::OutputFormat(format!("JSON serialization failed: {e}"))
                        })?
                    )?,
                }
                history.add_exchange(query, answer.answer);
            }
            Err(e) => writeln!(output, "Error: {e}")?,
        }
        output.flush()?;
    }
    Ok(())
}

fn cmd_search(
    catalog_path: &Path,
    max_results: usize,
    query: &str,
    course: Option<&str>,
    lesson: Option<u32>,
    format: OutputFormat,
) -> Result<String> {
    let catalog = open_catalog(catalog_path, max_results)?;
    let tool = CourseSearchTool::new(Arc::new(catalog));
    let result = tool.run(query, course, lesson);
    let sources = tool.last_sources();

    match format {
        OutputFormat::Text => Ok(format_answer(&result, &sources)),
        OutputFormat::Json => Ok(format.to_json(&serde_json::json!({
            "query": query,
            "course": course,
            "lesson": lesson,
            "result": result,
            "sources": sources,
        }))),
    }
}

fn cmd_outline(catalog_path: &Path, course: &str, format: OutputFormat) -> Result<String> {
    let catalog = open_catalog(catalog_path, DEFAULT_MAX_RESULTS)?;
    let tool = CourseOutlineTool::new(Arc::new(catalog));
    let outline = tool.run(course);
    let sources = tool.last_sources();

    match format {
        OutputFormat::Text => Ok(outline),
        OutputFormat::Json => Ok(format.to_json(&serde_json::json!({
            "course": course,
            "outline": outline,
            "sources": sources,
        }))),
    }
}

fn cmd_courses(catalog_path: &Path, format: OutputFormat) -> Result<String> {
    let catalog = open_catalog(catalog_path, DEFAULT_MAX_RESULTS)?;
    let courses = catalog.list_course_metadata();
    match format {
        OutputFormat::Text => Ok(format_course_list(&courses)),
        OutputFormat::Json => Ok(format.to_json(&courses)),
    }
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(Path::to_path_buf)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "Prompt template already exists in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                output.push_str(&format!(
                    "  {}\n",
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown")
                ));
            }
            output.push_str("\nEdit system.md to customize the assistant's instructions.\n");
            Ok(output)
        }
        OutputFormat::Json => Ok(format.to_json(&serde_json::json!({
            "directory": target_dir.to_string_lossy(),
            "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
            "count": written.len()
        }))),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::{
        BackendPayload, ChatMessage, ChatRequest, GeneratedResponse, TokenUsage, ToolOutcome,
        tool_message,
    };
    use crate::agent::provider::LlmProvider;
    use crate::agent::tool::ToolDefinition;
    use crate::error::AgentError;
    use crate::retrieval::CatalogFile;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    /// Answers `answer <n>` and records each system prompt.
    #[derive(Default)]
    struct EchoProvider {
        calls: AtomicUsize,
        system_prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn generate(&self, request: &ChatRequest) -> std::result::Result<GeneratedResponse, AgentError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Ok(mut prompts) = self.system_prompts.lock() {
                prompts.push(request.system_prompt.clone());
            }
            let text = format!("answer {n}");
            Ok(GeneratedResponse::text(
                text.clone(),
                BackendPayload::Choice {
                    content: Some(text),
                    tool_calls: Vec::new(),
                    finish_reason: Some("stop".to_string()),
                },
                TokenUsage::default(),
            ))
        }

        fn convert_tool_definition(&self, tool: &ToolDefinition) -> Value {
            json!({"name": tool.name})
        }

        fn build_tool_result_messages(&self, outcomes: &[ToolOutcome]) -> Vec<ChatMessage> {
            outcomes
                .iter()
                .map(|o| tool_message(&o.tool_call_id, &o.content))
                .collect()
        }
    }

    fn chat_fixture() -> (Arc<EchoProvider>, Orchestrator, ToolRegistry, Runtime) {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|e| panic!("config failed: {e}"));
        let provider = Arc::new(EchoProvider::default());
        let orchestrator = Orchestrator::new(Arc::clone(&provider) as Arc<dyn LlmProvider>, &config)
            .with_prompts(PromptSet::defaults());
        let registry = course_registry(Arc::new(CourseCatalog::new(CatalogFile::default())))
            .unwrap_or_else(|e| panic!("registry failed: {e}"));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap_or_else(|e| panic!("runtime failed: {e}"));
        (provider, orchestrator, registry, runtime)
    }

    #[test]
    fn test_run_chat_threads_history() {
        let (provider, orchestrator, registry, runtime) = chat_fixture();
        let mut history = SessionHistory::new(2);
        let input = "What is MCP?\n\n  \nAnd lesson 2?\nquit\nnever asked\n".as_bytes();
        let mut output = Vec::new();

        run_chat(
            &runtime,
            &orchestrator,
            &registry,
            &mut history,
            input,
            &mut output,
            OutputFormat::Text,
        )
        .unwrap_or_else(|e| panic!("chat failed: {e}"));

        let output = String::from_utf8(output).unwrap_or_default();
        assert_eq!(output, "answer 1\n\nanswer 2\n\n");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

        let prompts = provider.system_prompts.lock().map(|p| p.clone()).unwrap_or_default();
        assert!(!prompts[0].contains("Previous conversation:"));
        assert!(prompts[1].ends_with("Previous conversation:\nUser: What is MCP?\nAssistant: answer 1"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_run_chat_json_lines() {
        let (_provider, orchestrator, registry, runtime) = chat_fixture();
        let mut history = SessionHistory::default();
        let mut output = Vec::new();

        run_chat(
            &runtime,
            &orchestrator,
            &registry,
            &mut history,
            "hello\n".as_bytes(),
            &mut output,
            OutputFormat::Json,
        )
        .unwrap_or_else(|e| panic!("chat failed: {e}"));

        let line = String::from_utf8(output).unwrap_or_default();
        let value: Value = serde_json::from_str(line.trim()).unwrap_or_else(|e| panic!("bad json: {e}"));
        assert_eq!(value["answer"], "answer 1");
        assert_eq!(value["sources"], json!([]));
    }

    #[test]
    fn test_init_prompts_writes_once() {
        let temp = TempDir::new().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let first = cmd_init_prompts(Some(temp.path()), OutputFormat::Text)
            .unwrap_or_else(|e| panic!("init-prompts failed: {e}"));
        assert!(first.contains("Wrote 1 prompt template(s)"));
        assert!(temp.path().join("system.md").exists());

        let second = cmd_init_prompts(Some(temp.path()), OutputFormat::Text)
            .unwrap_or_else(|e| panic!("init-prompts failed: {e}"));
        assert!(second.contains("already exists"));
    }

    #[test]
    fn test_missing_catalog_is_error() {
        let temp = TempDir::new().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let result = cmd_courses(&temp.path().join("absent.json"), OutputFormat::Text);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_enables_debug() {
        use clap::Parser;
        let cli = Cli::try_parse_from(["course-rag", "--verbose", "courses"])
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(debug_enabled(&cli));
    }
}
