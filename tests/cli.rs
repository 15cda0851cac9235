//! Integration tests for the offline CLI commands.

#![allow(clippy::panic)]

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/catalog.json")
}

fn course_rag() -> Command {
    let mut cmd = Command::cargo_bin("course-rag").unwrap_or_else(|e| panic!("binary: {e}"));
    cmd.env_remove("COURSE_RAG_CATALOG")
        .env_remove("COURSE_RAG_MAX_RESULTS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_courses_lists_catalog() {
    course_rag()
        .arg("--catalog")
        .arg(fixture())
        .arg("courses")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 course(s):"))
        .stdout(predicate::str::contains(
            "MCP: Build Rich-Context AI Apps with Anthropic (3 lessons) - Elie Schoppik",
        ));
}

#[test]
fn test_outline_partial_name() {
    course_rag()
        .arg("--catalog")
        .arg(fixture())
        .args(["outline", "mcp"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Course: MCP: Build Rich-Context AI Apps with Anthropic\n\
             Course Link: https://learn.example.com/mcp\n\
             Instructor: Elie Schoppik\n\
             Total Lessons: 3\n",
        ))
        .stdout(predicate::str::contains(
            "  Lesson 1: Why MCP\n    Link: https://learn.example.com/mcp/1\n",
        ))
        .stdout(predicate::str::contains("  Lesson 2: MCP Architecture\n"));
}

#[test]
fn test_outline_without_lessons() {
    course_rag()
        .arg("--catalog")
        .arg(fixture())
        .args(["outline", "Chroma"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Lessons: 0"))
        .stdout(predicate::str::contains("  (No lesson details available)"));
}

#[test]
fn test_outline_unknown_course() {
    course_rag()
        .arg("--catalog")
        .arg(fixture())
        .args(["outline", "Quantum Knitting"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Course not found: 'Quantum Knitting'. Please check the course name.",
        ));
}

#[test]
fn test_search_scoped_to_lesson() {
    course_rag()
        .arg("--catalog")
        .arg(fixture())
        .args(["search", "clients", "--course", "MCP", "--lesson", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "[MCP: Build Rich-Context AI Apps with Anthropic - Lesson 1]\n\
             Clients connect to servers",
        ))
        .stdout(predicate::str::contains(
            "Sources:\n  - MCP: Build Rich-Context AI Apps with Anthropic - Lesson 1 (https://learn.example.com/mcp/1)",
        ))
        .stdout(predicate::str::contains("Lesson 2").not());
}

#[test]
fn test_search_falls_back_to_all_courses() {
    course_rag()
        .arg("--catalog")
        .arg(fixture())
        .args(["search", "retrieval recall", "--course", "Quantum Knitting"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "[Searched all courses since 'Quantum Knitting' wasn't found]\n\n\
             [Advanced Retrieval for AI with Chroma]\n",
        ));
}

#[test]
fn test_search_json_output() {
    course_rag()
        .arg("--catalog")
        .arg(fixture())
        .args(["--format", "json", "search", "nothing matches zzz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"result\": \"No relevant content found.\""))
        .stdout(predicate::str::contains("\"sources\": []"));
}

#[test]
fn test_missing_catalog_fails() {
    let temp = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    course_rag()
        .arg("--catalog")
        .arg(temp.path().join("absent.json"))
        .arg("courses")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read catalog"));
}

#[test]
fn test_init_prompts_writes_template() {
    let temp = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    course_rag()
        .arg("init-prompts")
        .arg("--dir")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("system.md"));
    assert!(temp.path().join("system.md").exists());

    course_rag()
        .arg("init-prompts")
        .arg("--dir")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_ask_without_api_key_fails() {
    course_rag()
        .arg("--catalog")
        .arg(fixture())
        .args(["ask", "What is MCP?", "--provider", "groq"])
        .env_remove("COURSE_RAG_API_KEY")
        .env_remove("GROQ_API_KEY")
        .env_remove("COURSE_RAG_PROVIDER")
        .env_remove("LLM_PROVIDER")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no API key configured for provider 'groq'"));
}
