use std::fmt::Write as FmtWrite;

use crate::models::{Answer, OutputFormat};
use crate::services::{IngestStats, SourceFile};

pub trait Formatter {
    fn format_answer(&self, answer: &Answer) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_ingest_stats(&self, stats: &IngestStats) -> String;
    fn format_files(&self, files: &[SourceFile]) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub api_key_set: bool,
    pub embedding_model: String,
    pub chat_model: String,
    pub vector_store_driver: String,
    pub vector_store_location: String,
    pub vector_store_connected: bool,
    pub vector_store_points: u64,
    pub collection: String,
    pub dataset_files: usize,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_answer(&self, answer: &Answer) -> String {
        let mut output = String::new();
        writeln!(output, "Answer:").unwrap();
        writeln!(output, "{}\n", answer.answer).unwrap();
        if answer.sources.is_empty() {
            writeln!(output, "Sources: (none)").unwrap();
        } else {
            writeln!(output, "Sources: {}", answer.sources_label()).unwrap();
        }
        writeln!(output, "Trust score: {}%", answer.trust_score()).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let key_status = if status.api_key_set {
            "[SET]"
        } else {
            "[MISSING]"
        };
        writeln!(output, "API Key:       {}", key_status).unwrap();
        writeln!(output, "  Embedding:   {}", status.embedding_model).unwrap();
        writeln!(output, "  Chat:        {}", status.chat_model).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(
            output,
            "Vector Store:  {} ({})",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "  Location:    {}", status.vector_store_location).unwrap();
        if status.vector_store_connected {
            writeln!(output, "  Collection:  {}", status.collection).unwrap();
            writeln!(output, "  Points:      {}", status.vector_store_points).unwrap();
        }
        writeln!(output).unwrap();
        writeln!(output, "Dataset:       {} files", status.dataset_files).unwrap();

        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "Ingestion Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Files scanned: {}", stats.files_scanned).unwrap();
        writeln!(output, "Files indexed: {}", stats.files_indexed).unwrap();
        writeln!(output, "Chunks created: {}", stats.chunks_created).unwrap();
        writeln!(output, "Chunks stored: {}", stats.chunks_stored).unwrap();
        writeln!(output, "Duration: {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_files(&self, files: &[SourceFile]) -> String {
        let mut output = String::new();
        writeln!(output, "Dry run: would ingest {} files", files.len()).unwrap();
        for file in files {
            writeln!(output, "  [{}] {}", file.lang, file.path.display()).unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, json: &serde_json::Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(json)
        } else {
            serde_json::to_string(json)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)) + "\n"
    }
}

impl Formatter for JsonFormatter {
    fn format_answer(&self, answer: &Answer) -> String {
        self.render(&serde_json::json!({
            "question": answer.question,
            "answer": answer.answer,
            "sources": answer.sources,
            "trust_score": answer.trust_score(),
        }))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        self.render(&serde_json::json!({
            "api": {
                "key_set": status.api_key_set,
                "embedding_model": status.embedding_model,
                "chat_model": status.chat_model,
            },
            "vector_store": {
                "driver": status.vector_store_driver,
                "location": status.vector_store_location,
                "connected": status.vector_store_connected,
                "collection": status.collection,
                "points": status.vector_store_points,
            },
            "dataset_files": status.dataset_files,
        }))
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        match serde_json::to_value(stats) {
            Ok(json) => self.render(&json),
            Err(e) => self.format_error(&e.to_string()),
        }
    }

    fn format_files(&self, files: &[SourceFile]) -> String {
        match serde_json::to_value(files) {
            Ok(json) => self.render(&serde_json::json!({"dry_run": true, "files": json})),
            Err(e) => self.format_error(&e.to_string()),
        }
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string() + "\n"
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string() + "\n"
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_answer(&self, answer: &Answer) -> String {
        let mut output = String::new();
        writeln!(output, "## Answer\n").unwrap();
        writeln!(output, "**Question:** {}\n", answer.question).unwrap();
        writeln!(output, "{}\n", answer.answer).unwrap();
        if !answer.sources.is_empty() {
            writeln!(output, "**Sources:**\n").unwrap();
            for source in &answer.sources {
                writeln!(output, "- `{}`", source).unwrap();
            }
            writeln!(output).unwrap();
        }
        writeln!(output, "**Trust score:** {}%", answer.trust_score()).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        let key_status = if status.api_key_set { "✅" } else { "❌" };
        writeln!(output, "### API {}\n", key_status).unwrap();
        writeln!(output, "- **Embedding:** {}", status.embedding_model).unwrap();
        writeln!(output, "- **Chat:** {}", status.chat_model).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "✅"
        } else {
            "❌"
        };
        writeln!(
            output,
            "### Vector Store ({}) {}\n",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "- **Location:** `{}`", status.vector_store_location).unwrap();
        writeln!(output, "- **Collection:** {}", status.collection).unwrap();
        writeln!(output, "- **Points:** {}", status.vector_store_points).unwrap();
        writeln!(output, "- **Dataset files:** {}", status.dataset_files).unwrap();

        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "## Ingestion Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Files scanned | {} |", stats.files_scanned).unwrap();
        writeln!(output, "| Files indexed | {} |", stats.files_indexed).unwrap();
        writeln!(output, "| Chunks created | {} |", stats.chunks_created).unwrap();
        writeln!(output, "| Chunks stored | {} |", stats.chunks_stored).unwrap();
        writeln!(output, "| Duration | {}ms |", stats.duration_ms).unwrap();
        output
    }

    fn format_files(&self, files: &[SourceFile]) -> String {
        let mut output = String::new();
        writeln!(output, "## Dry Run\n").unwrap();
        writeln!(output, "| Lang | Type | File |").unwrap();
        writeln!(output, "|------|------|------|").unwrap();
        for file in files {
            writeln!(
                output,
                "| {} | {} | `{}` |",
                file.lang,
                file.source_type,
                file.path.display()
            )
            .unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer() -> Answer {
        Answer::new(
            "How often are audits held?",
            "Quarterly.",
            vec!["quality_audit.pdf".to_string(), "plan.txt".to_string()],
        )
    }

    #[test]
    fn test_text_answer() {
        let output = TextFormatter.format_answer(&answer());
        assert!(output.contains("Quarterly."));
        assert!(output.contains("Sources: quality_audit.pdf, plan.txt"));
        assert!(output.contains("Trust score: 30%"));
    }

    #[test]
    fn test_json_answer() {
        let output = JsonFormatter::new(false).format_answer(&answer());
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["sources"][1], "plan.txt");
        assert_eq!(json["trust_score"], 30);
    }

    #[test]
    fn test_json_ingest_stats() {
        let stats = IngestStats {
            files_scanned: 2,
            chunks_stored: 5,
            ..Default::default()
        };
        let output = JsonFormatter::new(true).format_ingest_stats(&stats);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["files_scanned"], 2);
        assert_eq!(json["chunks_stored"], 5);
    }

    #[test]
    fn test_markdown_answer_lists_sources() {
        let output = MarkdownFormatter.format_answer(&answer());
        assert!(output.contains("- `quality_audit.pdf`"));
        assert!(output.contains("**Trust score:** 30%"));
    }
}
