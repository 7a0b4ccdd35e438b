//! Suggested questions command implementation

use crate::config::Config;
use crate::error::Result;
use crate::meta::{MetaDb, QaRecord};
use crate::qa::QaGenerator;
use serde::Serialize;

/// Suggested questions (and optionally key facts) for a project
#[derive(Debug, Clone, Serialize)]
pub struct QuestionsView {
    pub project: String,
    pub pairs: Vec<QaRecord>,
    pub facts: Vec<String>,
}

/// Show stored QA suggestions for a project; `with_facts` additionally
/// derives key facts from the project's documents on the fly
pub async fn cmd_questions(
    config: &Config,
    db: &MetaDb,
    project_selector: &str,
    limit: usize,
    with_facts: bool,
) -> Result<QuestionsView> {
    let project = db.resolve_project(project_selector).await?;
    let pairs = db.get_project_qa_pairs(project.id, limit).await?;

    let facts = if with_facts {
        let generator = QaGenerator::from_config(&config.qa);
        let mut facts = Vec::new();
        for doc in db.get_project_documents(project.id).await? {
            facts.extend(generator.extract_key_facts(&doc.content, 5));
            if facts.len() >= limit {
                break;
            }
        }
        facts.truncate(limit);
        facts
    } else {
        Vec::new()
    };

    Ok(QuestionsView {
        project: project.name,
        pairs,
        facts,
    })
}

/// Print suggested questions to console
pub fn print_questions(view: &QuestionsView) {
    if view.pairs.is_empty() {
        println!(
            "No suggested questions for '{}' yet. Ingest some documents first.",
            view.project
        );
    } else {
        println!("\nSuggested questions for '{}':\n", view.project);
        for pair in &view.pairs {
            println!("  Q: {}", pair.question);

            let preview: String = pair.answer.chars().take(160).collect();
            let suffix = if pair.answer.chars().count() > 160 {
                "..."
            } else {
                ""
            };
            println!("     {}{}  [{}]\n", preview.replace('\n', " "), suffix, pair.source);
        }
    }

    if !view.facts.is_empty() {
        println!("Key facts:\n");
        for fact in &view.facts {
            println!("  • {}", fact);
        }
    }
}
