//! Project management commands

use crate::error::Result;
use crate::meta::{MetaDb, Project, ProjectSummary};

/// Create a new project
pub async fn cmd_create_project(db: &MetaDb, name: &str, description: &str) -> Result<Project> {
    let id = db.create_project(name, description).await?;
    let project = db
        .get_project(id)
        .await?
        .ok_or_else(|| crate::error::Error::ProjectNotFound(name.to_string()))?;
    Ok(project)
}

/// List all projects with document counts
pub async fn cmd_list_projects(db: &MetaDb) -> Result<Vec<ProjectSummary>> {
    db.list_projects().await
}

/// Remove a project and everything it owns
pub async fn cmd_remove_project(db: &MetaDb, selector: &str) -> Result<Project> {
    let project = db.resolve_project(selector).await?;
    db.delete_project(project.id).await?;
    Ok(project)
}

/// Print projects to console
pub fn print_projects(projects: &[ProjectSummary]) {
    if projects.is_empty() {
        println!("No projects yet. Create one with 'curator project add <name>'");
        return;
    }

    println!("\n{} project(s):\n", projects.len());
    for project in projects {
        println!(
            "  [{}] {} ({} doc{})",
            project.id,
            project.name,
            project.doc_count,
            if project.doc_count == 1 { "" } else { "s" }
        );
        if !project.description.is_empty() {
            println!("      {}", project.description);
        }
    }
}
