//! Command-line front end for the roster core.
//!
//! # Responsibility
//! - Resolve options from flags and environment.
//! - Decode identifiers at the boundary and print results as JSON.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::GlobalOptions;
use roster_core::{
    decode_for, AccountPatch, AccountService, EntityKind, NewPerson, NewProject, NewWeeklySummary,
    Person, PersonService, Project, ProjectChanges, ProjectListQuery, ProjectService, Role,
    TechStack, WeeklySummary, WeeklySummaryService,
};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Accounts, projects, people and weekly summaries", version)]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    Person {
        #[command(subcommand)]
        action: PersonAction,
    },
    Summary {
        #[command(subcommand)]
        action: SummaryAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    Create {
        name: String,
    },
    Get {
        id: String,
    },
    List {
        #[arg(long)]
        include_deleted: bool,
    },
    Rename {
        id: String,
        name: String,
    },
    SoftDelete {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    Create {
        name: String,
        /// Owning account, numeric id or `ACC` code.
        #[arg(long)]
        account: String,
    },
    Get {
        id: String,
    },
    List {
        /// Exact, case-insensitive name filter.
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        include_deleted: bool,
    },
    /// Full update: always re-stamps and bumps the version.
    Update {
        id: String,
        #[command(flatten)]
        changes: ChangeArgs,
    },
    /// Partial update: only supplied fields change.
    Patch {
        id: String,
        #[command(flatten)]
        changes: ChangeArgs,
    },
    SoftDelete {
        id: String,
    },
    /// Detaches the project from people and summaries, then removes it.
    Delete {
        id: String,
    },
}

#[derive(clap::Args)]
struct ChangeArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    deleted: Option<bool>,
    #[arg(long)]
    account: Option<String>,
    /// Fail with a conflict unless the stored version matches.
    #[arg(long)]
    expected_version: Option<i64>,
}

#[derive(Subcommand)]
enum PersonAction {
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "employee")]
        role: Role,
        #[arg(long)]
        tech_stack: TechStack,
    },
    Get {
        id: String,
    },
    List,
    Search {
        fragment: String,
    },
    ByRole {
        role: Role,
    },
    ByProject {
        project: String,
    },
    /// Tags the person to projects (numeric ids or `PJT` codes).
    Tag {
        id: String,
        #[arg(required = true)]
        projects: Vec<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum SummaryAction {
    Create {
        #[arg(long)]
        week_start: String,
        #[arg(long)]
        week_end: String,
        #[arg(long, default_value = "")]
        summary: String,
        #[arg(long = "project")]
        projects: Vec<String>,
    },
    Get {
        id: String,
    },
    List,
    Delete {
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.options.init_logging()?;

    let mut conn = roster_core::open_db(&cli.options.db)
        .with_context(|| format!("failed to open database '{}'", cli.options.db.display()))?;
    let ctx = cli.options.actor_context();

    let output = match cli.command {
        Command::Account { action } => {
            let mut service = AccountService::new(&mut conn);
            match action {
                AccountAction::Create { name } => account_json(&service.create(&ctx, &name)?),
                AccountAction::Get { id } => account_json(&service.get(id)?),
                AccountAction::List { include_deleted } => Value::Array(
                    service
                        .list(include_deleted)?
                        .iter()
                        .map(account_json)
                        .collect(),
                ),
                AccountAction::Rename { id, name } => {
                    let patch = AccountPatch { name: Some(name) };
                    account_json(&service.update(&ctx, id, &patch)?)
                }
                AccountAction::SoftDelete { id } => account_json(&service.soft_delete(&ctx, id)?),
                AccountAction::Delete { id } => {
                    service.hard_delete(id.as_str())?;
                    json!({ "deleted": id })
                }
            }
        }
        Command::Project { action } => {
            let mut service = ProjectService::new(&mut conn);
            match action {
                ProjectAction::Create { name, account } => {
                    let new = NewProject {
                        name,
                        account_id: decode_for(EntityKind::Account, account)?,
                    };
                    project_json(&service.create(&ctx, &new)?)
                }
                ProjectAction::Get { id } => project_json(&service.get(id)?),
                ProjectAction::List {
                    name,
                    include_deleted,
                } => {
                    let query = ProjectListQuery {
                        name,
                        include_deleted,
                    };
                    Value::Array(service.list(&query)?.iter().map(project_json).collect())
                }
                ProjectAction::Update { id, changes } => {
                    project_json(&service.update(&ctx, id, &changes.into_changes()?)?)
                }
                ProjectAction::Patch { id, changes } => {
                    project_json(&service.partial_update(&ctx, id, &changes.into_changes()?)?)
                }
                ProjectAction::SoftDelete { id } => project_json(&service.soft_delete(&ctx, id)?),
                ProjectAction::Delete { id } => {
                    service.hard_delete(id.as_str())?;
                    json!({ "deleted": id })
                }
            }
        }
        Command::Person { action } => {
            let mut service = PersonService::new(&mut conn);
            match action {
                PersonAction::Create {
                    first_name,
                    last_name,
                    email,
                    role,
                    tech_stack,
                } => {
                    let new = NewPerson {
                        first_name,
                        last_name,
                        email,
                        role,
                        tech_stack,
                    };
                    person_json(&service.create(&ctx, &new)?)
                }
                PersonAction::Get { id } => person_json(&service.get(id)?),
                PersonAction::List => people_json(&service.list()?),
                PersonAction::Search { fragment } => {
                    people_json(&service.search_by_name(&fragment)?)
                }
                PersonAction::ByRole { role } => people_json(&service.list_by_role(role)?),
                PersonAction::ByProject { project } => {
                    people_json(&service.list_by_project(project)?)
                }
                PersonAction::Tag { id, projects } => {
                    let project_ids = decode_all(EntityKind::Project, projects)?;
                    person_json(&service.tag_projects(&ctx, id, &project_ids)?)
                }
                PersonAction::Delete { id } => {
                    service.hard_delete(id.as_str())?;
                    json!({ "deleted": id })
                }
            }
        }
        Command::Summary { action } => {
            let mut service = WeeklySummaryService::new(&mut conn);
            match action {
                SummaryAction::Create {
                    week_start,
                    week_end,
                    summary,
                    projects,
                } => {
                    let new = NewWeeklySummary {
                        week_start,
                        week_end,
                        summary,
                        project_ids: decode_all(EntityKind::Project, projects)?,
                    };
                    summary_json(&service.create(&ctx, &new)?)
                }
                SummaryAction::Get { id } => summary_json(&service.get(id)?),
                SummaryAction::List => {
                    Value::Array(service.list()?.iter().map(summary_json).collect())
                }
                SummaryAction::Delete { id } => {
                    service.hard_delete(id.as_str())?;
                    json!({ "deleted": id })
                }
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

impl ChangeArgs {
    fn into_changes(self) -> Result<ProjectChanges> {
        let account_id = self
            .account
            .map(|raw| decode_for(EntityKind::Account, raw))
            .transpose()?;
        Ok(ProjectChanges {
            name: self.name,
            is_deleted: self.deleted,
            account_id,
            expected_version: self.expected_version,
        })
    }
}

fn decode_all(kind: EntityKind, raw: Vec<String>) -> Result<Vec<i64>> {
    raw.into_iter()
        .map(|value| decode_for(kind, value).map_err(anyhow::Error::from))
        .collect()
}

fn with_code(mut value: Value, code: String) -> Value {
    if let Value::Object(map) = &mut value {
        map.insert("code".to_string(), Value::String(code));
    }
    value
}

fn account_json(account: &roster_core::Account) -> Value {
    with_code(json!(account), account.code())
}

fn project_json(project: &Project) -> Value {
    with_code(json!(project), project.code())
}

fn person_json(person: &Person) -> Value {
    with_code(json!(person), person.code())
}

fn people_json(people: &[Person]) -> Value {
    Value::Array(people.iter().map(person_json).collect())
}

fn summary_json(summary: &WeeklySummary) -> Value {
    with_code(json!(summary), summary.code())
}
