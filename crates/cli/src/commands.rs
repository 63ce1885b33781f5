use std::io::Write;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, Utc};

use crate::cli::{
    AreaCommand, ChecklistCommand, CliCommand, DeadlineArgs, HomeCommand, ProfileCommand,
    TaskCommand, TaskScope,
};
use crate::core::progress::{CollectionSummary, TaskView};
use crate::core::services::{Applied, HomeWorkspace, PersonalWorkspace};
use crate::core::{
    normalize_area, AppState, ChecklistItem, Clock, DeadlineInput, Task, TaskDraft, TaskEdit,
    ValidationError, DEFAULT_AREAS,
};

pub fn execute<W: Write>(state: &mut AppState, command: CliCommand, mut writer: W) -> Result<()> {
    tracing::debug!(?command, uid = ?state.session().uid(), "executing command");
    match command {
        CliCommand::Home(command) => handle_home(state, command, &mut writer),
        CliCommand::Area(command) => handle_area(state, command, &mut writer),
        CliCommand::Task(command) => handle_task(state, command, &mut writer),
        CliCommand::Grocery(command) => {
            let mut list = Checklist::Groceries(state.home_workspace()?);
            handle_checklist(&mut list, command, &mut writer)
        }
        CliCommand::Wish(command) => {
            let mut list = Checklist::Wishlist(state.personal_workspace()?);
            handle_checklist(&mut list, command, &mut writer)
        }
        CliCommand::Profile(command) => handle_profile(state, command, &mut writer),
    }
}

fn handle_home<W: Write>(state: &mut AppState, command: HomeCommand, mut writer: W) -> Result<()> {
    match command {
        HomeCommand::Create { name } => {
            state.create_home(&name.join(" "))?;
            let workspace = state.home_workspace()?;
            let home = workspace.home();
            writeln!(
                writer,
                "Created home '{}' (join code {})",
                home.name, home.join_code
            )?;
        }
        HomeCommand::Join { code } => match state.join_home(&code)? {
            Some(_) => {
                let workspace = state.home_workspace()?;
                writeln!(writer, "Joined home '{}'", workspace.home().name)?;
            }
            None => writeln!(writer, "No home found for code {}", code.trim().to_uppercase())?,
        },
        HomeCommand::Leave => {
            let outcome = state.leave_home()?;
            if outcome.home_deleted {
                writeln!(writer, "Left home; it had no other members and was deleted")?;
            } else {
                writeln!(writer, "Left home")?;
            }
        }
        HomeCommand::Show => {
            let workspace = state.home_workspace()?;
            let home = workspace.home();
            writeln!(writer, "{} (join code {})", home.name, home.join_code)?;
            writeln!(writer, "Members: {}", home.members.join(", "))?;
            if home.selected_areas.is_empty() {
                writeln!(writer, "Areas: none selected")?;
            } else {
                writeln!(writer, "Areas: {}", home.selected_areas.join(", "))?;
            }
            let bought = home.groceries.iter().filter(|item| item.checked).count();
            writeln!(
                writer,
                "Groceries: {} ({} checked)",
                home.groceries.len(),
                bought
            )?;
        }
    }
    Ok(())
}

fn handle_area<W: Write>(state: &mut AppState, command: AreaCommand, mut writer: W) -> Result<()> {
    let mut workspace = state.home_workspace()?;
    match command {
        AreaCommand::List => {
            let summaries = workspace.area_summaries();
            let mut areas: Vec<String> = DEFAULT_AREAS.iter().map(|area| area.to_string()).collect();
            for area in workspace.home().todos.keys().chain(&workspace.home().selected_areas) {
                if !areas.contains(area) {
                    areas.push(area.clone());
                }
            }

            for area in areas {
                match summaries.iter().find(|summary| summary.area == area) {
                    Some(selected) => writeln!(
                        writer,
                        "[x] {}  {}",
                        area,
                        describe_summary(&selected.summary)
                    )?,
                    None => writeln!(writer, "[ ] {}", area)?,
                }
            }
        }
        AreaCommand::Toggle { area } => {
            let area = normalize_area(&area.join(" "))?;
            let applied = workspace.toggle_area(&area)?;
            let verb = if workspace.home().is_selected(&area) {
                "Selected"
            } else {
                "Deselected"
            };
            write_applied(&mut writer, applied, &format!("{verb} area '{area}'"))?;
        }
    }
    Ok(())
}

fn handle_task<W: Write>(state: &mut AppState, command: TaskCommand, mut writer: W) -> Result<()> {
    match command {
        TaskCommand::List { scope } => {
            let list = TaskList::open(state, &scope)?;
            let views = list.views();
            if views.is_empty() {
                writeln!(writer, "No tasks in {}", list.label())?;
                return Ok(());
            }
            let summary = list.summary(state.clock().now());
            writeln!(writer, "{}: {}", list.label(), describe_summary(&summary))?;
            for view in views {
                writeln!(writer, "{}", describe_task(&view))?;
            }
        }
        TaskCommand::Add(args) => {
            let deadline = if args.no_deadline {
                None
            } else {
                Some(resolve_deadline(&args.deadline, state.clock())?)
            };
            let draft = TaskDraft::new(args.name.join(" "))
                .details(args.details.unwrap_or_default())
                .deadline(deadline);

            let mut list = TaskList::open(state, &args.scope)?;
            let (task, applied) = list.add(&draft)?;
            let mut message = format!("Added task {} to {}: {}", task.id, list.label(), task.name);
            if let Some(deadline) = task.deadline {
                message.push_str(&format!(" (due {})", format_local(deadline)));
            }
            write_applied(&mut writer, applied, &message)?;
        }
        TaskCommand::Toggle { scope, id } => {
            let mut list = TaskList::open(state, &scope)?;
            let Some(task) = list.find(&id) else {
                return write_missing(&mut writer, "task", &id);
            };
            let verb = if task.checked { "Reopened" } else { "Completed" };
            let message = format!("{verb} '{}'", task.name);
            let applied = list.toggle(&id)?;
            write_applied(&mut writer, applied, &message)?;
        }
        TaskCommand::Edit(args) => {
            let deadline = if args.clear_deadline {
                Some(None)
            } else if args.deadline.is_empty() {
                None
            } else {
                Some(Some(resolve_deadline(&args.deadline, state.clock())?))
            };
            let edit = TaskEdit {
                name: args.name,
                details: args.details,
                deadline,
            };
            if edit.is_empty() {
                return Err(anyhow!(
                    "Nothing to change. Pass --name, --details, a deadline or --clear-deadline."
                ));
            }

            let mut list = TaskList::open(state, &args.scope)?;
            if list.find(&args.id).is_none() {
                return write_missing(&mut writer, "task", &args.id);
            }
            let applied = list.edit(&args.id, &edit)?;
            write_applied(&mut writer, applied, &format!("Updated task {}", args.id))?;
        }
        TaskCommand::Delete { scope, id } => {
            let mut list = TaskList::open(state, &scope)?;
            let Some(task) = list.find(&id) else {
                return write_missing(&mut writer, "task", &id);
            };
            let message = format!("Deleted '{}'", task.name);
            let applied = list.delete(&id)?;
            write_applied(&mut writer, applied, &message)?;
        }
    }
    Ok(())
}

fn handle_checklist<W: Write>(
    list: &mut Checklist,
    command: ChecklistCommand,
    mut writer: W,
) -> Result<()> {
    match command {
        ChecklistCommand::List => {
            let items = list.items();
            if items.is_empty() {
                writeln!(writer, "{} is empty", list.label())?;
            }
            for item in items {
                let mark = if item.checked { 'x' } else { ' ' };
                writeln!(writer, "[{}] {}  {}", mark, item.id, item.name)?;
            }
        }
        ChecklistCommand::Add { name } => {
            let (item, applied) = list.add(&name.join(" "))?;
            let message = format!("Added {} to {}: {}", item.id, list.label(), item.name);
            write_applied(&mut writer, applied, &message)?;
        }
        ChecklistCommand::Toggle { id } => {
            let Some(item) = list.find(&id) else {
                return write_missing(&mut writer, "entry", &id);
            };
            let verb = if item.checked { "Unchecked" } else { "Checked" };
            let message = format!("{verb} '{}'", item.name);
            let applied = list.toggle(&id);
            write_applied(&mut writer, applied, &message)?;
        }
        ChecklistCommand::Rename { id, name } => {
            if list.find(&id).is_none() {
                return write_missing(&mut writer, "entry", &id);
            }
            let name = name.join(" ");
            let applied = list.rename(&id, &name)?;
            write_applied(&mut writer, applied, &format!("Renamed {} to '{}'", id, name.trim()))?;
        }
        ChecklistCommand::Delete { id } => {
            let Some(item) = list.find(&id) else {
                return write_missing(&mut writer, "entry", &id);
            };
            let message = format!("Deleted '{}'", item.name);
            let applied = list.delete(&id);
            write_applied(&mut writer, applied, &message)?;
        }
    }
    Ok(())
}

fn handle_profile<W: Write>(
    state: &mut AppState,
    command: ProfileCommand,
    mut writer: W,
) -> Result<()> {
    let mut workspace = state.personal_workspace()?;
    match command {
        ProfileCommand::Show => {
            let profile = workspace.profile();
            writeln!(writer, "{} <{}>", profile.name, profile.email)?;
            match &profile.home_id {
                Some(home_id) => writeln!(writer, "Home: {}", home_id)?,
                None => writeln!(writer, "Home: none")?,
            }
            if let Some(image) = &profile.profile_image {
                writeln!(writer, "Image: {}", image)?;
            }
            writeln!(
                writer,
                "My tasks: {}",
                describe_summary(&workspace.my_tasks_summary())
            )?;
            writeln!(writer, "Wishlist: {} items", profile.wishlist.len())?;
        }
        ProfileCommand::Image { url } => {
            if url.trim().is_empty() {
                return Err(anyhow!("Image URL cannot be empty"));
            }
            let applied = workspace.set_profile_image(&url);
            write_applied(&mut writer, applied, "Updated profile image")?;
        }
    }
    Ok(())
}

/// Either an area of the shared home or the user's own task list.
enum TaskList {
    Area {
        workspace: HomeWorkspace,
        area: String,
    },
    Mine(PersonalWorkspace),
}

impl TaskList {
    fn open(state: &AppState, scope: &TaskScope) -> Result<Self> {
        match &scope.area {
            Some(area) => Ok(TaskList::Area {
                area: normalize_area(area)?,
                workspace: state.home_workspace()?,
            }),
            None => Ok(TaskList::Mine(state.personal_workspace()?)),
        }
    }

    fn label(&self) -> String {
        match self {
            TaskList::Area { area, .. } => area.clone(),
            TaskList::Mine(_) => "my tasks".to_string(),
        }
    }

    fn tasks(&self) -> &[Task] {
        match self {
            TaskList::Area { workspace, area } => workspace.tasks(area),
            TaskList::Mine(workspace) => workspace.tasks(),
        }
    }

    fn find(&self, id: &str) -> Option<Task> {
        self.tasks().iter().find(|task| task.id == id).cloned()
    }

    fn views(&self) -> Vec<TaskView> {
        match self {
            TaskList::Area { workspace, area } => workspace.task_views(area),
            TaskList::Mine(workspace) => workspace.task_views(),
        }
    }

    fn summary(&self, now: DateTime<Utc>) -> CollectionSummary {
        match self {
            TaskList::Area { workspace, area } => CollectionSummary::of(workspace.tasks(area), now),
            TaskList::Mine(workspace) => workspace.my_tasks_summary(),
        }
    }

    fn add(&mut self, draft: &TaskDraft) -> Result<(Task, Applied), ValidationError> {
        match self {
            TaskList::Area { workspace, area } => workspace.add_task(area, draft),
            TaskList::Mine(workspace) => workspace.add_task(draft),
        }
    }

    fn toggle(&mut self, id: &str) -> Result<Applied, ValidationError> {
        match self {
            TaskList::Area { workspace, area } => workspace.toggle_task(area, id),
            TaskList::Mine(workspace) => Ok(workspace.toggle_task(id)),
        }
    }

    fn edit(&mut self, id: &str, edit: &TaskEdit) -> Result<Applied, ValidationError> {
        match self {
            TaskList::Area { workspace, area } => workspace.edit_task(area, id, edit),
            TaskList::Mine(workspace) => workspace.edit_task(id, edit),
        }
    }

    fn delete(&mut self, id: &str) -> Result<Applied, ValidationError> {
        match self {
            TaskList::Area { workspace, area } => workspace.delete_task(area, id),
            TaskList::Mine(workspace) => Ok(workspace.delete_task(id)),
        }
    }
}

enum Checklist {
    Groceries(HomeWorkspace),
    Wishlist(PersonalWorkspace),
}

impl Checklist {
    fn label(&self) -> &'static str {
        match self {
            Checklist::Groceries(_) => "groceries",
            Checklist::Wishlist(_) => "wishlist",
        }
    }

    fn items(&self) -> &[ChecklistItem] {
        match self {
            Checklist::Groceries(workspace) => workspace.groceries(),
            Checklist::Wishlist(workspace) => workspace.wishlist(),
        }
    }

    fn find(&self, id: &str) -> Option<ChecklistItem> {
        self.items().iter().find(|item| item.id == id).cloned()
    }

    fn add(&mut self, name: &str) -> Result<(ChecklistItem, Applied), ValidationError> {
        match self {
            Checklist::Groceries(workspace) => workspace.add_grocery(name),
            Checklist::Wishlist(workspace) => workspace.add_wish(name),
        }
    }

    fn toggle(&mut self, id: &str) -> Applied {
        match self {
            Checklist::Groceries(workspace) => workspace.toggle_grocery(id),
            Checklist::Wishlist(workspace) => workspace.toggle_wish(id),
        }
    }

    fn rename(&mut self, id: &str, name: &str) -> Result<Applied, ValidationError> {
        match self {
            Checklist::Groceries(workspace) => workspace.rename_grocery(id, name),
            Checklist::Wishlist(workspace) => workspace.rename_wish(id, name),
        }
    }

    fn delete(&mut self, id: &str) -> Applied {
        match self {
            Checklist::Groceries(workspace) => workspace.delete_grocery(id),
            Checklist::Wishlist(workspace) => workspace.delete_wish(id),
        }
    }
}

/// Unset flags fall back to the default of 3 days at 09:00.
fn resolve_deadline(args: &DeadlineArgs, clock: &dyn Clock) -> Result<DateTime<Utc>> {
    let mut input = DeadlineInput::default();
    if let Some(amount) = args.amount {
        input.amount = amount;
    }
    if let Some(unit) = args.unit {
        input.unit = unit;
    }
    if let Some(time) = &args.time {
        input.time = time.parse()?;
    }
    Ok(input.resolve_local(clock)?)
}

fn format_local(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn describe_summary(summary: &CollectionSummary) -> String {
    let overdue = if summary.overdue { ", overdue" } else { "" };
    format!(
        "{} of {} pending, {}% of time used ({}{})",
        summary.pending, summary.total, summary.percent, summary.health, overdue
    )
}

fn describe_task(view: &TaskView) -> String {
    let task = &view.task;
    let mark = if task.checked { 'x' } else { ' ' };
    let mut line = format!("[{}] {}  {}", mark, task.id, task.name);
    if let Some(deadline) = task.deadline {
        line.push_str(&format!("  due {}", format_local(deadline)));
    }
    if !task.checked {
        line.push_str(&format!("  {}% {}", view.percent, view.health));
        if view.overdue {
            line.push_str("  OVERDUE");
        }
    }
    if !task.details.is_empty() {
        line.push_str(&format!("\n      {}", task.details));
    }
    line
}

fn write_applied<W: Write>(mut writer: W, applied: Applied, message: &str) -> Result<()> {
    match applied {
        Applied::Unchanged => writeln!(writer, "No changes")?,
        Applied::Persisted => writeln!(writer, "{}", message)?,
        Applied::LocalOnly => writeln!(writer, "{} ({})", message, applied)?,
    }
    Ok(())
}

fn write_missing<W: Write>(mut writer: W, kind: &str, id: &str) -> Result<()> {
    writeln!(writer, "No {} with id {}", kind, id)?;
    Ok(())
}
