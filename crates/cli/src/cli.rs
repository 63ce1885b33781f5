use std::path::PathBuf;

use clap::{value_parser, Args, Parser, Subcommand};

use crate::core::OffsetUnit;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "homekeep",
    version,
    about = "Shared household chores, groceries and personal to-dos.",
    after_help = "Examples:\n  homekeep --user ana home create Casa\n  homekeep task add --area kitchen Descale kettle --in 2 --unit weeks\n  homekeep task list --mine\n  homekeep grocery add Oat milk"
)]
pub struct Cli {
    /// Override the data directory (defaults to platform-specific app dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// User id to act as
    #[arg(long, value_name = "UID", env = "HOMEKEEP_USER", global = true)]
    pub user: Option<String>,

    /// Email recorded the first time a user signs in
    #[arg(long, value_name = "EMAIL", env = "HOMEKEEP_EMAIL", global = true)]
    pub email: Option<String>,

    /// Tracing filter written to stderr (e.g. "info", "homekeep_core=debug")
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Create, join, leave or inspect your home
    #[command(subcommand)]
    Home(HomeCommand),
    /// List areas or choose which ones show on the overview
    #[command(subcommand)]
    Area(AreaCommand),
    /// Manage area tasks (--area) or your own tasks (--mine)
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage the shared grocery list
    #[command(subcommand)]
    Grocery(ChecklistCommand),
    /// Manage your personal wishlist
    #[command(subcommand)]
    Wish(ChecklistCommand),
    /// Show or update your profile
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum HomeCommand {
    /// Create a new home and join it
    Create {
        #[arg(value_name = "NAME", required = true)]
        name: Vec<String>,
    },
    /// Join an existing home with its six-character code
    Join {
        #[arg(value_name = "CODE")]
        code: String,
    },
    /// Leave your current home
    Leave,
    /// Show your home, its members and join code
    Show,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AreaCommand {
    /// List known areas and the progress of selected ones
    List,
    /// Select or deselect an area
    Toggle {
        #[arg(value_name = "AREA", required = true)]
        area: Vec<String>,
    },
}

/// Which task list a command operates on.
#[derive(Args, Debug, Clone, Default)]
#[group(required = true, multiple = false)]
pub struct TaskScope {
    /// Area of the shared home (e.g. kitchen, "living room")
    #[arg(long, value_name = "AREA")]
    pub area: Option<String>,

    /// Your personal task list
    #[arg(long)]
    pub mine: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    /// List tasks with their progress
    List {
        #[command(flatten)]
        scope: TaskScope,
    },
    /// Add a task
    Add(AddTaskArgs),
    /// Mark a task done, or reopen it
    Toggle {
        #[command(flatten)]
        scope: TaskScope,
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Change a task's name, details or deadline
    Edit(EditTaskArgs),
    /// Delete a task
    Delete {
        #[command(flatten)]
        scope: TaskScope,
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DeadlineArgs {
    /// Deadline offset from today (default 3 when --unit or --at is given)
    #[arg(long = "in", value_name = "N", value_parser = value_parser!(u32))]
    pub amount: Option<u32>,

    /// Offset unit (days, weeks, months)
    #[arg(long, value_enum)]
    pub unit: Option<OffsetUnit>,

    /// Local time of day the task is due (HH:MM, default 09:00)
    #[arg(long = "at", value_name = "HH:MM")]
    pub time: Option<String>,
}

impl DeadlineArgs {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.unit.is_none() && self.time.is_none()
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddTaskArgs {
    #[command(flatten)]
    pub scope: TaskScope,

    /// Task name
    #[arg(value_name = "NAME", required = true)]
    pub name: Vec<String>,

    /// Optional notes
    #[arg(long)]
    pub details: Option<String>,

    #[command(flatten)]
    pub deadline: DeadlineArgs,

    /// Create the task without a deadline
    #[arg(long, conflicts_with_all = ["amount", "unit", "time"])]
    pub no_deadline: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EditTaskArgs {
    #[command(flatten)]
    pub scope: TaskScope,

    #[arg(value_name = "ID")]
    pub id: String,

    /// Replacement name
    #[arg(long)]
    pub name: Option<String>,

    /// Replacement notes (pass "" to clear)
    #[arg(long)]
    pub details: Option<String>,

    #[command(flatten)]
    pub deadline: DeadlineArgs,

    /// Remove the deadline
    #[arg(long, conflicts_with_all = ["amount", "unit", "time"])]
    pub clear_deadline: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ChecklistCommand {
    /// List entries
    List,
    /// Add an entry
    Add {
        #[arg(value_name = "NAME", required = true)]
        name: Vec<String>,
    },
    /// Check or uncheck an entry
    Toggle {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Rename an entry
    Rename {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "NAME", required = true)]
        name: Vec<String>,
    },
    /// Delete an entry
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// Show your profile and personal totals
    Show,
    /// Store the URL of an uploaded profile picture
    Image {
        #[arg(value_name = "URL")]
        url: String,
    },
}
