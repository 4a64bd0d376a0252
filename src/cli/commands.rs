use std::path::PathBuf;

use clap::{Parser, Subcommand};

const VERSION: &str = env!("WORKPILOT_VERSION");

#[derive(Parser)]
#[command(
    name = "workpilot",
    version = VERSION,
    about = "Order workflow tracking: stages, tasks, customers and orders",
    after_help = "\
NOTE:
  Data lives in a .workpilot/ directory (workpilot.db + config.json), found by
  walking up from the current directory, or set with --home / WORKPILOT_HOME.
  Run `workpilot init`, then `workpilot auth register` before anything else.

EXIT CODES:
  0  Success
  1  Error (validation, auth, not found, invalid transition, etc.)

ORDER LIFECYCLE:
  CREATED --start--> IN_PROGRESS --complete (last stage)--> COMPLETED
  CREATED|IN_PROGRESS --cancel--> CANCELLED
  IN_PROGRESS --next/prev--> IN_PROGRESS (moves along the task's stages)
  CREATED|IN_PROGRESS --revert--> CREATED (stage cleared)
  COMPLETED and CANCELLED are final."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Workspace directory (defaults to the nearest .workpilot/)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a workspace in the current directory (or --home)
    Init,

    /// Register, log in and manage the stored session
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Show or edit the logged-in user's profile
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Reusable workflow stages
    #[command(subcommand)]
    Stage(StageCommands),

    /// Workflow templates (ordered stage sequences)
    #[command(subcommand)]
    Task(TaskCommands),

    /// Customer records
    #[command(subcommand)]
    Customer(CustomerCommands),

    /// Orders and their progress through a task's stages
    #[command(subcommand)]
    Order(OrderCommands),

    /// Public order tracking by token (no login needed)
    Track {
        /// Tracking token printed by `order create` / `order show`
        token: String,
    },

    /// Counts of customers, tasks, stages and orders
    Dashboard,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account and log in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        company: String,
    },
    /// Log in and store a session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Revoke and forget the stored session
    Logout,
    /// Exchange the stored refresh token for a new token pair
    Refresh,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the logged-in user
    Show,
    /// Update profile fields (omitted fields are kept)
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Change the password (revokes every other session)
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand)]
pub enum StageCommands {
    /// Add a stage (name 3-50 chars)
    Add {
        name: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// List ACTIVE stages
    List {
        /// Case-insensitive name filter
        #[arg(long)]
        name: Option<String>,
    },
    /// Show a stage
    Show {
        /// Stage ID, prefix or name
        stage: String,
    },
    /// Rename or re-note a stage
    Update {
        stage: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete a stage (soft by default)
    #[command(after_help = "\
NOTE:
  Default: marks the stage DELETED. Tasks and orders keep referencing it.
  --hard: removes it from every task sequence and deletes the row. Refused
  while an open order is positioned on the stage.")]
    Delete {
        stage: String,
        #[arg(long)]
        hard: bool,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task from an ordered list of stages
    Create {
        name: String,
        #[arg(long)]
        note: Option<String>,
        /// Stage (ID, prefix or name), repeat in order
        #[arg(long = "stage")]
        stages: Vec<String>,
    },
    /// Create a task from a builder flow on stdin
    #[command(after_help = "\
STDIN FORMAT:
  {\"name\":\"...\", \"note\":\"...\", \"nodes\":[\"Design\",\"Print\"],
   \"edges\":[{\"source\":\"Design\",\"target\":\"Print\"}]}

NOTE:
  Nodes are stage references. The connections must form one linear chain:
  no branches, merges, cycles or disconnected stages.")]
    Load,
    /// Update a task (omitted fields are kept)
    Update {
        task: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        note: Option<String>,
        /// Replace the stage sequence, repeat in order
        #[arg(long = "stage")]
        stages: Vec<String>,
        /// Remove every stage from the task
        #[arg(long, conflicts_with = "stages")]
        clear_stages: bool,
    },
    /// List tasks
    List,
    /// Show a task and its stages
    Show {
        /// Task ID, prefix or name
        task: String,
    },
    /// Delete a task no order uses
    Delete {
        task: String,
    },
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Add a customer
    Add {
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// List customers
    List,
    /// Show a customer
    Show {
        /// Customer ID, prefix or name
        customer: String,
    },
    /// Update a customer (omitted fields are kept)
    Update {
        customer: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete a customer no order uses
    Delete {
        customer: String,
    },
    /// Search customers
    Search {
        /// Matches name, phone, email, address or note
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = "0")]
        page: usize,
        #[arg(long)]
        size: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// Create an order for a customer on a task
    Create {
        #[arg(long)]
        customer: String,
        #[arg(long)]
        task: String,
    },
    /// Show an order with its stage position
    Show {
        order: String,
    },
    /// Server-side search with paging and sorting
    Search {
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        task: Option<String>,
        /// Current stage (ID, prefix or name)
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value = "0")]
        page: usize,
        #[arg(long)]
        size: Option<usize>,
        /// created | updated | status
        #[arg(long, default_value = "created")]
        sort: String,
        /// Ascending order (default: descending)
        #[arg(long)]
        asc: bool,
    },
    /// List orders with text filters, paged in memory
    List {
        /// Matches order ID, customer, task, customer ID or task ID
        #[arg(long)]
        query: Option<String>,
        /// Repeatable status filter
        #[arg(long)]
        status: Vec<String>,
        #[arg(long)]
        customer_name: Option<String>,
        #[arg(long)]
        task_name: Option<String>,
        #[arg(long)]
        stage_name: Option<String>,
        /// all | active | passive
        #[arg(long, default_value = "all")]
        tab: String,
        #[arg(long, default_value = "0")]
        page: usize,
        #[arg(long)]
        size: Option<usize>,
    },
    /// CREATED → IN_PROGRESS at the first stage
    Start {
        order: String,
    },
    /// Move to the next stage
    Next {
        order: String,
    },
    /// Move back to the previous stage
    Prev {
        order: String,
    },
    /// IN_PROGRESS at the last stage → COMPLETED
    Complete {
        order: String,
    },
    /// Cancel an open order
    Cancel {
        order: String,
    },
    /// Reset an open order to CREATED
    Revert {
        order: String,
    },
}
