use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use diarch::catalog::Layout;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Grid,
    List,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Grid => Layout::Grid,
            LayoutArg::List => Layout::List,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "diarch",
    bin_name = "diarch",
    version,
    disable_help_flag = true,
    disable_help_subcommand = true
)]
#[command(about = "Local archive for PDF diaries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (overrides DIARCH_DATA and the config file)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Print help
    #[arg(short, long, global = true)]
    pub help: bool,
}

/// Command group definitions for help output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Core,
    Record,
    Data,
    Misc,
}

impl CommandGroup {
    pub fn heading(&self) -> &'static str {
        match self {
            CommandGroup::Core => "Core Commands:",
            CommandGroup::Record => "Per-Diary Commands:",
            CommandGroup::Data => "Data Commands:",
            CommandGroup::Misc => "Miscellaneous:",
        }
    }

    /// Returns the group for a given command name
    pub fn for_command(name: &str) -> Option<Self> {
        match name {
            "upload" | "list" => Some(CommandGroup::Core),
            "view" | "download" | "delete" => Some(CommandGroup::Record),
            "stats" | "storage" | "migrate" => Some(CommandGroup::Data),
            "doctor" | "help" => Some(CommandGroup::Misc),
            _ => None,
        }
    }

    /// Returns all groups in display order
    pub fn all() -> &'static [CommandGroup] {
        &[
            CommandGroup::Core,
            CommandGroup::Record,
            CommandGroup::Data,
            CommandGroup::Misc,
        ]
    }
}

/// Returns the custom grouped help output as a string
pub fn get_grouped_help() -> String {
    let cmd = Cli::command();
    let version = cmd.get_version().unwrap_or("unknown");

    let mut output = String::new();
    output.push_str(&format!("diarch {version}\n"));
    output.push_str("Local archive for PDF diaries\n");
    output.push('\n');
    output.push_str("Usage: diarch [OPTIONS] [COMMAND]\n");

    let subcommands: Vec<_> = cmd.get_subcommands().collect();

    for group in CommandGroup::all() {
        let group_cmds: Vec<_> = subcommands
            .iter()
            .filter(|sc| {
                !sc.is_hide_set() && CommandGroup::for_command(sc.get_name()) == Some(*group)
            })
            .collect();

        if !group_cmds.is_empty() {
            output.push('\n');
            output.push_str(&format!("{}\n", group.heading()));
            for sc in group_cmds {
                let name = sc.get_name();
                let about = sc.get_about().map(|s| s.to_string()).unwrap_or_default();
                output.push_str(&format!("  {:<12} {}\n", name, about));
            }
        }
    }

    output.push('\n');
    output.push_str("Options:\n");
    output.push_str("      --data <DIR>  Data directory\n");
    output.push_str("  -v, --verbose     Verbose output\n");
    output.push_str("  -h, --help        Print help\n");
    output.push_str("  -V, --version     Print version\n");

    output
}

pub fn print_grouped_help() {
    print!("{}", get_grouped_help());
}

/// Prints help for a specific subcommand using clap's built-in rendering
pub fn print_subcommand_help(command: &Option<Commands>) {
    let name = match command {
        Some(Commands::Core(c)) => match c {
            CoreCommands::Upload { .. } => "upload",
            CoreCommands::List { .. } => "list",
        },
        Some(Commands::Record(c)) => match c {
            RecordCommands::View { .. } => "view",
            RecordCommands::Download { .. } => "download",
            RecordCommands::Delete { .. } => "delete",
        },
        Some(Commands::Data(c)) => match c {
            DataCommands::Stats => "stats",
            DataCommands::Storage => "storage",
            DataCommands::Migrate => "migrate",
        },
        Some(Commands::Misc(c)) => match c {
            MiscCommands::Doctor => "doctor",
            MiscCommands::Help { .. } => "help",
        },
        None => {
            print_grouped_help();
            return;
        }
    };

    print_help_for_command(name);
}

/// Prints help for a command by name
pub fn print_help_for_command(name: &str) {
    let mut cmd = Cli::command();

    for subcmd in cmd.get_subcommands_mut() {
        if subcmd.get_name() == name {
            print!("{}", subcmd.render_help());
            return;
        }
    }

    eprintln!("Unknown command: {}", name);
    eprintln!();
    print_grouped_help();
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Core(CoreCommands),

    #[command(flatten)]
    Record(RecordCommands),

    #[command(flatten)]
    Data(DataCommands),

    #[command(flatten)]
    Misc(MiscCommands),
}

#[derive(Subcommand, Debug)]
pub enum CoreCommands {
    /// Upload a PDF diary
    #[command(alias = "up", display_order = 1)]
    Upload {
        /// The PDF file to archive
        file: Option<PathBuf>,

        /// Title of the diary
        #[arg(short, long)]
        title: Option<String>,

        /// Category (e.g. Travel, Work)
        #[arg(short, long)]
        category: Option<String>,

        /// Date of the diary (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// List diaries
    #[command(alias = "ls", display_order = 2)]
    List {
        /// Search titles and categories
        #[arg(short, long)]
        search: Option<String>,

        /// Only diaries dated in this year
        #[arg(short, long)]
        year: Option<i32>,

        /// Only diaries in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only diaries with this exact date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// Card grid or one row per diary
        #[arg(short, long, value_enum)]
        layout: Option<LayoutArg>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecordCommands {
    /// Open a diary in the system PDF viewer
    #[command(alias = "v", display_order = 10)]
    View {
        /// Index or id of the diary (e.g. 1 or 1682899200123)
        selector: String,

        /// Only print the path of the decoded file
        #[arg(long)]
        print_path: bool,
    },

    /// Save a diary's PDF to disk
    #[command(alias = "dl", display_order = 11)]
    Download {
        /// Index or id of the diary
        selector: String,

        /// Output file or directory (default: original file name here)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Delete one or more diaries
    #[command(alias = "rm", display_order = 12)]
    Delete {
        /// Indexes, ranges or ids (e.g. 1 3-5 1682899200123)
        #[arg(required = true, num_args = 1..)]
        selectors: Vec<String>,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Totals and diaries per category
    #[command(display_order = 20)]
    Stats,

    /// Storage used and available
    #[command(display_order = 21)]
    Storage,

    /// Show (or retry) the legacy migration
    #[command(display_order = 22)]
    Migrate,
}

#[derive(Subcommand, Debug)]
pub enum MiscCommands {
    /// Check and fix data inconsistencies
    #[command(display_order = 30)]
    Doctor,

    /// Print help for diarch or a subcommand
    #[command(display_order = 31)]
    Help {
        /// Subcommand to get help for
        command: Option<String>,
    },
}
