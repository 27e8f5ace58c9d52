//! # CLI Layer
//!
//! This module is **one possible UI client** for diarch. It is the only place
//! that knows about terminal I/O, prompts and exit codes.
//!
//! ## Structure
//!
//! - `run()`: parses arguments, builds the context, dispatches
//! - `handle_*()`: per-command handlers that call `DiarchApi` and render the result
//!
//! Handlers never implement business rules; they translate flags into API
//! arguments and `CmdResult`s into text.

use super::logging;
use super::opener::open_path;
use super::render::{
    eprint_messages, print_messages, render_catalog, render_progress, render_stats,
    render_storage, DEFAULT_WIDTH,
};
use super::setup::{
    print_grouped_help, print_help_for_command, print_subcommand_help, Cli, Commands,
    CoreCommands, DataCommands, LayoutArg, MiscCommands, RecordCommands,
};
use clap::Parser;
use console::Term;
use diarch::catalog::CatalogFilter;
use diarch::commands::upload::UploadForm;
use diarch::error::Result;
use diarch::init::{initialize, DiarchContext};
use diarch::model::parse_date;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

#[derive(Debug, Default)]
struct ListArgs {
    search: Option<String>,
    year: Option<i32>,
    category: Option<String>,
    date: Option<String>,
    layout: Option<LayoutArg>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Top level uses grouped help, subcommands use clap's rendering
    if cli.help {
        if cli.command.is_none() {
            print_grouped_help();
        } else {
            print_subcommand_help(&cli.command);
        }
        return Ok(());
    }

    if let Some(Commands::Misc(MiscCommands::Help { command })) = &cli.command {
        return handle_help(command.clone());
    }

    logging::init(cli.verbose);
    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let mut ctx = initialize(cli.data.as_deref())?;
    eprint_messages(&ctx.api.take_notices());

    match cli.command {
        None => handle_list(&mut ctx, ListArgs::default()),
        Some(Commands::Core(cmd)) => match cmd {
            CoreCommands::Upload {
                file,
                title,
                category,
                date,
            } => handle_upload(&mut ctx, file, title, category, date),
            CoreCommands::List {
                search,
                year,
                category,
                date,
                layout,
            } => handle_list(
                &mut ctx,
                ListArgs {
                    search,
                    year,
                    category,
                    date,
                    layout,
                },
            ),
        },
        Some(Commands::Record(cmd)) => match cmd {
            RecordCommands::View {
                selector,
                print_path,
            } => handle_view(&ctx, selector, print_path),
            RecordCommands::Download { selector, output } => {
                handle_download(&ctx, selector, output)
            }
            RecordCommands::Delete { selectors, yes } => handle_delete(&mut ctx, selectors, yes),
        },
        Some(Commands::Data(cmd)) => match cmd {
            DataCommands::Stats => handle_stats(&ctx),
            DataCommands::Storage => handle_storage(&ctx),
            DataCommands::Migrate => handle_migrate(&mut ctx),
        },
        Some(Commands::Misc(cmd)) => match cmd {
            MiscCommands::Doctor => handle_doctor(&mut ctx),
            MiscCommands::Help { command } => handle_help(command),
        },
    }
}

fn terminal_width() -> usize {
    Term::stdout()
        .size_checked()
        .map(|(_, cols)| cols as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

fn handle_upload(
    ctx: &mut DiarchContext,
    file: Option<PathBuf>,
    title: Option<String>,
    category: Option<String>,
    date: Option<String>,
) -> Result<()> {
    let form = UploadForm {
        title: title.unwrap_or_default(),
        category: category.unwrap_or_default(),
        date: date.unwrap_or_default(),
        file,
    };

    let term = Term::stderr();
    let show_progress = term.is_term();
    let mut on_progress = |fraction: f64| {
        if show_progress {
            let _ = term.clear_line();
            let _ = term.write_str(&render_progress(fraction));
        }
    };

    let outcome = ctx.api.upload(&form, &mut on_progress);
    if show_progress {
        let _ = term.clear_line();
    }

    print_messages(&outcome?.messages);
    Ok(())
}

fn handle_list(ctx: &mut DiarchContext, args: ListArgs) -> Result<()> {
    let date = args.date.as_deref().map(parse_date).transpose()?;
    let filter = CatalogFilter {
        search: args.search,
        year: args.year,
        category: args.category,
        date,
    };

    let result = ctx.api.list(filter, args.layout.map(Into::into))?;
    if let Some(view) = &result.view {
        print!("{}", render_catalog(view, terminal_width()));
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_view(ctx: &DiarchContext, selector: String, print_path: bool) -> Result<()> {
    let result = ctx.api.view(&selector, &std::env::temp_dir())?;
    let Some(path) = result.paths.first() else {
        print_messages(&result.messages);
        return Ok(());
    };

    if print_path {
        println!("{}", path.display());
        return Ok(());
    }

    print_messages(&result.messages);
    if let Err(e) = open_path(path) {
        tracing::warn!(error = %e, "could not launch the system viewer");
        println!("Open it manually: {}", path.display());
    }
    Ok(())
}

fn handle_download(ctx: &DiarchContext, selector: String, output: Option<PathBuf>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let result = ctx.api.download(&selector, output.as_deref(), &cwd)?;
    print_messages(&result.messages);
    Ok(())
}

fn confirm_delete(ctx: &DiarchContext, selectors: &[String]) -> Result<bool> {
    let selected = ctx.api.select(selectors)?;
    for dr in &selected.listed_records {
        println!("  {}. {}", dr.index, dr.record.title);
    }
    print!(
        "Delete {} diar{}? This cannot be undone. [y/N] ",
        selected.listed_records.len(),
        if selected.listed_records.len() == 1 { "y" } else { "ies" }
    );
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn handle_delete(ctx: &mut DiarchContext, selectors: Vec<String>, yes: bool) -> Result<()> {
    let confirmed = yes || confirm_delete(ctx, &selectors)?;
    let result = ctx.api.delete(&selectors, confirmed)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_stats(ctx: &DiarchContext) -> Result<()> {
    let result = ctx.api.stats()?;
    if let Some(stats) = &result.stats {
        print!("{}", render_stats(stats, ctx.config.chart_width()));
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_storage(ctx: &DiarchContext) -> Result<()> {
    let result = ctx.api.storage()?;
    print_messages(&result.messages);
    if let Some(report) = &result.storage {
        print!("{}", render_storage(report));
    }
    Ok(())
}

fn handle_migrate(ctx: &mut DiarchContext) -> Result<()> {
    let result = ctx.api.migrate()?;
    eprint_messages(&ctx.api.take_notices());
    print_messages(&result.messages);
    Ok(())
}

fn handle_doctor(ctx: &mut DiarchContext) -> Result<()> {
    let result = ctx.api.doctor()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_help(command: Option<String>) -> Result<()> {
    match command {
        Some(cmd) => print_help_for_command(&cmd),
        None => print_grouped_help(),
    }
    Ok(())
}
