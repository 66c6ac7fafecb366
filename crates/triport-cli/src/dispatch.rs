use anyhow::Result;

use triport_installer::{
    default_root, default_triplet, InstallLayout, InstallState, RootConfig, StatusDatabase,
};

use crate::completion::write_completions_script;
use crate::remove_flow::{run_remove_command, RemoveRequest};
use crate::render::{current_output_style, render_status_line, OutputStyle};
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => default_root()?,
    };
    let layout = InstallLayout::new(root);
    let output_style = current_output_style();

    match cli.command {
        Commands::Remove {
            specs,
            purge,
            no_purge,
            recurse,
            dry_run,
            outdated,
        } => {
            let config = RootConfig::load(&layout)?;
            let triplet = default_triplet(cli.triplet.as_deref(), &config);
            let request = RemoveRequest {
                specs,
                purge,
                no_purge,
                recurse,
                dry_run,
                outdated,
            };
            run_remove_command(&layout, &request, &triplet, output_style)?;
        }
        Commands::List => {
            let db = StatusDatabase::load(&layout)?;
            let lines = format_installed_lines(&db);
            if lines.is_empty() {
                println!("No packages are installed");
            }
            for line in lines {
                println!("{line}");
            }
        }
        Commands::Doctor => {
            let db = StatusDatabase::load(&layout)?;
            for line in format_doctor_lines(&layout, &db, output_style) {
                println!("{line}");
            }
        }
        Commands::Completions { shell } => {
            let mut stdout = std::io::stdout().lock();
            write_completions_script(shell, &mut stdout)?;
        }
    }

    Ok(())
}

pub(crate) fn format_installed_lines(db: &StatusDatabase) -> Vec<String> {
    db.iter()
        .filter(|paragraph| paragraph.state != InstallState::NotInstalled)
        .map(|paragraph| {
            let mut line = format!("{} {}", paragraph.spec(), paragraph.package.version);
            if paragraph.state == InstallState::HalfInstalled {
                line.push_str(" (half-installed)");
            }
            line
        })
        .collect()
}

pub(crate) fn format_doctor_lines(
    layout: &InstallLayout,
    db: &StatusDatabase,
    style: OutputStyle,
) -> Vec<String> {
    let mut lines = vec![
        format!("root: {}", layout.root().display()),
        format!("installed: {}", layout.installed_dir().display()),
        format!("packages: {}", layout.packages_dir().display()),
        format!("ports: {}", layout.ports_dir().display()),
        format!("status: {}", layout.status_path().display()),
    ];

    let interrupted = db
        .iter()
        .filter(|paragraph| paragraph.state == InstallState::HalfInstalled)
        .collect::<Vec<_>>();
    if interrupted.is_empty() {
        lines.push(render_status_line(style, "ok", "no interrupted operations"));
    }
    for paragraph in interrupted {
        lines.push(render_status_line(
            style,
            "warn",
            &format!(
                "{} is half-installed (want={}); rerun `triport remove {}` to finish",
                paragraph.spec(),
                paragraph.want.as_str(),
                paragraph.spec()
            ),
        ));
    }
    lines
}
