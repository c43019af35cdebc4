//! `completions` and `man`.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

use crate::Cli;

const BIN_NAME: &str = "issuesync";

/// Write the completion script for `shell`.
fn write_completions(shell: clap_complete::Shell, out: &mut impl Write) {
    clap_complete::generate(shell, &mut Cli::command(), BIN_NAME, out);
}

/// Render one man page with the given `.TH` title.
fn render_page(cmd: clap::Command, title: &str) -> std::io::Result<Vec<u8>> {
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd).title(title).render(&mut page)?;
    Ok(page)
}

/// `issuesync.1` plus `issuesync-<command>.1` for each visible subcommand.
fn man_pages() -> std::io::Result<Vec<(String, Vec<u8>)>> {
    let cli = Cli::command();
    let mut pages = vec![(BIN_NAME.to_string(), render_page(cli.clone(), BIN_NAME)?)];
    for sub in cli.get_subcommands().filter(|sub| !sub.is_hide_set()) {
        let title = format!("{BIN_NAME}-{}", sub.get_name());
        let page = render_page(sub.clone(), &title)?;
        pages.push((title, page));
    }
    Ok(pages)
}

fn write_man_pages(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    man_pages()?
        .into_iter()
        .map(|(title, page)| {
            let path = dir.join(format!("{title}.1"));
            std::fs::write(&path, page)?;
            Ok(path)
        })
        .collect()
}

pub(crate) fn handle_completions(
    shell: clap_complete::Shell,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout().lock();
    write_completions(shell, &mut stdout);
    stdout.flush()?;
    Ok(())
}

pub(crate) fn handle_man(output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(dir) => {
            for path in write_man_pages(&dir)? {
                println!("{}", path.display());
            }
        }
        None => {
            let page = render_page(Cli::command(), BIN_NAME)?;
            std::io::stdout().write_all(&page)?;
        }
    }
    Ok(())
}
