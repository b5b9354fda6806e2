//TODO: update clap to remove the need for this
#![allow(dangerous_implicit_autorefs)]

use std::io;

use anyhow::anyhow;
use clap::{
    crate_authors, crate_description, crate_name, crate_version, App, AppSettings, Arg, ArgMatches,
    SubCommand,
};
use tracing_subscriber::EnvFilter;
use ustar::{cat, extract, hash, list};

fn value<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    matches
        .value_of(name)
        .ok_or_else(|| anyhow!("missing argument '{}'", name))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let arg_archive = Arg::with_name("archive")
        .help("Archive file")
        .short("a")
        .long("archive")
        .required(true)
        .takes_value(true)
        .value_name("FILE");

    let arg_basedir = Arg::with_name("basedir")
        .help("Directory to unpack to (defaults to '.')")
        .required(true)
        .value_name("DIR")
        .default_value(".");

    let matches = App::new(crate_name!())
        .author(crate_authors!(", "))
        .about(crate_description!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("list")
                .about("List archive entries")
                .arg(&arg_archive)
                .arg(
                    Arg::with_name("verbose")
                        .help("Show mode, owner, size and modification time")
                        .short("v")
                        .long("verbose"),
                ),
        )
        .subcommand(
            SubCommand::with_name("cat")
                .about("Write the content of one entry to stdout")
                .arg(&arg_archive)
                .arg(
                    Arg::with_name("entry")
                        .help("Path of the entry inside the archive")
                        .required(true)
                        .value_name("ENTRY"),
                ),
        )
        .subcommand(
            SubCommand::with_name("hash")
                .about("Print the blake3 hash of every file entry")
                .arg(&arg_archive),
        )
        .subcommand(
            SubCommand::with_name("extract")
                .about("Extract archive")
                .arg(&arg_archive)
                .arg(&arg_basedir),
        )
        .get_matches();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(matches) = matches.subcommand_matches("list") {
        list(
            value(matches, "archive")?,
            matches.is_present("verbose"),
            &mut out,
        )
        .map_err(anyhow::Error::new)
    } else if let Some(matches) = matches.subcommand_matches("cat") {
        cat(value(matches, "archive")?, value(matches, "entry")?, &mut out)
            .map_err(anyhow::Error::new)
    } else if let Some(matches) = matches.subcommand_matches("hash") {
        hash(value(matches, "archive")?, &mut out).map_err(anyhow::Error::new)
    } else if let Some(matches) = matches.subcommand_matches("extract") {
        extract(value(matches, "archive")?, value(matches, "basedir")?)
            .map_err(anyhow::Error::new)
    } else {
        Ok(())
    }
}
