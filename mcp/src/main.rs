use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "mcp",
    version,
    about = "Copy the first n files of a directory in parallel, one thread per file",
    long_about = "`mcp` enumerates the regular files of a directory, orders them by the first
run of decimal digits in each filename (files without digits sort first) and
copies the first n of them into the destination directory, one worker thread
per file.

EXAMPLE:
    # Copy the 5 lowest-numbered files
    mcp 5 ./source ./destination

The destination directory is created if it does not exist."
)]
struct Args {
    // ARGUMENTS
    /// Number of files to copy, between 1 and 10
    #[arg(value_name = "n")]
    n: usize,

    /// Directory to copy files from
    #[arg(value_name = "source_dir")]
    source_dir: std::path::PathBuf,

    /// Directory to copy files into (created if absent)
    #[arg(value_name = "destination_dir")]
    destination_dir: std::path::PathBuf,

    // Progress & output
    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Print summary at the end
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,
}

fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            // usage problems exit 1; --help and --version still exit 0
            let _ = error.print();
            std::process::exit(if error.use_stderr() { 1 } else { 0 });
        }
    }
}

fn main() -> Result<()> {
    let args = parse_args();
    let settings = common::copy::Settings { max_files: args.n };
    let func = {
        let args = args.clone();
        move || common::copy::copy_files(&args.source_dir, &args.destination_dir, &settings)
    };
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary,
    };
    if common::run(&output, func).is_none() {
        std::process::exit(1);
    }
    Ok(())
}
