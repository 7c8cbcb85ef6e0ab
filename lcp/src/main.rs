use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "lcp",
    version,
    about = "Copy a text file line-by-line through a bounded multi-thread pipeline",
    long_about = "`lcp` copies a newline-delimited text file by splitting reading and writing
across independent worker threads coordinated through a fixed-capacity queue.

EXAMPLE:
    # Copy with 4 reader and 4 writer threads
    lcp 4 input.txt output.txt

Note: with more than one reader the line order in the output is unspecified;
no line is ever lost or duplicated."
)]
struct Args {
    // ARGUMENTS
    /// Number of reader threads (and writer threads, unless --single-writer), between 2 and 10
    #[arg(value_name = "thread_count")]
    thread_count: usize,

    /// Input text file
    #[arg(value_name = "input_file")]
    input: std::path::PathBuf,

    /// Output file (created or truncated)
    #[arg(value_name = "output_file")]
    output: std::path::PathBuf,

    // Pipeline options
    /// Run a single writer thread regardless of thread_count
    #[arg(long, help_heading = "Pipeline options")]
    single_writer: bool,

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
    let settings = common::pipeline::Settings {
        threads: args.thread_count,
        single_writer: args.single_writer,
    };
    let func = {
        let args = args.clone();
        move || common::pipeline::copy_lines(&args.input, &args.output, &settings)
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
