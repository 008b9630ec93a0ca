//! Dict Filter - term dictionary filtering and merging
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::process;

use dict_filter::cli::{usage, Args, Command, UsageError};
use dict_filter::processor::{Processor, ProcessorConfig};
use dict_filter::progress::{
    print_banner, print_bullet, print_error, print_header, print_info, print_warning,
};

fn main() {
    // Parse command-line arguments; bad options get the guide like bad modes
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match UsageError::from_clap(&e) {
            Some(usage_error) => {
                print_warning(&usage_error.to_string());
                println!("{}", usage());
                return;
            }
            None => e.exit(),
        },
    };

    // Set up logging; RUST_LOG still wins when set
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Unknown shapes get the guide and a clean exit, before any file I/O
    let command = match Command::parse(&args.command) {
        Ok(command) => command,
        Err(e) => {
            if e != UsageError::NoArguments {
                print_warning(&e.to_string());
            }
            println!("{}", usage());
            return;
        }
    };

    // Run the application
    if let Err(e) = run(&args, &command) {
        print_error(&format!("{}", e));

        // Print chain of errors
        for cause in e.chain().skip(1) {
            print_error(&format!("  Caused by: {}", cause));
        }

        process::exit(1);
    }
}

fn run(args: &Args, command: &Command) -> anyhow::Result<()> {
    // Compile the element pattern before touching any file
    let selection = command.selection()?;

    if !args.quiet {
        print_banner();
    }

    let config = ProcessorConfig::from_args(args);

    if !args.quiet && args.verbose {
        print_config(args, command, &config);
    }

    let processor = Processor::new(config);

    match (command, selection) {
        (Command::Merge { first, second }, _) => {
            processor.merge(&args.resolve(first), &args.resolve(second))?;
        }
        (
            Command::Global { dictionary }
            | Command::GameSpecific { dictionary, .. }
            | Command::Element { dictionary, .. }
            | Command::Remove { dictionary, .. },
            Some(selection),
        ) => {
            processor.filter(&args.resolve(dictionary), &selection)?;
        }
        (_, None) => anyhow::bail!("No selection for {:?}", command),
    }

    Ok(())
}

/// Print configuration summary
fn print_config(args: &Args, command: &Command, config: &ProcessorConfig) {
    print_header("Configuration");

    print_info(&format!("Command:      {:?}", command));
    print_info(&format!("Output:       {:?}", config.output));
    if let Some(ref base) = args.base_dir {
        print_info(&format!("Base dir:     {:?}", base));
    }
    print_info(&format!("Buffer size:  {} KB", config.buffer_size / 1024));
    print_info("Envelope:");
    for line in config.envelope.header.lines() {
        print_bullet(line);
    }
    print_bullet(config.envelope.footer.trim_end());
}
