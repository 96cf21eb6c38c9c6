use cbmvars::config::Config;
use cbmvars::dump::analyse;
use cbmvars::image::DumpFormat;
use cbmvars::monitor::MonitorConnection;
use cbmvars::report::render;
use cbmvars::source::{DumpFile, MemorySource};
use log::{debug, error};
use std::env;
use std::path::Path;
use std::process;

fn print_usage(program: &str) {
    println!("cbmvars - list the variables of a running Commodore BASIC V2 program");
    println!();
    println!("Usage: {} [options] <dump_file>...", program);
    println!("       {} [options] --connect <host:port>", program);
    println!();
    println!("Options:");
    println!("  --connect <host:port>  Fetch a snapshot from a VICE remote monitor");
    println!("  --config <file>        Read settings from a TOML file");
    println!("  --raw                  Dump files start at address $0000");
    println!("  --prg                  Dump files start with a load address");
    println!("  --regions              Print the memory region table");
    println!("  --heap                 List heap strings with their owners");
    println!("  --no-garbage           Do not list garbage strings");
    println!("  --no-elements          Do not list array elements");
    println!();
    println!("Set RUST_LOG=debug for decoder diagnostics.");
}

fn main() {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        return;
    }

    let mut config_file = None;
    let mut connect = None;
    let mut format = None;
    let mut flags: Vec<&str> = Vec::new();
    let mut files = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--connect" | "--config" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: {} requires an argument", args[i]);
                    process::exit(1);
                }
                if args[i] == "--connect" {
                    connect = Some(args[i + 1].clone());
                } else {
                    config_file = Some(args[i + 1].clone());
                }
                i += 2;
            }
            "--raw" => {
                format = Some(DumpFormat::Raw);
                i += 1;
            }
            "--prg" => {
                format = Some(DumpFormat::Prg);
                i += 1;
            }
            "--regions" | "--heap" | "--no-garbage" | "--no-elements" => {
                flags.push(args[i].as_str());
                i += 1;
            }
            "-h" | "--help" => {
                print_usage(&args[0]);
                return;
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option '{}'", arg);
                process::exit(1);
            }
            _ => {
                files.push(args[i].clone());
                i += 1;
            }
        }
    }

    let mut config = match &config_file {
        Some(path) => match Config::load(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    // command line wins over the config file
    if let Some(format) = format {
        config.format = format;
    }
    for flag in flags {
        match flag {
            "--regions" => config.show_regions = true,
            "--heap" => config.show_heap = true,
            "--no-garbage" => config.show_garbage = false,
            "--no-elements" => config.show_elements = false,
            _ => {}
        }
    }
    debug!("Configuration: {:?}", config);

    let mut sources: Vec<Box<dyn MemorySource>> = Vec::new();
    if let Some(address) = connect {
        sources.push(Box::new(MonitorConnection::new(
            address,
            config.monitor_timeout(),
        )));
    }
    for file in files {
        sources.push(Box::new(DumpFile::new(file, config.format)));
    }
    if sources.is_empty() {
        eprintln!("Error: no dump file or monitor given");
        process::exit(1);
    }

    let mut failed = false;
    for source in sources.iter_mut() {
        println!("Reading from '{}'.", source.describe());
        let result = source.acquire().and_then(analyse);
        match result {
            Ok(dump) => print!("{}", render(&dump, &config)),
            Err(e) => {
                error!("{}: {}", source.describe(), e);
                eprintln!("Error: {}", e);
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}
